//! MOTD page rendering using maud templates.

use maud::{html, Markup, DOCTYPE};

use crate::db::Post;

/// Base HTML layout shared by all pages.
fn base_layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="color-scheme" content="light dark";
                title { (title) " - motd-relay" }
                link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
                link rel="stylesheet" href="/static/css/style.css";
            }
            body {
                main class="container" {
                    (content)
                }
            }
        }
    }
}

/// Home page: the current MOTD plus the recent submission history.
pub fn render_home(message: &str, last_updated: i64, recent: &[Post]) -> Markup {
    base_layout(
        "Home",
        html! {
            section {
                hgroup {
                    h1 { (message) }
                    p { "last updated " (format_timestamp(last_updated)) }
                }
            }
            @if !recent.is_empty() {
                section {
                    h2 { "Previous messages" }
                    ul {
                        @for post in recent {
                            li {
                                (post.body)
                                @if let Some(name) = &post.author_name {
                                    " — submitted by " (name)
                                }
                                @if post.cross_posted {
                                    " " mark { "cross-posted" }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0)
        .map_or_else(|| ts.to_string(), |dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}
