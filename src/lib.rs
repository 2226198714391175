//! MOTD relay library.
//!
//! A Discord-facing service that republishes a single "message of the day"
//! to a public web page and cross-posts community-approved messages to an
//! external social platform once enough distinct users have reacted with the
//! designated emoji.

pub mod config;
pub mod constants;
pub mod crosspost;
pub mod db;
pub mod discord;
pub mod events;
pub mod motd;
pub mod social;
pub mod web;
