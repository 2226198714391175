//! Ed25519 verification of interaction webhook requests.

use anyhow::{anyhow, Context, Result};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Parse the application public key from its hex form.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(hex_key).context("Discord public key is not valid hex")?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("Discord public key must be 32 bytes"))?;

    VerifyingKey::from_bytes(&bytes).context("Discord public key is not a valid Ed25519 key")
}

/// Verify a webhook body against its signature headers.
///
/// The signed message is the `X-Signature-Timestamp` value concatenated with
/// the raw request body.
pub fn verify_signature(
    key: &VerifyingKey,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<()> {
    let sig_bytes = hex::decode(signature_hex).context("Signature is not valid hex")?;
    let signature =
        Signature::from_slice(&sig_bytes).context("Signature is not a valid Ed25519 signature")?;

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature)
        .map_err(|_| anyhow!("Invalid interaction signature"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    #[test]
    fn test_round_trip() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let key = signing_key.verifying_key();

        let timestamp = "1700000000";
        let body = br#"{"type":1}"#;
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing_key.sign(&message).to_bytes());

        assert!(verify_signature(&key, &signature, timestamp, body).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let key = signing_key.verifying_key();

        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(br#"{"type":1}"#);
        let signature = hex::encode(signing_key.sign(&message).to_bytes());

        assert!(verify_signature(&key, &signature, timestamp, br#"{"type":2}"#).is_err());
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let key = signing_key.verifying_key();

        assert!(verify_signature(&key, "not-hex", "0", b"body").is_err());
        assert!(verify_signature(&key, &"ab".repeat(64), "0", b"body").is_err());
    }
}
