//! Ed25519 detached signature verification
//!
//! Keys and signatures arrive base64-encoded. Browser clients tend to emit the
//! standard alphabet while other clients use the URL-safe one, so decoding
//! accepts either, padded or not.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH};

/// Why a verification attempt failed.
///
/// Callers must map every variant to the same client-facing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("malformed public key")]
    MalformedKey,

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature does not match")]
    Mismatch,
}

/// Decode base64 in either the URL-safe or standard alphabet
pub fn decode_base64(input: &str) -> Option<Vec<u8>> {
    let normalized: String = input
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()
}

/// Decode and validate an encoded Ed25519 verifying key.
///
/// Small-order keys are rejected: a signature under one can verify against
/// any message.
pub fn decode_verifying_key(encoded: &str) -> Result<VerifyingKey, SignatureError> {
    let bytes = decode_base64(encoded).ok_or(SignatureError::MalformedKey)?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| SignatureError::MalformedKey)?;
    let key = VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::MalformedKey)?;
    if key.is_weak() {
        return Err(SignatureError::MalformedKey);
    }
    Ok(key)
}

/// Verify `signature` over `message` against `public_key`, reporting the cause
pub fn verify_detached(
    public_key: &str,
    message: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    let key = decode_verifying_key(public_key)?;

    let sig_bytes = decode_base64(signature).ok_or(SignatureError::MalformedSignature)?;
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::MalformedSignature)?;

    key.verify_strict(message, &sig).map_err(|_| SignatureError::Mismatch)
}

/// Verify `signature` over `message` against `public_key`
pub fn verify(public_key: &str, message: &[u8], signature: &str) -> bool {
    verify_detached(public_key, message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    fn keypair() -> (SigningKey, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let public = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().as_bytes());
        (signing_key, public)
    }

    #[test]
    fn test_valid_signature() {
        let (sk, pk) = keypair();
        let nonce = "Zq3N0hXv0b2m8V1kq9wJxA";
        let sig = URL_SAFE_NO_PAD.encode(sk.sign(nonce.as_bytes()).to_bytes());

        assert!(verify(&pk, nonce.as_bytes(), &sig));
    }

    #[test]
    fn test_standard_alphabet_accepted() {
        let (sk, _) = keypair();
        let pk = STANDARD.encode(sk.verifying_key().as_bytes());
        let sig = STANDARD.encode(sk.sign(b"nonce").to_bytes());

        assert!(verify(&pk, b"nonce", &sig));
    }

    #[test]
    fn test_tampered_message_rejected() {
        let (sk, pk) = keypair();
        let sig = URL_SAFE_NO_PAD.encode(sk.sign(b"nonce-one").to_bytes());

        assert_eq!(
            verify_detached(&pk, b"nonce-two", &sig),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let (sk, _) = keypair();
        let (_, other_pk) = keypair();
        let sig = URL_SAFE_NO_PAD.encode(sk.sign(b"nonce").to_bytes());

        assert!(!verify(&other_pk, b"nonce", &sig));
    }

    #[test]
    fn test_malformed_inputs() {
        let (sk, pk) = keypair();
        let sig = URL_SAFE_NO_PAD.encode(sk.sign(b"nonce").to_bytes());

        assert_eq!(
            verify_detached("not base64!!", b"nonce", &sig),
            Err(SignatureError::MalformedKey)
        );
        assert_eq!(
            verify_detached(&URL_SAFE_NO_PAD.encode([7u8; 16]), b"nonce", &sig),
            Err(SignatureError::MalformedKey)
        );
        assert_eq!(
            verify_detached(&pk, b"nonce", "@@@"),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verify_detached(&pk, b"nonce", &URL_SAFE_NO_PAD.encode([1u8; 10])),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn test_small_order_key_rejected() {
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let pk = URL_SAFE_NO_PAD.encode(identity);

        let mut sig = [0u8; 64];
        sig[0] = 1;
        let sig = URL_SAFE_NO_PAD.encode(sig);

        assert_eq!(decode_verifying_key(&pk), Err(SignatureError::MalformedKey));
        assert!(!verify(&pk, b"nonce-one", &sig));
        assert!(!verify(&pk, b"nonce-two", &sig));
    }

    #[test]
    fn test_decode_padding_variants() {
        assert_eq!(decode_base64("aGk="), Some(b"hi".to_vec()));
        assert_eq!(decode_base64("aGk"), Some(b"hi".to_vec()));
        assert_eq!(decode_base64("-_8"), decode_base64("+/8="));
    }
}
