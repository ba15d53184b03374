//! Reversible, keyed ID codec.
//!
//! Internal integer ids are turned into opaque tokens with AES-256-GCM. The
//! nonce is synthetic (an HMAC of the id), so the same id always yields the
//! same token and no mapping table is needed.
//!
//! Token format: base64url(nonce_12bytes || ciphertext_8bytes || tag_16bytes),
//! unpadded, always 48 characters.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const PAYLOAD_LEN: usize = 8;
const TAG_LEN: usize = 16;
const RAW_LEN: usize = NONCE_LEN + PAYLOAD_LEN + TAG_LEN;

/// Length of every token produced by [`IdCodec::encode`].
pub const TOKEN_LEN: usize = 48;

/// Minimum secret length accepted by [`IdCodec::new`].
pub const MIN_CODEC_SECRET_LENGTH: usize = 32;

const ENCRYPTION_LABEL: &[u8] = b"id-codec/encryption";
const NONCE_LABEL: &[u8] = b"id-codec/nonce";

/// Why a token could not be turned back into an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Identifier is malformed")]
    Malformed,

    #[error("Identifier is invalid")]
    Tampered,

    #[error("Identifier is out of range")]
    OutOfRange,
}

/// Failures on the encoding side. None of these are caused by client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Cannot encode negative id {0}")]
    Negative(i64),

    #[error("Encryption failed")]
    Cipher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ID codec secret must be at least {MIN_CODEC_SECRET_LENGTH} bytes")]
pub struct InvalidSecret;

/// Keyed bijection between non-negative ids and opaque tokens.
#[derive(Clone)]
pub struct IdCodec {
    cipher: Aes256Gcm,
    nonce_mac: HmacSha256,
}

impl std::fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdCodec").finish_non_exhaustive()
    }
}

impl IdCodec {
    /// Derive the encryption and nonce keys from a server-side secret.
    pub fn new(secret: &[u8]) -> Result<Self, InvalidSecret> {
        if secret.len() < MIN_CODEC_SECRET_LENGTH {
            return Err(InvalidSecret);
        }

        let encryption_key = derive_key(secret, ENCRYPTION_LABEL)?;
        let nonce_key = derive_key(secret, NONCE_LABEL)?;

        let cipher = Aes256Gcm::new_from_slice(&encryption_key).map_err(|_| InvalidSecret)?;
        let nonce_mac =
            <HmacSha256 as Mac>::new_from_slice(&nonce_key).map_err(|_| InvalidSecret)?;

        Ok(Self { cipher, nonce_mac })
    }

    /// Encode an id into a URL-safe token.
    pub fn encode(&self, id: i64) -> Result<String, EncodeError> {
        if id < 0 {
            return Err(EncodeError::Negative(id));
        }

        let plaintext = id.to_be_bytes();
        let nonce = self.nonce_for(&plaintext);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| EncodeError::Cipher)?;

        let mut raw = Vec::with_capacity(RAW_LEN);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&sealed);

        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decode a token produced by [`IdCodec::encode`].
    pub fn decode(&self, token: &str) -> Result<i64, DecodeError> {
        if token.len() != TOKEN_LEN {
            return Err(DecodeError::Malformed);
        }

        let raw = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| DecodeError::Malformed)?;
        if raw.len() != RAW_LEN {
            return Err(DecodeError::Malformed);
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| DecodeError::Tampered)?;

        let bytes: [u8; PAYLOAD_LEN] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| DecodeError::Malformed)?;

        // Only the canonical token of an id is accepted.
        if self.nonce_for(&bytes).as_slice() != nonce {
            return Err(DecodeError::Tampered);
        }

        let id = i64::from_be_bytes(bytes);
        if id < 0 {
            return Err(DecodeError::OutOfRange);
        }
        Ok(id)
    }

    fn nonce_for(&self, plaintext: &[u8; PAYLOAD_LEN]) -> [u8; NONCE_LEN] {
        let mut mac = self.nonce_mac.clone();
        mac.update(plaintext);
        let digest = mac.finalize().into_bytes();

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        nonce
    }
}

fn derive_key(secret: &[u8], label: &[u8]) -> Result<[u8; 32], InvalidSecret> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| InvalidSecret)?;
    mac.update(label);
    Ok(mac.finalize().into_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-codec-secret-that-is-long-enough!!";

    fn codec() -> IdCodec {
        IdCodec::new(SECRET).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        for id in [0_i64, 1, 2, 42, 1_000_000, i64::MAX] {
            let token = codec.encode(id).unwrap();
            assert_eq!(token.len(), TOKEN_LEN);
            assert_eq!(codec.decode(&token).unwrap(), id);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = codec().encode(77).unwrap();
        let b = codec().encode(77).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tokens_are_url_safe() {
        let token = codec().encode(123_456).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_neighbouring_ids_share_no_prefix() {
        let codec = codec();
        let a = codec.encode(1).unwrap();
        let b = codec.encode(2).unwrap();
        assert_ne!(a[..8], b[..8]);
    }

    #[test]
    fn test_different_secret_cannot_decode() {
        let token = codec().encode(5).unwrap();
        let other = IdCodec::new(b"another-secret-of-sufficient-length-xx").unwrap();
        assert_eq!(other.decode(&token), Err(DecodeError::Tampered));
    }

    #[test]
    fn test_rejects_garbage() {
        let codec = codec();
        assert_eq!(codec.decode(""), Err(DecodeError::Malformed));
        assert_eq!(codec.decode("12"), Err(DecodeError::Malformed));
        assert_eq!(codec.decode(&"!".repeat(TOKEN_LEN)), Err(DecodeError::Malformed));
    }

    #[test]
    fn test_rejects_tampered_token() {
        let codec = codec();
        let token = codec.encode(9).unwrap();

        let mut chars: Vec<char> = token.chars().collect();
        chars[10] = if chars[10] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert_eq!(codec.decode(&tampered), Err(DecodeError::Tampered));
    }

    #[test]
    fn test_rejects_token_with_appended_suffix() {
        let codec = codec();
        let token = codec.encode(9).unwrap();

        assert!(codec.decode(&format!("{}tampered", token)).is_err());
        assert!(codec.decode(&format!("{}A", token)).is_err());
    }

    #[test]
    fn test_rejects_negative_and_short_secret() {
        assert_eq!(codec().encode(-1), Err(EncodeError::Negative(-1)));
        assert!(IdCodec::new(b"short").is_err());
    }
}
