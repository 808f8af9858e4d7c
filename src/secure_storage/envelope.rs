//! Envelope 봉인/개봉
//!
//! 바이너리 포맷 (v1):
//! - magic: `PTSENV01` (8 bytes)
//! - nonce: 24 bytes (XChaCha20-Poly1305)
//! - ciphertext: AEAD 결과 (= 암호문 + 태그)
//!
//! AAD: magic (포맷 바인딩)
//!
//! 프론트엔드에는 base64 문자열(`SecretEnvelope`)로 전달되며, 셸은 내용을 해석하거나 로그에 남기지 않습니다.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

pub const ENVELOPE_MAGIC: &[u8; 8] = b"PTSENV01";

/// 마스터키 길이 (256-bit)
pub const MASTER_KEY_LEN: usize = 32;

pub const NONCE_LEN: usize = 24;

const TAG_LEN: usize = 16;

/// magic + nonce + 태그 (빈 문자열을 봉인해도 이 길이는 됨)
pub const MIN_SEALED_LEN: usize = ENVELOPE_MAGIC.len() + NONCE_LEN + TAG_LEN;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Envelope is not valid base64")]
    NotBase64,

    #[error("Envelope is too short")]
    Truncated,

    #[error("Invalid envelope magic")]
    InvalidMagic,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Decrypted data is not valid UTF-8")]
    NotUtf8,
}

/// 호출자에게 돌려주는 불투명 암호문 (base64)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretEnvelope(String);

impl SecretEnvelope {
    pub fn from_sealed(sealed: &[u8]) -> Self {
        Self(BASE64.encode(sealed))
    }

    pub fn to_sealed(&self) -> Result<Vec<u8>, EnvelopeError> {
        let bytes = BASE64
            .decode(self.0.trim())
            .map_err(|_| EnvelopeError::NotBase64)?;
        if bytes.len() < MIN_SEALED_LEN {
            return Err(EnvelopeError::Truncated);
        }
        Ok(bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretEnvelope {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for SecretEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretEnvelope(<redacted>)")
    }
}

/// 마스터키로 문자열을 봉인
pub fn seal(master_key: &[u8; MASTER_KEY_LEN], plain_text: &str) -> Result<Vec<u8>, EnvelopeError> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce);

    let cipher = XChaCha20Poly1305::new(master_key.into());
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plain_text.as_bytes(),
                aad: ENVELOPE_MAGIC,
            },
        )
        .map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?;

    let mut sealed = Vec::with_capacity(ENVELOPE_MAGIC.len() + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(ENVELOPE_MAGIC);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// 봉인된 바이트를 마스터키로 개봉
pub fn open(master_key: &[u8; MASTER_KEY_LEN], sealed: &[u8]) -> Result<String, EnvelopeError> {
    if sealed.len() < MIN_SEALED_LEN {
        return Err(EnvelopeError::Truncated);
    }
    let (magic, rest) = sealed.split_at(ENVELOPE_MAGIC.len());
    if magic != ENVELOPE_MAGIC {
        return Err(EnvelopeError::InvalidMagic);
    }
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new(master_key.into());
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: ENVELOPE_MAGIC,
            },
        )
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        // 평문 메모리 지우기
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        EnvelopeError::NotUtf8
    })
}
