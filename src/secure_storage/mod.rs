//! Secure Storage 모듈
//!
//! 렌더링된(신뢰할 수 없는) 페이지가 OS 키 저장소를 직접 건드리지 않고
//! 문자열 암호화/복호화를 요청할 수 있게 하는 브리지입니다.
//!
//! - OS Keychain에는 마스터키 1개만 저장 (`purity:storage_master_key_v1`)
//! - 문자열은 XChaCha20-Poly1305로 봉인하여 호출자에게 envelope로 반환
//! - 브리지는 캐시/배치/키 회전을 하지 않음 (호출마다 독립)

pub mod backend;
pub mod bridge;
pub mod envelope;

pub use backend::{KeychainBackend, SecretBackend};
pub use bridge::{CallerContext, SecureStorageBridge};
pub use envelope::{EnvelopeError, SecretEnvelope};

/// Secure storage 오류
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Encryption not available: {0}")]
    EncryptionUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Secure storage is not exposed to this page")]
    Forbidden,

    #[error("Invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),
}
