//! Secure storage 백엔드
//!
//! - 마스터키는 OS Keychain에서 로드 (없으면 생성 후 저장)
//! - Keychain을 사용할 수 없으면 `EncryptionUnavailable` (평문 fallback 없음)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keyring::Entry;
use rand::Rng;
use std::sync::Mutex;
use zeroize::Zeroize;

use crate::secure_storage::envelope::{self, MASTER_KEY_LEN};
use crate::secure_storage::StorageError;

/// Keychain 서비스 이름
pub const KEYCHAIN_SERVICE: &str = "com.puritytrading.desktop";
/// 마스터키 Keychain 키
pub const MASTER_KEY_KEYCHAIN_KEY: &str = "purity:storage_master_key_v1";

/// OS가 제공하는 암호화 기능에 대한 추상화
///
/// 구현체는 내부적으로 호출을 직렬화해야 합니다. 브리지는 잠금이나 풀링을 하지 않습니다.
pub trait SecretBackend: Send + Sync {
    fn is_available(&self) -> bool;

    fn encrypt_string(&self, plain_text: &str) -> Result<Vec<u8>, StorageError>;

    fn decrypt_string(&self, sealed: &[u8]) -> Result<String, StorageError>;
}

/// Zeroize가 적용된 마스터키 래퍼
struct MasterKey {
    bytes: [u8; MASTER_KEY_LEN],
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

#[derive(Debug, thiserror::Error)]
enum KeychainError {
    #[error("master key entry not found")]
    NoEntry,
    #[error("keychain unavailable: {0}")]
    Unavailable(String),
    #[error("invalid master key format")]
    InvalidMasterKey,
}

/// OS Keychain 기반 백엔드
pub struct KeychainBackend {
    service: String,
    account: String,
    master_key: Mutex<Option<MasterKey>>,
}

impl KeychainBackend {
    pub fn new() -> Self {
        Self::with_entry(KEYCHAIN_SERVICE, MASTER_KEY_KEYCHAIN_KEY)
    }

    pub fn with_entry(service: &str, account: &str) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
            master_key: Mutex::new(None),
        }
    }

    /// 마스터키를 (필요 시 로드/생성하여) 빌려줌
    fn with_master_key<R>(
        &self,
        f: impl FnOnce(&[u8; MASTER_KEY_LEN]) -> R,
    ) -> Result<R, StorageError> {
        let mut guard = self
            .master_key
            .lock()
            .map_err(|_| StorageError::EncryptionUnavailable("key state poisoned".to_string()))?;

        if guard.is_none() {
            let bytes = self
                .load_or_create_master_key()
                .map_err(|e| StorageError::EncryptionUnavailable(e.to_string()))?;
            *guard = Some(MasterKey { bytes });
        }

        match guard.as_ref() {
            Some(key) => Ok(f(&key.bytes)),
            None => Err(StorageError::EncryptionUnavailable(
                "master key not loaded".to_string(),
            )),
        }
    }

    fn load_or_create_master_key(&self) -> Result<[u8; MASTER_KEY_LEN], KeychainError> {
        match self.load_master_key_from_keychain() {
            Ok(key) => {
                log::info!("[SecureStorage] Master key loaded from keychain");
                Ok(key)
            }
            Err(KeychainError::NoEntry) => {
                log::info!("[SecureStorage] No master key found, generating new one");
                let new_key = Self::generate_master_key();
                self.save_master_key_to_keychain(&new_key)?;
                Ok(new_key)
            }
            Err(e) => {
                log::warn!("[SecureStorage] Keychain unusable: {}", e);
                Err(e)
            }
        }
    }

    /// 마스터키 생성 (CSPRNG)
    fn generate_master_key() -> [u8; MASTER_KEY_LEN] {
        let mut key = [0u8; MASTER_KEY_LEN];
        rand::thread_rng().fill(&mut key);
        key
    }

    fn entry(&self) -> Result<Entry, KeychainError> {
        Entry::new(&self.service, &self.account)
            .map_err(|e| KeychainError::Unavailable(e.to_string()))
    }

    fn load_master_key_from_keychain(&self) -> Result<[u8; MASTER_KEY_LEN], KeychainError> {
        let password = match self.entry()?.get_password() {
            Ok(password) => password,
            Err(keyring::Error::NoEntry) => return Err(KeychainError::NoEntry),
            Err(e) => return Err(KeychainError::Unavailable(e.to_string())),
        };

        let mut bytes = BASE64
            .decode(&password)
            .map_err(|_| KeychainError::InvalidMasterKey)?;
        if bytes.len() != MASTER_KEY_LEN {
            bytes.zeroize();
            return Err(KeychainError::InvalidMasterKey);
        }

        let mut key = [0u8; MASTER_KEY_LEN];
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(key)
    }

    fn save_master_key_to_keychain(&self, key: &[u8; MASTER_KEY_LEN]) -> Result<(), KeychainError> {
        let mut encoded = BASE64.encode(key);
        let result = self
            .entry()?
            .set_password(&encoded)
            .map_err(|e| KeychainError::Unavailable(e.to_string()));
        encoded.zeroize();
        result
    }
}

impl Default for KeychainBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretBackend for KeychainBackend {
    fn is_available(&self) -> bool {
        self.with_master_key(|_| ()).is_ok()
    }

    fn encrypt_string(&self, plain_text: &str) -> Result<Vec<u8>, StorageError> {
        self.with_master_key(|key| envelope::seal(key, plain_text))?
            .map_err(StorageError::from)
    }

    fn decrypt_string(&self, sealed: &[u8]) -> Result<String, StorageError> {
        self.with_master_key(|key| envelope::open(key, sealed))?
            .map_err(StorageError::from)
    }
}
