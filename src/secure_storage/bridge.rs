//! SecureStorageBridge
//!
//! 격리된 페이지와 호스트 암호화 기능 사이의 유일한 통로.
//! 모든 요청은 호출자(webview label + 현재 origin)와 입력을 검증한 뒤 백엔드로 전달됩니다.

use std::sync::Arc;

use url::Url;

use crate::secure_storage::envelope::SecretEnvelope;
use crate::secure_storage::{SecretBackend, StorageError};
use crate::window::{navigation, MAIN_LABEL};

/// 평문 최대 길이 (1 MiB)
pub const MAX_PLAIN_TEXT_LEN: usize = 1024 * 1024;

/// 브리지를 호출한 webview 정보
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub webview_label: String,
    pub url: Option<Url>,
}

pub struct SecureStorageBridge {
    backend: Arc<dyn SecretBackend>,
    content_url: Url,
}

impl SecureStorageBridge {
    pub fn new(backend: Arc<dyn SecretBackend>, content_url: Url) -> Self {
        Self {
            backend,
            content_url,
        }
    }

    /// 콘텐츠 origin의 main webview만 허용
    pub fn authorize(&self, caller: &CallerContext) -> Result<(), StorageError> {
        if caller.webview_label != MAIN_LABEL {
            return Err(StorageError::Forbidden);
        }
        match &caller.url {
            Some(url) if navigation::is_same_origin(url, &self.content_url) => Ok(()),
            _ => Err(StorageError::Forbidden),
        }
    }

    pub async fn encrypt(
        &self,
        caller: &CallerContext,
        plain_text: String,
    ) -> Result<SecretEnvelope, StorageError> {
        self.authorize(caller)?;
        if plain_text.len() > MAX_PLAIN_TEXT_LEN {
            return Err(StorageError::InvalidRequest(format!(
                "plain text exceeds {MAX_PLAIN_TEXT_LEN} bytes"
            )));
        }
        let backend = Arc::clone(&self.backend);
        // 키체인 조회가 블로킹일 수 있으므로 가용성 확인도 블로킹 스레드에서
        let sealed = tokio::task::spawn_blocking(move || {
            ensure_available(backend.as_ref())?;
            backend.encrypt_string(&plain_text)
        })
            .await
            .map_err(|e| StorageError::EncryptionUnavailable(format!("backend task failed: {e}")))??;

        Ok(SecretEnvelope::from_sealed(&sealed))
    }

    pub async fn decrypt(
        &self,
        caller: &CallerContext,
        envelope: SecretEnvelope,
    ) -> Result<String, StorageError> {
        self.authorize(caller)?;

        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || {
            ensure_available(backend.as_ref())?;
            let sealed = envelope.to_sealed()?;
            backend.decrypt_string(&sealed)
        })
            .await
            .map_err(|e| StorageError::EncryptionUnavailable(format!("backend task failed: {e}")))?
    }

}

fn ensure_available(backend: &dyn SecretBackend) -> Result<(), StorageError> {
    if backend.is_available() {
        Ok(())
    } else {
        Err(StorageError::EncryptionUnavailable(
            "no usable OS secure-storage backend".to_string(),
        ))
    }
}
