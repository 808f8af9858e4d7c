//! Shell Error Types
//!
//! 애플리케이션 전역 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

use crate::secure_storage::StorageError;

/// 원격 콘텐츠 로드 실패 원인
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailureCause {
    /// DNS 조회 또는 TCP/TLS 연결 실패
    #[error("the server could not be reached ({0})")]
    Unreachable(String),
    #[error("the server did not respond in time")]
    Timeout,
    /// 서버가 오류 상태 코드로 응답
    #[error("the server responded with HTTP {0}")]
    HttpStatus(u16),
    #[error("the response was invalid ({0})")]
    Invalid(String),
}

/// 셸 에러
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Update check failed: {0}")]
    UpdateCheckFailure(String),

    #[error("Update download failed: {0}")]
    UpdateDownloadFailure(String),

    #[error("Update install failed: {0}")]
    UpdateInstallFailure(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Window error: {0}")]
    Window(#[from] tauri::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Tauri 명령 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<ShellError> for CommandError {
    fn from(error: ShellError) -> Self {
        if let ShellError::Storage(storage) = error {
            return storage.into();
        }

        let code = match &error {
            ShellError::UpdateCheckFailure(_) => "UPDATE_CHECK_FAILURE",
            ShellError::UpdateDownloadFailure(_) => "UPDATE_DOWNLOAD_FAILURE",
            ShellError::UpdateInstallFailure(_) => "UPDATE_INSTALL_FAILURE",
            ShellError::Storage(_) => "SECURE_STORAGE_ERROR",
            ShellError::Window(_) => "WINDOW_ERROR",
            ShellError::Config(_) => "CONFIG_ERROR",
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(error: StorageError) -> Self {
        let code = match &error {
            StorageError::EncryptionUnavailable(_) => "ENCRYPTION_UNAVAILABLE",
            StorageError::InvalidRequest(_) => "INVALID_REQUEST",
            StorageError::Forbidden => "FORBIDDEN",
            StorageError::Envelope(_) => "INVALID_ENVELOPE",
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

/// Tauri 명령 결과 타입
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_own_code() {
        let error: CommandError =
            ShellError::Storage(StorageError::EncryptionUnavailable("locked".to_string())).into();
        assert_eq!(error.code, "ENCRYPTION_UNAVAILABLE");
    }

    #[test]
    fn update_errors_map_to_their_stage() {
        let error: CommandError = ShellError::UpdateDownloadFailure("HTTP 502".to_string()).into();
        assert_eq!(error.code, "UPDATE_DOWNLOAD_FAILURE");
        assert!(error.message.contains("HTTP 502"));
    }
}
