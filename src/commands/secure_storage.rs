//! Secure Storage Commands
//!
//! `window.purityDesktop.secureStorage` (및 `window.electron.secureStorage`) encrypt/decrypt의 호스트 측 구현.
//! 평문과 envelope는 로그에 남기지 않습니다.

use std::sync::Arc;

use tauri::{State, Webview};

use crate::commands::caller_context;
use crate::error::CommandResult;
use crate::secure_storage::{SecretEnvelope, SecureStorageBridge};

#[tauri::command]
pub async fn secure_storage_encrypt(
    webview: Webview,
    bridge: State<'_, Arc<SecureStorageBridge>>,
    plain_text: String,
) -> CommandResult<SecretEnvelope> {
    let caller = caller_context(&webview);
    bridge.encrypt(&caller, plain_text).await.map_err(|e| {
        log::warn!("[SecureStorage] encrypt rejected for {}: {}", caller.webview_label, e);
        e.into()
    })
}

#[tauri::command]
pub async fn secure_storage_decrypt(
    webview: Webview,
    bridge: State<'_, Arc<SecureStorageBridge>>,
    envelope: SecretEnvelope,
) -> CommandResult<String> {
    let caller = caller_context(&webview);
    bridge.decrypt(&caller, envelope).await.map_err(|e| {
        log::warn!("[SecureStorage] decrypt rejected for {}: {}", caller.webview_label, e);
        e.into()
    })
}
