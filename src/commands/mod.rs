//! Tauri Commands Module
//!
//! 원격 페이지의 브리지 스크립트가 호출하는 Tauri 명령어 정의.
//! 원격 capability(`capabilities/remote.json`)가 허용하는 명령만 여기에 둡니다.

pub mod secure_storage;
pub mod shell;

use tauri::{Runtime, Webview};

use crate::secure_storage::CallerContext;

/// 호출한 webview의 label과 현재 URL
pub(crate) fn caller_context<R: Runtime>(webview: &Webview<R>) -> CallerContext {
    CallerContext {
        webview_label: webview.label().to_string(),
        url: webview.url().ok(),
    }
}
