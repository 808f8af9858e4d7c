//! Shell Commands
//!
//! 브리지 스크립트가 보내는 내부 신호 (첫 페인트, heartbeat)와 상태 조회

use std::sync::Arc;

use tauri::{State, Webview};
use url::Url;

use crate::commands::caller_context;
use crate::error::{CommandError, CommandResult};
use crate::lifecycle::{ShellCoordinator, ShellStatus};
use crate::secure_storage::CallerContext;
use crate::window::navigation;
use crate::window::{RevealTrigger, MAIN_LABEL};

/// 메인 webview가 콘텐츠 origin에 있을 때만 신호를 받음
fn ensure_main_content(caller: &CallerContext, content_url: &Url) -> CommandResult<()> {
    let on_content = caller
        .url
        .as_ref()
        .map(|url| navigation::is_same_origin(url, content_url))
        .unwrap_or(false);
    if caller.webview_label == MAIN_LABEL && on_content {
        return Ok(());
    }
    Err(CommandError {
        code: "FORBIDDEN".to_string(),
        message: "Shell signals are accepted only from the application view.".to_string(),
        details: Some(caller.webview_label.clone()),
    })
}

/// 첫 페인트 완료
#[tauri::command]
pub fn shell_content_ready(
    webview: Webview,
    coordinator: State<'_, Arc<ShellCoordinator>>,
) -> CommandResult<bool> {
    ensure_main_content(&caller_context(&webview), &coordinator.config().window.content_url)?;
    Ok(coordinator.windows().reveal(RevealTrigger::ContentReady))
}

#[tauri::command]
pub fn shell_heartbeat(
    webview: Webview,
    coordinator: State<'_, Arc<ShellCoordinator>>,
) -> CommandResult<()> {
    ensure_main_content(&caller_context(&webview), &coordinator.config().window.content_url)?;
    coordinator.windows().record_heartbeat();
    Ok(())
}

#[tauri::command]
pub fn shell_get_status(coordinator: State<'_, Arc<ShellCoordinator>>) -> CommandResult<ShellStatus> {
    Ok(coordinator.status())
}
