//! 업데이트 결정 지점
//!
//! 사용자 응답을 콜백 체인 대신 `Decision` 값으로 돌려줍니다.

use std::future::Future;

use semver::Version;
use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Defer,
}

#[derive(Debug, Clone)]
pub struct UpdateOffer {
    pub version: Version,
    pub current_version: Version,
    pub release_notes: Option<String>,
}

pub trait UpdatePrompter: Send + Sync + 'static {
    /// 지금 업데이트 / 나중에
    fn confirm_download(&self, offer: &UpdateOffer) -> impl Future<Output = Decision> + Send;

    /// 지금 재시작 / 나중에 (다음 종료 시 설치)
    fn confirm_restart(&self, version: &Version) -> impl Future<Output = Decision> + Send;
}

/// 네이티브 대화상자 기반 prompter (비차단)
pub struct DialogPrompter {
    app: AppHandle,
}

impl DialogPrompter {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn ask(&self, title: &str, message: String, yes: &str, no: &str) -> impl Future<Output = Decision> + Send {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Info)
            .buttons(MessageDialogButtons::OkCancelCustom(yes.to_string(), no.to_string()))
            .show(move |accepted| {
                let _ = tx.send(accepted);
            });

        async move {
            match rx.await {
                Ok(true) => Decision::Proceed,
                _ => Decision::Defer,
            }
        }
    }
}

fn download_message(offer: &UpdateOffer) -> String {
    let mut message = format!(
        "Purity Trading {} is available (you have {}).\nDo you want to download it now?",
        offer.version, offer.current_version
    );
    if let Some(notes) = offer.release_notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        message.push_str("\n\nWhat's new:\n");
        message.push_str(notes);
    }
    message
}

impl UpdatePrompter for DialogPrompter {
    fn confirm_download(&self, offer: &UpdateOffer) -> impl Future<Output = Decision> + Send {
        self.ask("Update Available", download_message(offer), "Update Now", "Later")
    }

    fn confirm_restart(&self, version: &Version) -> impl Future<Output = Decision> + Send {
        self.ask(
            "Update Ready",
            format!(
                "Purity Trading {version} has been downloaded.\nRestart now to apply it, or it will be installed when you quit."
            ),
            "Restart & Install",
            "Later",
        )
    }
}
