//! 창 상태 및 관련 타입

use serde::Serialize;
use thiserror::Error;

use crate::error::LoadFailureCause;

/// 창 수명주기 상태
///
/// `Closed → SplashOnly → MainLoading → MainRevealed → Closed`
/// (재활성화 시에는 `Closed → MainLoading`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindowState {
    SplashOnly,
    MainLoading,
    MainRevealed,
    Closed,
}

impl WindowState {
    pub fn has_main(self) -> bool {
        matches!(self, WindowState::MainLoading | WindowState::MainRevealed)
    }
}

/// 메인 창을 보여줄 수 있는 신호
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealTrigger {
    /// 첫 페인트 (브리지 스크립트가 보고)
    ContentReady,
    /// 문서 로드 완료
    LoadFinished,
    /// 로드 시작 후 고정 시간 경과
    Failsafe,
    /// 실패 대화상자를 선택 없이 닫음
    FailureDismissed,
}

impl RevealTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            RevealTrigger::ContentReady => "content-ready",
            RevealTrigger::LoadFinished => "load-finished",
            RevealTrigger::Failsafe => "failsafe",
            RevealTrigger::FailureDismissed => "failure-dismissed",
        }
    }
}

/// 사용자에게 보여줘야 하는 콘텐츠 실패
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentFailure {
    #[error("failed to load application: {0}")]
    Load(LoadFailureCause),
    #[error("application view stopped responding: {0}")]
    RendererCrash(String),
}

impl ContentFailure {
    pub fn title(&self) -> &'static str {
        match self {
            ContentFailure::Load(_) => "Unable to load Purity Trading",
            ContentFailure::RendererCrash(_) => "Purity Trading stopped responding",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ContentFailure::Load(cause) => format!(
                "Purity Trading could not be loaded because {cause}.\n\nCheck your internet connection and try again."
            ),
            ContentFailure::RendererCrash(reason) => format!(
                "The application view stopped responding ({reason}).\n\nRestarting the view is recommended."
            ),
        }
    }

    pub fn retry_label(&self) -> &'static str {
        match self {
            ContentFailure::Load(_) => "Retry",
            ContentFailure::RendererCrash(_) => "Restart View",
        }
    }
}

/// 실패 대화상자에서 사용자가 고른 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureChoice {
    Retry,
    Close,
    /// 창 닫기/Esc 등으로 대화상자만 닫음. 셸은 그대로 유지
    Dismiss,
}

/// 외부에 노출되는 읽기 전용 스냅샷
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub state: WindowState,
    pub revealed: bool,
    pub failure_pending: bool,
    pub load_attempt: u64,
}
