//! 업데이트 상태

use semver::Version;
use serde::Serialize;

use crate::updater::progress::DownloadProgress;

/// 업데이트 상태 머신
///
/// 전진만 허용. 예외: `Failed → Idle` (다음 확인), `Checking → Idle` (업데이트 없음),
/// `Available → Idle` (제안 중 재확인에서 피드가 릴리스를 내린 경우)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum UpdateState {
    Idle,
    Checking,
    Available {
        version: Version,
        #[serde(rename = "artifactRef")]
        artifact_ref: String,
    },
    Downloading {
        version: Version,
        progress: DownloadProgress,
    },
    Downloaded {
        version: Version,
    },
    Installing,
    Failed {
        reason: String,
    },
}

impl UpdateState {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateState::Idle => "idle",
            UpdateState::Checking => "checking",
            UpdateState::Available { .. } => "available",
            UpdateState::Downloading { .. } => "downloading",
            UpdateState::Downloaded { .. } => "downloaded",
            UpdateState::Installing => "installing",
            UpdateState::Failed { .. } => "failed",
        }
    }

    /// 다운로드/설치가 진행 중이거나 설치 대기 중이면 새 확인을 하지 않음
    pub fn blocks_check(&self) -> bool {
        matches!(
            self,
            UpdateState::Downloading { .. } | UpdateState::Downloaded { .. } | UpdateState::Installing
        )
    }
}
