//! 자동 업데이트
//!
//! 원격 피드를 주기적으로 확인하고, 사용자 결정에 따라 다운로드/설치합니다.
//! 백그라운드 기능이므로 실패는 로그로만 남기고 다음 주기에 재시도합니다.

pub mod controller;
pub mod feed;
pub mod progress;
pub mod prompt;
pub mod state;
pub mod tauri_feed;
pub mod version;

pub use controller::{BackgroundUpdates, TickOutcome, UpdateController, UpdateSnapshot};
pub use feed::{ArtifactHandle, AvailableUpdate, UpdateCheck, UpdateFeed};
pub use progress::{DownloadProgress, ProgressTracker};
pub use prompt::{Decision, DialogPrompter, UpdateOffer, UpdatePrompter};
pub use state::UpdateState;
pub use tauri_feed::TauriUpdateFeed;
