//! 창 수명주기
//!
//! 스플래시 → 메인 창 전환(reveal), 네비게이션 정책, 렌더러 감시, Tauri 창 구현

pub mod cache;
pub mod manager;
pub mod navigation;
pub mod probe;
pub mod state;
pub mod tauri_host;
pub mod watchdog;

pub use manager::{runtime_spawner, ShellWindowManager, SurfaceHost, TaskSpawner};
pub use state::{ContentFailure, FailureChoice, RevealTrigger, WindowSnapshot, WindowState};
pub use tauri_host::TauriSurfaceHost;

pub const MAIN_LABEL: &str = "main";
pub const SPLASH_LABEL: &str = "splash";
