//! 앱 수명주기 조율
//!
//! 프로세스 이벤트(시작, 모든 창 닫힘, 재활성화, 종료)를 창 관리자와 업데이트
//! 컨트롤러로 전달합니다. Tauri managed state로 프로세스 전역에 하나만 존재합니다.

use std::sync::{Arc, OnceLock};

use serde::Serialize;

use crate::config::ShellConfig;
use crate::error::ShellError;
use crate::updater::{BackgroundUpdates, UpdateSnapshot};
use crate::window::{ShellWindowManager, SurfaceHost, TauriSurfaceHost, WindowSnapshot};

pub type ShellCoordinator = AppLifecycleCoordinator<TauriSurfaceHost>;

/// 모든 창이 닫혔을 때의 처리
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// 프로세스 유지 (macOS: Dock에서 다시 열 수 있음)
    KeepRunning,
    Quit(i32),
}

/// `shell_get_status` 응답
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellStatus {
    pub app_version: String,
    pub packaged: bool,
    pub content_url: String,
    pub window: WindowSnapshot,
    pub updates: Option<UpdateSnapshot>,
}

pub struct AppLifecycleCoordinator<H: SurfaceHost> {
    config: ShellConfig,
    windows: Arc<ShellWindowManager<H>>,
    updates: OnceLock<Arc<dyn BackgroundUpdates>>,
    /// 마지막 창이 닫혀도 프로세스를 유지하는 플랫폼인지
    persistent_platform: bool,
}

impl<H: SurfaceHost> AppLifecycleCoordinator<H> {
    pub fn new(config: ShellConfig, windows: Arc<ShellWindowManager<H>>) -> Self {
        Self {
            config,
            windows,
            updates: OnceLock::new(),
            persistent_platform: cfg!(target_os = "macos"),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn windows(&self) -> &Arc<ShellWindowManager<H>> {
        &self.windows
    }

    /// 스플래시 → 메인 로드 시작, 렌더러 감시 시작
    pub fn on_startup(&self) -> Result<(), ShellError> {
        log::info!(
            "[Lifecycle] starting ({} build, content {})",
            if self.config.packaged { "packaged" } else { "development" },
            self.config.window.content_url
        );

        if let Err(e) = self.windows.create_splash() {
            // 스플래시 없이도 메인은 로드
            log::warn!("[Lifecycle] failed to create splash: {}", e);
        }
        self.windows.create_main()?;
        self.windows.start_watchdog();
        Ok(())
    }

    /// 패키징 빌드에서만 업데이트 컨트롤러 연결 및 시작
    pub fn attach_updates(&self, updates: Arc<dyn BackgroundUpdates>) {
        if !self.config.packaged {
            log::info!("[Lifecycle] development build, updater not started");
            return;
        }
        if self.updates.set(Arc::clone(&updates)).is_err() {
            log::warn!("[Lifecycle] updater already attached");
            return;
        }
        updates.start();
    }

    pub fn on_main_closed(&self) {
        self.windows.teardown();
    }

    pub fn on_all_windows_closed(&self) -> ExitDecision {
        let decision = if self.persistent_platform {
            ExitDecision::KeepRunning
        } else {
            ExitDecision::Quit(0)
        };
        log::info!("[Lifecycle] all windows closed: {:?}", decision);
        decision
    }

    /// Dock 클릭 등으로 앱이 다시 활성화됨. 메인 창이 없을 때만 새로 만듦
    pub fn on_reactivate(&self) -> Result<(), ShellError> {
        if self.windows.has_main() {
            return Ok(());
        }
        log::info!("[Lifecycle] reactivated without a main window, recreating");
        self.windows.create_main()?;
        Ok(())
    }

    /// 자발적 종료. 설치 대기 중인 업데이트가 있으면 설치
    pub fn on_exit(&self) {
        log::info!("[Lifecycle] exiting");
        if let Some(updates) = self.updates.get() {
            updates.install_staged_on_exit();
        }
    }

    pub fn status(&self) -> ShellStatus {
        ShellStatus {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            packaged: self.config.packaged,
            content_url: self.config.window.content_url.to_string(),
            window: self.windows.snapshot(),
            updates: self.updates.get().map(|updates| updates.snapshot()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::UpdateState;
    use crate::window::manager::tests::{FakeHost, HostCall, TaskQueue};
    use crate::window::{RevealTrigger, WindowState};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeUpdates {
        started: AtomicUsize,
        installs: AtomicUsize,
    }

    impl BackgroundUpdates for FakeUpdates {
        fn start(self: Arc<Self>) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn snapshot(&self) -> UpdateSnapshot {
            UpdateSnapshot {
                enabled: true,
                current_version: "2.1.0".to_string(),
                state: UpdateState::Idle,
                last_checked_at: None,
                auto_download: false,
                check_interval_secs: 1800,
                staged_version: None,
            }
        }

        fn install_staged_on_exit(&self) {
            self.installs.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator(packaged: bool) -> (AppLifecycleCoordinator<FakeHost>, TaskQueue) {
        let config = ShellConfig::from_lookup(packaged, |_| None).unwrap();
        let queue = TaskQueue::default();
        let windows = ShellWindowManager::new(FakeHost::new(), config.window.clone(), queue.spawner());
        (AppLifecycleCoordinator::new(config, windows), queue)
    }

    #[test]
    fn startup_creates_splash_then_main() {
        let (shell, _queue) = coordinator(true);
        shell.on_startup().unwrap();

        let calls = shell.windows().host().calls.lock().unwrap().clone();
        assert_eq!(calls, vec![HostCall::CreateSplash, HostCall::CreateMain]);
        assert_eq!(shell.windows().state(), WindowState::MainLoading);
    }

    #[test]
    fn reactivation_recreates_main_only_after_close() {
        let (shell, _queue) = coordinator(true);
        shell.on_startup().unwrap();
        shell.windows().reveal(RevealTrigger::ContentReady);

        shell.on_reactivate().unwrap();
        assert_eq!(shell.windows().host().count(&HostCall::CreateMain), 1);

        shell.on_main_closed();
        assert_eq!(shell.windows().state(), WindowState::Closed);
        shell.on_reactivate().unwrap();
        assert_eq!(shell.windows().host().count(&HostCall::CreateMain), 2);
        assert_eq!(shell.windows().state(), WindowState::MainLoading);
    }

    #[test]
    fn all_windows_closed_quits_with_zero_except_on_persistent_platforms() {
        let (mut shell, _queue) = coordinator(true);
        shell.persistent_platform = false;
        assert_eq!(shell.on_all_windows_closed(), ExitDecision::Quit(0));

        shell.persistent_platform = true;
        assert_eq!(shell.on_all_windows_closed(), ExitDecision::KeepRunning);
    }

    #[test]
    fn updater_runs_only_in_packaged_builds() {
        let (dev, _queue) = coordinator(false);
        let updates = Arc::new(FakeUpdates::default());
        dev.attach_updates(updates.clone());
        dev.on_exit();
        assert_eq!(updates.started.load(Ordering::SeqCst), 0);
        assert_eq!(updates.installs.load(Ordering::SeqCst), 0);
        assert!(dev.status().updates.is_none());

        let (packaged, _queue) = coordinator(true);
        packaged.attach_updates(updates.clone());
        packaged.attach_updates(updates.clone());
        assert_eq!(updates.started.load(Ordering::SeqCst), 1);

        packaged.on_exit();
        assert_eq!(updates.installs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_reports_window_and_update_state() {
        let (shell, _queue) = coordinator(true);
        shell.attach_updates(Arc::new(FakeUpdates::default()));
        shell.on_startup().unwrap();

        let status = shell.status();
        assert!(status.packaged);
        assert_eq!(status.content_url, "https://puritytrading.vercel.app/");
        assert_eq!(status.window.state, WindowState::MainLoading);
        assert_eq!(status.window.load_attempt, 1);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["updates"]["state"]["state"], "idle");
        assert_eq!(json["window"]["loadAttempt"], 1);
    }
}
