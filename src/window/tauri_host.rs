//! Tauri 창 구현
//!
//! `SurfaceHost`를 Tauri WebviewWindow로 구현합니다.
//! - 스플래시: 프레임 없음, 항상 위, 번들된 `splash.html`
//! - 메인: 숨김 상태로 원격 URL 로드, 전용 데이터 디렉토리, 줌 고정, 브리지 스크립트 주입
//! - 메인 생성 전 HTTP 캐시 정리, 새 창 요청은 팝업 없이 네비게이션 정책으로 처리

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tauri::webview::{NewWindowResponse, PageLoadEvent};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind, MessageDialogResult};
use url::Url;

use crate::config::{WindowSettings, BROWSING_PARTITION};
use crate::error::{LoadFailureCause, ShellError};
use crate::lifecycle::ShellCoordinator;
use crate::window::manager::SurfaceHost;
use crate::window::navigation::{self, NavigationDecision, NewWindowDecision};
use crate::window::state::{ContentFailure, FailureChoice, RevealTrigger};
use crate::window::{cache, probe, MAIN_LABEL, SPLASH_LABEL};

const WINDOW_TITLE: &str = "Purity Trading";
const CONTENT_BRIDGE_SCRIPT: &str = include_str!("content_bridge.js");
const CLOSE_LABEL: &str = "Close";
const KEEP_OPEN_LABEL: &str = "Keep Open";

pub struct TauriSurfaceHost {
    app: AppHandle,
    settings: WindowSettings,
    http: reqwest::Client,
    data_dir: Option<PathBuf>,
    /// HTTP 캐시를 지울 디렉토리 (파티션 + 앱 캐시)
    cache_roots: Vec<PathBuf>,
}

impl TauriSurfaceHost {
    pub fn new(app: AppHandle, settings: WindowSettings) -> Self {
        let data_dir = match app.path().app_local_data_dir() {
            Ok(dir) => Some(dir.join(BROWSING_PARTITION)),
            Err(e) => {
                log::warn!("[WindowManager] no local data dir, using default webview storage: {}", e);
                None
            }
        };
        let mut cache_roots: Vec<PathBuf> = data_dir.iter().cloned().collect();
        if let Ok(dir) = app.path().app_cache_dir() {
            cache_roots.push(dir);
        }
        let http = probe::build_client(settings.probe_timeout);
        Self {
            app,
            settings,
            http,
            data_dir,
            cache_roots,
        }
    }

    fn main_window(&self) -> Option<WebviewWindow> {
        self.app.get_webview_window(MAIN_LABEL)
    }
}

fn on_main_page_load(window: &WebviewWindow, event: PageLoadEvent, url: &Url) {
    match event {
        PageLoadEvent::Started => log::debug!("[WindowManager] page-load started: {}", url),
        PageLoadEvent::Finished => {
            log::info!("[WindowManager] page-load finished: {}", url);
            if let Some(coordinator) = window.app_handle().try_state::<Arc<ShellCoordinator>>() {
                coordinator.windows().reveal(RevealTrigger::LoadFinished);
            }
        }
    }
}

fn allow_navigation(url: &Url, content_host: &str) -> bool {
    match navigation::decide(url, content_host) {
        NavigationDecision::Allow => true,
        NavigationDecision::OpenExternal => {
            navigation::open_external(url);
            false
        }
        NavigationDecision::Block => {
            log::warn!("[Navigation] blocked navigation to {}", url);
            false
        }
    }
}

/// 새 창 요청은 항상 거부하고 대상만 정책대로 처리
fn route_new_window(app: &AppHandle, url: Url, content_host: &str) {
    match navigation::decide_new_window(&url, content_host) {
        NewWindowDecision::LoadInMain => {
            let Some(window) = app.get_webview_window(MAIN_LABEL) else {
                return;
            };
            log::info!("[Navigation] loading new-window request in main: {}", url);
            // 콜백 안에서 바로 navigate하지 않고 다음 틱으로 미룸
            tauri::async_runtime::spawn(async move {
                if let Err(e) = window.navigate(url) {
                    log::warn!("[Navigation] failed to load new-window request: {}", e);
                }
            });
        }
        NewWindowDecision::OpenExternal => navigation::open_external(&url),
        NewWindowDecision::Ignore => log::warn!("[Navigation] ignored new-window request to {}", url),
    }
}

impl SurfaceHost for TauriSurfaceHost {
    fn create_splash(&self) -> Result<(), ShellError> {
        let size = self.settings.splash_size;
        let builder = WebviewWindowBuilder::new(
            &self.app,
            SPLASH_LABEL,
            WebviewUrl::App("splash.html".into()),
        )
        .title(WINDOW_TITLE)
        .inner_size(size.width, size.height)
        .decorations(false)
        .always_on_top(true)
        .resizable(false)
        .skip_taskbar(true)
        .center();

        #[cfg(not(target_os = "macos"))]
        let builder = builder.transparent(true);

        builder.build()?;
        Ok(())
    }

    fn destroy_splash(&self) {
        if let Some(splash) = self.app.get_webview_window(SPLASH_LABEL) {
            if let Err(e) = splash.destroy() {
                log::warn!("[WindowManager] failed to destroy splash: {}", e);
            }
        }
    }

    fn create_main(&self, source: &Url) -> Result<(), ShellError> {
        let content_host = self.settings.content_host.clone();
        let popup_host = self.settings.content_host.clone();
        let popup_app = self.app.clone();
        let size = self.settings.main_size;
        let min_size = self.settings.main_min_size;

        let cleared = cache::clear_http_cache(&self.cache_roots);
        if cleared > 0 {
            log::info!("[WindowManager] cleared {} http cache directories", cleared);
        }

        let mut builder = WebviewWindowBuilder::new(
            &self.app,
            MAIN_LABEL,
            WebviewUrl::External(source.clone()),
        )
        .title(WINDOW_TITLE)
        .inner_size(size.width, size.height)
        .min_inner_size(min_size.width, min_size.height)
        .visible(false)
        .zoom_hotkeys_enabled(false)
        .initialization_script(CONTENT_BRIDGE_SCRIPT)
        .on_navigation(move |url| allow_navigation(url, &content_host))
        .on_new_window(move |url, _features| {
            route_new_window(&popup_app, url, &popup_host);
            NewWindowResponse::Deny
        })
        .on_page_load(|window, payload| on_main_page_load(&window, payload.event(), payload.url()));

        if let Some(dir) = &self.data_dir {
            builder = builder.data_directory(dir.clone());
        }

        let window = builder.build()?;
        if let Err(e) = window.set_zoom(self.settings.zoom_factor) {
            log::warn!("[WindowManager] failed to pin zoom factor: {}", e);
        }
        Ok(())
    }

    fn reload_main(&self, source: &Url) -> Result<(), ShellError> {
        match self.main_window() {
            Some(window) => {
                window.navigate(source.clone())?;
                Ok(())
            }
            None => self.create_main(source),
        }
    }

    fn show_main(&self) {
        if let Some(window) = self.main_window() {
            if let Err(e) = window.show() {
                log::warn!("[WindowManager] failed to show main window: {}", e);
            }
            if let Err(e) = window.set_focus() {
                log::warn!("[WindowManager] failed to focus main window: {}", e);
            }
        }
    }

    fn maximize_main(&self) {
        if let Some(window) = self.main_window() {
            if let Err(e) = window.maximize() {
                log::warn!("[WindowManager] failed to maximize main window: {}", e);
            }
        }
    }

    fn close_main(&self) {
        if let Some(window) = self.main_window() {
            if let Err(e) = window.close() {
                log::warn!("[WindowManager] failed to close main window: {}", e);
            }
        }
    }

    fn main_in_foreground(&self) -> bool {
        let Some(window) = self.main_window() else {
            return false;
        };
        let visible = window.is_visible().unwrap_or(false);
        let minimized = window.is_minimized().unwrap_or(true);
        visible && !minimized
    }

    fn probe_content(
        &self,
        source: &Url,
    ) -> impl Future<Output = Result<(), LoadFailureCause>> + Send {
        let client = self.http.clone();
        let url = source.clone();
        async move { probe::probe_content_url(&client, &url).await }
    }

    fn show_failure(&self, failure: &ContentFailure, on_choice: Box<dyn FnOnce(FailureChoice) + Send>) {
        let retry_label = failure.retry_label();
        self.app
            .dialog()
            .message(failure.message())
            .title(failure.title())
            .kind(MessageDialogKind::Error)
            .buttons(MessageDialogButtons::YesNoCancelCustom(
                retry_label.to_string(),
                CLOSE_LABEL.to_string(),
                KEEP_OPEN_LABEL.to_string(),
            ))
            .show_with_result(move |result| on_choice(failure_choice(&result, retry_label)));
    }
}

/// 대화상자 결과 → 사용자 선택. 알 수 없는 결과는 닫지 않고 Dismiss로 취급
fn failure_choice(result: &MessageDialogResult, retry_label: &str) -> FailureChoice {
    match result {
        MessageDialogResult::Yes | MessageDialogResult::Ok => FailureChoice::Retry,
        MessageDialogResult::No => FailureChoice::Close,
        MessageDialogResult::Custom(label) if label == retry_label => FailureChoice::Retry,
        MessageDialogResult::Custom(label) if label == CLOSE_LABEL => FailureChoice::Close,
        _ => FailureChoice::Dismiss,
    }
}
