//! Purity Trading Desktop - Tauri Shell Library
//!
//! 원격 트레이딩 웹앱을 네이티브 창으로 감싸는 셸입니다.
//! 스플래시/메인 창 전환, 자동 업데이트, OS 키 저장소 기반 암호화 브리지를 담당합니다.

pub mod commands;
pub mod config;
pub mod error;
pub mod lifecycle;
mod logging;
pub mod secure_storage;
pub mod updater;
pub mod window;

use std::sync::Arc;

use tauri::{Manager, RunEvent, WindowEvent};

use crate::config::ShellConfig;
use crate::lifecycle::{AppLifecycleCoordinator, ExitDecision, ShellCoordinator};
use crate::secure_storage::{KeychainBackend, SecureStorageBridge};
use crate::updater::{DialogPrompter, TauriUpdateFeed, UpdateController};
use crate::window::{runtime_spawner, ShellWindowManager, TauriSurfaceHost, MAIN_LABEL, SPLASH_LABEL};

/// Tauri 앱 실행
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let packaged = !tauri::is_dev();

    tauri::Builder::default()
        .plugin(logging::plugin(packaged))
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .setup(move |app| {
            // Dev 환경에서는 .env.local 의 업데이트 주기 등 override 를 읽음
            let config = ShellConfig::load(packaged)?;
            let handle = app.handle().clone();

            let host = TauriSurfaceHost::new(handle.clone(), config.window.clone());
            let windows = ShellWindowManager::new(host, config.window.clone(), runtime_spawner());
            let coordinator: Arc<ShellCoordinator> =
                Arc::new(AppLifecycleCoordinator::new(config.clone(), windows));

            let bridge = SecureStorageBridge::new(
                Arc::new(KeychainBackend::new()),
                config.window.content_url.clone(),
            );
            app.manage(Arc::new(bridge));
            app.manage(Arc::clone(&coordinator));

            coordinator.on_startup()?;

            if config.packaged {
                let feed = TauriUpdateFeed::new(handle.clone())?;
                let controller = UpdateController::new(
                    feed,
                    DialogPrompter::new(handle),
                    config.update.clone(),
                    config.packaged,
                );
                coordinator.attach_updates(Arc::new(controller));
            }

            Ok(())
        })
        .on_window_event(|window, event| {
            if !matches!(event, WindowEvent::Destroyed) {
                return;
            }
            let Some(coordinator) = window.try_state::<Arc<ShellCoordinator>>() else {
                return;
            };
            match window.label() {
                MAIN_LABEL => coordinator.on_main_closed(),
                SPLASH_LABEL => coordinator.windows().forget_splash(),
                _ => {}
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::secure_storage::secure_storage_encrypt,
            commands::secure_storage::secure_storage_decrypt,
            commands::shell::shell_content_ready,
            commands::shell::shell_heartbeat,
            commands::shell::shell_get_status,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            let Some(coordinator) = app_handle.try_state::<Arc<ShellCoordinator>>() else {
                return;
            };
            match event {
                // code가 None이면 마지막 창이 닫혀서 발생한 요청
                RunEvent::ExitRequested { code: None, api, .. } => {
                    if coordinator.on_all_windows_closed() == ExitDecision::KeepRunning {
                        api.prevent_exit();
                    }
                }
                RunEvent::Exit => coordinator.on_exit(),
                #[cfg(target_os = "macos")]
                RunEvent::Reopen { .. } => {
                    if let Err(e) = coordinator.on_reactivate() {
                        log::error!("[Lifecycle] failed to recreate main window: {}", e);
                    }
                }
                _ => {}
            }
        });
}
