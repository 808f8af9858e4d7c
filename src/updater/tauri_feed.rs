//! tauri-plugin-updater 기반 피드 클라이언트
//!
//! 엔드포인트와 공개키는 `tauri.conf.json`의 `plugins.updater`에서 읽습니다.
//! 서명 검증은 플러그인의 `download`가 수행합니다.

use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

use semver::Version;
use tauri::AppHandle;
use tauri_plugin_updater::{Update, UpdaterExt};

use crate::error::ShellError;
use crate::updater::feed::{ArtifactHandle, AvailableUpdate, ProgressSink, UpdateCheck, UpdateFeed};
use crate::updater::progress::ProgressTracker;
use crate::updater::version;

pub struct TauriUpdateFeed {
    app: AppHandle,
    current: Version,
}

impl TauriUpdateFeed {
    pub fn new(app: AppHandle) -> Result<Self, ShellError> {
        let current = version::parse(&app.package_info().version.to_string())?;
        Ok(Self { app, current })
    }

    fn install(&self, handle: &ArtifactHandle<Update>) -> Result<(), ShellError> {
        log::info!("[Updater] installing version {}", handle.version());
        handle
            .artifact()
            .install(handle.bytes())
            .map_err(|e| ShellError::UpdateInstallFailure(e.to_string()))
    }
}

impl UpdateFeed for TauriUpdateFeed {
    type Artifact = Update;

    fn current_version(&self) -> &Version {
        &self.current
    }

    fn check_for_update(
        &self,
    ) -> impl Future<Output = Result<UpdateCheck<Update>, ShellError>> + Send {
        let app = self.app.clone();
        let current = self.current.clone();
        async move {
            let updater = app
                .updater()
                .map_err(|e| ShellError::UpdateCheckFailure(e.to_string()))?;
            let Some(update) = updater
                .check()
                .await
                .map_err(|e| ShellError::UpdateCheckFailure(e.to_string()))?
            else {
                return Ok(UpdateCheck::NoUpdate);
            };

            let remote = version::parse(&update.version)?;
            if !version::is_newer(&current, &remote) {
                log::debug!("[Updater] feed reports {} which is not newer than {}", remote, current);
                return Ok(UpdateCheck::NoUpdate);
            }

            Ok(UpdateCheck::Available(AvailableUpdate {
                version: remote,
                artifact_ref: update.download_url.to_string(),
                release_notes: update.body.clone(),
                artifact: update,
            }))
        }
    }

    fn download(
        &self,
        update: &AvailableUpdate<Update>,
        progress: ProgressSink,
    ) -> impl Future<Output = Result<ArtifactHandle<Update>, ShellError>> + Send {
        let available = update.clone();
        async move {
            let session = Mutex::new((ProgressTracker::new(Instant::now()), progress));
            let report = |finished: bool, chunk_len: usize, content_length: Option<u64>| {
                if let Ok(mut session) = session.lock() {
                    let (tracker, sink) = &mut *session;
                    let now = Instant::now();
                    let snapshot = if finished {
                        tracker.finish(now)
                    } else {
                        tracker.advance(chunk_len as u64, content_length, now)
                    };
                    sink(snapshot);
                }
            };
            let bytes = available
                .artifact
                .download(
                    |chunk_len, content_length| report(false, chunk_len, content_length),
                    || report(true, 0, None),
                )
                .await
                .map_err(|e| ShellError::UpdateDownloadFailure(e.to_string()))?;

            Ok(ArtifactHandle::verified(available.version, available.artifact, bytes))
        }
    }

    fn apply_and_restart(&self, handle: ArtifactHandle<Update>) -> Result<(), ShellError> {
        self.install(&handle)?;
        log::info!("[Updater] restarting to finish update");
        self.app.restart()
    }

    fn apply_on_exit(&self, handle: ArtifactHandle<Update>) -> Result<(), ShellError> {
        self.install(&handle)
    }
}
