//! 업데이트 컨트롤러
//!
//! 주기적으로 피드를 확인하고 상태 머신을 진행합니다.
//! - 확인 중 들어온 tick은 건너뜀 (대기열 없음)
//! - 사용자가 "나중에"를 고른 버전은 더 새로운 버전이 나올 때까지 다시 묻지 않음
//! - 실패는 로그만 남기고 다음 tick에서 `Idle`부터 재시도
//!
//! 상태 전이: `Idle → Checking → Available | Idle`. 이미 `Available`인 상태의 재확인은
//! `Checking`을 거치지 않으며(제안이 유지된 채 확인), 피드가 그 사이 릴리스를 내려
//! `NoUpdate`를 돌려주면 `Available → Idle`로 바로 돌아갑니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use semver::Version;
use serde::Serialize;
use tokio::time::MissedTickBehavior;

use crate::config::UpdatePolicy;
use crate::error::ShellError;
use crate::updater::feed::{ArtifactHandle, AvailableUpdate, ProgressSink, UpdateCheck, UpdateFeed};
use crate::updater::progress::DownloadProgress;
use crate::updater::prompt::{Decision, UpdateOffer, UpdatePrompter};
use crate::updater::state::UpdateState;

/// tick 결과 (로그와 테스트용)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 개발 모드
    Disabled,
    /// 다른 tick이 진행 중
    Coalesced,
    /// 다운로드/설치 진행 중 또는 설치 대기 중
    Busy,
    NoUpdate,
    /// 업데이트가 있지만 지금은 받지 않음
    Deferred,
    /// 다운로드 완료, 다음 종료 시 설치
    AwaitingRestart,
    Installing,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnapshot {
    pub enabled: bool,
    pub current_version: String,
    pub state: UpdateState,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub auto_download: bool,
    pub check_interval_secs: u64,
    pub staged_version: Option<String>,
}

/// 코디네이터가 보는 업데이트 서비스 (피드/prompter 타입을 숨김)
pub trait BackgroundUpdates: Send + Sync {
    /// 스케줄 시작 (즉시 1회, 이후 주기적으로)
    fn start(self: Arc<Self>);

    fn snapshot(&self) -> UpdateSnapshot;

    /// 자발적 종료 직전 staged 아티팩트 설치
    fn install_staged_on_exit(&self);
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct UpdateController<F: UpdateFeed, P: UpdatePrompter> {
    feed: F,
    prompter: P,
    policy: UpdatePolicy,
    packaged: bool,
    state: Arc<Mutex<UpdateState>>,
    in_flight: AtomicBool,
    /// 마지막으로 사용자에게 제안한 버전
    prompted: Mutex<Option<Version>>,
    /// 다음 종료 시 설치할 아티팩트
    staged: Mutex<Option<ArtifactHandle<F::Artifact>>>,
    last_checked_at: Mutex<Option<DateTime<Utc>>>,
}

impl<F: UpdateFeed, P: UpdatePrompter> UpdateController<F, P> {
    pub fn new(feed: F, prompter: P, policy: UpdatePolicy, packaged: bool) -> Self {
        Self {
            feed,
            prompter,
            policy,
            packaged,
            state: Arc::new(Mutex::new(UpdateState::Idle)),
            in_flight: AtomicBool::new(false),
            prompted: Mutex::new(None),
            staged: Mutex::new(None),
            last_checked_at: Mutex::new(None),
        }
    }

    pub fn state(&self) -> UpdateState {
        lock(&self.state).clone()
    }

    fn set_state(&self, next: UpdateState) {
        let mut state = lock(&self.state);
        if *state != next {
            log::debug!("[Updater] {} -> {}", state.name(), next.name());
        }
        *state = next;
    }

    /// 한 번의 확인 주기
    pub async fn tick(&self) -> TickOutcome {
        if !self.packaged {
            return TickOutcome::Disabled;
        }
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            log::debug!("[Updater] check already in flight, skipping tick");
            return TickOutcome::Coalesced;
        };

        match self.run_cycle().await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("[Updater] {}", e);
                if matches!(
                    e,
                    ShellError::UpdateDownloadFailure(_) | ShellError::UpdateInstallFailure(_)
                ) {
                    // 사용자가 수락했던 버전은 다음 확인에서 다시 제안
                    *lock(&self.prompted) = None;
                }
                self.set_state(UpdateState::Failed {
                    reason: e.to_string(),
                });
                TickOutcome::Failed
            }
        }
    }

    async fn run_cycle(&self) -> Result<TickOutcome, ShellError> {
        let previous = self.state();
        if previous.blocks_check() {
            return Ok(TickOutcome::Busy);
        }

        let offered_version = match &previous {
            UpdateState::Available { version, .. } => Some(version.clone()),
            UpdateState::Failed { .. } => {
                self.set_state(UpdateState::Idle);
                None
            }
            _ => None,
        };
        if offered_version.is_none() {
            self.set_state(UpdateState::Checking);
        }

        let check = self.feed.check_for_update().await;
        *lock(&self.last_checked_at) = Some(Utc::now());

        let update = match check? {
            UpdateCheck::NoUpdate => {
                log::info!(
                    "[Updater] no update available (running {})",
                    self.feed.current_version()
                );
                self.set_state(UpdateState::Idle);
                return Ok(TickOutcome::NoUpdate);
            }
            UpdateCheck::Available(update) => update,
        };

        let replaces = offered_version
            .as_ref()
            .map_or(true, |offered| update.version > *offered);
        if replaces {
            log::info!(
                "[Updater] update available: {} -> {}",
                self.feed.current_version(),
                update.version
            );
            self.set_state(UpdateState::Available {
                version: update.version.clone(),
                artifact_ref: update.artifact_ref.clone(),
            });
        }

        if !self.claim_prompt(&update.version) {
            return Ok(TickOutcome::Deferred);
        }

        if !self.policy.auto_download {
            let offer = UpdateOffer {
                version: update.version.clone(),
                current_version: self.feed.current_version().clone(),
                release_notes: update.release_notes.clone(),
            };
            if self.prompter.confirm_download(&offer).await == Decision::Defer {
                log::info!("[Updater] user postponed update {}", update.version);
                return Ok(TickOutcome::Deferred);
            }
        }

        self.download_and_apply(update).await
    }

    /// 이 버전을 제안해도 되는지. 이미 제안한 버전 이하면 false
    fn claim_prompt(&self, version: &Version) -> bool {
        let mut prompted = lock(&self.prompted);
        if prompted.as_ref().is_some_and(|last| version <= last) {
            return false;
        }
        *prompted = Some(version.clone());
        true
    }

    async fn download_and_apply(
        &self,
        update: AvailableUpdate<F::Artifact>,
    ) -> Result<TickOutcome, ShellError> {
        let version = update.version.clone();
        self.set_state(UpdateState::Downloading {
            version: version.clone(),
            progress: DownloadProgress::started(),
        });
        log::info!("[Updater] downloading {} from {}", version, update.artifact_ref);

        let handle = self
            .feed
            .download(&update, progress_sink(Arc::clone(&self.state)))
            .await?;

        self.set_state(UpdateState::Downloaded {
            version: version.clone(),
        });

        match self.prompter.confirm_restart(&version).await {
            Decision::Proceed => {
                self.set_state(UpdateState::Installing);
                self.feed.apply_and_restart(handle)?;
                Ok(TickOutcome::Installing)
            }
            Decision::Defer => {
                log::info!("[Updater] update {} staged, installing on next quit", version);
                *lock(&self.staged) = Some(handle);
                Ok(TickOutcome::AwaitingRestart)
            }
        }
    }

    /// 첫 tick은 즉시, 이후 `check_interval`마다. 각 tick은 별도 task로 실행되어
    /// 열린 대화상자가 스케줄을 막지 않음
    pub async fn run_schedule(self: Arc<Self>) {
        if !self.packaged {
            log::info!("[Updater] development build, automatic updates disabled");
            return;
        }
        log::info!(
            "[Updater] checking every {} min (auto download: {})",
            self.policy.check_interval.as_secs() / 60,
            self.policy.auto_download
        );

        let mut ticker = tokio::time::interval(self.policy.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let controller = Arc::clone(&self);
            tauri::async_runtime::spawn(async move {
                let outcome = controller.tick().await;
                log::debug!("[Updater] tick finished: {:?}", outcome);
            });
        }
    }

    pub fn install_staged_on_exit(&self) {
        let Some(handle) = lock(&self.staged).take() else {
            return;
        };
        self.set_state(UpdateState::Installing);
        if let Err(e) = self.feed.apply_on_exit(handle) {
            log::error!("[Updater] failed to install staged update on exit: {}", e);
            self.set_state(UpdateState::Failed {
                reason: e.to_string(),
            });
        }
    }

    pub fn snapshot(&self) -> UpdateSnapshot {
        UpdateSnapshot {
            enabled: self.packaged,
            current_version: self.feed.current_version().to_string(),
            state: self.state(),
            last_checked_at: *lock(&self.last_checked_at),
            auto_download: self.policy.auto_download,
            check_interval_secs: self.policy.check_interval.as_secs(),
            staged_version: lock(&self.staged)
                .as_ref()
                .map(|handle| handle.version().to_string()),
        }
    }
}

impl<F: UpdateFeed, P: UpdatePrompter> BackgroundUpdates for UpdateController<F, P> {
    fn start(self: Arc<Self>) {
        tauri::async_runtime::spawn(self.run_schedule());
    }

    fn snapshot(&self) -> UpdateSnapshot {
        UpdateController::snapshot(self)
    }

    fn install_staged_on_exit(&self) {
        UpdateController::install_staged_on_exit(self)
    }
}

/// 진행률을 `Downloading` 상태에 반영하고 1% 단위로 로그
fn progress_sink(state: Arc<Mutex<UpdateState>>) -> ProgressSink {
    let mut last_logged: Option<u64> = None;
    Box::new(move |progress: DownloadProgress| {
        let whole = progress.percent.floor() as u64;
        if last_logged.map_or(true, |last| whole > last) {
            last_logged = Some(whole);
            log::info!(
                "[Updater] download {}% ({} / {} bytes, {} B/s)",
                whole,
                progress.transferred,
                progress
                    .total
                    .map_or_else(|| "?".to_string(), |total| total.to_string()),
                progress.bytes_per_second
            );
        }

        let mut state = lock(&state);
        if let UpdateState::Downloading { progress: current, .. } = &mut *state {
            *current = merge_progress(current, progress);
        }
    })
}

/// percent/transferred가 줄어드는 보고는 무시
fn merge_progress(current: &DownloadProgress, next: DownloadProgress) -> DownloadProgress {
    if next.percent < current.percent || next.transferred < current.transferred {
        return current.clone();
    }
    next
}
