//! ShellWindowManager
//!
//! 스플래시/메인 창의 생성, "reveal" 전환, 종료 처리를 담당합니다.
//!
//! Reveal 정책: ContentReady / LoadFinished / Failsafe(5초) 세 신호 중 먼저 도착한 것이
//! 스플래시를 닫고 메인 창을 표시·최대화합니다. 이후 신호는 모두 무시됩니다.
//! 로드 실패나 렌더러 정지는 빈 창을 보여주는 대신 차단형 대화상자로 알립니다.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use url::Url;

use crate::config::WindowSettings;
use crate::error::{LoadFailureCause, ShellError};
use crate::window::state::{
    ContentFailure, FailureChoice, RevealTrigger, WindowSnapshot, WindowState,
};
use crate::window::watchdog::HeartbeatWatchdog;

pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 백그라운드 작업 실행기 (프로덕션에서는 tauri async runtime)
pub type TaskSpawner = Arc<dyn Fn(BoxedTask) + Send + Sync>;

pub fn runtime_spawner() -> TaskSpawner {
    Arc::new(|task| {
        tauri::async_runtime::spawn(task);
    })
}

/// 실제 창을 다루는 쪽 (Tauri 구현: `TauriSurfaceHost`)
///
/// 창 조작 메서드는 멱등이어야 합니다. 이미 없는 창에 대한 호출은 오류가 아니라 no-op입니다.
pub trait SurfaceHost: Send + Sync + 'static {
    fn create_splash(&self) -> Result<(), ShellError>;

    fn destroy_splash(&self);

    /// 숨김 상태의 메인 창을 만들고 `source`를 로드
    fn create_main(&self, source: &Url) -> Result<(), ShellError>;

    fn reload_main(&self, source: &Url) -> Result<(), ShellError>;

    fn show_main(&self);

    fn maximize_main(&self);

    fn close_main(&self);

    /// 메인 창이 보이고 최소화되지 않은 상태인지
    fn main_in_foreground(&self) -> bool;

    fn probe_content(
        &self,
        source: &Url,
    ) -> impl Future<Output = Result<(), LoadFailureCause>> + Send;

    /// 차단형 오류 대화상자. 사용자의 선택은 `on_choice`로 전달
    fn show_failure(&self, failure: &ContentFailure, on_choice: Box<dyn FnOnce(FailureChoice) + Send>);
}

pub struct ShellWindowManager<H: SurfaceHost> {
    host: H,
    settings: WindowSettings,
    spawner: TaskSpawner,
    state: Mutex<WindowState>,
    /// 현재 수명 구간(create ~ close)에서 reveal 했는지
    revealed: AtomicBool,
    splash_alive: AtomicBool,
    /// 현재 로드 시도에 대한 실패 대화상자가 떠 있는지
    failure_pending: AtomicBool,
    /// 로드 시도 번호. failsafe 타이머와 probe 결과는 자신의 시도에만 적용됨
    attempt: AtomicU64,
    watchdog: HeartbeatWatchdog,
}

impl<H: SurfaceHost> ShellWindowManager<H> {
    pub fn new(host: H, settings: WindowSettings, spawner: TaskSpawner) -> Arc<Self> {
        let watchdog = HeartbeatWatchdog::new(settings.heartbeat_timeout);
        Arc::new(Self {
            host,
            settings,
            spawner,
            state: Mutex::new(WindowState::Closed),
            revealed: AtomicBool::new(false),
            splash_alive: AtomicBool::new(false),
            failure_pending: AtomicBool::new(false),
            attempt: AtomicU64::new(0),
            watchdog,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    fn lock_state(&self) -> MutexGuard<'_, WindowState> {
        // 상태는 단순 enum이라 poison 되어도 그대로 사용
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> WindowState {
        *self.lock_state()
    }

    pub fn has_main(&self) -> bool {
        self.state().has_main()
    }

    pub fn current_attempt(&self) -> u64 {
        self.attempt.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            state: self.state(),
            revealed: self.revealed.load(Ordering::Acquire),
            failure_pending: self.failure_pending.load(Ordering::Acquire),
            load_attempt: self.current_attempt(),
        }
    }

    /// 프로세스 시작 시 1회. 스플래시는 reveal/실패/teardown에서만 닫힘
    pub fn create_splash(&self) -> Result<(), ShellError> {
        let mut state = self.lock_state();
        if *state != WindowState::Closed {
            log::debug!("[WindowManager] splash skipped in state {:?}", *state);
            return Ok(());
        }

        self.host.create_splash()?;
        self.splash_alive.store(true, Ordering::Release);
        *state = WindowState::SplashOnly;
        log::info!("[WindowManager] splash created");
        Ok(())
    }

    /// 메인 창 생성 및 로드 시작. 이미 있으면 현재 시도 번호를 그대로 반환
    pub fn create_main(self: &Arc<Self>) -> Result<u64, ShellError> {
        let mut state = self.lock_state();
        if state.has_main() {
            return Ok(self.current_attempt());
        }

        // 새 수명 구간
        self.revealed.store(false, Ordering::Release);
        self.failure_pending.store(false, Ordering::Release);
        self.watchdog.disarm();

        log::info!("[WindowManager] loading {}", self.settings.content_url);
        self.host.create_main(&self.settings.content_url)?;
        *state = WindowState::MainLoading;
        let attempt = self.attempt.fetch_add(1, Ordering::AcqRel) + 1;
        drop(state);

        self.start_attempt_tasks(attempt);
        Ok(attempt)
    }

    fn start_attempt_tasks(self: &Arc<Self>, attempt: u64) {
        (self.spawner)(Box::pin(Arc::clone(self).failsafe(attempt)));
        (self.spawner)(Box::pin(Arc::clone(self).watch_load(attempt)));
    }

    /// failsafe 타이머. 시도 번호가 바뀌었으면 아무것도 하지 않음
    pub async fn failsafe(self: Arc<Self>, attempt: u64) {
        tokio::time::sleep(self.settings.failsafe_delay).await;
        if self.current_attempt() != attempt {
            return;
        }
        self.reveal(RevealTrigger::Failsafe);
    }

    /// 로드와 함께 도달 가능성을 확인하고, 실패하면 사용자에게 알림
    pub async fn watch_load(self: Arc<Self>, attempt: u64) {
        let result = self.host.probe_content(&self.settings.content_url).await;
        match result {
            Ok(()) => log::debug!("[WindowManager] content reachable (attempt {})", attempt),
            Err(cause) => {
                if self.current_attempt() != attempt {
                    log::debug!("[WindowManager] stale probe failure ignored: {}", cause);
                    return;
                }
                log::warn!("[WindowManager] content load failed: {}", cause);
                self.report_failure(ContentFailure::Load(cause));
            }
        }
    }

    /// 먼저 도착한 trigger만 reveal 수행. 수행했으면 true
    pub fn reveal(&self, trigger: RevealTrigger) -> bool {
        {
            let mut state = self.lock_state();
            if *state != WindowState::MainLoading {
                return false;
            }
            if self.failure_pending.load(Ordering::Acquire) {
                log::debug!(
                    "[WindowManager] {} ignored while a failure is shown",
                    trigger.as_str()
                );
                return false;
            }
            if self
                .revealed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            *state = WindowState::MainRevealed;
        }

        self.destroy_splash();
        self.host.show_main();
        self.host.maximize_main();
        log::info!("[WindowManager] main window revealed by {}", trigger.as_str());
        true
    }

    /// 로드 시도당 대화상자 1회. 표시했으면 true
    pub fn report_failure(self: &Arc<Self>, failure: ContentFailure) -> bool {
        if !self.has_main() {
            return false;
        }
        if self.failure_pending.swap(true, Ordering::AcqRel) {
            log::debug!("[WindowManager] failure already shown: {}", failure);
            return false;
        }

        // 항상 위에 있는 스플래시가 대화상자를 가리지 않도록
        self.destroy_splash();
        log::error!("[WindowManager] {}", failure);

        let manager = Arc::clone(self);
        self.host.show_failure(
            &failure,
            Box::new(move |choice| manager.on_failure_choice(choice)),
        );
        true
    }

    fn on_failure_choice(self: &Arc<Self>, choice: FailureChoice) {
        log::info!("[WindowManager] failure dialog answered: {:?}", choice);
        match choice {
            FailureChoice::Retry => {
                if let Err(e) = self.retry_load() {
                    log::error!("[WindowManager] retry failed: {}", e);
                }
            }
            FailureChoice::Close => self.host.close_main(),
            FailureChoice::Dismiss => {
                self.failure_pending.store(false, Ordering::Release);
                // 스플래시는 이미 닫혔으므로 숨겨진 메인 창을 보여줌
                self.reveal(RevealTrigger::FailureDismissed);
            }
        }
    }

    /// 새 로드 시도 (failsafe 타이머와 probe 재시작)
    pub fn retry_load(self: &Arc<Self>) -> Result<u64, ShellError> {
        if !self.has_main() {
            return self.create_main();
        }

        let attempt = self.attempt.fetch_add(1, Ordering::AcqRel) + 1;
        self.watchdog.disarm();
        self.failure_pending.store(false, Ordering::Release);
        self.host.reload_main(&self.settings.content_url)?;
        log::info!("[WindowManager] reloading content (attempt {})", attempt);

        self.start_attempt_tasks(attempt);
        Ok(attempt)
    }

    /// 메인 창이 닫혔을 때. 재활성화 시 다시 만들 수 있도록 소유 상태를 비움
    pub fn teardown(&self) {
        {
            let mut state = self.lock_state();
            if *state == WindowState::Closed {
                return;
            }
            *state = WindowState::Closed;
        }

        // 남아 있는 타이머/probe 무효화
        self.attempt.fetch_add(1, Ordering::AcqRel);
        self.revealed.store(false, Ordering::Release);
        self.failure_pending.store(false, Ordering::Release);
        self.watchdog.disarm();
        self.destroy_splash();
        log::info!("[WindowManager] main window torn down");
    }

    /// 사용자가 스플래시를 직접 닫은 경우
    pub fn forget_splash(&self) {
        self.splash_alive.store(false, Ordering::Release);
    }

    fn destroy_splash(&self) {
        if self.splash_alive.swap(false, Ordering::AcqRel) {
            self.host.destroy_splash();
        }
    }

    pub fn record_heartbeat(&self) {
        if self.state() == WindowState::MainRevealed {
            self.watchdog.beat(Instant::now());
        }
    }

    /// 렌더러 정지 감지. 보고했으면 true
    pub fn check_renderer(self: &Arc<Self>, now: Instant) -> bool {
        if self.state() != WindowState::MainRevealed
            || self.failure_pending.load(Ordering::Acquire)
        {
            return false;
        }
        if !self.host.main_in_foreground() {
            self.watchdog.rearm(now);
            return false;
        }
        if !self.watchdog.is_stalled(now) {
            return false;
        }

        let silence = self
            .watchdog
            .silence(now)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.watchdog.disarm();
        self.report_failure(ContentFailure::RendererCrash(format!(
            "no response for {silence} seconds"
        )))
    }

    /// 렌더러 감시 루프를 spawner로 시작
    pub fn start_watchdog(self: &Arc<Self>) {
        (self.spawner)(Box::pin(Arc::clone(self).run_watchdog()));
    }

    pub async fn run_watchdog(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.settings.watchdog_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.check_renderer(Instant::now());
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum HostCall {
        CreateSplash,
        DestroySplash,
        CreateMain,
        ReloadMain,
        ShowMain,
        MaximizeMain,
        CloseMain,
        ShowFailure(String),
    }

    type ChoiceCallback = Box<dyn FnOnce(FailureChoice) + Send>;

    pub(crate) struct FakeHost {
        pub(crate) calls: Mutex<Vec<HostCall>>,
        pub(crate) probe_result: Mutex<Result<(), LoadFailureCause>>,
        pub(crate) foreground: AtomicBool,
        pub(crate) pending_choices: Mutex<Vec<ChoiceCallback>>,
    }

    impl FakeHost {
        pub(crate) fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                probe_result: Mutex::new(Ok(())),
                foreground: AtomicBool::new(true),
                pending_choices: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: HostCall) {
            self.calls.lock().unwrap().push(call);
        }

        pub(crate) fn count(&self, wanted: &HostCall) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == wanted).count()
        }

        pub(crate) fn failure_dialogs(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| matches!(c, HostCall::ShowFailure(_)))
                .count()
        }

        pub(crate) fn answer_failure(&self, choice: FailureChoice) {
            let callback = self.pending_choices.lock().unwrap().pop().expect("no dialog open");
            callback(choice);
        }
    }

    impl SurfaceHost for FakeHost {
        fn create_splash(&self) -> Result<(), ShellError> {
            self.record(HostCall::CreateSplash);
            Ok(())
        }

        fn destroy_splash(&self) {
            self.record(HostCall::DestroySplash);
        }

        fn create_main(&self, _source: &Url) -> Result<(), ShellError> {
            self.record(HostCall::CreateMain);
            Ok(())
        }

        fn reload_main(&self, _source: &Url) -> Result<(), ShellError> {
            self.record(HostCall::ReloadMain);
            Ok(())
        }

        fn show_main(&self) {
            self.record(HostCall::ShowMain);
        }

        fn maximize_main(&self) {
            self.record(HostCall::MaximizeMain);
        }

        fn close_main(&self) {
            self.record(HostCall::CloseMain);
        }

        fn main_in_foreground(&self) -> bool {
            self.foreground.load(Ordering::SeqCst)
        }

        fn probe_content(
            &self,
            _source: &Url,
        ) -> impl Future<Output = Result<(), LoadFailureCause>> + Send {
            let result = self.probe_result.lock().unwrap().clone();
            async move { result }
        }

        fn show_failure(&self, failure: &ContentFailure, on_choice: ChoiceCallback) {
            self.record(HostCall::ShowFailure(failure.title().to_string()));
            self.pending_choices.lock().unwrap().push(on_choice);
        }
    }

    /// 스폰된 작업을 큐에 모아 두었다가 테스트에서 직접 실행
    #[derive(Clone, Default)]
    pub(crate) struct TaskQueue(Arc<Mutex<Vec<BoxedTask>>>);

    impl TaskQueue {
        pub(crate) fn spawner(&self) -> TaskSpawner {
            let queue = self.0.clone();
            Arc::new(move |task| queue.lock().unwrap().push(task))
        }

        pub(crate) async fn run_all(&self) {
            loop {
                let next = {
                    let mut queue = self.0.lock().unwrap();
                    if queue.is_empty() {
                        None
                    } else {
                        Some(queue.remove(0))
                    }
                };
                match next {
                    Some(task) => task.await,
                    None => break,
                }
            }
        }

        pub(crate) fn clear(&self) {
            self.0.lock().unwrap().clear();
        }
    }

    pub(crate) fn settings() -> WindowSettings {
        ShellConfig::from_lookup(true, |_| None).unwrap().window
    }

    fn manager() -> (Arc<ShellWindowManager<FakeHost>>, TaskQueue) {
        let queue = TaskQueue::default();
        let manager = ShellWindowManager::new(FakeHost::new(), settings(), queue.spawner());
        (manager, queue)
    }

    const TRIGGERS: [RevealTrigger; 3] = [
        RevealTrigger::ContentReady,
        RevealTrigger::LoadFinished,
        RevealTrigger::Failsafe,
    ];

    fn permutations() -> Vec<[RevealTrigger; 3]> {
        let [a, b, c] = TRIGGERS;
        vec![
            [a, b, c],
            [a, c, b],
            [b, a, c],
            [b, c, a],
            [c, a, b],
            [c, b, a],
        ]
    }

    #[test]
    fn every_trigger_order_reveals_exactly_once() {
        for order in permutations() {
            let (manager, queue) = manager();
            manager.create_splash().unwrap();
            manager.create_main().unwrap();
            queue.clear();

            let mut reveals = 0;
            for _round in 0..3 {
                for trigger in order {
                    if manager.reveal(trigger) {
                        reveals += 1;
                    }
                }
            }

            let host = manager.host();
            assert_eq!(reveals, 1, "order {:?}", order);
            assert_eq!(host.count(&HostCall::ShowMain), 1, "order {:?}", order);
            assert_eq!(host.count(&HostCall::MaximizeMain), 1, "order {:?}", order);
            assert_eq!(host.count(&HostCall::DestroySplash), 1, "order {:?}", order);
            assert_eq!(manager.state(), WindowState::MainRevealed);
        }
    }

    #[test]
    fn triggers_from_other_threads_reveal_once() {
        let (manager, queue) = manager();
        manager.create_splash().unwrap();
        manager.create_main().unwrap();
        queue.clear();

        let handles: Vec<_> = (0..12)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.reveal(TRIGGERS[i % 3]))
            })
            .collect();
        let reveals = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|revealed| *revealed)
            .count();

        assert_eq!(reveals, 1);
        assert_eq!(manager.host().count(&HostCall::ShowMain), 1);
        assert_eq!(manager.host().count(&HostCall::DestroySplash), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failsafe_reveals_when_no_content_signal_arrives() {
        let (manager, queue) = manager();
        manager.create_splash().unwrap();
        manager.create_main().unwrap();

        let started = tokio::time::Instant::now();
        queue.run_all().await;

        assert_eq!(manager.state(), WindowState::MainRevealed);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() <= Duration::from_secs(5));
        assert_eq!(manager.host().count(&HostCall::DestroySplash), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failsafe_does_not_touch_a_recreated_window() {
        let (manager, queue) = manager();
        let first = manager.create_main().unwrap();
        manager.teardown();
        queue.clear();

        let second = manager.create_main().unwrap();
        assert_ne!(first, second);
        queue.clear();

        Arc::clone(&manager).failsafe(first).await;
        assert_eq!(manager.state(), WindowState::MainLoading);

        Arc::clone(&manager).failsafe(second).await;
        assert_eq!(manager.state(), WindowState::MainRevealed);
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_shows_one_dialog_and_blocks_reveal() {
        let (manager, queue) = manager();
        *manager.host().probe_result.lock().unwrap() =
            Err(LoadFailureCause::Unreachable("dns error".to_string()));
        manager.create_splash().unwrap();
        let attempt = manager.create_main().unwrap();
        queue.clear();

        Arc::clone(&manager).watch_load(attempt).await;
        Arc::clone(&manager).watch_load(attempt).await;
        assert!(!manager.report_failure(ContentFailure::RendererCrash("late".to_string())));

        let host = manager.host();
        assert_eq!(host.failure_dialogs(), 1);
        assert_eq!(host.count(&HostCall::DestroySplash), 1);

        assert!(!manager.reveal(RevealTrigger::LoadFinished));
        Arc::clone(&manager).failsafe(attempt).await;
        assert_eq!(host.count(&HostCall::ShowMain), 0);
        assert_eq!(manager.state(), WindowState::MainLoading);
        assert!(manager.snapshot().failure_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_load_failure_starts_a_new_attempt() {
        let (manager, queue) = manager();
        *manager.host().probe_result.lock().unwrap() = Err(LoadFailureCause::Timeout);
        let attempt = manager.create_main().unwrap();
        queue.clear();
        Arc::clone(&manager).watch_load(attempt).await;

        *manager.host().probe_result.lock().unwrap() = Ok(());
        manager.host().answer_failure(FailureChoice::Retry);

        assert_eq!(manager.host().count(&HostCall::ReloadMain), 1);
        assert_eq!(manager.current_attempt(), attempt + 1);
        assert!(!manager.snapshot().failure_pending);

        queue.run_all().await;
        assert_eq!(manager.state(), WindowState::MainRevealed);
        assert_eq!(manager.host().failure_dialogs(), 1);
    }

    #[tokio::test]
    async fn close_choice_closes_main_without_retrying() {
        let (manager, queue) = manager();
        *manager.host().probe_result.lock().unwrap() = Err(LoadFailureCause::HttpStatus(500));
        let attempt = manager.create_main().unwrap();
        queue.clear();
        Arc::clone(&manager).watch_load(attempt).await;

        manager.host().answer_failure(FailureChoice::Close);
        assert_eq!(manager.host().count(&HostCall::CloseMain), 1);
        assert_eq!(manager.host().count(&HostCall::ReloadMain), 0);
    }

    #[tokio::test]
    async fn dismissed_dialog_keeps_the_shell_open() {
        let (manager, queue) = manager();
        *manager.host().probe_result.lock().unwrap() = Err(LoadFailureCause::Timeout);
        manager.create_splash().unwrap();
        let attempt = manager.create_main().unwrap();
        queue.clear();
        Arc::clone(&manager).watch_load(attempt).await;

        manager.host().answer_failure(FailureChoice::Dismiss);

        let host = manager.host();
        assert_eq!(host.count(&HostCall::CloseMain), 0);
        assert_eq!(host.count(&HostCall::ReloadMain), 0);
        assert_eq!(host.count(&HostCall::ShowMain), 1);
        assert_eq!(manager.state(), WindowState::MainRevealed);
        assert!(!manager.snapshot().failure_pending);
    }

    #[test]
    fn teardown_allows_recreation_and_destroys_splash_once() {
        let (manager, _queue) = manager();
        manager.create_splash().unwrap();
        manager.create_main().unwrap();
        assert!(manager.has_main());

        manager.teardown();
        manager.teardown();
        assert_eq!(manager.state(), WindowState::Closed);
        assert!(!manager.has_main());
        assert_eq!(manager.host().count(&HostCall::DestroySplash), 1);

        manager.create_main().unwrap();
        assert!(manager.reveal(RevealTrigger::ContentReady));
        assert_eq!(manager.host().count(&HostCall::CreateMain), 2);
        assert_eq!(manager.host().count(&HostCall::DestroySplash), 1);
    }

    #[test]
    fn create_main_is_idempotent_while_main_exists() {
        let (manager, _queue) = manager();
        let first = manager.create_main().unwrap();
        let again = manager.create_main().unwrap();
        assert_eq!(first, again);
        assert_eq!(manager.host().count(&HostCall::CreateMain), 1);
    }

    #[test]
    fn stalled_renderer_is_reported_only_in_foreground() {
        let (manager, _queue) = manager();
        manager.create_main().unwrap();
        assert!(manager.reveal(RevealTrigger::ContentReady));
        manager.record_heartbeat();

        let later = Instant::now() + Duration::from_secs(600);
        manager.host().foreground.store(false, Ordering::SeqCst);
        assert!(!manager.check_renderer(later));

        manager.host().foreground.store(true, Ordering::SeqCst);
        assert!(!manager.check_renderer(later + Duration::from_secs(30)));
        assert!(manager.check_renderer(later + Duration::from_secs(120)));
        assert_eq!(manager.host().failure_dialogs(), 1);
        assert!(!manager.check_renderer(later + Duration::from_secs(500)));
    }
}
