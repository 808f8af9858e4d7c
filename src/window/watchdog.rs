//! 렌더러 생존 감시
//!
//! 브리지 스크립트가 주기적으로 heartbeat를 보내고, 메인 창이 전면에 있는 동안
//! 일정 시간 heartbeat가 없으면 렌더러가 멈춘 것으로 판단합니다.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct HeartbeatWatchdog {
    timeout: Duration,
    /// None이면 감시하지 않음 (첫 heartbeat 전 또는 해제 후)
    last_beat: Mutex<Option<Instant>>,
}

impl HeartbeatWatchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_beat: Mutex::new(None),
        }
    }

    pub fn beat(&self, now: Instant) {
        if let Ok(mut last) = self.last_beat.lock() {
            *last = Some(now);
        }
    }

    /// 이미 감시 중이면 기준 시각만 갱신 (창이 백그라운드에 있던 시간은 세지 않음)
    pub fn rearm(&self, now: Instant) {
        if let Ok(mut last) = self.last_beat.lock() {
            if last.is_some() {
                *last = Some(now);
            }
        }
    }

    pub fn disarm(&self) {
        if let Ok(mut last) = self.last_beat.lock() {
            *last = None;
        }
    }

    pub fn is_stalled(&self, now: Instant) -> bool {
        self.last_beat
            .lock()
            .ok()
            .and_then(|last| *last)
            .map(|last| now.saturating_duration_since(last) > self.timeout)
            .unwrap_or(false)
    }

    pub fn silence(&self, now: Instant) -> Option<Duration> {
        self.last_beat
            .lock()
            .ok()
            .and_then(|last| *last)
            .map(|last| now.saturating_duration_since(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_until_first_beat() {
        let watchdog = HeartbeatWatchdog::new(Duration::from_secs(90));
        let start = Instant::now();
        assert!(!watchdog.is_stalled(start + Duration::from_secs(600)));

        watchdog.rearm(start);
        assert!(!watchdog.is_stalled(start + Duration::from_secs(600)));
    }

    #[test]
    fn stalls_after_timeout_and_recovers_on_beat() {
        let watchdog = HeartbeatWatchdog::new(Duration::from_secs(90));
        let start = Instant::now();
        watchdog.beat(start);

        assert!(!watchdog.is_stalled(start + Duration::from_secs(90)));
        assert!(watchdog.is_stalled(start + Duration::from_secs(91)));

        watchdog.beat(start + Duration::from_secs(91));
        assert!(!watchdog.is_stalled(start + Duration::from_secs(100)));
    }

    #[test]
    fn rearm_and_disarm() {
        let watchdog = HeartbeatWatchdog::new(Duration::from_secs(10));
        let start = Instant::now();
        watchdog.beat(start);

        watchdog.rearm(start + Duration::from_secs(30));
        assert!(!watchdog.is_stalled(start + Duration::from_secs(35)));

        watchdog.disarm();
        assert!(!watchdog.is_stalled(start + Duration::from_secs(300)));
        assert_eq!(watchdog.silence(start), None);
    }
}
