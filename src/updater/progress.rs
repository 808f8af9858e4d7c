//! 다운로드 진행률
//!
//! 청크 단위 콜백을 누적하여 `{bytesPerSecond, percent, transferred, total}`을 만듭니다.
//! 한 세션 안에서 percent와 transferred는 감소하지 않습니다.

use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub bytes_per_second: u64,
    pub percent: f64,
    pub transferred: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    pub fn started() -> Self {
        Self {
            bytes_per_second: 0,
            percent: 0.0,
            transferred: 0,
            total: None,
        }
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    started_at: Instant,
    transferred: u64,
    total: Option<u64>,
    percent: f64,
}

impl ProgressTracker {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            transferred: 0,
            total: None,
            percent: 0.0,
        }
    }

    pub fn advance(&mut self, chunk_len: u64, content_length: Option<u64>, now: Instant) -> DownloadProgress {
        self.transferred = self.transferred.saturating_add(chunk_len);
        if self.total.is_none() {
            self.total = content_length.filter(|total| *total > 0);
        }

        if let Some(total) = self.total {
            let percent = (self.transferred as f64 / total as f64 * 100.0).min(100.0);
            self.percent = self.percent.max(percent);
        }

        let elapsed_ms = now.saturating_duration_since(self.started_at).as_millis().max(1);
        let bytes_per_second = (self.transferred as u128 * 1000 / elapsed_ms) as u64;

        DownloadProgress {
            bytes_per_second,
            percent: self.percent,
            transferred: self.transferred,
            total: self.total,
        }
    }

    /// 완료 후 총량을 알고 있으면 100%
    pub fn finish(&mut self, now: Instant) -> DownloadProgress {
        if self.total.is_some() {
            self.percent = 100.0;
        }
        self.advance(0, None, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn progress_never_decreases() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(start);
        let chunks = [4096u64, 0, 1, 8192, 300, 0, 65536, 12];
        let mut previous = DownloadProgress::started();

        for (i, chunk) in chunks.iter().enumerate() {
            // 서버가 중간에 다른 content-length를 보내도 총량은 처음 값 유지
            let length = if i == 3 { Some(10) } else { Some(100_000) };
            let progress = tracker.advance(*chunk, length, start + Duration::from_millis(100 * i as u64));
            assert!(progress.percent >= previous.percent);
            assert!(progress.transferred >= previous.transferred);
            assert_eq!(progress.total, Some(100_000));
            previous = progress;
        }

        let done = tracker.finish(start + Duration::from_secs(2));
        assert_eq!(done.percent, 100.0);
        assert!(done.transferred >= previous.transferred);
    }

    #[test]
    fn percent_is_capped_and_speed_reported() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(start);
        let progress = tracker.advance(2_000, Some(1_000), start + Duration::from_secs(2));
        assert_eq!(progress.percent, 100.0);
        assert_eq!(progress.bytes_per_second, 1_000);
    }

    #[test]
    fn unknown_length_keeps_percent_at_zero() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(start);
        let progress = tracker.advance(512, None, start + Duration::from_millis(500));
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.total, None);
        assert_eq!(progress.transferred, 512);
    }
}
