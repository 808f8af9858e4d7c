//! 셸 설정
//!
//! 빌드 모드(패키징 여부)에 따라 콘텐츠 URL이 결정되며, 런타임 입력으로는 바꿀 수 없습니다.
//! 업데이트 주기와 자동 다운로드 여부만 환경 변수로 조정합니다.
//! 형식이 잘못된 값은 키 단위로 경고 후 기본값을 사용합니다.

use std::time::Duration;

use url::Url;

use crate::error::ShellError;

pub const PRODUCTION_CONTENT_URL: &str = "https://puritytrading.vercel.app";
pub const DEVELOPMENT_CONTENT_URL: &str = "http://localhost:3000";

/// 이전 셸의 캐시/스토리지를 버리기 위한 전용 브라우징 데이터 디렉토리
pub const BROWSING_PARTITION: &str = "purity_trading_live_v2";

pub const UPDATE_INTERVAL_ENV: &str = "PURITY_UPDATE_INTERVAL_MINS";
pub const UPDATE_AUTO_DOWNLOAD_ENV: &str = "PURITY_UPDATE_AUTO_DOWNLOAD";

const DEFAULT_UPDATE_INTERVAL_MINS: u64 = 30;
const MIN_UPDATE_INTERVAL_MINS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

/// 창 관련 설정
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub content_url: Url,
    /// 외부 브라우저로 넘기지 않고 셸 안에서 여는 호스트
    pub content_host: String,
    pub failsafe_delay: Duration,
    pub zoom_factor: f64,
    pub probe_timeout: Duration,
    pub heartbeat_timeout: Duration,
    pub watchdog_interval: Duration,
    pub main_size: SurfaceSize,
    pub main_min_size: SurfaceSize,
    pub splash_size: SurfaceSize,
}

/// 업데이트 정책
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePolicy {
    pub check_interval: Duration,
    /// true이면 새 버전 발견 시 묻지 않고 바로 다운로드
    pub auto_download: bool,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_UPDATE_INTERVAL_MINS * 60),
            auto_download: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// 패키징(프로덕션) 빌드 여부. false이면 업데이트 상태는 항상 Idle
    pub packaged: bool,
    pub window: WindowSettings,
    pub update: UpdatePolicy,
}

impl ShellConfig {
    /// 현재 프로세스 환경에서 설정 로드
    pub fn load(packaged: bool) -> Result<Self, ShellError> {
        Self::from_lookup(packaged, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(packaged: bool, lookup: F) -> Result<Self, ShellError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = if packaged {
            PRODUCTION_CONTENT_URL
        } else {
            DEVELOPMENT_CONTENT_URL
        };
        let content_url = Url::parse(raw_url)
            .map_err(|e| ShellError::Config(format!("invalid content url {raw_url}: {e}")))?;
        let content_host = content_url
            .host_str()
            .ok_or_else(|| ShellError::Config(format!("content url has no host: {raw_url}")))?
            .to_string();

        let update = UpdatePolicy {
            check_interval: parse_interval(lookup(UPDATE_INTERVAL_ENV).as_deref()),
            auto_download: parse_flag(lookup(UPDATE_AUTO_DOWNLOAD_ENV).as_deref()),
        };

        Ok(Self {
            packaged,
            window: WindowSettings {
                content_url,
                content_host,
                failsafe_delay: Duration::from_secs(5),
                zoom_factor: 0.85,
                probe_timeout: Duration::from_secs(10),
                heartbeat_timeout: Duration::from_secs(90),
                watchdog_interval: Duration::from_secs(15),
                main_size: SurfaceSize {
                    width: 1440.0,
                    height: 900.0,
                },
                main_min_size: SurfaceSize {
                    width: 1024.0,
                    height: 768.0,
                },
                splash_size: SurfaceSize {
                    width: 500.0,
                    height: 300.0,
                },
            },
            update,
        })
    }
}

fn parse_interval(raw: Option<&str>) -> Duration {
    let fallback = UpdatePolicy::default().check_interval;
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return fallback;
    };
    match raw.parse::<u64>() {
        Ok(minutes) => Duration::from_secs(minutes.max(MIN_UPDATE_INTERVAL_MINS) * 60),
        Err(_) => {
            log::warn!(
                "[Config] {UPDATE_INTERVAL_ENV} must be minutes, got {raw:?}; using {DEFAULT_UPDATE_INTERVAL_MINS}"
            );
            fallback
        }
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return false;
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            log::warn!("[Config] {UPDATE_AUTO_DOWNLOAD_ENV} must be a boolean, got {raw:?}; using false");
            false
        }
    }
}
