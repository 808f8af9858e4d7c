//! 콘텐츠 도달 가능성 확인
//!
//! WebView는 로드 실패 원인을 알려주지 않으므로, 로드와 함께 같은 URL로 요청을 보내
//! DNS/연결/타임아웃/HTTP 오류를 구분합니다.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::LoadFailureCause;

pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("PurityTradingDesktop/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("[Probe] falling back to default http client: {}", e);
            reqwest::Client::new()
        })
}

pub async fn probe_content_url(client: &reqwest::Client, url: &Url) -> Result<(), LoadFailureCause> {
    let resp = client
        .get(url.clone())
        .header("Cache-Control", "no-cache")
        .send()
        .await
        .map_err(|e| classify_request_error(&e))?;

    match classify_status(resp.status()) {
        Some(cause) => Err(cause),
        None => Ok(()),
    }
}

pub fn classify_status(status: StatusCode) -> Option<LoadFailureCause> {
    if status.is_client_error() || status.is_server_error() {
        Some(LoadFailureCause::HttpStatus(status.as_u16()))
    } else {
        None
    }
}

fn classify_request_error(error: &reqwest::Error) -> LoadFailureCause {
    if error.is_timeout() {
        LoadFailureCause::Timeout
    } else if error.is_connect() {
        LoadFailureCause::Unreachable(root_cause(error))
    } else if let Some(status) = error.status() {
        LoadFailureCause::HttpStatus(status.as_u16())
    } else {
        LoadFailureCause::Invalid(root_cause(error))
    }
}

fn root_cause(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
