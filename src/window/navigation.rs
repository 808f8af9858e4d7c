//! 네비게이션 정책
//!
//! 콘텐츠 호스트 밖으로 나가는 요청은 셸 안에서 열지 않고 기본 브라우저로 넘깁니다.
//! 새 창 요청(`target=_blank`, `window.open`)도 같은 정책을 따르며 팝업 창은 만들지 않습니다.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// 셸 안에서 진행
    Allow,
    /// 취소하고 외부 브라우저로 열기
    OpenExternal,
    /// 취소 (열지 않음)
    Block,
}

pub fn decide(target: &Url, content_host: &str) -> NavigationDecision {
    match target.scheme() {
        "http" | "https" => {
            let in_app = target
                .host_str()
                .map(|host| is_content_host(host, content_host))
                .unwrap_or(false);
            if in_app {
                NavigationDecision::Allow
            } else {
                NavigationDecision::OpenExternal
            }
        }
        "mailto" | "tel" => NavigationDecision::OpenExternal,
        // 셸 내부 페이지와 blank 문서
        "about" | "tauri" | "data" | "blob" => NavigationDecision::Allow,
        _ => NavigationDecision::Block,
    }
}

/// 새 창 요청 처리 방식. 어느 경우든 팝업 창 자체는 거부됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewWindowDecision {
    /// 메인 창에서 이어서 열기
    LoadInMain,
    OpenExternal,
    Ignore,
}

pub fn decide_new_window(target: &Url, content_host: &str) -> NewWindowDecision {
    match decide(target, content_host) {
        NavigationDecision::Allow if matches!(target.scheme(), "http" | "https") => {
            NewWindowDecision::LoadInMain
        }
        // about:blank 등 빈 팝업
        NavigationDecision::Allow => NewWindowDecision::Ignore,
        NavigationDecision::OpenExternal => NewWindowDecision::OpenExternal,
        NavigationDecision::Block => NewWindowDecision::Ignore,
    }
}

fn is_content_host(host: &str, content_host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let content_host = content_host.to_ascii_lowercase();
    host == content_host || host.ends_with(&format!(".{content_host}"))
}

/// scheme + host + port 비교
pub fn is_same_origin(url: &Url, content_url: &Url) -> bool {
    url.origin() == content_url.origin()
}

/// 외부 브라우저에서 열기
pub fn open_external(target: &Url) {
    log::info!("[Navigation] opening in default browser: {}", target);
    if let Err(e) = open::that_detached(target.as_str()) {
        log::warn!("[Navigation] failed to open external url {}: {}", target, e);
    }
}
