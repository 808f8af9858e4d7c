//! 웹뷰 HTTP 캐시 정리
//!
//! 메인 웹뷰를 만들기 전에 디스크 HTTP 캐시를 지워 항상 새 콘텐츠를 받도록 합니다.
//! 쿠키와 localStorage는 건드리지 않습니다. 서비스 워커와 Cache Storage는 브리지 스크립트가 정리합니다.

use std::path::{Path, PathBuf};

/// 플랫폼 웹뷰가 HTTP 캐시를 두는 하위 경로
const HTTP_CACHE_DIRS: &[&str] = &[
    // WebView2 (사용자 데이터 폴더 기준)
    "EBWebView/Default/Cache",
    "EBWebView/Default/Code Cache",
    // WebKitGTK
    "WebKitCache",
    // WKWebView (앱 캐시 디렉토리 기준)
    "WebKit/NetworkCache",
];

/// 각 root 아래의 HTTP 캐시 디렉토리 경로 (존재 여부와 무관)
pub fn http_cache_dirs(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| HTTP_CACHE_DIRS.iter().map(move |dir| root.join(dir)))
        .collect()
}

/// 남아 있는 HTTP 캐시를 삭제하고 지운 디렉토리 수를 반환. 실패는 로그만 남김
pub fn clear_http_cache(roots: &[PathBuf]) -> usize {
    http_cache_dirs(roots)
        .iter()
        .filter(|dir| dir.is_dir())
        .filter(|dir| remove_dir(dir))
        .count()
}

fn remove_dir(dir: &Path) -> bool {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            log::debug!("[WindowManager] cleared http cache at {}", dir.display());
            true
        }
        Err(e) => {
            // 이전 웹뷰 프로세스가 아직 파일을 잡고 있을 수 있음
            log::warn!("[WindowManager] failed to clear http cache at {}: {}", dir.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_only_http_cache_directories() {
        let root = tempfile::tempdir().unwrap();
        let cache = root.path().join("EBWebView/Default/Cache");
        let local_storage = root.path().join("EBWebView/Default/Local Storage");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::create_dir_all(&local_storage).unwrap();
        std::fs::write(cache.join("data_0"), b"stale").unwrap();
        std::fs::write(local_storage.join("leveldb"), b"keep").unwrap();

        let cleared = clear_http_cache(&[root.path().to_path_buf()]);

        assert_eq!(cleared, 1);
        assert!(!cache.exists());
        assert!(local_storage.join("leveldb").exists());
    }

    #[test]
    fn missing_roots_are_ignored() {
        let root = tempfile::tempdir().unwrap();
        let gone = root.path().join("never-created");
        assert_eq!(clear_http_cache(&[gone]), 0);
    }

    #[test]
    fn every_root_gets_every_platform_path() {
        let roots = vec![PathBuf::from("/data"), PathBuf::from("/cache")];
        let dirs = http_cache_dirs(&roots);
        assert_eq!(dirs.len(), HTTP_CACHE_DIRS.len() * 2);
        assert!(dirs.contains(&PathBuf::from("/cache/WebKit/NetworkCache")));
        assert!(dirs.contains(&PathBuf::from("/data/WebKitCache")));
    }
}
