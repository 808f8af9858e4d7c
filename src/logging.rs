//! 로깅 설정
//!
//! `log` 파사드 + tauri-plugin-log (stdout, 앱 로그 디렉토리)

use log::LevelFilter;
use tauri::plugin::TauriPlugin;
use tauri::Runtime;
use tauri_plugin_log::{Target, TargetKind};

const LOG_FILE_NAME: &str = "purity-shell";

fn level_for_build(packaged: bool) -> LevelFilter {
    if packaged {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    }
}

pub fn plugin<R: Runtime>(packaged: bool) -> TauriPlugin<R> {
    tauri_plugin_log::Builder::new()
        .clear_targets()
        .targets([
            Target::new(TargetKind::Stdout),
            Target::new(TargetKind::LogDir {
                file_name: Some(LOG_FILE_NAME.to_string()),
            }),
        ])
        .level(level_for_build(packaged))
        // 다운로드/probe 요청마다 찍히는 내부 로그는 제외
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_builds_log_debug() {
        assert_eq!(level_for_build(true), LevelFilter::Info);
        assert_eq!(level_for_build(false), LevelFilter::Debug);
    }
}
