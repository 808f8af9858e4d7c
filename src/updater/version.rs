//! 버전 비교 (semver total order)

use semver::Version;

use crate::error::ShellError;

pub fn parse(raw: &str) -> Result<Version, ShellError> {
    let trimmed = raw.trim().trim_start_matches('v');
    Version::parse(trimmed)
        .map_err(|e| ShellError::UpdateCheckFailure(format!("invalid version {raw:?}: {e}")))
}

/// `candidate`가 `running`보다 엄격히 새로운지
pub fn is_newer(running: &Version, candidate: &Version) -> bool {
    candidate > running
}
