//! UpdateFeedClient 계약
//!
//! - `check_for_update`: 피드 버전과 실행 중 버전 비교
//! - `download`: 진행률을 보고하며 아티팩트 다운로드 + 무결성 검증
//! - `apply_and_restart`: 설치 후 재시작 (되돌릴 수 없음)
//!
//! `ArtifactHandle`은 피드 클라이언트가 검증을 마친 뒤에만 만들 수 있으므로
//! 검증되지 않은 아티팩트는 적용될 수 없습니다.

use std::future::Future;

use semver::Version;

use crate::error::ShellError;
use crate::updater::progress::DownloadProgress;

pub type ProgressSink = Box<dyn FnMut(DownloadProgress) + Send>;

#[derive(Debug, Clone)]
pub struct AvailableUpdate<A> {
    pub version: Version,
    /// 아티팩트 위치 (다운로드 URL)
    pub artifact_ref: String,
    pub release_notes: Option<String>,
    pub artifact: A,
}

#[derive(Debug, Clone)]
pub enum UpdateCheck<A> {
    NoUpdate,
    Available(AvailableUpdate<A>),
}

/// 검증된 아티팩트
pub struct ArtifactHandle<A> {
    version: Version,
    artifact: A,
    bytes: Vec<u8>,
}

impl<A> ArtifactHandle<A> {
    /// 피드 클라이언트가 서명/크기 검증을 마친 뒤에만 호출
    pub(crate) fn verified(version: Version, artifact: A, bytes: Vec<u8>) -> Self {
        Self {
            version,
            artifact,
            bytes,
        }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn artifact(&self) -> &A {
        &self.artifact
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<A> std::fmt::Debug for ArtifactHandle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("version", &self.version)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub trait UpdateFeed: Send + Sync + 'static {
    /// 피드가 돌려주는 원본 업데이트 객체 (Tauri: `tauri_plugin_updater::Update`)
    type Artifact: Clone + Send + Sync + 'static;

    fn current_version(&self) -> &Version;

    fn check_for_update(
        &self,
    ) -> impl Future<Output = Result<UpdateCheck<Self::Artifact>, ShellError>> + Send;

    fn download(
        &self,
        update: &AvailableUpdate<Self::Artifact>,
        progress: ProgressSink,
    ) -> impl Future<Output = Result<ArtifactHandle<Self::Artifact>, ShellError>> + Send;

    /// 설치 후 프로세스 재시작. 성공하면 반환하지 않음
    fn apply_and_restart(&self, handle: ArtifactHandle<Self::Artifact>) -> Result<(), ShellError>;

    /// 종료 직전 설치 (재시작하지 않음)
    fn apply_on_exit(&self, handle: ArtifactHandle<Self::Artifact>) -> Result<(), ShellError>;
}
