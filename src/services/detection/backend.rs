// Analysis Backends
// Polymorphic seam between the remote-model-backed pipeline (implemented)
// and a local-model-backed variant kept as an explicit placeholder until a
// local inference path exists.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Verdict;

use super::image_analyzer::ImageAnalyzer;
use super::video_analyzer::VideoAnalyzer;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not supported: {0}")]
    NotSupported(&'static str),
}

#[allow(async_fn_in_trait)]
pub trait AnalysisBackend {
    async fn analyze_image(&self, path: &Path) -> Result<Verdict, BackendError>;
    async fn analyze_video(&self, path: &Path, max_frames: usize)
        -> Result<Verdict, BackendError>;
}

/// The implemented backend: prompts the remote multimodal model and
/// normalizes its replies.
pub struct RemoteModelBackend {
    api_key: String,
    image: ImageAnalyzer,
    video: VideoAnalyzer,
}

impl RemoteModelBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            api_key: api_key.into(),
            image: ImageAnalyzer::new(model.clone()),
            video: VideoAnalyzer::new(model),
        }
    }
}

impl AnalysisBackend for RemoteModelBackend {
    async fn analyze_image(&self, path: &Path) -> Result<Verdict, BackendError> {
        Ok(self.image.analyze(&self.api_key, path).await)
    }

    async fn analyze_video(
        &self,
        path: &Path,
        max_frames: usize,
    ) -> Result<Verdict, BackendError> {
        Ok(self.video.analyze(&self.api_key, path, max_frames).await)
    }
}

/// Placeholder for a future offline model. Holds the weights path it would
/// load but fails every call until an inference engine is wired in.
pub struct LocalModelBackend {
    pub model_path: Option<PathBuf>,
}

impl LocalModelBackend {
    pub fn new(model_path: Option<PathBuf>) -> Self {
        Self { model_path }
    }
}

impl AnalysisBackend for LocalModelBackend {
    async fn analyze_image(&self, _path: &Path) -> Result<Verdict, BackendError> {
        Err(BackendError::NotSupported("local model image analysis"))
    }

    async fn analyze_video(
        &self,
        _path: &Path,
        _max_frames: usize,
    ) -> Result<Verdict, BackendError> {
        Err(BackendError::NotSupported("local model video analysis"))
    }
}
