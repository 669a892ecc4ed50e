// Detector Facade
// Sequences validation, sampling, analysis, and normalization, then stamps
// request metadata onto the verdict. Invalid files never reach the remote
// model; nothing raises past this boundary.

use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{FrameSummary, MediaKind, Verdict};
use crate::services::media_io;

use super::backend::{AnalysisBackend, RemoteModelBackend};
use super::video_analyzer::DEFAULT_MAX_FRAMES;

/// Media kind selector for batch analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Auto,
    Image,
    Video,
}

impl BatchKind {
    pub fn from_str(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Auto,
        }
    }
}

pub struct DeepfakeDetector<B = RemoteModelBackend> {
    backend: B,
}

impl DeepfakeDetector<RemoteModelBackend> {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            backend: RemoteModelBackend::new(api_key, model),
        }
    }
}

impl<B: AnalysisBackend> DeepfakeDetector<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    /// Analyze one image. On validation rejection, returns an error verdict
    /// without invoking the remote model.
    pub async fn analyze_image(&self, path: &Path) -> Verdict {
        let request_id = Uuid::new_v4();
        info!(
            "[DETECTOR] request {} image {}",
            request_id,
            path.display()
        );

        if !media_io::validate_image(path) {
            warn!("[DETECTOR] request {} rejected by validation", request_id);
            return Verdict::failed("Invalid image file", "File validation failed")
                .stamped(MediaKind::Image, path.to_string_lossy());
        }

        let verdict = match self.backend.analyze_image(path).await {
            Ok(v) => v,
            Err(e) => Verdict::failed(format!("Error during analysis: {e}"), e.to_string()),
        };
        verdict.stamped(MediaKind::Image, path.to_string_lossy())
    }

    /// Analyze one video by sampling up to `max_frames` frames.
    pub async fn analyze_video(&self, path: &Path, max_frames: usize) -> Verdict {
        let request_id = Uuid::new_v4();
        info!(
            "[DETECTOR] request {} video {} (max_frames={})",
            request_id,
            path.display(),
            max_frames
        );

        if !media_io::validate_video(path).await {
            warn!("[DETECTOR] request {} rejected by validation", request_id);
            let mut verdict = Verdict::failed("Invalid video file", "File validation failed");
            verdict.frame_summary = Some(FrameSummary::default());
            return verdict.stamped(MediaKind::Video, path.to_string_lossy());
        }

        let verdict = match self.backend.analyze_video(path, max_frames).await {
            Ok(v) => v,
            Err(e) => {
                let mut v =
                    Verdict::failed(format!("Error during video analysis: {e}"), e.to_string());
                v.frame_summary = Some(FrameSummary::default());
                v
            }
        };
        verdict.stamped(MediaKind::Video, path.to_string_lossy())
    }

    /// Analyze multiple files in input order. `Auto` dispatches on extension
    /// and records unrecognized extensions as error verdicts.
    pub async fn batch_analyze(
        &self,
        paths: &[std::path::PathBuf],
        kind: BatchKind,
        max_frames: usize,
    ) -> Vec<Verdict> {
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            let verdict = match kind {
                BatchKind::Auto => {
                    if media_io::is_image(path) {
                        self.analyze_image(path).await
                    } else if media_io::is_video(path) {
                        self.analyze_video(path, max_frames).await
                    } else {
                        let mut v =
                            Verdict::failed("Unrecognized file extension", "Unknown file type");
                        v.source_path = Some(path.to_string_lossy().to_string());
                        v
                    }
                }
                BatchKind::Image => self.analyze_image(path).await,
                BatchKind::Video => self.analyze_video(path, max_frames).await,
            };
            results.push(verdict);
        }

        results
    }

    pub async fn batch_analyze_auto(&self, paths: &[std::path::PathBuf]) -> Vec<Verdict> {
        self.batch_analyze(paths, BatchKind::Auto, DEFAULT_MAX_FRAMES)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::detection::backend::LocalModelBackend;
    use std::path::PathBuf;

    fn local_detector() -> DeepfakeDetector<LocalModelBackend> {
        DeepfakeDetector::with_backend(LocalModelBackend::new(None))
    }

    #[test]
    fn test_batch_kind_from_str() {
        assert_eq!(BatchKind::from_str("image"), BatchKind::Image);
        assert_eq!(BatchKind::from_str("VIDEO"), BatchKind::Video);
        assert_eq!(BatchKind::from_str("anything"), BatchKind::Auto);
    }

    #[tokio::test]
    async fn test_invalid_image_short_circuits_before_backend() {
        // The local backend would error if reached; validation rejects first.
        let detector = local_detector();
        let v = detector.analyze_image(Path::new("/nonexistent/photo.jpg")).await;
        assert_eq!(v.error.as_deref(), Some("File validation failed"));
        assert_eq!(v.narrative, "Invalid image file");
        assert_eq!(v.media_kind, Some(MediaKind::Image));
        assert_eq!(
            v.source_path.as_deref(),
            Some("/nonexistent/photo.jpg")
        );
    }

    #[tokio::test]
    async fn test_invalid_video_carries_zeroed_frame_summary() {
        let detector = local_detector();
        let v = detector
            .analyze_video(Path::new("/nonexistent/clip.mp4"), DEFAULT_MAX_FRAMES)
            .await;
        assert_eq!(v.error.as_deref(), Some("File validation failed"));
        let fs = v.frame_summary.unwrap();
        assert_eq!(fs.total_frames, 0);
        assert_eq!(fs.suspicious_frames, 0);
    }

    #[tokio::test]
    async fn test_local_backend_yields_not_supported_verdict() {
        let detector = local_detector();
        let f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let img = image::RgbImage::new(4, 4);
        img.save(f.path()).unwrap();

        let v = detector.analyze_image(f.path()).await;
        assert!(v.error.as_deref().unwrap().contains("not supported"));
        assert!(!v.is_manipulated);
        assert_eq!(v.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_batch_auto_flags_unknown_extension() {
        let detector = local_detector();
        let paths = vec![PathBuf::from("/tmp/notes.txt")];
        let results = detector.batch_analyze_auto(&paths).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.as_deref(), Some("Unknown file type"));
        assert_eq!(results[0].source_path.as_deref(), Some("/tmp/notes.txt"));
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let detector = local_detector();
        let paths = vec![
            PathBuf::from("/missing/a.jpg"),
            PathBuf::from("/missing/b.mp4"),
            PathBuf::from("/missing/c.bin"),
        ];
        let results = detector.batch_analyze_auto(&paths).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].media_kind, Some(MediaKind::Image));
        assert_eq!(results[1].media_kind, Some(MediaKind::Video));
        assert_eq!(results[2].error.as_deref(), Some("Unknown file type"));
    }
}
