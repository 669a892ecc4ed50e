// Detection Module
// Deepfake screening core organized into specialized submodules:
// - prompts: directive prompt builders for image/frame/aggregate calls
// - normalizer: canonicalizes raw model replies into Verdicts
// - image_analyzer: single-image analysis path
// - video_analyzer: per-frame aggregation path
// - backend: remote vs. local analysis backends
// - detector: facade sequencing validation, analysis, and metadata stamping

pub mod backend;
pub mod detector;
pub mod image_analyzer;
pub mod normalizer;
pub mod prompts;
pub mod video_analyzer;

pub use backend::{AnalysisBackend, BackendError, LocalModelBackend, RemoteModelBackend};
pub use detector::{BatchKind, DeepfakeDetector};
pub use image_analyzer::ImageAnalyzer;
pub use normalizer::{interpret_reply, normalize, HeuristicMode, ReplyFields};
pub use video_analyzer::{VideoAnalyzer, DEFAULT_MAX_FRAMES};
