// VeriFrame Core Services

pub mod config_store;
pub mod detection;
pub mod frame_sampler;
pub mod media_io;
pub mod providers;

pub use config_store::*;
pub use providers::*;

// Re-export the detection surface consumed by callers
pub use detection::{
    normalize, BatchKind, DeepfakeDetector, HeuristicMode, LocalModelBackend, RemoteModelBackend,
    DEFAULT_MAX_FRAMES,
};
