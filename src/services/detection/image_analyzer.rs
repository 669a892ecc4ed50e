// Image Analyzer
// Single remote call with the image analysis prompt, normalized into a
// Verdict. Remote failures terminate in an error verdict, never propagate.

use std::path::Path;
use tracing::{info, warn};

use crate::models::Verdict;
use crate::services::providers::{ImagePayload, ProviderClient};

use super::normalizer::{normalize, HeuristicMode};
use super::prompts::IMAGE_ANALYSIS_PROMPT;

pub struct ImageAnalyzer {
    client: ProviderClient,
    model: String,
}

impl ImageAnalyzer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: ProviderClient::new(),
            model: model.into(),
        }
    }

    pub async fn analyze(&self, api_key: &str, image_path: &Path) -> Verdict {
        let payload = match ImagePayload::from_file(image_path) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    "[IMAGE_ANALYZER] could not read {}: {}",
                    image_path.display(),
                    e
                );
                return Verdict::failed(format!("Error during analysis: {e}"), e.to_string());
            }
        };

        match self
            .client
            .ask(&self.model, api_key, IMAGE_ANALYSIS_PROMPT, Some(&payload))
            .await
        {
            Ok(reply) => {
                info!(
                    "[IMAGE_ANALYZER] model reply for {} ({} chars, latency_ms={})",
                    image_path.display(),
                    reply.content.chars().count(),
                    reply.latency_ms
                );
                normalize(&reply.content, HeuristicMode::Image)
            }
            Err(e) => {
                warn!(
                    "[IMAGE_ANALYZER] remote call failed for {}: {}",
                    image_path.display(),
                    e
                );
                Verdict::failed(format!("Error during analysis: {e}"), e.to_string())
            }
        }
    }
}
