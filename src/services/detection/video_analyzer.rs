// Video Analyzer (Aggregator)
// Drives per-frame analysis in sampled order, tallies suspicious frames,
// issues one aggregate call, and merges per-frame statistics into the final
// verdict. One bad frame never aborts the batch; every temp frame is
// released immediately after its single use.

use std::path::Path;
use tracing::{info, warn};

use crate::models::{FrameSummary, FrameVerdict, Verdict};
use crate::services::frame_sampler::{sample, SampledFrame};
use crate::services::providers::{ImagePayload, ProviderClient};

use super::normalizer::{interpret_reply, HeuristicMode, ReplyFields};
use super::prompts::{aggregate_prompt, frame_prompt};

pub const DEFAULT_MAX_FRAMES: usize = 10;

/// Frame-level suspicion is a bare keyword check on the raw reply; frame
/// replies are free text and never go through JSON extraction.
const FRAME_SUSPICION_KEYWORDS: [&str; 5] = [
    "suspicious",
    "fake",
    "manipulated",
    "artificial",
    "unnatural",
];

const FRAME_NOTE_MAX_CHARS: usize = 200;

/// Fraction of suspicious frames above which the default classification
/// flips to manipulated when the aggregate reply left it absent.
const SUSPICIOUS_RATIO_THRESHOLD: f64 = 0.3;

pub struct VideoAnalyzer {
    client: ProviderClient,
    model: String,
}

impl VideoAnalyzer {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(ProviderClient::new(), model)
    }

    pub fn with_client(client: ProviderClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn analyze(&self, api_key: &str, video_path: &Path, max_frames: usize) -> Verdict {
        let frames = sample(video_path, max_frames).await;

        if frames.is_empty() {
            let mut verdict = Verdict::failed(
                "Could not extract frames from video",
                "Frame extraction produced no frames",
            );
            verdict.frame_summary = Some(FrameSummary::default());
            return verdict;
        }

        let summary = self.analyze_frames(api_key, frames).await;
        info!(
            "[VIDEO_ANALYZER] {}: {}/{} frames suspicious",
            video_path.display(),
            summary.suspicious_frames,
            summary.total_frames
        );

        self.aggregate(api_key, video_path, summary).await
    }

    /// Per-frame analysis over an already-sampled sequence. A remote failure
    /// on one frame records an error note and moves on; every frame's temp
    /// file is released as soon as its call completes.
    async fn analyze_frames(&self, api_key: &str, frames: Vec<SampledFrame>) -> FrameSummary {
        let total_frames = frames.len();
        let mut frame_details = Vec::with_capacity(total_frames);
        let mut suspicious_count = 0usize;

        for (idx, frame) in frames.into_iter().enumerate() {
            let detail = self
                .analyze_frame(api_key, &frame, idx + 1, total_frames)
                .await;
            if detail.is_suspicious {
                suspicious_count += 1;
            }
            frame_details.push(detail);
            // Frame temp file is deleted here, analysis outcome regardless.
            drop(frame);
        }

        FrameSummary {
            total_frames: total_frames as i32,
            suspicious_frames: suspicious_count as i32,
            frame_details,
        }
    }

    /// One aggregate call merged with the per-frame tally. The tally is kept
    /// on the verdict even when the aggregate call itself fails.
    async fn aggregate(&self, api_key: &str, video_path: &Path, summary: FrameSummary) -> Verdict {
        let prompt = aggregate_prompt(
            summary.suspicious_frames as usize,
            summary.total_frames as usize,
        );
        match self.client.ask(&self.model, api_key, &prompt, None).await {
            Ok(reply) => {
                let fields = interpret_reply(&reply.content, HeuristicMode::Aggregate);
                merge_aggregate(fields, &reply.content, summary)
            }
            Err(e) => {
                warn!(
                    "[VIDEO_ANALYZER] aggregate call failed for {}: {}",
                    video_path.display(),
                    e
                );
                let mut verdict =
                    Verdict::failed(format!("Error during video analysis: {e}"), e.to_string());
                verdict.frame_summary = Some(summary);
                verdict
            }
        }
    }

    async fn analyze_frame(
        &self,
        api_key: &str,
        frame: &SampledFrame,
        frame_index: usize,
        total_frames: usize,
    ) -> FrameVerdict {
        let reply = match ImagePayload::from_file(&frame.path) {
            Ok(payload) => self
                .client
                .ask(
                    &self.model,
                    api_key,
                    &frame_prompt(frame_index, total_frames),
                    Some(&payload),
                )
                .await
                .map(|r| r.content)
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match reply {
            Ok(text) => FrameVerdict {
                frame_index: frame_index as i32,
                is_suspicious: is_frame_suspicious(&text),
                note: truncate_chars(&text, FRAME_NOTE_MAX_CHARS),
            },
            Err(e) => {
                warn!(
                    "[VIDEO_ANALYZER] frame {}/{} failed: {}",
                    frame_index, total_frames, e
                );
                FrameVerdict {
                    frame_index: frame_index as i32,
                    is_suspicious: false,
                    note: truncate_chars(
                        &format!("Error analyzing frame: {e}"),
                        FRAME_NOTE_MAX_CHARS,
                    ),
                }
            }
        }
    }
}

/// Merge the interpreted aggregate reply with per-frame statistics. Fields
/// the reply left absent default from the suspicious-frame ratio.
fn merge_aggregate(fields: ReplyFields, raw: &str, summary: FrameSummary) -> Verdict {
    let total = summary.total_frames.max(1) as f64;
    let suspicious = summary.suspicious_frames as f64;
    let ratio = suspicious / total;

    let narrative = fields
        .narrative
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| raw.to_string());

    Verdict {
        is_manipulated: fields
            .is_manipulated
            .unwrap_or(suspicious > SUSPICIOUS_RATIO_THRESHOLD * total),
        confidence: fields
            .confidence
            .unwrap_or_else(|| (ratio * 100.0).min(95.0))
            .clamp(0.0, 100.0),
        narrative,
        indicators: fields.indicators.unwrap_or_default(),
        suspicious_regions: fields.suspicious_regions.unwrap_or_default(),
        temporal_consistency: fields.temporal_consistency,
        frame_summary: Some(summary),
        ..Verdict::default()
    }
}

fn is_frame_suspicious(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    FRAME_SUSPICION_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
