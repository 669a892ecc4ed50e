// VeriFrame Data Models
// Canonical verdict records returned by every analysis path

use serde::{Deserialize, Serialize};

/// Kind of media an analysis request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Per-frame judgment produced while aggregating a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameVerdict {
    /// 1-based position within the sampled frame sequence.
    pub frame_index: i32,
    pub is_suspicious: bool,
    /// Model excerpt or error text, capped at 200 characters.
    pub note: String,
}

/// Video-level tally merged into the final verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSummary {
    pub total_frames: i32,
    pub suspicious_frames: i32,
    #[serde(default)]
    pub frame_details: Vec<FrameVerdict>,
}

/// Canonical output of any analysis call.
///
/// `confidence` is always within [0, 100]. A request that could not be
/// completed still yields a well-formed verdict: `is_manipulated=false`,
/// `confidence=0`, an explanatory `narrative`, and `error` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_manipulated: bool,
    pub confidence: f64,
    /// Human-readable explanation; falls back to the raw model text.
    pub narrative: String,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub suspicious_regions: Vec<String>,
    /// Cross-frame consistency assessment, video aggregate replies only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_consistency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_summary: Option<FrameSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stamped by the detector facade, not by the normalizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Default for Verdict {
    fn default() -> Self {
        Self {
            is_manipulated: false,
            confidence: 0.0,
            narrative: String::new(),
            indicators: Vec::new(),
            suspicious_regions: Vec::new(),
            temporal_consistency: None,
            frame_summary: None,
            error: None,
            media_kind: None,
            source_path: None,
        }
    }
}

impl Verdict {
    /// Well-formed failure verdict: safe defaults everywhere, `error` set.
    pub fn failed(narrative: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Attach request metadata. Called by the detector facade only.
    pub fn stamped(mut self, kind: MediaKind, source_path: impl Into<String>) -> Self {
        self.media_kind = Some(kind);
        self.source_path = Some(source_path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_verdict_defaults() {
        let v = Verdict::failed("Invalid image file", "File validation failed");
        assert!(!v.is_manipulated);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.narrative, "Invalid image file");
        assert_eq!(v.error.as_deref(), Some("File validation failed"));
        assert!(v.indicators.is_empty());
        assert!(v.frame_summary.is_none());
    }

    #[test]
    fn test_stamped_metadata() {
        let v = Verdict::default().stamped(MediaKind::Video, "/tmp/clip.mp4");
        assert_eq!(v.media_kind, Some(MediaKind::Video));
        assert_eq!(v.source_path.as_deref(), Some("/tmp/clip.mp4"));
    }

    #[test]
    fn test_verdict_serialization_roundtrip() {
        let v = Verdict {
            is_manipulated: true,
            confidence: 85.0,
            narrative: "unnatural lighting".to_string(),
            indicators: vec!["inconsistent shadows".to_string()],
            ..Verdict::default()
        };
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("isManipulated"));
        assert!(!json.contains("frameSummary"));
        let parsed: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.confidence, 85.0);
        assert_eq!(parsed.indicators.len(), 1);
    }
}
