// Response Normalizer
// Turns an unstructured model reply into a canonical Verdict, degrading
// through three levels of structure: valid JSON span -> keyword heuristics
// -> raw text. Pure functions of the input; never fails a request.

use serde_json::Value;

use crate::models::Verdict;

/// Which heuristic keyword set applies when JSON extraction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicMode {
    Image,
    Aggregate,
}

/// Keywords whose presence marks a reply as claiming manipulation.
const MANIPULATION_KEYWORDS: [&str; 6] = [
    "deepfake",
    "ai-generated",
    "artificial",
    "synthetic",
    "fake",
    "manipulated",
];

// Confidence families. Checked in this order; each hit reassigns the value
// outright, so the last matching family wins regardless of where the words
// sit in the text. Known quirk, kept for behavioral fidelity (DESIGN.md).
const HEDGED_WORDS: [&str; 3] = ["likely", "probably", "appears"];
const ASSERTIVE_WORDS: [&str; 3] = ["definitely", "clearly", "obvious"];
const TENTATIVE_WORDS: [&str; 3] = ["possibly", "might", "could"];

const IMAGE_INDICATOR_KEYWORDS: [&str; 6] = [
    "inconsistent",
    "unnatural",
    "artifact",
    "blurr",
    "warp",
    "irregular",
];
const AGGREGATE_INDICATOR_KEYWORDS: [&str; 5] = [
    "inconsistent",
    "unnatural",
    "artifact",
    "manipulation",
    "suspicious",
];

/// Heuristically derived indicator lists are capped; model-supplied lists
/// pass through unbounded.
const MAX_HEURISTIC_INDICATORS: usize = 5;

/// Fields interpreted from one reply. `None` means the reply did not carry
/// the field; field completion fills those with safe defaults.
#[derive(Debug, Clone, Default)]
pub struct ReplyFields {
    pub is_manipulated: Option<bool>,
    pub confidence: Option<f64>,
    pub narrative: Option<String>,
    pub indicators: Option<Vec<String>>,
    pub suspicious_regions: Option<Vec<String>>,
    pub temporal_consistency: Option<String>,
}

/// Interpret a raw reply: JSON extraction first, keyword heuristics on
/// extraction failure. The aggregator consumes this directly so it can apply
/// its own ratio-based defaults to fields the reply left absent.
pub fn interpret_reply(raw: &str, mode: HeuristicMode) -> ReplyFields {
    if let Some(fields) = extract_json_fields(raw) {
        return fields;
    }
    heuristic_fields(raw, mode)
}

/// Canonical verdict for a raw reply: interpretation plus field completion.
/// Idempotent; depends only on the input text and mode.
pub fn normalize(raw: &str, mode: HeuristicMode) -> Verdict {
    complete(interpret_reply(raw, mode), raw)
}

/// Field completion: fill absent fields with safe defaults, never overwrite
/// a present value. Confidence is clamped to [0, 100] on every path.
pub fn complete(fields: ReplyFields, raw: &str) -> Verdict {
    let narrative = fields
        .narrative
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| raw.to_string());

    Verdict {
        is_manipulated: fields.is_manipulated.unwrap_or(false),
        confidence: fields.confidence.unwrap_or(0.0).clamp(0.0, 100.0),
        narrative,
        indicators: fields.indicators.unwrap_or_default(),
        suspicious_regions: fields.suspicious_regions.unwrap_or_default(),
        temporal_consistency: fields.temporal_consistency,
        ..Verdict::default()
    }
}

/// Lenient JSON extraction: the span from the first `{` to the last `}`.
/// Accepts arbitrary prose around one JSON object; returns `None` when the
/// braces are missing or the span is not a JSON object, which sends the
/// reply down the heuristic path.
fn extract_json_fields(raw: &str) -> Option<ReplyFields> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    let obj = value.as_object()?;

    Some(ReplyFields {
        is_manipulated: obj.get("is_deepfake").and_then(Value::as_bool),
        confidence: obj.get("confidence_score").and_then(Value::as_f64),
        narrative: obj
            .get("analysis")
            .and_then(Value::as_str)
            .map(str::to_string),
        indicators: obj.get("indicators").and_then(Value::as_array).map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
        suspicious_regions: obj
            .get("suspicious_areas")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
        temporal_consistency: obj
            .get("temporal_consistency")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Keyword fallback for free-text replies.
fn heuristic_fields(raw: &str, mode: HeuristicMode) -> ReplyFields {
    let lower = raw.to_lowercase();
    let is_manipulated = MANIPULATION_KEYWORDS.iter().any(|k| lower.contains(k));

    let mut strength: f64 = 0.0;
    if HEDGED_WORDS.iter().any(|w| lower.contains(w)) {
        strength = 65.0;
    }
    if ASSERTIVE_WORDS.iter().any(|w| lower.contains(w)) {
        strength = 85.0;
    }
    if TENTATIVE_WORDS.iter().any(|w| lower.contains(w)) {
        strength = 40.0;
    }

    // Strength reads as manipulation likelihood when manipulated, as
    // authenticity confidence (inverted back) otherwise.
    let confidence = if is_manipulated {
        strength
    } else {
        100.0 - strength
    };

    let keywords: &[&str] = match mode {
        HeuristicMode::Image => &IMAGE_INDICATOR_KEYWORDS,
        HeuristicMode::Aggregate => &AGGREGATE_INDICATOR_KEYWORDS,
    };
    let indicators: Vec<String> = raw
        .split('.')
        .filter(|sentence| {
            let s = sentence.to_lowercase();
            keywords.iter().any(|k| s.contains(k))
        })
        .map(|sentence| sentence.trim().to_string())
        .take(MAX_HEURISTIC_INDICATORS)
        .collect();

    ReplyFields {
        is_manipulated: Some(is_manipulated),
        confidence: Some(confidence),
        narrative: Some(raw.to_string()),
        indicators: Some(indicators),
        suspicious_regions: Some(Vec::new()),
        temporal_consistency: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_extraction_with_surrounding_prose() {
        let raw = r#"Here is my assessment:
{"is_deepfake": true, "confidence_score": 72, "analysis": "warped edges", "indicators": ["edge warp", "skin texture"], "suspicious_areas": ["jawline"]}
Let me know if you need more."#;
        let v = normalize(raw, HeuristicMode::Image);
        assert!(v.is_manipulated);
        assert_eq!(v.confidence, 72.0);
        assert_eq!(v.narrative, "warped edges");
        assert_eq!(v.indicators, vec!["edge warp", "skin texture"]);
        assert_eq!(v.suspicious_regions, vec!["jawline"]);
    }

    #[test]
    fn test_json_missing_fields_get_defaults_not_heuristics() {
        // Valid object with only one field: absent fields default, and the
        // keyword heuristic must NOT run even though "fake" appears outside.
        let raw = r#"This is fake! {"confidence_score": 55}"#;
        let v = normalize(raw, HeuristicMode::Image);
        assert!(!v.is_manipulated);
        assert_eq!(v.confidence, 55.0);
        assert_eq!(v.narrative, raw);
        assert!(v.indicators.is_empty());
    }

    #[test]
    fn test_malformed_json_falls_back_to_heuristics() {
        let raw = r#"{"is_deepfake": true, "confidence_score":"#;
        let v = normalize(raw, HeuristicMode::Image);
        // Heuristic path: "deepfake" keyword present.
        assert!(v.is_manipulated);
        assert_eq!(v.narrative, raw);
    }

    #[test]
    fn test_json_array_span_falls_back_to_heuristics() {
        // find('{')..rfind('}') around an array-of-objects span is not a
        // single object; degrade to keywords.
        let raw = r#"[{"a": 1}, {"b": 2}] clearly synthetic"#;
        let v = normalize(raw, HeuristicMode::Image);
        assert!(v.is_manipulated);
        assert_eq!(v.confidence, 85.0);
    }

    #[test]
    fn test_no_braces_uses_keywords() {
        let v = normalize("This photo looks entirely authentic", HeuristicMode::Image);
        assert!(!v.is_manipulated);
        // No confidence family present: strength 0, inverted to 100.
        assert_eq!(v.confidence, 100.0);
    }

    #[test]
    fn test_confidence_precedence_assertive_beats_hedged() {
        let v = normalize(
            "This is likely a deepfake, the warping is obvious",
            HeuristicMode::Image,
        );
        assert!(v.is_manipulated);
        assert_eq!(v.confidence, 85.0);
    }

    #[test]
    fn test_confidence_precedence_tentative_checked_last_wins() {
        let v = normalize(
            "Obvious deepfake, though lighting could be natural",
            HeuristicMode::Image,
        );
        assert!(v.is_manipulated);
        assert_eq!(v.confidence, 40.0);
    }

    #[test]
    fn test_authentic_confidence_is_inverted() {
        let v = normalize("This appears to be a genuine photograph", HeuristicMode::Image);
        assert!(!v.is_manipulated);
        assert_eq!(v.confidence, 35.0);
    }

    #[test]
    fn test_indicator_extraction_capped_and_ordered() {
        let raw = "First artifact here. Second artifact here. Third artifact here. \
                   Fourth artifact here. Fifth artifact here. Sixth artifact here. \
                   And it is a deepfake.";
        let v = normalize(raw, HeuristicMode::Image);
        assert_eq!(v.indicators.len(), 5);
        assert_eq!(v.indicators[0], "First artifact here");
        assert_eq!(v.indicators[4], "Fifth artifact here");
    }

    #[test]
    fn test_aggregate_mode_uses_its_own_keyword_set() {
        let raw = "There are signs of manipulation across frames. Also some blurring.";
        let agg = normalize(raw, HeuristicMode::Aggregate);
        // "manipulation" matches in aggregate mode; "blurr" does not.
        assert_eq!(
            agg.indicators,
            vec!["There are signs of manipulation across frames"]
        );
        let img = normalize(raw, HeuristicMode::Image);
        // Image mode matches "blurr" instead.
        assert_eq!(img.indicators, vec!["Also some blurring"]);
    }

    #[test]
    fn test_confidence_clamped_from_structured_reply() {
        let raw = r#"{"is_deepfake": true, "confidence_score": 250}"#;
        let v = normalize(raw, HeuristicMode::Image);
        assert_eq!(v.confidence, 100.0);
        let raw = r#"{"is_deepfake": false, "confidence_score": -3}"#;
        let v = normalize(raw, HeuristicMode::Image);
        assert_eq!(v.confidence, 0.0);
    }

    #[test]
    fn test_free_text_reply_with_assertive_claim() {
        let raw = "The face shows unnatural lighting and artifact blending around the jaw. \
                   Definitely manipulated.";
        let v = normalize(raw, HeuristicMode::Image);
        assert!(v.is_manipulated);
        assert_eq!(v.confidence, 85.0);
        assert!(v
            .indicators
            .iter()
            .any(|i| i.contains("unnatural lighting")));
        assert!(v.indicators.len() <= 5);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "Possibly manipulated. The background is inconsistent.";
        let a = normalize(raw, HeuristicMode::Image);
        let b = normalize(raw, HeuristicMode::Image);
        assert_eq!(a.is_manipulated, b.is_manipulated);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.narrative, b.narrative);
        assert_eq!(a.indicators, b.indicators);
    }

    #[test]
    fn test_temporal_consistency_passthrough() {
        let raw = r#"{"is_deepfake": false, "confidence_score": 10, "analysis": "steady", "temporal_consistency": "consistent across frames"}"#;
        let v = normalize(raw, HeuristicMode::Aggregate);
        assert_eq!(
            v.temporal_consistency.as_deref(),
            Some("consistent across frames")
        );
    }
}
