// Prompt Builders
// Directive prompts sent to the remote multimodal model. Image and aggregate
// prompts request the strict JSON shape the normalizer extracts first; frame
// prompts ask for short free text plus a suspicious/not-suspicious signal.

/// Full-image deepfake analysis prompt, strict JSON reply requested.
pub const IMAGE_ANALYSIS_PROMPT: &str = r#"Analyze this image for signs of being a deepfake or AI-generated content.

Please examine the following aspects:
1. **Facial Features**: Irregularities in eyes, teeth, skin texture, facial symmetry
2. **Lighting & Shadows**: Inconsistent lighting, unnatural shadows, mismatched light sources
3. **Background**: Blurry or inconsistent backgrounds, unrealistic elements
4. **Artifacts**: Digital artifacts, blending errors, warping, unnatural edges
5. **Details**: Hair texture, jewelry, reflections, fine details that AI often struggles with
6. **Context**: Overall scene coherence and realism

Provide your analysis in the following JSON format:
{
    "is_deepfake": true/false,
    "confidence_score": 0-100,
    "analysis": "Detailed explanation of your findings",
    "indicators": ["List of specific indicators found"],
    "suspicious_areas": ["Areas that seem manipulated or artificial"]
}

Be thorough and specific in your analysis. Consider both obvious and subtle signs."#;

/// Per-frame prompt: ordinal position plus a short free-text judgment.
pub fn frame_prompt(frame_index: usize, total_frames: usize) -> String {
    format!(
        r#"Analyze frame {frame_index}/{total_frames} of this video for deepfake or AI-generated content.

Focus on:
1. Facial consistency and realism
2. Temporal artifacts (if comparing with previous context)
3. Unnatural movements or transitions
4. Lighting and shadow consistency
5. Background consistency
6. Signs of face-swapping or manipulation

Provide a brief analysis (2-3 sentences) and indicate if this frame seems suspicious."#
    )
}

/// Overall video prompt issued after all frames are judged.
pub fn aggregate_prompt(suspicious_count: usize, total_frames: usize) -> String {
    format!(
        r#"Based on analysis of {total_frames} frames from a video, where {suspicious_count} frames showed suspicious characteristics:

Provide an overall assessment in JSON format:
{{
    "is_deepfake": true/false,
    "confidence_score": 0-100,
    "analysis": "Overall analysis of the video",
    "indicators": ["List of deepfake indicators found across frames"],
    "temporal_consistency": "Assessment of consistency across frames"
}}

Consider:
- Proportion of suspicious frames ({suspicious_count}/{total_frames})
- Consistency of artifacts across frames
- Overall realism and coherence"#
    )
}
