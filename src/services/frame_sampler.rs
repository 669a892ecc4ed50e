// Frame Sampler
// Selects an evenly spaced subset of decodable frames from a video, each
// materialized as a scoped temp JPEG. Deleting a frame is the caller's job
// and happens automatically when the SampledFrame drops.

use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

use super::media_io::{self, MediaError};

/// One extracted frame. The backing temp file is removed when this drops.
#[derive(Debug)]
pub struct SampledFrame {
    pub path: TempPath,
}

/// Frame offsets to extract: multiples of `max(1, total / max_frames)`,
/// capped at `max_frames` and at the stream length.
pub fn sample_offsets(total_frames: i64, max_frames: usize) -> Vec<i64> {
    if total_frames <= 0 || max_frames == 0 {
        return Vec::new();
    }
    let interval = std::cmp::max(1, total_frames / max_frames as i64);
    (0..)
        .map(|k| k * interval)
        .take_while(|offset| *offset < total_frames)
        .take(max_frames)
        .collect()
}

/// Sample up to `max_frames` evenly spaced frames from the video.
///
/// Returns an empty vec when the video reports zero frames or cannot be
/// opened; extraction failures mid-stream stop sampling at the frames
/// already collected. Never errors.
pub async fn sample(video_path: &Path, max_frames: usize) -> Vec<SampledFrame> {
    let probe = match media_io::probe_video(video_path).await {
        Ok(p) => p,
        Err(e) => {
            warn!(
                "[FRAME_SAMPLER] could not open video {}: {}",
                video_path.display(),
                e
            );
            return Vec::new();
        }
    };

    let total_frames = media_io::parse_total_frames(&probe);
    let fps = media_io::parse_framerate(&probe);
    if total_frames <= 0 || fps <= 0.0 {
        warn!(
            "[FRAME_SAMPLER] video has no readable frames: {} (total={}, fps={})",
            video_path.display(),
            total_frames,
            fps
        );
        return Vec::new();
    }

    let offsets = sample_offsets(total_frames, max_frames);
    let mut frames = Vec::with_capacity(offsets.len());

    for offset in offsets {
        match extract_frame(video_path, offset, fps).await {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                // Treat a failed seek/read as end of stream, like a decoder
                // returning no frame: keep what was collected so far.
                warn!(
                    "[FRAME_SAMPLER] extraction failed at frame {} of {}: {}",
                    offset,
                    video_path.display(),
                    e
                );
                break;
            }
        }
    }

    debug!(
        "[FRAME_SAMPLER] sampled {} frame(s) from {} (total={}, max={})",
        frames.len(),
        video_path.display(),
        total_frames,
        max_frames
    );
    frames
}

/// Extract a single frame as a temp JPEG via ffmpeg, seeking by timestamp.
async fn extract_frame(
    video_path: &Path,
    frame_offset: i64,
    fps: f64,
) -> Result<SampledFrame, MediaError> {
    let file = tempfile::Builder::new()
        .prefix("veriframe_frame_")
        .suffix(".jpg")
        .tempfile()?;
    let temp_path = file.into_temp_path();

    let timestamp_secs = frame_offset as f64 / fps;
    let output = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-ss", &format!("{timestamp_secs:.3}"), "-i"])
        .arg(video_path)
        .args(["-frames:v", "1", "-q:v", "2"])
        .arg(temp_path.as_os_str())
        .output()
        .await
        .map_err(MediaError::ProbeNotFound)?;

    if !output.status.success() {
        return Err(MediaError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    // ffmpeg exits 0 but writes nothing when the seek lands past the end.
    let written = std::fs::metadata(&temp_path).map(|m| m.len()).unwrap_or(0);
    if written == 0 {
        return Err(MediaError::ParseError(format!(
            "no frame data at offset {frame_offset}"
        )));
    }

    Ok(SampledFrame { path: temp_path })
}
