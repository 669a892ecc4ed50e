// Media I/O Service
// File validation and metadata probes for images and video.
// Video probing shells out to ffprobe; images decode through the image crate.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Case-insensitive extension sets for the supported input formats.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "bmp", "gif"];
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "mkv", "flv", "wmv"];

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    ProbeNotFound(std::io::Error),
    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("media file not found: {0}")]
    FileNotFound(String),
    #[error("image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Lowercased extension of a path, without the dot.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

pub fn is_image(path: &Path) -> bool {
    file_extension(path)
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_video(path: &Path) -> bool {
    file_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Validate that a file is decodable image media. Fails closed: a missing
/// file, wrong extension, or decode error yields `false`, never an error.
pub fn validate_image(path: &Path) -> bool {
    if !path.exists() || !is_image(path) {
        return false;
    }
    match decode_image(path) {
        Ok(_) => true,
        Err(e) => {
            warn!("[MEDIA_IO] image validation failed for {}: {}", path.display(), e);
            false
        }
    }
}

fn decode_image(path: &Path) -> Result<image::DynamicImage, MediaError> {
    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?)
}

/// Validate that a file is openable video media with at least one readable
/// frame. Fails closed like `validate_image`.
pub async fn validate_video(path: &Path) -> bool {
    if !path.exists() || !is_video(path) {
        return false;
    }
    match probe_video(path).await {
        Ok(probe) => {
            if parse_total_frames(&probe) > 0 {
                true
            } else {
                warn!(
                    "[MEDIA_IO] video reports no readable frames: {}",
                    path.display()
                );
                false
            }
        }
        Err(e) => {
            warn!("[MEDIA_IO] video validation failed for {}: {}", path.display(), e);
            false
        }
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
    pub format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
    pub nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
    pub size: Option<String>,
}

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, MediaError> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(MediaError::ProbeNotFound)?;

    if !output.status.success() {
        return Err(MediaError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| MediaError::ParseError(format!("{e}: {stdout}")))
}

fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video duration in seconds from ffprobe output.
pub fn parse_duration(probe: &FfprobeOutput) -> f64 {
    if let Some(d) = &probe.format.duration {
        if let Ok(secs) = d.parse::<f64>() {
            return secs;
        }
    }
    if let Some(stream) = first_video_stream(probe) {
        if let Some(d) = &stream.duration {
            if let Ok(secs) = d.parse::<f64>() {
                return secs;
            }
        }
    }
    0.0
}

/// Parse the video framerate; `r_frame_rate` is a fraction like "24000/1001".
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    first_video_stream(probe)
        .and_then(|s| s.r_frame_rate.as_deref())
        .map(parse_fraction)
        .unwrap_or(0.0)
}

fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
    }
    s.parse::<f64>().unwrap_or(0.0)
}

/// File size as reported by ffprobe's format section.
pub fn parse_file_size(probe: &FfprobeOutput) -> Option<u64> {
    probe.format.size.as_deref().and_then(|s| s.parse().ok())
}

/// Count total frames; falls back to duration * framerate when the stream
/// does not carry nb_frames.
pub fn parse_total_frames(probe: &FfprobeOutput) -> i64 {
    if let Some(stream) = first_video_stream(probe) {
        if let Some(nb) = &stream.nb_frames {
            if let Ok(n) = nb.parse::<i64>() {
                return n;
            }
        }
    }
    let duration = parse_duration(probe);
    let fps = parse_framerate(probe);
    if duration > 0.0 && fps > 0.0 {
        return (duration * fps).round() as i64;
    }
    0
}

// ---------------------------------------------------------------------------
// Metadata probes (CLI surface)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, serde::Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VideoInfo {
    pub frame_count: i64,
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    pub duration_secs: f64,
    pub file_size: u64,
}

pub fn image_info(path: &Path) -> Result<ImageInfo, MediaError> {
    let file_size = std::fs::metadata(path)?.len();
    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .map(|f| format!("{:?}", f))
        .unwrap_or_else(|| "unknown".to_string());
    let (width, height) = reader.into_dimensions()?;
    Ok(ImageInfo {
        width,
        height,
        format,
        file_size,
    })
}

pub async fn video_info(path: &Path) -> Result<VideoInfo, MediaError> {
    let probe = probe_video(path).await?;
    let file_size = match parse_file_size(&probe) {
        Some(size) => size,
        None => std::fs::metadata(path)?.len(),
    };
    let (width, height) = first_video_stream(&probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0));
    Ok(VideoInfo {
        frame_count: parse_total_frames(&probe),
        fps: parse_framerate(&probe),
        width,
        height,
        duration_secs: parse_duration(&probe),
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extension_sets_case_insensitive() {
        assert!(is_image(Path::new("photo.JPG")));
        assert!(is_image(Path::new("photo.webp")));
        assert!(!is_image(Path::new("photo.mp4")));
        assert!(is_video(Path::new("clip.MkV")));
        assert!(!is_video(Path::new("clip.gif")));
        assert!(!is_video(Path::new("clip")));
    }

    #[test]
    fn test_validate_image_missing_file() {
        assert!(!validate_image(Path::new("/nonexistent/photo.jpg")));
    }

    #[test]
    fn test_validate_image_wrong_extension() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(b"not an image").unwrap();
        assert!(!validate_image(f.path()));
    }

    #[test]
    fn test_validate_image_undecodable() {
        let mut f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        f.write_all(b"garbage bytes").unwrap();
        assert!(!validate_image(f.path()));
    }

    #[test]
    fn test_validate_image_real_png() {
        let f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let img = image::RgbImage::new(4, 4);
        img.save(f.path()).unwrap();
        assert!(validate_image(f.path()));
    }

    #[tokio::test]
    async fn test_validate_video_missing_file() {
        assert!(!validate_video(Path::new("/nonexistent/clip.mp4")).await);
    }

    #[test]
    fn test_parse_fraction_standard() {
        assert!((parse_fraction("30/1") - 30.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_fraction_ntsc() {
        assert!((parse_fraction("24000/1001") - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_fraction_zero_denominator() {
        assert!((parse_fraction("30/0") - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_file_size_from_format() {
        let probe = FfprobeOutput {
            streams: vec![],
            format: FfprobeFormat {
                duration: None,
                size: Some("1048576".into()),
            },
        };
        assert_eq!(parse_file_size(&probe), Some(1048576));

        let probe = FfprobeOutput {
            streams: vec![],
            format: FfprobeFormat {
                duration: None,
                size: Some("not a number".into()),
            },
        };
        assert_eq!(parse_file_size(&probe), None);
    }

    #[test]
    fn test_parse_total_frames_from_nb_frames() {
        let probe = FfprobeOutput {
            streams: vec![FfprobeStream {
                codec_type: Some("video".into()),
                width: Some(1920),
                height: Some(1080),
                r_frame_rate: Some("30/1".into()),
                duration: Some("10.0".into()),
                nb_frames: Some("300".into()),
            }],
            format: FfprobeFormat {
                duration: Some("10.0".into()),
                size: None,
            },
        };
        assert_eq!(parse_total_frames(&probe), 300);
    }

    #[test]
    fn test_parse_total_frames_estimated() {
        let probe = FfprobeOutput {
            streams: vec![FfprobeStream {
                codec_type: Some("video".into()),
                width: None,
                height: None,
                r_frame_rate: Some("30/1".into()),
                duration: None,
                nb_frames: None,
            }],
            format: FfprobeFormat {
                duration: Some("10.0".into()),
                size: None,
            },
        };
        assert_eq!(parse_total_frames(&probe), 300);
    }

    #[test]
    fn test_parse_total_frames_empty_probe() {
        let probe = FfprobeOutput {
            streams: vec![],
            format: FfprobeFormat {
                duration: None,
                size: None,
            },
        };
        assert_eq!(parse_total_frames(&probe), 0);
    }
}
