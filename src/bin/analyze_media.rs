use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use veriframe::models::Verdict;
use veriframe::services::config_store::ConfigStore;
use veriframe::services::detection::{BatchKind, DeepfakeDetector, DEFAULT_MAX_FRAMES};
use veriframe::services::media_io;
use veriframe::services::providers::{get_api_key, DEFAULT_MODEL};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn print_verdict(verdict: &Verdict) {
    let path = verdict.source_path.as_deref().unwrap_or("(unknown)");
    let kind = verdict
        .media_kind
        .map(|k| k.as_str())
        .unwrap_or("unknown");
    println!("File: {} [{}]", path, kind);

    if let Some(ref err) = verdict.error {
        println!("  Error: {}", err);
    }
    println!(
        "  Manipulated: {}  Confidence: {:.0}",
        verdict.is_manipulated, verdict.confidence
    );
    println!("  Analysis: {}", preview(&verdict.narrative, 200));
    for indicator in &verdict.indicators {
        println!("  - {}", preview(indicator, 120));
    }
    if let Some(ref tc) = verdict.temporal_consistency {
        println!("  Temporal consistency: {}", preview(tc, 120));
    }
    if let Some(ref fs) = verdict.frame_summary {
        println!(
            "  Frames: {}/{} suspicious",
            fs.suspicious_frames, fs.total_frames
        );
        for frame in &fs.frame_details {
            println!(
                "    [F{:02}] suspicious={}  {}",
                frame.frame_index,
                frame.is_suspicious,
                preview(&frame.note, 100)
            );
        }
    }
    println!();
}

async fn print_info(path: &PathBuf) -> Result<()> {
    if media_io::is_image(path) {
        let info = media_io::image_info(path)
            .with_context(|| format!("probe failed for {}", path.display()))?;
        println!(
            "{}: {}x{} {} ({} bytes)",
            path.display(),
            info.width,
            info.height,
            info.format,
            info.file_size
        );
    } else if media_io::is_video(path) {
        let info = media_io::video_info(path)
            .await
            .with_context(|| format!("probe failed for {}", path.display()))?;
        println!(
            "{}: {}x{} {:.2} fps, {} frames, {:.1}s ({} bytes)",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.frame_count,
            info.duration_secs,
            info.file_size
        );
    } else {
        println!("{}: unknown file type", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  analyze_media <path> [<path>...] [--kind auto|image|video] [--max-frames <n>] [--model <name>] [--info] [--json]\n\nNotes:\n  - API key resolves from GEMINI_API_KEY / VERIFRAME_GEMINI_API_KEY or the config file.\n  - --info prints media metadata only, no remote calls.\n  - --json dumps the full verdict list as JSON."
        );
        return Ok(());
    }

    veriframe::init_logging();

    let kind = BatchKind::from_str(&parse_arg_value(&args, "--kind").unwrap_or_default());
    let max_frames: usize = parse_arg_value(&args, "--max-frames")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_FRAMES);
    let info_only = has_flag(&args, "--info");
    let json_output = has_flag(&args, "--json");

    let paths: Vec<PathBuf> = args[1..]
        .iter()
        .take_while(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .collect();
    if paths.is_empty() {
        bail!("no input files given");
    }

    if info_only {
        for path in &paths {
            print_info(path).await?;
        }
        return Ok(());
    }

    let model = parse_arg_value(&args, "--model").unwrap_or_else(|| {
        ConfigStore::default_config_dir()
            .map(ConfigStore::new)
            .and_then(|store| store.load().ok())
            .map(|config| config.detection.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    });

    let api_key = get_api_key("gemini")
        .context("no API key configured (set GEMINI_API_KEY or store one in the config file)")?;

    let detector = DeepfakeDetector::new(api_key, model);
    let results = detector.batch_analyze(&paths, kind, max_frames).await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for verdict in &results {
            print_verdict(verdict);
        }
    }

    Ok(())
}
