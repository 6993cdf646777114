// Command-line runner for the `blob_vision` engine.
//
// Loads one or more images, runs the blob finder on each and prints the blobs,
// one `Display` line per blob or a JSON document with `--json`. Several images
// are analysed side by side on the parallel pipeline.

use blob_vision::{
    BlobConfig, BlobPipeline, Connectivity, FrameBlobs, OwnedFrame, ParallelPipeline, Result, ScanRequest,
    ThresholdSet,
};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Images to scan
    #[arg(required = true)]
    images: Vec<PathBuf>,
    /// JSON scan request with thresholds, ROI and config
    #[arg(long)]
    request: Option<PathBuf>,
    /// Color threshold as `lo,hi` or `lo,hi,alo,ahi,blo,bhi`; repeatable
    #[arg(short, long = "threshold", value_parser = parse_threshold)]
    thresholds: Vec<ThresholdArg>,
    /// Scan in LAB color space (the image is packed to RGB565)
    #[arg(long)]
    color: bool,
    /// Invert every threshold
    #[arg(long)]
    invert: bool,
    /// Merge nearby blobs
    #[arg(long)]
    merge: bool,
    /// Merge margin in pixels
    #[arg(long)]
    margin: Option<u32>,
    /// Grow regions through diagonal neighbors
    #[arg(long)]
    eight_connected: bool,
    /// Print JSON instead of one line per blob
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone)]
struct ThresholdArg(Vec<i32>);

fn parse_threshold(value: &str) -> std::result::Result<ThresholdArg, String> {
    let values = value
        .split(',')
        .map(|v| v.trim().parse::<i32>().map_err(|e| format!("`{v}`: {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if values.len() != 2 && values.len() != 6 {
        return Err(format!("expected 2 or 6 values, got {}", values.len()));
    }
    Ok(ThresholdArg(values))
}

#[derive(Serialize)]
struct ImageReport<'a> {
    image: &'a Path,
    blobs: &'a [blob_vision::Blob],
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut request = match &cli.request {
        Some(path) => ScanRequest::from_json_file(path)?,
        None => ScanRequest::default(),
    };
    request
        .thresholds
        .extend(cli.thresholds.iter().map(|ThresholdArg(values)| values.clone()));
    apply_overrides(&mut request.config, &cli);

    let thresholds: ThresholdSet = request.threshold_set();
    if thresholds.is_empty() {
        warn!("No color thresholds given; every image will report zero blobs");
    }

    let mut pipeline = BlobPipeline::from_set(thresholds, request.config.clone())?;
    if let Some(roi) = request.roi_rect() {
        pipeline = pipeline.with_roi(roi);
    }

    let frames = cli
        .images
        .iter()
        .map(|path| load_frame(path, cli.color))
        .collect::<Result<Vec<_>>>()?;

    let results = if frames.len() == 1 {
        let frame = &frames[0];
        vec![pipeline.process(&frame.as_buffer()?).map(|blobs| FrameBlobs { frame_id: 0, blobs })]
    } else {
        ParallelPipeline::new(pipeline).process_batch(frames).await
    };

    let mut reports = Vec::with_capacity(results.len());
    for (path, result) in cli.images.iter().zip(&results) {
        match result {
            Ok(found) => {
                info!(image = %path.display(), blobs = found.blobs.len(), "Scan complete");
                reports.push(ImageReport {
                    image: path,
                    blobs: &found.blobs,
                });
            }
            Err(e) => error!(image = %path.display(), "Scan failed: {e}"),
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            if cli.images.len() > 1 {
                println!("{}:", report.image.display());
            }
            for blob in report.blobs {
                println!("{blob}");
            }
        }
    }

    // Surface the first failure as the exit status.
    results.into_iter().find_map(|r| r.err()).map_or(Ok(()), Err)
}

fn apply_overrides(config: &mut BlobConfig, cli: &Cli) {
    config.invert |= cli.invert;
    config.merge |= cli.merge;
    if let Some(margin) = cli.margin {
        config.margin = margin;
    }
    if cli.eight_connected {
        config.connectivity = Connectivity::Eight;
    }
}

fn load_frame(path: &Path, color: bool) -> Result<OwnedFrame> {
    let image = image::open(path)?;
    Ok(if color {
        OwnedFrame::from_rgb_image(&image.to_rgb8())
    } else {
        OwnedFrame::from_gray_image(image.to_luma8())
    })
}
