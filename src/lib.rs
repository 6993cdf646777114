// THEORY:
// This file is the main entry point for the `blob_vision` library crate. It
// defines the public API exposed to the frame loop that owns the camera.
//
// The primary goal is to export `find_blobs` and `BlobPipeline` as the clean,
// high-level interface to the whole segmentation engine, together with the
// value types a caller needs to drive it (`PixelBuffer`, `ColorThreshold`,
// `BlobConfig`) and read its output (`Blob`, `Rect`, `Point`). The stages in
// `core_modules` stay public for callers who want to run one in isolation, but
// a normal caller never touches them.
//
// The library logs through `tracing` and never installs a subscriber; that is
// left to the binary or the host application.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{BlobConfig, ScanRequest};
pub use core_modules::blob::Blob;
pub use core_modules::color_space::{ColorConverter, Lab8, PaletteLab};
pub use core_modules::color_threshold::{ColorThreshold, ThresholdSet};
pub use core_modules::extractor::Connectivity;
pub use core_modules::geometry::{Point, Rect};
pub use core_modules::pixel_buffer::{PixelBuffer, PixelData, PixelFormat};
pub use error::{BlobError, Result};
pub use parallel_pipeline::{FrameBlobs, OwnedFrame, ParallelPipeline};
pub use pipeline::{find_blobs, find_blobs_with, BlobPipeline};
