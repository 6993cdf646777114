//! Configuration for blob extraction.
//!
//! A [`BlobConfig`] carries every option of a `find_blobs` call with its
//! default. It can be built in code, or loaded from JSON where every field is
//! optional:
//!
//! ```no_run
//! use blob_vision::BlobConfig;
//! use std::path::Path;
//!
//! let config = BlobConfig::from_json_file(Path::new("blobs.json"))?;
//! let merged = BlobConfig { merge: true, margin: 4, ..BlobConfig::default() };
//! # Ok::<(), blob_vision::BlobError>(())
//! ```
//!
//! A [`ScanRequest`] bundles a config with the thresholds and ROI for the
//! command-line runner.

use crate::core_modules::color_threshold::ThresholdSet;
use crate::core_modules::extractor::Connectivity;
use crate::core_modules::geometry::Rect;
use crate::error::{BlobError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_AREA_THRESHOLD: u32 = 10;
pub const DEFAULT_PIXELS_THRESHOLD: u32 = 10;
pub const DEFAULT_MAX_REGIONS: usize = 1024;

/// Options for one blob extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Flip every threshold's verdict.
    pub invert: bool,
    /// Minimum bounding-box area (`w * h`) of an elementary region.
    pub area_threshold: u32,
    /// Minimum pixel count of an elementary region.
    pub pixels_threshold: u32,
    /// Merge regions whose margin-grown boxes overlap.
    pub merge: bool,
    /// Pixels by which boxes are grown before the merge overlap test.
    pub margin: u32,
    /// Neighborhood used by the flood fill.
    pub connectivity: Connectivity,
    /// Elementary regions admitted before the scan stops. Must be at least 1.
    pub max_regions: usize,
    /// Optional area minimum applied to blobs after merging.
    pub post_merge_area_threshold: Option<u32>,
    /// Optional pixel-count minimum applied to blobs after merging.
    pub post_merge_pixels_threshold: Option<u32>,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            invert: false,
            area_threshold: DEFAULT_AREA_THRESHOLD,
            pixels_threshold: DEFAULT_PIXELS_THRESHOLD,
            merge: false,
            margin: 0,
            connectivity: Connectivity::default(),
            max_regions: DEFAULT_MAX_REGIONS,
            post_merge_area_threshold: None,
            post_merge_pixels_threshold: None,
        }
    }
}

impl BlobConfig {
    /// Checks the options that the type system does not.
    pub fn validate(&self) -> Result<()> {
        if self.max_regions == 0 {
            return Err(BlobError::invalid_parameter("max_regions", self.max_regions));
        }
        Ok(())
    }

    /// `true` when a post-merge filter is configured.
    pub fn has_post_merge_filter(&self) -> bool {
        self.post_merge_area_threshold.is_some() || self.post_merge_pixels_threshold.is_some()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Everything the CLI needs for one run, as read from a request file.
///
/// ```json
/// { "thresholds": [[0, 50], [30, 60, 20, 80, -10, 10]], "roi": [0, 0, 320, 240], "config": { "merge": true } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    /// Loose threshold tuples, `[Lmin, Lmax]` or `[Lmin, Lmax, Amin, Amax, Bmin, Bmax]`.
    pub thresholds: Vec<Vec<i32>>,
    /// `[x, y, w, h]`; the whole image when absent.
    pub roi: Option<[i32; 4]>,
    pub config: BlobConfig,
}

impl ScanRequest {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let request: Self = serde_json::from_str(&json)?;
        request.config.validate()?;
        Ok(request)
    }

    pub fn threshold_set(&self) -> ThresholdSet {
        ThresholdSet::from_values(&self.thresholds)
    }

    pub fn roi_rect(&self) -> Option<Rect> {
        self.roi.map(|[x, y, w, h]| Rect::new(x, y, w, h))
    }
}
