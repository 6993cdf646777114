// THEORY:
// The `pipeline` module is the top-level API of the engine. It runs the full
// stack for one frame:
//
//   Classifier -> Extractor (+ Size Filter) -> Merger (optional) -> Assembler
//
// and hands back an ordered `Vec<Blob>` that the caller owns.
//
// Key architectural principles:
// 1.  **Stateless Per Frame**: Nothing survives between calls. `BlobPipeline`
//     only stores what the caller configured (thresholds, ROI, options and the
//     color converter) so that a frame loop does not rebuild them every frame.
// 2.  **Short Circuits Before Allocation**: An empty threshold list, or an ROI
//     that does not intersect the image, returns an empty list before any
//     scratch memory is acquired or any pixel is read.
// 3.  **All Or Nothing**: Scratch memory is acquired fallibly. If any reservation
//     fails the call returns `BlobError::OutOfMemory`; the scratch arena is
//     dropped on that path exactly as on the success path, and no partial blob
//     list escapes.

use crate::config::BlobConfig;
use crate::core_modules::assembler::BlobAssembler;
use crate::core_modules::blob::Blob;
use crate::core_modules::classifier::ColorClassifier;
use crate::core_modules::color_space::{ColorConverter, PaletteLab};
use crate::core_modules::color_threshold::{ColorThreshold, ThresholdSet};
use crate::core_modules::extractor::ComponentExtractor;
use crate::core_modules::geometry::Rect;
use crate::core_modules::merger::RegionMerger;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::scratch::Scratch;
use crate::core_modules::size_filter::SizeFilter;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Finds blobs with the default `palette`-backed color conversion.
///
/// `roi` of `None` scans the whole image.
pub fn find_blobs(
    buffer: &PixelBuffer<'_>,
    roi: Option<Rect>,
    thresholds: &[ColorThreshold],
    config: &BlobConfig,
) -> Result<Vec<Blob>> {
    find_blobs_with(buffer, roi, &ThresholdSet::new(thresholds), config, &PaletteLab)
}

/// Finds blobs using a caller-supplied color converter.
pub fn find_blobs_with(
    buffer: &PixelBuffer<'_>,
    roi: Option<Rect>,
    thresholds: &ThresholdSet,
    config: &BlobConfig,
    converter: &dyn ColorConverter,
) -> Result<Vec<Blob>> {
    config.validate()?;

    if thresholds.is_empty() {
        debug!("No color thresholds; nothing to scan");
        return Ok(Vec::new());
    }

    let bounds = buffer.bounds();
    let Some(roi) = roi.unwrap_or(bounds).intersection(&bounds) else {
        debug!(image = %bounds, "ROI does not intersect the image; nothing to scan");
        return Ok(Vec::new());
    };

    debug!(
        roi = %roi,
        format = ?buffer.format(),
        thresholds = thresholds.len(),
        merge = config.merge,
        "Scanning for blobs"
    );

    let classifier = ColorClassifier::new(buffer, thresholds, config.invert, converter);
    let mut scratch = Scratch::try_new(roi.area() as usize, config.max_regions)?;

    let extractor = ComponentExtractor::new(
        &classifier,
        buffer.width(),
        roi,
        config.connectivity,
        SizeFilter::new(config.area_threshold, config.pixels_threshold),
    );
    let extraction = extractor.extract(&mut scratch)?;
    let regions = scratch.into_regions();

    debug!(
        grown = extraction.grown,
        rejected = extraction.rejected,
        kept = regions.len(),
        truncated = extraction.truncated,
        "Extraction finished"
    );

    let regions = if config.merge {
        let (merged, summary) = RegionMerger::new(config.margin, roi).merge(regions);
        debug!(
            merges = summary.merges,
            rounds = summary.rounds,
            remaining = merged.len(),
            "Merge reached fixed point"
        );
        merged
    } else {
        regions
    };

    let post_merge_filter = config.has_post_merge_filter().then(|| {
        SizeFilter::new(
            config.post_merge_area_threshold.unwrap_or(0),
            config.post_merge_pixels_threshold.unwrap_or(0),
        )
    });
    let blobs = BlobAssembler::new(post_merge_filter).assemble(regions)?;

    debug!(blobs = blobs.len(), "Blob extraction finished");
    Ok(blobs)
}

/// A reusable per-frame blob finder.
///
/// ```rust,no_run
/// use blob_vision::{BlobConfig, BlobPipeline, ColorThreshold, PixelBuffer};
///
/// let pipeline = BlobPipeline::new(&[ColorThreshold::gray(0, 50)], BlobConfig::default())?;
/// let frame = vec![0u8; 320 * 240];
/// let blobs = pipeline.process(&PixelBuffer::grayscale(320, 240, &frame)?)?;
/// # Ok::<(), blob_vision::BlobError>(())
/// ```
#[derive(Clone)]
pub struct BlobPipeline {
    thresholds: ThresholdSet,
    config: BlobConfig,
    roi: Option<Rect>,
    converter: Arc<dyn ColorConverter>,
}

impl BlobPipeline {
    pub fn new(thresholds: &[ColorThreshold], config: BlobConfig) -> Result<Self> {
        Self::from_set(ThresholdSet::new(thresholds), config)
    }

    pub fn from_set(thresholds: ThresholdSet, config: BlobConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            thresholds,
            config,
            roi: None,
            converter: Arc::new(PaletteLab),
        })
    }

    /// Restricts every frame to `roi`.
    pub fn with_roi(mut self, roi: Rect) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Replaces the default color conversion.
    pub fn with_converter(mut self, converter: Arc<dyn ColorConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn roi(&self) -> Option<Rect> {
        self.roi
    }

    /// Runs the full engine on one frame.
    pub fn process(&self, buffer: &PixelBuffer<'_>) -> Result<Vec<Blob>> {
        find_blobs_with(buffer, self.roi, &self.thresholds, &self.config, self.converter.as_ref())
    }
}

impl std::fmt::Debug for BlobPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobPipeline")
            .field("thresholds", &self.thresholds)
            .field("config", &self.config)
            .field("roi", &self.roi)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlobError;

    fn scenario_image() -> Vec<u8> {
        let mut data = vec![200u8; 64];
        for y in 2..5 {
            for x in 2..5 {
                data[y * 8 + x] = 10;
            }
        }
        data
    }

    #[test]
    fn dark_block_scenario() {
        let data = scenario_image();
        let buffer = PixelBuffer::grayscale(8, 8, &data).expect("valid buffer");
        let config = BlobConfig {
            area_threshold: 1,
            pixels_threshold: 1,
            ..BlobConfig::default()
        };
        let blobs = find_blobs(&buffer, None, &[ColorThreshold::gray(0, 50)], &config).expect("find blobs");

        assert_eq!(blobs.len(), 1);
        let blob = &blobs[0];
        assert_eq!(blob.rect(), Rect::new(2, 2, 3, 3));
        assert_eq!(blob.pixels(), 9);
        assert!((blob.cx() - 3.5).abs() < 1e-9);
        assert!((blob.cy() - 3.5).abs() < 1e-9);
        assert!(blob.rotation().abs() < 1e-9);
        assert_eq!(blob.code(), 0b1);
        assert_eq!(blob.count(), 1);
    }

    #[test]
    fn empty_thresholds_short_circuit() {
        let data = scenario_image();
        let buffer = PixelBuffer::grayscale(8, 8, &data).expect("valid buffer");
        let blobs = find_blobs(&buffer, None, &[], &BlobConfig::default()).expect("find blobs");
        assert!(blobs.is_empty());
    }

    #[test]
    fn roi_outside_image_short_circuits() {
        let data = scenario_image();
        let buffer = PixelBuffer::grayscale(8, 8, &data).expect("valid buffer");
        let roi = Some(Rect::new(20, 20, 5, 5));
        let blobs = find_blobs(&buffer, roi, &[ColorThreshold::gray(0, 255)], &BlobConfig::default())
            .expect("find blobs");
        assert!(blobs.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = BlobConfig {
            max_regions: 0,
            ..BlobConfig::default()
        };
        let err = BlobPipeline::new(&[ColorThreshold::gray(0, 50)], config).expect_err("invalid");
        assert!(matches!(err, BlobError::InvalidParameter { .. }));
    }

    #[test]
    fn pipeline_applies_its_roi() {
        let data = scenario_image();
        let buffer = PixelBuffer::grayscale(8, 8, &data).expect("valid buffer");
        let config = BlobConfig {
            area_threshold: 0,
            pixels_threshold: 0,
            ..BlobConfig::default()
        };
        let pipeline = BlobPipeline::new(&[ColorThreshold::gray(0, 50)], config)
            .expect("valid pipeline")
            .with_roi(Rect::new(3, 3, 5, 5));
        let blobs = pipeline.process(&buffer).expect("process");
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].rect(), Rect::new(3, 3, 2, 2));
        assert_eq!(blobs[0].pixels(), 4);
    }
}
