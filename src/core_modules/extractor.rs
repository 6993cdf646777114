// THEORY:
// The `ComponentExtractor` is the engine of the segmentation layer. It walks the
// ROI once in raster order and grows every connected component of eligible
// pixels into an elementary `Region`.
//
// Key architectural principles & algorithm steps:
// 1.  **Raster Scan**: Rows top to bottom, columns left to right. The first
//     unvisited eligible pixel met by the scan seeds a new region, which fixes
//     the discovery order that the rest of the engine preserves.
// 2.  **Iterative Growth**: Growth uses an explicit work-list from the scratch
//     arena, never recursion, so stack use is constant however large a
//     component is.
// 3.  **Decided Bitmap**: A pixel's bit in the visited bitmap is set the first
//     time the pixel is classified, whether it matched or not. Every pixel in
//     the ROI is therefore classified exactly once.
// 4.  **Any Threshold Grows**: Growth follows "candidate mask non-zero", not one
//     particular threshold. Touching pixels matching different thresholds join
//     the same region, whose `code` is the OR of all their masks.
// 5.  **Accumulate On Push**: A pixel's coordinates are folded into the region's
//     bounding box and moments when it is pushed, which is the one moment its
//     mask is known. No per-pixel membership list is ever built.
// 6.  **Early Filtering And Cap**: Each grown region goes straight through the
//     `SizeFilter`. Survivors take a slot under `max_regions`; once the cap is
//     full the scan stops admitting regions, bounding the merger's cost on
//     pathologically fragmented frames.

use crate::core_modules::classifier::ColorClassifier;
use crate::core_modules::geometry::Rect;
use crate::core_modules::region::Region;
use crate::core_modules::scratch::Scratch;
use crate::core_modules::size_filter::SizeFilter;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Which neighbors count as touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Left, right, up and down.
    #[default]
    Four,
    /// The four direct neighbors plus the diagonals.
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(1, 0), (-1, 0), (0, 1), (0, -1)],
            Connectivity::Eight => &[
                (1, 0),
                (-1, 0),
                (0, 1),
                (0, -1),
                (1, 1),
                (-1, 1),
                (1, -1),
                (-1, -1),
            ],
        }
    }
}

/// What one scan did, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionSummary {
    /// Elementary regions grown, whether kept or not.
    pub grown: usize,
    /// Regions dropped by the size filter.
    pub rejected: usize,
    /// `true` when the region cap stopped the scan early.
    pub truncated: bool,
}

pub struct ComponentExtractor<'c, 'a> {
    classifier: &'c ColorClassifier<'a>,
    image_width: usize,
    roi: Rect,
    connectivity: Connectivity,
    filter: SizeFilter,
}

impl<'c, 'a> ComponentExtractor<'c, 'a> {
    /// `roi` must already be clipped to the image and non-empty.
    pub fn new(
        classifier: &'c ColorClassifier<'a>,
        image_width: u32,
        roi: Rect,
        connectivity: Connectivity,
        filter: SizeFilter,
    ) -> Self {
        debug_assert!(!roi.is_empty());
        Self {
            classifier,
            image_width: image_width as usize,
            roi,
            connectivity,
            filter,
        }
    }

    #[inline]
    fn image_index(&self, rx: usize, ry: usize) -> usize {
        (self.roi.y as usize + ry) * self.image_width + self.roi.x as usize + rx
    }

    /// Scans the ROI, leaving the surviving regions in `scratch.regions` in
    /// discovery order.
    pub fn extract(&self, scratch: &mut Scratch) -> Result<ExtractionSummary> {
        let roi_w = self.roi.w as usize;
        let roi_h = self.roi.h as usize;
        let mut summary = ExtractionSummary::default();

        for ry in 0..roi_h {
            for rx in 0..roi_w {
                let offset = ry * roi_w + rx;
                if !scratch.visited.test_and_set(offset) {
                    continue;
                }
                let mask = self.classifier.candidate_mask(self.image_index(rx, ry));
                if mask == 0 {
                    continue;
                }

                let region = self.grow(scratch, rx, ry, mask)?;
                summary.grown += 1;

                if !self.filter.admits(&region) {
                    trace!(rect = %region.rect(), pixels = region.pixels(), "Region rejected by size filter");
                    summary.rejected += 1;
                    continue;
                }

                trace!(rect = %region.rect(), pixels = region.pixels(), code = region.code(), "Region admitted");
                scratch.admit(region);

                if scratch.regions_full() {
                    warn!(
                        max_regions = scratch.regions.len(),
                        "Region cap reached; remaining pixels are not scanned"
                    );
                    summary.truncated = true;
                    return Ok(summary);
                }
            }
        }

        Ok(summary)
    }

    /// Flood-fills the component seeded at ROI-relative `(rx, ry)`, whose
    /// visited bit is already set.
    fn grow(&self, scratch: &mut Scratch, rx: usize, ry: usize, mask: u32) -> Result<Region> {
        let roi_w = self.roi.w as usize;
        let roi_h = self.roi.h as usize;
        let to_image = |rx: usize, ry: usize| (self.roi.x + rx as i32, self.roi.y + ry as i32);

        let (x, y) = to_image(rx, ry);
        let mut region = Region::seed(x, y, mask);

        scratch.work_list.clear();
        scratch.push_work(ry * roi_w + rx)?;

        while let Some(offset) = scratch.work_list.pop() {
            let (cx, cy) = (offset % roi_w, offset / roi_w);

            for &(dx, dy) in self.connectivity.offsets() {
                let (Some(nx), Some(ny)) = (cx.checked_add_signed(dx), cy.checked_add_signed(dy)) else {
                    continue;
                };
                if nx >= roi_w || ny >= roi_h {
                    continue;
                }

                let neighbor = ny * roi_w + nx;
                if !scratch.visited.test_and_set(neighbor) {
                    continue;
                }
                let neighbor_mask = self.classifier.candidate_mask(self.image_index(nx, ny));
                if neighbor_mask == 0 {
                    continue;
                }

                let (x, y) = to_image(nx, ny);
                region.add_pixel(x, y, neighbor_mask);
                scratch.push_work(neighbor)?;
            }
        }

        Ok(region)
    }
}
