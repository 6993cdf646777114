// THEORY:
// The `RegionMerger` joins elementary regions that sit close to each other into
// combined blobs, regardless of which color thresholds produced them. It runs
// only when merging is enabled.
//
// Key architectural principles & algorithm steps:
// 1.  **Grown Rectangles**: Each region is represented, for adjacency purposes,
//     by its bounding box grown by `margin` pixels on every side and clipped to
//     the ROI. Two regions are neighbors when their grown rectangles share at
//     least one pixel.
// 2.  **Union Keeps The Original Boxes**: A merged region's bounding box is the
//     union of the two *unexpanded* boxes. Pixel counts, moment sums, codes and
//     merge counts are summed (codes OR'd). The grown rectangle is then rebuilt
//     from the new box before any further test.
// 3.  **Discovery Order**: When two regions merge, the earlier one keeps its slot
//     and the later one is consumed, so the output follows the order in which
//     the scan first met each blob.
// 4.  **Fixed Point**: A merge enlarges a rectangle, which can make it reach a
//     region that was already tested. Pairwise passes repeat until a full pass
//     merges nothing. Each merge removes one region, so there are at most
//     `n - 1` merges and the loop always terminates.
// 5.  **Order-Independent Math**: The moment sums are exact integers, so the
//     final statistics of a merged blob do not depend on the order in which its
//     parts were joined.

use crate::core_modules::geometry::Rect;
use crate::core_modules::region::Region;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// Full pairwise passes made, including the final pass that merged nothing.
    pub rounds: usize,
    /// Number of unions performed.
    pub merges: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionMerger {
    margin: u32,
    roi: Rect,
}

impl RegionMerger {
    pub fn new(margin: u32, roi: Rect) -> Self {
        Self { margin, roi }
    }

    fn grown(&self, region: &Region) -> Rect {
        region
            .rect()
            .grow(self.margin)
            .intersection(&self.roi)
            .unwrap_or_default()
    }

    /// Merges `regions` to a fixed point, preserving discovery order.
    pub fn merge(&self, mut regions: Vec<Region>) -> (Vec<Region>, MergeSummary) {
        let mut grown: Vec<Rect> = regions.iter().map(|r| self.grown(r)).collect();
        let mut summary = MergeSummary::default();

        loop {
            summary.rounds += 1;
            let mut merged_this_round = false;

            let mut i = 0;
            while i < regions.len() {
                let mut j = i + 1;
                while j < regions.len() {
                    if !grown[i].overlaps(&grown[j]) {
                        j += 1;
                        continue;
                    }

                    let absorbed = regions.remove(j);
                    grown.remove(j);
                    trace!(into = %regions[i].rect(), from = %absorbed.rect(), "Merging regions");
                    regions[i].absorb(absorbed);
                    grown[i] = self.grown(&regions[i]);

                    summary.merges += 1;
                    merged_this_round = true;
                    // The enlarged region must be re-tested against everything after it.
                    j = i + 1;
                }
                i += 1;
            }

            if !merged_this_round {
                return (regions, summary);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x0: i32, y0: i32, w: i32, h: i32, mask: u32) -> Region {
        let mut region = Region::seed(x0, y0, mask);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                if (x, y) != (x0, y0) {
                    region.add_pixel(x, y, mask);
                }
            }
        }
        region
    }

    const ROI: Rect = Rect::new(0, 0, 100, 100);

    #[test]
    fn zero_margin_keeps_separate_regions() {
        let regions = vec![block(0, 0, 3, 3, 0b01), block(4, 0, 3, 3, 0b10)];
        let (merged, summary) = RegionMerger::new(0, ROI).merge(regions);
        assert_eq!(merged.len(), 2);
        assert_eq!(summary.merges, 0);
        assert_eq!(summary.rounds, 1);
    }

    #[test]
    fn margin_bridges_the_gap() {
        let regions = vec![block(0, 0, 3, 3, 0b01), block(4, 0, 3, 3, 0b10)];
        let (merged, _) = RegionMerger::new(1, ROI).merge(regions);
        assert_eq!(merged.len(), 1);

        let blob = &merged[0];
        assert_eq!(blob.rect(), Rect::new(0, 0, 7, 3));
        assert_eq!(blob.pixels(), 18);
        assert_eq!(blob.code(), 0b11);
        assert_eq!(blob.count(), 2);
    }

    #[test]
    fn later_region_is_absorbed_into_earlier_slot() {
        let regions = vec![
            block(50, 50, 2, 2, 0b001),
            block(0, 0, 2, 2, 0b010),
            block(53, 50, 2, 2, 0b100),
        ];
        let (merged, _) = RegionMerger::new(1, ROI).merge(regions);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].code(), 0b101);
        assert_eq!(merged[1].code(), 0b010);
    }

    #[test]
    fn growth_from_a_merge_reaches_earlier_regions() {
        // Region 0 touches neither later region alone, only their union, which
        // is formed after region 0 has already been tested in the first pass.
        let regions = vec![
            block(10, 0, 1, 1, 0b001),
            block(0, 3, 12, 1, 0b010),
            block(13, 2, 5, 1, 0b100),
        ];
        let (merged, summary) = RegionMerger::new(1, ROI).merge(regions);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].count(), 3);
        assert_eq!(merged[0].code(), 0b111);
        assert_eq!(merged[0].rect(), Rect::new(0, 0, 18, 4));
        assert_eq!(summary.merges, 2);
        assert_eq!(summary.rounds, 3);
    }

    #[test]
    fn merge_is_idempotent() {
        let regions = vec![
            block(0, 0, 3, 3, 1),
            block(5, 0, 3, 3, 2),
            block(40, 40, 3, 3, 4),
            block(44, 44, 2, 2, 8),
        ];
        let merger = RegionMerger::new(2, ROI);
        let (once, _) = merger.merge(regions);
        let (twice, summary) = merger.merge(once.clone());
        assert_eq!(once, twice);
        assert_eq!(summary.merges, 0);
    }

    #[test]
    fn merge_result_does_not_depend_on_input_order() {
        let a = block(0, 0, 3, 3, 1);
        let b = block(4, 1, 2, 5, 2);
        let c = block(7, 3, 3, 1, 4);
        let merger = RegionMerger::new(1, ROI);

        let (abc, _) = merger.merge(vec![a.clone(), b.clone(), c.clone()]);
        let (cba, _) = merger.merge(vec![c, b, a]);
        assert_eq!(abc.len(), 1);
        assert_eq!(cba.len(), 1);
        assert_eq!(abc[0].moments(), cba[0].moments());
        assert_eq!(abc[0].rect(), cba[0].rect());
        assert_eq!(abc[0].rotation(), cba[0].rotation());
    }

    #[test]
    fn grown_rectangles_are_clipped_to_the_roi() {
        let roi = Rect::new(10, 10, 20, 20);
        let merger = RegionMerger::new(5, roi);
        assert_eq!(merger.grown(&block(10, 10, 2, 2, 1)), Rect::new(10, 10, 7, 7));
    }
}
