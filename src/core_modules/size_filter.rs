// THEORY:
// The `SizeFilter` is the cheap early rejection stage between the extractor and
// the merger. It runs on each elementary region the moment it is fully grown, so
// noise specks never reach the merger's pairwise loop and never occupy a slot
// under the region cap.
//
// A region passes when its bounding-box area is at least `min_area` *and* its
// pixel count is at least `min_pixels`. The same filter type is reused, with
// its own thresholds, for the optional post-merge pass.

use crate::core_modules::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeFilter {
    pub min_area: u64,
    pub min_pixels: u64,
}

impl SizeFilter {
    pub fn new(min_area: u32, min_pixels: u32) -> Self {
        Self {
            min_area: min_area as u64,
            min_pixels: min_pixels as u64,
        }
    }

    pub fn admits(&self, region: &Region) -> bool {
        region.rect().area() >= self.min_area && region.pixels() >= self.min_pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(len: i32) -> Region {
        let mut region = Region::seed(0, 0, 1);
        for x in 1..len {
            region.add_pixel(x, 0, 1);
        }
        region
    }

    #[test]
    fn rejects_below_either_threshold() {
        let region = line(5);
        assert!(SizeFilter::new(5, 5).admits(&region));
        assert!(!SizeFilter::new(6, 1).admits(&region));
        assert!(!SizeFilter::new(1, 6).admits(&region));
    }

    #[test]
    fn sparse_region_fails_on_pixels_not_area() {
        let mut region = Region::seed(0, 0, 1);
        region.add_pixel(9, 9, 1);
        let filter = SizeFilter::new(10, 10);
        assert_eq!(region.rect().area(), 100);
        assert!(!filter.admits(&region));
    }

    #[test]
    fn zero_thresholds_admit_everything() {
        assert!(SizeFilter::default().admits(&Region::seed(3, 3, 1)));
    }
}
