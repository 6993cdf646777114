// THEORY:
// The `scratch` module owns every transient allocation one call makes, and
// nothing else allocates while the scan runs.
//
// - `VisitedBitmap`: one bit per ROI pixel. It is the only allocation that scales
//   with the frame, and it scales with `w * h` bits regardless of how many bytes
//   a pixel occupies.
// - the flood-fill work-list: pixel offsets waiting to be expanded. Each pixel is
//   marked visited when it is pushed, so the list never holds more than `w * h`
//   entries.
// - the region list: elementary regions that survived the size filter, capped
//   by `max_regions`.
//
// All three are reserved with `try_reserve*`. On failure the call returns
// `BlobError::OutOfMemory` and the `Scratch` value is dropped, releasing
// whatever had already been acquired. The same drop happens on success when
// the call returns, so the arena's lifetime is exactly the call's lifetime.

use crate::core_modules::region::Region;
use crate::error::{BlobError, Result};
use std::mem::size_of;

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-size bit set indexed by ROI-relative row-major pixel offset.
#[derive(Debug)]
pub struct VisitedBitmap {
    words: Vec<u64>,
    len: usize,
}

impl VisitedBitmap {
    pub fn try_new(len: usize) -> Result<Self> {
        let word_count = len.div_ceil(WORD_BITS);
        let mut words = Vec::new();
        words
            .try_reserve_exact(word_count)
            .map_err(|_| BlobError::out_of_memory("visited bitmap", word_count.saturating_mul(size_of::<u64>())))?;
        words.resize(word_count, 0);
        Ok(Self { words, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    /// Sets the bit and reports whether it was previously clear.
    #[inline]
    pub fn test_and_set(&mut self, index: usize) -> bool {
        let word = &mut self.words[index / WORD_BITS];
        let bit = 1u64 << (index % WORD_BITS);
        let was_clear = *word & bit == 0;
        *word |= bit;
        was_clear
    }
}

/// The per-call scratch arena.
#[derive(Debug)]
pub struct Scratch {
    pub visited: VisitedBitmap,
    pub work_list: Vec<usize>,
    pub regions: Vec<Region>,
    max_regions: usize,
}

impl Scratch {
    /// Acquires the bitmap for `roi_pixels` pixels and room for `max_regions`
    /// regions. The work-list starts empty and grows on demand.
    pub fn try_new(roi_pixels: usize, max_regions: usize) -> Result<Self> {
        let visited = VisitedBitmap::try_new(roi_pixels)?;
        // There can never be more regions than pixels.
        let capacity = max_regions.min(roi_pixels);
        let mut regions = Vec::new();
        regions
            .try_reserve_exact(capacity)
            .map_err(|_| BlobError::out_of_memory("region list", capacity.saturating_mul(size_of::<Region>())))?;
        Ok(Self {
            visited,
            work_list: Vec::new(),
            regions,
            max_regions,
        })
    }

    /// Pushes onto the flood-fill work-list, reserving fallibly when full.
    #[inline]
    pub fn push_work(&mut self, offset: usize) -> Result<()> {
        if self.work_list.len() == self.work_list.capacity() {
            let additional = self.work_list.capacity().max(64);
            self.work_list
                .try_reserve(additional)
                .map_err(|_| BlobError::out_of_memory("flood-fill work-list", additional.saturating_mul(size_of::<usize>())))?;
        }
        self.work_list.push(offset);
        Ok(())
    }

    pub fn regions_full(&self) -> bool {
        self.regions.len() >= self.max_regions
    }

    /// Admits a region, which must fit under the cap.
    pub fn admit(&mut self, region: Region) {
        debug_assert!(!self.regions_full());
        self.regions.push(region);
    }

    /// Hands the region list to the caller, releasing the rest of the arena.
    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_tracks_individual_bits() {
        let mut bitmap = VisitedBitmap::try_new(130).expect("small bitmap");
        assert_eq!(bitmap.len(), 130);
        assert!(!bitmap.get(129));
        bitmap.set(129);
        assert!(bitmap.get(129));
        assert!(!bitmap.get(128));
        assert!(bitmap.test_and_set(64));
        assert!(!bitmap.test_and_set(64));
    }

    #[test]
    fn empty_bitmap_is_legal() {
        let bitmap = VisitedBitmap::try_new(0).expect("empty bitmap");
        assert!(bitmap.is_empty());
    }

    #[test]
    fn impossible_reservation_is_out_of_memory() {
        let err = Scratch::try_new(usize::MAX, 4).expect_err("cannot reserve");
        assert!(matches!(err, BlobError::OutOfMemory { what: "visited bitmap", .. }));
    }

    #[test]
    fn work_list_grows_on_demand() {
        let mut scratch = Scratch::try_new(16, 4).expect("scratch");
        for offset in 0..200 {
            scratch.push_work(offset).expect("push");
        }
        assert_eq!(scratch.work_list.len(), 200);
    }
}
