// THEORY:
// The `ColorClassifier` answers one question per pixel: which thresholds does
// this pixel satisfy? The answer is the pixel's *candidate mask*, the OR of the
// code bits of every matching threshold. A pixel with a non-zero mask is
// eligible to grow a region.
//
// Key architectural principles:
// 1.  **Pure Function**: The mask depends only on the pixel value, the threshold
//     set and the `invert` flag. The classifier holds borrowed references and
//     never mutates anything.
// 2.  **Invert Is Per Threshold**: `invert` flips each threshold's verdict before
//     the OR, so with `invert` a pixel is a candidate for every threshold it
//     falls *outside* of.
// 3.  **Grayscale Table**: A grayscale pixel has only 256 possible values, so the
//     full mask table is computed once per call and the scan does one load per
//     pixel. Color pixels go through the converter's L*a*b* table and are tested
//     against each threshold.

use crate::core_modules::color_space::ColorConverter;
use crate::core_modules::color_threshold::ThresholdSet;
use crate::core_modules::pixel_buffer::{PixelBuffer, PixelData};

enum Lookup<'a> {
    Grayscale {
        data: &'a [u8],
        masks: Box<[u32; 256]>,
    },
    Rgb565 {
        data: &'a [u16],
        thresholds: &'a ThresholdSet,
        converter: &'a dyn ColorConverter,
        invert: bool,
    },
}

/// Classifies pixels of one frame against one threshold set.
pub struct ColorClassifier<'a> {
    lookup: Lookup<'a>,
}

impl<'a> ColorClassifier<'a> {
    pub fn new(
        buffer: &PixelBuffer<'a>,
        thresholds: &'a ThresholdSet,
        invert: bool,
        converter: &'a dyn ColorConverter,
    ) -> Self {
        let lookup = match buffer.data() {
            PixelData::Grayscale(data) => {
                let mut masks = Box::new([0u32; 256]);
                for (value, mask) in masks.iter_mut().enumerate() {
                    let l = converter.gray_to_l(value as u8);
                    *mask = thresholds
                        .iter()
                        .filter(|(_, threshold)| threshold.matches_gray(l) != invert)
                        .fold(0, |acc, (bit, _)| acc | bit);
                }
                Lookup::Grayscale { data, masks }
            }
            PixelData::Rgb565(data) => Lookup::Rgb565 {
                data,
                thresholds,
                converter,
                invert,
            },
        };
        Self { lookup }
    }

    /// The candidate mask of the pixel at row-major index `index`.
    #[inline]
    pub fn candidate_mask(&self, index: usize) -> u32 {
        match &self.lookup {
            Lookup::Grayscale { data, masks } => masks[data[index] as usize],
            Lookup::Rgb565 {
                data,
                thresholds,
                converter,
                invert,
            } => {
                let lab = converter.rgb565_to_lab(data[index]);
                thresholds
                    .iter()
                    .filter(|(_, threshold)| threshold.matches_lab(lab) != *invert)
                    .fold(0, |acc, (bit, _)| acc | bit)
            }
        }
    }

    /// `true` when the pixel may take part in region growth.
    #[inline]
    pub fn is_eligible(&self, index: usize) -> bool {
        self.candidate_mask(index) != 0
    }
}
