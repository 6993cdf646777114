// THEORY:
// The `color_space` module is the conversion contract between native pixel
// values and the space in which color thresholds are compared. The engine does
// not own a color formula: it owns the *ranges* a converter must honor, and it
// asks a `ColorConverter` for the values.
//
// Documented ranges:
// - grayscale L: 0..=255 (the raw byte, by default);
// - LAB L: 0..=100, LAB A and B: -128..=127 (CIE L*a*b*, rounded to integers).
//
// The default converter, `PaletteLab`, uses the `palette` crate's sRGB to
// L*a*b* (D65) conversion. Doing that per pixel would be far too slow for a
// frame loop, so the full RGB565 domain (65 536 values) is converted once per
// process into a `OnceLock` lookup table. The hot path is a single indexed load.

use crate::core_modules::pixel_buffer::unpack_rgb565;
use palette::{FromColor, IntoColor, Lab, Srgb};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const GRAYSCALE_MIN: i32 = 0;
pub const GRAYSCALE_MAX: i32 = 255;
pub const LAB_L_MIN: i32 = 0;
pub const LAB_L_MAX: i32 = 100;
pub const LAB_A_MIN: i32 = -128;
pub const LAB_A_MAX: i32 = 127;
pub const LAB_B_MIN: i32 = -128;
pub const LAB_B_MAX: i32 = 127;

/// An integer CIE L*a*b* triple in the documented ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Lab8 {
    pub l: u8,
    pub a: i8,
    pub b: i8,
}

/// Converts native pixel values into the threshold comparison space.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait ColorConverter: Send + Sync {
    /// Grayscale pixel to luminance in `0..=255`.
    fn gray_to_l(&self, value: u8) -> u8 {
        value
    }

    /// RGB565 pixel to L*a*b* in the documented ranges.
    fn rgb565_to_lab(&self, pixel: u16) -> Lab8;
}

/// Default converter backed by a process-wide lookup table built with `palette`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteLab;

static RGB565_TO_LAB_LUT: OnceLock<Box<[Lab8]>> = OnceLock::new();

impl PaletteLab {
    fn table() -> &'static [Lab8] {
        RGB565_TO_LAB_LUT.get_or_init(|| {
            (0..=u16::MAX)
                .map(|pixel| {
                    let (r, g, b) = unpack_rgb565(pixel);
                    rgb_to_lab(r, g, b)
                })
                .collect::<Vec<_>>()
                .into_boxed_slice()
        })
    }
}

impl ColorConverter for PaletteLab {
    fn rgb565_to_lab(&self, pixel: u16) -> Lab8 {
        Self::table()[pixel as usize]
    }
}

/// Converts 8-bit sRGB to integer L*a*b* (D65).
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab8 {
    let srgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let lab: Lab = Lab::from_color(srgb);
    Lab8 {
        l: lab.l.round().clamp(LAB_L_MIN as f32, LAB_L_MAX as f32) as u8,
        a: lab.a.round().clamp(LAB_A_MIN as f32, LAB_A_MAX as f32) as i8,
        b: lab.b.round().clamp(LAB_B_MIN as f32, LAB_B_MAX as f32) as i8,
    }
}

/// Converts integer L*a*b* (D65) back to 8-bit sRGB, clamped to the gamut.
pub fn lab_to_rgb(lab: Lab8) -> (u8, u8, u8) {
    let lab: Lab = Lab::new(lab.l as f32, lab.a as f32, lab.b as f32);
    let srgb: Srgb = lab.into_color();
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    (to_byte(srgb.red), to_byte(srgb.green), to_byte(srgb.blue))
}
