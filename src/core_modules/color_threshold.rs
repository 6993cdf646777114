// THEORY:
// A `ColorThreshold` is one named color-range test. Each threshold contributes
// exactly one bit to a region's `code`: the threshold at position `i` of the
// caller's list owns bit `1 << i`.
//
// Key architectural principles:
// 1.  **Normalize, Never Reject**: Caller bounds are clamped to the legal domain
//     of their channel and then swapped so that `min <= max`. A threshold is
//     always constructible; there is no error path.
// 2.  **One Domain For L**: The same threshold list may be applied to grayscale
//     and color frames, so L is clamped to the union of both domains (0..=255).
//     A and B only matter for color frames and are clamped to -128..=127.
// 3.  **Positional Identity**: A threshold knows nothing about its index. The
//     `ThresholdSet` assigns bits by position when the list is built, which is
//     also where the 32-bit code width is enforced.

use crate::core_modules::color_space::{
    GRAYSCALE_MAX, GRAYSCALE_MIN, LAB_A_MAX, LAB_A_MIN, LAB_B_MAX, LAB_B_MIN, LAB_L_MIN, Lab8,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The number of thresholds a single call can distinguish (bits in a code).
pub const MAX_THRESHOLDS: usize = u32::BITS as usize;

const L_MIN: i32 = if GRAYSCALE_MIN < LAB_L_MIN { GRAYSCALE_MIN } else { LAB_L_MIN };
const L_MAX: i32 = GRAYSCALE_MAX;

/// An inclusive, normalized channel range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRange {
    pub min: i32,
    pub max: i32,
}

impl ChannelRange {
    /// Clamps both bounds into `domain_min..=domain_max`, then orders them.
    fn normalized(lo: i32, hi: i32, domain_min: i32, domain_max: i32) -> Self {
        let lo = lo.clamp(domain_min, domain_max);
        let hi = hi.clamp(domain_min, domain_max);
        Self {
            min: lo.min(hi),
            max: lo.max(hi),
        }
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A single color-range test, in grayscale (L only) or LAB (L, A, B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorThreshold {
    pub l: ChannelRange,
    pub a: ChannelRange,
    pub b: ChannelRange,
}

impl ColorThreshold {
    /// A luminance-only threshold. A and B are left at `0..=0`.
    pub fn gray(l_lo: i32, l_hi: i32) -> Self {
        Self::lab(l_lo, l_hi, 0, 0, 0, 0)
    }

    /// A full LAB threshold.
    pub fn lab(l_lo: i32, l_hi: i32, a_lo: i32, a_hi: i32, b_lo: i32, b_hi: i32) -> Self {
        Self {
            l: ChannelRange::normalized(l_lo, l_hi, L_MIN, L_MAX),
            a: ChannelRange::normalized(a_lo, a_hi, LAB_A_MIN, LAB_A_MAX),
            b: ChannelRange::normalized(b_lo, b_hi, LAB_B_MIN, LAB_B_MAX),
        }
    }

    /// Builds a threshold from a loose value tuple `[Lmin, Lmax, Amin, Amax, Bmin, Bmax]`.
    ///
    /// Missing trailing values default to 0 and values past the sixth are
    /// ignored. An empty tuple describes no threshold and yields `None`.
    pub fn from_values(values: &[i32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let at = |i: usize| values.get(i).copied().unwrap_or(0);
        Some(Self::lab(at(0), at(1), at(2), at(3), at(4), at(5)))
    }

    pub fn matches_gray(&self, l: u8) -> bool {
        self.l.contains(l as i32)
    }

    pub fn matches_lab(&self, lab: Lab8) -> bool {
        self.l.contains(lab.l as i32) && self.a.contains(lab.a as i32) && self.b.contains(lab.b as i32)
    }
}

/// The ordered list of thresholds for one call, each bound to its code bit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSet {
    thresholds: Vec<ColorThreshold>,
}

impl ThresholdSet {
    /// Takes the caller's thresholds in order. Anything past the 32nd cannot
    /// be represented in a code and is dropped.
    pub fn new(thresholds: &[ColorThreshold]) -> Self {
        if thresholds.len() > MAX_THRESHOLDS {
            warn!(
                given = thresholds.len(),
                kept = MAX_THRESHOLDS,
                "Too many color thresholds; extra thresholds are ignored"
            );
        }
        Self {
            thresholds: thresholds.iter().take(MAX_THRESHOLDS).copied().collect(),
        }
    }

    /// Parses loose value tuples, skipping empty ones.
    pub fn from_values<V: AsRef<[i32]>>(values: &[V]) -> Self {
        let thresholds: Vec<ColorThreshold> = values
            .iter()
            .filter_map(|v| ColorThreshold::from_values(v.as_ref()))
            .collect();
        Self::new(&thresholds)
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Iterates `(bit, threshold)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ColorThreshold)> {
        self.thresholds
            .iter()
            .enumerate()
            .map(|(i, threshold)| (1u32 << i, threshold))
    }
}
