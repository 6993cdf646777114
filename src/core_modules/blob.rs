// THEORY:
// The `Blob` is the final output of the engine: an immutable summary of one
// connected (and possibly merged) region of matching pixels.
//
// Key architectural principles:
// 1.  **Closed Value Record**: A blob has a fixed set of fields, read through
//     named accessors. It is compared by value and carries no identity.
// 2.  **Derived, Not Stored**: `area` and `density` are computed from the stored
//     fields on demand.
// 3.  **Caller Owned**: Once returned, the blob list belongs to the caller. The
//     engine keeps no reference to it and reuses nothing from it.

use crate::core_modules::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable descriptor of a detected region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    /// Bounding rectangle of every contributing pixel, in image coordinates.
    rect: Rect,
    /// Number of contributing pixels.
    pixels: u64,
    /// Center of mass, in pixel-center coordinates.
    centroid: Point,
    /// Principal-axis angle in radians, in `(-pi/2, pi/2]`.
    rotation: f64,
    /// Bit `i` is set when threshold `i` matched at least one pixel.
    code: u32,
    /// Number of elementary regions merged into this blob.
    count: u32,
}

impl Blob {
    pub(crate) fn new(
        rect: Rect,
        pixels: u64,
        centroid: Point,
        rotation: f64,
        code: u32,
        count: u32,
    ) -> Self {
        Self {
            rect,
            pixels,
            centroid,
            rotation,
            code,
            count,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn x(&self) -> i32 {
        self.rect.x
    }

    pub fn y(&self) -> i32 {
        self.rect.y
    }

    pub fn w(&self) -> i32 {
        self.rect.w
    }

    pub fn h(&self) -> i32 {
        self.rect.h
    }

    pub fn pixels(&self) -> u64 {
        self.pixels
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn cx(&self) -> f64 {
        self.centroid.x
    }

    pub fn cy(&self) -> f64 {
        self.centroid.y
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Bounding-box area, `w * h`.
    pub fn area(&self) -> u64 {
        self.rect.area()
    }

    /// Fraction of the bounding box covered by contributing pixels.
    pub fn density(&self) -> f64 {
        match self.area() {
            0 => 0.0,
            area => self.pixels as f64 / area as f64,
        }
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{x:{}, y:{}, w:{}, h:{}, pixels:{}, cx:{:.2}, cy:{:.2}, rotation:{:.6}, code:{}, count:{}}}",
            self.rect.x,
            self.rect.y,
            self.rect.w,
            self.rect.h,
            self.pixels,
            self.centroid.x,
            self.centroid.y,
            self.rotation,
            self.code,
            self.count
        )
    }
}
