// THEORY:
// A `Region` is the mutable accumulator behind every blob. It is born when the
// extractor finds an unvisited eligible pixel, grows one pixel at a time, may be
// absorbed into another region by the merger, and is finally frozen into a
// `Blob`.
//
// Key architectural principles:
// 1.  **Moments, Not Members**: A region never stores which pixels belong to it.
//     It keeps the bounding corners, the pixel count and the raw moment sums
//     `Sx, Sy, Sxx, Syy, Sxy`. Everything the blob reports is derived from these.
// 2.  **Exact Integer Sums**: The sums are `u64`. Coordinates are non-negative
//     image positions, so the sums are exact and adding two regions' sums is
//     associative and commutative: the order of merges cannot change the result.
//     Floating point only appears when the final statistics are derived.
// 3.  **Centered Second Moments**: Orientation is computed from the central
//     moments `mu_xx = Sxx/n - cx^2` etc. They are formed in `f64` from the exact
//     sums, which keeps the subtraction well conditioned for frame-sized inputs.

use crate::core_modules::blob::Blob;
use crate::core_modules::geometry::{Point, Rect};

/// Raw coordinate moments of a set of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Moments {
    pub sx: u64,
    pub sy: u64,
    pub sxx: u64,
    pub syy: u64,
    pub sxy: u64,
}

impl Moments {
    #[inline]
    fn add_pixel(&mut self, x: u64, y: u64) {
        self.sx += x;
        self.sy += y;
        self.sxx += x * x;
        self.syy += y * y;
        self.sxy += x * y;
    }

    fn add(&mut self, other: &Moments) {
        self.sx += other.sx;
        self.sy += other.sy;
        self.sxx += other.sxx;
        self.syy += other.syy;
        self.sxy += other.sxy;
    }
}

/// An in-progress connected region.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    pixels: u64,
    moments: Moments,
    code: u32,
    count: u32,
}

impl Region {
    /// Starts a region at its seed pixel.
    pub fn seed(x: i32, y: i32, mask: u32) -> Self {
        let mut region = Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixels: 0,
            moments: Moments::default(),
            code: 0,
            count: 1,
        };
        region.add_pixel(x, y, mask);
        region
    }

    /// Adds one pixel with its candidate mask.
    #[inline]
    pub fn add_pixel(&mut self, x: i32, y: i32, mask: u32) {
        debug_assert!(x >= 0 && y >= 0);
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixels += 1;
        self.moments.add_pixel(x as u64, y as u64);
        self.code |= mask;
    }

    /// Takes over `other`'s pixels. `other` is consumed: its sums move here.
    pub fn absorb(&mut self, other: Region) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        self.pixels += other.pixels;
        self.moments.add(&other.moments);
        self.code |= other.code;
        self.count += other.count;
    }

    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn pixels(&self) -> u64 {
        self.pixels
    }

    pub fn moments(&self) -> &Moments {
        &self.moments
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Mean pixel index, i.e. `(Sx / n, Sy / n)`.
    fn mean(&self) -> Point {
        let n = self.pixels as f64;
        Point::new(self.moments.sx as f64 / n, self.moments.sy as f64 / n)
    }

    /// Center of mass in pixel-center coordinates: pixel `x` covers `x..x + 1`,
    /// so a 3x3 block starting at `(2, 2)` is centered on `(3.5, 3.5)`.
    pub fn centroid(&self) -> Point {
        let mean = self.mean();
        Point::new(mean.x + 0.5, mean.y + 0.5)
    }

    /// Principal-axis angle of the second moments, in `(-pi/2, pi/2]`.
    pub fn rotation(&self) -> f64 {
        let n = self.pixels as f64;
        let c = self.mean();
        let mu_xx = self.moments.sxx as f64 / n - c.x * c.x;
        let mu_yy = self.moments.syy as f64 / n - c.y * c.y;
        let mu_xy = self.moments.sxy as f64 / n - c.x * c.y;
        0.5 * (2.0 * mu_xy).atan2(mu_xx - mu_yy)
    }

    /// Freezes the region into its output record.
    pub fn into_blob(self) -> Blob {
        Blob::new(
            self.rect(),
            self.pixels,
            self.centroid(),
            self.rotation(),
            self.code,
            self.count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn square(x0: i32, y0: i32, side: i32, mask: u32) -> Region {
        let mut region = Region::seed(x0, y0, mask);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                if (x, y) != (x0, y0) {
                    region.add_pixel(x, y, mask);
                }
            }
        }
        region
    }

    #[test]
    fn square_statistics() {
        let region = square(2, 2, 3, 0b1);
        assert_eq!(region.rect(), Rect::new(2, 2, 3, 3));
        assert_eq!(region.pixels(), 9);
        assert_eq!(region.centroid(), Point::new(3.5, 3.5));
        assert!(region.rotation().abs() < 1e-12);
    }

    #[test]
    fn horizontal_bar_has_zero_rotation() {
        let mut region = Region::seed(0, 5, 1);
        for x in 1..10 {
            region.add_pixel(x, 5, 1);
        }
        assert!(region.rotation().abs() < 1e-12);
    }

    #[test]
    fn vertical_bar_has_half_pi_rotation() {
        let mut region = Region::seed(5, 0, 1);
        for y in 1..10 {
            region.add_pixel(5, y, 1);
        }
        assert!((region.rotation() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn diagonal_has_quarter_pi_rotation() {
        let mut region = Region::seed(0, 0, 1);
        for i in 1..10 {
            region.add_pixel(i, i, 1);
        }
        assert!((region.rotation() - FRAC_PI_4).abs() < 1e-12);

        let mut anti = Region::seed(0, 9, 1);
        for i in 1..10 {
            anti.add_pixel(i, 9 - i, 1);
        }
        assert!((anti.rotation() + FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn absorb_is_order_independent() {
        let a = square(0, 0, 2, 0b01);
        let b = square(10, 4, 3, 0b10);

        let mut ab = a.clone();
        ab.absorb(b.clone());
        let mut ba = b;
        ba.absorb(a);

        assert_eq!(ab.rect(), ba.rect());
        assert_eq!(ab.pixels(), 13);
        assert_eq!(ab.moments(), ba.moments());
        assert_eq!(ab.code(), 0b11);
        assert_eq!(ab.count(), 2);
        assert_eq!(ab.rotation(), ba.rotation());
    }
}
