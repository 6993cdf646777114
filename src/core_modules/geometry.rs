// THEORY:
// The `geometry` module holds the two value types shared by every layer of the
// engine and by the wider vision toolkit: the axis-aligned `Rect` and the
// sub-pixel `Point`.
//
// Key architectural principles:
// 1.  **Plain Values**: Both types are `Copy` and compared by value. They carry
//     no identity and no ownership of pixels.
// 2.  **Signed Coordinates**: A caller-supplied ROI may hang off the image edge
//     (or be fully outside it), and a margin-grown rectangle may extend past
//     the ROI before it is clipped. Signed `i32` coordinates make both cases
//     ordinary arithmetic instead of special cases.
// 3.  **Empty Is Legal**: A rectangle with `w <= 0` or `h <= 0` is empty. An
//     empty intersection is how the engine detects a degenerate ROI and how the
//     merger decides two regions are not neighbors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle in image pixel coordinates.
///
/// `(x, y)` is the top-left pixel; the rectangle covers columns `x..x + w`
/// and rows `y..y + h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Builds the smallest rectangle containing both inclusive corners.
    pub fn from_corners(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        }
    }

    /// One past the right-most column.
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// One past the bottom-most row.
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Pixel area, zero for empty rectangles.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.w as u64 * self.h as u64
        }
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns `true` when `other` lies completely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The overlapping part of two rectangles, or `None` when they do not share
    /// a single pixel.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Rect::new(x, y, right - x, bottom - y);
        (!rect.is_empty()).then_some(rect)
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// The bounding rectangle of both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Expands the rectangle by `margin` pixels on every side.
    pub fn grow(&self, margin: u32) -> Rect {
        let m = margin.min(i32::MAX as u32 / 4) as i32;
        Rect::new(
            self.x.saturating_sub(m),
            self.y.saturating_sub(m),
            self.w.saturating_add(m.saturating_mul(2)),
            self.h.saturating_add(m.saturating_mul(2)),
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.w, self.h)
    }
}

/// A sub-pixel location, used for centroids.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0, 0, 3, 3);
        let b = Rect::new(3, 0, 3, 3);
        assert_eq!(a.intersection(&b), None);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn intersection_clips_to_shared_area() {
        let image = Rect::new(0, 0, 8, 8);
        let roi = Rect::new(-2, 5, 6, 10);
        assert_eq!(roi.intersection(&image), Some(Rect::new(0, 5, 4, 3)));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(1, 1, 2, 2);
        let b = Rect::new(5, 0, 1, 4);
        assert_eq!(a.union(&b), Rect::new(1, 0, 5, 4));
        assert_eq!(a.union(&Rect::default()), a);
    }

    #[test]
    fn grow_expands_every_side() {
        let r = Rect::new(4, 4, 2, 3).grow(2);
        assert_eq!(r, Rect::new(2, 2, 6, 7));
        assert_eq!(Rect::new(4, 4, 2, 3).grow(0), Rect::new(4, 4, 2, 3));
    }

    #[test]
    fn from_corners_is_inclusive() {
        let r = Rect::from_corners(2, 2, 4, 4);
        assert_eq!(r, Rect::new(2, 2, 3, 3));
        assert_eq!(r.area(), 9);
        assert!(r.contains_point(4, 4));
        assert!(!r.contains_point(5, 4));
    }

    #[test]
    fn empty_rect_has_no_area() {
        assert!(Rect::new(0, 0, 0, 5).is_empty());
        assert_eq!(Rect::new(0, 0, -1, 5).area(), 0);
    }
}
