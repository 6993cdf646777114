// THEORY:
// The `PixelBuffer` is the engine's only view of a captured frame. It is a
// borrowed, read-only window over memory owned by the image-storage side of the
// system: the engine never copies the frame and never writes into it.
//
// Two native formats are supported, matching what an embedded sensor emits:
// - 8-bit grayscale, one byte per pixel;
// - 16-bit packed RGB565, one `u16` per pixel (5 bits red, 6 green, 5 blue).
//
// The buffer validates its length once at construction so that the hot scan
// loop can index without further checks. The helpers at the bottom of the file
// bridge from the `image` crate's owned buffers, which is how the CLI and the
// tests obtain frames.

use crate::core_modules::geometry::Rect;
use crate::error::{BlobError, Result};
use image::{GrayImage, RgbImage};

/// The native storage format of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Grayscale,
    Rgb565,
}

/// Borrowed pixel storage, one element per pixel in row-major order.
#[derive(Debug, Clone, Copy)]
pub enum PixelData<'a> {
    Grayscale(&'a [u8]),
    Rgb565(&'a [u16]),
}

impl PixelData<'_> {
    fn len(&self) -> usize {
        match self {
            PixelData::Grayscale(data) => data.len(),
            PixelData::Rgb565(data) => data.len(),
        }
    }
}

/// A read-only reference to a frame of `width * height` pixels.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    width: u32,
    height: u32,
    data: PixelData<'a>,
}

impl<'a> PixelBuffer<'a> {
    /// Wraps a pixel slice, checking that it holds exactly `width * height`
    /// pixels.
    pub fn new(width: u32, height: u32, data: PixelData<'a>) -> Result<Self> {
        let expected = width as usize * height as usize;
        let actual = data.len();
        if expected != actual {
            return Err(BlobError::BufferSizeMismatch { expected, actual });
        }
        Ok(Self { width, height, data })
    }

    pub fn grayscale(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        Self::new(width, height, PixelData::Grayscale(data))
    }

    pub fn rgb565(width: u32, height: u32, data: &'a [u16]) -> Result<Self> {
        Self::new(width, height, PixelData::Rgb565(data))
    }

    /// Borrows an `image::GrayImage` without copying it.
    pub fn from_gray_image(image: &'a GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: PixelData::Grayscale(image.as_raw()),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        match self.data {
            PixelData::Grayscale(_) => PixelFormat::Grayscale,
            PixelData::Rgb565(_) => PixelFormat::Rgb565,
        }
    }

    pub fn data(&self) -> PixelData<'a> {
        self.data
    }

    /// The full image as a rectangle, used to clip caller ROIs.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.width.min(i32::MAX as u32) as i32,
            self.height.min(i32::MAX as u32) as i32,
        )
    }
}

/// Packs 8-bit RGB channels into RGB565.
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Expands an RGB565 value to 8-bit channels, replicating the high bits so
/// that full intensity maps to 255.
pub fn unpack_rgb565(pixel: u16) -> (u8, u8, u8) {
    let r5 = (pixel >> 11) & 0x1F;
    let g6 = (pixel >> 5) & 0x3F;
    let b5 = pixel & 0x1F;
    (
        ((r5 << 3) | (r5 >> 2)) as u8,
        ((g6 << 2) | (g6 >> 4)) as u8,
        ((b5 << 3) | (b5 >> 2)) as u8,
    )
}

/// Converts an `image::RgbImage` into an owned RGB565 frame.
pub fn pack_rgb565_image(image: &RgbImage) -> Vec<u16> {
    image
        .pixels()
        .map(|p| pack_rgb565(p[0], p[1], p[2]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn rejects_short_buffer() {
        let data = vec![0u8; 10];
        let err = PixelBuffer::grayscale(4, 4, &data).expect_err("size mismatch");
        assert!(matches!(
            err,
            BlobError::BufferSizeMismatch {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn gray_image_is_borrowed_as_is() {
        let image = GrayImage::from_pixel(5, 3, Luma([7u8]));
        let buffer = PixelBuffer::from_gray_image(&image);
        assert_eq!(buffer.format(), PixelFormat::Grayscale);
        assert_eq!(buffer.bounds(), Rect::new(0, 0, 5, 3));
    }

    #[test]
    fn rgb565_extremes_round_trip() {
        assert_eq!(unpack_rgb565(pack_rgb565(255, 255, 255)), (255, 255, 255));
        assert_eq!(unpack_rgb565(pack_rgb565(0, 0, 0)), (0, 0, 0));
        assert_eq!(pack_rgb565(255, 0, 0), 0xF800);
        assert_eq!(pack_rgb565(0, 255, 0), 0x07E0);
        assert_eq!(pack_rgb565(0, 0, 255), 0x001F);
    }

    #[test]
    fn packs_rgb_image_row_major() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(1, 0, Rgb([0, 0, 255]));
        assert_eq!(pack_rgb565_image(&image), vec![0x0000, 0x001F]);
    }
}
