//! The color source feeding the pipeline: a dense grid of YUV pixels.

use image::{DynamicImage, RgbImage};

use crate::colors::{Yuv, rgb_to_yuv, yuv_to_rgb};
use crate::error::{DepixelError, Result};

/// Number of channels every pixel must carry.
pub const CHANNELS: usize = 3;

/// Row-major `height` x `width` grid of colors already in the comparison space.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGrid {
    height: usize,
    width: usize,
    pixels: Vec<Yuv>,
}

impl ColorGrid {
    /// Wraps an interleaved buffer of `height * width * channels` floats.
    ///
    /// # Errors
    ///
    /// [`DepixelError::InvalidInput`] if a dimension is zero, `channels != 3`, the
    /// buffer length does not match, or a value is not finite.
    pub fn from_raw(height: usize, width: usize, channels: usize, data: &[f32]) -> Result<Self> {
        if channels != CHANNELS {
            return Err(DepixelError::invalid(format!(
                "expected {CHANNELS} color channels, got {channels}"
            )));
        }
        let expected = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| {
                DepixelError::invalid(format!("{height}x{width} image is too large"))
            })?;
        if data.len() != expected {
            return Err(DepixelError::invalid(format!(
                "buffer holds {} values, expected {expected}",
                data.len()
            )));
        }

        let pixels = data
            .chunks_exact(CHANNELS)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::from_pixels(height, width, pixels)
    }

    /// Builds a grid from per-pixel colors given in row-major order.
    ///
    /// # Errors
    ///
    /// [`DepixelError::InvalidInput`] if a dimension is zero, the pixel count does not
    /// match, or a channel is NaN or infinite.
    pub fn from_pixels(height: usize, width: usize, pixels: Vec<Yuv>) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(DepixelError::invalid(format!(
                "image dimensions must be positive, got {height}x{width}"
            )));
        }
        if pixels.len() != height * width {
            return Err(DepixelError::invalid(format!(
                "got {} pixels for a {height}x{width} image",
                pixels.len()
            )));
        }
        let bad = pixels.iter().position(|p| p.iter().any(|c| !c.is_finite()));
        if let Some(index) = bad {
            return Err(DepixelError::invalid(format!(
                "pixel ({}, {}) has a non-finite channel: {:?}",
                index / width,
                index % width,
                pixels[index]
            )));
        }
        Ok(Self {
            height,
            width,
            pixels,
        })
    }

    /// Converts a decoded 8-bit RGB image into YUV.
    pub fn from_rgb_image(img: &RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let pixels = img.pixels().map(|p| rgb_to_yuv(*p)).collect();
        Self::from_pixels(height as usize, width as usize, pixels)
    }

    /// Converts any decoded image, dropping alpha.
    pub fn from_image(img: &DynamicImage) -> Result<Self> {
        Self::from_rgb_image(&img.to_rgb8())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Yuv {
        self.pixels[row * self.width + col]
    }

    pub fn pixels(&self) -> &[Yuv] {
        &self.pixels
    }

    /// Back-converts the grid to 8-bit RGB at its native size.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            yuv_to_rgb(self.get(y as usize, x as usize))
        })
    }
}
