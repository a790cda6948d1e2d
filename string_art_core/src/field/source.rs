use image::{RgbImage, RgbaImage};
use num_traits::AsPrimitive;

use crate::{
    error::{Error, Result},
    Float, Grid,
};

/// Decoded pixels borrowed from the caller, 8 bits per channel, row-major.
#[derive(Clone, Copy, Debug)]
pub struct SourceImage<'a> {
    pixels: &'a [u8],
    grid: Grid,
    channels: usize,
}

impl<'a> SourceImage<'a> {
    /// Channel count is inferred from the buffer length: 3 for RGB, 4 for RGBA.
    pub fn new(pixels: &'a [u8], width: usize, height: usize) -> Result<Self> {
        let grid = Grid::new(width, height);
        if grid.is_empty() || pixels.is_empty() {
            return Err(Error::image(format!(
                "source buffer of {} bytes for {width}x{height} pixels is empty",
                pixels.len()
            )));
        }
        let channels = match grid.len().checked_mul(3) {
            Some(rgb) if pixels.len() == rgb => 3,
            _ => match grid.len().checked_mul(4) {
                Some(rgba) if pixels.len() == rgba => 4,
                _ => {
                    return Err(Error::image(format!(
                        "{} bytes is neither RGB nor RGBA for {width}x{height} pixels",
                        pixels.len()
                    )))
                }
            },
        };
        Ok(Self {
            pixels,
            grid,
            channels,
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Darkness of a pixel in `[0, 1]`. Transparent pixels are composited over white.
    ///
    /// `x` and `y` must be inside the image.
    pub fn darkness_at<S: Float>(&self, x: usize, y: usize) -> S
    where
        u8: AsPrimitive<S>,
    {
        let offset = (y * self.grid.width + x) * self.channels;
        let pixel = &self.pixels[offset..offset + self.channels];
        let luma = S::LUMA_RED * pixel[0].as_()
            + S::LUMA_GREEN * pixel[1].as_()
            + S::LUMA_BLUE * pixel[2].as_();
        let alpha = if self.channels == 4 {
            pixel[3].as_() / S::TWO_FIVE_FIVE
        } else {
            S::ONE
        };
        ((S::ONE - luma / S::TWO_FIVE_FIVE) * alpha)
            .max(S::ZERO)
            .min(S::ONE)
    }
}

impl<'a> TryFrom<&'a RgbImage> for SourceImage<'a> {
    type Error = Error;

    fn try_from(value: &'a RgbImage) -> Result<Self> {
        Self::new(
            value.as_raw().as_slice(),
            value.width() as usize,
            value.height() as usize,
        )
    }
}

impl<'a> TryFrom<&'a RgbaImage> for SourceImage<'a> {
    type Error = Error;

    fn try_from(value: &'a RgbaImage) -> Result<Self> {
        Self::new(
            value.as_raw().as_slice(),
            value.width() as usize,
            value.height() as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffers_are_rejected() {
        assert!(matches!(
            SourceImage::new(&[], 0, 0),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            SourceImage::new(&[0; 12], 0, 4),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            SourceImage::new(&[0; 5], 1, 1),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn channels_follow_buffer_length() {
        assert_eq!(SourceImage::new(&[0; 12], 2, 2).unwrap().channels(), 3);
        assert_eq!(SourceImage::new(&[0; 16], 2, 2).unwrap().channels(), 4);
    }

    #[test]
    fn darkness_uses_luma_weights() {
        let pixels = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255];
        let source = SourceImage::new(&pixels, 4, 1).unwrap();
        assert!((source.darkness_at::<f64>(0, 0) - 1.0).abs() < 1e-9);
        assert!(source.darkness_at::<f64>(1, 0).abs() < 1e-9);
        assert!((source.darkness_at::<f64>(2, 0) - 0.701).abs() < 1e-9);
        assert!((source.darkness_at::<f64>(3, 0) - 0.886).abs() < 1e-9);
    }

    #[test]
    fn transparent_pixels_are_blank() {
        let pixels = [0, 0, 0, 0, 0, 0, 0, 255, 0, 0, 0, 51];
        let source = SourceImage::new(&pixels, 3, 1).unwrap();
        assert_eq!(source.darkness_at::<f32>(0, 0), 0.0);
        assert_eq!(source.darkness_at::<f32>(1, 0), 1.0);
        assert!((source.darkness_at::<f32>(2, 0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn converts_from_image_buffers() {
        let rgb = RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let source = SourceImage::try_from(&rgb).unwrap();
        assert_eq!(source.grid(), Grid::new(3, 2));
        assert_eq!(source.channels(), 3);

        let rgba = RgbaImage::from_pixel(2, 5, image::Rgba([10, 20, 30, 40]));
        let source = SourceImage::try_from(&rgba).unwrap();
        assert_eq!(source.grid(), Grid::new(2, 5));
        assert_eq!(source.channels(), 4);
    }
}
