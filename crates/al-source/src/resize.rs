use al_core::frame::FrameBuffer;
use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};

/// Frame sampler: scales a captured frame down to one pixel per grid cell.
///
/// Wraps a reusable fast_image_resize resizer with a bilinear convolution.
/// Every render path samples through this type so identical inputs give
/// identical pixels.
///
/// # Example
/// ```
/// use al_source::resize::Sampler;
/// let s = Sampler::new();
/// ```
pub struct Sampler {
    inner: FirResizer,
    options: ResizeOptions,
}

impl Sampler {
    /// Create a new sampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        }
    }

    /// Scale `src` into `dst`. The size of `dst` is the target grid.
    ///
    /// Consumes the captured frame: once sampled it is released.
    /// Returns `Ok(false)` without touching `dst` when either side has no
    /// pixels (source not loaded yet, or an empty grid).
    ///
    /// # Errors
    /// Returns an error if a buffer length does not match its dimensions.
    ///
    /// # Example
    /// ```
    /// use al_source::resize::Sampler;
    /// use al_core::frame::FrameBuffer;
    /// let mut s = Sampler::new();
    /// let mut dst = FrameBuffer::new(4, 2);
    /// assert!(s.sample(FrameBuffer::new(40, 20), &mut dst).unwrap());
    /// assert!(!s.sample(FrameBuffer::new(0, 0), &mut dst).unwrap());
    /// ```
    pub fn sample(&mut self, mut src: FrameBuffer, dst: &mut FrameBuffer) -> Result<bool> {
        if src.is_empty() || dst.is_empty() {
            return Ok(false);
        }
        if src.width == dst.width && src.height == dst.height {
            anyhow::ensure!(
                src.data.len() == dst.data.len(),
                "frame buffer length does not match its dimensions"
            );
            dst.data.copy_from_slice(&src.data);
            return Ok(true);
        }

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut src.data, PixelType::U8x4)
                .context("invalid source dimensions")?;

        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("resize failed")?;

        Ok(true)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgb: (u8, u8, u8)) -> FrameBuffer {
        let mut fb = FrameBuffer::new(w, h);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        fb
    }

    #[test]
    fn solid_color_survives_downscale() {
        let mut s = Sampler::new();
        let mut dst = FrameBuffer::new(8, 4);
        assert!(s.sample(solid(64, 36, (10, 200, 30)), &mut dst).unwrap());
        for px in dst.data.chunks_exact(4) {
            for (got, want) in px[..3].iter().zip([10u8, 200, 30]) {
                assert!(got.abs_diff(want) <= 1, "{got} vs {want}");
            }
        }
    }

    #[test]
    fn same_size_is_a_copy() {
        let mut s = Sampler::new();
        let mut src = FrameBuffer::new(3, 3);
        src.data[5] = 99;
        let expected = src.data.clone();
        let mut dst = FrameBuffer::new(3, 3);
        assert!(s.sample(src, &mut dst).unwrap());
        assert_eq!(dst.data, expected);
    }

    #[test]
    fn empty_destination_declines() {
        let mut s = Sampler::new();
        let mut dst = FrameBuffer::new(0, 5);
        assert!(!s.sample(solid(10, 10, (0, 0, 0)), &mut dst).unwrap());
    }

    #[test]
    fn mismatched_buffer_is_an_error() {
        let mut s = Sampler::new();
        let bad = FrameBuffer {
            data: vec![0; 10],
            width: 10,
            height: 10,
        };
        let mut dst = FrameBuffer::new(2, 2);
        assert!(s.sample(bad, &mut dst).is_err());
    }

    #[test]
    fn deterministic_across_instances() {
        let mut src = FrameBuffer::new(50, 30);
        for (i, b) in src.data.iter_mut().enumerate() {
            *b = (i * 31 % 251) as u8;
        }
        let mut a = FrameBuffer::new(7, 5);
        let mut b = FrameBuffer::new(7, 5);
        Sampler::new().sample(src.clone(), &mut a).unwrap();
        Sampler::new().sample(src, &mut b).unwrap();
        assert_eq!(a, b);
    }
}
