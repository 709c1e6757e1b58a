// src/frame.rs
use std::{ops::Deref, sync::Arc};

use image::{imageops::FilterType, RgbImage};

use crate::{Error, Result};

/// One decoded RGB image from any source.
///
/// The pixel buffer is shared and never mutated: clones are cheap and every
/// transform produces a new `Frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame(Arc<RgbImage>);

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self(Arc::new(image))
    }

    /// Builds a frame from a packed RGB8 buffer.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        RgbImage::from_raw(width, height, pixels)
            .map(Self::new)
            .ok_or_else(|| {
                Error::MalformedFrame(format!("buffer does not match {}x{} RGB", width, height))
            })
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Errors with `MalformedFrame` when either dimension is zero.
    pub fn ensure_non_empty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::MalformedFrame(format!(
                "frame has zero dimension ({}x{})",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }

    /// Owned copy of the pixels, for stages that draw on top of the frame.
    pub fn to_image(&self) -> RgbImage {
        (*self.0).clone()
    }

    /// Resampled copy at exactly `width`x`height`.
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.width() == width && self.height() == height {
            return self.clone();
        }
        Frame::new(image::imageops::resize(&*self.0, width, height, FilterType::Triangle))
    }
}

impl Deref for Frame {
    type Target = RgbImage;

    fn deref(&self) -> &RgbImage {
        &self.0
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}
