// src/compositor.rs
use image::{imageops, imageops::FilterType, Rgb, RgbImage};

use crate::{config::DisplayConfig, frame::Frame, Error, Result};

/// Where a scaled image lands inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Uniform scale that fits `content` inside `canvas`, centred.
///
/// Upscaling is allowed. Returns `None` for zero-sized content.
pub fn letterbox(content_w: u32, content_h: u32, canvas_w: u32, canvas_h: u32) -> Option<Placement> {
    if content_w == 0 || content_h == 0 {
        return None;
    }
    let scale = (canvas_w as f64 / content_w as f64).min(canvas_h as f64 / content_h as f64);
    let width = ((content_w as f64 * scale).floor() as u32).min(canvas_w);
    let height = ((content_h as f64 * scale).floor() as u32).min(canvas_h);
    Some(Placement {
        scale,
        width,
        height,
        x: (canvas_w - width) / 2,
        y: (canvas_h - height) / 2,
    })
}

/// Fixed-size output image, rebuilt every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn blank(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self { image: RgbImage::from_pixel(width, height, background) }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Packed RGB8 pixels, row-major.
    pub fn as_rgb(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Letterboxes frames into a canvas of fixed dimensions.
#[derive(Debug, Clone)]
pub struct Compositor {
    width: u32,
    height: u32,
    background: Rgb<u8>,
}

impl Compositor {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self { width, height, background }
    }

    pub fn from_config(display: &DisplayConfig) -> Self {
        Self::new(display.width, display.height, display.background_rgb())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Original on the left, annotated on the right, scaled as one image.
    pub fn dual_pane(&self, original: &Frame, annotated: &Frame) -> Result<Canvas> {
        original.ensure_non_empty()?;
        if original.dimensions() != annotated.dimensions() {
            return Err(Error::MalformedFrame(format!(
                "pane sizes differ: {:?} vs {:?}",
                original.dimensions(),
                annotated.dimensions()
            )));
        }

        let (w, h) = original.dimensions();
        let mut combined = RgbImage::new(w * 2, h);
        imageops::replace(&mut combined, &**original, 0, 0);
        imageops::replace(&mut combined, &**annotated, w as i64, 0);

        self.place(&combined)
    }

    /// A single frame, centred and scaled to fit.
    pub fn single_pane(&self, frame: &Frame) -> Result<Canvas> {
        frame.ensure_non_empty()?;
        self.place(frame)
    }

    fn place(&self, content: &RgbImage) -> Result<Canvas> {
        let (cw, ch) = content.dimensions();
        let placement = letterbox(cw, ch, self.width, self.height)
            .ok_or_else(|| Error::MalformedFrame(format!("content has zero dimension ({}x{})", cw, ch)))?;

        let mut canvas = Canvas::blank(self.width, self.height, self.background);
        if placement.width == 0 || placement.height == 0 {
            return Ok(canvas);
        }
        if (placement.width, placement.height) == (cw, ch) {
            imageops::replace(&mut canvas.image, content, placement.x as i64, placement.y as i64);
        } else {
            let scaled = imageops::resize(content, placement.width, placement.height, FilterType::Triangle);
            imageops::replace(&mut canvas.image, &scaled, placement.x as i64, placement.y as i64);
        }
        Ok(canvas)
    }
}
