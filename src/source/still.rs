// src/source/still.rs
use std::path::{Path, PathBuf};

use log::info;

use super::{FrameSource, ReadOutcome, SourceKind};
use crate::{frame::Frame, Error, Result};

/// A decoded still image, returned unchanged on every read.
#[derive(Debug)]
pub struct StillImage {
    path: PathBuf,
    frame: Option<Frame>,
}

impl StillImage {
    /// Decodes the whole image up front.
    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .map_err(|e| Error::SourceUnavailable(format!("Failed to load image {}: {}", path.display(), e)))?;
        let frame = Frame::new(decoded.to_rgb8());
        frame.ensure_non_empty()?;
        info!("Loaded image {} ({}x{})", path.display(), frame.width(), frame.height());
        Ok(Self::from_frame(path, frame))
    }

    pub fn from_frame(path: &Path, frame: Frame) -> Self {
        Self { path: path.to_path_buf(), frame: Some(frame) }
    }
}

impl FrameSource for StillImage {
    fn kind(&self) -> SourceKind {
        SourceKind::StaticImage
    }

    fn read_next(&mut self) -> Result<ReadOutcome> {
        self.frame
            .clone()
            .map(ReadOutcome::Frame)
            .ok_or_else(|| Error::SourceUnavailable(format!("{} was released", self.path.display())))
    }

    fn seek_to_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn release(&mut self) {
        self.frame = None;
    }

}
