//! Uniform pull-based access to stills, looping videos and the live camera.

use std::path::Path;

use crate::{frame::Frame, Result};

pub mod camera;
pub mod still;
pub mod video;

pub use camera::LiveCamera;
pub use still::StillImage;
pub use video::{VideoDecoder, VideoMetadata, VideoStream};

/// Which concrete source is behind a `FrameSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    StaticImage,
    VideoStream,
    LiveCamera,
}

/// Result of one pull from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Frame(Frame),
    /// No frame available: end of a video, or a camera with nothing to give yet.
    EndOfStream,
}

impl ReadOutcome {
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            ReadOutcome::Frame(frame) => Some(frame),
            ReadOutcome::EndOfStream => None,
        }
    }
}

/// A source of frames owned by the pipeline.
///
/// `release` must be idempotent; reads after release fail with
/// `SourceUnavailable`.
pub trait FrameSource {
    fn kind(&self) -> SourceKind;

    fn read_next(&mut self) -> Result<ReadOutcome>;

    fn seek_to_start(&mut self) -> Result<()>;

    fn release(&mut self);

    /// Container metadata, for video sources.
    fn metadata(&self) -> Option<&VideoMetadata> {
        None
    }
}

/// Opens frame sources on behalf of the pipeline.
pub trait SourceProvider {
    fn open_image(&mut self, path: &Path) -> Result<Box<dyn FrameSource>>;

    fn open_video(&mut self, path: &Path) -> Result<Box<dyn FrameSource>>;

    /// Opens the default camera device.
    fn open_camera(&mut self) -> Result<Box<dyn FrameSource>>;
}

/// Sources backed by files on disk and the system camera.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSources;

impl SourceProvider for SystemSources {
    fn open_image(&mut self, path: &Path) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(StillImage::open(path)?))
    }

    fn open_video(&mut self, path: &Path) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(VideoStream::open(path)?))
    }

    fn open_camera(&mut self) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(LiveCamera::open_default()?))
    }
}

/// File name used in status lines.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
