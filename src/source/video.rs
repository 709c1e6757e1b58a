// src/source/video.rs
use std::{fs::File, io::BufReader, path::Path};

use image::{codecs::gif::GifDecoder, AnimationDecoder, DynamicImage};
use log::{debug, info};

use super::{display_name, FrameSource, ReadOutcome, SourceKind};
use crate::{frame::Frame, Error, Result};

/// Stream properties reported by the decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub frame_count: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// Properties shown in the status line while a video plays.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub name: String,
    pub frame_count: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn new(name: impl Into<String>, info: StreamInfo) -> Self {
        Self {
            name: name.into(),
            frame_count: info.frame_count,
            fps: info.fps,
            width: info.width,
            height: info.height,
        }
    }

    /// Length in seconds, 0 when the frame rate is unknown.
    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Video: {} | Duration: {:.2}s | Resolution: {}x{} | FPS: {} | Frames: {}",
            self.name,
            self.duration_secs(),
            self.width,
            self.height,
            self.fps,
            self.frame_count
        )
    }
}

/// Decoding primitive behind a `VideoStream`.
pub trait VideoDecoder {
    fn info(&self) -> StreamInfo;

    /// Next frame, `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>>;

    /// Repositions at frame 0.
    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self);
}

/// A decoded video that advances one frame per read.
pub struct VideoStream {
    metadata: VideoMetadata,
    decoder: Option<Box<dyn VideoDecoder>>,
}

impl VideoStream {
    /// Picks a decoder from the file extension.
    pub fn open(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let decoder: Box<dyn VideoDecoder> = match extension.as_str() {
            "gif" => Box::new(GifFrames::open(path)?),
            _ => open_container(path)?,
        };
        let stream = Self::new(display_name(path), decoder);
        info!("Opened video: {}", stream.metadata.summary());
        Ok(stream)
    }

    pub fn new(name: impl Into<String>, decoder: Box<dyn VideoDecoder>) -> Self {
        let metadata = VideoMetadata::new(name, decoder.info());
        Self { metadata, decoder: Some(decoder) }
    }

    fn decoder(&mut self) -> Result<&mut Box<dyn VideoDecoder>> {
        let name = &self.metadata.name;
        self.decoder
            .as_mut()
            .ok_or_else(|| Error::SourceUnavailable(format!("{} was released", name)))
    }
}

impl FrameSource for VideoStream {
    fn kind(&self) -> SourceKind {
        SourceKind::VideoStream
    }

    fn read_next(&mut self) -> Result<ReadOutcome> {
        Ok(match self.decoder()?.read_frame()? {
            Some(frame) => ReadOutcome::Frame(frame),
            None => ReadOutcome::EndOfStream,
        })
    }

    fn seek_to_start(&mut self) -> Result<()> {
        self.decoder()?.rewind()
    }

    fn release(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.close();
            debug!("Released decoder for {}", self.metadata.name);
        }
    }

    fn metadata(&self) -> Option<&VideoMetadata> {
        Some(&self.metadata)
    }
}

impl Drop for VideoStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Animated GIF, fully decoded into memory.
pub struct GifFrames {
    frames: Vec<Frame>,
    position: usize,
    fps: f64,
}

impl GifFrames {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path).map_err(|e| {
            Error::SourceUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?);
        let unreadable = |e: image::ImageError| {
            Error::SourceUnavailable(format!("Failed to decode {}: {}", path.display(), e))
        };
        let decoder = GifDecoder::new(reader).map_err(unreadable)?;
        let raw_frames = decoder.into_frames().collect_frames().map_err(unreadable)?;

        // Frame rate from the first frame's delay
        let fps = raw_frames
            .first()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                if numer == 0 {
                    0.0
                } else {
                    1000.0 * denom as f64 / numer as f64
                }
            })
            .unwrap_or(0.0);

        let frames = raw_frames
            .into_iter()
            .map(|frame| Frame::new(DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8()))
            .collect();
        Ok(Self::from_frames(frames, fps))
    }

    pub fn from_frames(frames: Vec<Frame>, fps: f64) -> Self {
        Self { frames, position: 0, fps }
    }
}

impl VideoDecoder for GifFrames {
    fn info(&self) -> StreamInfo {
        let (width, height) = self.frames.first().map_or((0, 0), |f| f.dimensions());
        StreamInfo {
            frame_count: self.frames.len() as u64,
            fps: self.fps,
            width,
            height,
        }
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.frames.clear();
        self.position = 0;
    }
}

#[cfg(feature = "opencv")]
fn open_container(path: &Path) -> Result<Box<dyn VideoDecoder>> {
    Ok(Box::new(capture::OpenCvDecoder::open(path)?))
}

#[cfg(not(feature = "opencv"))]
fn open_container(path: &Path) -> Result<Box<dyn VideoDecoder>> {
    Err(Error::SourceUnavailable(format!(
        "{}: container video needs the `opencv` feature",
        path.display()
    )))
}

#[cfg(feature = "opencv")]
mod capture {
    use std::path::Path;

    use log::warn;
    use opencv::{
        core::{AlgorithmHint, Mat},
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };

    use super::{StreamInfo, VideoDecoder};
    use crate::{frame::Frame, Error, Result};

    fn cv_error(e: opencv::Error) -> Error {
        Error::SourceUnavailable(format!("OpenCV error: {}", e))
    }

    /// mp4/avi/mov through OpenCV's `VideoCapture`.
    pub struct OpenCvDecoder {
        capture: VideoCapture,
        info: StreamInfo,
    }

    impl OpenCvDecoder {
        pub fn open(path: &Path) -> Result<Self> {
            let path_str = path.to_string_lossy();
            let capture = VideoCapture::from_file(&path_str, videoio::CAP_ANY).map_err(cv_error)?;
            if !capture.is_opened().map_err(cv_error)? {
                return Err(Error::SourceUnavailable(format!("Failed to open video {}", path.display())));
            }
            let prop = |id| capture.get(id).unwrap_or(0.0);
            let info = StreamInfo {
                frame_count: prop(videoio::CAP_PROP_FRAME_COUNT).max(0.0) as u64,
                fps: prop(videoio::CAP_PROP_FPS),
                width: prop(videoio::CAP_PROP_FRAME_WIDTH).max(0.0) as u32,
                height: prop(videoio::CAP_PROP_FRAME_HEIGHT).max(0.0) as u32,
            };
            Ok(Self { capture, info })
        }
    }

    impl VideoDecoder for OpenCvDecoder {
        fn info(&self) -> StreamInfo {
            self.info
        }

        fn read_frame(&mut self) -> Result<Option<Frame>> {
            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr).map_err(cv_error)? || bgr.empty() {
                return Ok(None);
            }
            let mut rgb = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)
                .map_err(cv_error)?;
            let width = rgb.cols() as u32;
            let height = rgb.rows() as u32;
            let data = rgb.data_bytes().map_err(cv_error)?.to_vec();
            Frame::from_rgb(width, height, data).map(Some)
        }

        fn rewind(&mut self) -> Result<()> {
            self.capture
                .set(videoio::CAP_PROP_POS_FRAMES, 0.0)
                .map_err(cv_error)?;
            Ok(())
        }

        fn close(&mut self) {
            if let Err(e) = self.capture.release() {
                warn!("Failed to release video capture: {}", e);
            }
        }
    }
}
