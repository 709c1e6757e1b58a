// src/source/camera.rs
use log::{error, info, warn};
use nokhwa::{
    pixel_format::{RgbFormat, YuyvFormat},
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Camera, NokhwaError,
};

use super::{FrameSource, ReadOutcome, SourceKind};
use crate::{frame::Frame, Error, Result};

// --- Constants ---
const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;
const REQUESTED_FPS: u32 = 30;

/// The default system camera, read synchronously once per tick.
pub struct LiveCamera {
    camera: Option<Camera>,
}

impl LiveCamera {
    /// Opens device index 0 and starts its stream.
    pub fn open_default() -> Result<Self> {
        Self::open(CameraIndex::Index(0))
    }

    fn open(index: CameraIndex) -> Result<Self> {
        let requested_resolution = Resolution::new(REQUESTED_WIDTH, REQUESTED_HEIGHT);
        let requested_cam_format = CameraFormat::new(requested_resolution, FrameFormat::YUYV, REQUESTED_FPS);
        let requested_format =
            RequestedFormat::new::<YuyvFormat>(RequestedFormatType::Closest(requested_cam_format));
        info!("Requested camera format: {:?}", requested_format);

        // --- Initialize Camera ---
        let camera_result = Camera::new(index.clone(), requested_format.clone()).or_else(|err| {
            warn!("Closest YUYV format failed: {}. Trying highest frame rate...", err);
            Camera::new(
                index,
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
            )
        });

        let mut camera = camera_result.map_err(|err| {
            let error_msg = format!("Failed to open camera: {}", err);
            error!("{}", error_msg);
            Error::SourceUnavailable(error_msg)
        })?;
        info!("Actual camera format received: {:?}", camera.camera_format());

        camera.open_stream().map_err(|err| {
            let error_msg = format!("Failed to open stream: {}", err);
            error!("{}", error_msg);
            Error::SourceUnavailable(error_msg)
        })?;
        info!("Camera stream opened successfully.");

        Ok(Self { camera: Some(camera) })
    }
}

impl FrameSource for LiveCamera {
    fn kind(&self) -> SourceKind {
        SourceKind::LiveCamera
    }

    fn read_next(&mut self) -> Result<ReadOutcome> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| Error::SourceUnavailable("camera was released".to_string()))?;

        match camera.frame() {
            Ok(buffer) => match buffer.decode_image::<RgbFormat>() {
                Ok(decoded_rgb_image) => {
                    let (width, height) = (decoded_rgb_image.width(), decoded_rgb_image.height());
                    Frame::from_rgb(width, height, decoded_rgb_image.into_raw()).map(ReadOutcome::Frame)
                }
                Err(err) => {
                    warn!("Failed to decode frame to RGB: {}", err);
                    Ok(ReadOutcome::EndOfStream)
                }
            },
            Err(NokhwaError::ReadFrameError(msg)) if msg.contains("Timeout") => {
                warn!("Camera frame read timeout.");
                Ok(ReadOutcome::EndOfStream)
            }
            Err(err) => Err(Error::SourceUnavailable(format!("Failed to capture frame: {}", err))),
        }
    }

    fn seek_to_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                error!("Failed to stop camera stream cleanly: {}", e);
            }
            info!("Camera released.");
        }
    }
}

impl Drop for LiveCamera {
    fn drop(&mut self) {
        self.release();
    }
}
