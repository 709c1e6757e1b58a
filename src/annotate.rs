// src/annotate.rs
use image::{Rgb, RgbImage};
use imageproc::drawing;
use log::{debug, warn};

use crate::{
    config::OverlayConfig,
    frame::Frame,
    pose::{Landmark, PoseDetector, PoseLandmarks},
};

/// Runs the detector on frames and draws the skeleton it finds.
///
/// The detector is created once and reused for every tick.
pub struct PoseAnnotator {
    detector: Box<dyn PoseDetector>,
    style: OverlayConfig,
}

impl PoseAnnotator {
    pub fn new(detector: Box<dyn PoseDetector>, style: OverlayConfig) -> Self {
        Self { detector, style }
    }

    /// Returns a copy of `frame` with the skeleton drawn on it, or the frame
    /// itself when nothing was detected. Detector errors count as no detection.
    pub fn annotate(&mut self, frame: &Frame) -> Frame {
        match self.detector.detect(frame) {
            Ok(Some(pose)) => {
                let mut canvas = frame.to_image();
                draw_pose(&mut canvas, &pose, &self.style);
                Frame::new(canvas)
            }
            Ok(None) => {
                debug!("No landmarks detected.");
                frame.clone()
            }
            Err(e) => {
                warn!("Pose detection failed: {}", e);
                frame.clone()
            }
        }
    }
}

fn is_drawable(landmark: &Landmark, min_visibility: f32) -> bool {
    landmark.x.is_finite() && landmark.y.is_finite() && landmark.visibility >= min_visibility
}

/// Draws connections first, then landmark dots on top of them.
pub fn draw_pose(image: &mut RgbImage, pose: &PoseLandmarks, style: &OverlayConfig) {
    let line_color = Rgb(style.connection_color);
    let dot_color = Rgb(style.landmark_color);

    for (a, b) in pose.edges() {
        if !is_drawable(a, style.min_visibility) || !is_drawable(b, style.min_visibility) {
            continue;
        }
        draw_thick_line(image, (a.x, a.y), (b.x, b.y), style.connection_thickness, line_color);
    }

    for landmark in &pose.landmarks {
        if !is_drawable(landmark, style.min_visibility) {
            continue;
        }
        let center = (landmark.x.round() as i32, landmark.y.round() as i32);
        drawing::draw_filled_circle_mut(image, center, style.landmark_radius, dot_color);
    }
}

fn draw_thick_line(image: &mut RgbImage, start: (f32, f32), end: (f32, f32), thickness: u32, color: Rgb<u8>) {
    let thickness = thickness.max(1) as i32;
    let half = thickness / 2;
    // Stack 1px segments shifted along both axes.
    for offset in -half..thickness - half {
        let o = offset as f32;
        drawing::draw_line_segment_mut(image, (start.0 + o, start.1), (end.0 + o, end.1), color);
        drawing::draw_line_segment_mut(image, (start.0, start.1 + o), (end.0, end.1 + o), color);
    }
}
