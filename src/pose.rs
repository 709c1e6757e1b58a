// src/pose.rs
use crate::{frame::Frame, Result};

/// COCO 17-keypoint order produced by YOLO pose models.
pub mod coco {
    pub const NOSE: usize = 0;
    pub const LEFT_EYE: usize = 1;
    pub const RIGHT_EYE: usize = 2;
    pub const LEFT_EAR: usize = 3;
    pub const RIGHT_EAR: usize = 4;
    pub const LEFT_SHOULDER: usize = 5;
    pub const RIGHT_SHOULDER: usize = 6;
    pub const LEFT_ELBOW: usize = 7;
    pub const RIGHT_ELBOW: usize = 8;
    pub const LEFT_WRIST: usize = 9;
    pub const RIGHT_WRIST: usize = 10;
    pub const LEFT_HIP: usize = 11;
    pub const RIGHT_HIP: usize = 12;
    pub const LEFT_KNEE: usize = 13;
    pub const RIGHT_KNEE: usize = 14;
    pub const LEFT_ANKLE: usize = 15;
    pub const RIGHT_ANKLE: usize = 16;

    pub const NUM_KEYPOINTS: usize = 17;
}

/// Skeleton edges between COCO keypoint indices.
pub const COCO_CONNECTIONS: &[(usize, usize)] = &[
    // face
    (coco::LEFT_EAR, coco::LEFT_EYE),
    (coco::LEFT_EYE, coco::NOSE),
    (coco::NOSE, coco::RIGHT_EYE),
    (coco::RIGHT_EYE, coco::RIGHT_EAR),
    // arms
    (coco::LEFT_SHOULDER, coco::RIGHT_SHOULDER),
    (coco::LEFT_SHOULDER, coco::LEFT_ELBOW),
    (coco::LEFT_ELBOW, coco::LEFT_WRIST),
    (coco::RIGHT_SHOULDER, coco::RIGHT_ELBOW),
    (coco::RIGHT_ELBOW, coco::RIGHT_WRIST),
    // torso
    (coco::LEFT_SHOULDER, coco::LEFT_HIP),
    (coco::RIGHT_SHOULDER, coco::RIGHT_HIP),
    (coco::LEFT_HIP, coco::RIGHT_HIP),
    // legs
    (coco::LEFT_HIP, coco::LEFT_KNEE),
    (coco::LEFT_KNEE, coco::LEFT_ANKLE),
    (coco::RIGHT_HIP, coco::RIGHT_KNEE),
    (coco::RIGHT_KNEE, coco::RIGHT_ANKLE),
];

/// A single keypoint in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth, when the detector provides one.
    pub z: Option<f32>,
    /// Detector confidence that the keypoint is visible, 0.0-1.0.
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, z: None, visibility }
    }
}

/// Landmarks of one detected subject plus the edges connecting them.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseLandmarks {
    pub landmarks: Vec<Landmark>,
    pub connections: &'static [(usize, usize)],
}

impl PoseLandmarks {
    pub fn coco(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks, connections: COCO_CONNECTIONS }
    }

    /// Connections whose endpoints both exist, as landmark pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&Landmark, &Landmark)> + '_ {
        self.connections
            .iter()
            .filter_map(|&(a, b)| Some((self.landmarks.get(a)?, self.landmarks.get(b)?)))
    }
}

/// A long-lived pose landmark detector.
///
/// `Ok(None)` means no subject was found in the frame.
pub trait PoseDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<PoseLandmarks>>;
}

/// Detector that never finds anyone. Used when no model backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDetector;

impl PoseDetector for NoopDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Option<PoseLandmarks>> {
        Ok(None)
    }
}

/// Builds the best detector available in this build.
pub fn default_detector() -> Result<Box<dyn PoseDetector>> {
    #[cfg(feature = "yolo")]
    {
        Ok(Box::new(yolo::YoloPoseDetector::new()?))
    }
    #[cfg(not(feature = "yolo"))]
    {
        log::warn!("Built without the `yolo` feature, frames will not be annotated.");
        Ok(Box::new(NoopDetector))
    }
}

#[cfg(feature = "yolo")]
pub mod yolo {
    use image::DynamicImage;
    use log::{debug, info, warn};
    use usls::{models::YOLO, Options};

    use super::{Landmark, PoseDetector, PoseLandmarks};
    use crate::{frame::Frame, Error, Result};

    /// YOLOv8 pose model run through usls.
    pub struct YoloPoseDetector {
        model: YOLO,
    }

    impl YoloPoseDetector {
        pub fn new() -> Result<Self> {
            let options = Options::yolo_v8_n_pose()
                .with_model_device("cpu".try_into().map_err(|e| Error::Detector(format!("{:?}", e)))?);
            let model = YOLO::new(options).map_err(|e| Error::Detector(format!("Failed to load model: {}", e)))?;
            info!("Pose model loaded successfully.");
            Ok(Self { model })
        }
    }

    impl PoseDetector for YoloPoseDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Option<PoseLandmarks>> {
            let input = DynamicImage::ImageRgb8(frame.to_image());
            let ys = self
                .model
                .forward(&[input])
                .map_err(|e| Error::Detector(format!("Model forward pass failed: {}", e)))?;

            let Some(y) = ys.get(0) else {
                warn!("Model output Ys was empty.");
                return Ok(None);
            };
            // Only the first subject is drawn.
            let Some(subject) = y.keypoints().and_then(|all| all.first()) else {
                debug!("No pose in frame.");
                return Ok(None);
            };
            let landmarks = subject
                .iter()
                .map(|kpt| Landmark::new(kpt.x(), kpt.y(), kpt.confidence()))
                .collect();
            Ok(Some(PoseLandmarks::coco(landmarks)))
        }
    }
}
