//! Live pose viewer: shows a camera feed, a still image or a looping video
//! next to a copy annotated with the detected pose skeleton.
//!
//! The pipeline on every tick:
//! 1. pull a frame from the active source (still, video, camera)
//! 2. run the pose detector and draw the skeleton onto a copy
//! 3. letterbox the result into a fixed-size canvas (one pane for the
//!    camera, original and annotated side by side otherwise)
//!
//! ```no_run
//! use pose_cam_duo::{
//!     config::Config,
//!     pipeline::{Action, PipelineContext},
//!     pose::NoopDetector,
//!     source::SystemSources,
//! };
//!
//! let mut pipeline = PipelineContext::new(&Config::default(), Box::new(SystemSources), Box::new(NoopDetector));
//! pipeline.handle(Action::SelectImage("person.jpg".into()));
//! pipeline.tick();
//! let canvas = pipeline.display().canvas();
//! # let _ = canvas;
//! ```

pub mod annotate;
pub mod compositor;
pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod pose;
pub mod source;
pub mod timer;

pub use error::{Error, Result};
