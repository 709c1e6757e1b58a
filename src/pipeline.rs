// src/pipeline.rs
use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info, warn};

use crate::{
    annotate::PoseAnnotator,
    compositor::{Canvas, Compositor},
    config::Config,
    display::{Display, PaneLabels},
    frame::Frame,
    pose::PoseDetector,
    source::{display_name, FrameSource, ReadOutcome, SourceKind, SourceProvider, VideoMetadata},
    Result,
};

/// Which kind of input currently owns the frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Image,
    Video,
    Realtime,
}

/// User actions, delivered from whatever UI drives the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectImage(PathBuf),
    SelectVideo(PathBuf),
    SelectRealtime,
    StartRealtime,
    StopRealtime,
    Exit,
}

/// Queue the UI pushes actions into; drained on the UI thread.
pub fn action_channel() -> (Sender<Action>, Receiver<Action>) {
    crossbeam_channel::unbounded()
}

struct Realtime {
    active: bool,
    camera: Option<Box<dyn FrameSource>>,
    last_open_attempt: Option<Instant>,
}

impl Realtime {
    fn inactive() -> Self {
        Self { active: false, camera: None, last_open_attempt: None }
    }

    fn open_due(&self, now: Instant, retry: Duration) -> bool {
        self.last_open_attempt
            .map_or(true, |last| now.duration_since(last) >= retry)
    }
}

// Each variant only holds the source kind legal for its mode.
enum ModeState {
    Image {
        source: Option<Box<dyn FrameSource>>,
        name: Option<String>,
    },
    Video {
        source: Option<Box<dyn FrameSource>>,
    },
    Realtime(Realtime),
}

impl ModeState {
    fn mode(&self) -> Mode {
        match self {
            ModeState::Image { .. } => Mode::Image,
            ModeState::Video { .. } => Mode::Video,
            ModeState::Realtime(_) => Mode::Realtime,
        }
    }

    fn source(&self) -> Option<&dyn FrameSource> {
        match self {
            ModeState::Image { source, .. } | ModeState::Video { source } => source.as_deref(),
            ModeState::Realtime(rt) => rt.camera.as_deref(),
        }
    }

    fn take_source(&mut self) -> Option<Box<dyn FrameSource>> {
        match self {
            ModeState::Image { source, .. } | ModeState::Video { source } => source.take(),
            ModeState::Realtime(rt) => rt.camera.take(),
        }
    }
}

struct Rendered {
    canvas: Canvas,
    status: Option<String>,
    labels: Option<PaneLabels>,
}

/// Owns the active source and drives one pipeline pass per tick.
///
/// Every failure inside a tick ends in a cleared display; nothing escapes
/// `tick`.
pub struct PipelineContext {
    state: ModeState,
    provider: Box<dyn SourceProvider>,
    annotator: PoseAnnotator,
    compositor: Compositor,
    display: Display,
    camera_retry: Duration,
    shut_down: bool,
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("mode", &self.mode())
            .field("realtime_active", &self.is_realtime_active())
            .field("source", &self.active_source_kind())
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl PipelineContext {
    /// Starts in Realtime mode with the camera off.
    pub fn new(config: &Config, provider: Box<dyn SourceProvider>, detector: Box<dyn PoseDetector>) -> Self {
        Self {
            state: ModeState::Realtime(Realtime::inactive()),
            provider,
            annotator: PoseAnnotator::new(detector, config.overlay.clone()),
            compositor: Compositor::from_config(&config.display),
            display: Display::new(),
            camera_retry: config.timing.camera_retry(),
            shut_down: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn is_realtime_active(&self) -> bool {
        matches!(&self.state, ModeState::Realtime(rt) if rt.active)
    }

    pub fn active_source_kind(&self) -> Option<SourceKind> {
        self.state.source().map(|source| source.kind())
    }

    pub fn video_metadata(&self) -> Option<&VideoMetadata> {
        match &self.state {
            ModeState::Video { source } => source.as_deref().and_then(|s| s.metadata()),
            _ => None,
        }
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Applies every queued action. Returns how many were handled.
    pub fn drain_actions(&mut self, actions: &Receiver<Action>) -> usize {
        let mut handled = 0;
        loop {
            match actions.try_recv() {
                Ok(action) => {
                    self.handle(action);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Action queue disconnected.");
                    break;
                }
            }
        }
        handled
    }

    pub fn handle(&mut self, action: Action) {
        if self.shut_down {
            debug!("Ignoring {:?} after shutdown.", action);
            return;
        }
        match action {
            Action::SelectImage(path) => self.select_image(&path),
            Action::SelectVideo(path) => self.select_video(&path),
            Action::SelectRealtime => self.select_realtime(),
            Action::StartRealtime => self.start_realtime(Instant::now()),
            Action::StopRealtime => self.stop_realtime(),
            Action::Exit => self.shutdown(),
        }
    }

    fn select_image(&mut self, path: &Path) {
        self.release_active();
        self.display.clear();
        self.state = match self.provider.open_image(path) {
            Ok(source) => {
                info!("Mode -> Image ({})", path.display());
                ModeState::Image { source: Some(source), name: Some(display_name(path)) }
            }
            Err(e) => {
                warn!("Mode -> Image without a picture: {}", e);
                ModeState::Image { source: None, name: None }
            }
        };
    }

    fn select_video(&mut self, path: &Path) {
        self.release_active();
        self.display.clear();
        self.state = match self.provider.open_video(path) {
            Ok(source) => {
                info!("Mode -> Video ({})", path.display());
                ModeState::Video { source: Some(source) }
            }
            Err(e) => {
                warn!("Mode -> Video without a stream: {}", e);
                ModeState::Video { source: None }
            }
        };
    }

    fn select_realtime(&mut self) {
        self.release_active();
        self.state = ModeState::Realtime(Realtime::inactive());
        self.display.clear();
        info!("Mode -> Realtime");
    }

    fn start_realtime(&mut self, now: Instant) {
        let ModeState::Realtime(rt) = &mut self.state else {
            debug!("StartRealtime ignored outside Realtime mode.");
            return;
        };
        if rt.active {
            return;
        }
        rt.active = true;
        info!("Starting camera.");
        Self::open_camera(rt, &mut *self.provider, now);
    }

    fn stop_realtime(&mut self) {
        let ModeState::Realtime(rt) = &mut self.state else {
            debug!("StopRealtime ignored outside Realtime mode.");
            return;
        };
        if !rt.active {
            return;
        }
        if let Some(mut camera) = rt.camera.take() {
            camera.release();
        }
        *rt = Realtime::inactive();
        self.display.clear();
        info!("Camera stopped.");
    }

    fn open_camera(rt: &mut Realtime, provider: &mut dyn SourceProvider, now: Instant) {
        rt.last_open_attempt = Some(now);
        match provider.open_camera() {
            Ok(camera) => rt.camera = Some(camera),
            Err(e) => warn!("Camera unavailable, will retry: {}", e),
        }
    }

    /// Releases every handle. Further actions and ticks are ignored.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        info!("Shutting down pipeline.");
        self.release_active();
        self.display.clear();
        self.shut_down = true;
    }

    fn release_active(&mut self) {
        if let Some(mut source) = self.state.take_source() {
            debug!("Releasing {:?} source.", source.kind());
            source.release();
        }
    }

    /// One full pipeline pass.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// `tick` with an explicit clock, which paces camera reopen attempts.
    pub fn tick_at(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }
        let rendered = match &mut self.state {
            ModeState::Realtime(rt) => {
                if rt.active && rt.camera.is_none() && rt.open_due(now, self.camera_retry) {
                    Self::open_camera(rt, &mut *self.provider, now);
                }
                match rt.camera.as_deref_mut() {
                    Some(camera) if rt.active => {
                        render_realtime(camera, &mut self.annotator, &self.compositor)
                    }
                    _ => Ok(None),
                }
            }
            ModeState::Image { source, name } => match source.as_deref_mut() {
                Some(source) => render_image(source, name.as_deref(), &mut self.annotator, &self.compositor),
                None => Ok(None),
            },
            ModeState::Video { source } => match source.as_deref_mut() {
                Some(source) => render_video(source, &mut self.annotator, &self.compositor),
                None => Ok(None),
            },
        };

        match rendered {
            Ok(Some(Rendered { canvas, status, labels })) => self.display.present(canvas, status, labels),
            Ok(None) => self.display.clear(),
            Err(e) => {
                debug!("Tick skipped: {}", e);
                self.display.clear();
            }
        }
    }
}

impl Drop for PipelineContext {
    fn drop(&mut self) {
        self.release_active();
    }
}

/// Annotated frame only, resized to the canvas first.
fn render_realtime(
    camera: &mut dyn FrameSource,
    annotator: &mut PoseAnnotator,
    compositor: &Compositor,
) -> Result<Option<Rendered>> {
    let Some(frame) = camera.read_next()?.into_frame() else {
        return Ok(None);
    };
    frame.ensure_non_empty()?;
    let frame = frame.resized(compositor.width(), compositor.height());
    let annotated = annotator.annotate(&frame);
    let canvas = compositor.single_pane(&annotated)?;
    Ok(Some(Rendered { canvas, status: None, labels: None }))
}

fn render_image(
    source: &mut dyn FrameSource,
    name: Option<&str>,
    annotator: &mut PoseAnnotator,
    compositor: &Compositor,
) -> Result<Option<Rendered>> {
    let Some(frame) = source.read_next()?.into_frame() else {
        return Ok(None);
    };
    let canvas = compare(&frame, annotator, compositor)?;
    Ok(Some(Rendered {
        canvas,
        status: name.map(|name| format!("Image: {}", name)),
        labels: Some(PaneLabels::image()),
    }))
}

/// Reads the next frame, restarting once from frame 0 at end of stream.
fn render_video(
    source: &mut dyn FrameSource,
    annotator: &mut PoseAnnotator,
    compositor: &Compositor,
) -> Result<Option<Rendered>> {
    let frame = match source.read_next() {
        Ok(ReadOutcome::Frame(frame)) => frame,
        outcome => {
            if let Err(e) = outcome {
                debug!("Video read failed, restarting: {}", e);
            } else {
                debug!("End of video, looping.");
            }
            source.seek_to_start()?;
            match source.read_next()?.into_frame() {
                Some(frame) => frame,
                None => return Ok(None),
            }
        }
    };
    let canvas = compare(&frame, annotator, compositor)?;
    Ok(Some(Rendered {
        canvas,
        status: source.metadata().map(VideoMetadata::summary),
        labels: Some(PaneLabels::video()),
    }))
}

fn compare(frame: &Frame, annotator: &mut PoseAnnotator, compositor: &Compositor) -> Result<Canvas> {
    frame.ensure_non_empty()?;
    let annotated = annotator.annotate(frame);
    compositor.dual_pane(frame, &annotated)
}
