// src/display.rs
use crate::compositor::Canvas;

/// Captions shown above the two panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneLabels {
    pub original: String,
    pub annotated: String,
}

impl PaneLabels {
    pub fn image() -> Self {
        Self::with_original("Original image")
    }

    pub fn video() -> Self {
        Self::with_original("Original video")
    }

    fn with_original(original: &str) -> Self {
        Self {
            original: original.to_string(),
            annotated: "Prediction".to_string(),
        }
    }
}

/// What the UI shows: the latest canvas plus its status line and captions.
///
/// Contents are only ever replaced as a whole or cleared. `generation`
/// changes on every replacement or effective clear.
#[derive(Debug, Default)]
pub struct Display {
    canvas: Option<Canvas>,
    status: Option<String>,
    labels: Option<PaneLabels>,
    generation: u64,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn present(&mut self, canvas: Canvas, status: Option<String>, labels: Option<PaneLabels>) {
        self.canvas = Some(canvas);
        self.status = status;
        self.labels = labels;
        self.generation += 1;
    }

    /// Safe to call any number of times.
    pub fn clear(&mut self) {
        if self.is_clear() {
            return;
        }
        self.canvas = None;
        self.status = None;
        self.labels = None;
        self.generation += 1;
    }

    pub fn is_clear(&self) -> bool {
        self.canvas.is_none() && self.status.is_none() && self.labels.is_none()
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn labels(&self) -> Option<&PaneLabels> {
        self.labels.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
