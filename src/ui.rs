// src/ui.rs
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};
use egui::{Align, Button, ColorImage, ImageData, Layout, TextureHandle, TextureOptions};
use log::{debug, error, info};
use rfd::FileDialog;

use pose_cam_duo::{
    config::Config,
    pipeline::{self, Action, Mode, PipelineContext},
    pose,
    source::SystemSources,
    timer::TickTimer,
};

const FPS_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

pub struct PoseViewerUI {
    pipeline: PipelineContext,
    timer: TickTimer,

    // --- Action queue ---
    action_tx: Sender<Action>,
    action_rx: Receiver<Action>,

    // --- Display State ---
    texture: Option<TextureHandle>,
    shown_generation: u64,

    // --- FPS Fields ---
    last_fps_update_time: Instant,
    ticks_since_last_update: u32,
    last_calculated_fps: f32,
}

impl PoseViewerUI {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: Config,
        initial: Option<Action>,
    ) -> pose_cam_duo::Result<Self> {
        info!("Initializing PoseViewerUI");
        let detector = pose::default_detector()?;
        let pipeline = PipelineContext::new(&config, Box::new(SystemSources), detector);
        let (action_tx, action_rx) = pipeline::action_channel();

        let ui = Self {
            pipeline,
            timer: TickTimer::new(config.timing.tick_interval()),
            action_tx,
            action_rx,
            texture: None,
            shown_generation: 0,
            last_fps_update_time: Instant::now(),
            ticks_since_last_update: 0,
            last_calculated_fps: 0.0,
        };
        if let Some(action) = initial {
            ui.send(action);
        }
        Ok(ui)
    }

    fn send(&self, action: Action) {
        debug!("Queueing {:?}", action);
        if let Err(e) = self.action_tx.send(action) {
            error!("Action queue closed: {}", e);
        }
    }

    fn update_fps_counter(&mut self) {
        self.ticks_since_last_update += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update_time);

        if elapsed >= FPS_UPDATE_INTERVAL {
            let elapsed_secs = elapsed.as_secs_f32();
            self.last_calculated_fps = if elapsed_secs > 0.0 {
                self.ticks_since_last_update as f32 / elapsed_secs
            } else {
                f32::INFINITY
            };
            self.ticks_since_last_update = 0;
            self.last_fps_update_time = now;
        }
    }

    /// Re-uploads the canvas only when the display buffer changed.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let display = self.pipeline.display();
        if display.generation() == self.shown_generation {
            return;
        }
        self.shown_generation = display.generation();

        let Some(canvas) = display.canvas() else {
            self.texture = None;
            return;
        };
        let size = [canvas.width() as usize, canvas.height() as usize];
        let image = Arc::new(ColorImage::from_rgb(size, canvas.as_rgb()));
        match self.texture {
            Some(ref mut texture) => texture.set(ImageData::Color(image), TextureOptions::LINEAR),
            None => {
                info!("Creating texture with size: {:?}", size);
                self.texture = Some(ctx.load_texture("pose_canvas", ImageData::Color(image), TextureOptions::LINEAR));
            }
        }
    }

    fn source_buttons(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Image").clicked() {
                if let Some(path) = FileDialog::new()
                    .add_filter("Images", &["png", "jpg", "jpeg"])
                    .pick_file()
                {
                    self.send(Action::SelectImage(path));
                }
            }
            if ui.button("Video").clicked() {
                if let Some(path) = FileDialog::new()
                    .add_filter("Videos", &["mp4", "avi", "mov", "gif"])
                    .pick_file()
                {
                    self.send(Action::SelectVideo(path));
                }
            }
            if ui.button("Realtime").clicked() {
                self.send(Action::SelectRealtime);
            }
            if ui.button("Exit").clicked() {
                self.send(Action::Exit);
            }
        });
    }

    fn realtime_controls(&self, ui: &mut egui::Ui) {
        let realtime = self.pipeline.mode() == Mode::Realtime;
        let active = self.pipeline.is_realtime_active();
        ui.group(|ui| {
            ui.label("Realtime control");
            ui.horizontal(|ui| {
                if ui.add_enabled(realtime && !active, Button::new("Start camera")).clicked() {
                    self.send(Action::StartRealtime);
                }
                if ui.add_enabled(realtime && active, Button::new("Stop camera")).clicked() {
                    self.send(Action::StopRealtime);
                }
            });
        });
    }
}

impl eframe::App for PoseViewerUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Apply queued actions, then run a tick if one is due ---
        self.pipeline.drain_actions(&self.action_rx);
        if self.pipeline.is_shut_down() && !self.timer.is_stopped() {
            info!("Exit requested.");
            self.timer.stop();
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let now = Instant::now();
        if self.timer.poll(now) {
            self.pipeline.tick();
            self.update_fps_counter();
        }
        self.sync_texture(ctx);

        // --- Define the UI ---
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.source_buttons(ui);
            self.realtime_controls(ui);
            if let Some(status) = self.pipeline.display().status() {
                ui.label(status);
            }
        });

        egui::TopBottomPanel::bottom("bottom_panel").resizable(false).show(ctx, |ui| {
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(format!("Tick FPS: {:.1}", self.last_calculated_fps));
                ui.add_space(10.0);
                ui.label(format!("Mode: {:?}", self.pipeline.mode()));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(labels) = self.pipeline.display().labels() {
                ui.columns(2, |columns| {
                    columns[0].vertical_centered(|ui| ui.label(&labels.original));
                    columns[1].vertical_centered(|ui| ui.label(&labels.annotated));
                });
            }

            match &self.texture {
                Some(texture) => {
                    let tex_size = texture.size_vec2();
                    let aspect_ratio = if tex_size.y > 0.0 { tex_size.x / tex_size.y } else { 1.0 };
                    let available_width = ui.available_width();
                    let available_height = ui.available_height();
                    let mut image_width = available_width;
                    let mut image_height = available_width / aspect_ratio;
                    if image_height > available_height {
                        image_height = available_height;
                        image_width = available_height * aspect_ratio;
                    }
                    ui.with_layout(Layout::top_down(Align::Center), |ui| {
                        ui.add(
                            egui::Image::new(texture)
                                .max_width(image_width)
                                .max_height(image_height)
                                .maintain_aspect_ratio(true),
                        );
                    });
                }
                None => {
                    ui.with_layout(Layout::top_down(Align::Center), |ui| {
                        ui.add_space(ui.available_height() / 3.0);
                        let hint = match self.pipeline.mode() {
                            Mode::Realtime if !self.pipeline.is_realtime_active() => "Camera is off.",
                            Mode::Realtime => "Waiting for camera...",
                            Mode::Image => "No image loaded.",
                            Mode::Video => "No video frame.",
                        };
                        ui.label(hint);
                    });
                }
            }
        });

        if let Some(wait) = self.timer.until_next(Instant::now()) {
            ctx.request_repaint_after(wait);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Exit requested. Releasing sources...");
        self.timer.stop();
        self.pipeline.shutdown();
    }
}
