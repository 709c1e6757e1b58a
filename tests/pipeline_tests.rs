//! Mode transitions and per-tick behaviour of the pipeline


use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use image::Rgb;
use pose_cam_duo::{
    pipeline::{action_channel, Action, Mode},
    source::SourceKind,
};
use test_helpers::{
    frames, pipeline_with, plain_pipeline, solid_frame, Event, ScriptedProvider, ShoulderDetector, Step,
    CANVAS_H, CANVAS_W,
};

fn image_action() -> Action {
    Action::SelectImage(PathBuf::from("person.png"))
}

fn video_action() -> Action {
    Action::SelectVideo(PathBuf::from("walk.mp4"))
}

fn full_provider() -> ScriptedProvider {
    ScriptedProvider {
        image: Some(solid_frame(64, 48, 100)),
        video: Some(frames(vec![solid_frame(64, 48, 10), solid_frame(64, 48, 20), solid_frame(64, 48, 30)])),
        video_fps: 30.0,
        camera: Some(vec![Step::frame(solid_frame(64, 48, 200))]),
        ..Default::default()
    }
}

#[test]
fn test_starts_in_inactive_realtime() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    assert_eq!(pipeline.mode(), Mode::Realtime);
    assert!(!pipeline.is_realtime_active());

    pipeline.tick();
    assert!(pipeline.display().is_clear());
    assert_eq!(*provider.camera_open_attempts.borrow(), 0);
}

#[test]
fn test_each_selection_sets_mode_and_releases_previous_once() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);

    pipeline.handle(image_action());
    assert_eq!(pipeline.mode(), Mode::Image);
    assert_eq!(pipeline.active_source_kind(), Some(SourceKind::StaticImage));

    pipeline.handle(video_action());
    assert_eq!(pipeline.mode(), Mode::Video);
    assert_eq!(pipeline.active_source_kind(), Some(SourceKind::VideoStream));
    let image_probe = &provider.probes(SourceKind::StaticImage)[0];
    assert_eq!(image_probe.borrow().releases, 1);

    pipeline.handle(Action::SelectRealtime);
    assert_eq!(pipeline.mode(), Mode::Realtime);
    assert_eq!(pipeline.active_source_kind(), None);
    let video_probe = &provider.probes(SourceKind::VideoStream)[0];
    assert_eq!(video_probe.borrow().releases, 1);

    pipeline.handle(Action::StartRealtime);
    assert_eq!(pipeline.active_source_kind(), Some(SourceKind::LiveCamera));
    pipeline.handle(image_action());
    let camera_probe = &provider.probes(SourceKind::LiveCamera)[0];
    assert_eq!(camera_probe.borrow().releases, 1);
    assert!(!pipeline.is_realtime_active());

    // Nothing was released twice along the way
    assert_eq!(image_probe.borrow().releases, 1);
    assert_eq!(video_probe.borrow().releases, 1);
}

#[test]
fn test_previous_source_is_released_before_next_opens() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);
    pipeline.handle(image_action());
    pipeline.handle(video_action());
    pipeline.handle(image_action());

    assert_eq!(
        provider.events(),
        vec![
            Event::Opened(SourceKind::LiveCamera),
            Event::Released(SourceKind::LiveCamera),
            Event::Opened(SourceKind::StaticImage),
            Event::Released(SourceKind::StaticImage),
            Event::Opened(SourceKind::VideoStream),
            Event::Released(SourceKind::VideoStream),
            Event::Opened(SourceKind::StaticImage),
        ]
    );
}

#[test]
fn test_release_precedes_failed_open() {
    let provider = ScriptedProvider { image: Some(solid_frame(64, 48, 100)), ..Default::default() };
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(image_action());
    pipeline.handle(video_action());

    assert_eq!(
        provider.events(),
        vec![
            Event::Opened(SourceKind::StaticImage),
            Event::Released(SourceKind::StaticImage),
            Event::Opened(SourceKind::VideoStream),
        ]
    );
    assert_eq!(pipeline.mode(), Mode::Video);
}

#[test]
fn test_reselecting_image_replaces_source() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(image_action());
    pipeline.handle(image_action());

    let probes = provider.probes(SourceKind::StaticImage);
    assert_eq!(probes.len(), 2);
    assert_eq!(probes[0].borrow().releases, 1);
    assert_eq!(probes[1].borrow().releases, 0);
}

#[test]
fn test_image_mode_ticks_are_pixel_identical() {
    let provider = full_provider();
    let mut pipeline = pipeline_with(&provider, Box::new(ShoulderDetector));
    pipeline.handle(image_action());

    pipeline.tick();
    let first = pipeline.display().canvas().cloned().expect("canvas after first tick");
    for _ in 0..5 {
        pipeline.tick();
        assert_eq!(pipeline.display().canvas(), Some(&first));
    }
    assert_eq!(pipeline.display().status(), Some("Image: person.png"));
    assert!(pipeline.display().labels().is_some());
}

#[test]
fn test_image_mode_layout_is_dual_pane() {
    let provider = full_provider();
    let mut pipeline = pipeline_with(&provider, Box::new(ShoulderDetector));
    pipeline.handle(image_action());
    pipeline.tick();

    let canvas = pipeline.display().canvas().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (CANVAS_W, CANVAS_H));
    // 128x48 pair into 128x96: band from y=24 to y=72
    assert_eq!(canvas.image().get_pixel(64, 5), &Rgb([0, 0, 0]));
    assert_eq!(canvas.image().get_pixel(64, 90), &Rgb([0, 0, 0]));
    // Left pane keeps the original; right pane carries the overlay
    let row = 48;
    assert_eq!(canvas.image().get_pixel(32, row), &Rgb([100, 100, 100]));
    assert_ne!(canvas.image().get_pixel(96, row), &Rgb([100, 100, 100]));
}

#[test]
fn test_failed_image_load_enters_image_mode_with_blank_display() {
    let provider = ScriptedProvider::default();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(image_action());
    assert_eq!(pipeline.mode(), Mode::Image);
    assert_eq!(pipeline.active_source_kind(), None);

    pipeline.tick();
    assert!(pipeline.display().is_clear());
}

#[test]
fn test_video_loops_after_end_of_stream() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(video_action());

    let mut canvases = Vec::new();
    for _ in 0..4 {
        pipeline.tick();
        canvases.push(pipeline.display().canvas().cloned().expect("video frame"));
    }
    assert_ne!(canvases[0], canvases[1]);
    assert_ne!(canvases[1], canvases[2]);
    // Fourth read wraps to frame 0
    assert_eq!(canvases[3], canvases[0]);

    let probe = &provider.probes(SourceKind::VideoStream)[0];
    assert_eq!(probe.borrow().seeks, 1);
}

#[test]
fn test_video_status_line_shows_metadata() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(video_action());
    pipeline.tick();

    assert_eq!(
        pipeline.display().status(),
        Some("Video: walk.mp4 | Duration: 0.10s | Resolution: 64x48 | FPS: 30 | Frames: 3")
    );
    assert_eq!(pipeline.video_metadata().map(|m| m.frame_count), Some(3));
}

#[test]
fn test_empty_video_clears_display_after_retry() {
    let provider = ScriptedProvider { video: Some(Vec::new()), ..Default::default() };
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(video_action());
    pipeline.tick();

    assert!(pipeline.display().is_clear());
    let probe = &provider.probes(SourceKind::VideoStream)[0];
    assert_eq!(probe.borrow().seeks, 1);
    assert_eq!(probe.borrow().reads, 2);
}

#[test]
fn test_video_read_error_restarts_once() {
    let provider = ScriptedProvider {
        video: Some(vec![Step::Fail, Step::frame(solid_frame(64, 48, 10)), Step::frame(solid_frame(64, 48, 20))]),
        video_fps: 30.0,
        ..Default::default()
    };
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(video_action());
    pipeline.tick();

    assert!(pipeline.display().canvas().is_some());
    let probe = &provider.probes(SourceKind::VideoStream)[0];
    assert_eq!(probe.borrow().seeks, 1);
    assert_eq!(probe.borrow().reads, 2);
    assert_eq!(probe.borrow().releases, 0);
}

#[test]
fn test_video_captions_differ_from_image_captions() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);

    pipeline.handle(video_action());
    pipeline.tick();
    let video = pipeline.display().labels().cloned().expect("video captions");

    pipeline.handle(image_action());
    pipeline.tick();
    let image = pipeline.display().labels().cloned().expect("image captions");

    assert_eq!(video.original, "Original video");
    assert_eq!(image.original, "Original image");
    assert_eq!(video.annotated, image.annotated);
}

#[test]
fn test_stop_realtime_in_video_mode_is_noop() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(video_action());
    pipeline.tick();
    let generation = pipeline.display().generation();
    let canvas = pipeline.display().canvas().cloned();

    pipeline.handle(Action::StopRealtime);
    assert_eq!(pipeline.mode(), Mode::Video);
    assert_eq!(pipeline.display().generation(), generation);
    assert_eq!(pipeline.display().canvas().cloned(), canvas);

    let probe = &provider.probes(SourceKind::VideoStream)[0];
    assert_eq!(probe.borrow().releases, 0);
    assert_eq!(*provider.camera_open_attempts.borrow(), 0);

    // Playback carries on from frame 1
    pipeline.tick();
    assert_eq!(probe.borrow().reads, 2);
}

#[test]
fn test_start_realtime_outside_realtime_is_noop() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(image_action());
    pipeline.handle(Action::StartRealtime);
    assert!(!pipeline.is_realtime_active());
    assert_eq!(*provider.camera_open_attempts.borrow(), 0);
}

#[test]
fn test_realtime_requires_explicit_start() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::SelectRealtime);
    pipeline.tick();
    assert!(pipeline.display().is_clear());

    pipeline.handle(Action::StartRealtime);
    assert!(pipeline.is_realtime_active());
    pipeline.handle(Action::StartRealtime);
    assert_eq!(*provider.camera_open_attempts.borrow(), 1);

    pipeline.tick();
    let canvas = pipeline.display().canvas().expect("camera frame");
    assert_eq!((canvas.width(), canvas.height()), (CANVAS_W, CANVAS_H));
    assert!(pipeline.display().status().is_none());
    assert!(pipeline.display().labels().is_none());
}

#[test]
fn test_stop_realtime_releases_camera_and_clears() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);
    pipeline.tick();
    assert!(pipeline.display().canvas().is_some());

    pipeline.handle(Action::StopRealtime);
    assert!(!pipeline.is_realtime_active());
    assert!(pipeline.display().is_clear());
    let probe = &provider.probes(SourceKind::LiveCamera)[0];
    assert_eq!(probe.borrow().releases, 1);

    // Second stop does nothing
    pipeline.handle(Action::StopRealtime);
    assert_eq!(probe.borrow().releases, 1);

    pipeline.tick();
    assert!(pipeline.display().is_clear());
}

#[test]
fn test_realtime_is_single_pane_while_image_is_dual_pane() {
    let provider = ScriptedProvider {
        image: Some(solid_frame(64, 48, 100)),
        camera: Some(vec![Step::frame(solid_frame(64, 48, 100))]),
        ..Default::default()
    };
    let mut pipeline = pipeline_with(&provider, Box::new(ShoulderDetector));

    pipeline.handle(Action::StartRealtime);
    pipeline.tick();
    let realtime = pipeline.display().canvas().cloned().unwrap();

    pipeline.handle(image_action());
    pipeline.tick();
    let dual = pipeline.display().canvas().cloned().unwrap();

    assert_ne!(realtime, dual);
    // The camera frame fills the whole canvas, no letterbox bars
    assert_eq!(realtime.image().get_pixel(64, 5), &Rgb([100, 100, 100]));
    assert_eq!(dual.image().get_pixel(64, 5), &Rgb([0, 0, 0]));
    // One shoulder line across the middle of the full canvas
    assert_ne!(realtime.image().get_pixel(64, 48), &Rgb([100, 100, 100]));
    assert_eq!(realtime.image().get_pixel(10, 48), &Rgb([100, 100, 100]));
}

#[test]
fn test_camera_without_frame_clears_display() {
    let provider = ScriptedProvider { camera: Some(vec![Step::end()]), ..Default::default() };
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);
    for _ in 0..3 {
        pipeline.tick();
        assert!(pipeline.display().is_clear());
    }
    assert!(pipeline.is_realtime_active());
}

#[test]
fn test_camera_read_error_clears_then_recovers() {
    let provider = ScriptedProvider {
        camera: Some(vec![Step::Fail, Step::frame(solid_frame(64, 48, 80))]),
        ..Default::default()
    };
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);

    pipeline.tick();
    assert!(pipeline.display().is_clear());
    assert!(pipeline.is_realtime_active());
    assert_eq!(pipeline.active_source_kind(), Some(SourceKind::LiveCamera));

    pipeline.tick();
    assert!(pipeline.display().canvas().is_some());
    let probe = &provider.probes(SourceKind::LiveCamera)[0];
    assert_eq!(probe.borrow().releases, 0);
    assert_eq!(*provider.camera_open_attempts.borrow(), 1);
}

#[test]
fn test_camera_reopen_is_paced_by_retry_interval() {
    let provider = ScriptedProvider::default();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);
    assert!(pipeline.is_realtime_active());
    assert_eq!(*provider.camera_open_attempts.borrow(), 1);

    let start = Instant::now();
    pipeline.tick_at(start);
    pipeline.tick_at(start + Duration::from_millis(30));
    assert!(pipeline.display().is_clear());

    pipeline.tick_at(start + Duration::from_secs(2));
    assert_eq!(*provider.camera_open_attempts.borrow(), 2);
}

#[test]
fn test_malformed_frame_skips_tick_and_recovers() {
    let provider = ScriptedProvider {
        camera: Some(vec![
            Step::frame(solid_frame(0, 0, 0)),
            Step::frame(solid_frame(64, 48, 50)),
        ]),
        ..Default::default()
    };
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);

    pipeline.tick();
    assert!(pipeline.display().is_clear());
    pipeline.tick();
    assert!(pipeline.display().canvas().is_some());
}

#[test]
fn test_exit_releases_everything_and_stops_ticking() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(video_action());
    pipeline.tick();

    pipeline.handle(Action::Exit);
    assert!(pipeline.is_shut_down());
    assert!(pipeline.display().is_clear());
    assert_eq!(provider.total_releases(), 1);

    pipeline.handle(image_action());
    pipeline.tick();
    assert!(pipeline.display().is_clear());
    assert!(provider.probes(SourceKind::StaticImage).is_empty());

    drop(pipeline);
    assert_eq!(provider.total_releases(), 1);
}

#[test]
fn test_drop_releases_open_camera() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    pipeline.handle(Action::StartRealtime);
    drop(pipeline);

    let probe = &provider.probes(SourceKind::LiveCamera)[0];
    assert_eq!(probe.borrow().releases, 1);
}

#[test]
fn test_queued_actions_apply_in_order() {
    let provider = full_provider();
    let mut pipeline = plain_pipeline(&provider);
    let (tx, rx) = action_channel();

    tx.send(image_action()).unwrap();
    tx.send(video_action()).unwrap();
    tx.send(Action::SelectRealtime).unwrap();
    tx.send(Action::StartRealtime).unwrap();

    assert_eq!(pipeline.drain_actions(&rx), 4);
    assert_eq!(pipeline.mode(), Mode::Realtime);
    assert!(pipeline.is_realtime_active());
    assert_eq!(pipeline.drain_actions(&rx), 0);
}
