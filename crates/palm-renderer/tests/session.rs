mod common;

use std::f32::consts::FRAC_PI_4;

use glam::{Mat4, Vec3};
use palm_renderer::{
    backend::recording::{Command, RecordingBackend},
    palm_asset::AssetError,
    FrameDriver, FrameOutcome, Lifecycle, RenderError, RenderSession, SessionConfig,
};
use pollster::FutureExt;
use wgpu::{Color, IndexFormat};

use common::{
    memory_source, palm_fixture, read_matrices, texture, CountingScheduler, DetachingSource,
};

fn load(
    end_time: f32,
    backend: &mut RecordingBackend,
) -> RenderSession<RecordingBackend> {
    let source = memory_source(palm_fixture(end_time, true));
    RenderSession::load(&source, backend, &SessionConfig::default(), Lifecycle::new())
        .block_on()
        .unwrap()
}

fn bones(backend: &RecordingBackend) -> Vec<Mat4> {
    read_matrices(backend.buffer("Bone matrix buffer").unwrap())
}

/// Root joint at `angle`: its global transform times its inverse bind, so
/// the palm turns about the joint at y = 1.
fn root_bone(angle: f32) -> Mat4 {
    let global = Mat4::from_translation(Vec3::Y) * Mat4::from_rotation_z(angle);
    global * Mat4::from_translation(Vec3::NEG_Y)
}

#[test]
fn test_half_way_rotation_reaches_bones() {
    let mut backend = RecordingBackend::new();
    let mut session = load(1.0, &mut backend);
    assert_eq!(session.duration(), 1.0);

    let scheduler = CountingScheduler::default();
    let mut driver = FrameDriver::new(120);
    let outcome = driver
        .on_frame(&mut session, &mut backend, &scheduler, 500.0)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Drawn { time: 0.5 });
    assert_eq!(scheduler.requests(), 1);

    let bones = bones(&backend);
    assert_eq!(bones.len(), 2);
    assert!(bones[0].abs_diff_eq(root_bone(FRAC_PI_4), 1e-5));
    assert!(!bones[0].abs_diff_eq(Mat4::from_rotation_z(FRAC_PI_4), 1e-3));
    assert!(bones[0]
        .transform_point3(Vec3::Y)
        .abs_diff_eq(Vec3::Y, 1e-5));
    assert!(bones[1].abs_diff_eq(Mat4::IDENTITY, 1e-6));

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    let Command::Submit {
        index_format,
        index_count,
        clear_color,
        ..
    } = submissions[0]
    else {
        unreachable!();
    };
    assert_eq!(*index_format, IndexFormat::Uint16);
    assert_eq!(*index_count, 3);
    assert_eq!(*clear_color, Color::TRANSPARENT);
}

#[test]
fn test_frame_uniform_centers_model() {
    let mut backend = RecordingBackend::new();
    let mut session = load(1.0, &mut backend);
    assert_eq!(session.normalization().center, Vec3::new(0.5, 1.0, 0.0));
    assert_eq!(session.normalization().scale, 1.0);

    session.render_frame(&mut backend, 0.0).unwrap();
    let uniform = read_matrices(backend.buffer("Frame uniform buffer").unwrap());
    assert_eq!(
        uniform[0],
        Mat4::from_translation(Vec3::new(-0.5, -1.0, 0.0))
    );
    assert_eq!(
        uniform[1],
        Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, -5.0, 5.0)
    );
}

#[test]
fn test_timestamp_wraps_around_duration() {
    let mut backend = RecordingBackend::new();
    let mut session = load(2.0, &mut backend);
    let scheduler = CountingScheduler::default();
    let mut driver = FrameDriver::new(120);

    let outcome = driver
        .on_frame(&mut session, &mut backend, &scheduler, 3000.0)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Drawn { time: 1.0 });
    assert!(bones(&backend)[0].abs_diff_eq(root_bone(FRAC_PI_4), 1e-5));

    driver
        .on_frame(&mut session, &mut backend, &scheduler, 750.0)
        .unwrap();
    let first = bones(&backend);
    driver
        .on_frame(&mut session, &mut backend, &scheduler, 2750.0)
        .unwrap();
    assert_eq!(bones(&backend), first);
}

#[test]
fn test_missing_joints_creates_nothing() {
    let mut backend = RecordingBackend::new();
    let source = memory_source(palm_fixture(1.0, false));
    let result = RenderSession::load(
        &source,
        &mut backend,
        &SessionConfig::default(),
        Lifecycle::new(),
    )
    .block_on();
    assert!(matches!(
        result,
        Err(RenderError::MalformedAsset(AssetError::MissingAttribute(
            "JOINTS_0"
        )))
    ));
    assert_eq!(backend.created_resources(), 0);
    assert!(backend.commands().is_empty());
}

#[test]
fn test_missing_payload_is_a_source_error() {
    let mut backend = RecordingBackend::new();
    let fixture = palm_fixture(1.0, true);
    let source =
        palm_renderer::palm_asset::source::MemorySource::new(fixture.document, texture());
    let result = RenderSession::load(
        &source,
        &mut backend,
        &SessionConfig::default(),
        Lifecycle::new(),
    )
    .block_on();
    assert!(matches!(result, Err(RenderError::AssetSource(_))));
    assert_eq!(backend.created_resources(), 0);
}

#[test]
fn test_detach_during_load() {
    let mut backend = RecordingBackend::new();
    let lifecycle = Lifecycle::new();
    let source = DetachingSource {
        inner: memory_source(palm_fixture(1.0, true)),
        lifecycle: lifecycle.clone(),
    };
    let result = RenderSession::load(
        &source,
        &mut backend,
        &SessionConfig::default(),
        lifecycle.clone(),
    )
    .block_on();
    assert!(matches!(result, Err(RenderError::Detached)));
    assert!(lifecycle.is_detached());
    assert_eq!(backend.created_resources(), 0);
}

#[test]
fn test_detached_session_suppresses_frames() {
    let mut backend = RecordingBackend::new();
    let mut session = load(1.0, &mut backend);
    backend.clear_commands();

    let scheduler = CountingScheduler::default();
    let mut driver = FrameDriver::new(120);
    session.lifecycle().clone().detach();
    let outcome = driver
        .on_frame(&mut session, &mut backend, &scheduler, 16.0)
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Suppressed);
    assert!(backend.commands().is_empty());
    assert_eq!(scheduler.requests(), 0);
}

#[test]
fn test_persistent_failures_halt_driver() {
    let mut backend = RecordingBackend::new();
    let mut session = load(1.0, &mut backend);
    let scheduler = CountingScheduler::default();
    let mut driver = FrameDriver::new(3);
    backend.fail_writes(usize::MAX);

    for frame in 0..2 {
        let outcome = driver
            .on_frame(&mut session, &mut backend, &scheduler, frame as f64 * 16.0)
            .unwrap();
        assert!(matches!(outcome, FrameOutcome::Skipped { .. }));
    }
    assert!(matches!(
        driver.on_frame(&mut session, &mut backend, &scheduler, 48.0),
        Err(RenderError::FrameWriteFailure(_))
    ));
    assert!(driver.is_halted());
    assert_eq!(scheduler.requests(), 2);

    backend.fail_writes(0);
    assert_eq!(
        driver
            .on_frame(&mut session, &mut backend, &scheduler, 64.0)
            .unwrap(),
        FrameOutcome::Suppressed
    );
    assert!(backend.submissions().is_empty());
}

#[test]
fn test_transient_failure_skips_one_frame() {
    let mut backend = RecordingBackend::new();
    let mut session = load(1.0, &mut backend);
    let scheduler = CountingScheduler::default();
    let mut driver = FrameDriver::new(120);
    backend.fail_submits(1);

    assert_eq!(
        driver
            .on_frame(&mut session, &mut backend, &scheduler, 250.0)
            .unwrap(),
        FrameOutcome::Skipped { time: 0.25 }
    );
    assert_eq!(driver.consecutive_failures(), 1);
    assert_eq!(
        driver
            .on_frame(&mut session, &mut backend, &scheduler, 500.0)
            .unwrap(),
        FrameOutcome::Drawn { time: 0.5 }
    );
    assert_eq!(driver.consecutive_failures(), 0);
    assert_eq!(scheduler.requests(), 2);
    assert_eq!(backend.submissions().len(), 1);
}

#[test]
fn test_resources_are_created_once() {
    let mut backend = RecordingBackend::new();
    let mut session = load(1.0, &mut backend);
    // 5 vertex and index buffers, uniforms, bones, texture, sampler,
    // pipeline and bind group.
    assert_eq!(backend.created_resources(), 11);
    assert!(backend.commands().iter().any(|command| matches!(
        command,
        Command::CreateBuffer { label, size: 128, .. } if label == "Frame uniform buffer"
    )));

    for frame in 0..5 {
        session
            .render_frame(&mut backend, frame as f32 * 0.1)
            .unwrap();
    }
    assert_eq!(backend.created_resources(), 11);
    assert_eq!(backend.writes(), 10);
}
