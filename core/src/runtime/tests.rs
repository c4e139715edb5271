//! Tests for the frame driver

use glam::Vec2;

use super::*;
use crate::test_utils::{ModuleCall, RecordingModule};

fn size(width: u32, height: u32) -> SurfaceSize {
    SurfaceSize::new(width, height)
}

#[test]
fn test_first_frames_resize_then_init_then_tick() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();

    for _ in 0..3 {
        let outcome = driver.frame(&mut module, size(800, 600), Vec2::ZERO).unwrap();
        assert_eq!(outcome, FrameOutcome::Rendered);
    }

    assert_eq!(
        module.calls,
        vec![
            ModuleCall::OnResize(800, 600),
            ModuleCall::Init(800, 600),
            ModuleCall::Tick(800, 600),
            ModuleCall::Tick(800, 600),
            ModuleCall::Tick(800, 600),
        ]
    );
    assert_eq!(driver.state(), DriverState::Running);
    assert_eq!(driver.frame_count(), 3);
}

#[test]
fn test_resize_calls_on_resize_exactly_once_before_next_tick() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();
    driver.frame(&mut module, size(800, 600), Vec2::ZERO).unwrap();
    module.calls.clear();

    driver.frame(&mut module, size(1024, 768), Vec2::ZERO).unwrap();
    driver.frame(&mut module, size(1024, 768), Vec2::ZERO).unwrap();

    assert_eq!(
        module.calls,
        vec![
            ModuleCall::OnResize(1024, 768),
            ModuleCall::Tick(1024, 768),
            ModuleCall::Tick(1024, 768),
        ]
    );
    assert_eq!(driver.size(), Some(size(1024, 768)));
}

#[test]
fn test_failed_resize_is_retried_before_next_tick() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();
    driver.frame(&mut module, size(800, 600), Vec2::ZERO).unwrap();
    module.calls.clear();

    module.failing_resizes = 1;
    assert!(driver.frame(&mut module, size(1024, 768), Vec2::ZERO).is_err());
    assert_eq!(driver.size(), Some(size(800, 600)));

    driver.frame(&mut module, size(1024, 768), Vec2::ZERO).unwrap();
    assert_eq!(
        module.calls,
        vec![
            ModuleCall::OnResize(1024, 768),
            ModuleCall::OnResize(1024, 768),
            ModuleCall::Tick(1024, 768),
        ]
    );
    assert_eq!(driver.size(), Some(size(1024, 768)));
}

#[test]
fn test_failed_first_resize_retries_before_init() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();

    module.failing_resizes = 1;
    assert!(driver.frame(&mut module, size(800, 600), Vec2::ZERO).is_err());
    assert_eq!(driver.state(), DriverState::Uninitialized);
    assert_eq!(driver.size(), None);

    driver.frame(&mut module, size(800, 600), Vec2::ZERO).unwrap();
    assert_eq!(
        module.calls,
        vec![
            ModuleCall::OnResize(800, 600),
            ModuleCall::OnResize(800, 600),
            ModuleCall::Init(800, 600),
            ModuleCall::Tick(800, 600),
        ]
    );
    assert_eq!(driver.state(), DriverState::Running);
}

#[test]
fn test_empty_surface_is_skipped() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();

    let outcome = driver.frame(&mut module, size(0, 600), Vec2::ZERO).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped);
    assert!(module.calls.is_empty());
    assert_eq!(driver.state(), DriverState::Uninitialized);

    // Minimizing while running keeps the last size
    driver.frame(&mut module, size(640, 480), Vec2::ZERO).unwrap();
    module.calls.clear();
    let outcome = driver.frame(&mut module, size(640, 0), Vec2::ZERO).unwrap();
    assert_eq!(outcome, FrameOutcome::Skipped);
    assert!(module.calls.is_empty());
    assert_eq!(driver.size(), Some(size(640, 480)));
}

#[test]
fn test_stop_token_stops_driver_for_good() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();
    let token = driver.stop_token();

    driver.frame(&mut module, size(320, 240), Vec2::ZERO).unwrap();
    token.stop();
    module.calls.clear();

    for _ in 0..2 {
        let outcome = driver.frame(&mut module, size(320, 240), Vec2::ZERO).unwrap();
        assert_eq!(outcome, FrameOutcome::Stopped);
    }
    assert!(module.calls.is_empty());
    assert_eq!(driver.state(), DriverState::Stopped);
}

#[test]
fn test_stop_before_first_frame_never_calls_module() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();
    driver.stop_token().stop();

    let outcome = driver.frame(&mut module, size(320, 240), Vec2::ZERO).unwrap();
    assert_eq!(outcome, FrameOutcome::Stopped);
    assert!(module.calls.is_empty());
}

#[test]
fn test_deflected_joystick_moves_camera_before_tick() {
    let mut driver = FrameDriver::new(0.5);
    let mut module = RecordingModule::new();
    driver.frame(&mut module, size(100, 100), Vec2::ZERO).unwrap();
    module.calls.clear();

    driver
        .frame(&mut module, size(100, 100), Vec2::new(1.0, -0.5))
        .unwrap();

    assert_eq!(
        module.calls,
        vec![
            ModuleCall::MoveCamera(-0.25, 0.5, 0.0),
            ModuleCall::Tick(100, 100),
        ]
    );
}

#[test]
fn test_centered_joystick_does_not_move_camera() {
    let mut driver = FrameDriver::default();
    let mut module = RecordingModule::new();
    driver.frame(&mut module, size(100, 100), Vec2::ZERO).unwrap();

    assert!(
        !module
            .calls
            .iter()
            .any(|call| matches!(call, ModuleCall::MoveCamera(..)))
    );
}
