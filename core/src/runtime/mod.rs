//! Frame driving
//!
//! [`FrameDriver`] owns the module's lifecycle: it sizes the surface,
//! calls `onResize` and `init` once, then calls `tick` on every display
//! refresh until its [`StopToken`] fires.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use glam::Vec2;

#[cfg(test)]
mod tests;

/// Camera movement per frame at full joystick deflection
pub const DEFAULT_CAMERA_SENSITIVITY: f32 = 0.04;

/// Entry points the host calls on a loaded module
pub trait HostedModule {
    /// One-time setup, after the first `on_resize`
    fn init(&mut self, width: u32, height: u32) -> Result<()>;

    fn on_resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Render one frame
    fn tick(&mut self, width: u32, height: u32) -> Result<()>;

    /// Logical axis `axis` went down (`pressed`) or up
    fn on_key_down(&mut self, axis: u32, pressed: bool) -> Result<()>;

    fn on_mouse_move(&mut self, dx: f32, dy: f32) -> Result<()>;

    fn move_camera(&mut self, pitch: f32, yaw: f32, roll: f32) -> Result<()>;
}

/// Drawing surface size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Minimized windows report a zero-area surface
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Lifecycle of the driven module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No surface size seen yet
    Uninitialized,
    /// Sized and told about it, `init` not yet run
    Sized,
    /// Ticking every frame
    Running,
    /// Cancelled; the module is never called again
    Stopped,
}

/// Cloneable handle that stops a [`FrameDriver`]
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What a call to [`FrameDriver::frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// `tick` ran
    Rendered,
    /// Zero-area surface; nothing was called
    Skipped,
    /// The driver is stopped
    Stopped,
}

/// Drives one module from surface measurements and joystick input
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    size: Option<SurfaceSize>,
    stop: StopToken,
    camera_sensitivity: f32,
    frames: u64,
}

impl FrameDriver {
    pub fn new(camera_sensitivity: f32) -> Self {
        Self {
            state: DriverState::Uninitialized,
            size: None,
            stop: StopToken::new(),
            camera_sensitivity,
            frames: 0,
        }
    }

    /// A token that stops this driver when fired
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Size last reported to the module
    pub fn size(&self) -> Option<SurfaceSize> {
        self.size
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Run one display refresh.
    ///
    /// `measured` is the current surface size, `joystick` the virtual
    /// joystick vector. An error from the module stops nothing by itself;
    /// the caller decides whether to fire the stop token.
    pub fn frame<M: HostedModule>(
        &mut self,
        module: &mut M,
        measured: SurfaceSize,
        joystick: Vec2,
    ) -> Result<FrameOutcome> {
        if self.state == DriverState::Stopped || self.stop.is_stopped() {
            if self.state != DriverState::Stopped {
                tracing::info!("Frame driver stopped after {} frames", self.frames);
            }
            self.state = DriverState::Stopped;
            return Ok(FrameOutcome::Stopped);
        }

        if measured.is_empty() {
            tracing::trace!("Skipping frame for empty surface");
            return Ok(FrameOutcome::Skipped);
        }

        // The size is committed only once `onResize` succeeds, so a failed
        // resize is retried on the next frame
        match self.state {
            DriverState::Uninitialized => {
                tracing::debug!("Initial surface size {}x{}", measured.width, measured.height);
                module.on_resize(measured.width, measured.height)?;
                self.size = Some(measured);
                self.state = DriverState::Sized;
            }
            DriverState::Sized | DriverState::Running if self.size != Some(measured) => {
                tracing::debug!("Surface resized to {}x{}", measured.width, measured.height);
                module.on_resize(measured.width, measured.height)?;
                self.size = Some(measured);
            }
            _ => {}
        }

        if self.state == DriverState::Sized {
            module.init(measured.width, measured.height)?;
            self.state = DriverState::Running;
        }

        if joystick != Vec2::ZERO {
            let s = self.camera_sensitivity;
            module.move_camera(joystick.y * s, joystick.x * s, 0.0)?;
        }

        module.tick(measured.width, measured.height)?;
        self.frames += 1;
        Ok(FrameOutcome::Rendered)
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DEFAULT_CAMERA_SENSITIVITY)
    }
}
