//! Input relay
//!
//! Turns window events into calls on the module's input exports:
//!
//! - Keys map to logical axes through a [`Keymap`] and are forwarded as
//!   `onKeyDown(axis, pressed)` while the pointer is captured.
//! - Mouse deltas are forwarded as `onMouseMove(dx, dy)` while captured.
//! - A one-finger drag outside the joystick is forwarded as inverted
//!   `onMouseMove` deltas.
//! - The [`VirtualJoystick`] vector is read by the frame driver each frame.

mod joystick;
mod keymap;


use anyhow::Result;
use glam::Vec2;
use thiserror::Error;
use winit::event::{MouseButton, TouchPhase};
use winit::keyboard::KeyCode;

use crate::runtime::HostedModule;

pub use joystick::VirtualJoystick;
pub use keymap::{Axis, Keymap, key_from_name, key_name};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    #[error("unknown key name '{0}'")]
    UnknownKey(String),

    #[error("joystick radius must be positive, got {0}")]
    InvalidJoystickRadius(f32),

    #[error("joystick margin must not be negative, got {0}")]
    InvalidJoystickMargin(f32),
}

/// Exclusive pointer mode that yields relative mouse motion.
///
/// The motion listener is attached exactly when capture is gained and
/// detached exactly when it is lost.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PointerCapture {
    captured: bool,
    motion_listener: bool,
}

impl PointerCapture {
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Attached motion listeners: 1 while captured, 0 otherwise
    pub fn motion_listeners(&self) -> usize {
        usize::from(self.motion_listener)
    }

    fn gain(&mut self) {
        if !self.captured {
            self.captured = true;
            self.motion_listener = true;
            tracing::debug!("Pointer captured");
        }
    }

    fn lose(&mut self) {
        if self.captured {
            self.captured = false;
            self.motion_listener = false;
            tracing::debug!("Pointer released");
        }
    }
}

/// What the window should do with the cursor after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRequest {
    None,
    /// Grab and hide the cursor, then report back with [`InputRelay::capture_gained`]
    Capture,
    /// Ungrab and show the cursor
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchDrag {
    touch: u64,
    last: Vec2,
}

/// Routes window input to a [`HostedModule`]
#[derive(Debug)]
pub struct InputRelay {
    keymap: Keymap,
    capture: PointerCapture,
    joystick: VirtualJoystick,
    drag: Option<TouchDrag>,
}

impl InputRelay {
    pub fn new(keymap: Keymap, joystick: VirtualJoystick) -> Self {
        Self {
            keymap,
            capture: PointerCapture::default(),
            joystick,
            drag: None,
        }
    }

    pub fn capture(&self) -> &PointerCapture {
        &self.capture
    }

    pub fn joystick(&self) -> &VirtualJoystick {
        &self.joystick
    }

    /// Current joystick deflection for the frame driver
    pub fn joystick_vector(&self) -> Vec2 {
        self.joystick.vector()
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        tracing::trace!("Anchoring joystick for {}x{} surface", width, height);
        self.joystick.set_surface_height(height as f32);
    }

    /// A click on the surface asks for capture when not already held
    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) -> CursorRequest {
        if button == MouseButton::Left && pressed && !self.capture.is_captured() {
            CursorRequest::Capture
        } else {
            CursorRequest::None
        }
    }

    /// The window confirmed the cursor grab
    pub fn capture_gained(&mut self) {
        self.capture.gain();
    }

    /// The grab ended or could not be taken
    pub fn capture_lost(&mut self) {
        self.capture.lose();
    }

    /// Focus loss always ends capture
    pub fn on_focus_changed(&mut self, focused: bool) -> CursorRequest {
        if !focused && self.capture.is_captured() {
            self.capture.lose();
            return CursorRequest::Release;
        }
        CursorRequest::None
    }

    /// Forward a mapped key edge. Escape releases capture; repeats are dropped.
    pub fn on_key<M: HostedModule>(
        &mut self,
        module: &mut M,
        key: KeyCode,
        pressed: bool,
        repeat: bool,
    ) -> Result<CursorRequest> {
        if !self.capture.is_captured() {
            return Ok(CursorRequest::None);
        }
        if key == KeyCode::Escape && pressed {
            self.capture.lose();
            return Ok(CursorRequest::Release);
        }
        if repeat {
            return Ok(CursorRequest::None);
        }
        if let Some(axis) = self.keymap.axis(key) {
            module.on_key_down(axis.index(), pressed)?;
        }
        Ok(CursorRequest::None)
    }

    /// Relative motion while captured
    pub fn on_mouse_motion<M: HostedModule>(&mut self, module: &mut M, dx: f64, dy: f64) -> Result<()> {
        if self.capture.motion_listeners() == 0 {
            return Ok(());
        }
        module.on_mouse_move(dx as f32, dy as f32)
    }

    /// One touch event in surface pixel coordinates
    pub fn on_touch<M: HostedModule>(
        &mut self,
        module: &mut M,
        touch: u64,
        phase: TouchPhase,
        position: Vec2,
    ) -> Result<()> {
        match phase {
            TouchPhase::Started => {
                if !self.joystick.grab(touch, position) && self.drag.is_none() {
                    self.drag = Some(TouchDrag {
                        touch,
                        last: position,
                    });
                }
            }
            TouchPhase::Moved => {
                if self.joystick.drag(touch, position) {
                    return Ok(());
                }
                if let Some(drag) = &mut self.drag
                    && drag.touch == touch
                {
                    let delta = drag.last - position;
                    drag.last = position;
                    module.on_mouse_move(delta.x, delta.y)?;
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.joystick.release(touch) {
                    return Ok(());
                }
                if self.drag.is_some_and(|drag| drag.touch == touch) {
                    self.drag = None;
                }
            }
        }
        Ok(())
    }
}
