//! On-screen virtual joystick for touch input
//!
//! The outer circle sits in the bottom-left corner of the surface. A touch
//! that starts inside it grabs the handle; the handle follows the finger
//! but never leaves the circle.

use glam::Vec2;

use super::InputError;

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualJoystick {
    radius: f32,
    margin: f32,
    center: Vec2,
    /// Handle position relative to `center`
    offset: Vec2,
    touch: Option<u64>,
}

impl VirtualJoystick {
    /// Joystick with outer radius `radius`, `margin` pixels from the
    /// bottom-left corner
    pub fn new(radius: f32, margin: f32) -> Result<Self, InputError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(InputError::InvalidJoystickRadius(radius));
        }
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(InputError::InvalidJoystickMargin(margin));
        }
        Ok(Self {
            radius,
            margin,
            center: Vec2::splat(margin + radius),
            offset: Vec2::ZERO,
            touch: None,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Re-anchor to the bottom-left corner of a surface this tall
    pub fn set_surface_height(&mut self, height: f32) {
        self.center = Vec2::new(self.margin + self.radius, height - self.margin - self.radius);
    }

    /// Whether `position` lies inside the outer circle
    pub fn contains(&self, position: Vec2) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn is_grabbed(&self) -> bool {
        self.touch.is_some()
    }

    /// Whether `touch` is the finger holding the handle
    pub fn is_held_by(&self, touch: u64) -> bool {
        self.touch == Some(touch)
    }

    /// Start dragging if `position` is inside and no finger holds the handle
    pub fn grab(&mut self, touch: u64, position: Vec2) -> bool {
        if self.touch.is_some() || !self.contains(position) {
            return false;
        }
        self.touch = Some(touch);
        self.drag_to(position);
        true
    }

    /// Move the handle toward `position`, clamped to the outer circle
    pub fn drag(&mut self, touch: u64, position: Vec2) -> bool {
        if !self.is_held_by(touch) {
            return false;
        }
        self.drag_to(position);
        true
    }

    /// Let go and recenter
    pub fn release(&mut self, touch: u64) -> bool {
        if !self.is_held_by(touch) {
            return false;
        }
        self.touch = None;
        self.offset = Vec2::ZERO;
        true
    }

    fn drag_to(&mut self, position: Vec2) {
        self.offset = (position - self.center).clamp_length_max(self.radius);
    }

    /// Handle position in surface coordinates
    pub fn handle_position(&self) -> Vec2 {
        self.center + self.offset
    }

    /// Deflection in `[-1, 1]²`, y pointing up, magnitude at most 1
    pub fn vector(&self) -> Vec2 {
        let v = Vec2::new(self.offset.x, -self.offset.y) / self.radius;
        // Rounding can push a clamped offset a hair past the rim
        v.clamp_length_max(1.0)
    }
}
