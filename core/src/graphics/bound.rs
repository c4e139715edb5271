//! Currently bound objects of the rendering context
//!
//! GL keeps "current" program/framebuffer/texture state globally per
//! context. The host mirrors the parts it needs to restore or validate,
//! in terms of module handles. Host-owned objects (ping-pong targets, the
//! present program) show up as `None` since the module cannot name them.

use super::MAX_TEXTURE_UNITS;

/// Mirror of the context's binding state. Only the render thread writes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundState {
    program: Option<u32>,
    framebuffer: Option<u32>,
    active_unit: u32,
    textures: [Option<u32>; MAX_TEXTURE_UNITS as usize],
}

impl BoundState {
    pub fn new() -> Self {
        Self {
            program: None,
            framebuffer: None,
            active_unit: 0,
            textures: [None; MAX_TEXTURE_UNITS as usize],
        }
    }

    pub fn program(&self) -> Option<u32> {
        self.program
    }

    pub fn set_program(&mut self, program: Option<u32>) {
        self.program = program;
    }

    pub fn framebuffer(&self) -> Option<u32> {
        self.framebuffer
    }

    pub fn set_framebuffer(&mut self, framebuffer: Option<u32>) {
        self.framebuffer = framebuffer;
    }

    pub fn active_unit(&self) -> u32 {
        self.active_unit
    }

    pub fn set_active_unit(&mut self, unit: u32) {
        debug_assert!(unit < MAX_TEXTURE_UNITS);
        self.active_unit = unit;
    }

    /// Texture handle bound on `unit`
    pub fn texture_on(&self, unit: u32) -> Option<u32> {
        self.textures.get(unit as usize).copied().flatten()
    }

    /// Record `texture` as bound on the active unit
    pub fn set_texture(&mut self, texture: Option<u32>) {
        self.textures[self.active_unit as usize] = texture;
    }

    /// Forget every binding of a deleted texture (GL unbinds it too)
    pub fn forget_texture(&mut self, handle: u32) {
        for slot in self.textures.iter_mut() {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
    }

    /// Forget a deleted framebuffer if it is the bound one
    pub fn forget_framebuffer(&mut self, handle: u32) {
        if self.framebuffer == Some(handle) {
            self.framebuffer = None;
        }
    }
}

impl Default for BoundState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textures_are_tracked_per_unit() {
        let mut bound = BoundState::new();
        bound.set_texture(Some(4));
        bound.set_active_unit(3);
        bound.set_texture(Some(7));

        assert_eq!(bound.texture_on(0), Some(4));
        assert_eq!(bound.texture_on(3), Some(7));
        assert_eq!(bound.texture_on(1), None);
        assert_eq!(bound.texture_on(99), None);
    }

    #[test]
    fn test_forget_texture_clears_every_unit() {
        let mut bound = BoundState::new();
        bound.set_texture(Some(2));
        bound.set_active_unit(1);
        bound.set_texture(Some(2));
        bound.set_active_unit(2);
        bound.set_texture(Some(5));

        bound.forget_texture(2);

        assert_eq!(bound.texture_on(0), None);
        assert_eq!(bound.texture_on(1), None);
        assert_eq!(bound.texture_on(2), Some(5));
    }

    #[test]
    fn test_forget_framebuffer_only_clears_matching() {
        let mut bound = BoundState::new();
        bound.set_framebuffer(Some(1));
        bound.forget_framebuffer(0);
        assert_eq!(bound.framebuffer(), Some(1));
        bound.forget_framebuffer(1);
        assert_eq!(bound.framebuffer(), None);
    }
}
