//! Host state
//!
//! Everything the bridge functions touch lives here, inside the wasmtime
//! `Store`: the module's memory, the graphics context, the handle tables,
//! the binding tracker, the texture loader and the ping-pong targets.

use wasmtime::Memory;

use crate::graphics::{BoundState, GraphicsContext, GraphicsError, PingPong};
use crate::registry::ResourceRegistry;
use crate::texture_loader::{TextureLoad, TextureLoader};

/// Host state for one rendering context and one module instance
pub struct HostState<G: GraphicsContext> {
    /// WASM linear memory (set after instantiation)
    pub memory: Option<Memory>,

    /// The rendering context all bridge calls act on
    pub graphics: G,

    /// Handle tables for module-visible objects
    pub registry: ResourceRegistry<G>,

    /// Mirror of the context's current bindings
    pub bound: BoundState,

    /// Pending `bindAndCreateTexture` loads
    pub textures: TextureLoader,

    /// First of the two units reserved for ping-pong, when enabled
    ping_pong_base: Option<u32>,

    /// Created on the first surface resize
    ping_pong: Option<PingPong<G>>,

    surface: (u32, u32),
}

impl<G: GraphicsContext> HostState<G> {
    pub fn new(graphics: G, textures: TextureLoader) -> Self {
        Self {
            memory: None,
            graphics,
            registry: ResourceRegistry::new(),
            bound: BoundState::new(),
            textures,
            ping_pong_base: None,
            ping_pong: None,
            surface: (0, 0),
        }
    }

    /// Render through ping-pong targets on units `base_unit` and `base_unit + 1`
    pub fn with_ping_pong(mut self, base_unit: u32) -> Self {
        self.ping_pong_base = Some(base_unit);
        self
    }

    pub fn ping_pong(&self) -> Option<&PingPong<G>> {
        self.ping_pong.as_ref()
    }

    /// Current drawing surface size
    pub fn surface(&self) -> (u32, u32) {
        self.surface
    }

    /// Whether the module may not bind or load textures on `unit`
    pub fn is_reserved_unit(&self, unit: u32) -> bool {
        self.ping_pong_base
            .is_some_and(|base| unit.checked_sub(base).is_some_and(|offset| offset <= 1))
    }

    /// Unit holding last frame's image, when ping-pong is active
    pub fn previous_frame_unit(&self) -> Option<u32> {
        self.ping_pong.as_ref().map(|pp| pp.other().unit)
    }

    /// Apply a new drawing surface size: ping-pong targets and viewport.
    ///
    /// On failure the previous size stays current.
    pub fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if let Some(base) = self.ping_pong_base {
            let resized = match self.ping_pong.as_mut() {
                Some(pp) => pp.resize(&mut self.graphics, width, height),
                None => PingPong::new(&mut self.graphics, base, width, height)
                    .map(|pp| self.ping_pong = Some(pp)),
            };

            // Target creation switched units and left the default framebuffer bound
            self.graphics.active_texture(self.bound.active_unit());
            self.bound.set_framebuffer(None);
            resized?;
        }

        self.surface = (width, height);
        self.graphics.viewport(width, height);
        Ok(())
    }

    /// Work done before the module's `tick`
    pub fn begin_frame(&mut self) {
        self.apply_finished_textures();

        if let Some(pp) = &self.ping_pong {
            pp.begin_frame(&mut self.graphics);
            self.bound.set_framebuffer(None);
        }
    }

    /// Work done after the module's `tick`
    pub fn end_frame(&mut self) {
        let (width, height) = self.surface;
        if let Some(pp) = &mut self.ping_pong {
            pp.present(&mut self.graphics, width, height);
            self.bound.set_framebuffer(None);

            // The present pass switched programs behind the module's back
            let program = self
                .bound
                .program()
                .and_then(|handle| self.registry.programs.get(handle).ok());
            self.graphics.use_program(program);
        }
    }

    /// Upload every finished image load whose texture still exists.
    ///
    /// Returns the number of textures populated.
    pub fn apply_finished_textures(&mut self) -> usize {
        let mut applied = 0;
        for TextureLoad { request, result } in self.textures.drain() {
            let image = match result {
                Ok(image) => image,
                Err(e) => {
                    tracing::error!(
                        "Failed to load texture '{}' for handle {}: {}",
                        request.source,
                        request.handle,
                        e
                    );
                    continue;
                }
            };

            let texture = match self.registry.textures.get(request.handle) {
                Ok(texture) => texture,
                Err(e) => {
                    tracing::warn!("Dropping loaded image '{}': {}", request.source, e);
                    continue;
                }
            };

            let previous_unit = self.bound.active_unit();
            self.graphics.active_texture(request.unit);
            self.graphics.bind_texture(Some(texture));
            self.graphics.upload_texture_image(&image);

            let restore = self
                .bound
                .texture_on(request.unit)
                .and_then(|handle| self.registry.textures.get(handle).ok());
            self.graphics.bind_texture(restore);
            self.graphics.active_texture(previous_unit);

            tracing::debug!(
                "Texture {} populated from '{}' ({}x{})",
                request.handle,
                request.source,
                image.width,
                image.height
            );
            applied += 1;
        }
        applied
    }
}

impl<G: GraphicsContext> Drop for HostState<G> {
    fn drop(&mut self) {
        if let Some(pp) = self.ping_pong.take() {
            pp.destroy(&mut self.graphics);
        }
    }
}
