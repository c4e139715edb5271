//! Host runner
//!
//! Ties a loaded module to its frame driver and input relay. The windowing
//! layer forwards events here and calls [`HostRunner::frame`] on every
//! redraw.

use anyhow::{Context, Result};
use winit::event::{MouseButton, TouchPhase};
use winit::keyboard::KeyCode;

use crate::config::HostConfig;
use crate::fetch::{Location, fetch_bytes};
use crate::graphics::GraphicsContext;
use crate::input::{CursorRequest, InputRelay};
use crate::runtime::{FrameDriver, FrameOutcome, StopToken, SurfaceSize};
use crate::texture_loader::TextureLoader;
use crate::wasm::{HostState, ModuleInstance, WasmEngine};

/// Fetch module bytes from a path or http(s) URL
pub async fn fetch_module(location: &Location) -> Result<Vec<u8>> {
    let bytes = fetch_bytes(location)
        .await
        .with_context(|| format!("Failed to load module from {location}"))?;
    tracing::info!("Fetched module {} ({} bytes)", location, bytes.len());
    Ok(bytes)
}

/// Where relative texture sources resolve for a module loaded from `module`
pub fn asset_base(config: &HostConfig, module: &Location) -> Location {
    match &config.assets.root {
        Some(root) => Location::File(root.clone()),
        None => module.asset_base(),
    }
}

/// A running module with its driver and input routing.
///
/// Owns:
/// - The module instance (and through it the graphics context)
/// - The frame driver
/// - The input relay
pub struct HostRunner<G: GraphicsContext> {
    module: ModuleInstance<G>,
    driver: FrameDriver,
    input: InputRelay,
}

impl<G: GraphicsContext> HostRunner<G> {
    /// Compile and instantiate `bytes` against `graphics`
    ///
    /// # Errors
    /// Returns an error if the module fails to compile, imports an unknown
    /// function, lacks a required export, or the config is invalid.
    pub fn load(
        engine: &WasmEngine,
        bytes: &[u8],
        graphics: G,
        textures: TextureLoader,
        config: &HostConfig,
    ) -> Result<Self> {
        let module = engine.load_module(bytes)?;
        let linker = engine.bridge_linker()?;

        let mut state = HostState::new(graphics, textures);
        if let Some(base) = config.render.ping_pong_base() {
            state = state.with_ping_pong(base);
        }
        let module = ModuleInstance::new(engine, &module, &linker, state)?;

        if config.render.ping_pong && !module.reads_previous_frame() {
            tracing::warn!("Ping-pong enabled but the module's tick takes no previous-frame unit");
        }

        let joystick = config.input.joystick().context("Invalid joystick config")?;
        Ok(Self {
            module,
            driver: FrameDriver::new(config.input.joystick_sensitivity),
            input: InputRelay::new(config.input.keymap.clone(), joystick),
        })
    }

    pub fn module(&self) -> &ModuleInstance<G> {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut ModuleInstance<G> {
        &mut self.module
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn input(&self) -> &InputRelay {
        &self.input
    }

    /// A token that ends the frame loop
    pub fn stop_token(&self) -> StopToken {
        self.driver.stop_token()
    }

    /// Run one frame at the current surface size
    pub fn frame(&mut self, size: SurfaceSize) -> Result<FrameOutcome> {
        if self.driver.size() != Some(size) && !size.is_empty() {
            self.input.set_surface_size(size.width, size.height);
        }
        let joystick = self.input.joystick_vector();
        self.driver.frame(&mut self.module, size, joystick)
    }

    pub fn on_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) -> Result<CursorRequest> {
        self.input.on_key(&mut self.module, key, pressed, repeat)
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) -> CursorRequest {
        self.input.on_mouse_button(button, pressed)
    }

    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.input.on_mouse_motion(&mut self.module, dx, dy)
    }

    pub fn on_touch(&mut self, touch: u64, phase: TouchPhase, x: f64, y: f64) -> Result<()> {
        let position = glam::Vec2::new(x as f32, y as f32);
        self.input.on_touch(&mut self.module, touch, phase, position)
    }

    pub fn on_focus_changed(&mut self, focused: bool) -> CursorRequest {
        self.input.on_focus_changed(focused)
    }

    pub fn capture_gained(&mut self) {
        self.input.capture_gained();
    }

    pub fn capture_lost(&mut self) {
        self.input.capture_lost();
    }
}
