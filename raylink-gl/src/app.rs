//! winit application: window events in, frames out
//!
//! Frames are driven from `RedrawRequested`; the next redraw is requested
//! only after the current frame has been presented and swapped.

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use raylink_core::{
    CursorRequest, FrameOutcome, HostConfig, HostRunner, Location, SurfaceSize, TextureLoader,
    WasmEngine, asset_base,
};

use crate::glow_backend::GlowGraphics;
use crate::surface::GlSurface;

/// Everything needed to start a module once the window exists
pub struct LaunchConfig {
    pub config: HostConfig,
    pub module: Location,
    pub module_bytes: Vec<u8>,
    pub runtime: tokio::runtime::Handle,
}

/// Application state across the event loop
pub struct RaylinkApp {
    launch: LaunchConfig,
    engine: WasmEngine,
    // Runner first: GL objects are released while the context is alive
    runner: Option<HostRunner<GlowGraphics>>,
    surface: Option<GlSurface>,
    /// The error that ended the run, if any
    error: Option<anyhow::Error>,
}

impl RaylinkApp {
    pub fn new(launch: LaunchConfig) -> Result<Self> {
        Ok(Self {
            launch,
            engine: WasmEngine::new()?,
            runner: None,
            surface: None,
            error: None,
        })
    }

    /// Take the error that ended the run
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = &self.launch.config.window;
        let attributes = Window::default_attributes()
            .with_title(window.title.clone())
            .with_inner_size(LogicalSize::new(window.width, window.height));

        let (surface, gl) = GlSurface::create(event_loop, attributes, window.vsync)?;
        let graphics = GlowGraphics::new(gl).context("Failed to set up the full-screen quad")?;

        let base = asset_base(&self.launch.config, &self.launch.module);
        tracing::info!("Resolving textures against {}", base);
        let textures = TextureLoader::new(self.launch.runtime.clone(), base);

        let runner = HostRunner::load(
            &self.engine,
            &self.launch.module_bytes,
            graphics,
            textures,
            &self.launch.config,
        )
        .with_context(|| format!("Failed to start module {}", self.launch.module))?;

        surface.window().request_redraw();
        self.surface = Some(surface);
        self.runner = Some(runner);
        Ok(())
    }

    /// Record a fatal error and leave the event loop
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{:#}", error);
        if let Some(runner) = &self.runner {
            runner.stop_token().stop();
        }
        if self.error.is_none() {
            self.error = Some(error);
        }
        event_loop.exit();
    }

    fn apply_cursor(&mut self, request: CursorRequest) {
        let (Some(surface), Some(runner)) = (&self.surface, &mut self.runner) else {
            return;
        };
        let window = surface.window();
        match request {
            CursorRequest::None => {}
            CursorRequest::Capture => {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                match grabbed {
                    Ok(()) => {
                        window.set_cursor_visible(false);
                        runner.capture_gained();
                    }
                    Err(e) => {
                        tracing::warn!("Pointer capture refused: {}", e);
                        runner.capture_lost();
                    }
                }
            }
            CursorRequest::Release => {
                if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
                    tracing::warn!("Failed to release cursor: {}", e);
                }
                window.set_cursor_visible(true);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(surface), Some(runner)) = (&self.surface, &mut self.runner) else {
            return;
        };
        let size = surface.window().inner_size();

        match runner.frame(SurfaceSize::new(size.width, size.height)) {
            Ok(FrameOutcome::Rendered) => {
                if let Err(e) = surface.swap_buffers() {
                    self.fail(event_loop, e.into());
                    return;
                }
            }
            Ok(FrameOutcome::Skipped) => {}
            Ok(FrameOutcome::Stopped) => {
                event_loop.exit();
                return;
            }
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        }
        surface.window().request_redraw();
    }

    fn on_input(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        let Some(runner) = &mut self.runner else {
            return;
        };
        let result = match event {
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(code) => {
                    runner.on_key(code, event.state.is_pressed(), event.repeat)
                }
                PhysicalKey::Unidentified(_) => Ok(CursorRequest::None),
            },
            WindowEvent::MouseInput { state, button, .. } => {
                Ok(runner.on_mouse_button(button, state.is_pressed()))
            }
            WindowEvent::Focused(focused) => Ok(runner.on_focus_changed(focused)),
            WindowEvent::Touch(touch) => runner
                .on_touch(touch.id, touch.phase, touch.location.x, touch.location.y)
                .map(|()| CursorRequest::None),
            _ => Ok(CursorRequest::None),
        };

        match result {
            Ok(request) => self.apply_cursor(request),
            Err(e) => self.fail(event_loop, e),
        }
    }
}

impl ApplicationHandler for RaylinkApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                if let Some(runner) = &self.runner {
                    runner.stop_token().stop();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(surface) = &self.surface {
                    surface.resize(size.width, size.height);
                    surface.window().request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            event => self.on_input(event_loop, event),
        }
    }

    fn device_event(&mut self, event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let DeviceEvent::MouseMotion { delta } = event else {
            return;
        };
        let Some(runner) = &mut self.runner else {
            return;
        };
        if let Err(e) = runner.on_mouse_motion(delta.0, delta.1) {
            self.fail(event_loop, e);
        }
    }
}

/// Run the event loop until the window closes or the module fails.
pub fn run(launch: LaunchConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = RaylinkApp::new(launch)?;
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
