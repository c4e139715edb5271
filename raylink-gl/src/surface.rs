//! Window and GL context creation
//!
//! Only OpenGL ES 3.0 contexts are requested: module shaders are written
//! as `#version 300 es`, which desktop core profiles reject.

use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface as _, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use thiserror::Error;
use winit::event_loop::ActiveEventLoop;
use winit::raw_window_handle::HasWindowHandle;
use winit::window::{Window, WindowAttributes};

/// The machine cannot give us a window with a usable GL context
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no suitable GL display configuration: {0}")]
    Display(String),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("window handle unavailable: {0}")]
    Handle(#[from] winit::raw_window_handle::HandleError),

    #[error("failed to create an OpenGL ES 3.0 context: {0}")]
    Context(glutin::error::Error),

    #[error("GL surface error: {0}")]
    Surface(#[from] glutin::error::Error),
}

/// API of the context module shaders compile against
const CONTEXT_API: ContextApi = ContextApi::Gles(Some(Version::new(3, 0)));

/// A window with a current GL context and its drawable surface
pub struct GlSurface {
    // Drop order: surface and context before the window they render into
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

/// Prefer configs with alpha and more samples
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            let better_alpha = config.supports_transparency().unwrap_or(false)
                && !best.supports_transparency().unwrap_or(false);
            if better_alpha || config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("display builder only picks from a non-empty config list")
}

impl GlSurface {
    /// Create the window, make a context current on it and load GL.
    pub fn create(
        event_loop: &ActiveEventLoop,
        attributes: WindowAttributes,
        vsync: bool,
    ) -> Result<(Self, glow::Context), SurfaceError> {
        let template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let (window, config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes.clone()))
            .build(event_loop, template, pick_config)
            .map_err(|e| SurfaceError::Display(e.to_string()))?;

        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(event_loop, attributes, &config)?,
        };

        let raw_handle = Some(window.window_handle()?.as_raw());
        let display = config.display();
        let attributes = ContextAttributesBuilder::new()
            .with_context_api(CONTEXT_API)
            .build(raw_handle);

        // SAFETY: the raw handle belongs to `window`, which outlives the context
        let context = unsafe { display.create_context(&config, &attributes) }
            .map_err(SurfaceError::Context)?;

        let surface_attributes = window.build_surface_attributes(Default::default())?;
        // SAFETY: as above, the window outlives the surface
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes)? };
        let context = context.make_current(&surface)?;

        let interval = if vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            tracing::warn!("Failed to set swap interval: {}", e);
        }

        // SAFETY: the context is current on this thread
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name).cast())
        };

        tracing::info!(
            "Created GL surface {}x{} (vsync: {})",
            window.inner_size().width,
            window.inner_size().height,
            vsync
        );

        Ok((
            Self {
                surface,
                context,
                window,
            },
            gl,
        ))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Match the drawable to a new inner size; zero sizes are ignored
    pub fn resize(&self, width: u32, height: u32) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, width, height);
        }
    }

    pub fn swap_buffers(&self) -> Result<(), SurfaceError> {
        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_gles_3() {
        // `#version 300 es` shaders need an ES context, never a desktop core one
        match CONTEXT_API {
            ContextApi::Gles(Some(version)) => assert_eq!((version.major, version.minor), (3, 0)),
            other => panic!("unexpected context API {other:?}"),
        }
    }

    #[test]
    fn test_context_error_names_only_gles() {
        let message = SurfaceError::Context(glutin::error::ErrorKind::NotSupported("no ES").into())
            .to_string();
        assert!(message.starts_with("failed to create an OpenGL ES 3.0 context"));
        assert!(!message.contains("3.3"));
    }
}
