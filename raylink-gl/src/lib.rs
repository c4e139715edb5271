//! Raylink - OpenGL ES host for WebAssembly ray-tracing modules
//!
//! Opens a window with a GL context, loads a module through
//! `raylink-core` and drives it from the winit event loop.

pub mod app;
pub mod glow_backend;
pub mod surface;

pub use app::{LaunchConfig, RaylinkApp, run};
pub use glow_backend::GlowGraphics;
pub use surface::{GlSurface, SurfaceError};
