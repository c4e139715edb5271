//! Raylink Core - Host runtime for WebAssembly ray-tracing modules
//!
//! This crate loads a compiled module, exposes a small graphics bridge to
//! it, and drives it from window events and display refreshes.
//!
//! # Architecture
//!
//! - [`GraphicsContext`] - Rendering backend the bridge calls into
//! - [`ResourceRegistry`] - Module-visible handles for shaders, programs,
//!   textures and framebuffers
//! - [`ModuleInstance`] - WASM module loaded and instantiated against the bridge
//! - [`FrameDriver`] - Resize, init and per-frame tick orchestration
//! - [`InputRelay`] - Keyboard, pointer-capture and touch routing
//! - [`HostRunner`] - All of the above for one window

pub mod config;
pub mod fetch;
pub mod ffi;
pub mod graphics;
pub mod input;
pub mod registry;
pub mod runner;
pub mod runtime;
#[cfg(test)]
pub mod test_utils;
pub mod texture_loader;
pub mod wasm;

pub use config::{ConfigError, HostConfig};
pub use fetch::{FetchError, Location, fetch_bytes};
pub use graphics::{GraphicsContext, GraphicsError, PingPong, ShaderKind, TextureImage, UniformValue};
pub use input::{Axis, CursorRequest, InputError, InputRelay, Keymap, VirtualJoystick};
pub use registry::{HandleTable, RegistryError, ResourceKind, ResourceRegistry};
pub use runner::{HostRunner, asset_base, fetch_module};
pub use runtime::{
    DEFAULT_CAMERA_SENSITIVITY, DriverState, FrameDriver, FrameOutcome, HostedModule, StopToken,
    SurfaceSize,
};
pub use texture_loader::TextureLoader;
pub use wasm::{HostState, ModuleInstance, WasmEngine};
