//! Host functions imported by the ray-tracing module
//!
//! Everything is registered under the `env` module. Handles are plain
//! `u32` indices into the [`ResourceRegistry`](crate::registry::ResourceRegistry);
//! strings arrive as (pointer, length) pairs into the module's memory.
//!
//! A function that returns `Err` traps the module, so the host call that
//! entered the module fails with the bridge error attached.

mod draw;
mod framebuffer;
mod helpers;
mod shader;
mod system;
mod texture;


use anyhow::Result;
use thiserror::Error;
use wasmtime::Linker;

use crate::graphics::GraphicsContext;
use crate::wasm::HostState;

pub use helpers::read_string;

/// Contract violations detected by the bridge itself
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("module memory is not available")]
    NoMemory,

    #[error("memory range {ptr}+{len} is outside the module's {size}-byte memory")]
    OutOfBounds { ptr: u32, len: u32, size: usize },

    #[error("string at {ptr} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        ptr: u32,
        source: std::str::Utf8Error,
    },

    #[error("unknown shader kind 0x{0:04X}")]
    UnknownShaderKind(u32),

    #[error("0x{0:04X} is not a texture unit")]
    BadTextureUnit(u32),

    #[error("texture unit {0} is reserved for the ping-pong targets")]
    ReservedTextureUnit(u32),

    #[error("createFramebufferTexture called with no framebuffer bound")]
    NoFramebufferBound,

    #[error("drawArrays called with negative count {0}")]
    NegativeCount(i32),
}

/// Register every bridge function with the linker
pub fn register_bridge<G: GraphicsContext>(linker: &mut Linker<HostState<G>>) -> Result<()> {
    system::register(linker)?;
    shader::register(linker)?;
    texture::register(linker)?;
    framebuffer::register(linker)?;
    draw::register(linker)?;
    Ok(())
}
