//! WASM runtime wrapper
//!
//! Provides abstractions over wasmtime for loading and driving a
//! ray-tracing module.
//!
//! # Module Organization
//!
//! - [`state`] - Host state stored in the wasmtime `Store`
//! - [`instance`] - Instantiated module and its entry points
//!
//! # Key Types
//!
//! - [`WasmEngine`] - Shared WASM engine (one per application)
//! - [`HostState`] - Registry, graphics context and loaders seen by the bridge
//! - [`ModuleInstance`] - Loaded and instantiated module

pub mod instance;
pub mod state;


use anyhow::{Context, Result};
use wasmtime::{Engine, Linker, Module};

use crate::ffi::register_bridge;
use crate::graphics::GraphicsContext;

pub use instance::ModuleInstance;
pub use state::HostState;

/// Shared WASM engine (one per application)
pub struct WasmEngine {
    engine: Engine,
}

impl WasmEngine {
    /// Create a new WASM engine with default configuration
    pub fn new() -> Result<Self> {
        let engine = Engine::default();
        Ok(Self { engine })
    }

    /// Get a reference to the underlying wasmtime engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Compile a WASM module from bytes
    pub fn load_module(&self, bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, bytes).context("Failed to compile WASM module")
    }

    /// Create a linker with every bridge function registered
    pub fn bridge_linker<G: GraphicsContext>(&self) -> Result<Linker<HostState<G>>> {
        let mut linker = Linker::new(&self.engine);
        register_bridge(&mut linker).context("Failed to register bridge functions")?;
        Ok(linker)
    }
}

// NOTE: WasmEngine intentionally does not implement Default.
// Engine construction is fallible on unsupported platforms, so `new()`
// returns a Result.
