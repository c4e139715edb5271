//! Diagnostic output from the module

use anyhow::Result;
use wasmtime::{Caller, Linker};

use super::helpers::read_string;
use crate::graphics::GraphicsContext;
use crate::wasm::HostState;

pub(super) fn register<G: GraphicsContext>(linker: &mut Linker<HostState<G>>) -> Result<()> {
    linker.func_wrap("env", "print", print::<G>)?;
    // Toolchains that mangle C symbols import it with a leading underscore
    linker.func_wrap("env", "_print", print::<G>)?;
    Ok(())
}

/// Log a UTF-8 message from the module
fn print<G: GraphicsContext>(caller: Caller<'_, HostState<G>>, ptr: u32, len: u32) -> Result<()> {
    let message = read_string(&caller, ptr, len)?;
    tracing::info!(target: "module", "{}", message);
    Ok(())
}
