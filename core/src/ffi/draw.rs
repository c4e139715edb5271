//! Clear and draw pass-throughs

use anyhow::Result;
use wasmtime::{Caller, Linker};

use super::BridgeError;
use crate::graphics::GraphicsContext;
use crate::wasm::HostState;

pub(super) fn register<G: GraphicsContext>(linker: &mut Linker<HostState<G>>) -> Result<()> {
    linker.func_wrap("env", "drawArrays", draw_arrays::<G>)?;
    linker.func_wrap("env", "clearColor", clear_color::<G>)?;
    linker.func_wrap("env", "clear", clear::<G>)?;
    Ok(())
}

/// Draw `count` vertices of the full-screen quad as a triangle strip
fn draw_arrays<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, count: i32) -> Result<()> {
    if count < 0 {
        return Err(BridgeError::NegativeCount(count).into());
    }
    caller.data_mut().graphics.draw_arrays(count);
    Ok(())
}

fn clear_color<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    r: f32,
    g: f32,
    b: f32,
    a: f32,
) {
    caller.data_mut().graphics.clear_color(r, g, b, a);
}

fn clear<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, mask: u32) {
    caller.data_mut().graphics.clear(mask);
}
