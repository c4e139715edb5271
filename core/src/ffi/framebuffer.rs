//! Framebuffer functions

use anyhow::{Context, Result};
use wasmtime::{Caller, Linker};

use super::BridgeError;
use super::texture::check_active_unit;
use crate::graphics::GraphicsContext;
use crate::wasm::HostState;

pub(super) fn register<G: GraphicsContext>(linker: &mut Linker<HostState<G>>) -> Result<()> {
    linker.func_wrap("env", "createFramebuffer", create_framebuffer::<G>)?;
    linker.func_wrap("env", "deleteFramebuffer", delete_framebuffer::<G>)?;
    linker.func_wrap("env", "bindFramebuffer", bind_framebuffer::<G>)?;
    linker.func_wrap("env", "bindNullFramebuffer", bind_null_framebuffer::<G>)?;
    linker.func_wrap("env", "createFramebufferTexture", create_framebuffer_texture::<G>)?;
    Ok(())
}

fn create_framebuffer<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>) -> Result<u32> {
    let state = caller.data_mut();
    let framebuffer = state.graphics.create_framebuffer()?;
    let handle = state.registry.framebuffers.insert(framebuffer)?;
    Ok(handle)
}

fn delete_framebuffer<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, handle: u32) -> Result<()> {
    let state = caller.data_mut();
    let framebuffer = state.registry.framebuffers.remove(handle)?;
    state.graphics.delete_framebuffer(framebuffer);
    state.bound.forget_framebuffer(handle);
    Ok(())
}

fn bind_framebuffer<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, handle: u32) -> Result<()> {
    let state = caller.data_mut();
    let framebuffer = state.registry.framebuffers.get(handle)?;
    state.graphics.bind_framebuffer(Some(framebuffer));
    state.bound.set_framebuffer(Some(handle));
    Ok(())
}

/// Bind the default target. With ping-pong enabled that is the screen,
/// not this frame's ping-pong target.
fn bind_null_framebuffer<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>) -> Result<()> {
    let state = caller.data_mut();
    state.graphics.bind_framebuffer(None);
    state.bound.set_framebuffer(None);
    Ok(())
}

/// Create an RGBA8 texture of the given size and attach it as color 0 of
/// the bound framebuffer
///
/// # Returns
/// Texture handle, left bound on the active unit. Traps if no framebuffer
/// is bound or the result is incomplete.
fn create_framebuffer_texture<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    width: u32,
    height: u32,
) -> Result<u32> {
    let state = caller.data_mut();
    if state.bound.framebuffer().is_none() {
        return Err(BridgeError::NoFramebufferBound.into());
    }
    check_active_unit(state)?;

    let texture = state.graphics.create_texture()?;
    let handle = state.registry.textures.insert(texture)?;

    state.graphics.bind_texture(Some(texture));
    state.bound.set_texture(Some(handle));
    state.graphics.allocate_render_texture(width, height);
    state
        .graphics
        .attach_color_texture(texture)
        .context("createFramebufferTexture")?;

    Ok(handle)
}
