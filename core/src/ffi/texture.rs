//! Texture functions
//!
//! Texture units arrive as GL enums (`GL_TEXTURE0 + n`). When ping-pong
//! rendering is enabled its two units are off limits to the module.

use anyhow::Result;
use wasmtime::{Caller, Linker};

use super::BridgeError;
use super::helpers::{module_texture_unit, read_string};
use crate::graphics::GraphicsContext;
use crate::texture_loader::TextureRequest;
use crate::wasm::HostState;

pub(super) fn register<G: GraphicsContext>(linker: &mut Linker<HostState<G>>) -> Result<()> {
    linker.func_wrap("env", "createTexture", create_texture::<G>)?;
    linker.func_wrap("env", "deleteTexture", delete_texture::<G>)?;
    linker.func_wrap("env", "bindTexture", bind_texture::<G>)?;
    linker.func_wrap("env", "bindNullTexture", bind_null_texture::<G>)?;
    linker.func_wrap("env", "activeTexture", active_texture::<G>)?;
    linker.func_wrap("env", "bindAndCreateTexture", bind_and_create_texture::<G>)?;
    Ok(())
}

/// Fail if the active unit belongs to the ping-pong targets
pub(super) fn check_active_unit<G: GraphicsContext>(state: &HostState<G>) -> Result<(), BridgeError> {
    let unit = state.bound.active_unit();
    if state.is_reserved_unit(unit) {
        return Err(BridgeError::ReservedTextureUnit(unit));
    }
    Ok(())
}

fn create_texture<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>) -> Result<u32> {
    let state = caller.data_mut();
    let texture = state.graphics.create_texture()?;
    let handle = state.registry.textures.insert(texture)?;
    Ok(handle)
}

fn delete_texture<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, handle: u32) -> Result<()> {
    let state = caller.data_mut();
    let texture = state.registry.textures.remove(handle)?;
    state.graphics.delete_texture(texture);
    state.bound.forget_texture(handle);
    Ok(())
}

fn bind_texture<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, handle: u32) -> Result<()> {
    let state = caller.data_mut();
    let texture = state.registry.textures.get(handle)?;
    check_active_unit(state)?;
    state.graphics.bind_texture(Some(texture));
    state.bound.set_texture(Some(handle));
    Ok(())
}

fn bind_null_texture<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>) -> Result<()> {
    let state = caller.data_mut();
    check_active_unit(state)?;
    state.graphics.bind_texture(None);
    state.bound.set_texture(None);
    Ok(())
}

fn active_texture<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, unit: u32) -> Result<()> {
    let state = caller.data_mut();
    let unit = module_texture_unit(state, unit)?;
    state.graphics.active_texture(unit);
    state.bound.set_active_unit(unit);
    Ok(())
}

/// Create a texture on `unit` and start loading an image into it
///
/// # Arguments
/// * `ptr`, `len`: Image path or URL, relative to the asset root
/// * `unit`: `GL_TEXTURE0 + n`
///
/// # Returns
/// Texture handle, bound on `unit` and usable at once. Its pixels arrive
/// at the start of a later frame; until then it samples as empty.
fn bind_and_create_texture<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    ptr: u32,
    len: u32,
    unit: u32,
) -> Result<u32> {
    let source = read_string(&caller, ptr, len)?;

    let state = caller.data_mut();
    let unit = module_texture_unit(state, unit)?;
    let texture = state.graphics.create_texture()?;
    let handle = state.registry.textures.insert(texture)?;

    let previous_unit = state.bound.active_unit();
    state.graphics.active_texture(unit);
    state.graphics.bind_texture(Some(texture));
    state.bound.set_active_unit(unit);
    state.bound.set_texture(Some(handle));
    state.graphics.active_texture(previous_unit);
    state.bound.set_active_unit(previous_unit);

    state.textures.request(TextureRequest {
        handle,
        unit,
        source,
    });
    Ok(handle)
}
