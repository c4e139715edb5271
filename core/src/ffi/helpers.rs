//! Reading from module memory

use wasmtime::Caller;

use super::BridgeError;
use crate::graphics::{GraphicsContext, texture_unit_from_gl};
use crate::wasm::HostState;

/// Copy `len` bytes at `ptr` out of the module's memory
pub fn read_bytes<G: GraphicsContext>(
    caller: &Caller<'_, HostState<G>>,
    ptr: u32,
    len: u32,
) -> Result<Vec<u8>, BridgeError> {
    let memory = caller.data().memory.ok_or(BridgeError::NoMemory)?;
    let data = memory.data(caller);

    let start = ptr as usize;
    let end = start
        .checked_add(len as usize)
        .filter(|end| *end <= data.len())
        .ok_or(BridgeError::OutOfBounds {
            ptr,
            len,
            size: data.len(),
        })?;

    Ok(data[start..end].to_vec())
}

/// Decode a UTF-8 string passed as (pointer, length)
pub fn read_string<G: GraphicsContext>(
    caller: &Caller<'_, HostState<G>>,
    ptr: u32,
    len: u32,
) -> Result<String, BridgeError> {
    let bytes = read_bytes(caller, ptr, len)?;
    String::from_utf8(bytes).map_err(|e| BridgeError::InvalidUtf8 {
        ptr,
        source: e.utf8_error(),
    })
}

/// Decode a `GL_TEXTURE0 + n` argument and refuse the ping-pong units
pub(super) fn module_texture_unit<G: GraphicsContext>(
    state: &HostState<G>,
    value: u32,
) -> Result<u32, BridgeError> {
    let unit = texture_unit_from_gl(value).ok_or(BridgeError::BadTextureUnit(value))?;
    if state.is_reserved_unit(unit) {
        return Err(BridgeError::ReservedTextureUnit(unit));
    }
    Ok(unit)
}
