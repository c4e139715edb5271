//! Shader, program and uniform functions

use anyhow::{Context, Result};
use wasmtime::{Caller, Linker};

use super::BridgeError;
use super::helpers::read_string;
use crate::graphics::{GraphicsContext, ShaderKind, UniformValue};
use crate::wasm::HostState;

pub(super) fn register<G: GraphicsContext>(linker: &mut Linker<HostState<G>>) -> Result<()> {
    linker.func_wrap("env", "compileShader", compile_shader::<G>)?;
    linker.func_wrap("env", "createProgram", create_program::<G>)?;
    linker.func_wrap("env", "useProgram", use_program::<G>)?;

    linker.func_wrap("env", "uniform3f", uniform3f::<G>)?;
    linker.func_wrap("env", "uniform1f", uniform1f::<G>)?;
    linker.func_wrap("env", "uniform1i", uniform1i::<G>)?;
    linker.func_wrap("env", "uniform1ui", uniform1ui::<G>)?;
    Ok(())
}

/// Compile shader source of the given GL kind
///
/// # Returns
/// Shader handle. Traps with the compiler log on failure.
fn compile_shader<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    ptr: u32,
    len: u32,
    kind: u32,
) -> Result<u32> {
    let kind = ShaderKind::from_gl(kind).ok_or(BridgeError::UnknownShaderKind(kind))?;
    let source = read_string(&caller, ptr, len)?;

    let state = caller.data_mut();
    let shader = state
        .graphics
        .compile_shader(kind, &source)
        .context("compileShader")?;
    let handle = state.registry.shaders.insert(shader)?;

    tracing::debug!("Compiled {} shader {}", kind, handle);
    Ok(handle)
}

/// Link two shaders and make the program current
///
/// # Returns
/// Program handle. Traps with the linker log on failure.
fn create_program<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    vertex: u32,
    fragment: u32,
) -> Result<u32> {
    let state = caller.data_mut();
    let vertex_shader = state.registry.shaders.get(vertex)?;
    let fragment_shader = state.registry.shaders.get(fragment)?;

    let program = state
        .graphics
        .link_program(vertex_shader, fragment_shader)
        .context("createProgram")?;
    let handle = state.registry.programs.insert(program)?;

    state.graphics.use_program(Some(program));
    state.bound.set_program(Some(handle));

    tracing::debug!("Linked program {} from shaders {} and {}", handle, vertex, fragment);
    Ok(handle)
}

fn use_program<G: GraphicsContext>(mut caller: Caller<'_, HostState<G>>, handle: u32) -> Result<()> {
    let state = caller.data_mut();
    let program = state.registry.programs.get(handle)?;
    state.graphics.use_program(Some(program));
    state.bound.set_program(Some(handle));
    Ok(())
}

/// Look up `name` on `program` and set it on the current program
fn set_uniform<G: GraphicsContext>(
    caller: &mut Caller<'_, HostState<G>>,
    program: u32,
    name_ptr: u32,
    name_len: u32,
    value: UniformValue,
) -> Result<()> {
    let name = read_string(caller, name_ptr, name_len)?;

    let state = caller.data_mut();
    let program = state.registry.programs.get(program)?;
    let location = state.graphics.uniform_location(program, &name);
    if location.is_none() {
        // GL ignores writes to inactive uniforms; so do we
        tracing::trace!("Uniform '{}' is not active", name);
    }
    state.graphics.set_uniform(location.as_ref(), value);
    Ok(())
}

fn uniform3f<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    program: u32,
    name_ptr: u32,
    name_len: u32,
    x: f32,
    y: f32,
    z: f32,
) -> Result<()> {
    set_uniform(
        &mut caller,
        program,
        name_ptr,
        name_len,
        UniformValue::Vec3([x, y, z]),
    )
}

fn uniform1f<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    program: u32,
    name_ptr: u32,
    name_len: u32,
    x: f32,
) -> Result<()> {
    set_uniform(&mut caller, program, name_ptr, name_len, UniformValue::F32(x))
}

fn uniform1i<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    program: u32,
    name_ptr: u32,
    name_len: u32,
    x: i32,
) -> Result<()> {
    set_uniform(&mut caller, program, name_ptr, name_len, UniformValue::I32(x))
}

fn uniform1ui<G: GraphicsContext>(
    mut caller: Caller<'_, HostState<G>>,
    program: u32,
    name_ptr: u32,
    name_len: u32,
    x: u32,
) -> Result<()> {
    set_uniform(&mut caller, program, name_ptr, name_len, UniformValue::U32(x))
}
