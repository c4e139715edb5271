//! Graphics context abstraction
//!
//! The bridge issues GL-style commands through [`GraphicsContext`]. The
//! native OpenGL ES backend lives in `raylink-gl`; tests run against a
//! recording backend.
//!
//! # Module Organization
//!
//! - [`bound`] - Tracker for the context's currently bound objects
//! - [`ping_pong`] - Double-buffered offscreen targets with a present pass

pub mod bound;
pub mod ping_pong;

use std::fmt;

use thiserror::Error;

pub use bound::BoundState;
pub use ping_pong::{PingPong, PingPongTarget};

/// `GL_VERTEX_SHADER`
pub const GL_VERTEX_SHADER: u32 = 0x8B31;
/// `GL_FRAGMENT_SHADER`
pub const GL_FRAGMENT_SHADER: u32 = 0x8B30;
/// `GL_TEXTURE0`; unit `n` is passed by modules as `GL_TEXTURE0 + n`
pub const GL_TEXTURE0: u32 = 0x84C0;
/// `GL_COLOR_BUFFER_BIT`
pub const GL_COLOR_BUFFER_BIT: u32 = 0x4000;
/// `GL_DEPTH_BUFFER_BIT`
pub const GL_DEPTH_BUFFER_BIT: u32 = 0x0100;

/// Number of texture units a module may address.
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// Vertex attribute location every program gets for `a_Position`.
pub const POSITION_ATTRIBUTE: u32 = 0;
/// Vertex attribute location every program gets for `a_Uv`.
pub const UV_ATTRIBUTE: u32 = 1;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    /// Decode a GL shader type enum
    pub fn from_gl(kind: u32) -> Option<Self> {
        match kind {
            GL_VERTEX_SHADER => Some(Self::Vertex),
            GL_FRAGMENT_SHADER => Some(Self::Fragment),
            _ => None,
        }
    }

    /// GL shader type enum for this stage
    pub fn as_gl(self) -> u32 {
        match self {
            Self::Vertex => GL_VERTEX_SHADER,
            Self::Fragment => GL_FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// A value written to a uniform of the current program
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Vec3([f32; 3]),
    F32(f32),
    I32(i32),
    U32(u32),
}

/// Decoded RGBA8 image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first
    pub pixels: Vec<u8>,
}

/// Failures reported by a graphics backend
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("failed to create {object}: {reason}")]
    Create {
        object: &'static str,
        reason: String,
    },

    #[error("error compiling {kind} shader: {log}")]
    Compile { kind: ShaderKind, log: String },

    #[error("unable to link shader program: {log}")]
    Link { log: String },

    #[error("framebuffer is not complete (status 0x{status:x})")]
    IncompleteFramebuffer { status: u32 },
}

/// GL-style rendering context driven by the bridge.
///
/// Every method acts on the single context the implementation wraps. Calls
/// happen on one thread, in the order the module issues them.
pub trait GraphicsContext: 'static {
    type Shader: Copy + PartialEq + fmt::Debug;
    type Program: Copy + PartialEq + fmt::Debug;
    type Texture: Copy + PartialEq + fmt::Debug;
    type Framebuffer: Copy + PartialEq + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    /// Compile `source`; a failure carries the driver's info log.
    fn compile_shader(
        &mut self,
        kind: ShaderKind,
        source: &str,
    ) -> Result<Self::Shader, GraphicsError>;

    /// Link a program with `a_Position`/`a_Uv` bound to
    /// [`POSITION_ATTRIBUTE`]/[`UV_ATTRIBUTE`].
    fn link_program(
        &mut self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, GraphicsError>;

    /// Release a shader. Programs it is attached to keep working.
    fn delete_shader(&mut self, shader: Self::Shader);

    fn delete_program(&mut self, program: Self::Program);

    fn use_program(&mut self, program: Option<Self::Program>);

    fn uniform_location(
        &mut self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;

    /// Set a uniform on the current program. A `None` location is a no-op.
    fn set_uniform(&mut self, location: Option<&Self::UniformLocation>, value: UniformValue);

    fn create_texture(&mut self) -> Result<Self::Texture, GraphicsError>;

    fn delete_texture(&mut self, texture: Self::Texture);

    /// Select texture unit `unit` (an index, not a GL enum)
    fn active_texture(&mut self, unit: u32);

    fn bind_texture(&mut self, texture: Option<Self::Texture>);

    /// Give the bound texture empty RGBA8 storage with linear filtering and
    /// clamp-to-edge wrapping.
    fn allocate_render_texture(&mut self, width: u32, height: u32);

    /// Upload `image` into the bound texture and generate mipmaps.
    fn upload_texture_image(&mut self, image: &TextureImage);

    fn create_framebuffer(&mut self) -> Result<Self::Framebuffer, GraphicsError>;

    fn delete_framebuffer(&mut self, framebuffer: Self::Framebuffer);

    fn bind_framebuffer(&mut self, framebuffer: Option<Self::Framebuffer>);

    /// Attach `texture` as color attachment 0 of the bound framebuffer and
    /// check completeness.
    fn attach_color_texture(&mut self, texture: Self::Texture) -> Result<(), GraphicsError>;

    fn viewport(&mut self, width: u32, height: u32);

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);

    fn clear(&mut self, mask: u32);

    /// Draw `count` vertices of the full-screen quad as a triangle strip.
    fn draw_arrays(&mut self, count: i32);
}

/// Decode a `GL_TEXTURE0 + n` enum into the unit index `n`
pub fn texture_unit_from_gl(value: u32) -> Option<u32> {
    value
        .checked_sub(GL_TEXTURE0)
        .filter(|unit| *unit < MAX_TEXTURE_UNITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_kind_round_trips_gl_enum() {
        assert_eq!(ShaderKind::from_gl(0x8B31), Some(ShaderKind::Vertex));
        assert_eq!(ShaderKind::from_gl(0x8B30), Some(ShaderKind::Fragment));
        assert_eq!(ShaderKind::from_gl(0x1234), None);
        assert_eq!(ShaderKind::Fragment.as_gl(), GL_FRAGMENT_SHADER);
    }

    #[test]
    fn test_texture_unit_from_gl() {
        assert_eq!(texture_unit_from_gl(GL_TEXTURE0), Some(0));
        assert_eq!(texture_unit_from_gl(GL_TEXTURE0 + 5), Some(5));
        assert_eq!(texture_unit_from_gl(GL_TEXTURE0 + 31), Some(31));
        assert_eq!(texture_unit_from_gl(GL_TEXTURE0 + 32), None);
        // Raw indices are not accepted
        assert_eq!(texture_unit_from_gl(2), None);
    }
}
