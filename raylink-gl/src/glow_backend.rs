//! OpenGL ES backend for the graphics bridge
//!
//! Wraps a `glow::Context` and owns the full-screen quad every program
//! draws with. The quad's vertex array stays bound for the lifetime of the
//! context; modules have no way to bind another one.

use glow::HasContext;

use raylink_core::graphics::{
    GraphicsContext, GraphicsError, POSITION_ATTRIBUTE, ShaderKind, TextureImage, UV_ATTRIBUTE,
    UniformValue,
};

/// Attribute names bound before linking
const POSITION_NAME: &str = "a_Position";
const UV_NAME: &str = "a_Uv";

/// Full-screen triangle strip: xyz position then uv, per vertex
#[rustfmt::skip]
const QUAD_VERTICES: [f32; 20] = [
    -1.0, -1.0, 0.0,   0.0, 0.0,
     1.0, -1.0, 0.0,   1.0, 0.0,
    -1.0,  1.0, 0.0,   0.0, 1.0,
     1.0,  1.0, 0.0,   1.0, 1.0,
];

const QUAD_STRIDE: i32 = 5 * std::mem::size_of::<f32>() as i32;
const QUAD_UV_OFFSET: i32 = 3 * std::mem::size_of::<f32>() as i32;

/// [`GraphicsContext`] over a live GL context
pub struct GlowGraphics {
    gl: glow::Context,
    quad_vao: glow::NativeVertexArray,
    quad_vbo: glow::NativeBuffer,
}

fn create_error(object: &'static str) -> impl FnOnce(String) -> GraphicsError {
    move |reason| GraphicsError::Create { object, reason }
}

impl GlowGraphics {
    /// Upload the quad and leave its vertex array bound.
    ///
    /// The context must be current on this thread.
    pub fn new(gl: glow::Context) -> Result<Self, GraphicsError> {
        // SAFETY: the caller made the context current; every object created
        // here belongs to it.
        unsafe {
            let quad_vao = gl.create_vertex_array().map_err(create_error("vertex array"))?;
            let quad_vbo = gl.create_buffer().map_err(create_error("vertex buffer"))?;

            gl.bind_vertex_array(Some(quad_vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(quad_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&QUAD_VERTICES),
                glow::STATIC_DRAW,
            );
            gl.enable_vertex_attrib_array(POSITION_ATTRIBUTE);
            gl.vertex_attrib_pointer_f32(POSITION_ATTRIBUTE, 3, glow::FLOAT, false, QUAD_STRIDE, 0);
            gl.enable_vertex_attrib_array(UV_ATTRIBUTE);
            gl.vertex_attrib_pointer_f32(
                UV_ATTRIBUTE,
                2,
                glow::FLOAT,
                false,
                QUAD_STRIDE,
                QUAD_UV_OFFSET,
            );

            tracing::debug!(
                "GL context: {} / {}",
                gl.get_parameter_string(glow::RENDERER),
                gl.get_parameter_string(glow::VERSION)
            );

            Ok(Self {
                gl,
                quad_vao,
                quad_vbo,
            })
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

impl Drop for GlowGraphics {
    fn drop(&mut self) {
        // SAFETY: both objects were created on this context in `new`
        unsafe {
            self.gl.delete_vertex_array(self.quad_vao);
            self.gl.delete_buffer(self.quad_vbo);
        }
    }
}

// SAFETY (all methods below): the context is current on the render thread
// for as long as the host runs, and handles passed in were created on it.
impl GraphicsContext for GlowGraphics {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;
    type Texture = glow::NativeTexture;
    type Framebuffer = glow::NativeFramebuffer;
    type UniformLocation = glow::NativeUniformLocation;

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<Self::Shader, GraphicsError> {
        unsafe {
            let shader = self
                .gl
                .create_shader(kind.as_gl())
                .map_err(create_error("shader"))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(GraphicsError::Compile { kind, log });
            }
            Ok(shader)
        }
    }

    fn link_program(
        &mut self,
        vertex: Self::Shader,
        fragment: Self::Shader,
    ) -> Result<Self::Program, GraphicsError> {
        unsafe {
            let program = self.gl.create_program().map_err(create_error("program"))?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl
                .bind_attrib_location(program, POSITION_ATTRIBUTE, POSITION_NAME);
            self.gl.bind_attrib_location(program, UV_ATTRIBUTE, UV_NAME);
            self.gl.link_program(program);

            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GraphicsError::Link { log });
            }
            Ok(program)
        }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&mut self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(&mut self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn set_uniform(&mut self, location: Option<&Self::UniformLocation>, value: UniformValue) {
        unsafe {
            match value {
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::F32(x) => self.gl.uniform_1_f32(location, x),
                UniformValue::I32(x) => self.gl.uniform_1_i32(location, x),
                UniformValue::U32(x) => self.gl.uniform_1_u32(location, x),
            }
        }
    }

    fn create_texture(&mut self) -> Result<Self::Texture, GraphicsError> {
        unsafe { self.gl.create_texture().map_err(create_error("texture")) }
    }

    fn delete_texture(&mut self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, texture: Option<Self::Texture>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture) }
    }

    fn allocate_render_texture(&mut self, width: u32, height: u32) {
        unsafe {
            let gl = &self.gl;
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
        }
    }

    fn upload_texture_image(&mut self, image: &TextureImage) {
        unsafe {
            let gl = &self.gl;
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                image.width as i32,
                image.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&image.pixels)),
            );
            gl.generate_mipmap(glow::TEXTURE_2D);
        }
    }

    fn create_framebuffer(&mut self) -> Result<Self::Framebuffer, GraphicsError> {
        unsafe { self.gl.create_framebuffer().map_err(create_error("framebuffer")) }
    }

    fn delete_framebuffer(&mut self, framebuffer: Self::Framebuffer) {
        unsafe { self.gl.delete_framebuffer(framebuffer) }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<Self::Framebuffer>) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) }
    }

    fn attach_color_texture(&mut self, texture: Self::Texture) -> Result<(), GraphicsError> {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                return Err(GraphicsError::IncompleteFramebuffer { status });
            }
        }
        Ok(())
    }

    fn viewport(&mut self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) }
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&mut self, mask: u32) {
        unsafe { self.gl.clear(mask) }
    }

    fn draw_arrays(&mut self, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, count) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_layout_matches_attribute_pointers() {
        assert_eq!(QUAD_VERTICES.len() * std::mem::size_of::<f32>(), 4 * QUAD_STRIDE as usize);
        // Second vertex: bottom-right corner maps to uv (1, 0)
        let v1 = &QUAD_VERTICES[5..10];
        assert_eq!(v1, &[1.0, -1.0, 0.0, 1.0, 0.0]);
        assert_eq!(QUAD_UV_OFFSET, 12);
    }

    #[test]
    fn test_quad_covers_clip_space() {
        let corners: Vec<(f32, f32)> = QUAD_VERTICES.chunks(5).map(|v| (v[0], v[1])).collect();
        for corner in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            assert!(corners.contains(&corner));
        }
    }
}
