//! Ping-pong framebuffers for temporal effects
//!
//! Two offscreen color targets alternate roles every frame. The module
//! renders into the active one while sampling the other (last frame's
//! image). A fixed present pass then copies the active target to the
//! default framebuffer and the roles swap.

use super::{
    GL_COLOR_BUFFER_BIT, GL_DEPTH_BUFFER_BIT, GraphicsContext, GraphicsError, MAX_TEXTURE_UNITS,
    ShaderKind, UniformValue,
};

const PRESENT_VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_Position;
layout(location = 1) in vec2 a_Uv;
out highp vec2 v_Uv;
void main() {
    gl_Position = vec4(a_Position, 1.0);
    v_Uv = a_Uv;
}
"#;

const PRESENT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;
in highp vec2 v_Uv;
uniform sampler2D u_Frame;
out vec4 o_Color;
void main() {
    o_Color = texture(u_Frame, v_Uv);
}
"#;

/// Name of the present program's sampler uniform
pub const PRESENT_SAMPLER: &str = "u_Frame";

/// Vertices drawn by the present pass (full-screen strip)
const PRESENT_VERTEX_COUNT: i32 = 4;

/// One offscreen target. Framebuffer, color texture and unit travel together.
pub struct PingPongTarget<G: GraphicsContext> {
    pub framebuffer: G::Framebuffer,
    pub color: G::Texture,
    pub unit: u32,
}

impl<G: GraphicsContext> Clone for PingPongTarget<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: GraphicsContext> Copy for PingPongTarget<G> {}

impl<G: GraphicsContext> PartialEq for PingPongTarget<G> {
    fn eq(&self, other: &Self) -> bool {
        self.framebuffer == other.framebuffer && self.color == other.color && self.unit == other.unit
    }
}

impl<G: GraphicsContext> std::fmt::Debug for PingPongTarget<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingPongTarget")
            .field("framebuffer", &self.framebuffer)
            .field("color", &self.color)
            .field("unit", &self.unit)
            .finish()
    }
}

/// Pair of equally sized offscreen targets plus the present program
pub struct PingPong<G: GraphicsContext> {
    active: PingPongTarget<G>,
    other: PingPongTarget<G>,
    width: u32,
    height: u32,
    present_program: G::Program,
    frame_sampler: Option<G::UniformLocation>,
    frames_presented: u64,
}

impl<G: GraphicsContext> std::fmt::Debug for PingPong<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingPong")
            .field("active", &self.active)
            .field("other", &self.other)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("present_program", &self.present_program)
            .field("frame_sampler", &self.frame_sampler)
            .field("frames_presented", &self.frames_presented)
            .finish()
    }
}

impl<G: GraphicsContext> PingPong<G> {
    /// Create both targets on units `base_unit` and `base_unit + 1`.
    ///
    /// Leaves the default framebuffer bound and each color texture bound on
    /// its own unit. The caller restores the active unit.
    pub fn new(gl: &mut G, base_unit: u32, width: u32, height: u32) -> Result<Self, GraphicsError> {
        let second_unit = base_unit
            .checked_add(1)
            .filter(|unit| *unit < MAX_TEXTURE_UNITS)
            .ok_or_else(|| GraphicsError::Create {
                object: "ping-pong targets",
                reason: format!("no texture unit after {base_unit}"),
            })?;

        let vertex = gl.compile_shader(ShaderKind::Vertex, PRESENT_VERTEX_SHADER)?;
        let fragment = match gl.compile_shader(ShaderKind::Fragment, PRESENT_FRAGMENT_SHADER) {
            Ok(shader) => shader,
            Err(e) => {
                gl.delete_shader(vertex);
                return Err(e);
            }
        };
        let linked = gl.link_program(vertex, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        let present_program = linked?;
        let frame_sampler = gl.uniform_location(present_program, PRESENT_SAMPLER);

        let (width, height) = (width.max(1), height.max(1));
        let (active, other) = match create_pair(gl, [base_unit, second_unit], width, height) {
            Ok(pair) => pair,
            Err(e) => {
                gl.delete_program(present_program);
                return Err(e);
            }
        };

        tracing::debug!(
            "Created ping-pong targets {}x{} on units {} and {}",
            width,
            height,
            active.unit,
            other.unit
        );

        Ok(Self {
            active,
            other,
            width,
            height,
            present_program,
            frame_sampler,
            frames_presented: 0,
        })
    }

    /// Target written this frame
    pub fn active(&self) -> PingPongTarget<G> {
        self.active
    }

    /// Target holding the previous frame
    pub fn other(&self) -> PingPongTarget<G> {
        self.other
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Recreate both targets at the new size.
    ///
    /// The new pair is built before the old one is released, so a failure
    /// leaves the current targets untouched.
    pub fn resize(&mut self, gl: &mut G, width: u32, height: u32) -> Result<(), GraphicsError> {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }

        let (active, other) =
            create_pair(gl, [self.active.unit, self.other.unit], width, height)?;
        destroy_target(gl, self.active);
        destroy_target(gl, self.other);

        self.active = active;
        self.other = other;
        self.width = width;
        self.height = height;

        tracing::debug!("Resized ping-pong targets to {}x{}", width, height);
        Ok(())
    }

    /// Bind the active target and prepare it for the module's draw calls
    pub fn begin_frame(&self, gl: &mut G) {
        gl.bind_framebuffer(Some(self.active.framebuffer));
        gl.viewport(self.width, self.height);
        gl.clear(GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT);
    }

    /// Draw the active target to the default framebuffer, then swap roles
    pub fn present(&mut self, gl: &mut G, surface_width: u32, surface_height: u32) {
        gl.bind_framebuffer(None);
        gl.viewport(surface_width, surface_height);
        gl.use_program(Some(self.present_program));
        gl.set_uniform(
            self.frame_sampler.as_ref(),
            UniformValue::I32(self.active.unit as i32),
        );
        gl.draw_arrays(PRESENT_VERTEX_COUNT);
        self.swap();
    }

    /// Exchange the active and other targets as one unit
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.active, &mut self.other);
        self.frames_presented += 1;
    }

    /// Release both targets and the present program
    pub fn destroy(self, gl: &mut G) {
        destroy_target(gl, self.active);
        destroy_target(gl, self.other);
        gl.delete_program(self.present_program);
    }
}

fn create_pair<G: GraphicsContext>(
    gl: &mut G,
    units: [u32; 2],
    width: u32,
    height: u32,
) -> Result<(PingPongTarget<G>, PingPongTarget<G>), GraphicsError> {
    let first = create_target(gl, units[0], width, height)?;
    let second = match create_target(gl, units[1], width, height) {
        Ok(target) => target,
        Err(e) => {
            destroy_target(gl, first);
            return Err(e);
        }
    };
    gl.bind_framebuffer(None);
    Ok((first, second))
}

fn create_target<G: GraphicsContext>(
    gl: &mut G,
    unit: u32,
    width: u32,
    height: u32,
) -> Result<PingPongTarget<G>, GraphicsError> {
    let framebuffer = gl.create_framebuffer()?;
    let color = match gl.create_texture() {
        Ok(texture) => texture,
        Err(e) => {
            gl.delete_framebuffer(framebuffer);
            return Err(e);
        }
    };

    gl.active_texture(unit);
    gl.bind_texture(Some(color));
    gl.allocate_render_texture(width, height);

    gl.bind_framebuffer(Some(framebuffer));
    if let Err(e) = gl.attach_color_texture(color) {
        gl.bind_framebuffer(None);
        gl.delete_texture(color);
        gl.delete_framebuffer(framebuffer);
        return Err(e);
    }

    Ok(PingPongTarget {
        framebuffer,
        color,
        unit,
    })
}

fn destroy_target<G: GraphicsContext>(gl: &mut G, target: PingPongTarget<G>) {
    gl.delete_framebuffer(target.framebuffer);
    gl.delete_texture(target.color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GlCall, RecordingGraphics};

    fn pair(gl: &mut RecordingGraphics) -> PingPong<RecordingGraphics> {
        PingPong::new(gl, 0, 800, 600).unwrap()
    }

    #[test]
    fn test_new_creates_two_targets_on_consecutive_units() {
        let mut gl = RecordingGraphics::new();
        let pp = pair(&mut gl);

        assert_eq!(pp.active().unit, 0);
        assert_eq!(pp.other().unit, 1);
        assert_ne!(pp.active().framebuffer, pp.other().framebuffer);
        assert_eq!(pp.dimensions(), (800, 600));
        assert_eq!(
            gl.count(|c| matches!(c, GlCall::AllocateRenderTexture { width: 800, height: 600 })),
            2
        );
        assert_eq!(gl.calls.last(), Some(&GlCall::BindFramebuffer(None)));
    }

    #[test]
    fn test_swap_alternates_with_period_two() {
        let mut gl = RecordingGraphics::new();
        let mut pp = pair(&mut gl);
        let first = pp.active();
        let second = pp.other();

        for frame in 0..6 {
            let previous_other = pp.other();
            let previous_active = pp.active();
            pp.present(&mut gl, 800, 600);

            assert_eq!(pp.active(), previous_other);
            assert_eq!(pp.other(), previous_active);
            let expected = if frame % 2 == 0 { second } else { first };
            assert_eq!(pp.active(), expected);
        }
        assert_eq!(pp.frames_presented(), 6);
    }

    #[test]
    fn test_present_samples_active_unit_on_default_framebuffer() {
        let mut gl = RecordingGraphics::new();
        let mut pp = pair(&mut gl);
        let active_unit = pp.active().unit;
        gl.take_calls();

        pp.present(&mut gl, 1024, 768);

        let calls = gl.take_calls();
        assert_eq!(calls[0], GlCall::BindFramebuffer(None));
        assert_eq!(calls[1], GlCall::Viewport { width: 1024, height: 768 });
        assert!(matches!(calls[2], GlCall::UseProgram(Some(_))));
        assert_eq!(
            calls[3],
            GlCall::SetUniform {
                name: Some(PRESENT_SAMPLER.to_string()),
                value: UniformValue::I32(active_unit as i32),
            }
        );
        assert_eq!(calls[4], GlCall::DrawArrays(4));
    }

    #[test]
    fn test_begin_frame_binds_active_target() {
        let mut gl = RecordingGraphics::new();
        let pp = pair(&mut gl);
        gl.take_calls();

        pp.begin_frame(&mut gl);

        assert_eq!(
            gl.take_calls(),
            vec![
                GlCall::BindFramebuffer(Some(pp.active().framebuffer)),
                GlCall::Viewport { width: 800, height: 600 },
                GlCall::Clear(GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT),
            ]
        );
    }

    #[test]
    fn test_resize_recreates_both_targets() {
        let mut gl = RecordingGraphics::new();
        let mut pp = pair(&mut gl);
        let old_active = pp.active();
        let old_other = pp.other();
        gl.take_calls();

        pp.resize(&mut gl, 1280, 720).unwrap();

        assert_eq!(pp.dimensions(), (1280, 720));
        assert_ne!(pp.active().framebuffer, old_active.framebuffer);
        assert_ne!(pp.other().framebuffer, old_other.framebuffer);
        assert_eq!(pp.active().unit, old_active.unit);
        assert_eq!(pp.other().unit, old_other.unit);

        let calls = gl.take_calls();
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, GlCall::AllocateRenderTexture { width: 1280, height: 720 }))
                .count(),
            2
        );
        assert!(calls.contains(&GlCall::DeleteFramebuffer(old_active.framebuffer)));
        assert!(calls.contains(&GlCall::DeleteFramebuffer(old_other.framebuffer)));
        assert!(calls.contains(&GlCall::DeleteTexture(old_active.color)));
        assert!(calls.contains(&GlCall::DeleteTexture(old_other.color)));
    }

    #[test]
    fn test_resize_to_same_size_is_noop() {
        let mut gl = RecordingGraphics::new();
        let mut pp = pair(&mut gl);
        gl.take_calls();

        pp.resize(&mut gl, 800, 600).unwrap();
        assert!(gl.calls.is_empty());
    }

    #[test]
    fn test_failed_resize_keeps_current_targets() {
        let mut gl = RecordingGraphics::new();
        let mut pp = pair(&mut gl);
        let before = (pp.active(), pp.other());

        gl.incomplete_framebuffers = true;
        let err = pp.resize(&mut gl, 640, 480).unwrap_err();

        assert!(matches!(err, GraphicsError::IncompleteFramebuffer { .. }));
        assert_eq!((pp.active(), pp.other()), before);
        assert_eq!(pp.dimensions(), (800, 600));
    }

    #[test]
    fn test_destroy_releases_targets_and_present_program() {
        let mut gl = RecordingGraphics::new();
        let pp = PingPong::new(&mut gl, 4, 16, 16).unwrap();
        let (active, other) = (pp.active(), pp.other());
        let program = gl
            .calls
            .iter()
            .find_map(|call| match call {
                GlCall::LinkProgram { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();
        gl.take_calls();

        pp.destroy(&mut gl);

        assert_eq!(
            gl.take_calls(),
            vec![
                GlCall::DeleteFramebuffer(active.framebuffer),
                GlCall::DeleteTexture(active.color),
                GlCall::DeleteFramebuffer(other.framebuffer),
                GlCall::DeleteTexture(other.color),
                GlCall::DeleteProgram(program),
            ]
        );
    }

    #[test]
    fn test_present_shaders_are_released_after_linking() {
        let mut gl = RecordingGraphics::new();
        pair(&mut gl);

        let compiled: Vec<u32> = gl
            .calls
            .iter()
            .filter_map(|call| match call {
                GlCall::CompileShader { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(compiled.len(), 2);
        for shader in compiled {
            assert!(gl.calls.contains(&GlCall::DeleteShader(shader)));
        }
    }

    #[test]
    fn test_failed_link_releases_present_shaders() {
        let mut gl = RecordingGraphics::new();
        gl.fail_link = true;

        let err = PingPong::new(&mut gl, 0, 16, 16).unwrap_err();
        assert!(matches!(err, GraphicsError::Link { .. }));
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteShader(_))), 2);
        assert_eq!(gl.count(|c| matches!(c, GlCall::AllocateRenderTexture { .. })), 0);
    }

    #[test]
    fn test_failed_targets_release_present_program() {
        let mut gl = RecordingGraphics::new();
        gl.incomplete_framebuffers = true;

        assert!(PingPong::new(&mut gl, 0, 16, 16).is_err());
        assert_eq!(gl.count(|c| matches!(c, GlCall::DeleteProgram(_))), 1);
    }

    #[test]
    fn test_last_unit_cannot_host_a_pair() {
        let mut gl = RecordingGraphics::new();

        for base in [MAX_TEXTURE_UNITS - 1, u32::MAX] {
            let err = PingPong::new(&mut gl, base, 16, 16).unwrap_err();
            assert!(matches!(err, GraphicsError::Create { .. }));
        }
        assert!(gl.calls.is_empty());
    }
}
