//! Shared test utilities for unit and module-level tests

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::fetch::Location;
use crate::graphics::{GraphicsContext, GraphicsError, ShaderKind, TextureImage, UniformValue};
use crate::runtime::HostedModule;
use crate::texture_loader::TextureLoader;
use crate::wasm::{HostState, ModuleInstance, WasmEngine};

// ============================================================================
// Recording Graphics Backend
// ============================================================================

/// One call received by [`RecordingGraphics`]
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CompileShader { id: u32, kind: ShaderKind, source: String },
    LinkProgram { id: u32, vertex: u32, fragment: u32 },
    DeleteShader(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    SetUniform { name: Option<String>, value: UniformValue },
    CreateTexture(u32),
    DeleteTexture(u32),
    ActiveTexture(u32),
    BindTexture(Option<u32>),
    AllocateRenderTexture { width: u32, height: u32 },
    UploadTextureImage { width: u32, height: u32 },
    CreateFramebuffer(u32),
    DeleteFramebuffer(u32),
    BindFramebuffer(Option<u32>),
    AttachColorTexture(u32),
    Viewport { width: u32, height: u32 },
    ClearColor([f32; 4]),
    Clear(u32),
    DrawArrays(i32),
}

/// Graphics backend that records calls instead of talking to a driver.
///
/// Object names come from one counter starting at 1, like GL names.
/// Uniform locations are the uniform names themselves.
#[derive(Debug, Default)]
pub struct RecordingGraphics {
    pub calls: Vec<GlCall>,
    next_id: u32,
    /// Shader sources containing this marker fail to compile
    pub fail_compile_marker: Option<String>,
    pub fail_link: bool,
    pub incomplete_framebuffers: bool,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_name(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Drop everything recorded so far
    pub fn take_calls(&mut self) -> Vec<GlCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

impl GraphicsContext for RecordingGraphics {
    type Shader = u32;
    type Program = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type UniformLocation = String;

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<u32, GraphicsError> {
        if let Some(marker) = &self.fail_compile_marker
            && source.contains(marker.as_str())
        {
            return Err(GraphicsError::Compile {
                kind,
                log: format!("ERROR: 0:1: '{marker}' : syntax error"),
            });
        }
        let id = self.next_name();
        self.calls.push(GlCall::CompileShader {
            id,
            kind,
            source: source.to_string(),
        });
        Ok(id)
    }

    fn link_program(&mut self, vertex: u32, fragment: u32) -> Result<u32, GraphicsError> {
        if self.fail_link {
            return Err(GraphicsError::Link {
                log: "vertex and fragment varyings do not match".to_string(),
            });
        }
        let id = self.next_name();
        self.calls.push(GlCall::LinkProgram {
            id,
            vertex,
            fragment,
        });
        Ok(id)
    }

    fn delete_shader(&mut self, shader: u32) {
        self.calls.push(GlCall::DeleteShader(shader));
    }

    fn delete_program(&mut self, program: u32) {
        self.calls.push(GlCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<u32>) {
        self.calls.push(GlCall::UseProgram(program));
    }

    fn uniform_location(&mut self, _program: u32, name: &str) -> Option<String> {
        Some(name.to_string())
    }

    fn set_uniform(&mut self, location: Option<&String>, value: UniformValue) {
        self.calls.push(GlCall::SetUniform {
            name: location.cloned(),
            value,
        });
    }

    fn create_texture(&mut self) -> Result<u32, GraphicsError> {
        let id = self.next_name();
        self.calls.push(GlCall::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&mut self, texture: u32) {
        self.calls.push(GlCall::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(GlCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<u32>) {
        self.calls.push(GlCall::BindTexture(texture));
    }

    fn allocate_render_texture(&mut self, width: u32, height: u32) {
        self.calls
            .push(GlCall::AllocateRenderTexture { width, height });
    }

    fn upload_texture_image(&mut self, image: &TextureImage) {
        self.calls.push(GlCall::UploadTextureImage {
            width: image.width,
            height: image.height,
        });
    }

    fn create_framebuffer(&mut self) -> Result<u32, GraphicsError> {
        let id = self.next_name();
        self.calls.push(GlCall::CreateFramebuffer(id));
        Ok(id)
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) {
        self.calls.push(GlCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<u32>) {
        self.calls.push(GlCall::BindFramebuffer(framebuffer));
    }

    fn attach_color_texture(&mut self, texture: u32) -> Result<(), GraphicsError> {
        if self.incomplete_framebuffers {
            return Err(GraphicsError::IncompleteFramebuffer { status: 0x8CD6 });
        }
        self.calls.push(GlCall::AttachColorTexture(texture));
        Ok(())
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.calls.push(GlCall::Viewport { width, height });
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.calls.push(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear(&mut self, mask: u32) {
        self.calls.push(GlCall::Clear(mask));
    }

    fn draw_arrays(&mut self, count: i32) {
        self.calls.push(GlCall::DrawArrays(count));
    }
}

// ============================================================================
// Recording Module
// ============================================================================

/// One call received by [`RecordingModule`]
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleCall {
    Init(u32, u32),
    OnResize(u32, u32),
    Tick(u32, u32),
    OnKeyDown(u32, bool),
    OnMouseMove(f32, f32),
    MoveCamera(f32, f32, f32),
}

/// Stand-in for a loaded module that records every entry-point call
#[derive(Debug, Default)]
pub struct RecordingModule {
    pub calls: Vec<ModuleCall>,
    /// Number of upcoming `on_resize` calls that fail after being recorded
    pub failing_resizes: usize,
}

impl RecordingModule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostedModule for RecordingModule {
    fn init(&mut self, width: u32, height: u32) -> Result<()> {
        self.calls.push(ModuleCall::Init(width, height));
        Ok(())
    }

    fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.calls.push(ModuleCall::OnResize(width, height));
        if self.failing_resizes > 0 {
            self.failing_resizes -= 1;
            anyhow::bail!("onResize() failed");
        }
        Ok(())
    }

    fn tick(&mut self, width: u32, height: u32) -> Result<()> {
        self.calls.push(ModuleCall::Tick(width, height));
        Ok(())
    }

    fn on_key_down(&mut self, axis: u32, pressed: bool) -> Result<()> {
        self.calls.push(ModuleCall::OnKeyDown(axis, pressed));
        Ok(())
    }

    fn on_mouse_move(&mut self, dx: f32, dy: f32) -> Result<()> {
        self.calls.push(ModuleCall::OnMouseMove(dx, dy));
        Ok(())
    }

    fn move_camera(&mut self, pitch: f32, yaw: f32, roll: f32) -> Result<()> {
        self.calls.push(ModuleCall::MoveCamera(pitch, yaw, roll));
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Multi-threaded runtime for texture loader tests
pub fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build test runtime")
}

/// Write a solid-color PNG of the given size
pub fn write_png(path: &Path, width: u32, height: u32) {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 128, 255]));
    image.save(path).expect("failed to write test PNG");
}

/// Instantiate a WAT module against the bridge and a recording backend
pub fn instantiate_wat(
    runtime: &tokio::runtime::Runtime,
    wat: &str,
    ping_pong_base: Option<u32>,
) -> Result<ModuleInstance<RecordingGraphics>> {
    let engine = WasmEngine::new()?;
    let module = engine.load_module(&wat::parse_str(wat)?)?;
    let linker = engine.bridge_linker()?;

    let loader = TextureLoader::new(runtime.handle().clone(), Location::File(PathBuf::from(".")));
    let mut state = HostState::new(RecordingGraphics::new(), loader);
    if let Some(base) = ping_pong_base {
        state = state.with_ping_pong(base);
    }
    ModuleInstance::new(&engine, &module, &linker, state)
}
