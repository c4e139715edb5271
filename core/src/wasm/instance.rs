//! Instantiated ray-tracing module

use anyhow::{Context, Result};
use wasmtime::{Instance, Linker, Module, Store, TypedFunc, WasmParams};

use super::{HostState, WasmEngine};
use crate::graphics::GraphicsContext;
use crate::runtime::HostedModule;

/// `tick(w, h)` or `tick(w, h, previous_frame_unit)`
enum TickFn {
    Size(TypedFunc<(i32, i32), ()>),
    SizeAndPreviousFrame(TypedFunc<(i32, i32, i32), ()>),
}

/// `onMouseMove` takes floats; older builds took integer deltas
enum MouseMoveFn {
    Float(TypedFunc<(f32, f32), ()>),
    Int(TypedFunc<(i32, i32), ()>),
}

/// A loaded and instantiated module
pub struct ModuleInstance<G: GraphicsContext> {
    store: Store<HostState<G>>,
    init_fn: TypedFunc<(i32, i32), ()>,
    tick_fn: TickFn,
    on_resize_fn: Option<TypedFunc<(i32, i32), ()>>,
    on_key_down_fn: Option<TypedFunc<(i32, i32), ()>>,
    on_mouse_move_fn: Option<MouseMoveFn>,
    move_camera_fn: Option<TypedFunc<(f32, f32, f32), ()>>,
}

impl<G: GraphicsContext> ModuleInstance<G> {
    /// Instantiate `module` against the bridge and look up its exports
    pub fn new(
        engine: &WasmEngine,
        module: &Module,
        linker: &Linker<HostState<G>>,
        state: HostState<G>,
    ) -> Result<Self> {
        let mut store = Store::new(engine.engine(), state);
        let instance = linker
            .instantiate(&mut store, module)
            .context("Failed to instantiate WASM module")?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .context("Module does not export `memory`")?;
        store.data_mut().memory = Some(memory);

        let init_fn = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, "init")
            .context("Module must export `init(width, height)`")?;

        let tick_fn = match instance.get_typed_func::<(i32, i32, i32), ()>(&mut store, "tick") {
            Ok(tick) => TickFn::SizeAndPreviousFrame(tick),
            Err(_) => TickFn::Size(
                instance
                    .get_typed_func::<(i32, i32), ()>(&mut store, "tick")
                    .context("Module must export `tick(width, height[, previous_frame_unit])`")?,
            ),
        };

        let on_mouse_move_fn = optional_export::<(f32, f32), _>(&instance, &mut store, "onMouseMove")
            .map(MouseMoveFn::Float)
            .or_else(|| {
                optional_export::<(i32, i32), _>(&instance, &mut store, "onMouseMove")
                    .map(MouseMoveFn::Int)
            });

        Ok(Self {
            init_fn,
            tick_fn,
            on_resize_fn: optional_export(&instance, &mut store, "onResize"),
            on_key_down_fn: optional_export(&instance, &mut store, "onKeyDown"),
            on_mouse_move_fn,
            move_camera_fn: optional_export(&instance, &mut store, "moveCamera"),
            store,
        })
    }

    /// Get a reference to the host state
    pub fn host(&self) -> &HostState<G> {
        self.store.data()
    }

    /// Get a mutable reference to the host state
    pub fn host_mut(&mut self) -> &mut HostState<G> {
        self.store.data_mut()
    }

    /// Whether the module takes the previous frame's unit in `tick`
    pub fn reads_previous_frame(&self) -> bool {
        matches!(self.tick_fn, TickFn::SizeAndPreviousFrame(_))
    }
}

fn optional_export<Params: WasmParams, T: 'static>(
    instance: &Instance,
    store: &mut Store<T>,
    name: &str,
) -> Option<TypedFunc<Params, ()>> {
    match instance.get_typed_func::<Params, ()>(&mut *store, name) {
        Ok(func) => Some(func),
        Err(e) => {
            tracing::debug!("Optional export `{}` unavailable: {:#}", name, e);
            None
        }
    }
}

impl<G: GraphicsContext> HostedModule for ModuleInstance<G> {
    fn init(&mut self, width: u32, height: u32) -> Result<()> {
        self.init_fn
            .call(&mut self.store, (width as i32, height as i32))
            .context("init() failed")
    }

    /// Resize the host surface, then tell the module
    fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.store
            .data_mut()
            .resize_surface(width, height)
            .context("Failed to resize drawing surface")?;

        if let Some(on_resize) = &self.on_resize_fn {
            on_resize
                .call(&mut self.store, (width as i32, height as i32))
                .context("onResize() failed")?;
        }
        Ok(())
    }

    /// Frame setup, the module's `tick`, then ping-pong present
    fn tick(&mut self, width: u32, height: u32) -> Result<()> {
        self.store.data_mut().begin_frame();

        let (w, h) = (width as i32, height as i32);
        match &self.tick_fn {
            TickFn::Size(tick) => tick.call(&mut self.store, (w, h)),
            TickFn::SizeAndPreviousFrame(tick) => {
                let previous = self.store.data().previous_frame_unit().unwrap_or(0);
                tick.call(&mut self.store, (w, h, previous as i32))
            }
        }
        .context("tick() failed")?;

        self.store.data_mut().end_frame();
        Ok(())
    }

    fn on_key_down(&mut self, axis: u32, pressed: bool) -> Result<()> {
        let Some(on_key_down) = &self.on_key_down_fn else {
            return Ok(());
        };
        on_key_down
            .call(&mut self.store, (axis as i32, pressed as i32))
            .context("onKeyDown() failed")
    }

    fn on_mouse_move(&mut self, dx: f32, dy: f32) -> Result<()> {
        match &self.on_mouse_move_fn {
            Some(MouseMoveFn::Float(f)) => f.call(&mut self.store, (dx, dy)),
            Some(MouseMoveFn::Int(f)) => {
                f.call(&mut self.store, (dx.round() as i32, dy.round() as i32))
            }
            None => return Ok(()),
        }
        .context("onMouseMove() failed")
    }

    fn move_camera(&mut self, pitch: f32, yaw: f32, roll: f32) -> Result<()> {
        let Some(move_camera) = &self.move_camera_fn else {
            return Ok(());
        };
        move_camera
            .call(&mut self.store, (pitch, yaw, roll))
            .context("moveCamera() failed")
    }
}
