//! Raylink - Standalone Host
//!
//! Runs a compiled ray-tracing module in a window.
//!
//! # Usage
//!
//! ```bash
//! raylink zig-out/bin/raytracer.wasm
//! raylink https://example.com/raytracer.wasm --ping-pong
//! raylink --config ./raylink.toml --width 1920 --height 1080
//! raylink raytracer.wasm --assets ./textures
//! ```
//!
//! # Controls
//!
//! - Click: Capture the pointer (mouse look, WASD movement)
//! - ESC: Release the pointer
//! - Touch: Drag to look, bottom-left joystick to move

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use raylink_core::{HostConfig, Location, fetch_module};
use raylink_gl::{LaunchConfig, SurfaceError};

#[derive(Parser)]
#[command(name = "raylink")]
#[command(author, version, about = "Raylink - host for WebAssembly ray tracers")]
struct Args {
    /// Module to run: a .wasm path or http(s) URL (default: from config)
    module: Option<String>,

    /// Config file (default: <config dir>/raylink/config.toml)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render through ping-pong framebuffers
    #[arg(long)]
    ping_pong: bool,

    /// Initial window width in logical pixels
    #[arg(long)]
    width: Option<u32>,

    /// Initial window height in logical pixels
    #[arg(long)]
    height: Option<u32>,

    /// Directory relative texture sources resolve against
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,
}

impl Args {
    /// Command-line flags win over the config file
    fn apply(self, config: &mut HostConfig) {
        if let Some(module) = self.module {
            config.module.source = module;
        }
        if self.ping_pong {
            config.render.ping_pong = true;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if let Some(assets) = self.assets {
            config.assets.root = Some(assets);
        }
    }
}

fn show_environment_error(error: &SurfaceError) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Raylink cannot start")
        .set_description(format!(
            "This machine could not provide an OpenGL ES 3.0 context.\n\n{error}"
        ))
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = HostConfig::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting raylink");
    tracing::info!("Module: {}", config.module.source);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let module = Location::parse(&config.module.source);
    let module_bytes = runtime.block_on(fetch_module(&module))?;

    let launch = LaunchConfig {
        config,
        module,
        module_bytes,
        runtime: runtime.handle().clone(),
    };

    let result = raylink_gl::run(launch);
    if let Err(e) = &result
        && let Some(surface_error) = e.downcast_ref::<SurfaceError>()
    {
        show_environment_error(surface_error);
    }
    result
}
