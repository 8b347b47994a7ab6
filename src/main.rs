// src/main.rs
use std::env;

use eframe::egui as eg;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trakt_shell::app::ShellApp;
use trakt_shell::config::load_config;

const RENDERER_ENV_VAR: &str = "TRAKT_SHELL_RENDERER";

/// Renderer override; `None` keeps eframe's own choice.
fn renderer_override() -> Option<eframe::Renderer> {
    let raw = env::var(RENDERER_ENV_VAR).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "glow" | "gl" | "opengl" => Some(eframe::Renderer::Glow),
        "wgpu" | "dx12" | "vulkan" | "metal" => Some(eframe::Renderer::Wgpu),
        "" => None,
        other => {
            warn!("Unknown {RENDERER_ENV_VAR} value `{other}`; using the default renderer.");
            None
        }
    }
}

fn main() -> eframe::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cfg = load_config();
    info!(
        "api_base={} language={} debug_attached={}",
        cfg.api_base, cfg.language, cfg.debug_attached
    );

    let mut options = eframe::NativeOptions {
        viewport: eg::ViewportBuilder::default()
            .with_title("Trakt")
            .with_inner_size([720.0, 560.0])
            .with_min_inner_size([420.0, 320.0]),
        ..Default::default()
    };
    if let Some(renderer) = renderer_override() {
        info!("renderer forced via {RENDERER_ENV_VAR}: {renderer:?}");
        options.renderer = renderer;
    }

    eframe::run_native(
        "trakt-shell",
        options,
        Box::new(move |cc| Ok(Box::new(ShellApp::new(cc, cfg)))),
    )
    .map_err(|e| {
        error!("could not open the window: {e}");
        error!("Set {RENDERER_ENV_VAR}=glow or =wgpu to try the other backend.");
        e
    })
}
