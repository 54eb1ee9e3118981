#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod cascade_download;
mod config;
mod controller;
mod pipeline;
mod storage;
mod types;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use gpui::Application;

use cascade_download::ensure_cascade_ready;
use config::AppConfig;
use controller::AppBuilder;
use pipeline::HaarCascadeLocator;

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::parse();

    if config.list_cameras {
        return list_cameras();
    }

    ensure_cascade_ready(&config.cascade_path, |event| {
        log::debug!("cascade provisioning: {event:?}");
    })?;
    let locator = HaarCascadeLocator::load(&config.cascade_path)
        .with_context(|| format!("failed to load {}", config.cascade_path.display()))?;

    let builder = AppBuilder::new(config).face_locator(locator);
    #[cfg(feature = "camera-nokhwa")]
    let builder = builder.frame_source(pipeline::NokhwaSource);
    let assembly = builder.build()?;

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, assembly) {
                log::error!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}

#[cfg(feature = "camera-nokhwa")]
fn list_cameras() -> Result<()> {
    let cameras = pipeline::available_cameras()?;
    if cameras.is_empty() {
        println!("no cameras found");
    }
    for camera in cameras {
        println!("{}: {}", camera.index, camera.label);
    }
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn list_cameras() -> Result<()> {
    anyhow::bail!("built without camera support; enable the `camera-nokhwa` feature")
}
