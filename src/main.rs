// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! SMAT - Segmentation Mask Annotation Tool
//!
//! A desktop application for painting per-pixel segmentation masks over
//! video frames and CSV-indexed image collections.

mod app;
mod config;
mod io;
mod models;
mod ui;
mod util;

use std::path::Path;

use anyhow::Result;
use app::SmatApp;
use config::AppConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Label set and brush defaults come from the config file; the path may
    // be overridden as the first command line argument.
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let config = AppConfig::load_or_default(Path::new(&config_path))?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("SMAT - Segmentation Mask Annotation Tool"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "SMAT",
        options,
        Box::new(|_cc| Ok(Box::new(SmatApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
