// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait, mediating between the UI controls, the mask
//! canvas, and the active data source.

use crate::config::AppConfig;
use crate::io::source::DataSource;
use crate::io::table::TableSource;
#[cfg(feature = "video-opencv")]
use crate::io::video::VideoSource;
use crate::ui::canvas::MaskCanvas;
use crate::ui::{labels, timeline, toolbar};

/// Main application state.
pub struct SmatApp {
    /// Session configuration (labels, colors, brush defaults)
    config: AppConfig,

    /// The mask painting canvas
    canvas: MaskCanvas,

    /// Active data source (if a video or manifest is loaded)
    source: Option<Box<dyn DataSource>>,

    /// Index of the datapoint currently on the canvas
    current_index: usize,

    /// Blocking notice shown to the user (errors and save confirmations)
    notice: Option<String>,
}

impl SmatApp {
    /// Create a new SMAT application instance.
    pub fn new(config: AppConfig) -> Self {
        let canvas = MaskCanvas::new(
            &config.labels,
            &config.colors,
            config.pen_size,
            config.eraser_size,
        );
        Self {
            config,
            canvas,
            source: None,
            current_index: 0,
            notice: None,
        }
    }

    fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// Put a freshly opened source on screen, starting at datapoint 0.
    fn install_source(&mut self, mut source: Box<dyn DataSource>) {
        let loaded = source
            .get_datapoint(0)
            .and_then(|image| source.get_masks(0).map(|masks| (image, masks)));
        match loaded {
            Ok((image, masks)) => {
                if let Err(e) = self.canvas.set_image(image) {
                    self.notify(e.to_string());
                    return;
                }
                self.canvas.set_mask_set(masks);
                self.canvas.reset_zoom();
                self.current_index = 0;
                log::info!(
                    "Source ready: {} datapoints, labels [{}]",
                    source.max_index(),
                    source.labels().join(", ")
                );
                self.source = Some(source);
            }
            Err(e) => self.notify(format!("Failed to load first datapoint: {}", e)),
        }
    }

    /// Open a CSV manifest through the native file picker.
    fn open_manifest(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV manifest", &["csv"])
            .pick_file()
        else {
            return; // cancelled
        };
        match TableSource::open(&path, self.config.labels.clone()) {
            Ok(source) => {
                log::info!("Opened manifest {}", path.display());
                self.install_source(Box::new(source));
            }
            Err(e) => self.notify(format!("Failed to open manifest: {}", e)),
        }
    }

    /// Open a video directory through the native folder picker.
    #[cfg(feature = "video-opencv")]
    fn open_video(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return; // cancelled
        };
        match VideoSource::open(&dir, self.config.labels.clone()) {
            Ok(source) => {
                log::info!("Opened video directory {}", dir.display());
                self.install_source(Box::new(source));
            }
            Err(e) => self.notify(format!("Failed to open video: {}", e)),
        }
    }

    /// Write the canvas's mask set back into the source. Skipping this
    /// before a seek would silently discard the datapoint's edits.
    fn flush_masks(&mut self) {
        if let Some(source) = &mut self.source {
            if let Some(masks) = self.canvas.mask_set().cloned() {
                let index = masks.index();
                if let Err(e) = source.set_masks(index, masks) {
                    log::error!("Failed to flush masks for datapoint {}: {}", index, e);
                }
            }
        }
    }

    /// Switch the canvas to another datapoint, flushing first.
    fn goto_index(&mut self, index: usize) {
        if self.source.is_none() || index == self.current_index {
            return;
        }
        self.flush_masks();

        let Some(source) = &mut self.source else {
            return;
        };
        let loaded = source
            .get_datapoint(index)
            .and_then(|image| source.get_masks(index).map(|masks| (image, masks)));
        match loaded {
            Ok((image, masks)) => {
                if let Err(e) = self.canvas.set_image(image) {
                    self.notify(e.to_string());
                    return;
                }
                self.canvas.set_mask_set(masks);
                self.canvas.reset_zoom();
                self.current_index = index;
                log::info!("Switched to datapoint {}", index);
            }
            Err(e) => self.notify(format!("Failed to load datapoint {}: {}", index, e)),
        }
    }

    /// Save every painted mask under a user-chosen folder.
    fn save_masks(&mut self) {
        if self.source.is_none() {
            return;
        }
        let Some(folder) = rfd::FileDialog::new().pick_folder() else {
            return; // cancelled
        };
        self.flush_masks();

        let Some(source) = &self.source else {
            return;
        };
        let target = folder.join(source.output_name());
        if let Err(e) = std::fs::create_dir_all(&target) {
            self.notify(format!("Cannot create {}: {}", target.display(), e));
            return;
        }
        match source.save_all(&target) {
            Ok(written) => {
                self.notify(format!(
                    "Saved {} mask files to {}",
                    written,
                    target.display()
                ));
            }
            Err(e) => self.notify(format!("Failed to save masks: {}", e)),
        }
    }

    /// Clear one label's mask for the current datapoint, in both the
    /// source and the canvas's working copy.
    fn delete_mask(&mut self, label: &str) {
        let Some(source) = &mut self.source else {
            return;
        };
        match source.delete_mask(self.current_index, label) {
            Ok(()) => {
                self.canvas.clear_mask(label);
                log::info!(
                    "Cleared '{}' mask for datapoint {}",
                    label,
                    self.current_index
                );
            }
            Err(e) => self.notify(format!("Failed to clear mask: {}", e)),
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image Manifest...").clicked() {
                        self.open_manifest();
                        ui.close_menu();
                    }
                    #[cfg(feature = "video-opencv")]
                    if ui.button("Open Video Folder...").clicked() {
                        self.open_video();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_source = self.source.is_some();
                    if ui
                        .add_enabled(has_source, egui::Button::new("Save Masks..."))
                        .clicked()
                    {
                        self.save_masks();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.canvas.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        self.canvas.undo();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(
                            self.canvas.can_redo(),
                            egui::Button::new("Redo (Ctrl+Shift+Z)"),
                        )
                        .clicked()
                    {
                        self.canvas.redo();
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.canvas.zoom_step(1.25);
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.canvas.zoom_step(0.8);
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom").clicked() {
                        self.canvas.reset_zoom();
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        // Undo (Ctrl+Z)
        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift)
        {
            self.canvas.undo();
        }

        // Redo (Ctrl+Shift+Z or Ctrl+Y)
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.canvas.redo();
        }

        // Arrow keys scrub the timeline
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) && self.current_index > 0 {
            self.goto_index(self.current_index - 1);
        }
        let max_index = self.source.as_ref().map_or(0, |s| s.max_index());
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight))
            && self.current_index + 1 < max_index
        {
            self.goto_index(self.current_index + 1);
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = self.notice.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&message);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        self.notice = None;
                    }
                });
            });
    }
}

impl eframe::App for SmatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show_menu_bar(ctx);
        self.handle_keyboard(ctx);

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.canvas);
        });

        // Label panel (right side)
        let labels_action = egui::SidePanel::right("labels")
            .default_width(220.0)
            .show(ctx, |ui| {
                labels::show(ui, self.canvas.label_styles(), self.canvas.active_label())
            })
            .inner;

        match labels_action {
            labels::LabelsAction::Select(label) => {
                self.canvas.set_active_label(&label);
                log::info!("Active label: {}", label);
            }
            labels::LabelsAction::ToggleVisibility(label) => {
                let visible = self
                    .canvas
                    .label_styles()
                    .iter()
                    .find(|s| s.name == label)
                    .map_or(true, |s| s.visible);
                self.canvas.set_label_visible(&label, !visible);
            }
            labels::LabelsAction::ClearMask(label) => {
                self.delete_mask(&label);
            }
            labels::LabelsAction::None => {}
        }

        // Timeline and status (bottom)
        let max_index = self.source.as_ref().map_or(0, |s| s.max_index());
        let timeline_action = egui::TopBottomPanel::bottom("timeline")
            .show(ctx, |ui| {
                let action = timeline::show(ui, self.current_index, max_index);
                ui.horizontal(|ui| {
                    ui.label(format!("Zoom: {:.0}%", self.canvas.zoom() * 100.0));
                    ui.separator();
                    ui.label(format!("Label: {}", self.canvas.active_label()));
                    ui.separator();
                    if self.source.is_some() {
                        ui.label("Ready");
                    } else {
                        ui.label("No data loaded");
                    }
                });
                action
            })
            .inner;

        if let timeline::TimelineAction::Seek(index) = timeline_action {
            self.goto_index(index);
        }

        // Main canvas (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas.show(ui);
        });

        self.show_notice(ctx);
    }
}
