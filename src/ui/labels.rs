// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label panel.
//!
//! This module lists the configured labels with their overlay colors,
//! visibility toggles, active-label selection, and a per-label action to
//! clear the current datapoint's mask.

use crate::ui::canvas::LabelStyle;

/// Result of label panel interaction.
pub enum LabelsAction {
    None,
    /// Make this label the active one.
    Select(String),
    /// Toggle overlay visibility for this label.
    ToggleVisibility(String),
    /// Clear this label's mask for the current datapoint.
    ClearMask(String),
}

/// Display the label panel and report the selected action.
pub fn show(ui: &mut egui::Ui, labels: &[LabelStyle], active_label: &str) -> LabelsAction {
    let mut action = LabelsAction::None;

    ui.heading("Labels");
    ui.separator();

    for style in labels {
        ui.horizontal(|ui| {
            // Color swatch
            let (swatch, _) =
                ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
            ui.painter().rect_filled(
                swatch,
                2.0,
                egui::Color32::from_rgb(style.color[0], style.color[1], style.color[2]),
            );

            let mut visible = style.visible;
            if ui.checkbox(&mut visible, "").on_hover_text("Show overlay").changed() {
                action = LabelsAction::ToggleVisibility(style.name.clone());
            }

            if ui
                .selectable_label(style.name == active_label, &style.name)
                .clicked()
            {
                action = LabelsAction::Select(style.name.clone());
            }

            if ui.small_button("Clear").on_hover_text("Clear this label's mask").clicked() {
                action = LabelsAction::ClearMask(style.name.clone());
            }
        });
    }

    action
}
