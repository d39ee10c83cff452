// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Datapoint timeline scrubber.
//!
//! This module provides the slider for navigating through video frames or
//! manifest rows and selecting the datapoint to annotate.

/// Result of timeline interaction.
pub enum TimelineAction {
    None,
    /// Switch to this datapoint index.
    Seek(usize),
}

/// Display the timeline scrubber for `max_index` datapoints.
pub fn show(ui: &mut egui::Ui, current_index: usize, max_index: usize) -> TimelineAction {
    let mut action = TimelineAction::None;
    if max_index == 0 {
        return action;
    }

    ui.horizontal(|ui| {
        if ui
            .add_enabled(current_index > 0, egui::Button::new("◀"))
            .clicked()
        {
            action = TimelineAction::Seek(current_index - 1);
        }
        if ui
            .add_enabled(current_index + 1 < max_index, egui::Button::new("▶"))
            .clicked()
        {
            action = TimelineAction::Seek(current_index + 1);
        }

        let mut position = current_index;
        let slider = egui::Slider::new(&mut position, 0..=max_index - 1)
            .show_value(false)
            .integer();
        if ui.add(slider).changed() && position != current_index {
            action = TimelineAction::Seek(position);
        }

        ui.label(format!("{} / {}", current_index + 1, max_index));
    });

    action
}
