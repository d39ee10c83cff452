// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with brush controls.
//!
//! This module provides the toolbar interface for switching between draw
//! and erase modes, adjusting brush sizes, undo/redo, and the overlay
//! view mode.

use crate::ui::canvas::{MaskCanvas, PaintMode, ViewMode};

/// Display the toolbar and apply its edits to the canvas.
pub fn show(ui: &mut egui::Ui, canvas: &mut MaskCanvas) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Brush:");

        // Draw tool
        if ui
            .selectable_label(canvas.mode() == PaintMode::Draw, "✏ Draw")
            .clicked()
        {
            canvas.set_mode(PaintMode::Draw);
        }

        // Erase tool
        if ui
            .selectable_label(canvas.mode() == PaintMode::Erase, "◻ Erase")
            .clicked()
        {
            canvas.set_mode(PaintMode::Erase);
        }

        ui.separator();

        let mut pen_size = canvas.pen_size();
        if ui
            .add(egui::Slider::new(&mut pen_size, 1..=64).text("Pen"))
            .changed()
        {
            canvas.set_pen_size(pen_size);
        }
        let mut eraser_size = canvas.eraser_size();
        if ui
            .add(egui::Slider::new(&mut eraser_size, 1..=64).text("Eraser"))
            .changed()
        {
            canvas.set_eraser_size(eraser_size);
        }

        ui.separator();

        if ui
            .add_enabled(canvas.can_undo(), egui::Button::new("⟲ Undo"))
            .clicked()
        {
            canvas.undo();
        }
        if ui
            .add_enabled(canvas.can_redo(), egui::Button::new("⟳ Redo"))
            .clicked()
        {
            canvas.redo();
        }

        ui.separator();

        let active_only = canvas.view_mode() == ViewMode::ActiveOnly;
        if ui
            .selectable_label(active_only, "Active label only")
            .clicked()
        {
            canvas.set_view_mode(if active_only {
                ViewMode::All
            } else {
                ViewMode::ActiveOnly
            });
        }

        ui.separator();

        // Mode hint
        let hint = match canvas.mode() {
            PaintMode::Draw => "Drag to paint the active label",
            PaintMode::Erase => "Drag to erase the active label",
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });
}
