// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Mask painting canvas.
//!
//! This module owns the interaction core of the application: the displayed
//! image, the active mask set, brush state, bounded undo/redo history, and
//! the zoom transform. Pointer drags become thick line segments rasterized
//! straight onto the active label's mask; the display is a CPU composite
//! of the base image with tinted mask overlays.

use std::collections::BTreeMap;

use anyhow::{ensure, Result};
use image::RgbImage;

use crate::models::history::History;
use crate::models::mask::{self, MaskSet, MASK_SET, MASK_UNSET};
use crate::util::color::label_color;

pub const ZOOM_MIN: f32 = 0.2;
pub const ZOOM_MAX: f32 = 5.0;
/// Fixed overlay opacity for mask tinting.
const OVERLAY_ALPHA: u8 = 120;

/// Brush mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Draw,
    Erase,
}

/// Which label overlays are composited over the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Every visible label.
    All,
    /// Only the active label.
    ActiveOnly,
}

/// Display style for one configured label.
pub struct LabelStyle {
    pub name: String,
    pub color: [u8; 3],
    pub visible: bool,
}

/// The mask painting canvas and its edit state.
pub struct MaskCanvas {
    image: Option<RgbImage>,
    mask_set: Option<MaskSet>,
    label_styles: Vec<LabelStyle>,
    active_label: String,
    mode: PaintMode,
    pen_size: u32,
    eraser_size: u32,
    zoom: f32,
    view_mode: ViewMode,
    history: History,
    drawing: bool,
    last_point: Option<(u32, u32)>,
    dirty: bool,
    texture: Option<egui::TextureHandle>,
    pending_offset: Option<egui::Vec2>,
}

impl MaskCanvas {
    /// Create a canvas for the configured label list. Labels without an
    /// explicit color get the default hue-stepped palette.
    pub fn new(
        labels: &[String],
        colors: &BTreeMap<String, [u8; 3]>,
        pen_size: u32,
        eraser_size: u32,
    ) -> Self {
        let label_styles = labels
            .iter()
            .enumerate()
            .map(|(i, name)| LabelStyle {
                name: name.clone(),
                color: colors.get(name).copied().unwrap_or_else(|| label_color(i)),
                visible: true,
            })
            .collect();
        Self {
            image: None,
            mask_set: None,
            label_styles,
            active_label: labels.first().cloned().unwrap_or_default(),
            mode: PaintMode::Draw,
            pen_size: pen_size.max(1),
            eraser_size: eraser_size.max(1),
            zoom: 1.0,
            view_mode: ViewMode::All,
            history: History::new(),
            drawing: false,
            last_point: None,
            dirty: true,
            texture: None,
            pending_offset: None,
        }
    }

    /// Replace the displayed image. Resets no other state.
    pub fn set_image(&mut self, image: RgbImage) -> Result<()> {
        ensure!(
            image.width() > 0 && image.height() > 0,
            "image must not be empty"
        );
        self.image = Some(image);
        self.dirty = true;
        Ok(())
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|i| i.dimensions())
    }

    /// Replace the active mask set wholesale (datapoint switch). Brush
    /// settings and zoom are untouched; history and any in-progress stroke
    /// are dropped because their snapshots belong to the old datapoint.
    pub fn set_mask_set(&mut self, mask_set: MaskSet) {
        if mask_set
            .labels()
            .iter()
            .ne(self.label_styles.iter().map(|s| &s.name))
        {
            log::warn!("Mask set labels do not match the configured labels");
        }
        self.mask_set = Some(mask_set);
        self.history.clear();
        self.drawing = false;
        self.last_point = None;
        self.dirty = true;
    }

    pub fn mask_set(&self) -> Option<&MaskSet> {
        self.mask_set.as_ref()
    }

    pub fn label_styles(&self) -> &[LabelStyle] {
        &self.label_styles
    }

    pub fn active_label(&self) -> &str {
        &self.active_label
    }

    /// Switch which label is edited and displayed. History is scoped to
    /// the active label, so both stacks are dropped.
    pub fn set_active_label(&mut self, label: &str) {
        if !self.label_styles.iter().any(|s| s.name == label) {
            log::warn!("Ignoring unknown label '{}'", label);
            return;
        }
        if self.active_label != label {
            self.active_label = label.to_string();
            self.history.clear();
            self.drawing = false;
            self.last_point = None;
            self.dirty = true;
        }
    }

    /// Toggle whether a label's overlay is composited.
    pub fn set_label_visible(&mut self, label: &str, visible: bool) {
        if let Some(style) = self.label_styles.iter_mut().find(|s| s.name == label) {
            if style.visible != visible {
                style.visible = visible;
                self.dirty = true;
            }
        }
    }

    /// Clear one label's raster in the canvas's copy of the mask set.
    pub fn clear_mask(&mut self, label: &str) {
        if let Some(set) = &mut self.mask_set {
            set.clear(label);
            self.dirty = true;
        }
    }

    pub fn mode(&self) -> PaintMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PaintMode) {
        self.mode = mode;
    }

    pub fn pen_size(&self) -> u32 {
        self.pen_size
    }

    pub fn set_pen_size(&mut self, size: u32) {
        self.pen_size = size.max(1);
    }

    pub fn eraser_size(&self) -> u32 {
        self.eraser_size
    }

    pub fn set_eraser_size(&mut self, size: u32) {
        self.eraser_size = size.max(1);
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.dirty = true;
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.pending_offset = Some(egui::Vec2::ZERO);
    }

    /// Zoom without an anchor (menu actions); the scroll offset is left
    /// where it is.
    pub fn zoom_step(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// Multiply the zoom factor, clamped to `[ZOOM_MIN, ZOOM_MAX]`, keeping
    /// the image point under the anchor visually stationary by recomputing
    /// the scroll offset. `anchor_content` is the cursor position relative
    /// to the image origin, `anchor_viewport` relative to the visible area.
    pub fn zoom_by(
        &mut self,
        factor: f32,
        anchor_content: egui::Vec2,
        anchor_viewport: egui::Vec2,
    ) -> egui::Vec2 {
        let old_zoom = self.zoom;
        self.zoom = (old_zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        let offset = anchor_content * (self.zoom / old_zoom) - anchor_viewport;
        if self.zoom != old_zoom {
            self.pending_offset = Some(offset);
        }
        offset
    }

    /// Map a widget-space point (relative to the image origin) to image
    /// pixel coordinates. Returns `None` when the projection falls outside
    /// the image; out-of-bounds points are never drawn.
    pub fn to_image_coordinates(&self, widget_point: egui::Vec2) -> Option<(u32, u32)> {
        let (width, height) = self.image_size()?;
        let x = (widget_point.x / self.zoom).floor();
        let y = (widget_point.y / self.zoom).floor();
        if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
            return None;
        }
        Some((x as u32, y as u32))
    }

    /// Start a freehand stroke: snapshot the active label's raster onto
    /// the history (evicting the oldest at capacity) and invalidate redo.
    pub fn begin_stroke(&mut self, point: (u32, u32)) {
        let Some((width, height)) = self.image_size() else {
            return;
        };
        let Some(set) = &mut self.mask_set else {
            return;
        };
        let current = set.get_or_blank(&self.active_label, width, height);
        self.history.push(current.clone());
        set.set(&self.active_label, current);
        self.drawing = true;
        self.last_point = Some(point);
    }

    /// Rasterize a line segment from the last recorded point to `point`
    /// with the current mode's value and thickness. No-op when no stroke
    /// is in progress.
    pub fn extend_stroke(&mut self, point: (u32, u32)) {
        if !self.drawing {
            return;
        }
        let Some(last) = self.last_point else {
            return;
        };
        let (thickness, value) = match self.mode {
            PaintMode::Draw => (self.pen_size, MASK_SET),
            PaintMode::Erase => (self.eraser_size, MASK_UNSET),
        };
        if let Some(raster) = self
            .mask_set
            .as_mut()
            .and_then(|s| s.get_mut(&self.active_label))
        {
            mask::paint_segment(raster, last, point, thickness, value);
            self.dirty = true;
        }
        self.last_point = Some(point);
    }

    /// Terminate the current stroke; no raster change.
    pub fn end_stroke(&mut self) {
        self.drawing = false;
        self.last_point = None;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the most recent history snapshot, pushing the current
    /// raster onto the redo stack. No-op when history is empty.
    pub fn undo(&mut self) {
        let Some((width, height)) = self.image_size() else {
            return;
        };
        let Some(set) = &mut self.mask_set else {
            return;
        };
        let current = set.get_or_blank(&self.active_label, width, height);
        if let Some(previous) = self.history.undo(current) {
            set.set(&self.active_label, previous);
            self.dirty = true;
        }
    }

    /// Inverse of [`undo`](Self::undo). No-op when the redo stack is empty.
    pub fn redo(&mut self) {
        let Some((width, height)) = self.image_size() else {
            return;
        };
        let Some(set) = &mut self.mask_set else {
            return;
        };
        let current = set.get_or_blank(&self.active_label, width, height);
        if let Some(next) = self.history.redo(current) {
            set.set(&self.active_label, next);
            self.dirty = true;
        }
    }

    /// Composite the base image with every displayed mask overlay.
    fn composite(&self) -> Option<egui::ColorImage> {
        let image = self.image.as_ref()?;
        let (width, height) = image.dimensions();
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for p in image.pixels() {
            rgba.extend_from_slice(&[p.0[0], p.0[1], p.0[2], 255]);
        }

        let alpha = OVERLAY_ALPHA as f32 / 255.0;
        for style in &self.label_styles {
            if !style.visible {
                continue;
            }
            if self.view_mode == ViewMode::ActiveOnly && style.name != self.active_label {
                continue;
            }
            let Some(raster) = self.mask_set.as_ref().and_then(|s| s.get(&style.name)) else {
                continue;
            };
            let (mw, mh) = raster.dimensions();
            if (mw, mh) != (width, height) {
                log::warn!(
                    "Mask for '{}' is {}x{}, image is {}x{}; compositing intersection",
                    style.name,
                    mw,
                    mh,
                    width,
                    height
                );
            }
            for y in 0..mh.min(height) {
                for x in 0..mw.min(width) {
                    if raster.get_pixel(x, y).0[0] == MASK_UNSET {
                        continue;
                    }
                    let i = ((y * width + x) * 4) as usize;
                    for c in 0..3 {
                        let blended = rgba[i + c] as f32 * (1.0 - alpha)
                            + style.color[c] as f32 * alpha;
                        rgba[i + c] = blended.round() as u8;
                    }
                }
            }
        }
        Some(egui::ColorImage::from_rgba_unmultiplied(
            [width as usize, height as usize],
            &rgba,
        ))
    }

    /// Display the canvas and handle pointer interaction.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

        let Some((width, height)) = self.image_size() else {
            self.show_welcome(ui);
            return;
        };

        let mut scroll = egui::ScrollArea::both().auto_shrink([false, false]);
        if let Some(offset) = self.pending_offset.take() {
            scroll = scroll.scroll_offset(offset.max(egui::Vec2::ZERO));
        }
        scroll.show(ui, |ui| {
            let size = egui::vec2(width as f32 * self.zoom, height as f32 * self.zoom);
            let (rect, response) =
                ui.allocate_exact_size(size, egui::Sense::click_and_drag());

            // Stroke lifecycle from pointer drags
            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    if let Some(point) = self.to_image_coordinates(pos - rect.min) {
                        self.begin_stroke(point);
                    }
                }
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    if let Some(point) = self.to_image_coordinates(pos - rect.min) {
                        self.extend_stroke(point);
                    }
                }
            }
            if response.drag_stopped() {
                self.end_stroke();
            }

            // Ctrl+wheel / pinch zoom anchored at the cursor
            if let Some(hover) = response.hover_pos() {
                let zoom_delta = ui.input(|i| i.zoom_delta());
                if zoom_delta != 1.0 {
                    let viewport_min = ui.clip_rect().min;
                    self.zoom_by(zoom_delta, hover - rect.min, hover - viewport_min);
                }
            }

            if self.dirty || self.texture.is_none() {
                if let Some(composited) = self.composite() {
                    self.texture = Some(ui.ctx().load_texture(
                        "mask_canvas",
                        composited,
                        egui::TextureOptions::NEAREST,
                    ));
                    self.dirty = false;
                }
            }
            if let Some(texture) = &self.texture {
                ui.painter().image(
                    texture.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        });
    }

    fn show_welcome(&self, ui: &mut egui::Ui) {
        ui.centered_and_justified(|ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                ui.heading(
                    egui::RichText::new("SMAT")
                        .size(32.0)
                        .color(egui::Color32::from_gray(200)),
                );
                ui.label(
                    egui::RichText::new("Segmentation Mask Annotation Tool")
                        .size(14.0)
                        .color(egui::Color32::from_gray(150)),
                );
                ui.add_space(20.0);
                ui.label(
                    egui::RichText::new("Open a video folder or image manifest to begin")
                        .color(egui::Color32::from_gray(180)),
                );
                ui.add_space(10.0);
                ui.label(
                    egui::RichText::new("File → Open...")
                        .weak()
                        .color(egui::Color32::from_gray(130)),
                );
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn canvas() -> MaskCanvas {
        let labels = vec!["Polyp".to_string(), "Wire".to_string()];
        let mut canvas = MaskCanvas::new(&labels, &BTreeMap::new(), 3, 8);
        canvas.set_image(RgbImage::new(32, 32)).unwrap();
        canvas.set_mask_set(MaskSet::new(&labels, 0, "0000000"));
        canvas
    }

    fn active_mask(canvas: &MaskCanvas) -> GrayImage {
        canvas
            .mask_set()
            .unwrap()
            .get_or_blank(canvas.active_label(), 32, 32)
    }

    /// One stroke painting a single pixel column at x.
    fn stroke_at(canvas: &mut MaskCanvas, x: u32) {
        canvas.begin_stroke((x, 0));
        canvas.extend_stroke((x, 0));
        canvas.end_stroke();
    }

    #[test]
    fn test_empty_image_rejected() {
        let labels = vec!["Polyp".to_string()];
        let mut canvas = MaskCanvas::new(&labels, &BTreeMap::new(), 3, 8);
        assert!(canvas.set_image(RgbImage::new(0, 0)).is_err());
    }

    #[test]
    fn test_stroke_paints_segment() {
        let mut canvas = canvas();
        canvas.begin_stroke((4, 8));
        canvas.extend_stroke((20, 8));
        canvas.end_stroke();
        let mask = active_mask(&canvas);
        assert_eq!(mask.get_pixel(4, 8).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(12, 8).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(20, 8).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(12, 25).0[0], MASK_UNSET);
    }

    #[test]
    fn test_extend_without_begin_is_noop() {
        let mut canvas = canvas();
        canvas.extend_stroke((5, 5));
        assert!(active_mask(&canvas).pixels().all(|p| p.0[0] == MASK_UNSET));
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_erase_mode_clears() {
        let mut canvas = canvas();
        canvas.begin_stroke((0, 16));
        canvas.extend_stroke((31, 16));
        canvas.end_stroke();

        canvas.set_mode(PaintMode::Erase);
        canvas.begin_stroke((0, 16));
        canvas.extend_stroke((31, 16));
        canvas.end_stroke();
        assert!(active_mask(&canvas).pixels().all(|p| p.0[0] == MASK_UNSET));
    }

    #[test]
    fn test_undo_redo_are_inverses() {
        let mut canvas = canvas();
        stroke_at(&mut canvas, 4);
        let after_first = active_mask(&canvas);
        stroke_at(&mut canvas, 9);
        let after_second = active_mask(&canvas);

        canvas.undo();
        assert_eq!(active_mask(&canvas), after_first);
        canvas.redo();
        assert_eq!(active_mask(&canvas), after_second);
    }

    #[test]
    fn test_history_capacity_is_fifty() {
        let mut canvas = canvas();
        // Thickness 1 keeps each stroke inside its own pixel column
        canvas.set_pen_size(1);
        for x in 0..60 {
            stroke_at(&mut canvas, x % 32);
        }
        let mut undos = 0;
        while canvas.can_undo() {
            canvas.undo();
            undos += 1;
        }
        assert_eq!(undos, 50);
        // State before stroke 11: columns 0..=9 painted, column 10 not yet
        let mask = active_mask(&canvas);
        assert_eq!(mask.get_pixel(9, 0).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(10, 0).0[0], MASK_UNSET);
        // Further undo is a no-op
        canvas.undo();
        assert_eq!(active_mask(&canvas), mask);
    }

    #[test]
    fn test_new_stroke_invalidates_redo() {
        let mut canvas = canvas();
        stroke_at(&mut canvas, 2);
        canvas.undo();
        stroke_at(&mut canvas, 5);
        let before_redo = active_mask(&canvas);
        canvas.redo();
        assert_eq!(active_mask(&canvas), before_redo);
    }

    #[test]
    fn test_label_switch_clears_history() {
        let mut canvas = canvas();
        stroke_at(&mut canvas, 3);
        assert!(canvas.can_undo());
        canvas.set_active_label("Wire");
        assert!(!canvas.can_undo());
        // Undo must not install Polyp's raster onto Wire
        canvas.undo();
        assert!(canvas.mask_set().unwrap().get("Wire").is_none());
    }

    #[test]
    fn test_unknown_label_ignored() {
        let mut canvas = canvas();
        canvas.set_active_label("Tumor");
        assert_eq!(canvas.active_label(), "Polyp");
    }

    #[test]
    fn test_coordinates_at_multiple_zooms() {
        let mut canvas = canvas();
        for factor in [0.2_f32, 0.5, 1.0, 2.0, 5.0] {
            canvas.zoom = factor;
            assert_eq!(
                canvas.to_image_coordinates(egui::vec2(10.0 * factor, 6.0 * factor)),
                Some((10, 6))
            );
            // Just past the right edge projects outside
            assert_eq!(
                canvas.to_image_coordinates(egui::vec2(32.0 * factor, 0.0)),
                None
            );
            assert_eq!(canvas.to_image_coordinates(egui::vec2(-0.5, 0.0)), None);
        }
    }

    #[test]
    fn test_zoom_clamped() {
        let mut canvas = canvas();
        canvas.zoom_by(100.0, egui::Vec2::ZERO, egui::Vec2::ZERO);
        assert_eq!(canvas.zoom(), ZOOM_MAX);
        canvas.zoom_by(1e-6, egui::Vec2::ZERO, egui::Vec2::ZERO);
        assert_eq!(canvas.zoom(), ZOOM_MIN);
    }

    #[test]
    fn test_zoom_keeps_anchor_stationary() {
        let mut canvas = canvas();
        // Cursor over image point (20, 20) at zoom 1, no prior scroll
        let anchor_content = egui::vec2(20.0, 20.0);
        let anchor_viewport = egui::vec2(20.0, 20.0);
        let offset = canvas.zoom_by(2.0, anchor_content, anchor_viewport);
        // The anchored image point now sits at content (40, 40); the new
        // offset must place it back under the cursor
        assert_eq!(offset, egui::vec2(20.0, 20.0));
        let content_after = anchor_content * 2.0 - offset;
        assert_eq!(content_after, anchor_viewport);
    }

    #[test]
    fn test_mask_set_swap_clears_history() {
        let mut canvas = canvas();
        stroke_at(&mut canvas, 7);
        let labels = vec!["Polyp".to_string(), "Wire".to_string()];
        canvas.set_mask_set(MaskSet::new(&labels, 1, "0000001"));
        assert!(!canvas.can_undo());
        assert!(!canvas.can_redo());
    }

    #[test]
    fn test_mask_set_exposes_edits_for_flush() {
        let mut canvas = canvas();
        stroke_at(&mut canvas, 1);
        let set = canvas.mask_set().unwrap();
        assert!(set.get("Polyp").is_some());
        assert_eq!(set.index(), 0);
    }
}
