// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Mask data structures and raster operations.
//!
//! This module defines the per-datapoint mask set (one optional binary
//! raster per configured label) and the low-level raster operations used
//! by the brush tool: binarization and thick line segment painting.

use image::GrayImage;

/// Pixel value of a painted mask region.
pub const MASK_SET: u8 = 255;
/// Pixel value of an unpainted mask region.
pub const MASK_UNSET: u8 = 0;
/// Grayscale threshold separating set from unset when loading masks from disk.
pub const BINARY_THRESHOLD: u8 = 127;

/// All masks painted for one datapoint, keyed by label name.
///
/// The label key set is fixed at construction and never changes; only the
/// raster stored under each label may be set or cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSet {
    index: usize,
    save_name: String,
    labels: Vec<String>,
    masks: Vec<Option<GrayImage>>,
}

impl MaskSet {
    /// Create an all-absent mask set for the given datapoint.
    pub fn new(labels: &[String], index: usize, save_name: impl Into<String>) -> Self {
        Self {
            index,
            save_name: save_name.into(),
            labels: labels.to_vec(),
            masks: vec![None; labels.len()],
        }
    }

    /// Datapoint index this set belongs to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// File stem used when serializing this set's masks.
    pub fn save_name(&self) -> &str {
        &self.save_name
    }

    /// The configured label names, in order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Replace the raster stored for `label`. Unknown labels are ignored.
    pub fn set(&mut self, label: &str, mask: GrayImage) {
        match self.position(label) {
            Some(i) => self.masks[i] = Some(mask),
            None => log::warn!("Ignoring mask for unknown label '{}'", label),
        }
    }

    /// The raster stored for `label`, if any has been painted or loaded.
    pub fn get(&self, label: &str) -> Option<&GrayImage> {
        self.position(label).and_then(|i| self.masks[i].as_ref())
    }

    /// Mutable access to the raster stored for `label`.
    pub fn get_mut(&mut self, label: &str) -> Option<&mut GrayImage> {
        self.position(label).and_then(|i| self.masks[i].as_mut())
    }

    /// The stored raster for `label`, or a zero-filled raster of the given
    /// shape when absent. Used whenever drawing must proceed without a
    /// prior mask.
    pub fn get_or_blank(&self, label: &str, width: u32, height: u32) -> GrayImage {
        self.get(label)
            .cloned()
            .unwrap_or_else(|| GrayImage::new(width, height))
    }

    /// Clear the raster for `label`, returning it to the absent state.
    pub fn clear(&mut self, label: &str) {
        if let Some(i) = self.position(label) {
            self.masks[i] = None;
        }
    }

    /// True if at least one label has a raster.
    pub fn has_any(&self) -> bool {
        self.masks.iter().any(|m| m.is_some())
    }

    /// Iterate over (label, raster) pairs for labels that have a raster.
    pub fn present(&self) -> impl Iterator<Item = (&str, &GrayImage)> {
        self.labels
            .iter()
            .zip(&self.masks)
            .filter_map(|(l, m)| m.as_ref().map(|m| (l.as_str(), m)))
    }
}

/// Force a grayscale raster to exact binary values.
///
/// Values above [`BINARY_THRESHOLD`] become [`MASK_SET`], everything else
/// [`MASK_UNSET`]. Applied to every mask loaded from disk.
pub fn binarize(mut mask: GrayImage) -> GrayImage {
    for p in mask.pixels_mut() {
        p.0[0] = if p.0[0] > BINARY_THRESHOLD { MASK_SET } else { MASK_UNSET };
    }
    mask
}

/// Paint one thick line segment onto a mask raster.
///
/// The segment is rasterized with round caps and round joins: every pixel
/// whose center lies within `thickness / 2` of the segment is written.
/// Consecutive strokes share endpoints, so polylines have no gaps.
pub fn paint_segment(
    mask: &mut GrayImage,
    from: (u32, u32),
    to: (u32, u32),
    thickness: u32,
    value: u8,
) {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let radius = thickness.max(1) as f32 / 2.0;
    let (x0, y0) = (from.0 as f32, from.1 as f32);
    let (x1, y1) = (to.0 as f32, to.1 as f32);

    let reach = radius.ceil() as i64 + 1;
    let min_x = ((x0.min(x1) as i64) - reach).max(0) as u32;
    let max_x = ((x0.max(x1) as i64) + reach).min(w as i64 - 1) as u32;
    let min_y = ((y0.min(y1) as i64) - reach).max(0) as u32;
    let max_y = ((y0.max(y1) as i64) + reach).min(h as i64 - 1) as u32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if distance_to_segment(x as f32, y as f32, x0, y0, x1, y1) <= radius {
                mask.put_pixel(x, y, image::Luma([value]));
            }
        }
    }
}

/// Distance from a point to the closest point on a line segment.
fn distance_to_segment(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (x0 + t * dx, y0 + t * dy);
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["Polyp".to_string(), "Shaft".to_string(), "Wire".to_string()]
    }

    #[test]
    fn test_label_set_is_fixed() {
        let mut set = MaskSet::new(&labels(), 0, "0000000");
        set.set("Tumor", GrayImage::new(4, 4));
        assert!(set.get("Tumor").is_none());
        assert_eq!(set.labels().len(), 3);
        assert!(!set.has_any());
    }

    #[test]
    fn test_set_get_clear() {
        let mut set = MaskSet::new(&labels(), 3, "frame");
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 1, image::Luma([MASK_SET]));
        set.set("Wire", mask.clone());

        assert_eq!(set.get("Wire"), Some(&mask));
        assert!(set.get("Polyp").is_none());
        assert!(set.has_any());

        set.clear("Wire");
        assert!(set.get("Wire").is_none());
        assert!(!set.has_any());
    }

    #[test]
    fn test_get_or_blank() {
        let set = MaskSet::new(&labels(), 0, "x");
        let blank = set.get_or_blank("Polyp", 6, 4);
        assert_eq!(blank.dimensions(), (6, 4));
        assert!(blank.pixels().all(|p| p.0[0] == MASK_UNSET));
    }

    #[test]
    fn test_present_iterates_only_set_labels() {
        let mut set = MaskSet::new(&labels(), 0, "x");
        set.set("Shaft", GrayImage::new(2, 2));
        let present: Vec<&str> = set.present().map(|(l, _)| l).collect();
        assert_eq!(present, vec!["Shaft"]);
    }

    #[test]
    fn test_binarize_threshold() {
        let mut mask = GrayImage::new(3, 1);
        mask.put_pixel(0, 0, image::Luma([127]));
        mask.put_pixel(1, 0, image::Luma([128]));
        mask.put_pixel(2, 0, image::Luma([200]));
        let mask = binarize(mask);
        assert_eq!(mask.get_pixel(0, 0).0[0], MASK_UNSET);
        assert_eq!(mask.get_pixel(1, 0).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(2, 0).0[0], MASK_SET);
    }

    #[test]
    fn test_paint_segment_covers_endpoints() {
        let mut mask = GrayImage::new(32, 32);
        paint_segment(&mut mask, (4, 4), (20, 4), 3, MASK_SET);
        assert_eq!(mask.get_pixel(4, 4).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(20, 4).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(12, 4).0[0], MASK_SET);
        // A pixel far off the line stays untouched
        assert_eq!(mask.get_pixel(12, 20).0[0], MASK_UNSET);
    }

    #[test]
    fn test_paint_segment_erases() {
        let mut mask = GrayImage::from_pixel(16, 16, image::Luma([MASK_SET]));
        paint_segment(&mut mask, (8, 0), (8, 15), 5, MASK_UNSET);
        assert_eq!(mask.get_pixel(8, 8).0[0], MASK_UNSET);
        assert_eq!(mask.get_pixel(0, 8).0[0], MASK_SET);
    }

    #[test]
    fn test_paint_segment_clips_at_borders() {
        let mut mask = GrayImage::new(8, 8);
        // Endpoints on the image edge must not panic or wrap
        paint_segment(&mut mask, (0, 0), (7, 7), 9, MASK_SET);
        assert_eq!(mask.get_pixel(0, 0).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(7, 7).0[0], MASK_SET);
    }

    #[test]
    fn test_paint_zero_length_segment_stamps_dot() {
        let mut mask = GrayImage::new(9, 9);
        paint_segment(&mut mask, (4, 4), (4, 4), 4, MASK_SET);
        assert_eq!(mask.get_pixel(4, 4).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(4, 6).0[0], MASK_SET);
        assert_eq!(mask.get_pixel(4, 8).0[0], MASK_UNSET);
    }
}
