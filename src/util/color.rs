// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label color utilities.
//!
//! This module provides HSV to RGB conversion and the default hue-stepped
//! palette used to tint mask overlays when no explicit color is configured.

/// Convert an HSV color to RGB.
///
/// `hue` is in degrees [0, 360), `saturation` and `value` in [0.0, 1.0].
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let c = value * saturation;
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

/// Default color for the nth configured label (0-based position).
///
/// Hues step by 45 degrees at full saturation and value; the first label
/// gets 45 degrees.
pub fn label_color(position: usize) -> [u8; 3] {
    let hue = (((position + 1) * 45) % 360) as f32;
    hsv_to_rgb(hue, 1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), [0, 0, 255]);
    }

    #[test]
    fn test_hsv_grayscale() {
        // Zero saturation collapses to gray regardless of hue
        assert_eq!(hsv_to_rgb(73.0, 0.0, 1.0), [255, 255, 255]);
        assert_eq!(hsv_to_rgb(301.0, 0.0, 0.0), [0, 0, 0]);
    }

    #[test]
    fn test_label_colors_distinct() {
        // The first eight labels all get distinct hues (45 * 8 = 360)
        let colors: Vec<[u8; 3]> = (0..8).map(label_color).collect();
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert_ne!(colors[i], colors[j], "labels {} and {} collide", i, j);
            }
        }
    }

    #[test]
    fn test_first_label_hue() {
        assert_eq!(label_color(0), hsv_to_rgb(45.0, 1.0, 1.0));
    }
}
