// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (images and masks).
//!
//! This module handles decoding datapoint images and pre-existing mask
//! files into the rasters the rest of the application works with.

use std::path::Path;

use image::{GrayImage, RgbImage};

use super::source::DataError;
use crate::models::mask::binarize;

/// Decode a color image from disk.
pub fn load_rgb(path: &Path) -> Result<RgbImage, DataError> {
    if !path.is_file() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?.to_rgb8())
}

/// Decode a mask file as grayscale and force it to exact binary values.
pub fn load_binary_mask(path: &Path) -> Result<GrayImage, DataError> {
    if !path.is_file() {
        return Err(DataError::NotFound(path.to_path_buf()));
    }
    Ok(binarize(image::open(path)?.to_luma8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::scratch_dir;
    use crate::models::mask::{MASK_SET, MASK_UNSET};

    #[test]
    fn test_missing_file_is_not_found() {
        let path = scratch_dir("media_missing").join("absent.png");
        assert!(matches!(load_rgb(&path), Err(DataError::NotFound(_))));
        assert!(matches!(
            load_binary_mask(&path),
            Err(DataError::NotFound(_))
        ));
    }

    #[test]
    fn test_mask_load_binarizes() {
        let dir = scratch_dir("media_binarize");
        let path = dir.join("mask.png");
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, image::Luma([200]));
        mask.put_pixel(1, 0, image::Luma([30]));
        mask.save(&path).unwrap();

        let loaded = load_binary_mask(&path).unwrap();
        assert_eq!(loaded.get_pixel(0, 0).0[0], MASK_SET);
        assert_eq!(loaded.get_pixel(1, 0).0[0], MASK_UNSET);
    }

    #[test]
    fn test_rgb_roundtrip() {
        let dir = scratch_dir("media_rgb");
        let path = dir.join("img.png");
        RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let loaded = load_rgb(&path).unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [10, 20, 30]);
    }
}
