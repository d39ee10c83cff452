// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video-backed data source (OpenCV).
//!
//! Datapoints are frames of `<video_dir>/<video_name>.mp4`, decoded on
//! demand by seeking the capture. Pre-existing masks are scanned from
//! `<video_dir>/<video_name>/masks/*.png` at load time, using the
//! `<frame>__<label>.png` naming convention.

use std::path::{Path, PathBuf};

use image::RgbImage;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::media;
use super::source::{DataError, DataSource, MaskStore};
use crate::models::mask::MaskSet;

/// Data source over the frames of a video container.
pub struct VideoSource {
    capture: VideoCapture,
    store: MaskStore,
    video_path: PathBuf,
    output_name: String,
}

/// Save-name stem for a frame: zero-padded 7-digit frame number.
fn frame_save_name(frame: usize) -> String {
    format!("{:07}", frame)
}

/// Split a mask file stem into frame number and label.
fn parse_mask_stem(stem: &str) -> Option<(usize, &str)> {
    let (frame, label) = stem.split_once("__")?;
    Some((frame.parse().ok()?, label))
}

impl VideoSource {
    /// Open `<video_dir>/<video_name>.mp4` and scan its mask directory.
    pub fn open(video_dir: &Path, labels: Vec<String>) -> Result<Self, DataError> {
        let mut store = MaskStore::new(labels)?;

        if !video_dir.is_dir() {
            return Err(DataError::Validation(format!(
                "{} is not a directory",
                video_dir.display()
            )));
        }
        let video_name = video_dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DataError::Validation(format!("{} has no directory name", video_dir.display()))
            })?;
        let video_path = video_dir.join(format!("{}.mp4", video_name));

        let capture = VideoCapture::from_file(&video_path.to_string_lossy(), videoio::CAP_ANY)
            .map_err(|e| DataError::Load(format!("{}: {}", video_path.display(), e)))?;
        let opened = capture
            .is_opened()
            .map_err(|e| DataError::Load(format!("{}: {}", video_path.display(), e)))?;
        if !opened {
            return Err(DataError::Load(format!(
                "could not open video file {}",
                video_path.display()
            )));
        }
        let frame_count = capture
            .get(videoio::CAP_PROP_FRAME_COUNT)
            .map_err(|e| DataError::Load(format!("{}: {}", video_path.display(), e)))?
            as usize;
        if frame_count == 0 {
            return Err(DataError::Load(format!(
                "{} reports zero frames",
                video_path.display()
            )));
        }
        store.set_max_index(frame_count);

        let mut source = Self {
            capture,
            store,
            video_path,
            output_name: video_name.clone(),
        };
        source.scan_masks(&video_dir.join(&video_name).join("masks"))?;
        log::info!(
            "Opened video {} with {} frames",
            source.video_path.display(),
            frame_count
        );
        Ok(source)
    }

    /// Preload masks saved by a previous session.
    fn scan_masks(&mut self, masks_dir: &Path) -> Result<(), DataError> {
        if !masks_dir.is_dir() {
            return Ok(());
        }
        for entry in std::fs::read_dir(masks_dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "png") {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some((frame, label)) = parse_mask_stem(&stem) else {
                log::warn!("Skipping mask with unrecognized name: {}", path.display());
                continue;
            };
            let mask = media::load_binary_mask(&path)?;
            let save_name = frame_save_name(frame);
            self.store.entry(frame, &save_name).set(label, mask);
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), DataError> {
        if index >= self.store.max_index() {
            return Err(DataError::OutOfRange {
                index,
                max: self.store.max_index(),
            });
        }
        Ok(())
    }
}

/// Convert a decoded BGR frame to an RGB raster.
fn mat_to_rgb(mat: &Mat, index: usize) -> Result<RgbImage, DataError> {
    if mat.rows() <= 0 || mat.cols() <= 0 || mat.channels() != 3 {
        return Err(DataError::Decode(index));
    }
    let contiguous;
    let mat = if mat.is_continuous() {
        mat
    } else {
        contiguous = mat.try_clone().map_err(|_| DataError::Decode(index))?;
        &contiguous
    };
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let data = mat.data_bytes().map_err(|_| DataError::Decode(index))?;
    let mut rgb = Vec::with_capacity(data.len());
    for px in data.chunks_exact(3) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    RgbImage::from_raw(width, height, rgb).ok_or(DataError::Decode(index))
}

impl DataSource for VideoSource {
    fn labels(&self) -> &[String] {
        self.store.labels()
    }

    fn max_index(&self) -> usize {
        self.store.max_index()
    }

    fn output_name(&self) -> &str {
        &self.output_name
    }

    fn get_datapoint(&mut self, index: usize) -> Result<RgbImage, DataError> {
        self.check_index(index)?;
        self.capture
            .set(videoio::CAP_PROP_POS_FRAMES, index as f64)
            .map_err(|_| DataError::Decode(index))?;
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|_| DataError::Decode(index))?;
        if !ok {
            return Err(DataError::Decode(index));
        }
        mat_to_rgb(&frame, index)
    }

    fn get_masks(&mut self, index: usize) -> Result<MaskSet, DataError> {
        self.check_index(index)?;
        let save_name = frame_save_name(index);
        self.store.get(index, &save_name)
    }

    fn set_masks(&mut self, index: usize, masks: MaskSet) -> Result<(), DataError> {
        self.store.set(index, masks)
    }

    fn delete_mask(&mut self, index: usize, label: &str) -> Result<(), DataError> {
        self.store.delete_mask(index, label)
    }

    fn save_all(&self, folder: &Path) -> Result<usize, DataError> {
        self.store.save_all(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_save_name_is_zero_padded() {
        assert_eq!(frame_save_name(0), "0000000");
        assert_eq!(frame_save_name(1234), "0001234");
    }

    #[test]
    fn test_parse_mask_stem() {
        assert_eq!(parse_mask_stem("0000012__Wire"), Some((12, "Wire")));
        assert_eq!(parse_mask_stem("12__Polyp"), Some((12, "Polyp")));
        assert!(parse_mask_stem("no_separator").is_none());
        assert!(parse_mask_stem("abc__Wire").is_none());
    }
}
