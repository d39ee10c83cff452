// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data source contract and the shared mask store.
//!
//! A data source presents a sequence of datapoints (video frames or
//! manifest-listed images) together with their mask sets. The mask store
//! owns every mask set for the lifetime of the session; lookups are
//! explicit lookup-or-insert-default, and every index is range-checked
//! before any map access.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;

use crate::models::mask::MaskSet;

/// Errors surfaced by data sources and the mask store.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("index {index} is out of range (0..{max})")]
    OutOfRange { index: usize, max: usize },

    #[error("failed to open data source: {0}")]
    Load(String),

    #[error("failed to decode frame {0}")]
    Decode(usize),

    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot save to {0}: not an existing directory")]
    SaveTarget(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A sequence of annotatable datapoints with associated mask sets.
///
/// The source exclusively owns the full collection of mask sets. The canvas
/// borrows one at a time via `get_masks` and must hand it back with
/// `set_masks` before switching to another index, or the edits are lost.
pub trait DataSource {
    /// The configured label names, in order.
    fn labels(&self) -> &[String];

    /// Total datapoint count; indices run over `0..max_index`.
    fn max_index(&self) -> usize;

    /// Directory name masks are saved under (video or manifest stem).
    fn output_name(&self) -> &str;

    /// Decode the image for one datapoint.
    fn get_datapoint(&mut self, index: usize) -> Result<RgbImage, DataError>;

    /// The mask set for one datapoint, materializing an all-absent default
    /// on first access.
    fn get_masks(&mut self, index: usize) -> Result<MaskSet, DataError>;

    /// Write a mask set back into the store.
    fn set_masks(&mut self, index: usize, masks: MaskSet) -> Result<(), DataError>;

    /// Clear one label's raster for one datapoint.
    fn delete_mask(&mut self, index: usize, label: &str) -> Result<(), DataError>;

    /// Serialize every present mask as `<save_name>__<label>.png` into
    /// `folder`. Returns the number of files written.
    fn save_all(&self, folder: &Path) -> Result<usize, DataError>;
}

/// Index-keyed mask set collection shared by both source variants.
pub struct MaskStore {
    labels: Vec<String>,
    max_index: usize,
    masks: BTreeMap<usize, MaskSet>,
}

impl MaskStore {
    /// Create an empty store for the given label list.
    pub fn new(labels: Vec<String>) -> Result<Self, DataError> {
        if labels.is_empty() {
            return Err(DataError::Validation("label list must not be empty".into()));
        }
        Ok(Self {
            labels,
            max_index: 0,
            masks: BTreeMap::new(),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }

    /// Fix the datapoint count once the underlying container is open.
    pub fn set_max_index(&mut self, max_index: usize) {
        self.max_index = max_index;
    }

    fn check_index(&self, index: usize) -> Result<(), DataError> {
        if index >= self.max_index {
            return Err(DataError::OutOfRange {
                index,
                max: self.max_index,
            });
        }
        Ok(())
    }

    /// Lookup-or-insert-default without a range check, for use while the
    /// source is still scanning pre-existing masks at load time.
    pub fn entry(&mut self, index: usize, save_name: &str) -> &mut MaskSet {
        self.masks
            .entry(index)
            .or_insert_with(|| MaskSet::new(&self.labels, index, save_name))
    }

    /// Range-checked copy of the mask set at `index`, materializing the
    /// default when the index has never been touched.
    pub fn get(&mut self, index: usize, save_name: &str) -> Result<MaskSet, DataError> {
        self.check_index(index)?;
        Ok(self.entry(index, save_name).clone())
    }

    /// Range-checked write-back of a mask set.
    pub fn set(&mut self, index: usize, masks: MaskSet) -> Result<(), DataError> {
        self.check_index(index)?;
        self.masks.insert(index, masks);
        Ok(())
    }

    /// Clear one label's raster at one index; other labels and other
    /// indices are unaffected.
    pub fn delete_mask(&mut self, index: usize, label: &str) -> Result<(), DataError> {
        self.check_index(index)?;
        if let Some(set) = self.masks.get_mut(&index) {
            set.clear(label);
        }
        Ok(())
    }

    /// Write one grayscale PNG per (datapoint, present label) into `folder`.
    pub fn save_all(&self, folder: &Path) -> Result<usize, DataError> {
        if !folder.is_dir() {
            return Err(DataError::SaveTarget(folder.to_path_buf()));
        }
        let mut written = 0;
        for set in self.masks.values() {
            for (label, mask) in set.present() {
                let filename = format!("{}__{}.png", set.save_name(), label);
                mask.save(folder.join(filename))?;
                written += 1;
            }
        }
        log::info!("Wrote {} mask files to {}", written, folder.display());
        Ok(written)
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("smat_{}_{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mask::{MASK_SET, MaskSet};
    use image::GrayImage;

    fn labels() -> Vec<String> {
        vec!["Polyp".to_string(), "Shaft".to_string(), "Wire".to_string()]
    }

    fn store(n: usize) -> MaskStore {
        let mut store = MaskStore::new(labels()).unwrap();
        store.set_max_index(n);
        store
    }

    fn painted(label: &str, index: usize) -> MaskSet {
        let mut set = MaskSet::new(&labels(), index, format!("{:07}", index));
        set.set(label, GrayImage::from_pixel(4, 4, image::Luma([MASK_SET])));
        set
    }

    #[test]
    fn test_error_messages_name_the_failure() {
        assert_eq!(
            DataError::OutOfRange { index: 9, max: 4 }.to_string(),
            "index 9 is out of range (0..4)"
        );
        assert_eq!(DataError::Decode(7).to_string(), "failed to decode frame 7");
    }

    #[test]
    fn test_empty_labels_rejected() {
        assert!(matches!(
            MaskStore::new(Vec::new()),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut store = store(5);
        let set = painted("Wire", 2);
        store.set(2, set.clone()).unwrap();
        assert_eq!(store.get(2, "0000002").unwrap(), set);
    }

    #[test]
    fn test_lazy_default_has_save_name() {
        let mut store = store(3);
        let set = store.get(1, "im_0001").unwrap();
        assert_eq!(set.save_name(), "im_0001");
        assert_eq!(set.index(), 1);
        assert!(!set.has_any());
    }

    #[test]
    fn test_out_of_range() {
        let mut store = store(3);
        assert!(matches!(
            store.get(3, "x"),
            Err(DataError::OutOfRange { index: 3, max: 3 })
        ));
        assert!(matches!(
            store.set(7, painted("Wire", 7)),
            Err(DataError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.delete_mask(3, "Wire"),
            Err(DataError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_delete_mask_is_isolated() {
        let mut store = store(4);
        let mut set = painted("Wire", 1);
        set.set("Polyp", GrayImage::from_pixel(4, 4, image::Luma([MASK_SET])));
        store.set(1, set).unwrap();
        store.set(2, painted("Wire", 2)).unwrap();

        store.delete_mask(1, "Wire").unwrap();

        let at_1 = store.get(1, "x").unwrap();
        assert!(at_1.get("Wire").is_none());
        assert!(at_1.get("Polyp").is_some());
        assert!(store.get(2, "x").unwrap().get("Wire").is_some());
    }

    #[test]
    fn test_save_all_absent_writes_nothing() {
        let dir = scratch_dir("save_absent");
        let mut store = store(3);
        // Touch an index without painting anything
        let _ = store.get(0, "0000000").unwrap();
        assert_eq!(store.save_all(&dir).unwrap(), 0);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_save_all_one_label_one_file() {
        let dir = scratch_dir("save_one");
        let mut store = store(3);
        store.set(1, painted("Shaft", 1)).unwrap();
        assert_eq!(store.save_all(&dir).unwrap(), 1);
        assert!(dir.join("0000001__Shaft.png").is_file());
    }

    #[test]
    fn test_save_all_missing_folder() {
        let dir = scratch_dir("save_missing").join("nope");
        let store = store(1);
        assert!(matches!(
            store.save_all(&dir),
            Err(DataError::SaveTarget(_))
        ));
    }
}
