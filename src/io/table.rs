// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Table-backed data source.
//!
//! Datapoints are enumerated from a CSV manifest with one row per image.
//! The `image` column gives the image path; one optional column per label
//! gives a path to a pre-existing binary mask, loaded and thresholded at
//! manifest load time. Empty or NaN cells mean no mask for that label.

use std::path::{Path, PathBuf};

use image::RgbImage;

use super::media;
use super::source::{DataError, DataSource, MaskStore};
use crate::models::mask::MaskSet;

struct TableRow {
    image: PathBuf,
    /// Image base filename, used as the mask save name for this row.
    stem: String,
}

/// Data source over a CSV-described image collection.
pub struct TableSource {
    rows: Vec<TableRow>,
    store: MaskStore,
    output_name: String,
}

impl TableSource {
    /// Open a manifest and preload every mask it references.
    pub fn open(manifest: &Path, labels: Vec<String>) -> Result<Self, DataError> {
        let mut store = MaskStore::new(labels)?;

        if !manifest.is_file() {
            return Err(DataError::NotFound(manifest.to_path_buf()));
        }
        let mut reader = csv::Reader::from_path(manifest)
            .map_err(|e| DataError::Load(format!("{}: {}", manifest.display(), e)))?;
        let headers = reader
            .headers()
            .map_err(|e| DataError::Load(format!("{}: {}", manifest.display(), e)))?
            .clone();
        let image_col = headers
            .iter()
            .position(|h| h == "image")
            .ok_or_else(|| {
                DataError::Load(format!("{} has no 'image' column", manifest.display()))
            })?;
        let label_cols: Vec<(String, usize)> = store
            .labels()
            .iter()
            .filter_map(|label| {
                headers
                    .iter()
                    .position(|h| h == label)
                    .map(|col| (label.clone(), col))
            })
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| DataError::Load(format!("{} row {}: {}", manifest.display(), index, e)))?;
            let image = PathBuf::from(record.get(image_col).unwrap_or("").trim());
            let stem = image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| index.to_string());

            for (label, col) in &label_cols {
                let cell = record.get(*col).unwrap_or("").trim();
                if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                    continue;
                }
                let mask = media::load_binary_mask(Path::new(cell))?;
                store.entry(index, &stem).set(label, mask);
            }
            rows.push(TableRow { image, stem });
        }
        if rows.is_empty() {
            return Err(DataError::Validation(format!(
                "{} contains no rows",
                manifest.display()
            )));
        }
        store.set_max_index(rows.len());

        let output_name = manifest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "masks".to_string());
        log::info!(
            "Loaded manifest {} with {} rows, {} label columns",
            manifest.display(),
            rows.len(),
            label_cols.len()
        );

        Ok(Self {
            rows,
            store,
            output_name,
        })
    }

    fn check_index(&self, index: usize) -> Result<(), DataError> {
        if index >= self.rows.len() {
            return Err(DataError::OutOfRange {
                index,
                max: self.rows.len(),
            });
        }
        Ok(())
    }
}

impl DataSource for TableSource {
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
        media::load_rgb(&self.rows[index].image)
    }

    fn get_masks(&mut self, index: usize) -> Result<MaskSet, DataError> {
        self.check_index(index)?;
        self.store.get(index, &self.rows[index].stem)
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
