// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session configuration.
//!
//! The label set, optional per-label colors, and default brush sizes are
//! read from a YAML file at startup. Labels are fixed for the whole
//! session; they are never inferred from the data on disk.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ordered segmentation label names; fixed per session.
    pub labels: Vec<String>,
    /// Explicit RGB overlay colors per label; labels not listed here get
    /// the default hue-stepped palette.
    pub colors: BTreeMap<String, [u8; 3]>,
    /// Initial brush thickness in image pixels.
    pub pen_size: u32,
    /// Initial eraser thickness in image pixels.
    pub eraser_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            labels: vec!["Polyp".to_string(), "Shaft".to_string(), "Wire".to_string()],
            colors: BTreeMap::new(),
            pen_size: 5,
            eraser_size: 20,
        }
    }
}

impl AppConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            log::info!(
                "No config file at {}, using default labels",
                path.display()
            );
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            bail!("config must list at least one label");
        }
        if self.pen_size == 0 || self.eraser_size == 0 {
            bail!("brush sizes must be positive");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if self.labels[..i].contains(label) {
                bail!("duplicate label '{}'", label);
            }
        }
        Ok(())
    }
}
