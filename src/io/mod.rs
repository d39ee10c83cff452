// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: data sources and media decoding.

pub mod media;
pub mod source;
pub mod table;
#[cfg(feature = "video-opencv")]
pub mod video;
