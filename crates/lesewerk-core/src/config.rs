// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LesewerkError, Result};

const MIB: u64 = 1024 * 1024;

/// Image encoding used for rasterised pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Documents up to `max_bytes` (exclusive) are rasterised at `dpi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpiBand {
    pub max_bytes: u64,
    pub dpi: u32,
}

/// Tunables for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Size bands for DPI selection, ordered by ascending `max_bytes`.
    pub dpi_bands: Vec<DpiBand>,
    /// DPI for documents larger than the last band.
    pub fallback_dpi: u32,
    /// Fixed DPI that bypasses size-based selection.
    pub dpi_override: Option<u32>,
    pub raster_format: RasterFormat,
    /// Rendered pages smaller than this many bytes count as empty.
    pub min_page_image_bytes: usize,
    /// Stop rasterising after this many empty pages in a row.
    pub max_consecutive_empty_pages: u32,
    /// Hard ceiling on rasterised page numbers.
    pub max_pages: u32,
    /// Documents above this size are logged as candidates for async OCR.
    pub async_size_threshold_bytes: u64,
    /// A vertical gap larger than this multiple of the previous line's
    /// height starts a new paragraph.
    pub paragraph_gap_ratio: f32,
    /// Upper bound on a rendered table column, padding included.
    pub max_column_width: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi_bands: vec![
                DpiBand {
                    max_bytes: MIB,
                    dpi: 300,
                },
                DpiBand {
                    max_bytes: 5 * MIB,
                    dpi: 200,
                },
                DpiBand {
                    max_bytes: 10 * MIB,
                    dpi: 150,
                },
            ],
            fallback_dpi: 100,
            dpi_override: None,
            raster_format: RasterFormat::Png,
            min_page_image_bytes: 1000,
            max_consecutive_empty_pages: 3,
            max_pages: 100,
            async_size_threshold_bytes: 5 * MIB,
            paragraph_gap_ratio: 1.5,
            max_column_width: 30,
        }
    }
}

impl ExtractionConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break the rasteriser or the layout
    /// heuristics.
    pub fn validate(&self) -> Result<()> {
        let mut previous: Option<&DpiBand> = None;
        for band in &self.dpi_bands {
            if band.dpi == 0 {
                return Err(LesewerkError::Config(format!(
                    "DPI band up to {} bytes has zero DPI",
                    band.max_bytes
                )));
            }
            if let Some(prev) = previous {
                if band.max_bytes <= prev.max_bytes {
                    return Err(LesewerkError::Config(
                        "DPI bands must be ordered by ascending size".into(),
                    ));
                }
                if band.dpi > prev.dpi {
                    return Err(LesewerkError::Config(format!(
                        "DPI must not increase with file size ({} -> {})",
                        prev.dpi, band.dpi
                    )));
                }
            }
            previous = Some(band);
        }

        if self.fallback_dpi == 0 {
            return Err(LesewerkError::Config("fallback DPI must be non-zero".into()));
        }
        if let Some(last) = previous {
            if self.fallback_dpi > last.dpi {
                return Err(LesewerkError::Config(format!(
                    "fallback DPI {} exceeds the last band's {}",
                    self.fallback_dpi, last.dpi
                )));
            }
        }
        if self.dpi_override == Some(0) {
            return Err(LesewerkError::Config("DPI override must be non-zero".into()));
        }
        if self.max_consecutive_empty_pages == 0 {
            return Err(LesewerkError::Config(
                "empty-page limit must be at least 1".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(LesewerkError::Config("page ceiling must be at least 1".into()));
        }
        if !(self.paragraph_gap_ratio > 0.0) {
            return Err(LesewerkError::Config(
                "paragraph gap ratio must be positive".into(),
            ));
        }
        if self.max_column_width < 3 {
            return Err(LesewerkError::Config(
                "table columns need a width of at least 3".into(),
            ));
        }
        Ok(())
    }

    /// DPI for a document of `size` bytes. Never increases as size grows.
    pub fn dpi_for_size(&self, size: u64) -> u32 {
        if let Some(dpi) = self.dpi_override {
            return dpi;
        }
        self.dpi_bands
            .iter()
            .find(|band| size < band.max_bytes)
            .map(|band| band.dpi)
            .unwrap_or(self.fallback_dpi)
    }
}
