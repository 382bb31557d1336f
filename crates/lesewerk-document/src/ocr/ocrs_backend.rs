// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local OCR backend built on the `ocrs` crate, a pure-Rust OCR engine backed
// by neural network models executed via `rten`.
//
// # Feature Gate
//
// Only compiled with the `ocr` feature:
//
// ```toml
// lesewerk-document = { path = "crates/lesewerk-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two model files, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to
// `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`), which is the default
// lookup directory.
//
// # Capabilities
//
// `ocrs` reads raster images only and has no table model, so this backend:
// - refuses PDF bytes with `UnsupportedDocument` (the pipeline then
//   rasterises and comes back page by page);
// - cannot read object storage and fails such sources with
//   `SourceUnavailable` (the pipeline then retries with bytes);
// - answers `analyze_document` with the same Line/Word blocks as
//   `detect_text`; table reconstruction then finds nothing.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::{DocumentFormat, FeatureFlags};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use super::{DocumentSource, OcrBackend};
use crate::format::detect_format;
use crate::layout::{BoundingBox, RecognizedBlock};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, else `~/.cache/ocrs`, else `./ocrs-models`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Model file locations for [`OcrsBackend`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Both models in `dir` under their well-known filenames.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (role, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(LesewerkError::Config(format!(
                    "{role} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// [`OcrBackend`] running `ocrs` in-process.
///
/// Model loading is the expensive step; construct once and reuse for every
/// page of every document.
pub struct OcrsBackend {
    engine: OcrsEngine,
}

impl OcrsBackend {
    /// Load both models and initialise the engine.
    ///
    /// # Errors
    ///
    /// [`LesewerkError::Config`] if a model file is missing,
    /// [`LesewerkError::Ocr`] if one cannot be loaded.
    ///
    /// # Performance
    ///
    /// `ocrs` and `rten` must be optimised even in dev builds; the workspace
    /// profile sets `opt-level = 3` for both.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            LesewerkError::Ocr(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                LesewerkError::Ocr(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| LesewerkError::Ocr(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Engine using the default model cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }

    fn decode(source: DocumentSource<'_>) -> Result<DynamicImage> {
        let bytes = match source {
            DocumentSource::Bytes(bytes) => bytes,
            DocumentSource::Storage(locator) => {
                return Err(LesewerkError::SourceUnavailable(format!(
                    "local OCR cannot read object storage ({locator})"
                )));
            }
        };

        match detect_format(bytes) {
            DocumentFormat::Jpeg | DocumentFormat::Png | DocumentFormat::Tiff => {}
            DocumentFormat::Pdf => {
                return Err(LesewerkError::UnsupportedDocument(
                    "PDF input must be rasterised before local OCR".into(),
                ));
            }
            DocumentFormat::Unsupported => {
                return Err(LesewerkError::UnsupportedDocument(
                    "unrecognised image signature".into(),
                ));
            }
        }

        image::load_from_memory(bytes).map_err(|err| {
            warn!(%err, "Image decode failed");
            LesewerkError::UnsupportedDocument(format!("image could not be decoded: {err}"))
        })
    }

    /// Lines, then the words of each line, in engine reading order. Geometry
    /// is normalised to fractions of the image size.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize_blocks(&self, image: &DynamicImage) -> Result<Vec<RecognizedBlock>> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let (page_width, page_height) = (width.max(1) as f32, height.max(1) as f32);

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            LesewerkError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| LesewerkError::Ocr(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| LesewerkError::Ocr(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| LesewerkError::Ocr(format!("line recognition failed: {}", err)))?;

        let mut blocks = Vec::new();
        for (line_index, line) in line_texts.iter().flatten().enumerate() {
            let text = line.to_string();
            if text.trim().is_empty() {
                continue;
            }
            blocks.push(RecognizedBlock::line(
                format!("line-{line_index}"),
                1,
                text,
                normalised_geometry(line, page_width, page_height),
            ));
            for (word_index, word) in line.words().enumerate() {
                blocks.push(RecognizedBlock::word(
                    format!("word-{line_index}-{word_index}"),
                    1,
                    word.chars().iter().map(|c| c.char).collect::<String>(),
                    normalised_geometry(&word, page_width, page_height),
                ));
            }
        }

        info!(blocks = blocks.len(), "Local OCR complete");
        Ok(blocks)
    }
}

fn normalised_geometry<T: TextItem>(item: &T, page_width: f32, page_height: f32) -> BoundingBox {
    let rect = item.bounding_rect();
    BoundingBox::new(
        rect.top() as f32 / page_height,
        rect.left() as f32 / page_width,
        rect.width() as f32 / page_width,
        rect.height() as f32 / page_height,
    )
}

impl OcrBackend for OcrsBackend {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn detect_text(&self, source: DocumentSource<'_>) -> Result<Vec<RecognizedBlock>> {
        let image = Self::decode(source)?;
        self.recognize_blocks(&image)
    }

    fn analyze_document(
        &self,
        source: DocumentSource<'_>,
        flags: FeatureFlags,
    ) -> Result<Vec<RecognizedBlock>> {
        debug!(?flags, "No layout model; analysis degrades to text detection");
        self.detect_text(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesewerk_core::StorageLocator;

    #[test]
    fn default_config_uses_well_known_filenames() {
        let config = OcrConfig::default();
        assert!(config.detection_model_path.ends_with(DETECTION_MODEL_FILENAME));
        assert!(config.recognition_model_path.ends_with(RECOGNITION_MODEL_FILENAME));
    }

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_are_a_config_error() {
        let err = OcrConfig::from_dir("/nonexistent/ocr-models").validate().unwrap_err();
        assert!(matches!(err, LesewerkError::Config(_)));
    }

    #[test]
    fn pdf_bytes_are_refused_as_unsupported_document() {
        let err = OcrsBackend::decode(DocumentSource::Bytes(b"%PDF-1.7\n")).unwrap_err();
        assert!(err.is_unsupported_document());
    }

    #[test]
    fn storage_sources_are_unavailable() {
        let locator = StorageLocator::new("uploads", "scan.png");
        let err = OcrsBackend::decode(DocumentSource::Storage(&locator)).unwrap_err();
        assert!(matches!(err, LesewerkError::SourceUnavailable(_)));
    }

    #[test]
    fn truncated_png_is_unsupported_document() {
        let err = OcrsBackend::decode(DocumentSource::Bytes(&[0x89, b'P', b'N', b'G', 0, 0]))
            .unwrap_err();
        assert!(err.is_unsupported_document());
    }
}
