// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Lesewerk extraction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::LesewerkError;

/// Unique identifier for one extraction request, used to correlate logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte-level document format, as determined from the leading signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    /// No known signature matched.
    Unsupported,
}

impl DocumentFormat {
    /// MIME type string, or `application/octet-stream` for unknown input.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Unsupported => "application/octet-stream",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Raster formats that an OCR engine can consume directly.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Address of a document held in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageLocator {
    /// Bucket / container name.
    pub container: String,
    /// Object key within the container.
    pub key: String,
}

impl StorageLocator {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// Optional structure detection requested from the OCR backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub detect_tables: bool,
    pub detect_forms: bool,
}

impl FeatureFlags {
    /// Whether the (more expensive) analysis variant of the OCR call is needed.
    pub fn wants_analysis(&self) -> bool {
        self.detect_tables || self.detect_forms
    }
}

/// One document to extract text from.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub id: RequestId,
    /// The full document body.
    pub bytes: Vec<u8>,
    /// Where the same body lives in object storage, if anywhere.
    pub locator: Option<StorageLocator>,
    pub flags: FeatureFlags,
}

impl ExtractionRequest {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: RequestId::new(),
            bytes,
            locator: None,
            flags: FeatureFlags::default(),
        }
    }

    pub fn with_locator(mut self, locator: StorageLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Which strategy ultimately produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// The OCR backend accepted the original document.
    #[serde(rename = "direct OCR")]
    DirectOcr,
    /// The document was rasterised and each page image sent to OCR.
    #[serde(rename = "image-fallback OCR")]
    ImageFallbackOcr,
}

impl ExtractionMethod {
    /// Label stored alongside the text for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectOcr => "direct OCR",
            Self::ImageFallbackOcr => "image-fallback OCR",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// Mean OCR confidence (0–100), if any block or page reported one.
    pub confidence: Option<f32>,
    pub method: ExtractionMethod,
    /// Number of pages that contributed text.
    pub pages: usize,
    pub format: DocumentFormat,
    /// SHA-256 of the original document bytes (hex).
    pub source_sha256: String,
    pub extracted_at: DateTime<Utc>,
}

/// Coarse failure category handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The byte signature matched no supported format.
    UnsupportedFormat,
    /// Every OCR strategy was refused; the caller should run its own
    /// non-OCR parser.
    UnsupportedDocument,
    /// OCR failed for another reason.
    OcrFailed,
}

/// Structured failure returned instead of text.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ExtractionFailure {
    /// Whether the caller should fall back to its own text parser.
    pub fn wants_caller_fallback(&self) -> bool {
        self.kind == FailureKind::UnsupportedDocument
    }
}

impl From<LesewerkError> for ExtractionFailure {
    fn from(err: LesewerkError) -> Self {
        let kind = match &err {
            LesewerkError::UnsupportedFormat(_) => FailureKind::UnsupportedFormat,
            LesewerkError::UnsupportedDocument(_) | LesewerkError::Rasterization(_) => {
                FailureKind::UnsupportedDocument
            }
            _ => FailureKind::OcrFailed,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}
