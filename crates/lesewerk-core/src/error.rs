// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Lesewerk.
//
// Errors are classified into Transient (another strategy may succeed),
// Unsupported (the OCR backend refused this particular file — recovered by
// rasterising), and Permanent (give up).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Validation --
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    // -- OCR --
    #[error("OCR backend rejected the document: {0}")]
    UnsupportedDocument(String),

    #[error("OCR backend cannot read this source: {0}")]
    SourceUnavailable(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Rasterisation --
    #[error("rasterisation failed: {0}")]
    Rasterization(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / configuration --
    #[error("object storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no extraction strategy was configured")]
    NoStrategies,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;

/// Classification of errors for fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Service blip or unreadable source — another source may succeed.
    Transient,
    /// The backend understood the format but refused this file.
    Unsupported,
    /// Bad input or misconfiguration — retrying cannot help.
    Permanent,
}

impl LesewerkError {
    /// Classify this error for the strategy chain.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Ocr(_) | Self::SourceUnavailable(_) | Self::Storage(_) => ErrorClass::Transient,

            Self::UnsupportedDocument(_) | Self::Rasterization(_) => ErrorClass::Unsupported,

            Self::UnsupportedFormat(_)
            | Self::PdfError(_)
            | Self::ImageError(_)
            | Self::Config(_)
            | Self::NoStrategies
            | Self::Serialization(_) => ErrorClass::Permanent,

            Self::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::Interrupted => ErrorClass::Transient,
                _ => ErrorClass::Permanent,
            },
        }
    }

    /// Whether the OCR backend explicitly refused this document.
    pub fn is_unsupported_document(&self) -> bool {
        matches!(self, Self::UnsupportedDocument(_))
    }
}
