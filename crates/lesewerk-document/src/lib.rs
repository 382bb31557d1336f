// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-document — Document text extraction for Lesewerk.
//
// Provides format detection, an OCR adapter with paragraph and table
// reconstruction, page-by-page PDF rasterisation, and the fallback pipeline
// that sequences them. OCR (`ocrs`) and PDF rendering (PDFium) backends sit
// behind the `ocr` and `pdfium` features.

pub mod format;
pub mod layout;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod storage;
pub mod strategy;

// Re-export the primary entry points so callers can use
// `lesewerk_document::ExtractionPipeline` etc.
pub use format::detect_format;
pub use layout::{PAGE_BREAK, ReconstructedDocument, RecognizedBlock, TableGrid};
pub use ocr::{DocumentSource, OcrAdapter, OcrBackend, OcrOutput};
pub use pdf::rasterize::{ConversionResult, PageImage, PageRenderer, PdfRasterizer, StopReason};
pub use pdf::reader::{PdfInspection, PdfReader, extract_embedded_text, inspect_pdf};
pub use pipeline::ExtractionPipeline;
pub use storage::{FsObjectStore, ObjectStore};
pub use strategy::{StrategyChain, StrategyOutcome};

#[cfg(feature = "ocr")]
pub use ocr::ocrs_backend::{OcrConfig, OcrsBackend};
#[cfg(feature = "pdfium")]
pub use pdf::pdfium::PdfiumRenderer;
