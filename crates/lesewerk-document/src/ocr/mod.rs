// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR adapter — call an OCR backend for one document source and normalise
// its flat block list into reconstructed text.
//
// Backends expose two entry points: a cheap text-only detection and a
// heavier analysis that also reports table and cell structure. The adapter
// picks one from the request's feature flags; the caller picks the source.

#[cfg(feature = "ocr")]
pub mod ocrs_backend;

use lesewerk_core::error::Result;
use lesewerk_core::{ExtractionConfig, FeatureFlags, StorageLocator};
use tracing::{debug, instrument};

use crate::layout::{
    ReconstructedDocument, RecognizedBlock, blocks::mean_confidence, reconstruct_paragraphs,
    reconstruct_tables,
};

#[cfg(feature = "ocr")]
pub use ocrs_backend::{OcrConfig, OcrsBackend};

/// Separates reconstructed prose from the rendered tables that follow it.
pub const TABLES_MARKER: &str = "--- Tables ---";

/// Where the backend should read the document from.
#[derive(Debug, Clone, Copy)]
pub enum DocumentSource<'a> {
    Bytes(&'a [u8]),
    Storage(&'a StorageLocator),
}

impl DocumentSource<'_> {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Storage(_) => "storage",
        }
    }
}

/// OCR capability consumed by the pipeline.
///
/// Both entry points must fail with
/// [`LesewerkError::UnsupportedDocument`](lesewerk_core::LesewerkError::UnsupportedDocument)
/// when the backend recognises the format but refuses this particular file;
/// the pipeline treats that error, and only that one, as a cue to rasterise.
pub trait OcrBackend {
    /// Identifier for logs.
    fn name(&self) -> &str;

    /// Line and Word blocks only.
    fn detect_text(&self, source: DocumentSource<'_>) -> Result<Vec<RecognizedBlock>>;

    /// Line and Word blocks plus Table and Cell structure.
    fn analyze_document(
        &self,
        source: DocumentSource<'_>,
        flags: FeatureFlags,
    ) -> Result<Vec<RecognizedBlock>>;
}

/// Normalised result of one OCR call.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutput {
    /// Paragraph text, then rendered tables after [`TABLES_MARKER`] when any
    /// were requested and found.
    pub text: String,
    /// Mean over every block that reported a score.
    pub confidence: Option<f32>,
    pub document: ReconstructedDocument,
    pub block_count: usize,
}

impl OcrOutput {
    /// Pages that produced paragraphs or tables.
    pub fn pages(&self) -> usize {
        self.document.content_pages()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Borrowing wrapper that runs a backend call plus reconstruction.
pub struct OcrAdapter<'a> {
    backend: &'a dyn OcrBackend,
    gap_ratio: f32,
    max_column_width: usize,
}

impl<'a> OcrAdapter<'a> {
    pub fn new(backend: &'a dyn OcrBackend, config: &ExtractionConfig) -> Self {
        Self {
            backend,
            gap_ratio: config.paragraph_gap_ratio,
            max_column_width: config.max_column_width,
        }
    }

    /// Recognise `source`, propagating backend errors unchanged.
    #[instrument(skip_all, fields(backend = self.backend.name(), source = source.kind()))]
    pub fn recognize(&self, source: DocumentSource<'_>, flags: FeatureFlags) -> Result<OcrOutput> {
        let blocks = if flags.wants_analysis() {
            self.backend.analyze_document(source, flags)?
        } else {
            self.backend.detect_text(source)?
        };
        debug!(blocks = blocks.len(), "OCR backend returned");

        Ok(self.normalise(&blocks, flags))
    }

    fn normalise(&self, blocks: &[RecognizedBlock], flags: FeatureFlags) -> OcrOutput {
        let mut document = reconstruct_paragraphs(blocks, self.gap_ratio);
        if flags.detect_tables {
            for (page, grid) in reconstruct_tables(blocks) {
                document.page_mut(page).tables.push(grid);
            }
        }

        let mut text = document.text();
        let rendered: Vec<String> = document
            .tables()
            .map(|grid| grid.render(self.max_column_width))
            .collect();
        if !rendered.is_empty() {
            text.push_str(&format!("\n\n{TABLES_MARKER}\n\n"));
            text.push_str(&rendered.join("\n\n"));
        }

        OcrOutput {
            text,
            confidence: mean_confidence(blocks),
            document,
            block_count: blocks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoundingBox;
    use lesewerk_core::LesewerkError;
    use std::cell::Cell;

    /// Returns canned blocks and records which entry point was used.
    struct CannedBackend {
        blocks: Vec<RecognizedBlock>,
        analyzed: Cell<bool>,
        detected: Cell<bool>,
    }

    impl CannedBackend {
        fn new(blocks: Vec<RecognizedBlock>) -> Self {
            Self {
                blocks,
                analyzed: Cell::new(false),
                detected: Cell::new(false),
            }
        }
    }

    impl OcrBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        fn detect_text(&self, _source: DocumentSource<'_>) -> Result<Vec<RecognizedBlock>> {
            self.detected.set(true);
            // Text-only detection never reports structure.
            Ok(self
                .blocks
                .iter()
                .filter(|block| block.text().is_some())
                .cloned()
                .collect())
        }

        fn analyze_document(
            &self,
            _source: DocumentSource<'_>,
            _flags: FeatureFlags,
        ) -> Result<Vec<RecognizedBlock>> {
            self.analyzed.set(true);
            Ok(self.blocks.clone())
        }
    }

    struct RefusingBackend;

    impl OcrBackend for RefusingBackend {
        fn name(&self) -> &str {
            "refusing"
        }

        fn detect_text(&self, _source: DocumentSource<'_>) -> Result<Vec<RecognizedBlock>> {
            Err(LesewerkError::UnsupportedDocument("encrypted".into()))
        }

        fn analyze_document(
            &self,
            source: DocumentSource<'_>,
            _flags: FeatureFlags,
        ) -> Result<Vec<RecognizedBlock>> {
            self.detect_text(source)
        }
    }

    fn line(id: &str, text: &str, top: f32, confidence: f32) -> RecognizedBlock {
        RecognizedBlock::line(id, 1, text, BoundingBox::new(top, 0.1, 0.8, 0.02))
            .with_confidence(confidence)
    }

    fn word(id: &str, text: &str) -> RecognizedBlock {
        RecognizedBlock::word(id, 1, text, BoundingBox::default())
    }

    fn cell(id: &str, row: usize, column: usize, word_id: &str) -> RecognizedBlock {
        RecognizedBlock::cell(id, 1, row, column, vec![word_id.into()], BoundingBox::default())
    }

    /// A header row plus two data rows, two columns wide.
    fn invoice_blocks() -> Vec<RecognizedBlock> {
        vec![
            line("l1", "Invoice 42", 0.05, 90.0),
            word("w1", "Item"),
            word("w2", "Price"),
            word("w3", "Tea"),
            word("w4", "3.50"),
            word("w5", "Cake"),
            word("w6", "4.00"),
            cell("c11", 1, 1, "w1"),
            cell("c12", 1, 2, "w2"),
            cell("c21", 2, 1, "w3"),
            cell("c22", 2, 2, "w4"),
            cell("c31", 3, 1, "w5"),
            cell("c32", 3, 2, "w6"),
            RecognizedBlock::table(
                "t1",
                1,
                ["c11", "c12", "c21", "c22", "c31", "c32"]
                    .iter()
                    .map(|id| (*id).into())
                    .collect(),
                BoundingBox::default(),
            ),
        ]
    }

    #[test]
    fn plain_request_uses_detection() {
        let backend = CannedBackend::new(vec![
            line("a", "Hello", 0.10, 80.0),
            line("b", "world", 0.12, 100.0),
        ]);
        let config = ExtractionConfig::default();
        let output = OcrAdapter::new(&backend, &config)
            .recognize(DocumentSource::Bytes(b"img"), FeatureFlags::default())
            .unwrap();

        assert!(backend.detected.get());
        assert!(!backend.analyzed.get());
        assert_eq!(output.text, "Hello world");
        assert_eq!(output.confidence, Some(90.0));
        assert_eq!(output.pages(), 1);
    }

    #[test]
    fn table_request_appends_rendered_grid() {
        let backend = CannedBackend::new(invoice_blocks());
        let config = ExtractionConfig::default();
        let flags = FeatureFlags {
            detect_tables: true,
            detect_forms: false,
        };
        let output = OcrAdapter::new(&backend, &config)
            .recognize(DocumentSource::Bytes(b"img"), flags)
            .unwrap();

        assert!(backend.analyzed.get());
        let (prose, tables) = output
            .text
            .split_once(&format!("\n\n{TABLES_MARKER}\n\n"))
            .expect("tables section");
        assert_eq!(prose, "Invoice 42");

        let lines: Vec<&str> = tables.lines().collect();
        assert!(lines[0].contains("Item") && lines[0].contains("Price"));
        assert!(lines[1].starts_with("|-"));
        let data_rows = &lines[2..];
        assert_eq!(data_rows.len(), 2);
        assert!(data_rows.iter().all(|row| row.starts_with('|') && row.ends_with('|')));
        assert_eq!(output.document.tables().count(), 1);
    }

    #[test]
    fn forms_only_request_analyses_without_tables() {
        let backend = CannedBackend::new(invoice_blocks());
        let config = ExtractionConfig::default();
        let flags = FeatureFlags {
            detect_tables: false,
            detect_forms: true,
        };
        let output = OcrAdapter::new(&backend, &config)
            .recognize(DocumentSource::Bytes(b"img"), flags)
            .unwrap();

        assert!(backend.analyzed.get());
        assert!(!output.text.contains(TABLES_MARKER));
    }

    #[test]
    fn refusal_propagates_unchanged() {
        let config = ExtractionConfig::default();
        let locator = StorageLocator::new("uploads", "doc.pdf");
        let err = OcrAdapter::new(&RefusingBackend, &config)
            .recognize(DocumentSource::Storage(&locator), FeatureFlags::default())
            .unwrap_err();
        assert!(err.is_unsupported_document());
    }

    #[test]
    fn no_scores_no_confidence() {
        let backend = CannedBackend::new(vec![RecognizedBlock::line(
            "a",
            1,
            "unscored",
            BoundingBox::new(0.1, 0.1, 0.5, 0.02),
        )]);
        let config = ExtractionConfig::default();
        let output = OcrAdapter::new(&backend, &config)
            .recognize(DocumentSource::Bytes(b"img"), FeatureFlags::default())
            .unwrap();
        assert_eq!(output.confidence, None);
        assert!(output.has_text());
    }
}
