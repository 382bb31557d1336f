// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — structural inspection and embedded-text extraction using the
// `lopdf` crate. Neither operation involves OCR.

use lopdf::Document;
use lesewerk_core::error::LesewerkError;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// What a structural parse could tell about a PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PdfInspection {
    /// `None` when the structure could not be parsed.
    pub page_count: Option<usize>,
    /// The trailer references an `/Encrypt` dictionary.
    pub encrypted: bool,
}

/// Parse `data` just far enough to report page count and encryption.
/// Never fails; unparseable input yields `page_count: None`.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn inspect_pdf(data: &[u8]) -> PdfInspection {
    let encrypted = contains_token(data, b"/Encrypt");
    let page_count = match Document::load_mem(data) {
        Ok(document) => Some(document.get_pages().len()),
        Err(err) => {
            debug!(%err, "PDF structure not parseable");
            None
        }
    };
    PdfInspection {
        page_count,
        encrypted,
    }
}

/// Reads the text layer that a PDF producer embedded, in page order.
///
/// This is layout-unaware and recovers nothing from scanned pages; callers
/// use it only after every OCR strategy has been refused.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, LesewerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            LesewerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Embedded text of every page, pages separated by a blank line. Pages
    /// whose text cannot be decoded are skipped.
    pub fn extract_text(&self) -> Result<String, LesewerkError> {
        let mut page_numbers: Vec<u32> = self.document.get_pages().keys().copied().collect();
        page_numbers.sort_unstable();
        if page_numbers.is_empty() {
            return Err(LesewerkError::PdfError("document has no pages".into()));
        }

        let mut pages = Vec::with_capacity(page_numbers.len());
        for page in page_numbers {
            match self.document.extract_text(&[page]) {
                Ok(text) if !text.trim().is_empty() => pages.push(text.trim().to_string()),
                Ok(_) => {}
                Err(err) => warn!(page, %err, "Embedded text not decodable"),
            }
        }
        Ok(pages.join("\n\n"))
    }
}

/// Extract a PDF's embedded text layer in one call.
pub fn extract_embedded_text(data: &[u8]) -> Result<String, LesewerkError> {
    PdfReader::from_bytes(data)?.extract_text()
}

fn contains_token(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn sample_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        doc.save_to(&mut output).unwrap();
        output
    }

    #[test]
    fn inspect_counts_pages() {
        let pdf = sample_pdf(&["one", "two", "three"]);
        let inspection = inspect_pdf(&pdf);
        assert_eq!(inspection.page_count, Some(3));
        assert!(!inspection.encrypted);
    }

    #[test]
    fn inspect_garbage_is_not_fatal() {
        let inspection = inspect_pdf(b"%PDF-1.4\nthis is not a real pdf /Encrypt");
        assert_eq!(inspection.page_count, None);
        assert!(inspection.encrypted);
    }

    #[test]
    fn embedded_text_in_page_order() {
        let pdf = sample_pdf(&["Hello", "World"]);
        let text = extract_embedded_text(&pdf).unwrap();
        let hello = text.find("Hello").expect("first page text");
        let world = text.find("World").expect("second page text");
        assert!(hello < world);
    }

    #[test]
    fn reader_rejects_non_pdf() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(LesewerkError::PdfError(_))
        ));
    }
}
