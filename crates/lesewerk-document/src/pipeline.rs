// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fallback extraction pipeline.
//
// Validating -> direct OCR -> (refused) rasterise -> per-page OCR -> aggregate.
//
// Direct OCR tries the storage locator first, when one exists, and then the
// raw bytes. Only an explicit "unsupported document" refusal moves on to the
// image fallback; every other OCR error ends extraction. Per-page failures
// during the fallback are logged and skipped. Total failure is reported as
// a structured `ExtractionFailure` so the caller can run its own non-OCR
// parser when the kind asks for it.

use chrono::Utc;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::{
    DocumentFormat, ExtractedText, ExtractionConfig, ExtractionFailure, ExtractionMethod,
    ExtractionRequest, FeatureFlags, StorageLocator,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::format::detect_format;
use crate::ocr::{DocumentSource, OcrAdapter, OcrBackend};
use crate::pdf::rasterize::{PageRenderer, PdfRasterizer};
use crate::pdf::reader::inspect_pdf;
use crate::storage::ObjectStore;
use crate::strategy::StrategyChain;

/// Text recovered by one top-level strategy, before provenance is attached.
struct Recovered {
    text: String,
    confidence: Option<f32>,
    pages: usize,
    method: ExtractionMethod,
}

/// Sequences format validation, OCR, and the rasterisation fallback.
///
/// Holds no per-document state; one pipeline serves any number of
/// sequential requests.
pub struct ExtractionPipeline {
    ocr: Box<dyn OcrBackend>,
    renderer: Box<dyn PageRenderer>,
    store: Option<Box<dyn ObjectStore>>,
    config: ExtractionConfig,
}

impl ExtractionPipeline {
    /// # Errors
    ///
    /// [`LesewerkError::Config`] if `config` fails validation.
    pub fn new(
        ocr: Box<dyn OcrBackend>,
        renderer: Box<dyn PageRenderer>,
        config: ExtractionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ocr,
            renderer,
            store: None,
            config,
        })
    }

    /// Attach an object store for [`extract_from_storage`](Self::extract_from_storage).
    pub fn with_store(mut self, store: Box<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract text from a document held in memory (and optionally also in
    /// object storage, via the request's locator).
    pub fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> std::result::Result<ExtractedText, ExtractionFailure> {
        self.run(request).map_err(|err| log_failure(&request.id.to_string(), err))
    }

    /// Download the document body from the attached store, then extract
    /// with the locator available as the preferred OCR source.
    pub fn extract_from_storage(
        &self,
        locator: StorageLocator,
        flags: FeatureFlags,
    ) -> std::result::Result<ExtractedText, ExtractionFailure> {
        let bytes = self
            .store
            .as_deref()
            .ok_or_else(|| LesewerkError::Config("no object store configured".into()))
            .and_then(|store| store.download(&locator))
            .map_err(|err| log_failure(&locator.to_string(), err))?;
        let request = ExtractionRequest::new(bytes)
            .with_locator(locator)
            .with_flags(flags);
        self.extract(&request)
    }

    #[instrument(skip_all, fields(request = %request.id, bytes_len = request.bytes.len()))]
    fn run(&self, request: &ExtractionRequest) -> Result<ExtractedText> {
        let format = detect_format(&request.bytes);
        if !format.is_supported() {
            return Err(LesewerkError::UnsupportedFormat(
                "byte signature matches no supported document format".into(),
            ));
        }
        debug!(%format, "Format validated");

        if request.bytes.len() as u64 > self.config.async_size_threshold_bytes {
            info!(
                threshold = self.config.async_size_threshold_bytes,
                "Large document processed synchronously; candidate for asynchronous OCR"
            );
        }

        let adapter = OcrAdapter::new(self.ocr.as_ref(), &self.config);
        let outcome = StrategyChain::new("extraction")
            .then(ExtractionMethod::DirectOcr.label(), || {
                self.direct_ocr(&adapter, request)
            })
            .then(ExtractionMethod::ImageFallbackOcr.label(), || {
                self.image_fallback(&adapter, request, format)
            })
            .run(LesewerkError::is_unsupported_document)?;

        let recovered = outcome.value;
        info!(
            method = %recovered.method,
            pages = recovered.pages,
            confidence = ?recovered.confidence,
            "Extraction complete"
        );

        Ok(ExtractedText {
            text: recovered.text,
            confidence: recovered.confidence,
            method: recovered.method,
            pages: recovered.pages,
            format,
            source_sha256: hex::encode(Sha256::digest(&request.bytes)),
            extracted_at: Utc::now(),
        })
    }

    /// OCR the whole document, storage locator first when present.
    fn direct_ocr(
        &self,
        adapter: &OcrAdapter<'_>,
        request: &ExtractionRequest,
    ) -> Result<Recovered> {
        let flags = request.flags;
        let mut sources = StrategyChain::new("ocr source");
        if let Some(locator) = &request.locator {
            sources = sources.then("storage", move || {
                adapter.recognize(DocumentSource::Storage(locator), flags)
            });
        }
        let outcome = sources
            .then("bytes", || {
                adapter.recognize(DocumentSource::Bytes(&request.bytes), flags)
            })
            .run(|_| true)?;

        debug!(source = outcome.strategy, "Direct OCR accepted the document");
        let output = outcome.value;
        Ok(Recovered {
            pages: output.pages(),
            text: output.text,
            confidence: output.confidence,
            method: ExtractionMethod::DirectOcr,
        })
    }

    /// Rasterise the PDF and OCR each page image from bytes. Page images
    /// never have a storage locator.
    fn image_fallback(
        &self,
        adapter: &OcrAdapter<'_>,
        request: &ExtractionRequest,
        format: DocumentFormat,
    ) -> Result<Recovered> {
        if format != DocumentFormat::Pdf {
            return Err(LesewerkError::UnsupportedDocument(format!(
                "OCR refused the {format} document and only PDFs can be rasterised"
            )));
        }

        let inspection = inspect_pdf(&request.bytes);
        info!(
            page_count = ?inspection.page_count,
            encrypted = inspection.encrypted,
            "OCR refused the document; rasterising"
        );

        let conversion =
            PdfRasterizer::new(self.renderer.as_ref(), &self.config).rasterize(&request.bytes)?;
        if conversion.pages.is_empty() {
            return Err(LesewerkError::UnsupportedDocument(
                "rasterisation produced no usable pages".into(),
            ));
        }

        let mut sections = Vec::with_capacity(conversion.pages.len());
        let mut confidences = Vec::new();
        for page in &conversion.pages {
            match adapter.recognize(DocumentSource::Bytes(&page.bytes), request.flags) {
                Ok(output) if output.has_text() => {
                    if let Some(confidence) = output.confidence {
                        confidences.push(confidence);
                    }
                    sections.push(format!("--- Page {} ---\n{}", page.page, output.text.trim()));
                }
                Ok(_) => debug!(page = page.page, "Page produced no text"),
                Err(err) => warn!(page = page.page, %err, "Page OCR failed; skipping"),
            }
        }

        if sections.is_empty() {
            return Err(LesewerkError::UnsupportedDocument(format!(
                "none of {} rasterised pages produced text",
                conversion.pages.len()
            )));
        }

        let confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        Ok(Recovered {
            pages: sections.len(),
            text: sections.join("\n\n"),
            confidence,
            method: ExtractionMethod::ImageFallbackOcr,
        })
    }
}

/// Convert to the caller-facing failure and log it once.
fn log_failure(subject: &str, err: LesewerkError) -> ExtractionFailure {
    let failure = ExtractionFailure::from(err);
    warn!(
        subject,
        kind = ?failure.kind,
        message = %failure.message,
        "Extraction failed"
    );
    failure
}
