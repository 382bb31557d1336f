// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterisation — turn a PDF into an ordered list of page images for
// OCR backends that refuse the PDF itself.
//
// The renderer is asked for one page at a time because the page count of a
// damaged PDF is not trustworthy. Rendering stops after a run of empty
// images, at a hard page ceiling, or at the first page that fails to render
// (taken to mean "past the last page").

use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::{ExtractionConfig, RasterFormat};
use tracing::{debug, info, instrument};

/// Rendering capability: one page of a PDF to encoded image bytes.
pub trait PageRenderer {
    /// Render 1-based `page` of `pdf`. Must fail for pages past the end.
    fn render_page(&self, pdf: &[u8], page: u32, dpi: u32, format: RasterFormat) -> Result<Vec<u8>>;
}

/// One rasterised page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number in the source PDF.
    pub page: u32,
    pub bytes: Vec<u8>,
}

/// Why rasterisation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Too many consecutive empty pages.
    EmptyPageRun,
    /// The configured page ceiling was reached.
    PageCeiling,
    /// A page failed to render.
    PastLastPage,
}

/// Output of [`PdfRasterizer::rasterize`].
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Non-empty pages only, in ascending page order.
    pub pages: Vec<PageImage>,
    pub dpi: u32,
    pub format: RasterFormat,
    pub stop_reason: StopReason,
    /// Pages rendered but discarded as empty.
    pub empty_pages: u32,
}

struct PageCollector {
    min_bytes: usize,
    pages: Vec<PageImage>,
    empty_run: u32,
    empty_total: u32,
}

impl PageCollector {
    fn push(&mut self, page: u32, bytes: Vec<u8>) {
        if bytes.len() < self.min_bytes {
            self.empty_run += 1;
            self.empty_total += 1;
            debug!(
                page,
                bytes = bytes.len(),
                run = self.empty_run,
                "Page image below size threshold"
            );
        } else {
            self.empty_run = 0;
            debug!(page, bytes = bytes.len(), "Page rasterised");
            self.pages.push(PageImage { page, bytes });
        }
    }
}

/// Drives a [`PageRenderer`] page by page under the configured stopping rules.
pub struct PdfRasterizer<'a> {
    renderer: &'a dyn PageRenderer,
    config: &'a ExtractionConfig,
}

impl<'a> PdfRasterizer<'a> {
    pub fn new(renderer: &'a dyn PageRenderer, config: &'a ExtractionConfig) -> Self {
        Self { renderer, config }
    }

    /// Rasterise at the DPI the config selects for this file size.
    pub fn rasterize(&self, pdf: &[u8]) -> Result<ConversionResult> {
        let dpi = self.config.dpi_for_size(pdf.len() as u64);
        self.rasterize_at(pdf, dpi)
    }

    /// Rasterise at a fixed DPI.
    ///
    /// # Errors
    ///
    /// Returns [`LesewerkError::Rasterization`] if page 1 cannot be rendered;
    /// nothing later in the document is attempted in that case.
    #[instrument(skip_all, fields(bytes_len = pdf.len(), dpi = dpi))]
    pub fn rasterize_at(&self, pdf: &[u8], dpi: u32) -> Result<ConversionResult> {
        let format = self.config.raster_format;

        let probe = self
            .renderer
            .render_page(pdf, 1, dpi, format)
            .map_err(|err| {
                LesewerkError::Rasterization(format!("page 1 could not be rendered: {err}"))
            })?;

        let mut collector = PageCollector {
            min_bytes: self.config.min_page_image_bytes,
            pages: Vec::new(),
            empty_run: 0,
            empty_total: 0,
        };
        collector.push(1, probe);

        let mut page = 1;
        let stop_reason = loop {
            if collector.empty_run >= self.config.max_consecutive_empty_pages {
                break StopReason::EmptyPageRun;
            }
            if page >= self.config.max_pages {
                break StopReason::PageCeiling;
            }
            page += 1;
            match self.renderer.render_page(pdf, page, dpi, format) {
                Ok(bytes) => collector.push(page, bytes),
                Err(err) => {
                    debug!(page, %err, "Render failed; treating as end of document");
                    break StopReason::PastLastPage;
                }
            }
        };

        info!(
            pages = collector.pages.len(),
            empty = collector.empty_total,
            ?stop_reason,
            "Rasterisation complete"
        );

        Ok(ConversionResult {
            pages: collector.pages,
            dpi,
            format,
            stop_reason,
            empty_pages: collector.empty_total,
        })
    }
}
