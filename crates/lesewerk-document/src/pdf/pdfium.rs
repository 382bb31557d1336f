// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rendering through PDFium (`pdfium-render`). Only compiled with the
// `pdfium` feature; the PDFium shared library is bound at runtime, first
// from the working directory and then from the system library path.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use lesewerk_core::RasterFormat;
use lesewerk_core::error::{LesewerkError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use super::rasterize::PageRenderer;

const PDF_POINTS_PER_INCH: f32 = 72.0;

/// [`PageRenderer`] backed by a bound PDFium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind PDFium, preferring a copy next to the executable.
    ///
    /// # Errors
    ///
    /// [`LesewerkError::Config`] if no PDFium library can be found.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| LesewerkError::Config(format!("PDFium library not available: {err}")))?;
        info!("PDFium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    #[instrument(skip_all, fields(page = page, dpi = dpi))]
    fn render_page(
        &self,
        pdf: &[u8],
        page: u32,
        dpi: u32,
        format: RasterFormat,
    ) -> Result<Vec<u8>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| {
                LesewerkError::Rasterization(format!("PDFium could not open the document: {err}"))
            })?;

        let index = page
            .checked_sub(1)
            .and_then(|index| u16::try_from(index).ok())
            .ok_or_else(|| LesewerkError::Rasterization(format!("page {page} out of range")))?;
        let pdf_page = document
            .pages()
            .get(index)
            .map_err(|_| LesewerkError::Rasterization(format!("page {page} not found")))?;

        let scale = dpi as f32 / PDF_POINTS_PER_INCH;
        let config = PdfRenderConfig::new()
            .set_target_width(((pdf_page.width().value * scale) as i32).max(1))
            .set_target_height(((pdf_page.height().value * scale) as i32).max(1));

        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|err| {
                LesewerkError::Rasterization(format!("page {page} failed to render: {err}"))
            })?;

        let bytes = encode(bitmap.as_image(), format)?;
        debug!(bytes = bytes.len(), "Page rendered");
        Ok(bytes)
    }
}

fn encode(image: DynamicImage, format: RasterFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let written = match format {
        RasterFormat::Png => image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png),
        // JPEG has no alpha channel.
        RasterFormat::Jpeg => DynamicImage::ImageRgb8(image.into_rgb8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg),
    };
    written
        .map_err(|err| LesewerkError::ImageError(format!("failed to encode page image: {err}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn encodes_both_raster_formats() {
        let white = image::Rgba([255, 255, 255, 255]);
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, white));

        let png = encode(image.clone(), RasterFormat::Png).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let jpeg = encode(image, RasterFormat::Jpeg).unwrap();
        assert!(jpeg.starts_with(&[0xFF, 0xD8, 0xFF]));
    }
}
