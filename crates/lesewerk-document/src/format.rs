// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format validation — classify a buffer by its leading magic bytes.

use lesewerk_core::DocumentFormat;

const PDF_MAGIC: &[u8] = b"%PDF";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47];
const TIFF_LE_MAGIC: &[u8] = &[0x49, 0x49];
const TIFF_BE_MAGIC: &[u8] = &[0x4D, 0x4D];

/// Classify `data` by signature. Never fails; unknown input is
/// [`DocumentFormat::Unsupported`] and the caller decides what that means.
pub fn detect_format(data: &[u8]) -> DocumentFormat {
    if data.starts_with(PDF_MAGIC) {
        DocumentFormat::Pdf
    } else if data.starts_with(JPEG_MAGIC) {
        DocumentFormat::Jpeg
    } else if data.starts_with(PNG_MAGIC) {
        DocumentFormat::Png
    } else if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
        DocumentFormat::Tiff
    } else {
        DocumentFormat::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_signatures() {
        assert_eq!(detect_format(b"%PDF-1.7\n..."), DocumentFormat::Pdf);
        assert_eq!(
            detect_format(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            DocumentFormat::Jpeg
        );
        assert_eq!(
            detect_format(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            DocumentFormat::Png
        );
        assert_eq!(detect_format(b"II*\0"), DocumentFormat::Tiff);
        assert_eq!(detect_format(b"MM\0*"), DocumentFormat::Tiff);
    }

    #[test]
    fn unknown_or_short_input_is_unsupported() {
        assert_eq!(detect_format(b""), DocumentFormat::Unsupported);
        assert_eq!(detect_format(b"%PD"), DocumentFormat::Unsupported);
        assert_eq!(detect_format(&[0xFF, 0xD8]), DocumentFormat::Unsupported);
        assert_eq!(detect_format(b"PK\x03\x04"), DocumentFormat::Unsupported);
        assert_eq!(detect_format(b"<html>"), DocumentFormat::Unsupported);
        assert_eq!(detect_format(b"IM"), DocumentFormat::Unsupported);
    }

    #[test]
    fn trailing_bytes_do_not_matter() {
        let mut pdf = b"%PDF".to_vec();
        pdf.extend(std::iter::repeat_n(0u8, 4096));
        assert_eq!(detect_format(&pdf), DocumentFormat::Pdf);
    }
}
