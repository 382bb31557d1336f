// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF handling: structural inspection and embedded text (lopdf), and
// page-by-page rasterisation for the image fallback.

#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod rasterize;
pub mod reader;
