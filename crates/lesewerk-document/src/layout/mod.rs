// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout reconstruction — turn flat OCR blocks back into pages, paragraphs,
// and tables.

pub mod blocks;
pub mod paragraphs;
pub mod table;

pub use blocks::{BlockId, BlockIndex, BlockKind, BoundingBox, RecognizedBlock};
pub use paragraphs::reconstruct_paragraphs;
pub use table::{TableGrid, reconstruct_tables};

/// Placed between pages of reconstructed text.
pub const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";

/// One page of reconstructed content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructedPage {
    /// 1-based page number.
    pub number: u32,
    /// Top-to-bottom; each paragraph is its lines joined with single spaces.
    pub paragraphs: Vec<String>,
    /// Only populated when table detection was requested.
    pub tables: Vec<TableGrid>,
}

impl ReconstructedPage {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Paragraphs separated by a blank line.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

/// Pages in ascending page-number order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconstructedDocument {
    pub pages: Vec<ReconstructedPage>,
}

impl ReconstructedDocument {
    /// Page `number`, inserted in order if it does not exist yet.
    pub fn page_mut(&mut self, number: u32) -> &mut ReconstructedPage {
        let position = match self.pages.binary_search_by_key(&number, |page| page.number) {
            Ok(found) => found,
            Err(insert_at) => {
                self.pages.insert(insert_at, ReconstructedPage::new(number));
                insert_at
            }
        };
        &mut self.pages[position]
    }

    /// Paragraph text of every page, joined with [`PAGE_BREAK`].
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .filter(|page| !page.paragraphs.is_empty())
            .map(ReconstructedPage::text)
            .collect::<Vec<_>>()
            .join(PAGE_BREAK)
    }

    /// Every table, in page order.
    pub fn tables(&self) -> impl Iterator<Item = &TableGrid> {
        self.pages.iter().flat_map(|page| page.tables.iter())
    }

    /// Number of pages with at least one paragraph or table.
    pub fn content_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| !page.paragraphs.is_empty() || !page.tables.is_empty())
            .count()
    }
}
