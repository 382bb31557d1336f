// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paragraph reconstruction from OCR line blocks.
//
// OCR backends return individual lines with no paragraph boundaries. Vertical
// whitespace is the proxy: a gap between one line's bottom edge and the next
// line's top that exceeds `gap_ratio` times the previous line's height starts
// a new paragraph.

use std::collections::BTreeMap;

use tracing::debug;

use super::blocks::{BlockKind, BoundingBox, RecognizedBlock};
use super::{ReconstructedDocument, ReconstructedPage};

/// Slack for float rounding in normalised page coordinates. A gap this close
/// to the threshold counts as equal to it.
const GAP_TOLERANCE: f32 = 1e-5;

struct PositionedLine<'a> {
    geometry: BoundingBox,
    text: &'a str,
}

/// Group the Line blocks in `blocks` into per-page paragraphs.
///
/// Non-line blocks are ignored. The result is deterministic for a given
/// input: lines with equal `top` keep their input order.
pub fn reconstruct_paragraphs(
    blocks: &[RecognizedBlock],
    gap_ratio: f32,
) -> ReconstructedDocument {
    let mut by_page: BTreeMap<u32, Vec<PositionedLine<'_>>> = BTreeMap::new();
    for block in blocks {
        if let BlockKind::Line { text } = &block.kind {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            by_page.entry(block.page).or_default().push(PositionedLine {
                geometry: block.geometry,
                text,
            });
        }
    }

    let mut document = ReconstructedDocument::default();
    for (number, mut lines) in by_page {
        lines.sort_by(|a, b| a.geometry.top.total_cmp(&b.geometry.top));
        let page = group_lines(number, &lines, gap_ratio);
        debug!(
            page = number,
            lines = lines.len(),
            paragraphs = page.paragraphs.len(),
            "Page reconstructed"
        );
        document.pages.push(page);
    }
    document
}

fn group_lines(number: u32, lines: &[PositionedLine<'_>], gap_ratio: f32) -> ReconstructedPage {
    let mut page = ReconstructedPage::new(number);
    let mut current: Vec<&str> = Vec::new();
    let mut previous: Option<&BoundingBox> = None;

    for line in lines {
        if let Some(prev) = previous {
            let gap = line.geometry.top - prev.bottom();
            if gap - gap_ratio * prev.height > GAP_TOLERANCE && !current.is_empty() {
                page.paragraphs.push(current.join(" "));
                current.clear();
            }
        }
        current.push(line.text);
        previous = Some(&line.geometry);
    }

    if !current.is_empty() {
        page.paragraphs.push(current.join(" "));
    }
    page
}
