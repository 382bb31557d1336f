// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognised blocks — the flat structure an OCR backend returns for one call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Backend-assigned block identifier, unique within one OCR response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Block position on its page, each field a fraction of the page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Lower edge (`top + height`).
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// What a block is, plus the payload specific to that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    Page,
    Line {
        text: String,
    },
    Word {
        text: String,
    },
    /// Owns its cells.
    Table {
        cells: Vec<BlockId>,
    },
    /// 1-based grid position; owns its words.
    Cell {
        row: usize,
        column: usize,
        words: Vec<BlockId>,
    },
}

/// One unit of recognised structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedBlock {
    pub id: BlockId,
    /// 1-based page number.
    pub page: u32,
    pub geometry: BoundingBox,
    /// 0–100, when the backend reports one.
    pub confidence: Option<f32>,
    pub kind: BlockKind,
}

impl RecognizedBlock {
    pub fn line(
        id: impl Into<BlockId>,
        page: u32,
        text: impl Into<String>,
        geometry: BoundingBox,
    ) -> Self {
        Self {
            id: id.into(),
            page,
            geometry,
            confidence: None,
            kind: BlockKind::Line { text: text.into() },
        }
    }

    pub fn word(
        id: impl Into<BlockId>,
        page: u32,
        text: impl Into<String>,
        geometry: BoundingBox,
    ) -> Self {
        Self {
            id: id.into(),
            page,
            geometry,
            confidence: None,
            kind: BlockKind::Word { text: text.into() },
        }
    }

    pub fn table(
        id: impl Into<BlockId>,
        page: u32,
        cells: Vec<BlockId>,
        geometry: BoundingBox,
    ) -> Self {
        Self {
            id: id.into(),
            page,
            geometry,
            confidence: None,
            kind: BlockKind::Table { cells },
        }
    }

    pub fn cell(
        id: impl Into<BlockId>,
        page: u32,
        row: usize,
        column: usize,
        words: Vec<BlockId>,
        geometry: BoundingBox,
    ) -> Self {
        Self {
            id: id.into(),
            page,
            geometry,
            confidence: None,
            kind: BlockKind::Cell { row, column, words },
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Text carried by Line and Word blocks.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Line { text } | BlockKind::Word { text } => Some(text),
            BlockKind::Page | BlockKind::Table { .. } | BlockKind::Cell { .. } => None,
        }
    }
}

/// Id → block lookup for resolving ownership links.
pub struct BlockIndex<'a> {
    by_id: HashMap<&'a BlockId, &'a RecognizedBlock>,
}

impl<'a> BlockIndex<'a> {
    pub fn new(blocks: &'a [RecognizedBlock]) -> Self {
        Self {
            by_id: blocks.iter().map(|block| (&block.id, block)).collect(),
        }
    }

    pub fn get(&self, id: &BlockId) -> Option<&'a RecognizedBlock> {
        self.by_id.get(id).copied()
    }
}

/// Mean confidence over every block that reports one.
pub fn mean_confidence(blocks: &[RecognizedBlock]) -> Option<f32> {
    let scores: Vec<f32> = blocks.iter().filter_map(|block| block.confidence).collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_edge() {
        let bbox = BoundingBox::new(0.25, 0.1, 0.5, 0.05);
        assert!((bbox.bottom() - 0.30).abs() < 1e-6);
    }

    #[test]
    fn only_lines_and_words_carry_text() {
        let geometry = BoundingBox::default();
        assert_eq!(RecognizedBlock::line("l1", 1, "hello", geometry).text(), Some("hello"));
        assert_eq!(RecognizedBlock::word("w1", 1, "hi", geometry).text(), Some("hi"));
        assert_eq!(RecognizedBlock::table("t1", 1, vec![], geometry).text(), None);
    }

    #[test]
    fn confidence_ignores_blocks_without_score() {
        let geometry = BoundingBox::default();
        let blocks = vec![
            RecognizedBlock::line("a", 1, "x", geometry).with_confidence(90.0),
            RecognizedBlock::line("b", 1, "y", geometry),
            RecognizedBlock::word("c", 1, "z", geometry).with_confidence(80.0),
        ];
        assert_eq!(mean_confidence(&blocks), Some(85.0));
        assert_eq!(mean_confidence(&blocks[1..2]), None);
    }

    #[test]
    fn index_resolves_children() {
        let geometry = BoundingBox::default();
        let blocks = vec![
            RecognizedBlock::word("w1", 1, "cell", geometry),
            RecognizedBlock::cell("c1", 1, 1, 1, vec!["w1".into()], geometry),
        ];
        let index = BlockIndex::new(&blocks);
        assert_eq!(index.get(&"w1".into()).and_then(|b| b.text()), Some("cell"));
        assert!(index.get(&"missing".into()).is_none());
    }
}
