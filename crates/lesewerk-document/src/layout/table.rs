// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table reconstruction — rebuild a dense grid from Table/Cell/Word blocks and
// render it as a fixed-width, pipe-delimited text table.

use tracing::debug;

use super::blocks::{BlockIndex, BlockKind, RecognizedBlock};

/// Largest grid, in cells, that reconstruction will allocate.
pub const MAX_TABLE_CELLS: usize = 1 << 20;

/// Dense rectangular grid of cell strings, addressed 1-based by
/// (row, column). Every row always has exactly `columns` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGrid {
    rows: usize,
    columns: usize,
    cells: Vec<String>,
}

impl TableGrid {
    /// An all-empty grid, or `None` when it would exceed [`MAX_TABLE_CELLS`].
    pub fn new(rows: usize, columns: usize) -> Option<Self> {
        let size = rows.checked_mul(columns).filter(|size| *size <= MAX_TABLE_CELLS)?;
        Some(Self {
            rows,
            columns,
            cells: vec![String::new(); size],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    fn offset(&self, row: usize, column: usize) -> Option<usize> {
        if row == 0 || column == 0 || row > self.rows || column > self.columns {
            None
        } else {
            Some((row - 1) * self.columns + (column - 1))
        }
    }

    /// Cell text, or `None` when (row, column) lies outside the grid.
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.offset(row, column).map(|i| self.cells[i].as_str())
    }

    /// Replace a cell's text. Returns `false` when out of bounds.
    pub fn set(&mut self, row: usize, column: usize, text: impl Into<String>) -> bool {
        match self.offset(row, column) {
            Some(i) => {
                self.cells[i] = text.into();
                true
            }
            None => false,
        }
    }

    /// Rows in order, each a slice of exactly `columns` strings.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[String]> {
        self.cells.chunks(self.columns.max(1))
    }

    /// Render with a `-` rule under the header row (row 1). Each column is
    /// as wide as its longest cell plus two, capped at `max_column_width`;
    /// longer text is truncated.
    pub fn render(&self, max_column_width: usize) -> String {
        let widths: Vec<usize> = (1..=self.columns)
            .map(|column| {
                let longest = (1..=self.rows)
                    .filter_map(|row| self.get(row, column))
                    .map(|text| text.chars().count())
                    .max()
                    .unwrap_or(0);
                (longest + 2).min(max_column_width)
            })
            .collect();

        let mut lines = Vec::with_capacity(self.rows + 1);
        for (index, row) in self.iter_rows().enumerate() {
            let rendered: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(text, width)| {
                    let inner = width.saturating_sub(2);
                    let clipped: String = text.chars().take(inner).collect();
                    format!(" {clipped:<inner$} ")
                })
                .collect();
            lines.push(format!("|{}|", rendered.join("|")));

            if index == 0 {
                let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
                lines.push(format!("|{}|", rule.join("|")));
            }
        }
        lines.join("\n")
    }
}

/// Build one grid per Table block, paired with its page number, in input
/// order. Tables whose cells are all missing or malformed are skipped.
pub fn reconstruct_tables(blocks: &[RecognizedBlock]) -> Vec<(u32, TableGrid)> {
    let index = BlockIndex::new(blocks);
    let mut tables = Vec::new();

    for block in blocks {
        let BlockKind::Table { cells } = &block.kind else {
            continue;
        };

        let mut entries: Vec<(usize, usize, String)> = Vec::with_capacity(cells.len());
        for cell_id in cells {
            let Some(cell) = index.get(cell_id) else {
                debug!(
                    table = %block.id.0,
                    cell = %cell_id.0,
                    "Cell block missing from response"
                );
                continue;
            };
            let BlockKind::Cell { row, column, words } = &cell.kind else {
                continue;
            };
            if *row == 0 || *column == 0 {
                debug!(cell = %cell_id.0, row, column, "Ignoring cell with zero index");
                continue;
            }
            let text = words
                .iter()
                .filter_map(|word_id| index.get(word_id))
                .filter_map(RecognizedBlock::text)
                .collect::<Vec<_>>()
                .join(" ");
            entries.push((*row, *column, text));
        }

        let max_row = entries.iter().map(|(row, _, _)| *row).max().unwrap_or(0);
        let max_column = entries.iter().map(|(_, column, _)| *column).max().unwrap_or(0);
        if max_row == 0 || max_column == 0 {
            debug!(table = %block.id.0, "Table has no usable cells");
            continue;
        }

        let Some(mut grid) = TableGrid::new(max_row, max_column) else {
            debug!(
                table = %block.id.0,
                rows = max_row,
                columns = max_column,
                "Table grid too large; skipping"
            );
            continue;
        };
        for (row, column, text) in entries {
            let merged = match grid.get(row, column) {
                Some(existing) if !existing.is_empty() => format!("{existing} {text}"),
                _ => text,
            };
            grid.set(row, column, merged);
        }
        debug!(
            table = %block.id.0,
            rows = max_row,
            columns = max_column,
            "Table reconstructed"
        );
        tables.push((block.page, grid));
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BoundingBox;

    fn word(id: &str, text: &str) -> RecognizedBlock {
        RecognizedBlock::word(id, 1, text, BoundingBox::default())
    }

    fn cell(id: &str, row: usize, column: usize, words: &[&str]) -> RecognizedBlock {
        RecognizedBlock::cell(
            id,
            1,
            row,
            column,
            words.iter().map(|w| (*w).into()).collect(),
            BoundingBox::default(),
        )
    }

    fn table(id: &str, cells: &[&str]) -> RecognizedBlock {
        RecognizedBlock::table(
            id,
            1,
            cells.iter().map(|c| (*c).into()).collect(),
            BoundingBox::default(),
        )
    }

    #[test]
    fn sparse_cells_fill_a_dense_grid() {
        // Row 1 has a single cell; the column count comes from row 3.
        let blocks = vec![
            word("w1", "Name"),
            word("w2", "Total"),
            word("w3", "due"),
            cell("c11", 1, 1, &["w1"]),
            cell("c33", 3, 3, &["w2", "w3"]),
            table("t", &["c11", "c33"]),
        ];
        let tables = reconstruct_tables(&blocks);
        assert_eq!(tables.len(), 1);

        let (page, grid) = &tables[0];
        assert_eq!(*page, 1);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.columns(), 3);
        assert!(grid.iter_rows().all(|row| row.len() == 3));
        assert_eq!(grid.get(1, 1), Some("Name"));
        assert_eq!(grid.get(2, 2), Some(""));
        assert_eq!(grid.get(3, 3), Some("Total due"));
        assert_eq!(grid.get(4, 1), None);
        assert_eq!(grid.get(0, 1), None);
    }

    #[test]
    fn render_with_header_rule() {
        let mut grid = TableGrid::new(3, 2).unwrap();
        grid.set(1, 1, "Item");
        grid.set(1, 2, "Qty");
        grid.set(2, 1, "Apples");
        grid.set(2, 2, "3");
        grid.set(3, 1, "Pears");

        let rendered = grid.render(30);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "| Item   | Qty |",
                "|--------|-----|",
                "| Apples | 3   |",
                "| Pears  |     |",
            ]
        );
    }

    #[test]
    fn long_cells_are_capped() {
        let mut grid = TableGrid::new(1, 1).unwrap();
        grid.set(1, 1, "x".repeat(100));
        let rendered = grid.render(30);
        let first = rendered.lines().next().unwrap();
        // Two pipes plus a 30-wide column.
        assert_eq!(first.chars().count(), 32);
    }

    #[test]
    fn malformed_tables_skipped() {
        let blocks = vec![
            cell("zero", 0, 1, &[]),
            table("empty", &[]),
            table("bad", &["zero", "missing"]),
        ];
        assert!(reconstruct_tables(&blocks).is_empty());
    }

    #[test]
    fn duplicate_positions_are_merged() {
        let blocks = vec![
            word("a", "left"),
            word("b", "right"),
            cell("c1", 1, 1, &["a"]),
            cell("c2", 1, 1, &["b"]),
            table("t", &["c1", "c2"]),
        ];
        let tables = reconstruct_tables(&blocks);
        assert_eq!(tables[0].1.get(1, 1), Some("left right"));
    }

    #[test]
    fn set_out_of_bounds_is_rejected() {
        let mut grid = TableGrid::new(2, 2).unwrap();
        assert!(!grid.set(3, 1, "x"));
        assert!(!grid.set(1, 0, "x"));
        assert!(grid.set(2, 2, "x"));
    }

    #[test]
    fn oversized_grids_are_refused() {
        assert!(TableGrid::new(usize::MAX, 2).is_none());
        assert!(TableGrid::new(MAX_TABLE_CELLS + 1, 1).is_none());
        assert!(TableGrid::new(MAX_TABLE_CELLS, 1).is_some());
    }

    #[test]
    fn huge_cell_index_skips_the_table() {
        let blocks = vec![
            word("a", "x"),
            cell("far", usize::MAX, 2, &["a"]),
            cell("near", 1, 1, &["a"]),
            table("huge", &["far"]),
            table("fine", &["near"]),
        ];
        let tables = reconstruct_tables(&blocks);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].1.get(1, 1), Some("x"));
    }
}
