//! Table cell reconstruction from merged vector lines.

use crate::config::schema::Tolerances;
use crate::extraction::lines::{HorizontalLine, VerticalLine};
use crate::grid::merge::{intersects, merge_horizontal, merge_vertical, MergedLine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A shared boundary counts as drawn at or above this coverage.
const DRAWN_BOUNDARY_COVERAGE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSpatial {
    pub center_x: f64,
    pub center_y: f64,
    pub area: f64,
    pub aspect_ratio: f64,
}

/// A rectangular cell of a reconstructed table. `y` is the bottom edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Row index counted from the top of the table.
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub is_merged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_with_cell_id: Option<String>,
    pub spatial: CellSpatial,
}

impl Cell {
    pub fn new(x: f64, y: f64, width: f64, height: f64, row: usize, col: usize) -> Self {
        let id = format!(
            "cell_{}_{}_{}_{}",
            x.round() as i64,
            y.round() as i64,
            width.round() as i64,
            height.round() as i64
        );
        Cell {
            id,
            x,
            y,
            width,
            height,
            row,
            col,
            row_span: 1,
            col_span: 1,
            is_merged: false,
            merged_with_cell_id: None,
            spatial: spatial(x, y, width, height),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, x: f64, y: f64, tolerance: f64) -> bool {
        x >= self.x - tolerance
            && x <= self.right() + tolerance
            && y >= self.y - tolerance
            && y <= self.top() + tolerance
    }

    fn refresh_spatial(&mut self) {
        self.spatial = spatial(self.x, self.y, self.width, self.height);
    }
}

fn spatial(x: f64, y: f64, width: f64, height: f64) -> CellSpatial {
    CellSpatial {
        center_x: x + width / 2.0,
        center_y: y + height / 2.0,
        area: width * height,
        aspect_ratio: if height > 0.0 { width / height } else { 0.0 },
    }
}

/// The reconstructed table: every cell in row-major order plus the merged
/// lines it was built from (horizontal top-first, vertical left-first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellGrid {
    pub cells: Vec<Cell>,
    pub rows: usize,
    pub cols: usize,
    pub horizontal: Vec<MergedLine>,
    pub vertical: Vec<MergedLine>,
    #[serde(skip)]
    index: HashMap<(usize, usize), usize>,
}

impl CellGrid {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells that are not absorbed by a merge.
    pub fn lead_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_merged)
    }

    pub fn at(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index.get(&(row, col)).map(|&i| &self.cells[i])
    }

    pub fn get(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Follow merge pointers to the lead cell.
    pub fn resolve<'a>(&'a self, cell: &'a Cell) -> &'a Cell {
        match &cell.merged_with_cell_id {
            Some(lead) => self.get(lead).unwrap_or(cell),
            None => cell,
        }
    }

    /// The lead cell containing a point, if any.
    pub fn cell_at_point(&self, x: f64, y: f64, tolerance: f64) -> Option<&Cell> {
        self.lead_cells().find(|c| c.contains(x, y, tolerance))
    }
}

/// Build the table grid from classified lines.
///
/// Fewer than two merged lines in either direction yields an empty grid.
pub fn reconstruct_cells(
    horizontal: &[HorizontalLine],
    vertical: &[VerticalLine],
    tolerances: &Tolerances,
) -> CellGrid {
    let tol = tolerances.line_merge;
    let mut h_lines = merge_horizontal(horizontal, tol);
    h_lines.reverse();
    let v_lines = merge_vertical(vertical, tol);

    if h_lines.len() < 2 || v_lines.len() < 2 {
        debug!(
            horizontal = h_lines.len(),
            vertical = v_lines.len(),
            "not enough merged lines for a cell grid"
        );
        return CellGrid {
            horizontal: h_lines,
            vertical: v_lines,
            ..CellGrid::default()
        };
    }

    let mut cells = Vec::new();
    for (row, pair) in h_lines.windows(2).enumerate() {
        let (top, bottom) = (&pair[0], &pair[1]);
        for (col, vpair) in v_lines.windows(2).enumerate() {
            let (left, right) = (&vpair[0], &vpair[1]);
            let closed = intersects(top, left, tol)
                && intersects(top, right, tol)
                && intersects(bottom, left, tol)
                && intersects(bottom, right, tol);
            let width = right.position - left.position;
            let height = top.position - bottom.position;
            if closed && width > tol && height > tol {
                cells.push(Cell::new(
                    left.position,
                    bottom.position,
                    width,
                    height,
                    row,
                    col,
                ));
            }
        }
    }

    let mut grid = CellGrid {
        rows: h_lines.len() - 1,
        cols: v_lines.len() - 1,
        index: index_cells(&cells),
        cells,
        horizontal: h_lines,
        vertical: v_lines,
    };

    detect_merged_cells(&mut grid, tolerances);

    debug!(
        cells = grid.cells.len(),
        lead_cells = grid.lead_cells().count(),
        rows = grid.rows,
        cols = grid.cols,
        "reconstructed cell grid"
    );

    grid
}

fn index_cells(cells: &[Cell]) -> HashMap<(usize, usize), usize> {
    cells
        .iter()
        .enumerate()
        .map(|(i, c)| ((c.row, c.col), i))
        .collect()
}

/// Chain adjacent cells whose shared boundary was never drawn.
///
/// Horizontal runs are merged first; a cell already absorbed is skipped for
/// the vertical pass.
fn detect_merged_cells(grid: &mut CellGrid, tolerances: &Tolerances) {
    let tol = tolerances.line_merge;
    let touch = tolerances.merge_touch;

    for i in 0..grid.cells.len() {
        if grid.cells[i].is_merged {
            continue;
        }
        loop {
            let lead = &grid.cells[i];
            let Some(&j) = grid.index.get(&(lead.row, lead.col + lead.col_span)) else {
                break;
            };
            let next = &grid.cells[j];
            let separator = &grid.vertical[next.col];
            let joinable = !next.is_merged
                && (next.top() - lead.top()).abs() <= tol
                && (next.height - lead.height).abs() <= tol
                && (next.x - lead.right()).abs() <= touch
                && separator.coverage(lead.y, lead.top()) < DRAWN_BOUNDARY_COVERAGE;
            if !joinable {
                break;
            }

            let lead_id = lead.id.clone();
            let new_right = next.right();
            absorb(grid, j, &lead_id);
            let lead = &mut grid.cells[i];
            lead.col_span += 1;
            lead.width = new_right - lead.x;
            lead.refresh_spatial();
        }
    }

    for i in 0..grid.cells.len() {
        if grid.cells[i].is_merged {
            continue;
        }
        loop {
            let lead = &grid.cells[i];
            let Some(&j) = grid.index.get(&(lead.row + lead.row_span, lead.col)) else {
                break;
            };
            let below = &grid.cells[j];
            let separator = &grid.horizontal[below.row];
            let joinable = !below.is_merged
                && (below.x - lead.x).abs() <= tol
                && (below.width - lead.width).abs() <= tol
                && (below.top() - lead.y).abs() <= touch
                && separator.coverage(lead.x, lead.right()) < DRAWN_BOUNDARY_COVERAGE;
            if !joinable {
                break;
            }

            let lead_id = lead.id.clone();
            let absorbed_id = below.id.clone();
            let new_bottom = below.y;
            absorb(grid, j, &lead_id);
            // Followers of the absorbed cell move to the new lead.
            for cell in grid.cells.iter_mut() {
                if cell.merged_with_cell_id.as_deref() == Some(absorbed_id.as_str()) {
                    cell.merged_with_cell_id = Some(lead_id.clone());
                }
            }
            let lead = &mut grid.cells[i];
            lead.row_span += 1;
            lead.height = lead.top() - new_bottom;
            lead.y = new_bottom;
            lead.refresh_spatial();
        }
    }
}

fn absorb(grid: &mut CellGrid, index: usize, lead_id: &str) {
    let cell = &mut grid.cells[index];
    cell.is_merged = true;
    cell.merged_with_cell_id = Some(lead_id.to_string());
}
