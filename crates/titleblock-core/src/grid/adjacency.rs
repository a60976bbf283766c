use crate::grid::cells::CellGrid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Right,
    Left,
    Top,
    Bottom,
}

/// Order in which neighbors are probed when looking for a label's value.
///
/// Two orders exist side by side: label cells found by the role classifier
/// look right first, while the direct label scan over a synthetic grid
/// looks below first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyStrategy {
    RoleAdjacency,
    GridAdjacency,
}

impl AdjacencyStrategy {
    pub fn order(&self) -> [Direction; 4] {
        match self {
            AdjacencyStrategy::RoleAdjacency => [
                Direction::Right,
                Direction::Bottom,
                Direction::Left,
                Direction::Top,
            ],
            AdjacencyStrategy::GridAdjacency => [
                Direction::Bottom,
                Direction::Right,
                Direction::Top,
                Direction::Left,
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    pub right: Option<String>,
    pub left: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
}

impl Neighbors {
    pub fn get(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Right => self.right.as_deref(),
            Direction::Left => self.left.as_deref(),
            Direction::Top => self.top.as_deref(),
            Direction::Bottom => self.bottom.as_deref(),
        }
    }
}

/// Cell id -> neighbor ids in the four directions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyMap(pub BTreeMap<String, Neighbors>);

impl AdjacencyMap {
    pub fn neighbor(&self, cell_id: &str, direction: Direction) -> Option<&str> {
        self.0.get(cell_id).and_then(|n| n.get(direction))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adjacency over the lead cells of a reconstructed grid.
    ///
    /// Neighbors are found by grid index, stepping past the cell's own span;
    /// a neighbor that was absorbed by a merge is replaced by its lead.
    pub fn from_grid(grid: &CellGrid) -> Self {
        let mut map = BTreeMap::new();

        for cell in grid.lead_cells() {
            let lookup = |row: Option<usize>, col: Option<usize>| -> Option<String> {
                let target = grid.at(row?, col?)?;
                let lead = grid.resolve(target);
                (lead.id != cell.id).then(|| lead.id.clone())
            };

            let neighbors = Neighbors {
                right: lookup(Some(cell.row), Some(cell.col + cell.col_span)),
                left: lookup(Some(cell.row), cell.col.checked_sub(1)),
                top: lookup(cell.row.checked_sub(1), Some(cell.col)),
                bottom: lookup(Some(cell.row + cell.row_span), Some(cell.col)),
            };
            map.insert(cell.id.clone(), neighbors);
        }

        AdjacencyMap(map)
    }

    /// Adjacency over sparse synthetic cells given as `(id, row, col)`.
    ///
    /// The neighbor in each direction is the nearest populated cell along the
    /// same row or column.
    pub fn from_positions(cells: &[(String, usize, usize)]) -> Self {
        let mut map = BTreeMap::new();

        for (id, row, col) in cells {
            let nearest = |pick: &dyn Fn(usize, usize) -> Option<usize>| -> Option<String> {
                cells
                    .iter()
                    .filter_map(|(other, r, c)| pick(*r, *c).map(|d| (d, other)))
                    .min_by_key(|(d, _)| *d)
                    .map(|(_, other)| other.clone())
            };

            let neighbors = Neighbors {
                right: nearest(&|r, c| (r == *row && c > *col).then(|| c - col)),
                left: nearest(&|r, c| (r == *row && c < *col).then(|| col - c)),
                top: nearest(&|r, c| (c == *col && r < *row).then(|| row - r)),
                bottom: nearest(&|r, c| (c == *col && r > *row).then(|| r - row)),
            };
            map.insert(id.clone(), neighbors);
        }

        AdjacencyMap(map)
    }
}
