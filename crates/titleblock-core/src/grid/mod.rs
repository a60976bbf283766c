//! Table structure: line merging, cell reconstruction and adjacency.

pub mod adjacency;
pub mod cells;
pub mod merge;

pub use adjacency::{AdjacencyMap, AdjacencyStrategy, Direction, Neighbors};
pub use cells::{reconstruct_cells, Cell, CellGrid, CellSpatial};
pub use merge::MergedLine;
