//! Text-to-cell assignment: attach region fragments to reconstructed cells,
//! or to synthetic cells built from coordinate clusters.

pub mod cluster;

use crate::config::schema::Tolerances;
use crate::grid::adjacency::AdjacencyMap;
use crate::grid::cells::{CellGrid, CellSpatial};
use crate::model::TextFragment;
use cluster::{cluster, membership, Group, ScanOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// Fragments were placed into cells reconstructed from vector lines.
    Reconstructed,
    /// No usable cells; fragments were clustered into synthetic rows/columns.
    Synthetic,
}

/// A cell holding at least one fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedCell {
    pub id: String,
    pub row: usize,
    pub col: usize,
    /// Indices into `Assignment::fragments`, top to bottom then left to right.
    pub fragments: Vec<usize>,
    pub spatial: CellSpatial,
    /// The cell sits in the first populated row of the table.
    pub is_top_row: bool,
}

/// Fragments of the title block region together with their cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub mode: AssignmentMode,
    pub fragments: Vec<TextFragment>,
    pub row_groups: Vec<Group>,
    pub col_groups: Vec<Group>,
    pub cells: Vec<PopulatedCell>,
    pub adjacency: AdjacencyMap,
}

impl Assignment {
    pub fn cell(&self, id: &str) -> Option<&PopulatedCell> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn cell_fragments<'a>(&'a self, cell: &'a PopulatedCell) -> impl Iterator<Item = &'a TextFragment> {
        cell.fragments.iter().map(move |&i| &self.fragments[i])
    }

    /// Trimmed fragment texts of a cell joined with single spaces.
    pub fn cell_text(&self, cell: &PopulatedCell) -> String {
        self.cell_fragments(cell)
            .map(|f| f.trimmed())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Number of table rows: grid rows for reconstructed cells, row groups otherwise.
    pub fn row_count(&self) -> usize {
        match self.mode {
            AssignmentMode::Reconstructed => self.cells.iter().map(|c| c.row + 1).max().unwrap_or(0),
            AssignmentMode::Synthetic => self.row_groups.len(),
        }
    }

    /// Build an assignment from fragments that already carry synthetic
    /// `row_<r>_col_<c>` cell ids. Fragments without a cell id are kept but
    /// belong to no cell.
    pub fn from_annotated(fragments: Vec<TextFragment>, tolerances: &Tolerances) -> Self {
        let (row_groups, col_groups) = groups(&fragments, tolerances);
        let rows = membership(&row_groups, fragments.len());

        let mut by_cell: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, fragment) in fragments.iter().enumerate() {
            if let Some(id) = &fragment.cell_id {
                by_cell.entry(id.clone()).or_default().push(i);
            }
        }

        let cells: Vec<PopulatedCell> = by_cell
            .into_iter()
            .map(|(id, members)| {
                let (row, col) = parse_synthetic_id(&id).unwrap_or((0, 0));
                build_cell(id, row, col, members, &fragments, &rows, None)
            })
            .collect();

        finish(AssignmentMode::Synthetic, fragments, row_groups, col_groups, cells, None)
    }
}

/// Assign region fragments to cells.
///
/// Reconstructed cells are used only when they cover the region: every
/// fragment carrying text must anchor inside a lead cell. Otherwise all
/// fragments are clustered into a synthetic grid with ids `row_<r>_col_<c>`
/// (1-based), so text outside the ruled part of a block is never dropped.
pub fn assign_fragments(
    region_fragments: &[&TextFragment],
    grid: &CellGrid,
    tolerances: &Tolerances,
) -> Assignment {
    let mut fragments: Vec<TextFragment> = region_fragments.iter().map(|f| (*f).clone()).collect();
    for fragment in fragments.iter_mut() {
        fragment.cell_id = None;
    }
    let (row_groups, col_groups) = groups(&fragments, tolerances);
    let rows = membership(&row_groups, fragments.len());

    let hits: Vec<Option<usize>> = fragments
        .iter()
        .map(|f| {
            grid.cells
                .iter()
                .position(|c| !c.is_merged && c.contains(f.x, f.y, tolerances.cell_assign))
        })
        .collect();

    let covered = hits.iter().any(Option::is_some)
        && hits
            .iter()
            .zip(&fragments)
            .all(|(hit, f)| hit.is_some() || f.trimmed().is_empty());

    if covered {
        let mut by_cell: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, hit) in hits.iter().enumerate() {
            if let Some(cell_index) = hit {
                by_cell.entry(*cell_index).or_default().push(i);
            }
        }

        let cells = by_cell
            .into_iter()
            .map(|(cell_index, members)| {
                let cell = &grid.cells[cell_index];
                build_cell(
                    cell.id.clone(),
                    cell.row,
                    cell.col,
                    members,
                    &fragments,
                    &rows,
                    Some(cell.spatial),
                )
            })
            .collect::<Vec<_>>();

        debug!(
            cells = cells.len(),
            unassigned = hits.iter().filter(|h| h.is_none()).count(),
            "assigned fragments to reconstructed cells"
        );
        return finish(
            AssignmentMode::Reconstructed,
            fragments,
            row_groups,
            col_groups,
            cells,
            Some(grid),
        );
    }

    let cols = membership(&col_groups, fragments.len());
    let mut by_cell: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for i in 0..fragments.len() {
        by_cell.entry((rows[i], cols[i])).or_default().push(i);
    }

    let cells = by_cell
        .into_iter()
        .map(|((row, col), members)| {
            build_cell(synthetic_id(row, col), row, col, members, &fragments, &rows, None)
        })
        .collect::<Vec<_>>();

    debug!(
        ruled_hits = hits.iter().filter(|h| h.is_some()).count(),
        rows = row_groups.len(),
        cols = col_groups.len(),
        cells = cells.len(),
        "assigned fragments to synthetic grid"
    );
    finish(AssignmentMode::Synthetic, fragments, row_groups, col_groups, cells, None)
}

/// Text of the region as lines: row groups top to bottom, each read left to right.
pub fn title_block_content(fragments: &[&TextFragment], tolerances: &Tolerances) -> String {
    let rows = cluster(
        &fragments.iter().enumerate().map(|(i, f)| (i, f.y)).collect::<Vec<_>>(),
        tolerances.row_cluster,
        ScanOrder::Descending,
    );

    rows.iter()
        .map(|group| {
            let mut members = group.members.clone();
            members.sort_by(|a, b| fragments[*a].x.total_cmp(&fragments[*b].x));
            members
                .iter()
                .map(|&i| fragments[i].trimmed())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn synthetic_id(row: usize, col: usize) -> String {
    format!("row_{}_col_{}", row, col)
}

fn parse_synthetic_id(id: &str) -> Option<(usize, usize)> {
    let rest = id.strip_prefix("row_")?;
    let (row, col) = rest.split_once("_col_")?;
    Some((row.parse().ok()?, col.parse().ok()?))
}

fn groups(fragments: &[TextFragment], tolerances: &Tolerances) -> (Vec<Group>, Vec<Group>) {
    let ys: Vec<(usize, f64)> = fragments.iter().enumerate().map(|(i, f)| (i, f.y)).collect();
    let xs: Vec<(usize, f64)> = fragments.iter().enumerate().map(|(i, f)| (i, f.x)).collect();
    (
        cluster(&ys, tolerances.row_cluster, ScanOrder::Descending),
        cluster(&xs, tolerances.col_cluster, ScanOrder::Ascending),
    )
}

fn build_cell(
    id: String,
    row: usize,
    col: usize,
    mut members: Vec<usize>,
    fragments: &[TextFragment],
    rows: &[usize],
    spatial: Option<CellSpatial>,
) -> PopulatedCell {
    members.sort_by(|a, b| {
        rows[*a]
            .cmp(&rows[*b])
            .then(fragments[*a].x.total_cmp(&fragments[*b].x))
    });
    let spatial = spatial.unwrap_or_else(|| fragment_bounds(&members, fragments));
    PopulatedCell {
        id,
        row,
        col,
        fragments: members,
        spatial,
        is_top_row: false,
    }
}

/// Geometry of a synthetic cell: the bounding box of its fragments.
fn fragment_bounds(members: &[usize], fragments: &[TextFragment]) -> CellSpatial {
    let mut left = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    let mut bottom = f64::INFINITY;
    let mut top = f64::NEG_INFINITY;
    for &i in members {
        let f = &fragments[i];
        left = left.min(f.x);
        right = right.max(f.right());
        bottom = bottom.min(f.y);
        top = top.max(f.y + f.line_height());
    }
    let width = (right - left).max(0.0);
    let height = (top - bottom).max(0.0);
    CellSpatial {
        center_x: left + width / 2.0,
        center_y: bottom + height / 2.0,
        area: width * height,
        aspect_ratio: if height > 0.0 { width / height } else { 0.0 },
    }
}

fn finish(
    mode: AssignmentMode,
    mut fragments: Vec<TextFragment>,
    row_groups: Vec<Group>,
    col_groups: Vec<Group>,
    mut cells: Vec<PopulatedCell>,
    grid: Option<&CellGrid>,
) -> Assignment {
    if let Some(first_row) = cells.iter().map(|c| c.row).min() {
        for cell in cells.iter_mut() {
            cell.is_top_row = cell.row == first_row;
        }
    }
    cells.sort_by(|a, b| a.row.cmp(&b.row).then(a.col.cmp(&b.col)));

    for cell in &cells {
        for &i in &cell.fragments {
            fragments[i].cell_id = Some(cell.id.clone());
        }
    }

    let adjacency = match grid {
        Some(grid) => AdjacencyMap::from_grid(grid),
        None => AdjacencyMap::from_positions(
            &cells
                .iter()
                .map(|c| (c.id.clone(), c.row, c.col))
                .collect::<Vec<_>>(),
        ),
    };

    Assignment {
        mode,
        fragments,
        row_groups,
        col_groups,
        cells,
        adjacency,
    }
}
