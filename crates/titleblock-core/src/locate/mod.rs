//! Title block locator: scores a coarse page grid by weighted keyword density.

pub mod stats;

pub use stats::PageStats;

use crate::config::schema::{EngineConfig, KeywordWeights, RegionGrid};
use crate::model::{PageSize, TextFragment};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Accumulated score of one coarse grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionScore {
    pub row_index: usize,
    pub col_index: usize,
    pub keyword_count: usize,
    pub weighted_score: f64,
    pub fragment_count: usize,
}

/// Page-space rectangle of a coarse grid cell. `y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The best-scoring coarse cell of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleBlockRegion {
    pub row_index: usize,
    pub col_index: usize,
    pub keyword_count: usize,
    pub weighted_score: f64,
    pub bounds: RegionBounds,
}

impl TitleBlockRegion {
    /// A region with no keyword hits means no title block was found.
    pub fn is_detected(&self) -> bool {
        self.keyword_count > 0
    }
}

/// Result of scanning a page: the full score matrix plus the winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionScan {
    pub grid: Vec<Vec<RegionScore>>,
    pub best: TitleBlockRegion,
    #[serde(skip)]
    layout: RegionLayout,
}

impl RegionScan {
    pub fn contains(&self, fragment: &TextFragment) -> bool {
        self.layout.region_of(fragment) == (self.best.row_index, self.best.col_index)
    }

    /// Fragments falling inside the best region, in input order.
    pub fn fragments_in_region<'a>(&self, fragments: &'a [TextFragment]) -> Vec<&'a TextFragment> {
        fragments.iter().filter(|f| self.contains(f)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct RegionLayout {
    rows: usize,
    cols: usize,
    page_height: f64,
    cell_width: f64,
    cell_height: f64,
}

impl RegionLayout {
    fn new(page: PageSize, grid: RegionGrid) -> Self {
        let rows = grid.rows.max(1);
        let cols = grid.cols.max(1);
        RegionLayout {
            rows,
            cols,
            page_height: page.height,
            cell_width: page.width / cols as f64,
            cell_height: page.height / rows as f64,
        }
    }

    /// Coarse cell of a fragment anchor; row 0 is the top of the page.
    /// Anchors on or past the page edges are clamped into the grid.
    fn region_of(&self, fragment: &TextFragment) -> (usize, usize) {
        let col = index(fragment.x / self.cell_width, self.cols);
        let row = index((self.page_height - fragment.y) / self.cell_height, self.rows);
        (row, col)
    }

    fn bounds(&self, row: usize, col: usize) -> RegionBounds {
        RegionBounds {
            x: col as f64 * self.cell_width,
            y: self.page_height - (row + 1) as f64 * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }
}

fn index(value: f64, count: usize) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.floor() as usize).min(count - 1)
}

/// Weight of one keyword hit in `fragment`.
fn hit_weight(fragment: &TextFragment, stats: &PageStats, weights: &KeywordWeights) -> f64 {
    let mut weight = weights.base;

    let ratio = stats.font_ratio(fragment);
    if ratio > weights.large_font_ratio {
        weight += weights.large_font;
    } else if ratio > weights.medium_font_ratio {
        weight += weights.medium_font;
    }

    if fragment.fill_color != stats.body_color {
        weight += weights.color;
    }
    if fragment.is_bold() {
        weight += weights.bold;
    }
    weight
}

/// Score every coarse cell of the page and pick the title block region.
///
/// Ties on weighted score go to the first cell in row-major order.
pub fn locate_title_block(
    page: PageSize,
    fragments: &[TextFragment],
    stats: &PageStats,
    config: &EngineConfig,
) -> RegionScan {
    let layout = RegionLayout::new(page, config.region_grid);
    let keywords: Vec<String> = config.keywords.iter().map(|k| k.to_lowercase()).collect();

    let mut grid: Vec<Vec<RegionScore>> = (0..layout.rows)
        .map(|row| {
            (0..layout.cols)
                .map(|col| RegionScore {
                    row_index: row,
                    col_index: col,
                    keyword_count: 0,
                    weighted_score: 0.0,
                    fragment_count: 0,
                })
                .collect()
        })
        .collect();

    for fragment in fragments {
        let (row, col) = layout.region_of(fragment);
        let score = &mut grid[row][col];
        score.fragment_count += 1;

        let lower = fragment.text.to_lowercase();
        let hits = keywords.iter().filter(|k| lower.contains(k.as_str())).count();
        if hits > 0 {
            score.keyword_count += hits;
            score.weighted_score += hits as f64 * hit_weight(fragment, stats, &config.weights);
        }
    }

    let mut best = &grid[0][0];
    for score in grid.iter().flatten() {
        let better = score.weighted_score > best.weighted_score
            || (score.weighted_score == best.weighted_score
                && best.keyword_count == 0
                && score.keyword_count > 0);
        if better {
            best = score;
        }
    }

    let best = TitleBlockRegion {
        row_index: best.row_index,
        col_index: best.col_index,
        keyword_count: best.keyword_count,
        weighted_score: best.weighted_score,
        bounds: layout.bounds(best.row_index, best.col_index),
    };

    debug!(
        row = best.row_index,
        col = best.col_index,
        keywords = best.keyword_count,
        score = best.weighted_score,
        "title block region"
    );

    RegionScan { grid, best, layout }
}
