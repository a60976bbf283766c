use crate::model::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable configuration handed to a `TitleBlockEngine` at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// Coarse grid used by the title block locator.
    #[serde(default)]
    pub region_grid: RegionGrid,
    /// Keywords counted (case-insensitive substring match) when scoring regions.
    pub keywords: Vec<String>,
    #[serde(default)]
    pub weights: KeywordWeights,
    #[serde(default)]
    pub tolerances: Tolerances,
    /// Field type -> label texts that name it.
    pub label_synonyms: BTreeMap<FieldType, Vec<String>>,
    /// Words that make a cell look like a label to the role classifier.
    #[serde(default = "default_label_words")]
    pub label_words: Vec<String>,
    /// Feed rectangle edges to the cell reconstructor alongside stroked lines.
    #[serde(default = "default_true")]
    pub rectangle_edges: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegionGrid {
    pub rows: usize,
    pub cols: usize,
}

impl Default for RegionGrid {
    fn default() -> Self {
        RegionGrid { rows: 4, cols: 4 }
    }
}

/// Per-hit weights for keyword scoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeywordWeights {
    pub base: f64,
    pub large_font: f64,
    pub medium_font: f64,
    pub color: f64,
    pub bold: f64,
    /// Font size / page median above which `large_font` applies.
    pub large_font_ratio: f64,
    /// Lower bound of the `medium_font` band.
    pub medium_font_ratio: f64,
}

impl Default for KeywordWeights {
    fn default() -> Self {
        KeywordWeights {
            base: 1.0,
            large_font: 2.0,
            medium_font: 1.0,
            color: 1.0,
            bold: 1.5,
            large_font_ratio: 1.2,
            medium_font_ratio: 1.1,
        }
    }
}

/// Distances in page units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerances {
    /// Lines closer than this along their defining axis are merged.
    pub line_merge: f64,
    /// Slack for point-in-cell tests.
    pub cell_assign: f64,
    /// Maximum gap between touching edges of merged cells.
    pub merge_touch: f64,
    /// Greedy clustering tolerance for synthetic rows.
    pub row_cluster: f64,
    /// Greedy clustering tolerance for synthetic columns.
    pub col_cluster: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            line_merge: 2.0,
            cell_assign: 2.0,
            merge_touch: 5.0,
            row_cluster: 5.0,
            col_cluster: 10.0,
        }
    }
}

fn default_label_words() -> Vec<String> {
    [
        "drawing", "scale", "date", "revision", "title", "project", "client", "sheet",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}
