pub mod classify;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fields;
pub mod grid;
pub mod layout;
pub mod locate;
pub mod model;
pub mod sheet;

use classify::RoleAssessment;
use config::schema::EngineConfig;
use error::TitleBlockError;
use extraction::lines::{extract_lines, Transform, VectorLines};
use extraction::{PageInput, PageSource};
use fields::labels::LabelMatcher;
use fields::ExtractedField;
use grid::cells::{reconstruct_cells, CellGrid};
use layout::cluster::Group;
use layout::{Assignment, AssignmentMode, PopulatedCell};
use locate::{PageStats, RegionScore, TitleBlockRegion};
use model::{FieldType, TextFragment};
use serde::{Deserialize, Serialize};
use sheet::SheetInfo;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything learned about one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub sheet: SheetInfo,
    pub best_region: TitleBlockRegion,
    /// Coarse region scores, row-major, row 0 at the top of the page.
    pub grid: Vec<Vec<RegionScore>>,
    pub title_block_content: String,
    /// Absent when no title block was found.
    pub table_structure: Option<TableStructure>,
}

/// Table view of the title block region and the fields read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStructure {
    pub mode: AssignmentMode,
    pub rows: usize,
    pub row_groups: Vec<Group>,
    pub col_groups: Vec<Group>,
    pub cells: Vec<PopulatedCell>,
    pub roles: BTreeMap<String, RoleAssessment>,
    /// Region fragments annotated with cell id, role and in-cell values.
    pub fragments: Vec<TextFragment>,
    pub extracted_fields: BTreeMap<FieldType, ExtractedField>,
}

/// Title block engine bound to one immutable configuration.
///
/// The engine holds no per-page state; one instance can analyze any number
/// of pages, from any number of threads.
#[derive(Debug, Clone)]
pub struct TitleBlockEngine {
    config: EngineConfig,
    labels: LabelMatcher,
}

impl TitleBlockEngine {
    pub fn new(config: EngineConfig) -> Self {
        let labels = LabelMatcher::new(&config.label_synonyms);
        TitleBlockEngine { config, labels }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Vector lines of a page and the cell grid reconstructed from them.
    pub fn detect_grid(&self, page: &PageInput) -> (VectorLines, CellGrid) {
        let initial = page.initial_transform.map(Transform).unwrap_or_default();
        let lines = extract_lines(&page.instructions, initial);

        let (horizontal, vertical) = if self.config.rectangle_edges {
            lines.with_rectangle_edges()
        } else {
            (lines.horizontal.clone(), lines.vertical.clone())
        };
        let grid = reconstruct_cells(&horizontal, &vertical, &self.config.tolerances);
        (lines, grid)
    }

    /// Run the full pipeline on one page. Never fails: degenerate input
    /// yields an undetected region or empty fields.
    pub fn analyze_page(&self, page: &PageInput) -> PageAnalysis {
        let sheet = SheetInfo::from_dimensions(page.width, page.height);
        let stats = PageStats::from_fragments(&page.fragments);
        let scan = locate::locate_title_block(page.size(), &page.fragments, &stats, &self.config);

        if !scan.best.is_detected() {
            debug!("no title block keywords on page");
            return PageAnalysis {
                sheet,
                best_region: scan.best,
                grid: scan.grid,
                title_block_content: String::new(),
                table_structure: None,
            };
        }

        let region = scan.fragments_in_region(&page.fragments);
        let title_block_content = layout::title_block_content(&region, &self.config.tolerances);

        let (_, cells) = self.detect_grid(page);
        let assignment = layout::assign_fragments(&region, &cells, &self.config.tolerances);
        let table = self.analyze_assignment(assignment, &stats);

        PageAnalysis {
            sheet,
            best_region: scan.best,
            grid: scan.grid,
            title_block_content,
            table_structure: Some(table),
        }
    }

    /// Classify cells and extract fields from an existing assignment.
    ///
    /// `stats` describes the whole page, not only the assigned fragments.
    pub fn analyze_assignment(&self, mut assignment: Assignment, stats: &PageStats) -> TableStructure {
        let roles = classify::classify_cells(&mut assignment, stats, &self.config);
        let extracted_fields = fields::extract_fields(&mut assignment, &roles, &self.labels, stats);

        TableStructure {
            mode: assignment.mode,
            rows: assignment.row_count(),
            row_groups: assignment.row_groups,
            col_groups: assignment.col_groups,
            cells: assignment.cells,
            roles,
            fragments: assignment.fragments,
            extracted_fields,
        }
    }
}

impl Default for TitleBlockEngine {
    fn default() -> Self {
        TitleBlockEngine::new(EngineConfig::default())
    }
}

/// Decode a document with `source` and analyze every page.
pub fn analyze_document(
    bytes: &[u8],
    source: &dyn PageSource,
    engine: &TitleBlockEngine,
) -> Result<Vec<PageAnalysis>, TitleBlockError> {
    let pages = source.load_pages(bytes)?;
    debug!(backend = source.backend_name(), pages = pages.len(), "loaded pages");
    Ok(pages.iter().map(|page| engine.analyze_page(page)).collect())
}
