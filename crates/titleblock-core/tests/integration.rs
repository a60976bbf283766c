//! Integration tests for the page analysis pipeline.
//!
//! Pages are built in memory and handed to the engine through a
//! MockPageSource, so no text extraction backend is involved.

use titleblock_core::config::builtin::load_preset;
use titleblock_core::config::schema::Tolerances;
use titleblock_core::error::TitleBlockError;
use titleblock_core::extraction::json::JsonPageSource;
use titleblock_core::extraction::{DrawInstruction, PageInput, PageSource};
use titleblock_core::fields::patterns::MatchKind;
use titleblock_core::layout::{Assignment, AssignmentMode};
use titleblock_core::locate::PageStats;
use titleblock_core::model::{CellRole, FieldType, TextFragment};
use titleblock_core::sheet::{Orientation, PaperSize};
use titleblock_core::{analyze_document, TitleBlockEngine};

struct MockPageSource {
    pages: Vec<PageInput>,
}

impl PageSource for MockPageSource {
    fn load_pages(&self, _bytes: &[u8]) -> Result<Vec<PageInput>, TitleBlockError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct FailingSource;

impl PageSource for FailingSource {
    fn load_pages(&self, _bytes: &[u8]) -> Result<Vec<PageInput>, TitleBlockError> {
        Err(TitleBlockError::InvalidInput("unreadable document".into()))
    }

    fn backend_name(&self) -> &str {
        "failing"
    }
}

const A3_WIDTH: f64 = 1191.0;
const A3_HEIGHT: f64 = 842.0;

fn frag(text: &str, x: f64, y: f64) -> TextFragment {
    TextFragment::new(text, x, y, 8.0).with_color("#000000")
}

/// Body text away from the title block plus a three-row title block in
/// the bottom-right corner of an A3 landscape sheet.
fn title_block_fragments() -> Vec<TextFragment> {
    vec![
        frag("GENERAL NOTES", 60.0, 800.0),
        frag("All dimensions in mm", 60.0, 785.0),
        frag("Drawing No", 905.0, 120.0),
        frag("A-101", 1005.0, 120.0),
        frag("Scale", 905.0, 80.0),
        frag("1:100", 1005.0, 80.0),
        frag("Date", 905.0, 40.0),
        frag("12/03/2024", 1005.0, 40.0),
    ]
}

fn stroke_line(x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<DrawInstruction> {
    vec![
        DrawInstruction::new("m", &[x1, y1]),
        DrawInstruction::new("l", &[x2, y2]),
        DrawInstruction::new("S", &[]),
    ]
}

/// Ruled table: x = 900, 1000, 1180; y = 20, 60, 100, 140.
fn table_instructions() -> Vec<DrawInstruction> {
    let mut ops = vec![DrawInstruction::new("q", &[])];
    for y in [20.0, 60.0, 100.0, 140.0] {
        ops.extend(stroke_line(900.0, y, 1180.0, y));
    }
    for x in [900.0, 1000.0, 1180.0] {
        ops.extend(stroke_line(x, 20.0, x, 140.0));
    }
    ops.push(DrawInstruction::new("Q", &[]));
    ops
}

fn ruled_page() -> PageInput {
    PageInput::new(A3_WIDTH, A3_HEIGHT, title_block_fragments()).with_instructions(table_instructions())
}

fn unruled_page() -> PageInput {
    PageInput::new(A3_WIDTH, A3_HEIGHT, title_block_fragments())
}

fn engine() -> TitleBlockEngine {
    TitleBlockEngine::new(load_preset("standard").unwrap())
}

// ---------------------------------------------------------------------------
// Reconstructed table
// ---------------------------------------------------------------------------
#[test]
fn ruled_title_block_uses_reconstructed_cells() {
    let analysis = engine().analyze_page(&ruled_page());

    assert_eq!(analysis.sheet.orientation, Orientation::Landscape);
    assert_eq!(analysis.sheet.paper_size, PaperSize::A3);
    assert_eq!((analysis.best_region.row_index, analysis.best_region.col_index), (3, 3));
    assert_eq!(analysis.best_region.keyword_count, 3);

    let table = analysis.table_structure.expect("title block detected");
    assert_eq!(table.mode, AssignmentMode::Reconstructed);
    assert_eq!(table.rows, 3);
    assert_eq!(table.cells.len(), 6);

    let drawing = &table.extracted_fields[&FieldType::Drawing];
    assert_eq!(drawing.value, "A-101");
    assert_eq!(drawing.distance, 1);
    assert!(drawing.confidence >= 0.85);

    let scale = &table.extracted_fields[&FieldType::Scale];
    assert_eq!(scale.value, "1:100");
    assert_eq!(scale.validation_details.match_kind, MatchKind::Primary);

    let date = &table.extracted_fields[&FieldType::Date];
    assert_eq!(date.value, "12/03/2024");

    assert!(table.cells.iter().all(|c| c.id.starts_with("cell_")));
    let label = table.fragments.iter().find(|f| f.text == "Scale").unwrap();
    assert_eq!(label.cell_role, Some(CellRole::Label));
}

#[test]
fn title_block_content_reads_rows_top_down() {
    let analysis = engine().analyze_page(&ruled_page());
    assert_eq!(
        analysis.title_block_content,
        "Drawing No A-101\nScale 1:100\nDate 12/03/2024"
    );
}

// ---------------------------------------------------------------------------
// Synthetic grid fallback
// ---------------------------------------------------------------------------
#[test]
fn unruled_title_block_falls_back_to_synthetic_grid() {
    let analysis = engine().analyze_page(&unruled_page());
    let table = analysis.table_structure.expect("title block detected");

    assert_eq!(table.mode, AssignmentMode::Synthetic);
    assert_eq!(table.row_groups.len(), 3);
    assert_eq!(table.col_groups.len(), 2);

    // "Scale" in row_2_col_1, "1:100" in row_2_col_2
    let scale = &table.extracted_fields[&FieldType::Scale];
    assert_eq!(scale.label_cell_id, "row_2_col_1");
    assert_eq!(scale.value_cell_id.as_deref(), Some("row_2_col_2"));
    assert_eq!(scale.value, "1:100");
    assert_eq!(scale.distance, 1);
    assert_eq!(scale.validation_details.match_kind, MatchKind::Primary);
    assert!(scale.confidence >= 0.7);
}

#[test]
fn partly_ruled_title_block_keeps_every_field() {
    // Only the "Drawing No / A-101" row is ruled.
    let mut ops = Vec::new();
    for y in [100.0, 140.0] {
        ops.extend(stroke_line(900.0, y, 1180.0, y));
    }
    for x in [900.0, 1000.0, 1180.0] {
        ops.extend(stroke_line(x, 100.0, x, 140.0));
    }
    let page = PageInput::new(A3_WIDTH, A3_HEIGHT, title_block_fragments()).with_instructions(ops);

    let (_, grid) = engine().detect_grid(&page);
    assert!(!grid.is_empty());

    let partly = engine().analyze_page(&page).table_structure.unwrap();
    let unruled = engine().analyze_page(&unruled_page()).table_structure.unwrap();

    assert_eq!(partly.mode, AssignmentMode::Synthetic);
    assert_eq!(partly.cells.len(), 6);
    assert!(partly.fragments.iter().all(|f| f.cell_id.is_some()));
    for field in [FieldType::Drawing, FieldType::Scale, FieldType::Date] {
        assert_eq!(
            partly.extracted_fields[&field].value,
            unruled.extracted_fields[&field].value
        );
    }
    assert_eq!(partly.extracted_fields[&FieldType::Scale].value, "1:100");
    assert_eq!(partly.extracted_fields[&FieldType::Date].value, "12/03/2024");
}

#[test]
fn same_cell_label_and_value() {
    let mut fragments = vec![
        TextFragment::new("Drawing No:", 10.0, 90.0, 8.0),
        TextFragment::new("A-101", 60.0, 90.0, 8.0),
    ];
    for f in fragments.iter_mut() {
        f.cell_id = Some("row_1_col_1".into());
    }
    let stats = PageStats::from_fragments(&fragments);
    let assignment = Assignment::from_annotated(fragments, &Tolerances::default());

    let table = engine().analyze_assignment(assignment, &stats);
    let drawing = &table.extracted_fields[&FieldType::Drawing];
    assert_eq!(drawing.value, "A-101");
    assert_eq!(drawing.distance, 0);
    assert!(drawing.in_same_cell);
    assert!(drawing.confidence >= 0.85);
}

#[test]
fn nts_scale_accepted() {
    let mut fragments = title_block_fragments();
    fragments[5] = frag("NTS", 1005.0, 80.0);
    let analysis = engine().analyze_page(&PageInput::new(A3_WIDTH, A3_HEIGHT, fragments));

    let table = analysis.table_structure.unwrap();
    let scale = &table.extracted_fields[&FieldType::Scale];
    assert_eq!(scale.value, "NTS");
    assert_eq!(scale.validation_details.match_kind, MatchKind::ValidValue);
    assert!(scale.confidence > 0.0);
}

// ---------------------------------------------------------------------------
// Degenerate pages
// ---------------------------------------------------------------------------
#[test]
fn page_without_keywords_has_no_title_block() {
    let page = PageInput::new(
        595.0,
        842.0,
        vec![frag("Lorem ipsum dolor", 100.0, 700.0), frag("sit amet", 100.0, 680.0)],
    );
    let analysis = engine().analyze_page(&page);

    assert_eq!(analysis.best_region.keyword_count, 0);
    assert!(analysis.table_structure.is_none());
    assert!(analysis.title_block_content.is_empty());
    assert_eq!(analysis.sheet.orientation, Orientation::Portrait);
    assert_eq!(analysis.grid.len(), 4);
}

#[test]
fn empty_page_is_not_an_error() {
    let analysis = engine().analyze_page(&PageInput::new(100.0, 100.0, vec![]));
    assert!(analysis.table_structure.is_none());
    assert_eq!(analysis.sheet.paper_size, PaperSize::Custom);
}

#[test]
fn malformed_instructions_are_skipped() {
    let mut ops = vec![
        DrawInstruction::new("lineTo", &[1.0]),
        DrawInstruction::new("bogus", &[1.0, 2.0]),
        DrawInstruction::new("Q", &[]),
        DrawInstruction::new("cm", &[f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0]),
    ];
    ops.extend(table_instructions());
    let page = PageInput::new(A3_WIDTH, A3_HEIGHT, title_block_fragments()).with_instructions(ops);

    let table = engine().analyze_page(&page).table_structure.unwrap();
    assert_eq!(table.mode, AssignmentMode::Reconstructed);
    assert_eq!(table.extracted_fields[&FieldType::Drawing].value, "A-101");
}

#[test]
fn near_duplicate_lines_merge() {
    let mut ops = stroke_line(0.0, 100.0, 50.0, 100.0);
    ops.extend(stroke_line(40.0, 100.5, 120.0, 100.5));
    let page = PageInput::new(200.0, 200.0, vec![]).with_instructions(ops);

    let (lines, grid) = engine().detect_grid(&page);
    assert_eq!(lines.horizontal.len(), 2);
    assert_eq!(grid.horizontal.len(), 1);
    assert_eq!(grid.horizontal[0].position, 100.25);
    assert_eq!((grid.horizontal[0].start, grid.horizontal[0].end), (0.0, 120.0));
    assert!(grid.is_empty());
}

// ---------------------------------------------------------------------------
// Document level
// ---------------------------------------------------------------------------
#[test]
fn analyze_document_processes_every_page() {
    let source = MockPageSource {
        pages: vec![ruled_page(), PageInput::new(595.0, 842.0, vec![])],
    };
    let pages = analyze_document(&[], &source, &engine()).unwrap();

    assert_eq!(pages.len(), 2);
    assert!(pages[0].table_structure.is_some());
    assert!(pages[1].table_structure.is_none());
}

#[test]
fn analyze_document_propagates_source_errors() {
    let err = analyze_document(&[], &FailingSource, &engine()).unwrap_err();
    assert!(matches!(err, TitleBlockError::InvalidInput(_)));
}

#[test]
fn json_page_round_trip_through_source() {
    let bytes = serde_json::to_vec(&vec![ruled_page()]).unwrap();
    let pages = analyze_document(&bytes, &JsonPageSource::new(), &engine()).unwrap();
    let table = pages[0].table_structure.as_ref().unwrap();
    assert_eq!(table.extracted_fields[&FieldType::Scale].value, "1:100");
}

#[test]
fn analysis_is_repeatable() {
    let engine = engine();
    let page = ruled_page();
    assert_eq!(engine.analyze_page(&page), engine.analyze_page(&page));
}

#[test]
fn engines_with_different_keywords_coexist() {
    let mut narrow = load_preset("standard").unwrap();
    narrow.keywords = vec!["nothing like this".into()];
    let narrow = TitleBlockEngine::new(narrow);
    let standard = engine();

    let page = ruled_page();
    assert!(narrow.analyze_page(&page).table_structure.is_none());
    assert!(standard.analyze_page(&page).table_structure.is_some());
}
