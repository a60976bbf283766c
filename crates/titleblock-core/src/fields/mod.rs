//! Field/value extraction: pair recognized labels with values, validate the
//! values and keep the most confident pairing per field type.

pub mod candidates;
pub mod confidence;
pub mod labels;
pub mod patterns;

use crate::classify::RoleAssessment;
use crate::layout::Assignment;
use crate::locate::PageStats;
use crate::model::FieldType;
use candidates::{
    direct_label_candidates, role_based_candidates, CandidateContext, FieldCandidate, ValueSource,
};
use confidence::PairingMethod;
use labels::LabelMatcher;
use patterns::{FieldGrammar, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub match_kind: MatchKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub valid_match: bool,
    /// Text that was paired with the label but rejected by the grammar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
}

/// Final record for one field type on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedField {
    pub label: String,
    pub value: String,
    pub label_cell_id: String,
    pub value_cell_id: Option<String>,
    /// 0 same cell, 1 adjacent cell, -1 no value.
    pub distance: i32,
    pub confidence: f64,
    pub validation_details: ValidationDetails,
    pub in_same_cell: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PairingMethod>,
}

struct Scored {
    candidate: FieldCandidate,
    kind: MatchKind,
    confidence: f64,
}

impl Scored {
    fn beats(&self, other: &Scored) -> bool {
        self.confidence > other.confidence
            || (self.confidence == other.confidence && self.candidate.score > other.candidate.score)
    }
}

/// Run both candidate passes over an assignment and select one field per
/// field type. Label fragments whose value sits in their own cell are
/// annotated with that value.
pub fn extract_fields(
    assignment: &mut Assignment,
    roles: &BTreeMap<String, RoleAssessment>,
    labels: &LabelMatcher,
    stats: &PageStats,
) -> BTreeMap<FieldType, ExtractedField> {
    let mut candidates = Vec::new();
    {
        let ctx = CandidateContext {
            assignment,
            roles,
            labels,
        };
        let yielded = role_based_candidates(&ctx, &mut candidates);
        direct_label_candidates(&ctx, &yielded, &mut candidates);
    }

    let mut best: BTreeMap<FieldType, Scored> = BTreeMap::new();
    for candidate in candidates {
        let scored = score_candidate(candidate, assignment, stats);
        trace!(
            field = %scored.candidate.field,
            value = %scored.candidate.value.text(),
            method = ?scored.candidate.method,
            confidence = scored.confidence,
            "field candidate"
        );
        match best.get(&scored.candidate.field) {
            Some(current) if !scored.beats(current) => {}
            _ => {
                best.insert(scored.candidate.field, scored);
            }
        }
    }

    let mut fields = BTreeMap::new();
    for (field, scored) in best {
        let label_fragment = scored.candidate.label_fragment;
        let extracted = finalize(scored);
        if extracted.in_same_cell {
            if let Some(fragment) = label_fragment.and_then(|i| assignment.fragments.get_mut(i)) {
                fragment.in_cell_field_value = Some(extracted.value.clone());
            }
        }
        fields.insert(field, extracted);
    }

    debug!(
        fields = fields.len(),
        resolved = fields.values().filter(|f| f.confidence > 0.0).count(),
        "extracted fields"
    );

    fields
}

fn score_candidate(candidate: FieldCandidate, assignment: &Assignment, stats: &PageStats) -> Scored {
    if candidate.value == ValueSource::None {
        return Scored {
            candidate,
            kind: MatchKind::None,
            confidence: 0.0,
        };
    }

    let kind = FieldGrammar::for_field(candidate.field).classify(&candidate.value.text());
    let value_fragment = candidate
        .value
        .lead_index()
        .and_then(|i| assignment.fragments.get(i));
    let method = candidate.method.unwrap_or(PairingMethod::CellAdjacency);
    let confidence = confidence::score(kind, value_fragment, stats, candidate.distance, method);

    Scored {
        candidate,
        kind,
        confidence,
    }
}

/// Turn the winning candidate into the emitted record. A value that scored
/// zero is blanked so that an empty value and zero confidence go together.
fn finalize(scored: Scored) -> ExtractedField {
    let Scored {
        candidate,
        kind,
        confidence,
    } = scored;
    let text = candidate.value.text();
    let grammar = FieldGrammar::for_field(candidate.field);

    if confidence > 0.0 {
        ExtractedField {
            label: candidate.label_text,
            value: text.clone(),
            label_cell_id: candidate.label_cell_id,
            value_cell_id: candidate.value_cell_id,
            distance: candidate.distance,
            confidence,
            validation_details: ValidationDetails {
                match_kind: kind,
                pattern: grammar.describe(&text, kind),
                valid_match: candidate.valid_match && kind.is_match(),
                raw_value: None,
            },
            in_same_cell: candidate.distance == 0,
            method: candidate.method,
        }
    } else {
        ExtractedField {
            label: candidate.label_text,
            value: String::new(),
            label_cell_id: candidate.label_cell_id,
            value_cell_id: None,
            distance: -1,
            confidence: 0.0,
            validation_details: ValidationDetails {
                match_kind: MatchKind::None,
                pattern: None,
                valid_match: false,
                raw_value: (!text.is_empty()).then_some(text),
            },
            in_same_cell: false,
            method: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_cells;
    use crate::config::builtin;
    use crate::config::schema::Tolerances;
    use crate::model::{CellRole, TextFragment};

    fn in_cell(cell: &str, text: &str, x: f64, y: f64) -> TextFragment {
        let mut f = TextFragment::new(text, x, y, 8.0);
        f.cell_id = Some(cell.to_string());
        f
    }

    fn run(fragments: Vec<(&str, &str, f64, f64)>) -> (Assignment, BTreeMap<FieldType, ExtractedField>) {
        let fragments = fragments
            .into_iter()
            .map(|(cell, text, x, y)| in_cell(cell, text, x, y))
            .collect();
        let (assignment, _, fields) = run_fragments(fragments);
        (assignment, fields)
    }

    fn run_fragments(
        fragments: Vec<TextFragment>,
    ) -> (
        Assignment,
        BTreeMap<String, RoleAssessment>,
        BTreeMap<FieldType, ExtractedField>,
    ) {
        let config = builtin::standard();
        let mut assignment = Assignment::from_annotated(fragments, &Tolerances::default());
        let stats = PageStats::from_fragments(&assignment.fragments);
        let roles = classify_cells(&mut assignment, &stats, &config);
        let labels = LabelMatcher::new(&config.label_synonyms);
        let fields = extract_fields(&mut assignment, &roles, &labels, &stats);
        (assignment, roles, fields)
    }

    #[test]
    fn test_same_cell_drawing_number() {
        let (assignment, fields) = run(vec![
            ("row_1_col_1", "Drawing No:", 10.0, 90.0),
            ("row_1_col_1", "A-101", 60.0, 90.0),
        ]);
        let drawing = &fields[&FieldType::Drawing];
        assert_eq!(drawing.value, "A-101");
        assert_eq!(drawing.distance, 0);
        assert!(drawing.in_same_cell);
        assert!(drawing.confidence >= 0.85);
        assert_eq!(drawing.validation_details.match_kind, MatchKind::Primary);
        assert_eq!(assignment.fragments[0].in_cell_field_value.as_deref(), Some("A-101"));
    }

    #[test]
    fn test_adjacent_scale() {
        let (_, fields) = run(vec![
            ("row_1_col_1", "Title", 10.0, 110.0),
            ("row_2_col_1", "Scale", 10.0, 90.0),
            ("row_2_col_2", "1:100", 60.0, 90.0),
        ]);
        let scale = &fields[&FieldType::Scale];
        assert_eq!(scale.value, "1:100");
        assert_eq!(scale.distance, 1);
        assert!(scale.confidence >= 0.7);
        assert!(scale.confidence <= 0.99);
        assert_eq!(scale.value_cell_id.as_deref(), Some("row_2_col_2"));
    }

    #[test]
    fn test_nts_is_valid_scale() {
        let (_, fields) = run(vec![
            ("row_1_col_1", "Scale", 10.0, 90.0),
            ("row_2_col_1", "NTS", 10.0, 70.0),
        ]);
        let scale = &fields[&FieldType::Scale];
        assert_eq!(scale.value, "NTS");
        assert_eq!(scale.validation_details.match_kind, MatchKind::ValidValue);
        assert!(scale.confidence > 0.0);
    }

    #[test]
    fn test_label_without_value() {
        let (_, fields) = run(vec![("row_1_col_1", "Revision", 10.0, 90.0)]);
        let rev = &fields[&FieldType::Revision];
        assert_eq!(rev.value, "");
        assert_eq!(rev.confidence, 0.0);
        assert_eq!(rev.distance, -1);
    }

    #[test]
    fn test_rejected_value_is_blanked() {
        let (_, fields) = run(vec![
            ("row_1_col_1", "Scale", 10.0, 90.0),
            ("row_2_col_1", "varies", 10.0, 70.0),
        ]);
        let scale = &fields[&FieldType::Scale];
        assert_eq!(scale.value, "");
        assert_eq!(scale.confidence, 0.0);
        assert_eq!(scale.validation_details.raw_value.as_deref(), Some("varies"));
        assert!(!scale.validation_details.valid_match);
    }

    #[test]
    fn test_confidence_and_value_agree() {
        let (_, fields) = run(vec![
            ("row_1_col_1", "Drawing No", 10.0, 110.0),
            ("row_1_col_2", "XY-20", 60.0, 110.0),
            ("row_2_col_1", "Date", 10.0, 90.0),
            ("row_2_col_2", "12 Mar 2024", 60.0, 90.0),
            ("row_3_col_1", "Rev", 10.0, 70.0),
            ("row_3_col_2", "??", 60.0, 70.0),
        ]);
        assert!(!fields.is_empty());
        for field in fields.values() {
            assert!((0.0..=0.99).contains(&field.confidence));
            assert_eq!(field.confidence == 0.0, field.value.is_empty());
        }
    }

    #[test]
    fn test_selection_prefers_final_confidence_over_pass_score() {
        let mut heading = in_cell("row_1_col_1", "ISSUED FOR TENDER", 10.0, 130.0);
        heading.font_size = 12.0;
        heading.font_name = "Helvetica-Bold".into();
        let (assignment, roles, fields) = run_fragments(vec![
            heading,
            in_cell("row_1_col_1", "Scale:", 10.0, 110.0),
            in_cell("row_1_col_1", "1:50", 60.0, 110.0),
            in_cell("row_1_col_1", "12/03/2024", 10.0, 100.0),
            in_cell("row_2_col_1", "Scale", 10.0, 70.0),
            in_cell("row_2_col_2", "1:100", 60.0, 70.0),
        ]);
        assert_eq!(roles["row_1_col_1"].role, CellRole::Mixed);
        assert_eq!(roles["row_2_col_1"].role, CellRole::Label);

        // The label cell pairing scores 1.0 within its pass and the trailing
        // colon 0.95, but the colon pairing ends up more confident:
        // 0.85 * 1.0 * 1.12 against 0.85 * 0.95 * 1.15.
        let scale = &fields[&FieldType::Scale];
        assert_eq!(scale.method, Some(PairingMethod::TrailingColon));
        assert_eq!(scale.value, "1:50");
        assert_eq!(scale.distance, 0);
        assert!((scale.confidence - 0.85 * 1.12).abs() < 1e-9);
        assert_eq!(assignment.fragments[1].in_cell_field_value.as_deref(), Some("1:50"));
    }
}
