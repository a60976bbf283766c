//! Candidate generation: the role-based pass and the direct label pass.

use crate::classify::RoleAssessment;
use crate::fields::confidence::PairingMethod;
use crate::fields::labels::{LabelMatch, LabelMatcher};
use crate::fields::patterns::FieldGrammar;
use crate::grid::adjacency::{AdjacencyStrategy, Direction};
use crate::layout::{Assignment, AssignmentMode, PopulatedCell};
use crate::model::{CellRole, FieldType, TextFragment};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Stacked values must start within this many label line heights.
const STACK_LINE_HEIGHTS: f64 = 3.0;

/// Value text taken from one fragment. `index` points into
/// `Assignment::fragments`; `text` may be a slice of that fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFragment {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueSource {
    SingleFragment(ValueFragment),
    MultiFragment(Vec<ValueFragment>),
    None,
}

impl ValueSource {
    pub fn text(&self) -> String {
        match self {
            ValueSource::SingleFragment(v) => v.text.clone(),
            ValueSource::MultiFragment(items) => items
                .iter()
                .map(|v| v.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            ValueSource::None => String::new(),
        }
    }

    /// Fragment whose typography stands for the whole value.
    pub fn lead_index(&self) -> Option<usize> {
        match self {
            ValueSource::SingleFragment(v) => Some(v.index),
            ValueSource::MultiFragment(items) => items.first().map(|v| v.index),
            ValueSource::None => None,
        }
    }
}

/// A possible label/value pairing for one field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub field: FieldType,
    pub label_text: String,
    pub label_cell_id: String,
    pub label_fragment: Option<usize>,
    pub value_cell_id: Option<String>,
    pub value: ValueSource,
    /// 0 for the label's own cell, 1 for a neighboring cell, -1 when no value.
    pub distance: i32,
    /// Strength of the pairing within the pass that produced it.
    pub score: f64,
    pub method: Option<PairingMethod>,
    /// False when the value was taken without satisfying the field grammar.
    pub valid_match: bool,
}

pub struct CandidateContext<'a> {
    pub assignment: &'a Assignment,
    pub roles: &'a BTreeMap<String, RoleAssessment>,
    pub labels: &'a LabelMatcher,
}

impl<'a> CandidateContext<'a> {
    fn role(&self, cell_id: &str) -> Option<CellRole> {
        self.roles.get(cell_id).map(|r| r.role)
    }

    fn is_value_text(&self, text: &str) -> bool {
        !text.is_empty() && !self.labels.is_label(text)
    }

    /// Pick a value for `field` among the non-label fragments of `cell`.
    ///
    /// Free-text fields take every such fragment; other fields take the
    /// first fragment satisfying the grammar (primary matches first). With
    /// `require_match` unset, the first fragment is used when none matches.
    fn value_in_cell(
        &self,
        cell: &PopulatedCell,
        field: FieldType,
        exclude: Option<usize>,
        require_match: bool,
    ) -> Option<ValueSource> {
        let grammar = FieldGrammar::for_field(field);
        let items: Vec<ValueFragment> = cell
            .fragments
            .iter()
            .filter(|&&i| Some(i) != exclude)
            .map(|&i| ValueFragment {
                index: i,
                text: self.assignment.fragments[i].trimmed().to_string(),
            })
            .filter(|v| self.is_value_text(&v.text))
            .collect();
        if items.is_empty() {
            return None;
        }

        if field.is_free_text() {
            let value = ValueSource::MultiFragment(items);
            let matched = grammar.classify(&value.text()).is_match();
            return (matched || !require_match).then_some(value);
        }

        let kinds: Vec<_> = items.iter().map(|v| grammar.classify(&v.text)).collect();
        let pick = kinds
            .iter()
            .position(|k| k.is_strong())
            .or_else(|| kinds.iter().position(|k| k.is_match()))
            .or(if require_match { None } else { Some(0) })?;
        Some(ValueSource::SingleFragment(items[pick].clone()))
    }
}

/// Role-based pass. Returns the ids of cells that yielded a candidate.
pub fn role_based_candidates(
    ctx: &CandidateContext,
    out: &mut Vec<FieldCandidate>,
) -> HashSet<String> {
    let mut yielded = HashSet::new();

    for cell in &ctx.assignment.cells {
        let before = out.len();
        match ctx.role(&cell.id) {
            Some(CellRole::Label) => label_cell_candidate(ctx, cell, out),
            Some(CellRole::Mixed) => in_cell_candidates(ctx, cell, out),
            _ => {}
        }
        if out.len() > before {
            yielded.insert(cell.id.clone());
        }
    }

    yielded
}

fn label_cell_candidate(ctx: &CandidateContext, cell: &PopulatedCell, out: &mut Vec<FieldCandidate>) {
    let label_text = ctx.assignment.cell_text(cell);
    let Some(field) = ctx.labels.exact(&label_text) else {
        return;
    };

    for direction in AdjacencyStrategy::RoleAdjacency.order() {
        let Some(neighbor_id) = ctx.assignment.adjacency.neighbor(&cell.id, direction) else {
            continue;
        };
        let Some(neighbor) = ctx.assignment.cell(neighbor_id) else {
            continue;
        };
        let neighbor_role = ctx.role(neighbor_id);
        if matches!(neighbor_role, Some(CellRole::Label | CellRole::Header)) {
            continue;
        }
        let Some(value) = ctx.value_in_cell(neighbor, field, None, false) else {
            continue;
        };

        let mut score = match direction {
            Direction::Right | Direction::Bottom => 0.9,
            Direction::Left | Direction::Top => 0.7,
        };
        if neighbor_role == Some(CellRole::Value) {
            score += 0.1;
        }

        out.push(FieldCandidate {
            field,
            label_text,
            label_cell_id: cell.id.clone(),
            label_fragment: cell.fragments.first().copied(),
            value_cell_id: Some(neighbor.id.clone()),
            value,
            distance: 1,
            score,
            method: Some(PairingMethod::RoleAdjacency),
            valid_match: true,
        });
        return;
    }
}

/// Field/value micro-patterns inside one mixed cell.
fn in_cell_candidates(ctx: &CandidateContext, cell: &PopulatedCell, out: &mut Vec<FieldCandidate>) {
    let fragments = &ctx.assignment.fragments;
    let mut push = |label: &str, m: LabelMatch, index: usize, value: ValueFragment, score: f64, method| {
        out.push(FieldCandidate {
            field: m.field(),
            label_text: label.trim().to_string(),
            label_cell_id: cell.id.clone(),
            label_fragment: Some(index),
            value_cell_id: Some(cell.id.clone()),
            value: ValueSource::SingleFragment(value),
            distance: 0,
            score,
            method: Some(method),
            valid_match: true,
        });
    };

    for (pos, &index) in cell.fragments.iter().enumerate() {
        let fragment = &fragments[index];
        let text = fragment.trimmed();

        // "Label:" then the next fragment
        if text.len() > 1 && text.ends_with(':') {
            if let Some(m) = ctx.labels.find(text) {
                let next = cell.fragments[pos + 1..]
                    .iter()
                    .map(|&i| (i, fragments[i].trimmed()))
                    .find(|(_, t)| !t.is_empty());
                if let Some((i, t)) = next.filter(|(_, t)| ctx.is_value_text(t)) {
                    let score = if m.is_exact() { 0.95 } else { 0.85 };
                    let value = ValueFragment { index: i, text: t.to_string() };
                    push(text, m, index, value, score, PairingMethod::TrailingColon);
                }
            }
        }

        // "Label: Value" in one fragment
        if let Some((label, rest)) = text.split_once(':') {
            let rest = rest.trim();
            if !rest.is_empty() {
                if let Some(m) = ctx.labels.find(label) {
                    let score = if m.is_exact() { 0.90 } else { 0.80 };
                    let value = ValueFragment { index, text: rest.to_string() };
                    push(label, m, index, value, score, PairingMethod::InlineColon);
                }
                continue;
            }
        }

        // "Label - Value" in one fragment
        if let Some((label, rest)) = split_dash(text) {
            if let Some(m) = ctx.labels.find(label) {
                let value = ValueFragment { index, text: rest.to_string() };
                push(label, m, index, value, 0.75, PairingMethod::DashSeparator);
            }
            continue;
        }

        let Some(m) = ctx.labels.find(text) else {
            continue;
        };
        let others = move || {
            cell.fragments
                .iter()
                .copied()
                .filter(move |&i| i != index)
                .filter(move |&i| ctx.is_value_text(fragments[i].trimmed()))
        };

        if let Some(below) = stacked_below(fragment, others().map(|i| (i, &fragments[i]))) {
            let value_fragment = &fragments[below];
            let value = ValueFragment {
                index: below,
                text: value_fragment.trimmed().to_string(),
            };
            let score = if m.is_exact() { 0.85 } else { 0.7 };
            push(text, m, index, value.clone(), score, PairingMethod::VerticalStack);

            let emphasized = (fragment.is_bold() && !value_fragment.is_bold())
                || fragment.font_size > value_fragment.font_size;
            if emphasized {
                push(text, m, index, value, 0.75, PairingMethod::FontStack);
            }
        }

        if let Some(right) = same_line_right(fragment, others().map(|i| (i, &fragments[i]))) {
            let value = ValueFragment {
                index: right,
                text: fragments[right].trimmed().to_string(),
            };
            push(text, m, index, value, 0.8, PairingMethod::HorizontalPair);
        }
    }
}

fn split_dash(text: &str) -> Option<(&str, &str)> {
    [" - ", " \u{2013} ", " \u{2014} "]
        .iter()
        .find_map(|sep| text.split_once(sep))
        .map(|(l, r)| (l.trim(), r.trim()))
        .filter(|(l, r)| !l.is_empty() && !r.is_empty())
}

/// Nearest fragment starting below the label within the stacking distance.
fn stacked_below<'f>(
    label: &TextFragment,
    others: impl Iterator<Item = (usize, &'f TextFragment)>,
) -> Option<usize> {
    let reach = STACK_LINE_HEIGHTS * label.line_height();
    others
        .filter(|(_, f)| f.y < label.y && label.y - f.y <= reach)
        .min_by(|a, b| (label.y - a.1.y).total_cmp(&(label.y - b.1.y)))
        .map(|(i, _)| i)
}

/// Nearest fragment to the right on the label's text line.
fn same_line_right<'f>(
    label: &TextFragment,
    others: impl Iterator<Item = (usize, &'f TextFragment)>,
) -> Option<usize> {
    let slack = label.line_height() / 2.0;
    others
        .filter(|(_, f)| (f.y - label.y).abs() <= slack && f.x > label.x)
        .min_by(|a, b| a.1.x.total_cmp(&b.1.x))
        .map(|(i, _)| i)
}

/// Direct label pass over every fragment that is exactly a label, skipping
/// cells that already produced a candidate in the role-based pass.
pub fn direct_label_candidates(
    ctx: &CandidateContext,
    skip_cells: &HashSet<String>,
    out: &mut Vec<FieldCandidate>,
) {
    let strategy = match ctx.assignment.mode {
        AssignmentMode::Synthetic => AdjacencyStrategy::GridAdjacency,
        AssignmentMode::Reconstructed => AdjacencyStrategy::RoleAdjacency,
    };

    for (index, fragment) in ctx.assignment.fragments.iter().enumerate() {
        let Some(cell_id) = fragment.cell_id.as_deref() else {
            continue;
        };
        if skip_cells.contains(cell_id) {
            continue;
        }
        let Some(field) = ctx.labels.exact(&fragment.text) else {
            continue;
        };
        let Some(cell) = ctx.assignment.cell(cell_id) else {
            continue;
        };

        let candidate = |value_cell_id: Option<String>, value, distance, score, method, valid_match| {
            FieldCandidate {
                field,
                label_text: fragment.trimmed().to_string(),
                label_cell_id: cell.id.clone(),
                label_fragment: Some(index),
                value_cell_id,
                value,
                distance,
                score,
                method,
                valid_match,
            }
        };

        if let Some(value) = ctx.value_in_cell(cell, field, Some(index), true) {
            out.push(candidate(
                Some(cell.id.clone()),
                value,
                0,
                0.85,
                Some(PairingMethod::SameCell),
                true,
            ));
            continue;
        }

        let mut unvalidated: Option<(String, ValueSource)> = None;
        let mut found = false;
        for direction in strategy.order() {
            let Some(neighbor) = ctx
                .assignment
                .adjacency
                .neighbor(&cell.id, direction)
                .and_then(|id| ctx.assignment.cell(id))
            else {
                continue;
            };
            if let Some(value) = ctx.value_in_cell(neighbor, field, None, true) {
                out.push(candidate(
                    Some(neighbor.id.clone()),
                    value,
                    1,
                    0.75,
                    Some(PairingMethod::CellAdjacency),
                    true,
                ));
                found = true;
                break;
            }
            if unvalidated.is_none() {
                unvalidated = ctx
                    .value_in_cell(neighbor, field, None, false)
                    .map(|v| (neighbor.id.clone(), v));
            }
        }
        if found {
            continue;
        }

        match unvalidated {
            Some((neighbor_id, value)) => out.push(candidate(
                Some(neighbor_id),
                value,
                1,
                0.5,
                Some(PairingMethod::CellAdjacency),
                false,
            )),
            None => out.push(candidate(None, ValueSource::None, -1, 0.0, None, false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_cells;
    use crate::config::builtin;
    use crate::config::schema::Tolerances;
    use crate::locate::PageStats;

    struct Fixture {
        assignment: Assignment,
        roles: BTreeMap<String, RoleAssessment>,
        labels: LabelMatcher,
    }

    impl Fixture {
        fn new(fragments: Vec<(&str, &str, f64, f64)>) -> Self {
            Self::from_fragments(
                fragments
                    .into_iter()
                    .map(|(cell, text, x, y)| {
                        let mut f = TextFragment::new(text, x, y, 8.0);
                        f.cell_id = Some(cell.to_string());
                        f
                    })
                    .collect(),
            )
        }

        fn from_fragments(fragments: Vec<TextFragment>) -> Self {
            let config = builtin::standard();
            let mut assignment = Assignment::from_annotated(fragments, &Tolerances::default());
            let stats = PageStats::from_fragments(&assignment.fragments);
            let roles = classify_cells(&mut assignment, &stats, &config);
            Fixture {
                assignment,
                roles,
                labels: LabelMatcher::new(&config.label_synonyms),
            }
        }

        fn ctx(&self) -> CandidateContext<'_> {
            CandidateContext {
                assignment: &self.assignment,
                roles: &self.roles,
                labels: &self.labels,
            }
        }

        fn in_cell(&self, cell_id: &str) -> Vec<FieldCandidate> {
            let cell = self.assignment.cell(cell_id).unwrap();
            let mut out = Vec::new();
            in_cell_candidates(&self.ctx(), cell, &mut out);
            out
        }

        fn all(&self) -> Vec<FieldCandidate> {
            let ctx = self.ctx();
            let mut out = Vec::new();
            let yielded = role_based_candidates(&ctx, &mut out);
            direct_label_candidates(&ctx, &yielded, &mut out);
            out
        }
    }

    #[test]
    fn test_label_cell_pairs_with_right_neighbor() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Title", 10.0, 110.0),
            ("row_2_col_1", "Scale", 10.0, 90.0),
            ("row_2_col_2", "1:100", 60.0, 90.0),
        ]);
        assert_eq!(fx.roles["row_2_col_1"].role, CellRole::Label);
        let candidates = fx.all();
        let scale = candidates.iter().find(|c| c.field == FieldType::Scale).unwrap();
        assert_eq!(scale.method, Some(PairingMethod::RoleAdjacency));
        assert_eq!(scale.value.text(), "1:100");
        assert_eq!(scale.distance, 1);
        assert!((scale.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_cell_value_found_by_direct_pass() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Drawing No:", 10.0, 90.0),
            ("row_1_col_1", "A-101", 60.0, 90.0),
        ]);
        let candidates = fx.all();
        let drawing = candidates
            .iter()
            .find(|c| c.field == FieldType::Drawing && c.distance == 0)
            .unwrap();
        assert_eq!(drawing.value.text(), "A-101");
        assert_eq!(drawing.value_cell_id.as_deref(), Some("row_1_col_1"));
    }

    #[test]
    fn test_inline_and_dash_patterns() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Scale: 1:50", 10.0, 90.0),
            ("row_1_col_1", "Rev - C", 10.0, 80.0),
            ("row_1_col_1", "Some note", 10.0, 70.0),
            ("row_1_col_1", "and more", 10.0, 60.0),
        ]);
        let ctx = fx.ctx();
        let cell = fx.assignment.cell("row_1_col_1").unwrap();
        let mut out = Vec::new();
        in_cell_candidates(&ctx, cell, &mut out);

        let inline = out.iter().find(|c| c.method == Some(PairingMethod::InlineColon)).unwrap();
        assert_eq!(inline.field, FieldType::Scale);
        assert_eq!(inline.value.text(), "1:50");
        assert!((inline.score - 0.90).abs() < 1e-9);

        let dash = out.iter().find(|c| c.method == Some(PairingMethod::DashSeparator)).unwrap();
        assert_eq!(dash.field, FieldType::Revision);
        assert_eq!(dash.value.text(), "C");
    }

    #[test]
    fn test_stacked_label_and_value() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Date", 10.0, 90.0),
            ("row_1_col_1", "12/03/2024", 10.0, 78.0),
        ]);
        let ctx = fx.ctx();
        let cell = fx.assignment.cell("row_1_col_1").unwrap();
        let mut out = Vec::new();
        in_cell_candidates(&ctx, cell, &mut out);
        let stacked = out.iter().find(|c| c.method == Some(PairingMethod::VerticalStack)).unwrap();
        assert_eq!(stacked.field, FieldType::Date);
        assert_eq!(stacked.value.text(), "12/03/2024");
        assert!((stacked.score - 0.85).abs() < 1e-9);
        assert!(out.iter().all(|c| c.method != Some(PairingMethod::FontStack)));
    }

    #[test]
    fn test_trailing_colon_takes_next_fragment() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Scale:", 10.0, 90.0),
            ("row_1_col_1", "1:50", 60.0, 90.0),
        ]);
        let out = fx.in_cell("row_1_col_1");
        let colon = out.iter().find(|c| c.method == Some(PairingMethod::TrailingColon)).unwrap();
        assert_eq!(colon.field, FieldType::Scale);
        assert_eq!(colon.value.text(), "1:50");
        assert_eq!(colon.label_text, "Scale:");
        assert_eq!(colon.distance, 0);
        assert!((colon.score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_partial_label_with_trailing_colon_scores_lower() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Current Rev:", 10.0, 90.0),
            ("row_1_col_1", "C", 80.0, 90.0),
        ]);
        let out = fx.in_cell("row_1_col_1");
        let colon = out.iter().find(|c| c.method == Some(PairingMethod::TrailingColon)).unwrap();
        assert_eq!(colon.field, FieldType::Revision);
        assert_eq!(colon.value.text(), "C");
        assert!((colon.score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_pair_on_same_line() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Date", 10.0, 90.0),
            ("row_1_col_1", "12/03/2024", 60.0, 90.5),
        ]);
        let out = fx.in_cell("row_1_col_1");
        let pair = out.iter().find(|c| c.method == Some(PairingMethod::HorizontalPair)).unwrap();
        assert_eq!(pair.field, FieldType::Date);
        assert_eq!(pair.value.text(), "12/03/2024");
        assert!((pair.score - 0.8).abs() < 1e-9);
        assert!(out.iter().all(|c| c.method != Some(PairingMethod::VerticalStack)));
    }

    #[test]
    fn test_font_stack_needs_emphasized_label() {
        let mut label = TextFragment::new("Revision", 10.0, 90.0, 10.0).with_font("Helvetica-Bold");
        label.cell_id = Some("row_1_col_1".into());
        let mut value = TextFragment::new("C", 10.0, 78.0, 8.0);
        value.cell_id = Some("row_1_col_1".into());
        let fx = Fixture::from_fragments(vec![label, value]);

        let out = fx.in_cell("row_1_col_1");
        let stack = out.iter().find(|c| c.method == Some(PairingMethod::FontStack)).unwrap();
        assert_eq!(stack.field, FieldType::Revision);
        assert_eq!(stack.value.text(), "C");
        assert!((stack.score - 0.75).abs() < 1e-9);
        assert!(out.iter().any(|c| c.method == Some(PairingMethod::VerticalStack)));
    }

    #[test]
    fn test_label_without_value_is_emitted_empty() {
        let fx = Fixture::new(vec![("row_1_col_1", "Revision", 10.0, 90.0)]);
        let candidates = fx.all();
        let rev = candidates.iter().find(|c| c.field == FieldType::Revision).unwrap();
        assert_eq!(rev.value, ValueSource::None);
        assert_eq!(rev.distance, -1);
    }

    #[test]
    fn test_grid_adjacency_looks_below_first() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Drawing No", 10.0, 90.0),
            ("row_1_col_2", "see notes", 60.0, 90.0),
            ("row_2_col_1", "A-101", 10.0, 70.0),
        ]);
        let ctx = fx.ctx();
        let mut out = Vec::new();
        direct_label_candidates(&ctx, &HashSet::new(), &mut out);
        let drawing = out.iter().find(|c| c.field == FieldType::Drawing).unwrap();
        assert_eq!(drawing.value.text(), "A-101");
        assert_eq!(drawing.value_cell_id.as_deref(), Some("row_2_col_1"));
    }

    #[test]
    fn test_unvalidated_neighbor_used_as_last_resort() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Scale", 10.0, 90.0),
            ("row_2_col_1", "varies", 10.0, 70.0),
        ]);
        let ctx = fx.ctx();
        let mut out = Vec::new();
        direct_label_candidates(&ctx, &HashSet::new(), &mut out);
        let scale = out.iter().find(|c| c.field == FieldType::Scale).unwrap();
        assert_eq!(scale.value.text(), "varies");
        assert!(!scale.valid_match);
    }

    #[test]
    fn test_free_text_takes_whole_cell() {
        let fx = Fixture::new(vec![
            ("row_1_col_1", "Title", 10.0, 90.0),
            ("row_1_col_2", "Ground floor", 60.0, 90.0),
            ("row_1_col_2", "general arrangement", 60.0, 80.0),
        ]);
        let ctx = fx.ctx();
        let mut out = Vec::new();
        direct_label_candidates(&ctx, &HashSet::new(), &mut out);
        let title = out.iter().find(|c| c.field == FieldType::Title).unwrap();
        assert!(matches!(title.value, ValueSource::MultiFragment(ref v) if v.len() == 2));
        assert_eq!(title.value.text(), "Ground floor general arrangement");
    }

    #[test]
    fn test_split_dash() {
        assert_eq!(split_dash("Rev - C"), Some(("Rev", "C")));
        assert_eq!(split_dash("A-101"), None);
    }
}
