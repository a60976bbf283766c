use crate::config::schema::EngineConfig;
use crate::fields::patterns::looks_like_date;
use crate::layout::{Assignment, PopulatedCell};
use crate::locate::PageStats;
use crate::model::{CellRole, TextFragment};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+([.,]\d+)*$").expect("valid regex"));
static DRAWING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,2}-?\d+$").expect("valid regex"));
static UNIT_OR_RATIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+(\.\d+)?\s*(mm|m)|\d+\s*:\s*\d+)$").expect("valid regex")
});

/// Below this winning share the cell is reported as mixed.
const MIN_ROLE_CONFIDENCE: f64 = 0.4;
const MIXED_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleScores {
    pub header: f64,
    pub label: f64,
    pub value: f64,
}

impl RoleScores {
    pub fn total(&self) -> f64 {
        self.header + self.label + self.value
    }

    /// Highest scoring role; ties go to header, then label.
    fn winner(&self) -> (CellRole, f64) {
        let mut best = (CellRole::Header, self.header);
        if self.label > best.1 {
            best = (CellRole::Label, self.label);
        }
        if self.value > best.1 {
            best = (CellRole::Value, self.value);
        }
        best
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleAssessment {
    pub role: CellRole,
    pub confidence: f64,
    pub scores: RoleScores,
}

impl RoleAssessment {
    fn from_scores(scores: RoleScores) -> Self {
        let total = scores.total();
        let (role, score) = scores.winner();
        let confidence = if total > 0.0 { score / total } else { 0.0 };
        if confidence < MIN_ROLE_CONFIDENCE {
            RoleAssessment {
                role: CellRole::Mixed,
                confidence: MIXED_CONFIDENCE,
                scores,
            }
        } else {
            RoleAssessment {
                role,
                confidence,
                scores,
            }
        }
    }
}

/// Role classifier parameterized by the words that mark a label and the
/// font size ratios that mark a header.
pub struct RoleClassifier<'a> {
    stats: &'a PageStats,
    label_words: Vec<String>,
    large_font_ratio: f64,
    medium_font_ratio: f64,
}

impl<'a> RoleClassifier<'a> {
    pub fn new(stats: &'a PageStats, config: &EngineConfig) -> Self {
        RoleClassifier {
            stats,
            label_words: config.label_words.iter().map(|w| w.to_lowercase()).collect(),
            large_font_ratio: config.weights.large_font_ratio,
            medium_font_ratio: config.weights.medium_font_ratio,
        }
    }

    fn has_label_word(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.label_words.iter().any(|w| lower.contains(w.as_str()))
    }

    fn score_fragment(&self, fragment: &TextFragment, scores: &mut RoleScores) {
        let text = fragment.trimmed();
        if text.is_empty() {
            return;
        }

        let ratio = self.stats.font_ratio(fragment);
        if ratio > self.large_font_ratio {
            scores.header += 2.0;
        } else if ratio > self.medium_font_ratio {
            scores.header += 1.0;
        }

        let caps = is_all_caps(text);
        if fragment.is_bold() {
            scores.header += 1.0;
            if !caps {
                scores.label += 0.5;
            }
        }

        if caps {
            if text.chars().count() > 3 {
                scores.header += 1.0;
            } else {
                scores.value += 0.5;
            }
        }

        let ends_with_colon = text.ends_with(':');
        if ends_with_colon {
            scores.label += 3.0;
        }
        let labelled = self.has_label_word(text);
        if labelled {
            scores.label += 2.0;
        }

        if is_value_shaped(text) {
            scores.value += 2.0;
        }
        if !text.contains(char::is_whitespace) && !labelled && !ends_with_colon {
            scores.value += 0.5;
        }
    }

    pub fn classify(
        &self,
        assignment: &Assignment,
        cell: &PopulatedCell,
        small_area: f64,
    ) -> RoleAssessment {
        let mut scores = RoleScores::default();
        for fragment in assignment.cell_fragments(cell) {
            self.score_fragment(fragment, &mut scores);
        }

        if scores.total() > 0.0 {
            if cell.spatial.area > 0.0 && cell.spatial.area < small_area {
                scores.value += 0.5;
            }
            if cell.spatial.aspect_ratio > 4.0 && cell.fragments.len() == 1 {
                scores.header += 0.5;
            }
            if cell.is_top_row {
                scores.header += 0.5;
            }
        }

        RoleAssessment::from_scores(scores)
    }
}

/// Classify every populated cell and record the role on its fragments.
///
/// Cells smaller than half the median populated cell area count as small.
pub fn classify_cells(
    assignment: &mut Assignment,
    stats: &PageStats,
    config: &EngineConfig,
) -> BTreeMap<String, RoleAssessment> {
    let classifier = RoleClassifier::new(stats, config);
    let small_area = median_area(&assignment.cells) / 2.0;

    let roles: BTreeMap<String, RoleAssessment> = assignment
        .cells
        .iter()
        .map(|cell| (cell.id.clone(), classifier.classify(assignment, cell, small_area)))
        .collect();

    for cell in &assignment.cells {
        let Some(assessment) = roles.get(&cell.id) else {
            continue;
        };
        for &i in &cell.fragments {
            let fragment = &mut assignment.fragments[i];
            fragment.cell_role = Some(assessment.role);
            fragment.cell_role_confidence = Some(assessment.confidence);
        }
    }

    debug!(
        cells = roles.len(),
        labels = roles.values().filter(|r| r.role == CellRole::Label).count(),
        values = roles.values().filter(|r| r.role == CellRole::Value).count(),
        mixed = roles.values().filter(|r| r.role == CellRole::Mixed).count(),
        "classified cell roles"
    );

    roles
}

fn median_area(cells: &[PopulatedCell]) -> f64 {
    let mut areas: Vec<f64> = cells
        .iter()
        .map(|c| c.spatial.area)
        .filter(|a| *a > 0.0)
        .collect();
    if areas.is_empty() {
        return 0.0;
    }
    areas.sort_by(|a, b| a.total_cmp(b));
    areas[areas.len() / 2]
}

/// Letters present and none of them lowercase.
fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

fn is_value_shaped(text: &str) -> bool {
    NUMERIC.is_match(text)
        || looks_like_date(text)
        || DRAWING_NUMBER.is_match(text)
        || UNIT_OR_RATIO.is_match(text)
}
