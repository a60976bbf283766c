use crate::fields::patterns::MatchKind;
use crate::locate::PageStats;
use crate::model::TextFragment;
use serde::{Deserialize, Serialize};

const PRIMARY_BASE: f64 = 0.85;
const FALLBACK_BASE: f64 = 0.65;
const DATE_PARSE_FACTOR: f64 = 0.8;
const PRIMARY_CAP: f64 = 0.99;
const FALLBACK_CAP: f64 = 0.90;

/// How a value was paired with its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMethod {
    /// Label cell to a neighboring cell, found by the role classifier pass.
    RoleAdjacency,
    /// "Label:" followed by the next fragment.
    TrailingColon,
    /// "Label: Value" inside one fragment.
    InlineColon,
    /// "Label - Value" inside one fragment.
    DashSeparator,
    /// Value within three line heights below the label.
    VerticalStack,
    /// Emphasized label above a plainer value.
    FontStack,
    /// Value to the right of the label on the same line.
    HorizontalPair,
    /// Direct label scan found the value in the label's own cell.
    SameCell,
    /// Direct label scan found the value in a neighboring cell.
    CellAdjacency,
}

impl PairingMethod {
    pub fn boost(&self) -> f64 {
        match self {
            PairingMethod::RoleAdjacency => 1.15,
            PairingMethod::TrailingColon => 1.12,
            PairingMethod::InlineColon => 1.10,
            PairingMethod::DashSeparator => 1.05,
            _ => 1.0,
        }
    }
}

/// Base confidence from the grammar match alone.
pub fn base_confidence(kind: MatchKind) -> f64 {
    match kind {
        MatchKind::Primary | MatchKind::ValidValue => PRIMARY_BASE,
        MatchKind::Fallback => FALLBACK_BASE,
        MatchKind::DateParse => DATE_PARSE_FACTOR * FALLBACK_BASE,
        MatchKind::None => 0.0,
    }
}

/// Typography of the value: larger than body text, bold or italic.
pub fn font_factor(fragment: Option<&TextFragment>, stats: &PageStats) -> f64 {
    let Some(fragment) = fragment else {
        return 1.0;
    };
    let mut factor = 1.0;
    if stats.font_ratio(fragment) > 1.2 {
        factor *= 1.2;
    }
    if fragment.is_bold() {
        factor *= 1.1;
    }
    if fragment.is_italic() {
        factor *= 0.95;
    }
    factor
}

/// Proximity of label and value: same cell 5, adjacent 3, otherwise 1.
pub fn block_score(distance: i32) -> f64 {
    match distance {
        0 => 5.0,
        1 => 3.0,
        _ => 1.0,
    }
}

pub fn block_factor(distance: i32) -> f64 {
    (0.8 + 0.05 * block_score(distance)).min(1.0)
}

/// Final confidence of a paired value, in `[0, 0.99]`.
pub fn score(
    kind: MatchKind,
    value_fragment: Option<&TextFragment>,
    stats: &PageStats,
    distance: i32,
    method: PairingMethod,
) -> f64 {
    let base = base_confidence(kind);
    if base <= 0.0 {
        return 0.0;
    }
    let raw = base * font_factor(value_fragment, stats) * block_factor(distance) * method.boost();
    let cap = if kind.is_strong() { PRIMARY_CAP } else { FALLBACK_CAP };
    raw.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> PageStats {
        PageStats {
            median_font_size: 10.0,
            body_color: String::new(),
        }
    }

    #[test]
    fn test_same_cell_primary_match() {
        let value = TextFragment::new("A-101", 0.0, 0.0, 10.0);
        let c = score(MatchKind::Primary, Some(&value), &stats(), 0, PairingMethod::SameCell);
        assert!((c - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_adjacent_role_match() {
        let value = TextFragment::new("1:100", 0.0, 0.0, 10.0);
        let c = score(MatchKind::Primary, Some(&value), &stats(), 1, PairingMethod::RoleAdjacency);
        assert!((c - 0.85 * 0.95 * 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_caps() {
        let big = TextFragment::new("A-101", 0.0, 0.0, 20.0).with_font("Arial-Bold");
        let strong = score(MatchKind::Primary, Some(&big), &stats(), 0, PairingMethod::TrailingColon);
        assert_eq!(strong, 0.99);
        let weak = score(MatchKind::Fallback, Some(&big), &stats(), 0, PairingMethod::TrailingColon);
        assert_eq!(weak, 0.90);
    }

    #[test]
    fn test_no_match_is_zero() {
        assert_eq!(score(MatchKind::None, None, &stats(), 0, PairingMethod::SameCell), 0.0);
    }

    #[test]
    fn test_date_parse_base_and_italic() {
        assert!((base_confidence(MatchKind::DateParse) - 0.52).abs() < 1e-9);
        let italic = TextFragment::new("x", 0.0, 0.0, 10.0).with_font("Times-Italic");
        assert!((font_factor(Some(&italic), &stats()) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_block_factor() {
        assert_eq!(block_factor(0), 1.0);
        assert!((block_factor(1) - 0.95).abs() < 1e-9);
        assert!((block_factor(-1) - 0.85).abs() < 1e-9);
    }
}
