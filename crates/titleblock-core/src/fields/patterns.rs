//! Per-field validation grammars.

use crate::model::FieldType;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static DRAWING_PRIMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9][A-Z0-9\-_]{1,19}$").expect("valid regex"));
static DRAWING_FALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{2,}").expect("valid regex"));

static SCALE_PRIMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[:/@]\d+").expect("valid regex"));

static REVISION_PRIMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(P\d+|[A-Z]?\d{1,2}|REV\s*[A-Z0-9])$").expect("valid regex")
});
static REVISION_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z0-9]{1,3}$").expect("valid regex"));
static REVISION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^REV(ISION)?\.?\s*[A-Z0-9]{1,3}$").expect("valid regex")
});

static DATE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,4}[./\-]\d{1,2}[./\-]\d{1,4}$").expect("valid regex")
});
static DATE_DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{1,2}[\s\-]+[A-Z]{3,9}\.?[\s\-,]+\d{4}$").expect("valid regex")
});

static FREE_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}").expect("valid regex"));

static SHEET_PRIMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+(\s*(of|/)\s*\d+)?$").expect("valid regex")
});
static SHEET_FALLBACK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

static AUTHOR_PRIMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z.'\- ]{0,39}$").expect("valid regex")
});

const SCALE_VALUES: &[&str] = &["N/A", "AS INDICATED", "NTS", "NONE", "FULL", "HALF"];

/// Date layouts tried when no date regex matches.
const DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%Y%m%d",
    "%d %b %y",
    "%d-%b-%y",
];

/// How a value satisfied its field's grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Primary,
    ValidValue,
    Fallback,
    DateParse,
    None,
}

impl MatchKind {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchKind::None)
    }

    /// Primary pattern or fixed valid value.
    pub fn is_strong(&self) -> bool {
        matches!(self, MatchKind::Primary | MatchKind::ValidValue)
    }
}

/// Grammar of one field type: a primary pattern, a closed list of accepted
/// literal values and fallback patterns, tried in that order.
pub struct FieldGrammar {
    primary: &'static Regex,
    valid_values: &'static [&'static str],
    fallbacks: Vec<&'static Regex>,
    date_parse: bool,
}

impl FieldGrammar {
    pub fn for_field(field: FieldType) -> FieldGrammar {
        match field {
            FieldType::Drawing => FieldGrammar {
                primary: &*DRAWING_PRIMARY,
                valid_values: &[],
                fallbacks: vec![&*DRAWING_FALLBACK],
                date_parse: false,
            },
            FieldType::Scale => FieldGrammar {
                primary: &*SCALE_PRIMARY,
                valid_values: SCALE_VALUES,
                fallbacks: Vec::new(),
                date_parse: false,
            },
            FieldType::Revision => FieldGrammar {
                primary: &*REVISION_PRIMARY,
                valid_values: &[],
                fallbacks: vec![&*REVISION_SHORT, &*REVISION_WORD],
                date_parse: false,
            },
            FieldType::Date => FieldGrammar {
                primary: &*DATE_NUMERIC,
                valid_values: &[],
                fallbacks: vec![&*DATE_DAY_MONTH_YEAR],
                date_parse: true,
            },
            FieldType::Title | FieldType::Project | FieldType::Client => FieldGrammar {
                primary: &*FREE_TEXT,
                valid_values: &[],
                fallbacks: Vec::new(),
                date_parse: false,
            },
            FieldType::Sheet => FieldGrammar {
                primary: &*SHEET_PRIMARY,
                valid_values: &[],
                fallbacks: vec![&*SHEET_FALLBACK],
                date_parse: false,
            },
            FieldType::DrawnBy | FieldType::CheckedBy | FieldType::ApprovedBy => FieldGrammar {
                primary: &*AUTHOR_PRIMARY,
                valid_values: &[],
                fallbacks: vec![&*FREE_TEXT],
                date_parse: false,
            },
        }
    }

    pub fn classify(&self, value: &str) -> MatchKind {
        let value = value.trim();
        if value.is_empty() {
            return MatchKind::None;
        }
        if self.primary.is_match(value) {
            return MatchKind::Primary;
        }
        let upper = value.to_uppercase();
        if self.valid_values.iter().any(|v| *v == upper) {
            return MatchKind::ValidValue;
        }
        if self.fallbacks.iter().any(|re| re.is_match(value)) {
            return MatchKind::Fallback;
        }
        if self.date_parse && parses_as_date(value) {
            return MatchKind::DateParse;
        }
        MatchKind::None
    }

    /// Source text of the pattern a value matched, for diagnostics.
    pub fn describe(&self, value: &str, kind: MatchKind) -> Option<String> {
        let value = value.trim();
        match kind {
            MatchKind::Primary => Some(self.primary.as_str().to_string()),
            MatchKind::ValidValue => Some(value.to_uppercase()),
            MatchKind::Fallback => self
                .fallbacks
                .iter()
                .find(|re| re.is_match(value))
                .map(|re| re.as_str().to_string()),
            MatchKind::DateParse => Some("date".to_string()),
            MatchKind::None => None,
        }
    }
}

pub fn validate(field: FieldType, value: &str) -> MatchKind {
    FieldGrammar::for_field(field).classify(value)
}

/// Numeric or written-month date shape, without attempting a parse.
pub fn looks_like_date(text: &str) -> bool {
    let text = text.trim();
    DATE_NUMERIC.is_match(text) || DATE_DAY_MONTH_YEAR.is_match(text)
}

fn parses_as_date(text: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
        || DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_rfc2822(text).is_ok()
}
