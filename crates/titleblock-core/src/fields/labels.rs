use crate::model::{normalize_label, FieldType};
use std::collections::BTreeMap;

/// How a label text was tied to a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    /// The normalized text is one of the field's synonyms.
    Exact(FieldType),
    /// A synonym occurs in the text as whole words.
    Contains(FieldType),
}

impl LabelMatch {
    pub fn field(&self) -> FieldType {
        match self {
            LabelMatch::Exact(f) | LabelMatch::Contains(f) => *f,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, LabelMatch::Exact(_))
    }
}

/// Label synonym table compiled once per engine.
#[derive(Debug, Clone, Default)]
pub struct LabelMatcher {
    /// Normalized synonyms, longest first.
    entries: Vec<(String, FieldType)>,
}

impl LabelMatcher {
    pub fn new(synonyms: &BTreeMap<FieldType, Vec<String>>) -> Self {
        let mut entries: Vec<(String, FieldType)> = synonyms
            .iter()
            .flat_map(|(field, words)| words.iter().map(move |w| (normalize_label(w), *field)))
            .filter(|(w, _)| !w.is_empty())
            .collect();
        // Stable sort keeps field order among equal lengths.
        entries.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        LabelMatcher { entries }
    }

    /// Field named exactly by `text`.
    pub fn exact(&self, text: &str) -> Option<FieldType> {
        let normalized = normalize_label(text);
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(w, _)| *w == normalized)
            .map(|(_, f)| *f)
    }

    /// Exact match, else the longest synonym found as whole words in `text`.
    pub fn find(&self, text: &str) -> Option<LabelMatch> {
        if let Some(field) = self.exact(text) {
            return Some(LabelMatch::Exact(field));
        }
        let normalized = normalize_label(text);
        let padded = format!(" {} ", normalized);
        self.entries
            .iter()
            .find(|(w, _)| padded.contains(&format!(" {} ", w)))
            .map(|(_, f)| LabelMatch::Contains(*f))
    }

    /// Text that names some field and therefore cannot be a value.
    pub fn is_label(&self, text: &str) -> bool {
        self.exact(text).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin;

    fn matcher() -> LabelMatcher {
        LabelMatcher::new(&builtin::standard().label_synonyms)
    }

    #[test]
    fn test_exact_matches_normalize() {
        let m = matcher();
        assert_eq!(m.exact("Drawing No:"), Some(FieldType::Drawing));
        assert_eq!(m.exact("DWG. NO."), Some(FieldType::Drawing));
        assert_eq!(m.exact("Scale"), Some(FieldType::Scale));
        assert_eq!(m.exact("Drawn By"), Some(FieldType::DrawnBy));
        assert_eq!(m.exact("A-101"), None);
        assert_eq!(m.exact(" : "), None);
    }

    #[test]
    fn test_contains_prefers_longest() {
        let m = matcher();
        assert_eq!(
            m.find("Drawing Title of sheet"),
            Some(LabelMatch::Contains(FieldType::Title))
        );
        assert_eq!(m.find("Project"), Some(LabelMatch::Exact(FieldType::Project)));
        assert_eq!(m.find("Subtitle"), None);
    }

    #[test]
    fn test_is_label() {
        let m = matcher();
        assert!(m.is_label("Rev"));
        assert!(!m.is_label("Rev B"));
    }
}
