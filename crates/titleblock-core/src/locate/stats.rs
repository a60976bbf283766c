use crate::model::TextFragment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Typography baseline of a page: what ordinary body text looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageStats {
    /// Median of the positive font sizes; 0 when there are none.
    pub median_font_size: f64,
    /// Most frequent fill color (first seen wins a tie).
    pub body_color: String,
}

impl PageStats {
    pub fn from_fragments(fragments: &[TextFragment]) -> Self {
        PageStats {
            median_font_size: median_font_size(fragments),
            body_color: modal_color(fragments),
        }
    }

    /// Font size relative to the page median, or 1.0 when unknown.
    pub fn font_ratio(&self, fragment: &TextFragment) -> f64 {
        if self.median_font_size > 0.0 && fragment.font_size > 0.0 {
            fragment.font_size / self.median_font_size
        } else {
            1.0
        }
    }
}

fn median_font_size(fragments: &[TextFragment]) -> f64 {
    let mut sizes: Vec<f64> = fragments
        .iter()
        .map(|f| f.font_size)
        .filter(|s| s.is_finite() && *s > 0.0)
        .collect();
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.sort_by(|a, b| a.total_cmp(b));

    let mid = sizes.len() / 2;
    if sizes.len() % 2 == 0 {
        (sizes[mid - 1] + sizes[mid]) / 2.0
    } else {
        sizes[mid]
    }
}

fn modal_color(fragments: &[TextFragment]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for fragment in fragments {
        let count = counts.entry(fragment.fill_color.as_str()).or_insert(0);
        if *count == 0 {
            order.push(fragment.fill_color.as_str());
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for color in order {
        let count = counts[color];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((color, count));
        }
    }
    best.map(|(color, _)| color.to_string()).unwrap_or_default()
}
