use crate::extraction::lines::{HorizontalLine, VerticalLine};
use serde::{Deserialize, Serialize};

/// A line produced by merging near-duplicate drawn lines.
///
/// `position` is the running average of the merged lines along their
/// defining axis; `start..end` is the union of their spans. The raw spans
/// are kept so callers can tell drawn stretches from gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedLine {
    pub position: f64,
    pub start: f64,
    pub end: f64,
    pub segments: Vec<(f64, f64)>,
}

impl MergedLine {
    /// Does the line reach `value` along its span, with slack?
    pub fn spans(&self, value: f64, tolerance: f64) -> bool {
        value >= self.start - tolerance && value <= self.end + tolerance
    }

    /// Fraction of `from..to` covered by the drawn segments.
    pub fn coverage(&self, from: f64, to: f64) -> f64 {
        let (lo, hi) = (from.min(to), from.max(to));
        let length = hi - lo;
        if length <= 0.0 {
            return 0.0;
        }

        let mut clipped: Vec<(f64, f64)> = self
            .segments
            .iter()
            .map(|&(s, e)| (s.max(lo), e.min(hi)))
            .filter(|(s, e)| e > s)
            .collect();
        clipped.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut covered = 0.0;
        let mut cursor = lo;
        for (s, e) in clipped {
            let s = s.max(cursor);
            if e > s {
                covered += e - s;
                cursor = e;
            }
        }
        covered / length
    }
}

/// Merge horizontal lines whose y positions lie within `tolerance`.
/// The result is ordered by ascending y.
pub fn merge_horizontal(lines: &[HorizontalLine], tolerance: f64) -> Vec<MergedLine> {
    let items: Vec<(f64, f64, f64)> = lines.iter().map(|l| (l.y, l.x1, l.x2)).collect();
    merge_positioned(items, tolerance)
}

/// Merge vertical lines whose x positions lie within `tolerance`.
/// The result is ordered by ascending x.
pub fn merge_vertical(lines: &[VerticalLine], tolerance: f64) -> Vec<MergedLine> {
    let items: Vec<(f64, f64, f64)> = lines.iter().map(|l| (l.x, l.y1, l.y2)).collect();
    merge_positioned(items, tolerance)
}

fn merge_positioned(mut items: Vec<(f64, f64, f64)>, tolerance: f64) -> Vec<MergedLine> {
    items.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<MergedLine> = Vec::new();
    let mut count = 0usize;
    let mut sum = 0.0;

    for (position, a, b) in items {
        let (start, end) = (a.min(b), a.max(b));
        match merged.last_mut() {
            Some(current) if (position - current.position).abs() <= tolerance => {
                count += 1;
                sum += position;
                current.position = sum / count as f64;
                current.start = current.start.min(start);
                current.end = current.end.max(end);
                current.segments.push((start, end));
            }
            _ => {
                count = 1;
                sum = position;
                merged.push(MergedLine {
                    position,
                    start,
                    end,
                    segments: vec![(start, end)],
                });
            }
        }
    }

    merged
}

/// A horizontal and a vertical line intersect when each one's position
/// falls inside the other's span, both with slack.
pub fn intersects(horizontal: &MergedLine, vertical: &MergedLine, tolerance: f64) -> bool {
    horizontal.spans(vertical.position, tolerance) && vertical.spans(horizontal.position, tolerance)
}
