use serde::{Deserialize, Serialize};

/// A group of coordinates produced by greedy 1-D clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// 1-based position of the group in scan order.
    pub index: usize,
    /// Running average of the member coordinates.
    pub center: f64,
    /// Indices of the clustered items, in scan order.
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// Greedy 1-D clustering of `(item, coordinate)` pairs.
///
/// Values are visited in `order`; a new group starts whenever the next value
/// lies more than `tolerance` away from the current group's running average.
pub fn cluster(values: &[(usize, f64)], tolerance: f64, order: ScanOrder) -> Vec<Group> {
    let mut sorted: Vec<(usize, f64)> = values.to_vec();
    sorted.sort_by(|a, b| match order {
        ScanOrder::Ascending => a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)),
        ScanOrder::Descending => b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)),
    });

    let mut groups: Vec<Group> = Vec::new();
    let mut sum = 0.0;

    for (item, value) in sorted {
        match groups.last_mut() {
            Some(group) if (value - group.center).abs() <= tolerance => {
                sum += value;
                group.members.push(item);
                group.center = sum / group.members.len() as f64;
            }
            _ => {
                sum = value;
                groups.push(Group {
                    index: groups.len() + 1,
                    center: value,
                    members: vec![item],
                });
            }
        }
    }

    groups
}

/// Item -> 1-based group index, for items `0..len`.
pub fn membership(groups: &[Group], len: usize) -> Vec<usize> {
    let mut out = vec![0; len];
    for group in groups {
        for &member in &group.members {
            if member < len {
                out[member] = group.index;
            }
        }
    }
    out
}
