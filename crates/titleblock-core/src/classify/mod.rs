//! Cell role classification.

pub mod roles;

pub use roles::{classify_cells, RoleAssessment, RoleClassifier, RoleScores};
