//! Shared type aliases and the comparison record.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Dynamically sized matrix of `f64`.
pub type Matrix = DMatrix<f64>;

/// Dynamically sized column vector of `f64`.
pub type Vector = DVector<f64>;

/// A single pairwise judgment: `winner` beat `loser`.
///
/// Both fields are item indices into the caller's item list. Comparisons
/// are immutable; a session owns them in an append-only sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    /// Index of the preferred item.
    pub winner: usize,
    /// Index of the other item.
    pub loser: usize,
}

impl Comparison {
    /// Record that `winner` beat `loser`.
    pub fn new(winner: usize, loser: usize) -> Self {
        Self { winner, loser }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_serializes_with_named_fields() {
        let json = serde_json::to_string(&Comparison::new(2, 5)).unwrap();
        assert_eq!(json, r#"{"winner":2,"loser":5}"#);

        let back: Comparison = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Comparison::new(2, 5));
    }
}
