//! Caller-owned comparison session and its serialized exchange record.
//!
//! The session is the one piece of mutable state in the system: an
//! ordered, append-only comparison log plus the item labels and prior
//! variance needed to rebuild the posterior from scratch. The core never
//! aliases it; each round takes a snapshot through [`Session::posterior`].
//!
//! The JSON shape is the exchange record other tools round-trip:
//!
//! ```json
//! { "items": ["A", "B"], "prior_var": 1.0,
//!   "comparisons": [{ "winner": 0, "loser": 1 }] }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Posterior;
use crate::prior::GaussianPrior;
use crate::types::Comparison;

/// A ranking session: item labels, prior variance, and the judgment log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    items: Vec<String>,
    prior_var: f64,
    comparisons: Vec<Comparison>,
}

impl Session {
    /// Start a session over the given items with an isotropic prior of
    /// the given variance.
    pub fn new(items: Vec<String>, prior_var: f64) -> Result<Self> {
        let session = Self {
            items,
            prior_var,
            comparisons: Vec::new(),
        };
        session.validate()?;
        Ok(session)
    }

    /// Item labels, in index order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Number of items.
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Variance of the isotropic prior.
    pub fn prior_var(&self) -> f64 {
        self.prior_var
    }

    /// The recorded judgments, oldest first.
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Append a judgment to the log.
    ///
    /// Validation happens before any mutation: a rejected comparison
    /// leaves the log untouched.
    pub fn record(&mut self, comparison: Comparison) -> Result<()> {
        let n = self.items.len();
        let far = comparison.winner.max(comparison.loser);
        if far >= n {
            return Err(Error::InvalidInput(format!(
                "comparison references item {far} but the session has {n} items"
            )));
        }
        if comparison.winner == comparison.loser {
            return Err(Error::InvalidInput(format!(
                "comparison pits item {} against itself",
                comparison.winner
            )));
        }
        self.comparisons.push(comparison);
        Ok(())
    }

    /// Remove and return the most recent judgment, if any.
    pub fn undo(&mut self) -> Option<Comparison> {
        self.comparisons.pop()
    }

    /// The session's Gaussian prior: zero mean, `prior_var · I`.
    pub fn prior(&self) -> Result<GaussianPrior> {
        GaussianPrior::isotropic(self.items.len(), self.prior_var)
    }

    /// Rebuild the posterior from the current snapshot of the log.
    pub fn posterior(&self, config: &Config) -> Result<Posterior> {
        Posterior::infer(&self.prior()?, &self.comparisons, config)
    }

    /// Serialize the exchange record as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidInput(format!("session record failed to serialize: {e}")))
    }

    /// Parse and validate an exchange record.
    ///
    /// Malformed JSON and out-of-range comparison indices both surface as
    /// [`Error::InvalidInput`].
    pub fn from_json(json: &str) -> Result<Self> {
        let session: Session = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("malformed session record: {e}")))?;
        session.validate()?;
        Ok(session)
    }

    fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::InvalidInput(
                "session needs at least one item".into(),
            ));
        }
        if !(self.prior_var.is_finite() && self.prior_var > 0.0) {
            return Err(Error::InvalidInput(format!(
                "prior variance must be positive and finite, got {}",
                self.prior_var
            )));
        }
        let n = self.items.len();
        for (idx, comparison) in self.comparisons.iter().enumerate() {
            let far = comparison.winner.max(comparison.loser);
            if far >= n {
                return Err(Error::InvalidInput(format!(
                    "comparison {idx} references item {far} but the session has {n} items"
                )));
            }
            if comparison.winner == comparison.loser {
                return Err(Error::InvalidInput(format!(
                    "comparison {idx} pits item {} against itself",
                    comparison.winner
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Session {
        Session::new(vec!["A".into(), "B".into(), "C".into()], 1.0).unwrap()
    }

    #[test]
    fn record_appends_in_order() {
        let mut session = abc();
        session.record(Comparison::new(0, 1)).unwrap();
        session.record(Comparison::new(2, 1)).unwrap();
        assert_eq!(
            session.comparisons(),
            &[Comparison::new(0, 1), Comparison::new(2, 1)]
        );
    }

    #[test]
    fn rejected_record_leaves_log_untouched() {
        let mut session = abc();
        session.record(Comparison::new(0, 1)).unwrap();
        assert!(session.record(Comparison::new(0, 7)).is_err());
        assert!(session.record(Comparison::new(1, 1)).is_err());
        assert_eq!(session.comparisons(), &[Comparison::new(0, 1)]);
    }

    #[test]
    fn undo_removes_only_the_most_recent() {
        let mut session = abc();
        session.record(Comparison::new(0, 1)).unwrap();
        session.record(Comparison::new(1, 2)).unwrap();
        assert_eq!(session.undo(), Some(Comparison::new(1, 2)));
        assert_eq!(session.comparisons(), &[Comparison::new(0, 1)]);
        assert_eq!(session.undo(), Some(Comparison::new(0, 1)));
        assert_eq!(session.undo(), None);
    }

    #[test]
    fn json_round_trip_preserves_everything() {
        let mut session = Session::new(vec!["A".into(), "B".into()], 2.5).unwrap();
        session.record(Comparison::new(1, 0)).unwrap();
        let json = session.to_json().unwrap();
        let back = Session::from_json(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn exchange_record_field_names_are_stable() {
        let json = r#"{
            "items": ["left", "right"],
            "prior_var": 1.5,
            "comparisons": [{ "winner": 0, "loser": 1 }]
        }"#;
        let session = Session::from_json(json).unwrap();
        assert_eq!(session.n_items(), 2);
        assert_eq!(session.prior_var(), 1.5);
        assert_eq!(session.comparisons(), &[Comparison::new(0, 1)]);
    }

    #[test]
    fn malformed_records_are_invalid_input() {
        assert!(matches!(
            Session::from_json("not json"),
            Err(Error::InvalidInput(_))
        ));
        // Indices out of range for the item list.
        let json = r#"{"items":["A"],"prior_var":1.0,"comparisons":[{"winner":0,"loser":3}]}"#;
        assert!(matches!(
            Session::from_json(json),
            Err(Error::InvalidInput(_))
        ));
        // Non-positive prior variance.
        let json = r#"{"items":["A"],"prior_var":0.0,"comparisons":[]}"#;
        assert!(matches!(
            Session::from_json(json),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_item_list_is_rejected() {
        assert!(matches!(
            Session::new(vec![], 1.0),
            Err(Error::InvalidInput(_))
        ));
    }
}
