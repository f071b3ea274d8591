use serde::{Deserialize, Serialize};

pub mod snapshot;

pub use snapshot::PipelineSnapshot;

/// One row as returned by a CRM query, before normalization.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A sales opportunity in the shape every source is normalized into.
///
/// Built once per pull and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDeal {
    /// Stable identifier from the source system.
    pub id: String,
    pub name: String,
    pub company: String,

    /// Free-form pipeline stage; "Unknown" when the source has none.
    pub stage: String,

    /// Monetary amount, never negative.
    pub value: f64,

    /// Win probability in [0.0, 1.0].
    pub probability: f64,

    pub owner: String,

    /// ISO-8601 strings, empty when the source does not say.
    pub created_at: String,
    pub updated_at: String,
}

impl CanonicalDeal {
    /// Expected revenue: value × probability.
    pub fn weighted_value(&self) -> f64 {
        self.value * self.probability
    }
}
