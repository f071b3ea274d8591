use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CanonicalDeal;
use crate::aggregate::{PipelineStats, top_by_value};

/// Point-in-time aggregate of the pipeline, built once per pull.
///
/// Field names on the wire follow the dashboard contract
/// (`total_leads`, `leads`, `demo`), not the Rust names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Capture time; the only field that depends on the wall clock.
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,

    #[serde(rename = "total_leads")]
    pub total_count: usize,
    pub total_value: f64,
    pub weighted_value: f64,
    pub average_value: f64,

    pub stage_breakdown: BTreeMap<String, usize>,
    pub value_by_stage: BTreeMap<String, f64>,

    /// Highest-value deals, ties kept in source order.
    pub top_deals: Vec<CanonicalDeal>,

    /// Every deal of the pull, in source order.
    #[serde(rename = "leads")]
    pub deals: Vec<CanonicalDeal>,

    /// Name of the adapter that actually produced the deals.
    pub source: String,

    #[serde(rename = "demo")]
    pub is_demo: bool,
}

impl PipelineSnapshot {
    /// Aggregates `deals` and freezes the result together with its provenance.
    pub fn build(
        captured_at: DateTime<Utc>,
        deals: Vec<CanonicalDeal>,
        source: impl Into<String>,
        is_demo: bool,
        top_n: usize,
    ) -> Self {
        let stats = PipelineStats::compute(&deals);
        let top_deals = top_by_value(&deals, top_n);

        Self {
            captured_at,
            total_count: stats.total_count,
            total_value: stats.total_value,
            weighted_value: stats.weighted_value,
            average_value: stats.average_value,
            stage_breakdown: stats.stage_breakdown,
            value_by_stage: stats.value_by_stage,
            top_deals,
            deals,
            source: source.into(),
            is_demo,
        }
    }

    /// Statistical part of the snapshot, detached from provenance and deals.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            total_count: self.total_count,
            total_value: self.total_value,
            weighted_value: self.weighted_value,
            average_value: self.average_value,
            stage_breakdown: self.stage_breakdown.clone(),
            value_by_stage: self.value_by_stage.clone(),
        }
    }
}
