//! Aggregator
//!
//! Single pass over normalized deals. The sums are folded in input order,
//! so the same input always yields bit-identical output.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::CanonicalDeal;

/// Statistical fields of a [`crate::PipelineSnapshot`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineStats {
    pub total_count: usize,
    pub total_value: f64,
    pub weighted_value: f64,

    /// `total_value / total_count`, 0.0 when there are no deals.
    pub average_value: f64,

    /// Stage → number of deals. Absent stages have no entry.
    pub stage_breakdown: BTreeMap<String, usize>,

    /// Stage → summed deal value.
    pub value_by_stage: BTreeMap<String, f64>,
}

impl PipelineStats {
    pub fn compute(deals: &[CanonicalDeal]) -> Self {
        let mut stats = Self::default();

        for deal in deals {
            stats.total_count += 1;
            stats.total_value += deal.value;
            stats.weighted_value += deal.weighted_value();

            *stats.stage_breakdown.entry(deal.stage.clone()).or_insert(0) += 1;
            *stats.value_by_stage.entry(deal.stage.clone()).or_insert(0.0) += deal.value;
        }

        if stats.total_count > 0 {
            stats.average_value = stats.total_value / stats.total_count as f64;
        }

        stats
    }
}

/// The `n` highest-value deals, descending. Equal values keep input order.
pub fn top_by_value(deals: &[CanonicalDeal], n: usize) -> Vec<CanonicalDeal> {
    let mut ranked: Vec<&CanonicalDeal> = deals.iter().collect();

    // sort_by is stable; values are finite after normalization
    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    ranked.into_iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(id: &str, stage: &str, value: f64, probability: f64) -> CanonicalDeal {
        CanonicalDeal {
            id: id.into(),
            name: String::new(),
            company: String::new(),
            stage: stage.into(),
            value,
            probability,
            owner: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn empty_input_yields_zeroes() {
        let stats = PipelineStats::compute(&[]);

        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.total_value, 0.0);
        assert_eq!(stats.weighted_value, 0.0);
        assert_eq!(stats.average_value, 0.0);
        assert!(stats.stage_breakdown.is_empty());
        assert!(stats.value_by_stage.is_empty());
        assert!(top_by_value(&[], 3).is_empty());
    }

    #[test]
    fn stages_are_counted_without_zero_fill() {
        let deals = [deal("1", "A", 1.0, 1.0), deal("2", "A", 2.0, 1.0), deal("3", "B", 3.0, 1.0)];

        let stats = PipelineStats::compute(&deals);

        assert_eq!(stats.stage_breakdown.len(), 2);
        assert_eq!(stats.stage_breakdown["A"], 2);
        assert_eq!(stats.stage_breakdown["B"], 1);
        assert_eq!(stats.value_by_stage["A"], 3.0);
        assert_eq!(stats.value_by_stage["B"], 3.0);
    }

    #[test]
    fn stage_grouping_is_case_sensitive() {
        let deals = [deal("1", "proposal", 1.0, 0.0), deal("2", "Proposal", 1.0, 0.0)];

        let stats = PipelineStats::compute(&deals);
        assert_eq!(stats.stage_breakdown.len(), 2);
    }

    #[test]
    fn weighted_value_matches_hand_computation() {
        // (50000*0.6) + (30000*0.5) + (100000*0.8)
        let deals = [
            deal("D1", "Proposal", 50000.0, 0.6),
            deal("D2", "Proposal", 30000.0, 0.5),
            deal("D3", "Negotiation", 100000.0, 0.8),
        ];

        let stats = PipelineStats::compute(&deals);

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.total_value, 180000.0);
        assert_eq!(stats.weighted_value, 125000.0);
        assert_eq!(stats.average_value, 60000.0);
    }

    #[test]
    fn zero_and_full_probability_edges() {
        let zero = PipelineStats::compute(&[deal("1", "Discovery", 50000.0, 0.0)]);
        assert_eq!(zero.weighted_value, 0.0);

        let certain = PipelineStats::compute(&[deal("2", "Closed Won", 100000.0, 1.0)]);
        assert_eq!(certain.weighted_value, certain.total_value);
    }

    #[test]
    fn top_deals_are_descending_and_stable_on_ties() {
        let deals = [
            deal("low", "A", 10.0, 0.0),
            deal("tie-1", "A", 50.0, 0.0),
            deal("high", "A", 90.0, 0.0),
            deal("tie-2", "A", 50.0, 0.0),
        ];

        let ids: Vec<_> = top_by_value(&deals, 3).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["high", "tie-1", "tie-2"]);
    }

    #[test]
    fn signed_zeros_tie_in_top_deals() {
        let deals = [deal("neg", "A", -0.0, 0.0), deal("pos", "A", 0.0, 0.0)];

        let ids: Vec<_> = top_by_value(&deals, 2).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, ["neg", "pos"]);
    }

    #[test]
    fn top_n_larger_than_input_returns_everything() {
        let deals = [deal("a", "A", 1.0, 0.0), deal("b", "A", 2.0, 0.0)];
        assert_eq!(top_by_value(&deals, 10).len(), 2);
        assert!(top_by_value(&deals, 0).is_empty());
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let deals: Vec<_> = (0..50)
            .map(|i| deal(&i.to_string(), if i % 3 == 0 { "A" } else { "B" }, i as f64 * 1.1, 0.37))
            .collect();

        let first = PipelineStats::compute(&deals);
        let second = PipelineStats::compute(&deals);

        assert_eq!(first.total_value.to_bits(), second.total_value.to_bits());
        assert_eq!(first.weighted_value.to_bits(), second.weighted_value.to_bits());
        assert_eq!(first, second);
    }
}
