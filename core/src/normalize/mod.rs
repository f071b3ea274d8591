//! Record Normalizer
//!
//! Maps one raw CRM row onto a [`CanonicalDeal`]. Each source describes its
//! row layout with a [`RecordSchema`]: the dotted key path of every canonical
//! field and the scale its probability is expressed in.
//!
//! Normalization is a pure function of the row and the schema. Bad numbers
//! never fail a row; they fall back to 0.0. The only rejection is a row
//! without a usable id, which is dropped.

mod coerce;

use serde_json::Value;

use crate::models::{CanonicalDeal, RawRecord};

pub use coerce::{coerce_f64, coerce_text};

/// Stage label used when a row carries none.
pub const UNKNOWN_STAGE: &str = "Unknown";

/// How a source expresses win probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityScale {
    /// 0–100 (Salesforce, Pipedrive).
    Percent,
    /// 0.0–1.0 (HubSpot, demo data).
    Fraction,
}

impl ProbabilityScale {
    /// Converts a raw probability to a fraction clamped into [0, 1].
    pub fn to_fraction(self, raw: f64) -> f64 {
        let fraction = match self {
            ProbabilityScale::Percent => raw / 100.0,
            ProbabilityScale::Fraction => raw,
        };
        match fraction {
            f if f > 0.0 => f.min(1.0),
            _ => 0.0,
        }
    }
}

/// Where each canonical field lives in a source row.
///
/// Paths are dot-separated (`"Account.Name"`); `None` means the source has
/// no such field and the canonical field stays empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    pub id: &'static str,
    pub name: &'static str,
    pub company: Option<&'static str>,
    pub stage: &'static str,
    pub value: &'static str,
    pub probability: &'static str,
    pub owner: Option<&'static str>,
    pub created_at: &'static str,
    pub updated_at: &'static str,
    pub probability_scale: ProbabilityScale,
}

/// Resolves a dotted path. Any non-object hop yields `None`.
fn lookup<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

fn text_at(record: &RawRecord, path: Option<&str>) -> String {
    path.and_then(|p| lookup(record, p))
        .map(coerce_text)
        .unwrap_or_default()
}

fn number_at(record: &RawRecord, path: &str, default: f64) -> f64 {
    lookup(record, path)
        .map(|v| coerce_f64(v, default))
        .unwrap_or(default)
}

/// Normalizes one row, or returns `None` when the row has no usable id.
pub fn normalize_record(record: &RawRecord, schema: &RecordSchema) -> Option<CanonicalDeal> {
    let id = text_at(record, Some(schema.id));
    if id.is_empty() {
        return None;
    }

    let stage = match text_at(record, Some(schema.stage)) {
        s if s.is_empty() => UNKNOWN_STAGE.to_string(),
        s => s,
    };

    let raw_probability = number_at(record, schema.probability, 0.0);

    // -0.0 must not survive: it serializes as `-0.0` and sorts below 0.0
    let value = match number_at(record, schema.value, 0.0) {
        v if v > 0.0 => v,
        _ => 0.0,
    };

    Some(CanonicalDeal {
        id,
        name: text_at(record, Some(schema.name)),
        company: text_at(record, schema.company),
        stage,
        value,
        probability: schema.probability_scale.to_fraction(raw_probability),
        owner: text_at(record, schema.owner),
        created_at: text_at(record, Some(schema.created_at)),
        updated_at: text_at(record, Some(schema.updated_at)),
    })
}

/// Normalizes a batch in source order, dropping rows without an id.
pub fn normalize_records(records: &[RawRecord], schema: &RecordSchema) -> Vec<CanonicalDeal> {
    records
        .iter()
        .filter_map(|r| normalize_record(r, schema))
        .collect()
}
