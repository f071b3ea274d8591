//! Fixed demo dataset.
//!
//! Used when no live source is configured and as the universal fallback
//! when a live fetch fails. No network, cannot fail.

use async_trait::async_trait;
use corelib::{ProbabilityScale, RawRecord, RecordSchema};
use serde_json::json;

use crate::{
    errors::FetchError,
    http::object_rows,
    source::{RecordSource, SourceKind},
};

/// Demo rows are already in canonical shape with fractional probabilities.
pub const SCHEMA: RecordSchema = RecordSchema {
    id: "id",
    name: "name",
    company: Some("company"),
    stage: "stage",
    value: "value",
    probability: "probability",
    owner: Some("owner"),
    created_at: "created_at",
    updated_at: "updated_at",
    probability_scale: ProbabilityScale::Fraction,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSource;

impl DemoSource {
    /// The five demo opportunities, in a fixed order.
    pub fn records(&self) -> Vec<RawRecord> {
        object_rows(vec![
            json!({
                "id": "lead-001",
                "name": "Enterprise Integration Project",
                "company": "TechCorp Solutions",
                "stage": "Qualification",
                "value": 150000.0,
                "probability": 0.3,
                "owner": "Sales Rep A",
                "created_at": "2025-11-15T10:00:00Z",
                "updated_at": "2025-12-09T14:30:00Z"
            }),
            json!({
                "id": "lead-002",
                "name": "Automation Platform Migration",
                "company": "FinTech Innovators",
                "stage": "Proposal",
                "value": 85000.0,
                "probability": 0.5,
                "owner": "Sales Rep B",
                "created_at": "2025-11-20T09:15:00Z",
                "updated_at": "2025-12-10T11:20:00Z"
            }),
            json!({
                "id": "lead-003",
                "name": "API Integration Services",
                "company": "RetailHub Inc",
                "stage": "Negotiation",
                "value": 45000.0,
                "probability": 0.7,
                "owner": "Sales Rep A",
                "created_at": "2025-11-25T13:45:00Z",
                "updated_at": "2025-12-10T16:00:00Z"
            }),
            json!({
                "id": "lead-004",
                "name": "Data Pipeline Optimization",
                "company": "Analytics Pro",
                "stage": "Qualification",
                "value": 62000.0,
                "probability": 0.25,
                "owner": "Sales Rep C",
                "created_at": "2025-12-01T08:30:00Z",
                "updated_at": "2025-12-08T10:45:00Z"
            }),
            json!({
                "id": "lead-005",
                "name": "Cloud Infrastructure Setup",
                "company": "StartupXYZ",
                "stage": "Closed Won",
                "value": 120000.0,
                "probability": 1.0,
                "owner": "Sales Rep B",
                "created_at": "2025-10-15T11:00:00Z",
                "updated_at": "2025-12-05T14:00:00Z"
            }),
        ])
    }
}

#[async_trait]
impl RecordSource for DemoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Demo
    }

    fn schema(&self) -> &'static RecordSchema {
        &SCHEMA
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        Ok(self.records())
    }
}
