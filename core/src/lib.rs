//! Canonical sales-pipeline model plus the two pure stages of a pull:
//! normalization of raw CRM rows and aggregation into a snapshot.

pub mod aggregate;
pub mod models;
pub mod normalize;

pub use aggregate::{PipelineStats, top_by_value};
pub use models::{CanonicalDeal, PipelineSnapshot, RawRecord};
pub use normalize::{ProbabilityScale, RecordSchema, normalize_record, normalize_records};
