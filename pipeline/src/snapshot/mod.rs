//! Snapshot Writer and remote sink.
//!
//! The artifact on disk is the snapshot plus a `_metadata` object describing
//! the run that produced it.

pub mod sink;
pub mod writer;

use std::path::Path;

use chrono::{DateTime, Utc};
use corelib::PipelineSnapshot;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

pub use sink::{SnapshotSink, SupabaseSink};
pub use writer::{SnapshotWriter, WrittenArtifact};

/// Version stamped into every artifact.
pub const ARTIFACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub generated_at: DateTime<Utc>,
    pub demo_mode: bool,
    pub version: String,

    /// Source tag the run was configured with, which differs from
    /// `source` when the run fell back to demo data.
    pub requested_source: String,
    pub trace_id: String,

    /// Why the live source was replaced by demo data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotArtifact {
    #[serde(flatten)]
    pub snapshot: PipelineSnapshot,

    #[serde(rename = "_metadata")]
    pub metadata: ArtifactMetadata,
}

/// Reparses an artifact written by [`SnapshotWriter`].
pub fn read_artifact(path: &Path) -> Result<SnapshotArtifact, PersistenceError> {
    let raw = std::fs::read(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&raw).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
