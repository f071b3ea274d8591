use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::SnapshotArtifact;
use crate::error::PersistenceError;

pub const LATEST_FILE_NAME: &str = "sales_pipeline.json";

const FILE_STEM: &str = "sales_pipeline";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where one pull ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    /// Timestamped, never-overwritten artifact.
    pub artifact: PathBuf,

    /// Latest snapshot, overwritten every run.
    pub latest: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    cache_dir: PathBuf,
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(cache_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Writes the timestamped artifact, then refreshes the latest copy.
    /// Either failure is fatal for the pull.
    pub fn write(&self, artifact: &SnapshotArtifact) -> Result<WrittenArtifact, PersistenceError> {
        let body = serde_json::to_vec_pretty(artifact).map_err(PersistenceError::Serialize)?;

        ensure_dir(&self.cache_dir)?;
        let stamp = artifact
            .snapshot
            .captured_at
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let path = self.write_unique(&stamp, &body)?;

        info!(path = %path.display(), bytes = body.len(), "cached sales pipeline snapshot");

        ensure_dir(&self.output_dir)?;
        let latest = self.output_dir.join(LATEST_FILE_NAME);
        fs::write(&latest, &body).map_err(|source| PersistenceError::Write {
            path: latest.clone(),
            source,
        })?;

        debug!(path = %latest.display(), "latest snapshot refreshed");

        Ok(WrittenArtifact {
            artifact: path,
            latest,
        })
    }

    /// `sales_pipeline_{stamp}.json`, or `_1`, `_2`, ... when taken.
    fn write_unique(&self, stamp: &str, body: &[u8]) -> Result<PathBuf, PersistenceError> {
        let mut attempt = 0u32;

        loop {
            let name = match attempt {
                0 => format!("{FILE_STEM}_{stamp}.json"),
                n => format!("{FILE_STEM}_{stamp}_{n}.json"),
            };
            let path = self.cache_dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(body)
                        .and_then(|_| file.sync_all())
                        .map_err(|source| PersistenceError::Write {
                            path: path.clone(),
                            source,
                        })?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(PersistenceError::Write { path, source }),
            }
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<(), PersistenceError> {
    fs::create_dir_all(dir).map_err(|source| PersistenceError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ARTIFACT_VERSION, ArtifactMetadata, read_artifact};
    use chrono::{TimeZone, Utc};
    use corelib::{CanonicalDeal, PipelineSnapshot};

    fn artifact() -> SnapshotArtifact {
        let captured_at = Utc.with_ymd_and_hms(2025, 12, 10, 14, 30, 5).unwrap();
        let deals = vec![
            CanonicalDeal {
                id: "lead-001".into(),
                name: "Enterprise Integration Project".into(),
                company: "TechCorp Solutions".into(),
                stage: "Qualification".into(),
                value: 150000.0,
                probability: 0.3,
                owner: "Sales Rep A".into(),
                created_at: "2025-11-15T10:00:00Z".into(),
                updated_at: "2025-12-09T14:30:00Z".into(),
            },
            CanonicalDeal {
                id: "lead-003".into(),
                name: "API Integration Services".into(),
                company: "RetailHub Inc".into(),
                stage: "Negotiation".into(),
                value: 45000.0,
                probability: 0.7,
                owner: "Sales Rep A".into(),
                created_at: String::new(),
                updated_at: String::new(),
            },
        ];

        SnapshotArtifact {
            snapshot: PipelineSnapshot::build(captured_at, deals, "demo", true, 3),
            metadata: ArtifactMetadata {
                generated_at: captured_at,
                demo_mode: true,
                version: ARTIFACT_VERSION.to_string(),
                requested_source: "demo".into(),
                trace_id: "trace-1".into(),
                fallback_reason: None,
            },
        }
    }

    #[test]
    fn writes_timestamped_and_latest_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("cache"), dir.path().join("out"));

        let written = writer.write(&artifact()).unwrap();

        assert_eq!(
            written.artifact,
            dir.path().join("cache/sales_pipeline_20251210_143005.json")
        );
        assert_eq!(written.latest, dir.path().join("out").join(LATEST_FILE_NAME));
        assert!(written.artifact.is_file());
        assert!(written.latest.is_file());
    }

    #[test]
    fn same_second_runs_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path(), dir.path());
        let art = artifact();

        let first = writer.write(&art).unwrap();
        let second = writer.write(&art).unwrap();
        let third = writer.write(&art).unwrap();

        assert_ne!(first.artifact, second.artifact);
        assert!(second.artifact.ends_with("sales_pipeline_20251210_143005_1.json"));
        assert!(third.artifact.ends_with("sales_pipeline_20251210_143005_2.json"));
        assert_eq!(first.latest, third.latest);
    }

    #[test]
    fn round_trip_preserves_statistics_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path(), dir.path());
        let art = artifact();

        let written = writer.write(&art).unwrap();
        let back = read_artifact(&written.artifact).unwrap();

        assert_eq!(back.snapshot.stats(), art.snapshot.stats());
        assert_eq!(back, art);
        assert_eq!(read_artifact(&written.latest).unwrap(), art);
    }

    #[test]
    fn artifact_json_has_metadata_block() {
        let dir = tempfile::tempdir().unwrap();
        let written = SnapshotWriter::new(dir.path(), dir.path())
            .write(&artifact())
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&written.artifact).unwrap()).unwrap();

        assert_eq!(raw["total_leads"], 2);
        assert_eq!(raw["total_value"], 195000.0);
        assert_eq!(raw["_metadata"]["demo_mode"], true);
        assert_eq!(raw["_metadata"]["version"], ARTIFACT_VERSION);
        assert!(raw["_metadata"].get("fallback_reason").is_none());
        assert!(raw["leads"].is_array());
    }

    #[test]
    fn unwritable_location_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let writer = SnapshotWriter::new(blocker.join("cache"), dir.path());
        let err = writer.write(&artifact()).unwrap_err();

        assert!(matches!(err, PersistenceError::CreateDir { .. }));
    }

    #[test]
    fn reading_garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(read_artifact(&path), Err(PersistenceError::Parse { .. })));
        assert!(matches!(
            read_artifact(&dir.path().join("missing.json")),
            Err(PersistenceError::Read { .. })
        ));
    }
}
