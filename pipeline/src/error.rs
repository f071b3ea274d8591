use std::path::PathBuf;

use thiserror::Error;

/// The primary artifact could not be written (or read back).
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures that abort a pull. Source failures never land here: they
/// degrade to demo data instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("snapshot persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}
