use thiserror::Error;

/// Why a live source could not produce records.
///
/// Every variant is recoverable from the orchestrator's point of view: it
/// substitutes demo data once and carries on.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Credentials, endpoint or query missing from configuration.
    #[error("configuration incomplete: {0}")]
    Config(String),

    /// The CRM rejected the credentials or the token exchange.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network failure, timeout, non-success status or undecodable body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Config(_) => "config",
            FetchError::Auth(_) => "auth",
            FetchError::Transport(_) => "transport",
        }
    }
}
