use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::errors::FetchError;

/// Upper bound for a single HTTP round trip when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared client for every CRM call of one pull.
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    let http = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()?;

    Ok(http)
}

/// 401/403 become [`FetchError::Auth`]; any other non-success status is a
/// transport failure.
pub(crate) fn check_status(resp: Response, what: &str) -> Result<Response, FetchError> {
    let status = resp.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Auth(format!(
            "{what} rejected credentials (HTTP {})",
            status.as_u16()
        )));
    }

    Ok(resp.error_for_status()?)
}

/// Keeps only object-shaped rows; anything else in a result page is ignored.
pub(crate) fn object_rows(rows: Vec<serde_json::Value>) -> Vec<corelib::RawRecord> {
    rows.into_iter()
        .filter_map(|row| match row {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Trailing-slash-insensitive base URL.
pub(crate) fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
