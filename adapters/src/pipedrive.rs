//! Pipedrive open deals via the v1 REST API, paged by `start`/`next_start`.

use async_trait::async_trait;
use corelib::{ProbabilityScale, RawRecord, RecordSchema};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::{
    errors::FetchError,
    http::{check_status, object_rows, trim_base},
    source::{RecordSource, SourceKind},
};

pub const DEFAULT_BASE_URL: &str = "https://api.pipedrive.com";

const PAGE_LIMIT: u64 = 100;

/// Pipedrive reports deal probability as a percentage (or null). Stages
/// are referenced by numeric id.
pub const SCHEMA: RecordSchema = RecordSchema {
    id: "id",
    name: "title",
    company: Some("org_name"),
    stage: "stage_id",
    value: "value",
    probability: "probability",
    owner: Some("owner_name"),
    created_at: "add_time",
    updated_at: "update_time",
    probability_scale: ProbabilityScale::Percent,
};

#[derive(Clone, Debug)]
pub struct PipedriveConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for PipedriveConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DealsPage {
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    additional_data: Option<AdditionalData>,
}

#[derive(Debug, Deserialize)]
struct AdditionalData {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    more_items_in_collection: Option<bool>,
    #[serde(default)]
    next_start: Option<u64>,
}

impl DealsPage {
    pub(crate) fn next_start(&self) -> Option<u64> {
        let pagination = self.additional_data.as_ref()?.pagination.as_ref()?;

        if pagination.more_items_in_collection.unwrap_or(false) {
            pagination.next_start
        } else {
            None
        }
    }

    pub(crate) fn into_records(self) -> Vec<RawRecord> {
        object_rows(self.data.unwrap_or_default())
    }
}

pub struct PipedriveSource {
    config: PipedriveConfig,
    http: Client,
}

impl PipedriveSource {
    pub fn new(config: PipedriveConfig, http: Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl RecordSource for PipedriveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Pipedrive
    }

    fn schema(&self) -> &'static RecordSchema {
        &SCHEMA
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::Config("Pipedrive API key not configured".into()))?;

        let url = format!("{}/v1/deals", trim_base(&self.config.base_url));

        info!("querying pipedrive deals");

        let mut records = Vec::new();
        let mut start = 0u64;

        loop {
            let resp = self
                .http
                .get(&url)
                .query(&[("api_token", api_key), ("status", "open")])
                .query(&[("start", start), ("limit", PAGE_LIMIT)])
                .send()
                .await?;
            let page: DealsPage = check_status(resp, "pipedrive deals")?.json().await?;

            let next = page.next_start();
            records.extend(page.into_records());

            debug!(records = records.len(), ?next, "pipedrive page received");

            match next {
                Some(n) if n > start => start = n,
                _ => break,
            }
        }

        Ok(records)
    }
}
