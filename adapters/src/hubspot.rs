//! HubSpot deals via the CRM v3 objects API, paged by `paging.next.after`.

use std::collections::HashSet;

use async_trait::async_trait;
use corelib::{ProbabilityScale, RawRecord, RecordSchema};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    errors::FetchError,
    http::{check_status, object_rows, trim_base},
    source::{RecordSource, SourceKind},
};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

const PAGE_LIMIT: &str = "100";
const PROPERTIES: &str = "dealname,amount,dealstage,hs_deal_stage_probability,\
     hubspot_owner_id,createdate,hs_lastmodifieddate";

/// Deal properties are nested under `properties`; stage probability is a
/// fraction. Company needs an association lookup and is left empty.
pub const SCHEMA: RecordSchema = RecordSchema {
    id: "id",
    name: "properties.dealname",
    company: None,
    stage: "properties.dealstage",
    value: "properties.amount",
    probability: "properties.hs_deal_stage_probability",
    owner: Some("properties.hubspot_owner_id"),
    created_at: "properties.createdate",
    updated_at: "properties.hs_lastmodifieddate",
    probability_scale: ProbabilityScale::Fraction,
};

#[derive(Clone, Debug)]
pub struct HubSpotConfig {
    /// Private-app access token.
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for HubSpotConfig {
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
    results: Option<Vec<Value>>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    #[serde(default)]
    after: Option<String>,
}

impl DealsPage {
    pub(crate) fn next_cursor(&self) -> Option<String> {
        self.paging
            .as_ref()?
            .next
            .as_ref()?
            .after
            .as_deref()
            .map(str::trim)
            .filter(|after| !after.is_empty())
            .map(str::to_string)
    }

    pub(crate) fn into_records(self) -> Vec<RawRecord> {
        object_rows(self.results.unwrap_or_default())
    }
}

/// Next `after` cursor to request. A cursor already requested ends the
/// loop, so a server that keeps handing out old cursors cannot spin it.
fn advance_cursor(seen: &mut HashSet<String>, next: Option<String>) -> Option<String> {
    let cursor = next?;

    if seen.insert(cursor.clone()) {
        Some(cursor)
    } else {
        warn!(cursor = %cursor, "hubspot repeated a paging cursor; stopping");
        None
    }
}

pub struct HubSpotSource {
    config: HubSpotConfig,
    http: Client,
}

impl HubSpotSource {
    pub fn new(config: HubSpotConfig, http: Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl RecordSource for HubSpotSource {
    fn kind(&self) -> SourceKind {
        SourceKind::HubSpot
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
            .ok_or_else(|| FetchError::Config("HubSpot API key not configured".into()))?;

        let url = format!("{}/crm/v3/objects/deals", trim_base(&self.config.base_url));

        info!("querying hubspot deals");

        let mut records = Vec::new();
        let mut after: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(api_key)
                .query(&[("limit", PAGE_LIMIT), ("properties", PROPERTIES)]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let page: DealsPage = check_status(request.send().await?, "hubspot deals")?
                .json()
                .await?;

            let next = page.next_cursor();
            records.extend(page.into_records());

            debug!(records = records.len(), more = next.is_some(), "hubspot page received");

            after = advance_cursor(&mut seen, next);
            if after.is_none() {
                break;
            }
        }

        Ok(records)
    }
}
