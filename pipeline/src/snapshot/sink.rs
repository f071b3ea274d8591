//! Best-effort remote copy of each snapshot.
//!
//! Supabase exposes tables through PostgREST; a snapshot becomes one row
//! keyed by its timestamp and merged on conflict. Nothing here can fail a
//! pull: every problem is logged and reported as `false`.

use std::time::Duration;

use async_trait::async_trait;
use corelib::PipelineSnapshot;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

pub const DEFAULT_TABLE: &str = "sales_pipeline_snapshots";

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Returns whether the remote store accepted the snapshot.
    async fn upsert(&self, snapshot: &PipelineSnapshot) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub url: String,
    pub service_role_key: String,
    pub table: String,
}

pub struct SupabaseSink {
    config: SinkConfig,
    http: Client,
}

impl SupabaseSink {
    pub fn new(config: SinkConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict=timestamp",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn row(snapshot: &PipelineSnapshot) -> Result<Value, serde_json::Error> {
        Ok(json!([{
            "timestamp": snapshot.captured_at,
            "source": snapshot.source,
            "demo": snapshot.is_demo,
            "payload": serde_json::to_value(snapshot)?,
        }]))
    }
}

#[async_trait]
impl SnapshotSink for SupabaseSink {
    #[instrument(skip_all, fields(table = %self.config.table))]
    async fn upsert(&self, snapshot: &PipelineSnapshot) -> bool {
        let body = match Self::row(snapshot) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "cannot encode snapshot for supabase");
                return false;
            }
        };

        let result = self
            .http
            .post(self.endpoint())
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!("upserted sales pipeline snapshot to supabase");
                true
            }
            Ok(resp) => {
                warn!(
                    status = resp.status().as_u16(),
                    "supabase upsert failed for sales pipeline snapshot"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "supabase upsert error");
                false
            }
        }
    }
}
