//! One pull: fetch → normalize → aggregate → write → (optional) upsert.
//!
//! A live source that fails for any [`FetchError`] reason is replaced by the
//! demo source exactly once. The substitution is logged at `warn`, marks the
//! snapshot as demo and records the reason in the artifact metadata. Only a
//! failed artifact write aborts the pull.

use std::path::PathBuf;

use adapters::{
    DemoSource, FetchError, HubSpotSource, PipedriveSource, RecordSource, SalesforceSource,
    SourceAdapter, SourceKind, http::build_client,
};
use chrono::Utc;
use common::logger::{TraceId, child_span, pull_span};
use corelib::{PipelineSnapshot, RawRecord, RecordSchema, normalize_records};
use tracing::{Instrument, Span, debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::snapshot::{
    ARTIFACT_VERSION, ArtifactMetadata, SnapshotArtifact, SnapshotSink, SnapshotWriter,
};

/// Raw records plus everything needed to interpret them.
pub struct Collected {
    pub records: Vec<RawRecord>,
    pub schema: &'static RecordSchema,
    pub source: SourceKind,

    /// Why the configured live source was replaced by demo data.
    pub fallback: Option<FetchError>,
}

impl Collected {
    fn demo(fallback: Option<FetchError>) -> Self {
        let demo = DemoSource;
        Self {
            records: demo.records(),
            schema: demo.schema(),
            source: SourceKind::Demo,
            fallback,
        }
    }

    pub fn is_demo(&self) -> bool {
        self.source == SourceKind::Demo
    }
}

/// Outcome of a successful pull.
#[derive(Debug)]
pub struct PullReport {
    pub snapshot: PipelineSnapshot,
    pub artifact: PathBuf,
    pub latest: PathBuf,
    pub sink_upserted: bool,
    pub fallback_reason: Option<String>,
}

/// Resolves the configured source into a concrete adapter.
pub fn build_source(cfg: &AppConfig) -> Result<SourceAdapter, FetchError> {
    let adapter = match cfg.source {
        SourceKind::Demo => SourceAdapter::Demo(DemoSource),
        SourceKind::Salesforce => SourceAdapter::Salesforce(SalesforceSource::new(
            cfg.salesforce.clone(),
            build_client(cfg.http_timeout)?,
        )),
        SourceKind::HubSpot => SourceAdapter::HubSpot(HubSpotSource::new(
            cfg.hubspot.clone(),
            build_client(cfg.http_timeout)?,
        )),
        SourceKind::Pipedrive => SourceAdapter::Pipedrive(PipedriveSource::new(
            cfg.pipedrive.clone(),
            build_client(cfg.http_timeout)?,
        )),
    };

    Ok(adapter)
}

/// Fetches from `source`, substituting demo data once if it fails.
pub async fn collect(source: &SourceAdapter) -> Collected {
    match source.fetch().await {
        Ok(records) => Collected {
            records,
            schema: source.schema(),
            source: source.kind(),
            fallback: None,
        },
        Err(e) => fall_back(source.kind(), e),
    }
}

fn fall_back(requested: SourceKind, e: FetchError) -> Collected {
    warn!(
        source = %requested,
        kind = e.kind(),
        error = %e,
        "failed to pull data from live source, falling back to demo data"
    );
    Collected::demo(Some(e))
}

/// Runs one complete pull inside its own trace span.
pub async fn run_pull(
    cfg: &AppConfig,
    writer: &SnapshotWriter,
    sink: Option<&dyn SnapshotSink>,
    trace_id: &TraceId,
) -> Result<PullReport, AppError> {
    let span = pull_span(trace_id, &cfg.requested_source);

    async move {
        info!("pulling sales pipeline data");

        let collected = async {
            match build_source(cfg) {
                Ok(source) => collect(&source).await,
                Err(e) => fall_back(cfg.source, e),
            }
        }
        .instrument(child_span("fetch"))
        .await;

        Span::current().record("source", collected.source.as_str());

        let deals = normalize_records(&collected.records, collected.schema);
        let dropped = collected.records.len() - deals.len();
        if dropped > 0 {
            debug!(dropped, "skipped records without an identifier");
        }

        let snapshot = PipelineSnapshot::build(
            Utc::now(),
            deals,
            collected.source.as_str(),
            collected.is_demo(),
            cfg.top_n,
        );

        info!(
            total_leads = snapshot.total_count,
            total_value = snapshot.total_value,
            weighted_value = snapshot.weighted_value,
            demo = snapshot.is_demo,
            "sales pipeline aggregated"
        );

        let fallback_reason = collected.fallback.as_ref().map(ToString::to_string);
        let artifact = SnapshotArtifact {
            metadata: ArtifactMetadata {
                generated_at: Utc::now(),
                demo_mode: snapshot.is_demo,
                version: ARTIFACT_VERSION.to_string(),
                requested_source: cfg.requested_source.clone(),
                trace_id: trace_id.to_string(),
                fallback_reason: fallback_reason.clone(),
            },
            snapshot,
        };

        let written = child_span("write").in_scope(|| writer.write(&artifact))?;

        let sink_upserted = match sink {
            Some(sink) => {
                sink.upsert(&artifact.snapshot)
                    .instrument(child_span("sink"))
                    .await
            }
            None => {
                debug!("remote sink not configured; skipping upsert");
                false
            }
        };

        Ok(PullReport {
            snapshot: artifact.snapshot,
            artifact: written.artifact,
            latest: written.latest,
            sink_upserted,
            fallback_reason,
        })
    }
    .instrument(span)
    .await
}
