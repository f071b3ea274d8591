use std::path::PathBuf;
use std::time::Duration;

use adapters::{
    HubSpotConfig, PipedriveConfig, SalesforceConfig, SourceKind, hubspot, pipedrive,
    salesforce,
};
use tracing::warn;

use crate::snapshot::sink::{DEFAULT_TABLE, SinkConfig};

pub const DEFAULT_CACHE_DIR: &str = "output/sales_cache";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Source tag exactly as configured (`SALES_PIPELINE_SOURCE`), kept for
    /// provenance even when it was not recognized.
    pub requested_source: String,

    /// Source that will be asked for records. Unknown tags and `--demo`
    /// both resolve to [`SourceKind::Demo`].
    pub source: SourceKind,

    /// Demo forced from the command line.
    pub demo_mode: bool,

    // =========================
    // Output
    // =========================
    /// Directory receiving one timestamped artifact per pull.
    pub cache_dir: PathBuf,

    /// Directory receiving `sales_pipeline.json`, the latest snapshot read by
    /// the dashboard.
    pub output_dir: PathBuf,

    /// Size of the `top_deals` list.
    pub top_n: usize,

    // =========================
    // Remote calls
    // =========================
    /// Bound applied to every HTTP round trip (CRM and sink). There is no
    /// retry; a failed live fetch falls back to demo data once.
    pub http_timeout: Duration,

    pub salesforce: SalesforceConfig,
    pub hubspot: HubSpotConfig,
    pub pipedrive: PipedriveConfig,

    /// Present only when both the sink URL and key are configured.
    pub sink: Option<SinkConfig>,
}

impl AppConfig {
    pub fn from_env(demo_mode: bool) -> Self {
        Self::from_lookup(demo_mode, |key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(demo_mode: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let requested_source = var("SALES_PIPELINE_SOURCE").unwrap_or_else(|| "demo".to_string());

        let source = if demo_mode {
            SourceKind::Demo
        } else {
            SourceKind::from_tag(&requested_source).unwrap_or_else(|| {
                warn!(source = %requested_source, "unknown data source, using demo data");
                SourceKind::Demo
            })
        };

        let api_key = var("SALES_PIPELINE_API_KEY");
        let api_endpoint = var("SALES_PIPELINE_ENDPOINT");

        let salesforce = SalesforceConfig {
            access_token: var("SALESFORCE_ACCESS_TOKEN").or_else(|| api_key.clone()),
            instance_url: var("SALESFORCE_INSTANCE_URL").or_else(|| api_endpoint.clone()),
            login_url: var("SALESFORCE_LOGIN_URL")
                .unwrap_or_else(|| salesforce::DEFAULT_LOGIN_URL.to_string()),
            api_version: var("SALESFORCE_API_VERSION")
                .unwrap_or_else(|| salesforce::DEFAULT_API_VERSION.to_string()),
            soql: Some(
                var("SALESFORCE_SOQL").unwrap_or_else(|| salesforce::DEFAULT_SOQL.to_string()),
            ),
            client_id: var("SALESFORCE_CLIENT_ID"),
            client_secret: var("SALESFORCE_CLIENT_SECRET"),
            username: var("SALESFORCE_USERNAME"),
            password: var("SALESFORCE_PASSWORD"),
            security_token: var("SALESFORCE_SECURITY_TOKEN"),
        };

        let hubspot = HubSpotConfig {
            api_key: api_key.clone(),
            base_url: api_endpoint
                .clone()
                .unwrap_or_else(|| hubspot::DEFAULT_BASE_URL.to_string()),
        };

        let pipedrive = PipedriveConfig {
            api_key,
            base_url: api_endpoint.unwrap_or_else(|| pipedrive::DEFAULT_BASE_URL.to_string()),
        };

        let sink_url = var("SUPABASE_URL").or_else(|| var("NEXT_PUBLIC_SUPABASE_URL"));
        let sink = match (sink_url, var("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(SinkConfig {
                url,
                service_role_key,
                table: var("SUPABASE_SALES_PIPELINE_TABLE")
                    .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            }),
            _ => None,
        };

        Self {
            requested_source: if demo_mode {
                SourceKind::Demo.to_string()
            } else {
                requested_source
            },
            source,
            demo_mode,
            cache_dir: PathBuf::from(
                var("SALES_PIPELINE_CACHE").unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
            ),
            output_dir: PathBuf::from(
                var("OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            top_n: var("SALES_PIPELINE_TOP_N")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOP_N),
            http_timeout: Duration::from_secs(
                var("SALES_PIPELINE_HTTP_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            salesforce,
            hubspot,
            pipedrive,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(demo_mode: bool, vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(demo_mode, |key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_defaults_to_demo() {
        let cfg = config(false, &[]);

        assert_eq!(cfg.source, SourceKind::Demo);
        assert_eq!(cfg.requested_source, "demo");
        assert_eq!(cfg.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert_eq!(cfg.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(cfg.top_n, DEFAULT_TOP_N);
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert!(cfg.sink.is_none());
        assert_eq!(cfg.salesforce.soql.as_deref(), Some(salesforce::DEFAULT_SOQL));
    }

    #[test]
    fn demo_flag_overrides_configured_source() {
        let cfg = config(true, &[("SALES_PIPELINE_SOURCE", "salesforce")]);

        assert_eq!(cfg.source, SourceKind::Demo);
        assert_eq!(cfg.requested_source, "demo");
        assert!(cfg.demo_mode);
    }

    #[test]
    fn unknown_source_maps_to_demo_but_is_remembered() {
        let cfg = config(false, &[("SALES_PIPELINE_SOURCE", "zoho")]);

        assert_eq!(cfg.source, SourceKind::Demo);
        assert_eq!(cfg.requested_source, "zoho");
    }

    #[test]
    fn generic_key_and_endpoint_feed_salesforce_token_auth() {
        let cfg = config(
            false,
            &[
                ("SALES_PIPELINE_SOURCE", "salesforce"),
                ("SALES_PIPELINE_API_KEY", "tok"),
                ("SALES_PIPELINE_ENDPOINT", "https://acme.my.salesforce.com"),
            ],
        );

        assert_eq!(cfg.source, SourceKind::Salesforce);
        assert_eq!(cfg.salesforce.access_token.as_deref(), Some("tok"));
        assert_eq!(
            cfg.salesforce.instance_url.as_deref(),
            Some("https://acme.my.salesforce.com")
        );
    }

    #[test]
    fn specific_salesforce_variables_win() {
        let cfg = config(
            false,
            &[
                ("SALES_PIPELINE_API_KEY", "generic"),
                ("SALESFORCE_ACCESS_TOKEN", "specific"),
                ("SALESFORCE_API_VERSION", "59.0"),
            ],
        );

        assert_eq!(cfg.salesforce.access_token.as_deref(), Some("specific"));
        assert_eq!(cfg.salesforce.api_version, "59.0");
        assert_eq!(cfg.salesforce.login_url, salesforce::DEFAULT_LOGIN_URL);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(
            false,
            &[
                ("SALES_PIPELINE_API_KEY", "   "),
                ("SALES_PIPELINE_CACHE", ""),
                ("SALES_PIPELINE_TOP_N", "lots"),
                ("SALES_PIPELINE_HTTP_TIMEOUT_SECS", "0"),
            ],
        );

        assert!(cfg.hubspot.api_key.is_none());
        assert_eq!(cfg.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
        assert_eq!(cfg.top_n, DEFAULT_TOP_N);
        assert_eq!(cfg.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn sink_needs_url_and_key() {
        let only_url = config(false, &[("SUPABASE_URL", "https://x.supabase.co")]);
        assert!(only_url.sink.is_none());

        let both = config(
            false,
            &[
                ("NEXT_PUBLIC_SUPABASE_URL", "https://x.supabase.co"),
                ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ],
        );
        let sink = both.sink.unwrap();
        assert_eq!(sink.url, "https://x.supabase.co");
        assert_eq!(sink.table, DEFAULT_TABLE);
    }

    #[test]
    fn crm_endpoints_default_per_source() {
        let cfg = config(
            false,
            &[("SALES_PIPELINE_SOURCE", "hubspot"), ("SALES_PIPELINE_API_KEY", "k")],
        );

        assert_eq!(cfg.source, SourceKind::HubSpot);
        assert_eq!(cfg.hubspot.base_url, hubspot::DEFAULT_BASE_URL);
        assert_eq!(cfg.pipedrive.base_url, pipedrive::DEFAULT_BASE_URL);
        assert_eq!(cfg.pipedrive.api_key.as_deref(), Some("k"));
    }
}
