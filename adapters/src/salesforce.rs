//! Salesforce opportunities via the REST query API.
//!
//! Auth, in priority order:
//! 1. a pre-issued access token plus instance URL;
//! 2. OAuth password grant against the login host.
//!
//! The SOQL result is paged; `nextRecordsUrl` is followed until `done`.

use async_trait::async_trait;
use corelib::{ProbabilityScale, RawRecord, RecordSchema};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::{
    errors::FetchError,
    http::{check_status, object_rows, trim_base},
    source::{RecordSource, SourceKind},
};

pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
pub const DEFAULT_API_VERSION: &str = "60.0";
pub const DEFAULT_SOQL: &str = "SELECT Id, Name, Account.Name, StageName, Amount, Probability, \
     Owner.Name, CreatedDate, LastModifiedDate \
     FROM Opportunity \
     WHERE IsClosed = false \
     ORDER BY LastModifiedDate DESC \
     LIMIT 200";

/// Opportunity rows carry `Probability` as a percentage.
pub const SCHEMA: RecordSchema = RecordSchema {
    id: "Id",
    name: "Name",
    company: Some("Account.Name"),
    stage: "StageName",
    value: "Amount",
    probability: "Probability",
    owner: Some("Owner.Name"),
    created_at: "CreatedDate",
    updated_at: "LastModifiedDate",
    probability_scale: ProbabilityScale::Percent,
};

#[derive(Clone, Debug)]
pub struct SalesforceConfig {
    pub access_token: Option<String>,
    pub instance_url: Option<String>,
    pub login_url: String,
    pub api_version: String,
    pub soql: Option<String>,

    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub security_token: Option<String>,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            instance_url: None,
            login_url: DEFAULT_LOGIN_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            soql: Some(DEFAULT_SOQL.to_string()),
            client_id: None,
            client_secret: None,
            username: None,
            password: None,
            security_token: None,
        }
    }
}

/// How the source will obtain an access token.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Credentials<'a> {
    Token {
        access_token: &'a str,
        instance_url: &'a str,
    },
    PasswordGrant {
        token_url: String,
        client_id: &'a str,
        client_secret: &'a str,
        username: &'a str,
        /// Password with the security token appended, if any.
        password: String,
    },
}

impl SalesforceConfig {
    pub(crate) fn credentials(&self) -> Result<Credentials<'_>, FetchError> {
        if let (Some(access_token), Some(instance_url)) = (&self.access_token, &self.instance_url) {
            return Ok(Credentials::Token {
                access_token,
                instance_url,
            });
        }

        match (&self.client_id, &self.client_secret, &self.username, &self.password) {
            (Some(client_id), Some(client_secret), Some(username), Some(password)) => {
                let password = match &self.security_token {
                    Some(token) => format!("{password}{token}"),
                    None => password.clone(),
                };

                Ok(Credentials::PasswordGrant {
                    token_url: format!("{}/services/oauth2/token", trim_base(&self.login_url)),
                    client_id,
                    client_secret,
                    username,
                    password,
                })
            }
            _ => Err(FetchError::Config(
                "salesforce credentials not configured: provide SALESFORCE_ACCESS_TOKEN + \
                 SALESFORCE_INSTANCE_URL, or the OAuth password-grant variables"
                    .into(),
            )),
        }
    }
}

/// Token and host a query runs against.
#[derive(Debug, Clone)]
struct ApiSession {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    instance_url: Option<String>,
}

/// One page of a SOQL query result.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryPage {
    #[serde(default)]
    records: Option<Vec<Value>>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default, rename = "nextRecordsUrl")]
    next_records_url: Option<String>,
}

impl QueryPage {
    /// Absolute URL of the following page, if the query is not done.
    pub(crate) fn next_url(&self, base: &str) -> Option<String> {
        if self.done.unwrap_or(false) {
            return None;
        }

        self.next_records_url
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", trim_base(base), path))
    }

    pub(crate) fn into_records(self) -> Vec<RawRecord> {
        object_rows(self.records.unwrap_or_default())
    }
}

pub struct SalesforceSource {
    config: SalesforceConfig,
    http: Client,
}

impl SalesforceSource {
    pub fn new(config: SalesforceConfig, http: Client) -> Self {
        Self { config, http }
    }

    async fn session(&self) -> Result<ApiSession, FetchError> {
        match self.config.credentials()? {
            Credentials::Token {
                access_token,
                instance_url,
            } => Ok(ApiSession {
                access_token: access_token.to_string(),
                instance_url: instance_url.to_string(),
            }),
            Credentials::PasswordGrant {
                token_url,
                client_id,
                client_secret,
                username,
                password,
            } => {
                info!("authenticating to salesforce (password grant)");

                let resp = self
                    .http
                    .post(&token_url)
                    .form(&[
                        ("grant_type", "password"),
                        ("client_id", client_id),
                        ("client_secret", client_secret),
                        ("username", username),
                        ("password", password.as_str()),
                    ])
                    .send()
                    .await?;

                if !resp.status().is_success() {
                    return Err(FetchError::Auth(format!(
                        "salesforce token request failed (HTTP {})",
                        resp.status().as_u16()
                    )));
                }

                let token: TokenResponse = resp.json().await?;

                let access_token = token.access_token.unwrap_or_default().trim().to_string();
                let instance_url = token.instance_url.unwrap_or_default().trim().to_string();
                if access_token.is_empty() || instance_url.is_empty() {
                    return Err(FetchError::Auth(
                        "salesforce auth response missing access_token/instance_url".into(),
                    ));
                }

                Ok(ApiSession {
                    access_token,
                    instance_url,
                })
            }
        }
    }
}

#[async_trait]
impl RecordSource for SalesforceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Salesforce
    }

    fn schema(&self) -> &'static RecordSchema {
        &SCHEMA
    }

    #[instrument(skip(self), fields(api_version = %self.config.api_version), level = "debug")]
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let soql = self
            .config
            .soql
            .as_deref()
            .ok_or_else(|| FetchError::Config("salesforce SOQL query not configured".into()))?;

        let session = self.session().await?;
        let base = trim_base(&session.instance_url);

        info!("querying salesforce opportunities");

        let mut request = self
            .http
            .get(format!(
                "{base}/services/data/v{}/query",
                self.config.api_version
            ))
            .query(&[("q", soql)]);

        let mut records = Vec::new();
        let mut pages = 0usize;

        loop {
            let resp = request
                .bearer_auth(&session.access_token)
                .header(ACCEPT, "application/json")
                .send()
                .await?;
            let page: QueryPage = check_status(resp, "salesforce query")?.json().await?;
            pages += 1;

            let next = page.next_url(base);
            records.extend(page.into_records());

            debug!(pages, records = records.len(), "salesforce page received");

            match next {
                Some(url) => request = self.http.get(url),
                None => break,
            }
        }

        Ok(records)
    }
}
