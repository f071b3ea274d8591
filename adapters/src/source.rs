use std::fmt;

use async_trait::async_trait;
use corelib::{RawRecord, RecordSchema};

use crate::{
    demo::DemoSource, errors::FetchError, hubspot::HubSpotSource, pipedrive::PipedriveSource,
    salesforce::SalesforceSource,
};

/// Closed set of supported sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Demo,
    Salesforce,
    HubSpot,
    Pipedrive,
}

impl SourceKind {
    /// Parses a configuration tag, case-insensitively. Unknown tags are `None`;
    /// callers map them to [`SourceKind::Demo`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "demo" => Some(SourceKind::Demo),
            "salesforce" => Some(SourceKind::Salesforce),
            "hubspot" => Some(SourceKind::HubSpot),
            "pipedrive" => Some(SourceKind::Pipedrive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Demo => "demo",
            SourceKind::Salesforce => "salesforce",
            SourceKind::HubSpot => "hubspot",
            SourceKind::Pipedrive => "pipedrive",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch contract shared by every source.
///
/// `fetch` returns the fully materialized record set (all pages followed);
/// `schema` tells the normalizer how to read those records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn schema(&self) -> &'static RecordSchema;

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError>;
}

/// One configured source, dispatched without dynamic lookup.
pub enum SourceAdapter {
    Demo(DemoSource),
    Salesforce(SalesforceSource),
    HubSpot(HubSpotSource),
    Pipedrive(PipedriveSource),
}

impl SourceAdapter {
    /// Whether this adapter talks to a remote CRM (and can therefore fail).
    pub fn is_live(&self) -> bool {
        !matches!(self, SourceAdapter::Demo(_))
    }

    fn inner(&self) -> &dyn RecordSource {
        match self {
            SourceAdapter::Demo(s) => s,
            SourceAdapter::Salesforce(s) => s,
            SourceAdapter::HubSpot(s) => s,
            SourceAdapter::Pipedrive(s) => s,
        }
    }
}

#[async_trait]
impl RecordSource for SourceAdapter {
    fn kind(&self) -> SourceKind {
        self.inner().kind()
    }

    fn schema(&self) -> &'static RecordSchema {
        self.inner().schema()
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.inner().fetch().await
    }
}
