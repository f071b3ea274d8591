pub mod demo;
pub mod errors;
pub mod http;
pub mod hubspot;
pub mod pipedrive;
pub mod salesforce;
pub mod source;

pub use demo::DemoSource;
pub use errors::FetchError;
pub use hubspot::{HubSpotConfig, HubSpotSource};
pub use pipedrive::{PipedriveConfig, PipedriveSource};
pub use salesforce::{SalesforceConfig, SalesforceSource};
pub use source::{RecordSource, SourceAdapter, SourceKind};
