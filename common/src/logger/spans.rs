use tracing::{Span, field};

use super::TraceId;

/// Root span for one pull invocation. Everything logged while it is entered
/// carries the trace id and the requested source.
pub fn pull_span(trace_id: &TraceId, requested_source: &str) -> Span {
    tracing::info_span!(
        "pull",
        trace_id = %trace_id.as_str(),
        requested_source = %requested_source,
        source = field::Empty
    )
}

/// Child span for a pipeline stage (fetch, normalize, write, ...).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("stage", name = %name)
}
