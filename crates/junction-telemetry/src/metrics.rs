//! Dispatch metrics.
//!
//! Recorded through the `metrics` facade. No exporter is bundled; until the
//! host installs a recorder these calls are no-ops.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `junction_dispatch_total` | Counter | `method`, `status` |
//! | `junction_dispatch_duration_seconds` | Histogram | `method` |
//! | `junction_dispatch_failures_total` | Counter | `method`, `kind` |
//!
//! The `method` label is always a supported verb or [`UNSUPPORTED_METHOD`],
//! never the raw verb a client sent.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Counter of completed dispatches.
pub const DISPATCH_TOTAL: &str = "junction_dispatch_total";

/// Histogram of dispatch duration.
pub const DISPATCH_DURATION: &str = "junction_dispatch_duration_seconds";

/// Counter of dispatches that ended in an error for the host.
pub const DISPATCH_FAILURES: &str = "junction_dispatch_failures_total";

/// `method` label for requests whose verb was rejected.
pub const UNSUPPORTED_METHOD: &str = "unsupported";

/// Registers metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Dispatches that produced a response");
    describe_histogram!(DISPATCH_DURATION, "Dispatch duration in seconds");
    describe_counter!(
        DISPATCH_FAILURES,
        "Dispatches that ended with a fatal fault, cancellation or deadline"
    );
}

/// Records a dispatch that produced a response.
pub fn record_dispatch(method: &str, status: u16, duration: Duration) {
    counter!(
        DISPATCH_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(DISPATCH_DURATION, "method" => method.to_string())
        .record(duration.as_secs_f64());
}

/// Records a dispatch that ended with an error. `kind` is `handler`,
/// `cancelled` or `deadline`.
pub fn record_failure(method: &str, kind: &'static str) {
    counter!(
        DISPATCH_FAILURES,
        "method" => method.to_string(),
        "kind" => kind
    )
    .increment(1);
}
