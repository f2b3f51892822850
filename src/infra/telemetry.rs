use std::{io, sync::Once};

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    // Logs go to stderr so `render` output on stdout stays machine-readable.
    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "codebases_listing_cache_hit_total",
            Unit::Count,
            "Listings served straight from the cache."
        );
        describe_counter!(
            "codebases_listing_cache_miss_total",
            Unit::Count,
            "Listings rebuilt because the cache lacked a usable artifact."
        );
        describe_counter!(
            "codebases_listing_cache_corrupt_total",
            Unit::Count,
            "Cache entries discarded because they could not be decoded."
        );
        describe_counter!(
            "codebases_listing_cache_write_failed_total",
            Unit::Count,
            "Cache writes that failed after a listing was rebuilt."
        );
        describe_counter!(
            "codebases_listing_highlight_fallback_total",
            Unit::Count,
            "Snippets rendered as escaped plain text instead of highlighted markup."
        );
        describe_histogram!(
            "codebases_listing_assemble_ms",
            Unit::Milliseconds,
            "Time spent rebuilding a listing from its content source."
        );
    });
}
