use std::sync::Once;

use metrics::{Unit, describe_counter};
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

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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
            "vetrina_query_hit_total",
            Unit::Count,
            "Total number of queries served from a fresh cache entry."
        );
        describe_counter!(
            "vetrina_query_miss_total",
            Unit::Count,
            "Total number of queries that issued a remote fetch."
        );
        describe_counter!(
            "vetrina_query_coalesced_total",
            Unit::Count,
            "Total number of queries satisfied by another caller's in-flight fetch."
        );
        describe_counter!(
            "vetrina_query_error_total",
            Unit::Count,
            "Total number of remote fetches that failed."
        );
        describe_counter!(
            "vetrina_query_stale_drop_total",
            Unit::Count,
            "Total number of fetch results discarded because a newer fetch superseded them."
        );
        describe_counter!(
            "vetrina_mutation_total",
            Unit::Count,
            "Total number of mutations attempted."
        );
        describe_counter!(
            "vetrina_mutation_error_total",
            Unit::Count,
            "Total number of mutations that failed."
        );
    });
}
