use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_INVALIDATED_KEYS_TOTAL, METRIC_FEED_CACHE_HIT_TOTAL,
    METRIC_FEED_CACHE_MISS_TOTAL, METRIC_STATUS_MAP_REBUILD_TOTAL,
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
            METRIC_FEED_CACHE_HIT_TOTAL,
            Unit::Count,
            "Feed pages served from the volatile cache."
        );
        describe_counter!(
            METRIC_FEED_CACHE_MISS_TOTAL,
            Unit::Count,
            "Feed page lookups that fell through to the store."
        );
        describe_counter!(
            METRIC_STATUS_MAP_REBUILD_TOTAL,
            Unit::Count,
            "Status maps rebuilt from the store."
        );
        describe_counter!(
            METRIC_CACHE_ERROR_TOTAL,
            Unit::Count,
            "Volatile cache operations that failed and were degraded."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATED_KEYS_TOTAL,
            Unit::Count,
            "Cache keys removed by invalidation."
        );
    });
}
