use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
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
            "forum_sitemap_cache_hit_total",
            Unit::Count,
            "Sitemap requests answered from the document cache."
        );
        describe_counter!(
            "forum_sitemap_cache_miss_total",
            Unit::Count,
            "Sitemap requests that found no usable cached document."
        );
        describe_counter!(
            "forum_sitemap_cache_bypass_total",
            Unit::Count,
            "Sitemap requests that asked for a forced rebuild."
        );
        describe_counter!(
            "forum_sitemap_build_total",
            Unit::Count,
            "Sitemap documents built from the forum tables."
        );
        describe_histogram!(
            "forum_sitemap_build_ms",
            Unit::Milliseconds,
            "Time spent querying and rendering one sitemap, in milliseconds."
        );
        describe_gauge!(
            "forum_sitemap_url_count",
            Unit::Count,
            "Number of <url> entries in the most recently built sitemap."
        );
        describe_counter!(
            "forum_sitemap_unavailable_total",
            Unit::Count,
            "Sitemap requests rejected because the forum is not available."
        );
        describe_counter!(
            "forum_sitemap_availability_probe_total",
            Unit::Count,
            "Probes of the forum tables run to decide availability."
        );
    });
}
