//! Tracing and Sentry initialization.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::StorefrontConfig;

/// Initialize Sentry error tracking and return a guard that must be kept
/// alive for the lifetime of the process. Returns `None` when no DSN is
/// configured.
pub fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        _ => sentry_tracing::EventFilter::Breadcrumb,
    }
}

/// Install the global tracing subscriber: env-filtered fmt output plus a
/// Sentry layer that turns warnings and errors into events.
///
/// Call once at startup, after [`init_sentry`].
pub fn init_tracing() {
    let sentry_layer = sentry_tracing::layer().event_filter(sentry_event_filter);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();
}
