use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{
    BuildError as PrometheusBuildError, PrometheusBuilder, PrometheusHandle,
};
use std::{
    sync::{Mutex, OnceLock},
    time::Instant,
};
use thiserror::Error;
use tracing_subscriber::{
    fmt::{self as tracing_fmt, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use timetrack_util::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
    #[error("failed to initialize prometheus recorder: {0}")]
    Metrics(#[from] PrometheusBuildError),
    #[error("metrics install guard poisoned")]
    Poisoned,
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static METRICS_INSTALL_GUARD: OnceLock<Mutex<()>> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_git_sha() -> &'static str {
    option_env!("GIT_SHA").unwrap_or("unknown")
}

pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryError> {
    if TRACING_INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match config.environment {
        Environment::Development | Environment::Test => {
            let fmt_layer = tracing_fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_timer(UtcTime::rfc_3339())
                .event_format(tracing_fmt::format().pretty());

            tracing_subscriber::registry()
                .with(env_filter.clone())
                .with(fmt_layer)
                .try_init()
                .map_err(TelemetryError::Tracing)?;
        }
        Environment::Production => {
            let fmt_layer = tracing_fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_timer(UtcTime::rfc_3339())
                .json();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
                .map_err(TelemetryError::Tracing)?;
        }
    }

    TRACING_INIT.set(()).ok();
    tracing::info!(stage = "app", env = %config.environment.as_str(), version = BUILD_VERSION, git_sha = build_git_sha(), "tracing initialized");
    Ok(())
}

pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let guard = METRICS_INSTALL_GUARD
        .get_or_init(|| Mutex::new(()))
        .lock()
        .map_err(|_| TelemetryError::Poisoned)?;

    if let Some(handle) = METRICS_HANDLE.get() {
        drop(guard);
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    METRICS_HANDLE.set(handle.clone()).ok();
    drop(guard);

    describe_gauge!("app_build_info", "Build metadata for the running binary");
    describe_gauge!("app_uptime_seconds", "Seconds since the process started");
    describe_counter!(
        "bus_messages_total",
        "Count of commands and queries dispatched, labelled by bus, message name and result"
    );
    describe_histogram!(
        "bus_handler_duration_seconds",
        "Time spent in command and query handlers in seconds, labelled by bus and message name"
    );
    describe_counter!(
        "auth_failures_total",
        "Count of requests rejected by the bearer token guard, labelled by reason"
    );
    START_TIME.get_or_init(Instant::now);

    Ok(handle)
}

pub fn render_metrics(handle: &PrometheusHandle) -> String {
    let mut body = handle.render();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }

    body.push_str("# TYPE app_build_info gauge\n");
    body.push_str(&format!(
        "app_build_info{{version=\"{}\",git=\"{}\"}} 1\n",
        BUILD_VERSION,
        build_git_sha()
    ));

    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs_f64())
        .unwrap_or_default();
    body.push_str("# TYPE app_uptime_seconds gauge\n");
    body.push_str(&format!("app_uptime_seconds {}\n", uptime));

    body
}
