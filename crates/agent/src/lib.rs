//! Deploy Sentinel agent
//!
//! Wires the predictor, alert suppressor and remediation engine into a
//! control loop that watches one deployment until shutdown.

pub mod config;
pub mod probe;

pub use config::{AgentConfig, LoggingConfig, MetricsConfig, CONFIG_PATH_ENV};
pub use probe::SystemMetricsProvider;

use alerting::AlertSuppressor;
use metrics_exporter_prometheus::PrometheusBuilder;
use monitor::{spawn_cleanup, ControlLoop, LogNotificationSink, MonitorError};
use predictor::{PredictorError, TrendPredictor};
use remediation::{RemediationEngine, RemediationError, SystemPrimitives};
use std::sync::Arc;
use std::time::Duration;
use storage::{PatternStore, Repository};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long shutdown waits for in-flight healings
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Agent startup and shutdown errors
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics exporter failed: {0}")]
    Metrics(String),

    #[error("Predictor error: {0}")]
    Predictor(#[from] PredictorError),

    #[error("Remediation error: {0}")]
    Remediation(#[from] RemediationError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Control loop task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Install the global tracing subscriber; `RUST_LOG` wins over the configured level
pub fn init_logging(config: &LoggingConfig) -> Result<(), AgentError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| AgentError::Logging(format!("{}: {}", config.level, e)))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    result.map_err(|e| AgentError::Logging(e.to_string()))
}

/// Serve Prometheus metrics on the configured address
pub fn install_metrics(config: &MetricsConfig) -> Result<(), AgentError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| AgentError::Metrics(e.to_string()))?;
    info!("Metrics exporter listening on {}", config.listen_addr);
    Ok(())
}

/// Run the agent until ctrl-c or SIGTERM
pub async fn run(config: AgentConfig) -> Result<(), AgentError> {
    let store: Arc<dyn PatternStore> = Arc::new(Repository::new());
    let predictor = Arc::new(TrendPredictor::with_store(
        config.predictor.clone(),
        store.clone(),
    )?);
    let suppressor = Arc::new(AlertSuppressor::new(config.suppression.clone()));
    let engine = Arc::new(RemediationEngine::with_store(
        config.remediation.clone(),
        Arc::new(SystemPrimitives::new()?),
        store,
    )?);
    let provider = Arc::new(SystemMetricsProvider::new(
        config.target_url.clone(),
        config.probe_timeout(),
    )?);

    let monitor_config = config.monitor_config();
    let cleanup_interval = monitor_config.cleanup_interval();
    let mut control = ControlLoop::new(
        monitor_config,
        provider,
        Arc::new(LogNotificationSink),
        predictor,
        suppressor.clone(),
        engine.clone(),
    );
    let launcher = control.launcher();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = spawn_cleanup(suppressor.clone(), cleanup_interval, shutdown_rx.clone());
    let control_task = tokio::spawn(async move { control.run(shutdown_rx).await });

    shutdown_signal().await;
    info!("Shutdown signal received");
    // Receivers only disappear once both tasks have already stopped
    let _ = shutdown_tx.send(true);

    control_task.await?;
    cleanup.await?;

    if tokio::time::timeout(DRAIN_TIMEOUT, launcher.wait_idle())
        .await
        .is_err()
    {
        warn!(
            "Abandoning {} in-flight remediation tasks after {:?}",
            launcher.in_flight(),
            DRAIN_TIMEOUT
        );
    }

    let stats = engine.get_healing_stats();
    let summary = suppressor.get_alert_summary();
    info!(
        "Stopped: {} healing attempts ({}% successful), {} alerts in the last 24h",
        stats.total_attempts, stats.success_rate, summary.total_alerts_24h
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
