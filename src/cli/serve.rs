//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::watcher::DEFAULT_DEBOUNCE;
use crate::config::{
    ConfigSnapshot, ConfigSource, ConfigStore, ConfigWatcher, LogFormat, LogLevel, LoggingConfig,
    MetricsConfig, ServerConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Process-level settings: the snapshot's values with CLI overrides applied.
///
/// These are read once at startup. A reload that changes them only logs a
/// warning.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeSettings {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
    pub debug: bool,
    pub watch: bool,
}

impl ServeSettings {
    pub fn resolve(
        args: &ServeArgs,
        snapshot: &ConfigSnapshot,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = snapshot.config();
        let mut settings = Self {
            server: config.server.clone(),
            metrics: config.metrics.clone(),
            logging: config.logging.clone(),
            debug: config.debug,
            watch: config.reload_config_on_change && !args.no_watch,
        };

        // CLI overrides (highest priority)
        if let Some(port) = args.port {
            settings.server.port = port;
        }
        if let Some(ref host) = args.host {
            settings.server.host = host.clone();
        }
        if let Some(ref level) = args.log_level {
            settings.logging.level = level.parse::<LogLevel>()?;
        }

        Ok(settings)
    }
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &LoggingConfig, debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config, debug);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Reload callback that flags settings which only take effect on restart.
pub fn restart_notice(
    server: ServerConfig,
    metrics: MetricsConfig,
) -> impl Fn(&Arc<ConfigSnapshot>) + Send + Sync + 'static {
    move |snapshot| {
        let config = snapshot.config();
        if config.server != server {
            tracing::warn!(
                version = snapshot.version(),
                "[server] changed on reload; restart ccproxy to apply"
            );
        }
        if config.metrics != metrics {
            tracing::warn!(
                version = snapshot.version(),
                "[metrics] changed on reload; restart ccproxy to apply"
            );
        }
    }
}

/// Start the config watcher. A watch backend that cannot be created is
/// logged, not fatal.
fn start_watcher(store: &Arc<ConfigStore>, source: &ConfigSource) -> Option<ConfigWatcher> {
    let path = source.path()?;
    match ConfigWatcher::start(Arc::clone(store), path.to_path_buf(), DEFAULT_DEBOUNCE) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    }
}

/// Install the Prometheus recorder and serve it on its own port.
async fn start_metrics(
    settings: &ServeSettings,
    cancel: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>, Box<dyn std::error::Error>> {
    let handle = crate::metrics::setup_metrics().map_err(|e| e.to_string())?;
    let addr = tokio::net::lookup_host((settings.server.host.as_str(), settings.metrics.port))
        .await?
        .next()
        .ok_or_else(|| format!("cannot resolve metrics host {}", settings.server.host))?;

    Ok(tokio::spawn(async move {
        if let Err(e) = crate::metrics::serve_metrics(addr, handle, cancel).await {
            tracing::error!(error = %e, "Metrics exporter failed");
        }
    }))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load the initial snapshot (missing file keeps defaults)
    let source = ConfigSource::resolve(args.config.config.as_deref());
    let store = Arc::new(ConfigStore::initialize(&source)?);
    let snapshot = store.current();
    let settings = ServeSettings::resolve(&args, &snapshot)?;

    // 2. Initialize tracing
    init_tracing(&settings.logging, settings.debug)?;

    tracing::info!(
        source = %source,
        version = snapshot.version(),
        rules = snapshot.rules().len(),
        context_threshold = snapshot.context_threshold(),
        "Starting ccproxy"
    );

    store.subscribe(restart_notice(
        snapshot.config().server.clone(),
        snapshot.config().metrics.clone(),
    ));

    // 3. Metrics exporter (if enabled)
    let cancel_token = CancellationToken::new();
    let metrics_handle = if settings.metrics.enabled {
        Some(start_metrics(&settings, cancel_token.clone()).await?)
    } else {
        tracing::debug!("Metrics exporter disabled");
        None
    };

    // 4. Hot reload (if enabled)
    let watcher = if settings.watch {
        start_watcher(&store, &source)
    } else {
        tracing::info!("Config hot reload disabled");
        None
    };

    // 5. Bind and serve
    let state = Arc::new(AppState::new(Arc::clone(&store), source));
    let app = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "ccproxy API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    // 6. Cleanup
    cancel_token.cancel();
    if let Some(watcher) = watcher {
        watcher.stop().await;
    }
    if let Some(handle) = metrics_handle {
        handle.await?;
    }

    tracing::info!("ccproxy stopped");
    Ok(())
}
