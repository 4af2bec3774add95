use std::{env, sync::Arc, time::Duration};

use mealgram_auth::ReplayGuard;
use mealgram_auth::middleware::AuthState;
use mealgram_cache::CacheService;
use mealgram_db_postgres::PostgresStorage;
use mealgram_server::{AppState, load_config, observability, routes};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From MEALGRAM_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (mealgram.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (MEALGRAM_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    observability::init_tracing();

    let (config_path, source) = resolve_config_path();
    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );
    observability::apply_logging_level(&cfg.logging.level);

    let storage = match PostgresStorage::connect(&cfg.storage.postgres.connection_url()).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Database connection failed: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = storage.init_schema().await {
        eprintln!("Schema initialization failed: {e}");
        std::process::exit(2);
    }

    let replay = Arc::new(ReplayGuard::new());
    replay.spawn_sweep(Duration::from_secs(cfg.telegram.replay_sweep_interval_secs));
    let auth = AuthState::new(
        cfg.telegram.bot_token.as_str(),
        Arc::clone(&replay),
        Arc::new(storage.users()),
    )
    .with_expose_error_detail(cfg.expose_error_detail());

    let cache = Arc::new(CacheService::new(Arc::new(storage.cache())));
    cache.spawn_cleanup(Duration::from_secs(cfg.cache.cleanup_interval_secs));

    let addr = cfg.addr();
    let state = AppState {
        config: Arc::new(cfg),
        auth,
        cache,
        estimator: Arc::new(mealgram_server::estimator::HeuristicEstimator),
    };
    let app = routes::router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(2);
        }
    };
    tracing::info!(%addr, "Server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
    }
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: MEALGRAM_CONFIG
/// 3. Default: mealgram.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("MEALGRAM_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    ("mealgram.toml".to_string(), ConfigSource::Default)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
