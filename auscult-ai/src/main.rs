//! auscult-ai - heart and lung sound classification service
//!
//! Serves an upload page and `POST /predict`, which turns a recording into
//! MFCC features and classifies it with a random forest and a CNN-LSTM
//! network loaded once at startup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use auscult_common::config::{
    config_file_path, ensure_directory, ConfigOverrides, ServiceConfig, TomlConfig,
};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auscult_ai::models::ModelSet;
use auscult_ai::{build_router, AppState};

/// Command-line arguments for auscult-ai
#[derive(Parser, Debug)]
#[command(name = "auscult-ai")]
#[command(about = "Heart and lung sound classification service")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to <config dir>/auscult/auscult.toml)
    #[arg(short, long, env = "AUSCULT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "AUSCULT_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "AUSCULT_PORT")]
    port: Option<u16>,

    /// Directory holding the model artifacts
    #[arg(long, env = "AUSCULT_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Directory for temporary uploads
    #[arg(long, env = "AUSCULT_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Request body limit in bytes
    #[arg(long, env = "AUSCULT_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "AUSCULT_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            models_dir: self.models_dir.clone(),
            upload_dir: self.upload_dir.clone(),
            max_upload_bytes: self.max_upload_bytes,
            log_level: self.log_level.clone(),
        }
    }
}

/// Outcome of looking for the TOML file, logged once tracing is up
enum TomlOutcome {
    Loaded(PathBuf),
    Missing(Option<PathBuf>),
    Invalid(auscult_common::Error),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI > environment (both via clap) > TOML > defaults
    let overrides = args.overrides();
    let (toml, toml_outcome) = match config_file_path(args.config.as_deref()) {
        Some(path) => match TomlConfig::load_optional(&path) {
            Ok(Some(toml)) => (toml, TomlOutcome::Loaded(path)),
            Ok(None) => (TomlConfig::default(), TomlOutcome::Missing(Some(path))),
            Err(e) => (TomlConfig::default(), TomlOutcome::Invalid(e)),
        },
        None => (TomlConfig::default(), TomlOutcome::Missing(None)),
    };
    let config = ServiceConfig::resolve(overrides, &toml);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow artifact loading
    info!(
        "Starting auscult-ai v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match toml_outcome {
        TomlOutcome::Loaded(path) => info!("Config file: {}", path.display()),
        TomlOutcome::Missing(Some(path)) => {
            warn!("Config file {} not found, using defaults", path.display())
        }
        TomlOutcome::Missing(None) => warn!("No config directory available, using defaults"),
        TomlOutcome::Invalid(e) => error!("Ignoring invalid config file: {}", e),
    }

    ensure_directory(&config.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.upload_dir.display()
        )
    })?;
    info!("Upload directory: {}", config.upload_dir.display());

    if let Err(e) = ensure_directory(&config.models_dir) {
        warn!(
            "Could not create models directory {}: {}",
            config.models_dir.display(),
            e
        );
    }
    info!("Models directory: {}", config.models_dir.display());

    let models = ModelSet::load(&config.models_dir);
    let status = models.status();
    if status.all_loaded() {
        info!("✓ All model artifacts loaded");
    } else {
        warn!(
            random_forest = status.random_forest,
            cnn_lstm = status.cnn_lstm,
            label_encoder = status.label_encoder,
            feature_scaler = status.feature_scaler,
            "Some model artifacts failed to load; predictions will fail until they are fixed"
        );
    }

    let state = AppState::new(models, config.upload_dir.clone())
        .with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ENV_VARS: [&str; 7] = [
        "AUSCULT_CONFIG",
        "AUSCULT_HOST",
        "AUSCULT_PORT",
        "AUSCULT_MODELS_DIR",
        "AUSCULT_UPLOAD_DIR",
        "AUSCULT_MAX_UPLOAD_BYTES",
        "AUSCULT_LOG_LEVEL",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_no_arguments_leaves_every_tier_unset() {
        clear_env();

        let args = Args::try_parse_from(["auscult-ai"]).unwrap();
        let overrides = args.overrides();

        assert!(args.config.is_none());
        assert!(overrides.host.is_none());
        assert!(overrides.port.is_none());
        assert!(overrides.models_dir.is_none());
        assert!(overrides.max_upload_bytes.is_none());
    }

    #[test]
    #[serial]
    fn test_environment_fills_unset_arguments() {
        clear_env();
        env::set_var("AUSCULT_PORT", "7001");
        env::set_var("AUSCULT_MODELS_DIR", "/tmp/auscult-env-models");
        env::set_var("AUSCULT_CONFIG", "/tmp/from-env.toml");

        let args = Args::try_parse_from(["auscult-ai"]).unwrap();
        let overrides = args.overrides();

        assert_eq!(overrides.port, Some(7001));
        assert_eq!(
            overrides.models_dir,
            Some(PathBuf::from("/tmp/auscult-env-models"))
        );
        assert_eq!(args.config, Some(PathBuf::from("/tmp/from-env.toml")));
        assert!(overrides.host.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_command_line_beats_environment() {
        clear_env();
        env::set_var("AUSCULT_PORT", "7001");
        env::set_var("AUSCULT_LOG_LEVEL", "debug");

        let args =
            Args::try_parse_from(["auscult-ai", "--port", "8000", "--log-level", "warn"]).unwrap();
        let overrides = args.overrides();

        assert_eq!(overrides.port, Some(8000));
        assert_eq!(overrides.log_level.as_deref(), Some("warn"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_environment_number_is_rejected() {
        clear_env();
        env::set_var("AUSCULT_MAX_UPLOAD_BYTES", "lots");

        assert!(Args::try_parse_from(["auscult-ai"]).is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_environment_overrides_toml() {
        clear_env();
        env::set_var("AUSCULT_PORT", "7001");

        let args = Args::try_parse_from(["auscult-ai"]).unwrap();
        let toml = TomlConfig::parse("port = 8080\nhost = \"0.0.0.0\"").unwrap();
        let config = ServiceConfig::resolve(args.overrides(), &toml);

        assert_eq!(config.bind_address(), "0.0.0.0:7001");

        clear_env();
    }
}
