mod config;

use clap::Parser;
use config::{Config, ConfigError};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Cross-source sneaker market aggregation service")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, short)]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum RadarError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] catalog::errors::CatalogError),
    #[error("could not install metrics exporter: {0}")]
    Metrics(String),
}

fn init_metrics(config: &Config) -> Result<(), RadarError> {
    let Some(metrics_config) = &config.common.metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(&metrics_config.statsd_host, metrics_config.statsd_port)
        .build(Some("radar"))
        .map_err(|e| RadarError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| RadarError::Metrics(e.to_string()))?;
    Ok(())
}

fn main() -> Result<(), RadarError> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;
    config.catalog.validate().map_err(ConfigError::from)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Keep the guard alive for the lifetime of the process
    let _sentry_guard = config.common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    init_metrics(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| RadarError::Config(ConfigError::LoadError(e)))?;

    runtime.block_on(catalog::run(config.catalog))?;
    Ok(())
}
