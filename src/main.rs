use std::io;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use wifimanager_compat::config::{self, CliArgs, Config};
use wifimanager_compat::host::LegacyService;
use wifimanager_compat::network::DbusConnector;
use wifimanager_compat::{Lifecycle, WifiManagerAdapter};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = CliArgs::parse();
    if cli.print_default_config {
        print!("{}", config::default_config_toml());
        return Ok(());
    }

    let config = config::load(&cli)?;

    // Held until exit so buffered log lines get flushed
    let _log_guard = init_logging(&config)?;

    info!("wifimanager-compat starting");

    let connector = DbusConnector::new(
        config.backend.service.clone(),
        config.backend.path.clone(),
        config.call_timeout(),
    );
    let adapter = Arc::new(WifiManagerAdapter::new(
        Arc::new(connector),
        config.adapter_settings(),
    ));
    adapter.initialize().await?;

    let connection = zbus::connection::Builder::system()?
        .name(config.host.service.clone())?
        .serve_at(config.host.path.clone(), LegacyService::new(adapter.clone()))?
        .build()
        .await
        .wrap_err_with(|| format!("Failed to claim {} on the system bus", config.host.service))?;

    info!(
        "Serving legacy WiFiManager API as {} at {}",
        config.host.service, config.host.path
    );

    wait_for_shutdown().await?;

    info!("Shutting down");
    let service = connection
        .object_server()
        .interface::<_, LegacyService>(config.host.path.as_str())
        .await?;
    service.get().await.close().await;
    adapter.deinitialize().await;

    info!("wifimanager-compat exiting");
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = term.recv() => {}
    }
    Ok(())
}

/// Initialize tracing to stderr or, when configured, to a log file
fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    if let Some(path) = config.log_file() {
        let file = std::fs::File::create(path)
            .wrap_err_with(|| format!("Failed to create log file {}", path))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        Ok(None)
    }
}
