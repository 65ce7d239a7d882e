pub mod config;
pub mod error;
pub mod mqtt;
pub mod telemetry;

use crate::config::Config;
use crate::mqtt::message_manager::LogHandler;
use crate::mqtt::mqtt_handler::DeviceHandle;
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let path = Config::default_path()?;
    info!("Loading device configuration from {}", path.display());
    let config = Config::load_or_init(&path).await?;

    let device = DeviceHandle::spawn(&config, LogHandler).await?;

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, stopping device");
    device.shutdown().await;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
