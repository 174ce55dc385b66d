//! Telemetry DVR daemon
//!
//! Binds every configured input, starts the ingest thread, and runs the
//! command controller on the main task until a remote `close` arrives.

use anyhow::{Context, Result};
use crossbeam_channel::bounded;

use telemetry_dvr::buffer::create_queues;
use telemetry_dvr::config::AppConfig;
use telemetry_dvr::constants::*;
use telemetry_dvr::controller::CommandController;
use telemetry_dvr::logging;
use telemetry_dvr::network::{IngestLoop, SourceRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading {config_path}"))?;

    let rotator = logging::init(
        config.debug_level,
        LOG_FOLDER,
        LOG_PREFIX,
        LOG_EXTENSION,
        config.rotation_interval(),
    )?;

    tracing::info!("starting telemetry DVR ({} inputs)", config.inputs.len());

    let control_index = config
        .control_source_index()
        .context("no control source configured")?;

    let registry = SourceRegistry::bind(&config)?;
    // outputs stay open for downstream forwarding until the process exits
    let _outputs = registry.outputs;

    let queues = create_queues(config.inputs.len());
    let (command_tx, command_rx) = bounded(COMMAND_CHANNEL_CAPACITY);
    let (stop_tx, stop_rx) = bounded(1);

    let ingest = IngestLoop::new(
        registry.inputs,
        queues.clone(),
        control_index,
        command_tx,
        command_rx.clone(),
        stop_rx,
    );
    let ingest_handle = ingest.spawn().context("spawning ingest thread")?;

    let controller = CommandController::new(command_rx, stop_tx, ingest_handle);
    controller.run(rotator).await?;

    tracing::warn!("telemetry DVR exited");
    Ok(())
}
