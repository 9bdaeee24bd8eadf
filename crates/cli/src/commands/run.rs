//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{SourceConfig, StreamerConfig};
use tracing::info;

use crate::cli::RunArgs;
use crate::pipeline::Pipeline;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        interval_ms = config.effective_tick_interval().as_millis() as u64,
        delivery = ?config.delivery_mode(),
        source = config.source.kind(),
        report_auxiliary = config.report_auxiliary,
        "Configuration resolved"
    );

    // Dry run - print the resolved configuration and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        let rendered = ConfigLoader::to_toml(&config).context("Failed to render configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    let stats = Pipeline::new(config)
        .run()
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames = stats.frames_published(),
        duration_secs = stats.duration.as_secs_f64(),
        cause = %stats.cause,
        "Pipeline completed"
    );
    stats.print_summary();

    Ok(())
}

/// Load the config file (or defaults), apply CLI overrides, then validate
pub fn resolve_config(args: &RunArgs) -> Result<StreamerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => StreamerConfig::default(),
    };

    apply_overrides(&mut config, args);

    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut StreamerConfig, args: &RunArgs) {
    if let Some(interval) = args.interval {
        info!(interval_ms = interval, "Overriding tick interval from CLI");
        config.tick_interval_ms = interval;
    }
    if let Some(port) = args.port {
        info!(port, "Overriding port from CLI");
        config.port = port;
    }
    if let Some(ref bind) = args.bind {
        config.bind_host = bind.clone();
    }
    if args.aux {
        config.report_auxiliary = true;
    }
    if let Some(max) = args.max_connections {
        config.max_connections = Some(max);
    }
    if let Some(port) = args.metrics_port {
        config.metrics_port = Some(port);
    }
    if let Some(ref path) = args.replay {
        info!(path = %path.display(), "Replaying recorded stream");
        config.source = SourceConfig::Replay {
            path: path.clone(),
            loop_playback: !args.replay_once,
        };
    }
}
