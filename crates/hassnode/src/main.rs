use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hassnode::config::LoggingConfig;
use hassnode::Config;
use hassnode::MqttClient;
use hassnode::Node;
use hassnode::NodeOptions;
use hassnode::RumqttcClient;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Expose this machine to Home Assistant via MQTT discovery
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "hassnode.toml")]
    config: PathBuf,
}

fn init_tracing(logging: &LoggingConfig) {
    let targets = logging
        .overrides
        .iter()
        .fold(
            Targets::new().with_default(LevelFilter::from(logging.level)),
            |targets, (target, level)| targets.with_target(target.clone(), LevelFilter::from(*level)),
        );

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(targets)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    init_tracing(&config.logging);

    let node_id = config.node.resolved_id();
    let client_id = config
        .mqtt
        .client_id
        .clone()
        .unwrap_or_else(|| format!("hassnode-{node_id}"));

    tracing::info!("hassnode starting");
    tracing::info!("Loaded config from: {}", args.config.display());
    tracing::info!(
        "Node {} connecting to {}:{} as {}",
        node_id,
        config.mqtt.broker,
        config.mqtt.port,
        client_id
    );

    let client = Arc::new(RumqttcClient::new(&config.mqtt, &client_id));
    client.connect().await.context("connecting to MQTT broker")?;

    let mut device = config.node.device.clone();
    if device.name.is_none() {
        device.name = Some(node_id.clone());
    }

    let node = Node::with_options(
        node_id,
        client.clone(),
        device,
        NodeOptions {
            discovery_prefix: config.node.discovery_prefix.clone(),
            retain_discovery: config.node.retain_discovery,
        },
    );

    for entity_config in &config.entities {
        let entity = entity_config.build();
        match node.add_entity(&entity).await {
            Ok(()) => tracing::info!("Added entity {}", entity.id()),
            Err(e) if e.is_structural() => {
                return Err(e).with_context(|| format!("adding entity {}", entity.id()));
            }
            // Not fatal: state is republished every interval.
            Err(e) => tracing::warn!("Entity {} added with errors: {}", entity.id(), e),
        }
    }

    tracing::info!("{} entities announced, entering main loop", node.len().await);
    tracing::info!("Press Ctrl+C to exit");

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.node.publish_interval_secs));
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = node.publish_state_all().await {
                    tracing::warn!("Periodic state publication: {}", e);
                }
            }
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("Received shutdown signal"),
                    Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
                }
                break;
            }
        }
    }

    tracing::info!("Withdrawing entities...");
    if let Err(e) = node.shutdown().await {
        tracing::error!("Error withdrawing entities: {}", e);
    }

    if let Err(e) = client.disconnect().await {
        tracing::error!("Error disconnecting from MQTT broker: {}", e);
    }

    tracing::info!("hassnode shutdown complete");

    Ok(())
}
