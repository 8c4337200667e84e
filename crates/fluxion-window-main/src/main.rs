// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


mod config;
mod scheduler;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use fluxion_window_core::{LocalZone, WindowSensor};
use fluxion_window_ha::{
    HaPriceAttributeSource, HaTemplateRenderer, HaWindowPublisher, HomeAssistantClient,
};
use scheduler::{ScheduleConfig, run_window};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("FluxION Price Window - cheapest electricity window finder");
                println!("Version: {VERSION}");
                println!();
                println!("Usage: fluxion-window [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{VERSION}");
                return Ok(());
            }
            _ => {}
        }
    }

    let (config, config_source) = AppConfig::load()?;

    // RUST_LOG wins over the configured log level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.system.log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")?;

    info!("🚀 Starting FluxION Price Window {}", VERSION);
    info!("✅ Loaded configuration from {}", config_source);
    info!("📋 Configuration Summary:");
    info!("   Windows: {}", config.windows.len());
    for window in &config.windows {
        info!(
            "     - {} -> {} (source {}, forecast {})",
            window.name,
            window.entity_id(),
            window.source_entity,
            window.forecast_entity.as_deref().unwrap_or("none")
        );
    }
    info!(
        "   Update interval: {}s, watch interval: {}s",
        config.system.update_interval_secs, config.system.watch_interval_secs
    );

    // Initialize Home Assistant client
    let ha_client = if std::env::var("SUPERVISOR_TOKEN").is_ok() {
        info!("🏠 Initializing HA client using Supervisor API...");
        Arc::new(HomeAssistantClient::from_supervisor()?)
    } else {
        info!("🏠 Initializing HA client from configuration...");
        Arc::new(HomeAssistantClient::from_config(
            config.system.ha_base_url.clone(),
            config.system.ha_token.clone(),
        )?)
    };

    if !ha_client.ping().await? {
        warn!(
            "⚠️ Home Assistant API at {} is not reachable yet, windows will retry on every tick",
            ha_client.base_url()
        );
    }

    let zone = resolve_zone(&ha_client, config.system.timezone.as_deref()).await;

    let source = Arc::new(HaPriceAttributeSource::new(ha_client.clone()));
    let renderer = Arc::new(HaTemplateRenderer::new(ha_client.clone()));
    let publisher = Arc::new(HaWindowPublisher::new(ha_client.clone()));
    let schedule = ScheduleConfig {
        update_interval: config.system.update_interval(),
        watch_interval: config.system.watch_interval(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::with_capacity(config.windows.len());
    for window in config.windows {
        let sensor = Arc::new(WindowSensor::new(
            window,
            zone,
            source.clone(),
            renderer.clone(),
            publisher.clone(),
        ));
        tasks.push(tokio::spawn(run_window(
            sensor,
            zone,
            schedule,
            shutdown_rx.clone(),
        )));
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    // Receivers may already be gone if every task ended
    let _ = shutdown_tx.send(true);

    for task in tasks {
        if let Err(e) = task.await {
            error!("Window task failed: {}", e);
        }
    }

    info!("Shutting down");
    Ok(())
}

/// Home Assistant timezone, then the configured fallback, then UTC
async fn resolve_zone(client: &HomeAssistantClient, fallback: Option<&str>) -> LocalZone {
    match client.get_timezone().await {
        Ok(name) => match LocalZone::from_name(&name) {
            Some(zone) => {
                info!("🌍 Using Home Assistant timezone: {}", name);
                return zone;
            }
            None => warn!("⚠️ Unknown timezone from Home Assistant: {}", name),
        },
        Err(e) => warn!("⚠️ Failed to fetch timezone from HA: {}", e),
    }

    if let Some(name) = fallback {
        if let Some(zone) = LocalZone::from_name(name) {
            info!("🌍 Using configured timezone: {}", name);
            return zone;
        }
        warn!("⚠️ Unknown configured timezone: {}", name);
    }

    warn!("⚠️ Falling back to UTC, window times will be in UTC");
    LocalZone::default()
}
