/*
 *  main.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Binary entry - CLI, logging, display bring-up and the event loop
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use eadog_lcd::config::{self, Cli};
use eadog_lcd::display::{DisplayError, DisplayFactory, list_spi_devices, splash_lines};
use eadog_lcd::protocol::LineBridge;
use eadog_lcd::runtime::{Controller, EVENT_QUEUE_DEPTH, RuntimeSettings};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn print_spi_devices() -> anyhow::Result<()> {
    let devices = list_spi_devices().context("reading /dev")?;
    if devices.is_empty() {
        println!("no SPI devices found, is SPI enabled?");
    }
    for device in devices {
        println!("{}", device.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.list_spi {
        return print_spi_devices();
    }

    let config = config::load(&cli)?;
    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter()))
        .format_timestamp_secs()
        .init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let device = match DisplayFactory::create_from_config(&config) {
        Ok(device) => device,
        Err(DisplayError::NotConfigured { missing }) => {
            error!("display not configured, missing {}", missing.join(", "));
            match list_spi_devices() {
                Ok(devices) => info!("SPI devices: {:?}", devices),
                Err(e) => warn!("SPI devices unavailable: {}", e),
            }
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("opening display"),
    };

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let settings = RuntimeSettings::from_config(
        &config,
        splash_lines(env!("CARGO_PKG_VERSION"), BUILD_DATE),
    );
    let mut controller = Controller::new(device, LineBridge, settings, tx.clone());
    controller.start().await.context("starting display")?;

    let input = tokio::spawn(async move {
        if let Err(e) = LineBridge::pump(BufReader::new(tokio::io::stdin()), tx).await {
            warn!("Input bridge stopped: {}", e);
        }
    });

    controller.run(rx, async {
        if let Err(e) = signal_handler().await {
            error!("Signal handler failed: {}", e);
        }
    }).await.context("stopping display")?;

    input.abort();
    info!("Bye");
    Ok(())
}
