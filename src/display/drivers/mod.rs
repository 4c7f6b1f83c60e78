/*
 *  display/drivers/mod.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Device drivers and the factory that picks one from configuration
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

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::{Config, ConfigError, DriverKind};
use crate::display::error::DisplayError;
use crate::display::traits::{Animation, DeviceCapabilities, Font, LcdDevice, TextStyle};

pub mod tty;

#[cfg(feature = "hardware")]
pub mod dogs102;

// Mock driver for testing
#[cfg(test)]
pub mod mock;

use tty::TtySimulator;

#[cfg(feature = "hardware")]
use dogs102::{Dogs102, Dogs102Options};

/// Any driver the factory can build
pub enum Device {
    Tty(TtySimulator),
    #[cfg(feature = "hardware")]
    Dogs102(Dogs102),
}

macro_rules! dispatch {
    ($self:ident, $dev:ident => $call:expr) => {
        match $self {
            Device::Tty($dev) => $call,
            #[cfg(feature = "hardware")]
            Device::Dogs102($dev) => $call,
        }
    };
}

impl LcdDevice for Device {
    fn capabilities(&self) -> &DeviceCapabilities {
        dispatch!(self, dev => dev.capabilities())
    }

    async fn initialize(&mut self) -> Result<(), DisplayError> {
        dispatch!(self, dev => dev.initialize().await)
    }

    async fn clear(&mut self) -> Result<(), DisplayError> {
        dispatch!(self, dev => dev.clear().await)
    }

    async fn move_cursor(&mut self, column: u8, page: u8) -> Result<(), DisplayError> {
        dispatch!(self, dev => dev.move_cursor(column, page).await)
    }

    async fn write_text(
        &mut self,
        text: &str,
        font: Font,
        style: TextStyle,
        animation: Animation,
    ) -> Result<(), DisplayError> {
        dispatch!(self, dev => dev.write_text(text, font, style, animation).await)
    }

    async fn backlight_on(&mut self) -> Result<(), DisplayError> {
        dispatch!(self, dev => dev.backlight_on().await)
    }

    async fn hardware_reset(&mut self) -> Result<(), DisplayError> {
        dispatch!(self, dev => dev.hardware_reset().await)
    }
}

impl From<ConfigError> for DisplayError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotConfigured { missing } => DisplayError::NotConfigured { missing },
            other => DisplayError::InitializationFailed(other.to_string()),
        }
    }
}

pub struct DisplayFactory;

impl DisplayFactory {
    /// Open the configured driver. Incomplete wiring fails before any
    /// hardware is touched.
    pub fn create_from_config(config: &Config) -> Result<Device, DisplayError> {
        match config.driver() {
            DriverKind::Tty => {
                info!("Using the TTY display simulator");
                Ok(Device::Tty(TtySimulator::new()))
            }
            #[cfg(feature = "hardware")]
            DriverKind::Dogs102 => {
                let wiring = config.spi_wiring()?;
                let options = Dogs102Options {
                    inverted: config.inverted(),
                    upside_down: config.upside_down(),
                    contrast: config.contrast(),
                };
                Ok(Device::Dogs102(Dogs102::open(&wiring, options)?))
            }
            #[cfg(not(feature = "hardware"))]
            DriverKind::Dogs102 => {
                config.spi_wiring()?;
                Err(DisplayError::InitializationFailed(
                    "DOGS102 driver not enabled. Enable with --features hardware".to_string(),
                ))
            }
        }
    }
}

/// SPI character devices present under `dev`
pub fn spi_devices_in(dev: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = fs::read_dir(dev)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("spidev"))
        .map(|entry| entry.path())
        .collect();
    found.sort();
    Ok(found)
}

pub fn list_spi_devices() -> std::io::Result<Vec<PathBuf>> {
    spi_devices_in(Path::new("/dev"))
}
