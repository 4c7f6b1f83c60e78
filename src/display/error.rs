/*
 *  display/error.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the display subsystem
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

use thiserror::Error;

/// Unified error type for all display operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Hardware initialization failed
    #[error("display initialization failed: {0}")]
    InitializationFailed(String),

    #[error("SPI communication error: {0}")]
    Spi(String),

    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Cursor outside the addressable area
    #[error("cursor ({column}, page {page}) is off the display")]
    InvalidPosition { column: u8, page: u8 },

    #[error("drawing error: {0}")]
    Drawing(String),

    /// Driver selected but its wiring is incomplete
    #[error("display not configured, missing {}", .missing.join(", "))]
    NotConfigured { missing: Vec<String> },

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "hardware")]
impl From<linux_embedded_hal::SPIError> for DisplayError {
    fn from(err: linux_embedded_hal::SPIError) -> Self {
        DisplayError::Spi(format!("{:?}", err))
    }
}

#[cfg(feature = "hardware")]
impl From<linux_embedded_hal::SysfsPinError> for DisplayError {
    fn from(err: linux_embedded_hal::SysfsPinError) -> Self {
        DisplayError::Gpio(format!("{:?}", err))
    }
}
