/*
 *  display/drivers/dogs102.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  EA DOGS102 (UC1701X) over spidev with sysfs GPIO for CD, RST and
 *  the optional backlight
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

use std::time::Duration;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{SpidevDevice, SysfsPin};
use log::{debug, info};

use crate::config::SpiWiring;
use crate::display::error::DisplayError;
use crate::display::strip::PageStrip;
use crate::display::traits::{Animation, DeviceCapabilities, Font, LcdDevice, TextStyle};

// UC1701X command set
const CMD_DISPLAY_ON: u8 = 0xAF;
const CMD_START_LINE: u8 = 0x40;
const CMD_PAGE_ADDRESS: u8 = 0xB0;
const CMD_COLUMN_HIGH: u8 = 0x10;
const CMD_COLUMN_LOW: u8 = 0x00;
const CMD_SEG_NORMAL: u8 = 0xA0;
const CMD_SEG_REVERSE: u8 = 0xA1;
const CMD_COM_NORMAL: u8 = 0xC0;
const CMD_COM_REVERSE: u8 = 0xC8;
const CMD_ALL_PIXELS_OFF: u8 = 0xA4;
const CMD_INVERSE_OFF: u8 = 0xA6;
const CMD_INVERSE_ON: u8 = 0xA7;
const CMD_BIAS_1_9: u8 = 0xA2;
const CMD_POWER_ALL_ON: u8 = 0x2F;
const CMD_RESISTOR_RATIO: u8 = 0x27;
const CMD_VOLUME: u8 = 0x81;
const CMD_ADV_CONTROL: u8 = 0xFA;
const ADV_TEMP_COMP: u8 = 0x90;

/// RAM column of the first visible pixel in top view
const TOP_VIEW_COLUMN_OFFSET: u8 = 30;

#[derive(Debug, Clone, Copy, Default)]
pub struct Dogs102Options {
    pub inverted: bool,
    pub upside_down: bool,
    pub contrast: u8,
}

fn output_pin(number: u64, initial: u8) -> Result<SysfsPin, DisplayError> {
    let pin = SysfsPin::new(number);
    pin.export()
        .map_err(|e| DisplayError::Gpio(format!("export gpio{}: {}", number, e)))?;
    pin.set_direction(if initial == 0 { Direction::Low } else { Direction::High })
        .map_err(|e| DisplayError::Gpio(format!("gpio{} direction: {}", number, e)))?;
    Ok(pin)
}

pub struct Dogs102 {
    capabilities: DeviceCapabilities,
    spi: SpidevDevice,
    cd: SysfsPin,
    rst: SysfsPin,
    backlight: Option<SysfsPin>,
    options: Dogs102Options,
    cursor: (u8, u8),
}

impl Dogs102 {
    pub fn open(wiring: &SpiWiring, options: Dogs102Options) -> Result<Self, DisplayError> {
        info!("Opening DOGS102 on {} at {} Hz", wiring.bus, wiring.speed_hz);
        let mut spi = SpidevDevice::open(&wiring.bus)
            .map_err(|e| DisplayError::Spi(format!("open {}: {:?}", wiring.bus, e)))?;
        let spi_options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(wiring.speed_hz)
            .mode(SpiModeFlags::SPI_MODE_3)
            .build();
        spi.0.configure(&spi_options)
            .map_err(|e| DisplayError::Spi(format!("configure {}: {}", wiring.bus, e)))?;

        let cd = output_pin(wiring.cd_pin, 0)?;
        let rst = output_pin(wiring.rst_pin, 1)?;
        let backlight = wiring.backlight_pin.map(|pin| output_pin(pin, 0)).transpose()?;

        Ok(Self {
            capabilities: DeviceCapabilities::default(),
            spi,
            cd,
            rst,
            backlight,
            options,
            cursor: (0, 0),
        })
    }

    fn command(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.cd.set_low()?;
        self.spi.write(bytes)?;
        Ok(())
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.cd.set_high()?;
        self.spi.write(bytes)?;
        Ok(())
    }

    fn address(&mut self, column: u8, page: u8) -> Result<(), DisplayError> {
        let column = column + if self.options.upside_down { TOP_VIEW_COLUMN_OFFSET } else { 0 };
        self.command(&[
            CMD_PAGE_ADDRESS | (page & 0x0F),
            CMD_COLUMN_HIGH | (column >> 4),
            CMD_COLUMN_LOW | (column & 0x0F),
        ])
    }
}

impl LcdDevice for Dogs102 {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    async fn initialize(&mut self) -> Result<(), DisplayError> {
        let (seg, com) = if self.options.upside_down {
            (CMD_SEG_NORMAL, CMD_COM_REVERSE)
        } else {
            (CMD_SEG_REVERSE, CMD_COM_NORMAL)
        };
        let inverse = if self.options.inverted { CMD_INVERSE_ON } else { CMD_INVERSE_OFF };
        self.command(&[
            CMD_START_LINE,
            seg,
            com,
            CMD_ALL_PIXELS_OFF,
            inverse,
            CMD_BIAS_1_9,
            CMD_POWER_ALL_ON,
            CMD_RESISTOR_RATIO,
            CMD_VOLUME,
            self.options.contrast & 0x3F,
            CMD_ADV_CONTROL,
            ADV_TEMP_COMP,
            CMD_DISPLAY_ON,
        ])?;
        debug!("DOGS102 initialised (contrast {})", self.options.contrast);
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = vec![0u8; self.capabilities.width as usize];
        for page in 0..self.capabilities.pages {
            self.address(0, page)?;
            self.data(&blank)?;
        }
        self.cursor = (0, 0);
        Ok(())
    }

    async fn move_cursor(&mut self, column: u8, page: u8) -> Result<(), DisplayError> {
        if page >= self.capabilities.pages || u32::from(column) >= self.capabilities.width {
            return Err(DisplayError::InvalidPosition { column, page });
        }
        self.cursor = (column, page);
        Ok(())
    }

    /// Draws what fits from the cursor on; marquee lines are stepped by the renderer
    async fn write_text(
        &mut self,
        text: &str,
        font: Font,
        style: TextStyle,
        _animation: Animation,
    ) -> Result<(), DisplayError> {
        let (column, page) = self.cursor;
        let pages = font.pages().min(self.capabilities.pages - page);
        let mut strip = PageStrip::new(self.capabilities.width - u32::from(column), pages);
        strip.render(text, font, style);
        for offset in 0..strip.pages() {
            self.address(column, page + offset as u8)?;
            self.data(&strip.page_bytes(offset))?;
        }
        Ok(())
    }

    async fn backlight_on(&mut self) -> Result<(), DisplayError> {
        if let Some(pin) = self.backlight.as_mut() {
            pin.set_high()?;
        }
        Ok(())
    }

    async fn hardware_reset(&mut self) -> Result<(), DisplayError> {
        self.rst.set_low()?;
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.rst.set_high()?;
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(())
    }
}
