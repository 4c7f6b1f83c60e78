/*
 *  display/traits.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Device abstraction for page addressed character LCDs
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

use std::future::Future;

use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_PAGES, DISPLAY_WIDTH, LARGE_FONT_PAGES, LARGE_FONT_WIDTH, SMALL_FONT_WIDTH,
};
use crate::display::error::DisplayError;
use crate::menu::RowStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Two pages high, used for every menu and status line
    Large,
    /// One page high, splash credits
    Small,
}

impl Font {
    pub fn pages(self) -> u8 {
        match self {
            Font::Large => LARGE_FONT_PAGES,
            Font::Small => 1,
        }
    }

    pub fn cell_width(self) -> u32 {
        match self {
            Font::Large => LARGE_FONT_WIDTH,
            Font::Small => SMALL_FONT_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Normal,
    Inverted,
}

impl From<RowStyle> for TextStyle {
    fn from(style: RowStyle) -> Self {
        match style {
            RowStyle::Normal => TextStyle::Normal,
            RowStyle::Inverted => TextStyle::Inverted,
        }
    }
}

/// How the device treats text wider than the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Animation {
    #[default]
    Static,
    /// Scroll continuously, `gap` joining the tail back to the head
    Marquee { gap: &'static str },
}

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub width: u32,
    pub height: u32,
    /// 8 pixel row groups
    pub pages: u8,
    /// Device animates marquee text itself; otherwise the renderer scrolls it
    pub marquee: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self { width: DISPLAY_WIDTH, height: DISPLAY_HEIGHT, pages: DISPLAY_PAGES, marquee: false }
    }
}

impl DeviceCapabilities {
    /// Characters of `font` that fit on one line
    pub fn columns(&self, font: Font) -> usize {
        (self.width / font.cell_width()) as usize
    }
}

/// Write primitives of a page addressed LCD.
///
/// Callers issue `move_cursor` followed by `write_text`; one caller at a time.
pub trait LcdDevice: Send + 'static {
    fn capabilities(&self) -> &DeviceCapabilities;

    fn initialize(&mut self) -> impl Future<Output = Result<(), DisplayError>> + Send;

    fn clear(&mut self) -> impl Future<Output = Result<(), DisplayError>> + Send;

    /// Position the cursor at pixel `column` of row group `page`
    fn move_cursor(&mut self, column: u8, page: u8) -> impl Future<Output = Result<(), DisplayError>> + Send;

    /// Write one line at the cursor, covering `font.pages()` pages
    fn write_text(
        &mut self,
        text: &str,
        font: Font,
        style: TextStyle,
        animation: Animation,
    ) -> impl Future<Output = Result<(), DisplayError>> + Send;

    fn backlight_on(&mut self) -> impl Future<Output = Result<(), DisplayError>> + Send {
        async { Ok(()) }
    }

    fn hardware_reset(&mut self) -> impl Future<Output = Result<(), DisplayError>> + Send {
        async { Ok(()) }
    }
}
