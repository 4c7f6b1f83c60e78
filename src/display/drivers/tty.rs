/*
 *  display/drivers/tty.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Terminal stand-in for the LCD, for hosts without the panel
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

use log::info;

use crate::display::error::DisplayError;
use crate::display::traits::{Animation, DeviceCapabilities, Font, LcdDevice, TextStyle};

/// Keeps a text image of the panel, one entry per page, and logs each line written
#[derive(Debug)]
pub struct TtySimulator {
    capabilities: DeviceCapabilities,
    pages: Vec<String>,
    cursor: (u8, u8),
    initialized: bool,
}

impl Default for TtySimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TtySimulator {
    pub fn new() -> Self {
        let capabilities = DeviceCapabilities { marquee: true, ..DeviceCapabilities::default() };
        let pages = vec![String::new(); capabilities.pages as usize];
        Self { capabilities, pages, cursor: (0, 0), initialized: false }
    }

    /// Text currently shown on each page
    pub fn screen(&self) -> &[String] {
        &self.pages
    }

    fn decorate(text: &str, style: TextStyle, animation: Animation) -> String {
        let text = match style {
            TextStyle::Normal => text.to_string(),
            TextStyle::Inverted => format!("[{}]", text.trim_end()),
        };
        match animation {
            Animation::Static => text,
            Animation::Marquee { gap } => format!("{}{}~", text, gap),
        }
    }
}

impl LcdDevice for TtySimulator {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    async fn initialize(&mut self) -> Result<(), DisplayError> {
        info!("TTY display simulator {}x{} ({} pages)",
            self.capabilities.width, self.capabilities.height, self.capabilities.pages);
        self.initialized = true;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), DisplayError> {
        self.pages.iter_mut().for_each(String::clear);
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

    async fn write_text(
        &mut self,
        text: &str,
        font: Font,
        style: TextStyle,
        animation: Animation,
    ) -> Result<(), DisplayError> {
        if !self.initialized {
            return Err(DisplayError::InitializationFailed("write before initialize".into()));
        }
        let (column, page) = self.cursor;
        let columns = self.capabilities.columns(font).saturating_sub(usize::from(column) / font.cell_width() as usize);
        let visible: String = match animation {
            Animation::Static => text.chars().take(columns).collect(),
            Animation::Marquee { .. } => text.to_string(),
        };

        let first = usize::from(page);
        let last = (first + usize::from(font.pages())).min(self.pages.len());
        for line in &mut self.pages[first..last] {
            line.clear();
        }
        self.pages[first] = visible.clone();
        info!("lcd {} | {}", page, Self::decorate(&visible, style, animation));
        Ok(())
    }
}
