/*
 *  display/render.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render passes - turns the view model into cursor and text primitives
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

use log::{debug, trace};

use crate::constants::{
    LARGE_FONT_PAGES, MARQUEE_GAP, MENU_MARQUEE_GAP, STATUS_PRIMARY_PAGE, STATUS_SECONDARY_PAGE, STATUS_SEPARATOR_PAGE,
    STATUS_TERTIARY_PAGE,
};
use crate::display::error::DisplayError;
use crate::display::marquee::{Marquee, ScrollLine, ScrollStep};
use crate::display::traits::{Animation, Font, LcdDevice, TextStyle};
use crate::display::view::{RenderKind, ViewModel};
use crate::menu::MenuState;
use crate::status::{PlaybackStatus, StatusDiffer, StatusField};

/// One line of the splash screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplashLine {
    pub page: u8,
    pub text: String,
    pub font: Font,
}

impl SplashLine {
    pub fn new(page: u8, text: impl Into<String>, font: Font) -> Self {
        Self { page, text: text.into(), font }
    }
}

/// Product name, version and build date
pub fn splash_lines(version: &str, build_date: &str) -> Vec<SplashLine> {
    vec![
        SplashLine::new(0, "EADOG LCD", Font::Large),
        SplashLine::new(3, format!("version {}", version), Font::Small),
        SplashLine::new(4, format!("built {}", build_date), Font::Small),
        SplashLine::new(7, "(c) Stuart Hunter", Font::Small),
    ]
}

fn status_page(field: StatusField) -> u8 {
    match field {
        StatusField::Primary => STATUS_PRIMARY_PAGE,
        StatusField::Secondary => STATUS_SECONDARY_PAGE,
        StatusField::Tertiary => STATUS_TERTIARY_PAGE,
    }
}

fn status_animation(field: StatusField) -> Animation {
    match field {
        StatusField::Primary | StatusField::Secondary => Animation::Marquee { gap: MARQUEE_GAP },
        StatusField::Tertiary => Animation::Static,
    }
}

/// Owns the device and knows what is currently on it.
///
/// Only the display session drives a renderer, one pass at a time.
pub struct Renderer<D: LcdDevice> {
    device: D,
    differ: StatusDiffer,
    marquee: Marquee,
    shown: Option<RenderKind>,
}

impl<D: LcdDevice> Renderer<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            differ: StatusDiffer::new(),
            marquee: Marquee::new(),
            shown: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn shown(&self) -> Option<RenderKind> {
        self.shown
    }

    pub async fn initialize(&mut self) -> Result<(), DisplayError> {
        self.device.hardware_reset().await?;
        self.device.initialize().await?;
        self.device.backlight_on().await?;
        self.device.clear().await?;
        self.forget();
        Ok(())
    }

    pub async fn clear(&mut self) -> Result<(), DisplayError> {
        self.forget();
        self.device.clear().await
    }

    pub async fn splash(&mut self, lines: &[SplashLine]) -> Result<(), DisplayError> {
        self.clear().await?;
        for line in lines {
            self.write_line(line.page, &line.text, line.font, TextStyle::Normal, Animation::Static).await?;
        }
        Ok(())
    }

    /// One full pass. A failed pass leaves the screen state unknown.
    pub async fn render(&mut self, kind: RenderKind, view: &ViewModel) -> Result<(), DisplayError> {
        let result = match kind {
            RenderKind::Menu => self.render_menu(&view.menu).await,
            RenderKind::Status => self.render_status(&view.status).await,
        };
        match result {
            Ok(()) => self.shown = Some(kind),
            Err(_) => self.forget(),
        }
        result
    }

    /// Move every scrolling line on by one step. Returns the lines rewritten.
    pub async fn scroll(&mut self) -> Result<usize, DisplayError> {
        let steps = self.marquee.advance();
        for step in &steps {
            if let Err(e) = self.write_step(step).await {
                self.forget();
                return Err(e);
            }
        }
        if !steps.is_empty() {
            trace!("Marquee step, {} lines", steps.len());
        }
        Ok(steps.len())
    }

    async fn write_step(&mut self, step: &ScrollStep) -> Result<(), DisplayError> {
        self.device.move_cursor(0, step.page).await?;
        self.device.write_text(&step.text, step.font, step.style, Animation::Static).await
    }

    pub fn is_scrolling(&self) -> bool {
        !self.marquee.is_empty()
    }

    fn forget(&mut self) {
        self.shown = None;
        self.differ.invalidate();
        self.marquee.clear();
    }

    async fn switch_to(&mut self, kind: RenderKind) -> Result<(), DisplayError> {
        if self.shown != Some(kind) {
            trace!("Switching display to {:?}", kind);
            self.forget();
            self.device.clear().await?;
        }
        Ok(())
    }

    async fn render_menu(&mut self, menu: &MenuState) -> Result<(), DisplayError> {
        self.switch_to(RenderKind::Menu).await?;
        let rows = menu.pager().rows(menu);
        debug!("Menu pass: page {} of {}, line {}", menu.active_page + 1, menu.page_count().max(1), menu.selected_line);
        for (line, row) in rows.iter().enumerate() {
            let page = line as u8 * LARGE_FONT_PAGES;
            let animation = Animation::Marquee { gap: MENU_MARQUEE_GAP };
            self.write_line(page, &row.text, Font::Large, row.style.into(), animation).await?;
        }
        Ok(())
    }

    async fn render_status(&mut self, status: &PlaybackStatus) -> Result<(), DisplayError> {
        self.switch_to(RenderKind::Status).await?;
        let changes = self.differ.changes(status);
        debug!("Status pass: {:?}", changes);

        for field in [StatusField::Primary, StatusField::Secondary] {
            if changes.contains(field) {
                self.write_field(status, field).await?;
            }
        }
        self.write_line(STATUS_SEPARATOR_PAGE, " ", Font::Large, TextStyle::Normal, Animation::Static).await?;
        if changes.contains(StatusField::Tertiary) {
            self.write_field(status, StatusField::Tertiary).await?;
        }

        self.differ.commit(status.clone());
        Ok(())
    }

    async fn write_field(&mut self, status: &PlaybackStatus, field: StatusField) -> Result<(), DisplayError> {
        let text = status.field(field).unwrap_or("");
        self.write_line(status_page(field), text, Font::Large, TextStyle::Normal, status_animation(field)).await
    }

    async fn write_line(
        &mut self,
        page: u8,
        text: &str,
        font: Font,
        style: TextStyle,
        animation: Animation,
    ) -> Result<(), DisplayError> {
        self.device.move_cursor(0, page).await?;
        self.device.write_text(text, font, style, animation).await?;

        let capabilities = self.device.capabilities();
        let line = match animation {
            Animation::Marquee { gap } if !capabilities.marquee => {
                ScrollLine::new(page, text, gap, font, style, capabilities.columns(font))
            }
            _ => None,
        };
        self.marquee.track(page, line);
        Ok(())
    }
}
