/*
 *  display/marquee.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Marquee scrolling for panels that cannot animate text themselves
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

use crate::constants::MARQUEE_HOLD_TICKS;
use crate::display::traits::{Font, TextStyle};

/// Scroll state of one line wider than the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollLine {
    pub page: u8,
    pub font: Font,
    pub style: TextStyle,
    cycle: Vec<char>,
    columns: usize,
    offset: usize,
    hold: u32,
}

impl ScrollLine {
    /// `None` when the text fits
    pub fn new(page: u8, text: &str, gap: &str, font: Font, style: TextStyle, columns: usize) -> Option<Self> {
        if columns == 0 || text.chars().count() <= columns {
            return None;
        }
        Some(Self {
            page,
            font,
            style,
            cycle: text.chars().chain(gap.chars()).collect(),
            columns,
            offset: 0,
            hold: MARQUEE_HOLD_TICKS,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Visible characters, wrapping through the gap back to the head
    pub fn window(&self) -> String {
        self.cycle.iter().cycle().skip(self.offset).take(self.columns).collect()
    }

    /// Step one character left. `false` while resting at the start.
    pub fn advance(&mut self) -> bool {
        if self.hold > 0 {
            self.hold -= 1;
            return false;
        }
        self.offset = (self.offset + 1) % self.cycle.len();
        if self.offset == 0 {
            self.hold = MARQUEE_HOLD_TICKS;
        }
        true
    }
}

/// One step of a scrolling line, ready to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollStep {
    pub page: u8,
    pub text: String,
    pub font: Font,
    pub style: TextStyle,
}

/// Lines currently scrolling, at most one per start page
#[derive(Debug, Default)]
pub struct Marquee {
    lines: Vec<ScrollLine>,
}

impl Marquee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Replace whatever scrolled at `page`
    pub fn track(&mut self, page: u8, line: Option<ScrollLine>) {
        self.lines.retain(|l| l.page != page);
        self.lines.extend(line);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Advance every line, returning the ones whose window moved
    pub fn advance(&mut self) -> Vec<ScrollStep> {
        self.lines
            .iter_mut()
            .filter_map(|line| {
                line.advance().then(|| ScrollStep {
                    page: line.page,
                    text: line.window(),
                    font: line.font,
                    style: line.style,
                })
            })
            .collect()
    }
}
