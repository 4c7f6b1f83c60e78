/*
 *  display/strip.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  One line of pixels, rasterised with embedded-graphics and cut into
 *  page bytes for column addressed controllers
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

use core::convert::Infallible;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::mono_font::ascii::{FONT_5X8, FONT_6X13};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::constants::PIXELS_PER_PAGE;
use crate::display::traits::{Font, TextStyle};

pub fn mono_font(font: Font) -> &'static MonoFont<'static> {
    match font {
        Font::Large => &FONT_6X13,
        Font::Small => &FONT_5X8,
    }
}

/// A runtime-sized monochrome buffer covering whole pages
#[derive(Debug, Clone)]
pub struct PageStrip {
    buf: Vec<bool>,
    w: usize,
    h: usize,
}

impl PageStrip {
    pub fn new(width: u32, pages: u8) -> Self {
        let (w, h) = (width as usize, usize::from(pages) * PIXELS_PER_PAGE as usize);
        Self { buf: vec![false; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn pages(&self) -> usize { self.h / PIXELS_PER_PAGE as usize }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.w && y < self.h && self.buf[y * self.w + x]
    }

    pub fn invert(&mut self) {
        self.buf.iter_mut().for_each(|p| *p = !*p);
    }

    /// Blank the strip, then draw `text` from the left edge
    pub fn render(&mut self, text: &str, font: Font, style: TextStyle) {
        self.buf.fill(false);
        let character_style = MonoTextStyle::new(mono_font(font), BinaryColor::On);
        // drawing into the strip cannot fail
        let _ = Text::with_baseline(text, Point::zero(), character_style, Baseline::Top).draw(self);
        if style == TextStyle::Inverted {
            self.invert();
        }
    }

    /// Column bytes of one page, LSB at the top row
    pub fn page_bytes(&self, page: usize) -> Vec<u8> {
        let top = page * PIXELS_PER_PAGE as usize;
        (0..self.w)
            .map(|x| {
                (0..PIXELS_PER_PAGE as usize)
                    .filter(|bit| self.pixel(x, top + bit))
                    .fold(0u8, |byte, bit| byte | (1 << bit))
            })
            .collect()
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for PageStrip {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for PageStrip {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c.is_on();
            }
        }
        Ok(())
    }
}
