/*
 *  display/mod.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - device drivers, render passes and the session
 *  that owns the device
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod view;

// Line rasteriser for page addressed panels
pub mod strip;

// Device drivers and factory
pub mod drivers;

// Render passes and the session that serialises them
pub mod marquee;
pub mod render;
pub mod session;

// Re-exports for convenience
pub use traits::{Animation, DeviceCapabilities, Font, LcdDevice, TextStyle};
pub use error::DisplayError;
pub use view::{RenderKind, ViewModel};
pub use drivers::{Device, DisplayFactory, list_spi_devices};
pub use render::{Renderer, SplashLine, splash_lines};
pub use marquee::{Marquee, ScrollLine};
pub use session::{DisplaySession, MarqueeTicker, PassOutcome, RenderTicket};
