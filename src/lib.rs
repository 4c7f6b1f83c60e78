/*
 *  lib.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library root
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

pub mod constants;
pub mod deutils;

pub mod menu;
pub mod status;
pub mod navigation;
pub mod timer;
pub mod protocol;

pub mod display;

pub mod config;
pub mod runtime;

pub use config::{Cli, Config, ConfigError};
pub use navigation::{Event, Location, NavigationState, Navigator};
pub use protocol::{Command, CommandSink};
pub use runtime::{Controller, RuntimeSettings};
