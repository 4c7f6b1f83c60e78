/*
 *  config.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Configuration - defaults, YAML file and command line overrides
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CONTRAST, DEFAULT_MARQUEE_STEP_MS, DEFAULT_MENU_TIMEOUT_MS, DEFAULT_SPI_SPEED_HZ, DEFAULT_SPLASH_TIMEOUT_MS,
};
use crate::navigation::{Location, NavigationBounds};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("display not configured, missing {}", .missing.join(", "))]
    NotConfigured { missing: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub debug_logging: Option<bool>,
    pub display: Option<DisplayConfig>,
    pub navigation: Option<NavigationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub driver: Option<DriverKind>,
    pub bus: Option<BusConfig>,
    pub inverted: Option<bool>,
    pub upside_down: Option<bool>,
    pub contrast: Option<u8>,       // 0-63
    pub marquee_step_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NavigationConfig {
    pub start_level: Option<String>,
    pub highest_level: Option<String>,
    pub menu_timeout_ms: Option<u64>,
    pub splash_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    Spi {
        bus: Option<String>,        // e.g. "/dev/spidev0.0"
        speed_hz: Option<u32>,
        cd_pin: Option<u64>,        // BCM numbering
        rst_pin: Option<u64>,
        backlight_pin: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Dogs102,
    Tty,
}

/// Complete SPI wiring of a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiWiring {
    pub bus: String,
    pub speed_hz: u32,
    pub cd_pin: u64,
    pub rst_pin: u64,
    pub backlight_pin: Option<u64>,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "eadog-lcd", about = "Now playing and library menu for EA DOG LCDs", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// debug logging
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// render to the terminal instead of the panel
    #[arg(long, action = ArgAction::SetTrue)]
    pub tty: bool,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub spi_bus: Option<String>,
    #[arg(long)]
    pub cd_pin: Option<u64>,
    #[arg(long)]
    pub rst_pin: Option<u64>,
    #[arg(long)]
    pub start_level: Option<String>,
    #[arg(long)]
    pub highest_level: Option<String>,
    #[arg(long)]
    pub menu_timeout_ms: Option<u64>,
    #[arg(long)]
    pub splash_timeout_ms: Option<u64>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
    /// list SPI devices and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub list_spi: bool,
}

/// Read YAML, merge, apply overrides from `cli`, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/eadog-lcd/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/eadog-lcd.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["eadog-lcd.yaml", "config.yaml", "config/eadog-lcd.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.debug_logging.is_some()  { dst.debug_logging = src.debug_logging; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
    match (&mut dst.navigation, src.navigation) {
        (None, Some(c)) => dst.navigation = Some(c),
        (Some(d), Some(s)) => merge_navigation(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some()       { dst.driver = src.driver; }
    if src.bus.is_some()          { dst.bus = src.bus; }
    if src.inverted.is_some()     { dst.inverted = src.inverted; }
    if src.upside_down.is_some()  { dst.upside_down = src.upside_down; }
    if src.contrast.is_some()     { dst.contrast = src.contrast; }
    if src.marquee_step_ms.is_some() { dst.marquee_step_ms = src.marquee_step_ms; }
}

fn merge_navigation(dst: &mut NavigationConfig, src: NavigationConfig) {
    if src.start_level.is_some()        { dst.start_level = src.start_level; }
    if src.highest_level.is_some()      { dst.highest_level = src.highest_level; }
    if src.menu_timeout_ms.is_some()    { dst.menu_timeout_ms = src.menu_timeout_ms; }
    if src.splash_timeout_ms.is_some()  { dst.splash_timeout_ms = src.splash_timeout_ms; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.debug_logging = Some(true); }

    let any_display = cli.tty || cli.spi_bus.is_some() || cli.cd_pin.is_some() || cli.rst_pin.is_some();
    if any_display {
        let display = cfg.display.get_or_insert_with(DisplayConfig::default);
        if cli.tty { display.driver = Some(DriverKind::Tty); }
        if cli.spi_bus.is_some() || cli.cd_pin.is_some() || cli.rst_pin.is_some() {
            let BusConfig::Spi { bus, cd_pin, rst_pin, .. } = display.bus.get_or_insert(BusConfig::Spi {
                bus: None,
                speed_hz: None,
                cd_pin: None,
                rst_pin: None,
                backlight_pin: None,
            });
            if cli.spi_bus.is_some() { *bus = cli.spi_bus.clone(); }
            if cli.cd_pin.is_some()  { *cd_pin = cli.cd_pin; }
            if cli.rst_pin.is_some() { *rst_pin = cli.rst_pin; }
        }
    }

    let any_navigation = cli.start_level.is_some()
        || cli.highest_level.is_some()
        || cli.menu_timeout_ms.is_some()
        || cli.splash_timeout_ms.is_some();
    if any_navigation {
        let nav = cfg.navigation.get_or_insert_with(NavigationConfig::default);
        if cli.start_level.is_some()       { nav.start_level = cli.start_level.clone(); }
        if cli.highest_level.is_some()     { nav.highest_level = cli.highest_level.clone(); }
        if cli.menu_timeout_ms.is_some()   { nav.menu_timeout_ms = cli.menu_timeout_ms; }
        if cli.splash_timeout_ms.is_some() { nav.splash_timeout_ms = cli.splash_timeout_ms; }
    }
}

/// Range checks; wiring completeness is checked when the device is opened
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(nav) = cfg.navigation.as_ref() {
        if nav.menu_timeout_ms == Some(0) {
            return Err(ConfigError::Validation("navigation menu_timeout_ms must be > 0".into()));
        }
        if nav.splash_timeout_ms == Some(0) {
            return Err(ConfigError::Validation("navigation splash_timeout_ms must be > 0".into()));
        }
    }
    if let Some(display) = cfg.display.as_ref() {
        if let Some(c) = display.contrast {
            if c > 63 {
                return Err(ConfigError::Validation("display contrast must be 0..=63".into()));
            }
        }
        if display.marquee_step_ms == Some(0) {
            return Err(ConfigError::Validation("display marquee_step_ms must be > 0".into()));
        }
        if let Some(BusConfig::Spi { speed_hz: Some(0), .. }) = display.bus {
            return Err(ConfigError::Validation("display bus speed_hz must be > 0".into()));
        }
    }
    Ok(())
}

impl Config {
    pub fn debug_logging(&self) -> bool {
        self.debug_logging.unwrap_or(false)
    }

    /// Logger filter: explicit level, else debug or info
    pub fn log_filter(&self) -> &str {
        match self.log_level.as_deref() {
            Some(level) => level,
            None if self.debug_logging() => "debug",
            None => "info",
        }
    }

    pub fn driver(&self) -> DriverKind {
        self.display.as_ref().and_then(|d| d.driver).unwrap_or_default()
    }

    pub fn inverted(&self) -> bool {
        self.display.as_ref().and_then(|d| d.inverted).unwrap_or(false)
    }

    pub fn upside_down(&self) -> bool {
        self.display.as_ref().and_then(|d| d.upside_down).unwrap_or(false)
    }

    pub fn contrast(&self) -> u8 {
        self.display.as_ref().and_then(|d| d.contrast).unwrap_or(DEFAULT_CONTRAST)
    }

    /// Time between marquee steps
    pub fn marquee_step(&self) -> Duration {
        let ms = self.display.as_ref().and_then(|d| d.marquee_step_ms).unwrap_or(DEFAULT_MARQUEE_STEP_MS);
        Duration::from_millis(ms)
    }

    pub fn menu_timeout(&self) -> Duration {
        let ms = self.navigation.as_ref().and_then(|n| n.menu_timeout_ms).unwrap_or(DEFAULT_MENU_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub fn splash_timeout(&self) -> Duration {
        let ms = self.navigation.as_ref().and_then(|n| n.splash_timeout_ms).unwrap_or(DEFAULT_SPLASH_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub fn bounds(&self) -> NavigationBounds {
        fn level(value: Option<&String>) -> Location {
            value.map(|s| Location::parse(s)).unwrap_or_default()
        }
        let nav = self.navigation.as_ref();
        NavigationBounds {
            start: level(nav.and_then(|n| n.start_level.as_ref())),
            highest: level(nav.and_then(|n| n.highest_level.as_ref())),
        }
    }

    /// Wiring for an SPI panel, or every key still missing
    pub fn spi_wiring(&self) -> Result<SpiWiring, ConfigError> {
        let (bus, speed_hz, cd_pin, rst_pin, backlight_pin) = match self.display.as_ref().and_then(|d| d.bus.as_ref()) {
            Some(BusConfig::Spi { bus, speed_hz, cd_pin, rst_pin, backlight_pin }) => {
                (bus.clone(), *speed_hz, *cd_pin, *rst_pin, *backlight_pin)
            }
            None => (None, None, None, None, None),
        };

        let mut missing = Vec::new();
        if bus.is_none()     { missing.push("display.bus.bus".to_string()); }
        if cd_pin.is_none()  { missing.push("display.bus.cd_pin".to_string()); }
        if rst_pin.is_none() { missing.push("display.bus.rst_pin".to_string()); }

        match (bus, cd_pin, rst_pin) {
            (Some(bus), Some(cd_pin), Some(rst_pin)) => Ok(SpiWiring {
                bus,
                speed_hz: speed_hz.unwrap_or(DEFAULT_SPI_SPEED_HZ),
                cd_pin,
                rst_pin,
                backlight_pin,
            }),
            _ => Err(ConfigError::NotConfigured { missing }),
        }
    }
}
