//! This module contains global constants used across the display and navigation modules.

/// The total width of the EA DOGS102 in pixels.
pub const DISPLAY_WIDTH: u32 = 102;
/// The total height of the EA DOGS102 in pixels.
pub const DISPLAY_HEIGHT: u32 = 64;
/// Display memory is organised in pages of 8 pixel rows.
pub const PIXELS_PER_PAGE: u32 = 8;
/// Number of addressable pages (row groups).
pub const DISPLAY_PAGES: u8 = (DISPLAY_HEIGHT / PIXELS_PER_PAGE) as u8;

/// Cell width of the large font (FONT_6X13).
pub const LARGE_FONT_WIDTH: u32 = 6;
/// Pages covered by one line of large text.
pub const LARGE_FONT_PAGES: u8 = 2;
/// Cell width of the small font (FONT_5X8).
pub const SMALL_FONT_WIDTH: u32 = 5;

/// Characters that fit on one line of large text.
pub const DISPLAY_COLUMNS: usize = (DISPLAY_WIDTH / LARGE_FONT_WIDTH) as usize;

/// Menu lines per page, fixed by the display geometry.
pub const PAGE_SIZE: usize = 4;

// status view placement (page numbers)
pub const STATUS_PRIMARY_PAGE: u8 = 0;
pub const STATUS_SECONDARY_PAGE: u8 = 2;
pub const STATUS_SEPARATOR_PAGE: u8 = 4;
pub const STATUS_TERTIARY_PAGE: u8 = 6;

/// Gap inserted between the tail and head of marquee text.
pub const MARQUEE_GAP: &str = " +++ ";
/// Gap for menu rows; row text already ends in spaces.
pub const MENU_MARQUEE_GAP: &str = " ";
/// Steps a scrolling line rests at its start before moving.
pub const MARQUEE_HOLD_TICKS: u32 = 3;

/// Location sentinel for the library root (the music sources list).
pub const ROOT_LOCATION: &str = "/";

pub const DEFAULT_MENU_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SPLASH_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_SPI_SPEED_HZ: u32 = 800_000;
pub const DEFAULT_CONTRAST: u8 = 6;
pub const DEFAULT_MARQUEE_STEP_MS: u64 = 350;

/// Delay between queueing and starting playback when the queue is replaced.
pub const QUEUE_PLAY_DELAY_MS: u64 = 150;
