//! Matrix Orbital GLK Driver Library
//!
//! Talks the Matrix Orbital binary command protocol to GLK-series graphic
//! LCD modules (reference device: GLK19264-7T-1U) over a serial link.
//! Commands are 0xFE-prefixed byte frames; a handful of them solicit a
//! fixed-size or length-prefixed response from the module.

pub mod display;
pub mod error;
pub mod filesystem;
pub mod keypad;
pub mod module;
pub mod protocol;

pub use display::Glk;
pub use error::{Error, Result};
pub use filesystem::{DirEntry, FileKind, FS_CAPACITY};
pub use keypad::{Key, KeyActivity};
pub use module::{FirmwareVersion, ModuleType};
pub use protocol::{AutoRepeatMode, BarGraphStyle, BaudRate, LedColor, ShiftDirection};

/// Panel dimensions in pixels.
pub const PANEL_WIDTH: u8 = 192;
pub const PANEL_HEIGHT: u8 = 64;

/// Factory-default serial settings.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD: u32 = 19_200;
