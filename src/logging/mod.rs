//! Browser console logging through the `log` facade.
//!
//! Call sites prefix their messages with an `[area]` tag.

use log::Level;
use std::str::FromStr;

/// Unknown or empty values fall back to `info`.
pub(crate) fn parse_level(level: &str) -> Level {
    Level::from_str(level.trim()).unwrap_or(Level::Info)
}

/// Installs the console logger. Calling it twice keeps the first logger.
pub(crate) fn init(level: &str) {
    let _ = console_log::init_with_level(parse_level(level));
}
