//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and config management (XDG-compliant)
//! - [`encoding`] - Variable-length and little-endian integer encoding
//! - [`files`] - Binary detection and text decoding for indexed files
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//! - [`throttle`] - Rate-limited warnings

pub mod app_data;
pub mod encoding;
pub mod files;
pub mod progress;
pub mod throttle;

pub use app_data::*;
pub use encoding::*;
pub use files::*;
pub use throttle::{RateLimitedWarnings, TracingSink, WarningSink};
