//! Utility functions for string formatting, matching and file naming.

pub mod file_name;
pub mod format;

pub use file_name::{decode_file_name, encode_file_name};
pub use format::{contains_ignore_case, format_millis, truncate_preview};
