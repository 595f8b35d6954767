//! Utility functions

mod sanitize;
mod size;

pub use sanitize::sanitize_filename;
pub use size::format_size;
