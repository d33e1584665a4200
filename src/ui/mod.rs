// UI and formatting module

pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{colorize_percent, format_memory_details, format_percent, format_sample_line};
