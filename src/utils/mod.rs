pub mod errors;
pub mod format;

pub use errors::PlaybackError;
pub use format::{format_time, progress_line, progress_percent};
