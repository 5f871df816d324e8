pub mod crypto;
pub mod format;
pub mod fs;

pub use format::{format_count, format_file_size};
pub use fs::atomic_write;
