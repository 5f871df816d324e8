// Persistent settings and status reporting

pub mod config;
pub mod settings;
pub mod status;

pub use config::ConfigManager;
pub use settings::{RenderSettings, ViewerSettings};
pub use status::{StatusLevel, StatusMessage};
