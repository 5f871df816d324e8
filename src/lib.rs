//! Read-only tree browser for document store files.

pub mod browser;
pub mod error;
pub mod helpers;
pub mod models;
pub mod state;
pub mod store;
pub mod value;
pub mod views;
