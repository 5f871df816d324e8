//! Tree browser: catalog listing, lazy collection expansion and the session
//! that ties them to an opened store.

mod catalog;
mod controller;
mod loader;
mod materializer;
mod session;

pub use catalog::list_collections;
pub use controller::{Begin, Expansion, LoadRequest, add_collection_root, begin, complete, expand};
pub use loader::load_collection;
pub use materializer::Materializer;
pub use session::{BrowserSession, OpenOutcome, PendingExpansion};
