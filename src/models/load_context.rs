//! Deferred-load marker carried by collection root nodes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const REDACTED_PASSWORD: &str = "****";

/// A store file together with the password it was validated with.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StoreSource {
    path: PathBuf,
    password: Option<String>,
}

impl StoreSource {
    pub fn new(path: impl Into<PathBuf>, password: Option<String>) -> Self {
        Self { path: path.into(), password: password.filter(|p| !p.is_empty()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSource")
            .field("path", &self.path)
            .field("password", &self.password.as_ref().map(|_| REDACTED_PASSWORD))
            .finish()
    }
}

/// Load state of a collection root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Not read yet; the node shows a placeholder child.
    Collapsed,
    /// The collection is being read.
    Loading,
    /// Children are attached. Terminal.
    Loaded,
    /// The last read failed; the placeholder is back and a retry is allowed.
    Failed { reason: String },
}

/// Source, collection and state of a lazily loaded node.
#[derive(Debug, Clone)]
pub struct LoadContext {
    source: Arc<StoreSource>,
    collection: String,
    state: LoadState,
}

impl LoadContext {
    pub fn new(source: Arc<StoreSource>, collection: impl Into<String>) -> Self {
        Self { source, collection: collection.into(), state: LoadState::Collapsed }
    }

    pub fn source(&self) -> &Arc<StoreSource> {
        &self.source
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Whether an expansion request may start a read.
    pub fn can_load(&self) -> bool {
        matches!(self.state, LoadState::Collapsed | LoadState::Failed { .. })
    }

    pub(crate) fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }
}
