//! Browser session: one opened store file and its display tree.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::models::{DisplayTree, NodeId, StoreSource, Subtree};
use crate::state::StatusMessage;
use crate::store::{FileStoreOpener, StoreHandle, StoreOpener, StoreProbe};
use crate::value::ValueRenderer;

use super::controller::{self, Begin, Expansion};
use super::{list_collections, load_collection};

/// Result of a successful [`BrowserSession::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOutcome {
    pub collections: usize,
    pub protected: bool,
}

type Job = JoinHandle<Result<Subtree>>;

/// Ticket for an expansion started with [`BrowserSession::expand_in_background`].
///
/// The session owns the running read, so dropping the ticket does not leave
/// the node stuck in `Loading`: [`BrowserSession::finish_node`] and
/// [`BrowserSession::finish_ready`] attach the result without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingExpansion {
    node: NodeId,
    generation: u64,
    skipped: Option<Expansion>,
}

impl PendingExpansion {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The outcome when no read was started.
    pub fn skipped(&self) -> Option<Expansion> {
        self.skipped
    }
}

/// Owns the display tree of the currently opened store.
///
/// Store handles are opened once per `(path, password)` and reused for every
/// later expansion. Opening another file replaces the tree.
pub struct BrowserSession {
    opener: Arc<dyn StoreOpener>,
    renderer: Arc<ValueRenderer>,
    tree: DisplayTree,
    handles: HashMap<StoreSource, Arc<dyn StoreHandle>>,
    runtime: Option<Runtime>,
    jobs: BTreeMap<NodeId, Job>,
    status: Option<StatusMessage>,
    generation: u64,
}

impl BrowserSession {
    pub fn new(opener: Arc<dyn StoreOpener>, renderer: ValueRenderer) -> Self {
        Self {
            opener,
            renderer: Arc::new(renderer),
            tree: DisplayTree::new(),
            handles: HashMap::new(),
            runtime: None,
            jobs: BTreeMap::new(),
            status: None,
            generation: 0,
        }
    }

    /// Session over store files on disk.
    pub fn with_file_store(renderer: ValueRenderer) -> Self {
        Self::new(Arc::new(FileStoreOpener), renderer)
    }

    pub fn tree(&self) -> &DisplayTree {
        &self.tree
    }

    pub fn renderer(&self) -> &ValueRenderer {
        &self.renderer
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Sum over all roots of (descendants + 1).
    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn probe(&self, path: &Path) -> Result<StoreProbe> {
        self.opener.probe(path)
    }

    /// Open a store and build one collapsed root per collection.
    ///
    /// `NotAStore` and `WrongPassword` are reported before anything is built;
    /// the current tree is kept in that case.
    pub fn open(&mut self, path: &Path, password: Option<&str>) -> Result<OpenOutcome> {
        let outcome = self.open_inner(path, password);
        if let Err(err) = &outcome {
            log::warn!("Could not open {}: {err}", path.display());
            self.status = Some(StatusMessage::error(err.to_string()));
        }
        outcome
    }

    fn open_inner(&mut self, path: &Path, password: Option<&str>) -> Result<OpenOutcome> {
        let protected = match self.opener.probe(path)? {
            StoreProbe::NotAStore => return Err(Error::NotAStore(path.to_path_buf())),
            StoreProbe::Locked => true,
            StoreProbe::Open => false,
        };
        let password = if protected { password.map(str::to_string) } else { None };
        let source = StoreSource::new(path, password);

        let handle = self.opener.open(path, source.password())?;
        let names = list_collections(handle.as_ref())?;

        self.reset();

        let source = Arc::new(source);
        self.handles.insert((*source).clone(), handle);
        for name in &names {
            controller::add_collection_root(&mut self.tree, name, source.clone());
        }

        log::debug!("Opened {} with {} collections", path.display(), names.len());
        self.status = Some(StatusMessage::info(format!(
            "Opened {} ({} collections)",
            path.display(),
            names.len()
        )));
        Ok(OpenOutcome { collections: names.len(), protected })
    }

    /// Drop the tree and every cached store handle.
    pub fn close(&mut self) {
        self.reset();
        self.status = None;
    }

    fn reset(&mut self) {
        if !self.jobs.is_empty() {
            log::debug!("Dropping {} background loads for the old tree", self.jobs.len());
        }
        self.jobs.clear();
        self.tree.clear();
        self.handles.clear();
        self.generation += 1;
    }

    /// Expand `node` on the calling thread.
    pub fn expand(&mut self, node: NodeId) -> Result<Expansion> {
        self.status = Some(StatusMessage::busy("Processing"));
        let Self { tree, handles, opener, renderer, .. } = self;
        let outcome = controller::expand(tree, node, &**renderer, |source| {
            resolve_handle(handles, &**opener, source)
        });
        self.report(&outcome);
        outcome
    }

    /// Expand the root of collection `name`.
    pub fn expand_collection(&mut self, name: &str) -> Result<Expansion> {
        let root = self
            .tree
            .find_root(name)
            .ok_or_else(|| Error::UnknownCollection(name.to_string()))?;
        self.expand(root)
    }

    /// Expand every root, in catalog order. Failures do not stop the others.
    pub fn expand_all(&mut self) -> Vec<(String, Result<Expansion>)> {
        let roots = self.tree.roots().to_vec();
        roots
            .into_iter()
            .map(|root| {
                let name = self.tree.label(root).unwrap_or_default().to_string();
                (name, self.expand(root))
            })
            .collect()
    }

    /// Start expanding `node` with the store read running on the session
    /// runtime. The node is `Loading` until the expansion is finished.
    pub fn expand_in_background(&mut self, node: NodeId) -> Result<PendingExpansion> {
        let generation = self.generation;
        let request = match controller::begin(&mut self.tree, node) {
            Begin::Load(request) => request,
            Begin::Skip(outcome) => {
                return Ok(PendingExpansion { node, generation, skipped: Some(outcome) });
            }
        };
        self.status = Some(StatusMessage::busy("Processing"));

        let resolved = resolve_handle(&mut self.handles, self.opener.as_ref(), &request.source)
            .and_then(|store| {
                self.runtime()?;
                Ok(store)
            });
        let store = match resolved {
            Ok(store) => store,
            Err(err) => {
                let outcome = controller::complete(&mut self.tree, node, Err(err));
                self.report(&outcome);
                let skipped = outcome?;
                return Ok(PendingExpansion { node, generation, skipped: Some(skipped) });
            }
        };

        let renderer = self.renderer.clone();
        let collection = request.collection;
        let Some(runtime) = self.runtime.as_ref() else {
            return Err(Error::Task("runtime unavailable".to_string()));
        };
        let handle = runtime.spawn_blocking(move || {
            load_collection(store.as_ref(), &collection, &renderer)
        });
        self.jobs.insert(node, handle);
        log::debug!("Started background load for node {node}");
        Ok(PendingExpansion { node, generation, skipped: None })
    }

    /// Wait for a background expansion and attach its result in one batch.
    ///
    /// Tickets for a tree that has since been replaced give `NotExpandable`.
    pub fn finish_expansion(&mut self, pending: PendingExpansion) -> Result<Expansion> {
        if let Some(outcome) = pending.skipped {
            return Ok(outcome);
        }
        if pending.generation != self.generation {
            log::warn!("Discarding background load for node {}: tree was replaced", pending.node);
            return Ok(Expansion::NotExpandable);
        }
        self.finish_node(pending.node)
    }

    /// Wait for the background read of `node`, if any, and attach it.
    ///
    /// Without a running read this reports the node's current state.
    pub fn finish_node(&mut self, node: NodeId) -> Result<Expansion> {
        let Some(handle) = self.jobs.remove(&node) else {
            let loaded = self.tree.load_context(node).is_some_and(|context| context.is_loaded());
            return Ok(if loaded { Expansion::AlreadyLoaded } else { Expansion::NotExpandable });
        };
        let joined = match self.runtime.as_ref() {
            Some(runtime) => runtime.block_on(handle),
            None => return Err(Error::Task("runtime unavailable".to_string())),
        };
        let result = joined.map_err(|err| Error::Task(err.to_string())).and_then(|loaded| loaded);
        let outcome = controller::complete(&mut self.tree, node, result);
        self.report(&outcome);
        outcome
    }

    /// Attach every background read that has already finished, without waiting.
    pub fn finish_ready(&mut self) -> Vec<(NodeId, Result<Expansion>)> {
        let ready: Vec<NodeId> = self
            .jobs
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(node, _)| *node)
            .collect();
        ready.into_iter().map(|node| (node, self.finish_node(node))).collect()
    }

    /// Whether a read for `node` is still running.
    pub fn is_loading(&self, node: NodeId) -> bool {
        self.jobs.get(&node).is_some_and(|handle| !handle.is_finished())
    }

    fn runtime(&mut self) -> Result<&Runtime> {
        let runtime = match self.runtime.take() {
            Some(runtime) => runtime,
            None => Builder::new_multi_thread().enable_all().build()?,
        };
        Ok(self.runtime.insert(runtime))
    }

    fn report(&mut self, outcome: &Result<Expansion>) {
        self.status = Some(match outcome {
            Ok(_) => StatusMessage::info("Complete"),
            Err(err) => StatusMessage::error(err.to_string()),
        });
        log::debug!("Current node count: {}", self.node_count());
    }
}

fn resolve_handle(
    handles: &mut HashMap<StoreSource, Arc<dyn StoreHandle>>,
    opener: &dyn StoreOpener,
    source: &StoreSource,
) -> Result<Arc<dyn StoreHandle>> {
    if let Some(handle) = handles.get(source) {
        return Ok(handle.clone());
    }
    log::debug!("Reopening store {}", source.path().display());
    let handle = opener.open(source.path(), source.password())?;
    handles.insert(source.clone(), handle.clone());
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bson::oid::ObjectId;

    use super::*;
    use crate::models::{LoadState, PLACEHOLDER_LABEL};
    use crate::state::StatusLevel;
    use crate::store::{MemoryStore, MemoryStoreOpener};

    type Fixture = (BrowserSession, Arc<MemoryStoreOpener>, Arc<MemoryStore>);

    fn session_with(store: MemoryStore) -> Fixture {
        let opener = Arc::new(MemoryStoreOpener::new());
        let store = opener.insert("db.store", store);
        let session = BrowserSession::new(opener.clone(), ValueRenderer::default());
        (session, opener, store)
    }

    fn sample() -> MemoryStore {
        MemoryStore::new()
            .with_collection(
                "users",
                vec![doc! { "_id": ObjectId::new(), "name": "Ann", "age": 30 }],
            )
            .with_collection("orders", vec![doc! { "item": "pen" }, doc! { "item": "ink" }])
    }

    #[test]
    fn open_builds_collapsed_roots() {
        let (mut session, _, _) = session_with(sample());
        let outcome = session.open(Path::new("db.store"), None).unwrap();
        assert_eq!(outcome, OpenOutcome { collections: 2, protected: false });

        let tree = session.tree();
        let labels: Vec<_> = tree.roots().iter().filter_map(|id| tree.label(*id)).collect();
        assert_eq!(labels, vec!["users", "orders"]);
        for root in tree.roots() {
            assert_eq!(tree.child_labels(*root), vec![PLACEHOLDER_LABEL]);
        }
        assert_eq!(session.node_count(), 4);
        assert_eq!(session.status().unwrap().level, StatusLevel::Info);
    }

    #[test]
    fn unknown_file_builds_nothing() {
        let (mut session, _, _) = session_with(sample());
        let err = session.open(Path::new("other.bin"), None).unwrap_err();
        assert!(matches!(err, Error::NotAStore(_)));
        assert!(session.tree().is_empty());
        assert!(session.status().unwrap().is_error());
    }

    #[test]
    fn wrong_password_builds_nothing() {
        let (mut session, _, _) = session_with(sample().with_password("secret"));
        let wrong = session.open(Path::new("db.store"), Some("nope"));
        assert!(matches!(wrong, Err(Error::WrongPassword)));
        assert!(matches!(session.open(Path::new("db.store"), None), Err(Error::WrongPassword)));
        assert!(session.tree().is_empty());

        let outcome = session.open(Path::new("db.store"), Some("secret")).unwrap();
        assert!(outcome.protected);
    }

    #[test]
    fn handles_are_opened_once() {
        let (mut session, opener, store) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        session.expand_collection("users").unwrap();
        session.expand_collection("orders").unwrap();
        assert_eq!(opener.open_count(), 1);
        assert_eq!(store.read_count(), 2);
    }

    #[test]
    fn second_expand_does_not_read_again() {
        let (mut session, _, store) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();

        assert_eq!(session.expand_collection("orders").unwrap(), Expansion::Loaded { children: 2 });
        let count = session.node_count();
        assert_eq!(session.expand_collection("orders").unwrap(), Expansion::AlreadyLoaded);
        assert_eq!(session.node_count(), count);
        assert_eq!(store.read_count(), 1);
        assert_eq!(session.status().unwrap().text, "Complete");
    }

    #[test]
    fn expand_unknown_collection_is_an_error() {
        let (mut session, _, _) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        assert!(matches!(session.expand_collection("nope"), Err(Error::UnknownCollection(_))));
    }

    #[test]
    fn expand_all_continues_past_failures() {
        let (mut session, _, store) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        store.fail_reads("users");

        let results = session.expand_all();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "users");
        assert!(results[0].1.is_err());
        assert_eq!(results[1].1.as_ref().unwrap(), &Expansion::Loaded { children: 2 });

        let users = session.tree().find_root("users").unwrap();
        assert!(matches!(
            session.tree().load_context(users).unwrap().state(),
            LoadState::Failed { .. }
        ));
    }

    #[test]
    fn background_matches_synchronous() {
        let (mut sync_session, _, _) = session_with(sample());
        sync_session.open(Path::new("db.store"), None).unwrap();
        sync_session.expand_collection("users").unwrap();

        let (mut session, _, _) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let users = session.tree().find_root("users").unwrap();
        let pending = session.expand_in_background(users).unwrap();
        assert_eq!(
            session.tree().load_context(users).unwrap().state(),
            &LoadState::Loading
        );
        assert_eq!(session.expand(users).unwrap(), Expansion::InProgress);

        assert_eq!(session.finish_expansion(pending).unwrap(), Expansion::Loaded { children: 1 });
        assert_eq!(session.node_count(), sync_session.node_count());

        let identity = session.tree().children(users)[0];
        let sync_users = sync_session.tree().find_root("users").unwrap();
        let sync_identity = sync_session.tree().children(sync_users)[0];
        assert_eq!(
            session.tree().child_labels(identity),
            sync_session.tree().child_labels(sync_identity)
        );
    }

    #[test]
    fn background_on_loaded_node_is_skipped() {
        let (mut session, _, store) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let orders = session.tree().find_root("orders").unwrap();
        session.expand(orders).unwrap();

        let pending = session.expand_in_background(orders).unwrap();
        assert_eq!(pending.skipped(), Some(Expansion::AlreadyLoaded));
        assert!(!session.is_loading(orders));
        assert_eq!(session.finish_expansion(pending).unwrap(), Expansion::AlreadyLoaded);
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn background_failure_is_retryable() {
        let (mut session, _, store) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let users = session.tree().find_root("users").unwrap();
        store.fail_reads("users");

        let pending = session.expand_in_background(users).unwrap();
        assert!(session.finish_expansion(pending).is_err());
        assert_eq!(session.tree().child_labels(users), vec![PLACEHOLDER_LABEL]);

        store.heal("users");
        assert_eq!(session.expand(users).unwrap(), Expansion::Loaded { children: 1 });
    }

    #[test]
    fn results_for_a_replaced_tree_are_dropped() {
        let (mut session, _, _) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let users = session.tree().find_root("users").unwrap();
        let pending = session.expand_in_background(users).unwrap();

        session.close();
        assert_eq!(session.finish_expansion(pending).unwrap(), Expansion::NotExpandable);
        assert!(session.tree().is_empty());
    }

    #[test]
    fn reopening_replaces_the_tree() {
        let (mut session, opener, _) = session_with(sample());
        let small = MemoryStore::new().with_collection("only", vec![doc! { "a": 1 }]);
        opener.insert("small.store", small);
        session.open(Path::new("db.store"), None).unwrap();
        session.expand_collection("users").unwrap();

        session.open(Path::new("small.store"), None).unwrap();
        assert_eq!(session.tree().roots().len(), 1);
        assert_eq!(session.node_count(), 2);
    }

    #[test]
    fn dropped_ticket_can_still_be_finished() {
        let (mut session, _, store) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let orders = session.tree().find_root("orders").unwrap();
        drop(session.expand_in_background(orders).unwrap());

        assert_eq!(session.finish_node(orders).unwrap(), Expansion::Loaded { children: 2 });
        assert!(session.tree().load_context(orders).unwrap().is_loaded());
        assert_eq!(session.expand(orders).unwrap(), Expansion::AlreadyLoaded);
        assert_eq!(session.finish_node(orders).unwrap(), Expansion::AlreadyLoaded);
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn finish_ready_attaches_completed_reads() {
        let (mut session, _, _) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let users = session.tree().find_root("users").unwrap();
        let orders = session.tree().find_root("orders").unwrap();
        session.expand_in_background(users).unwrap();
        session.expand_in_background(orders).unwrap();

        let mut finished = Vec::new();
        for _ in 0..500 {
            finished.extend(session.finish_ready());
            if finished.len() == 2 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(finished.len(), 2);
        assert!(finished.iter().all(|(_, outcome)| outcome.is_ok()));
        assert!(!session.is_loading(users));
        assert!(session.tree().load_context(users).unwrap().is_loaded());
        assert!(session.tree().load_context(orders).unwrap().is_loaded());
        assert!(session.finish_ready().is_empty());
    }

    #[test]
    fn node_without_a_read_reports_its_state() {
        let (mut session, _, _) = session_with(sample());
        session.open(Path::new("db.store"), None).unwrap();
        let users = session.tree().find_root("users").unwrap();
        assert_eq!(session.finish_node(users).unwrap(), Expansion::NotExpandable);
        assert_eq!(
            session.tree().load_context(users).unwrap().state(),
            &LoadState::Collapsed
        );
    }
}
