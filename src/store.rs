//! Config store
//!
//! Holds one configuration tree plus the owner's event channel. Updates are
//! deep-merged in place; lookups follow the top-level / whole-tree / one-level
//! resolution order of [`configurator_merge::resolve`].

use configurator_events::{Event, EventChannel, ListenerId};
use configurator_merge::{clone_tree, contains, is_mergeable, is_truthy, merge_into, resolve};
use serde_json::{Map, Value};
use tracing::debug;

/// Event emitted by an announced `add`/`set` without a custom name
pub const CHANGE_EVENT: &str = "change:config";

/// Event emitted by a non-silent `reset_config`
pub const RESET_EVENT: &str = "reset:config";

/// Whether a config update emits an event, and under which name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Announce {
    /// Merge without notifying anyone
    #[default]
    Silent,
    /// Emit [`CHANGE_EVENT`]
    Change,
    /// Emit a caller-chosen event name
    Event(String),
}

impl Announce {
    /// Announce under a custom event name
    pub fn event(name: impl Into<String>) -> Self {
        Announce::Event(name.into())
    }

    /// Build from a loud flag and an optional event name.
    ///
    /// The name only matters when `loud` is set.
    pub fn from_flags(loud: bool, event: Option<&str>) -> Self {
        match (loud, event) {
            (false, _) => Announce::Silent,
            (true, Some(name)) => Announce::event(name),
            (true, None) => Announce::Change,
        }
    }

    /// Event name to emit, if any
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Announce::Silent => None,
            Announce::Change => Some(CHANGE_EVENT),
            Announce::Event(name) => Some(name),
        }
    }
}

/// Holder of one configuration tree and its observers
#[derive(Debug)]
pub struct ConfigStore {
    /// Always an object
    tree: Value,
    events: EventChannel,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create a store with an empty tree
    pub fn new() -> Self {
        Self::with_tree(Value::Object(Map::new()))
    }

    /// Create a store that owns `tree`.
    ///
    /// A non-object tree is normalized through [`clone_tree`].
    pub fn with_tree(tree: Value) -> Self {
        let tree = if tree.is_object() { tree } else { clone_tree(&tree) };
        Self {
            tree,
            events: EventChannel::new(),
        }
    }

    /// The whole tree
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Observers attached to this store
    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Register an observer on this store's channel
    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Event<'_>) + 'static,
    {
        self.events.on(event, callback)
    }

    /// Deep-merge `update` into the tree.
    ///
    /// Objects and arrays are merged; anything else is ignored and nothing is
    /// announced. When announced, the event payload is `update` itself.
    pub fn add(&mut self, update: &Value, announce: Announce) -> &mut Self {
        if !is_mergeable(update) {
            return self;
        }

        merge_into(&mut self.tree, update);

        if let Some(event) = announce.event_name() {
            debug!(event, "config updated");
            self.events.trigger(event, update);
        }
        self
    }

    /// Alias for [`ConfigStore::add`]
    pub fn set(&mut self, update: &Value, announce: Announce) -> &mut Self {
        self.add(update, announce)
    }

    /// Resolve `key`, or `None` when nothing matches.
    ///
    /// A stored `false`, `0`, or `""` is a match.
    pub fn get(&self, key: &str) -> Option<&Value> {
        resolve(&self.tree, key)
    }

    /// Resolve `key`, returning `false` on a miss or a falsy match.
    pub fn get_or_false(&self, key: &str) -> Value {
        match self.get(key) {
            Some(value) if is_truthy(value) => value.clone(),
            _ => Value::Bool(false),
        }
    }

    /// True when `get(key)` finds a match, whatever its value
    pub fn has(&self, key: &str) -> bool {
        contains(&self.tree, key)
    }

    /// Replace the whole tree without merging.
    ///
    /// Emits [`RESET_EVENT`] with the new tree unless `silent`.
    pub fn reset_config(&mut self, tree: Map<String, Value>, silent: bool) -> &mut Self {
        self.tree = Value::Object(tree);

        if !silent {
            debug!(event = RESET_EVENT, "config replaced");
            self.events.trigger(RESET_EVENT, &self.tree);
        }
        self
    }
}
