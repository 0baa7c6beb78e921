//! Configurable instances
//!
//! Construction contract, shared by every type:
//! 1. start from a clone of the type's defaults, or `{}` when `fresh`
//! 2. merge the constructor props silently
//! 3. layer the options over the type's default options and copy the
//!    allow-listed ones onto instance properties
//! 4. run the `initialize` hook with the original arguments

use configurator_events::{Event, EventChannel, ListenerId};
use configurator_merge::is_truthy;
use serde_json::{Map, Value};
use tracing::debug;

use crate::store::{Announce, ConfigStore};
use crate::types::{ConfigType, INITIALIZE};

/// Option key requesting an empty starting tree
pub const FRESH_OPTION: &str = "fresh";

/// Second constructor argument: a free-form option map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructOptions {
    options: Map<String, Value>,
}

impl ConstructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with `fresh: true`
    pub fn fresh() -> Self {
        Self::new().with(FRESH_OPTION, Value::Bool(true))
    }

    /// Options read from a value; anything but an object yields no options
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(options) => Self {
                options: options.clone(),
            },
            _ => Self::default(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Whether construction skips the type defaults
    pub fn is_fresh(&self) -> bool {
        self.options.get(FRESH_OPTION).map(is_truthy).unwrap_or(false)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.options.clone())
    }
}

/// An instance of a [`ConfigType`], owning a private configuration tree
#[derive(Debug)]
pub struct Configurable {
    kind: ConfigType,
    store: ConfigStore,
    options: Map<String, Value>,
    properties: Map<String, Value>,
}

impl Configurable {
    /// Construct an instance of `kind`
    pub fn new(kind: &ConfigType, props: Option<&Value>, options: ConstructOptions) -> Self {
        kind.construct(props, options)
    }

    /// The root construction steps, without consulting any replacement constructor
    pub fn construct_base(target: &ConfigType, props: &Value, options: &ConstructOptions) -> Self {
        let tree = if options.is_fresh() {
            Value::Object(Map::new())
        } else {
            target.defaults()
        };

        let mut instance = Self {
            kind: target.clone(),
            store: ConfigStore::with_tree(tree),
            options: Map::new(),
            properties: Map::new(),
        };

        instance.store.add(props, Announce::Silent);
        instance.configure(options);

        if let Some(initialize) = target.method(INITIALIZE) {
            let args = [props.clone(), options.to_value()];
            initialize(&mut instance, &args[..]);
        }

        debug!(
            kind = %target.name(),
            fresh = options.is_fresh(),
            "constructed configurable"
        );
        instance
    }

    /// Instance of the root of `kind`'s hierarchy holding exactly `tree`
    fn wrap(kind: &ConfigType, tree: &Value) -> Self {
        kind.root_type().construct(Some(tree), ConstructOptions::fresh())
    }

    fn configure(&mut self, options: &ConstructOptions) {
        let mut merged = self.kind.default_options();
        for (key, value) in options.as_map() {
            merged.insert(key.clone(), value.clone());
        }

        for name in self.kind.config_options() {
            if let Some(value) = merged.get(&name).filter(|v| is_truthy(v)) {
                self.properties.insert(name, value.clone());
            }
        }
        self.options = merged;
    }

    pub fn kind(&self) -> &ConfigType {
        &self.kind
    }

    /// The instance's whole configuration tree
    pub fn config(&self) -> &Value {
        self.store.tree()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Options recorded at construction
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Allow-listed option copied at construction, or set later
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// See [`ConfigStore::add`]
    pub fn add(&mut self, update: &Value, announce: Announce) -> &mut Self {
        self.store.add(update, announce);
        self
    }

    /// Alias for [`Configurable::add`]
    pub fn set(&mut self, update: &Value, announce: Announce) -> &mut Self {
        self.add(update, announce)
    }

    /// See [`ConfigStore::get`]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    /// See [`ConfigStore::get_or_false`]
    pub fn get_or_false(&self, key: &str) -> Value {
        self.store.get_or_false(key)
    }

    /// Resolve `key` and wrap the match in a fresh instance.
    ///
    /// The wrapper is an instance of this hierarchy's root type whose tree is
    /// the matched value alone; a non-object match gives an empty tree.
    pub fn get_wrapped(&self, key: &str) -> Option<Configurable> {
        self.get(key).map(|matched| Self::wrap(&self.kind, matched))
    }

    /// Fresh wrapper around `get(key)`; a miss gives an empty instance
    pub fn get_config(&self, key: &str) -> Configurable {
        Self::wrap(&self.kind, self.get(key).unwrap_or(&Value::Null))
    }

    /// Fresh wrapper around the whole tree
    pub fn whole_config(&self) -> Configurable {
        self.get_config(configurator_merge::WHOLE_TREE_KEY)
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.has(key)
    }

    /// See [`ConfigStore::reset_config`]
    pub fn reset_config(&mut self, tree: Map<String, Value>, silent: bool) -> &mut Self {
        self.store.reset_config(tree, silent);
        self
    }

    pub fn events(&self) -> &EventChannel {
        self.store.events()
    }

    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Event<'_>) + 'static,
    {
        self.store.on(event, callback)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.store.events().off(event, id)
    }

    pub fn trigger(&self, event: &str, payload: &Value) -> usize {
        self.store.events().trigger(event, payload)
    }

    /// Call a method resolved through the type hierarchy.
    ///
    /// Returns `None` when no type in the chain defines `name`.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Option<Value> {
        let method = self.kind.method(name)?;
        Some(method(self, args))
    }
}
