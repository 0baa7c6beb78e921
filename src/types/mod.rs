//! Configurable types and derivation
//!
//! A [`ConfigType`] pairs a default configuration tree with a behavior table
//! and a set of static properties. [`ConfigType::derive`] builds a child type:
//!
//! 1. the child's constructor is its own, or forwards to the parent's
//! 2. the parent's effective statics are copied into the child by value
//! 3. the child's defaults are a deep clone of the parent's defaults
//! 4. the extension's config is merged into that clone
//! 5. methods the child does not define resolve through the parent
//! 6. the extension's behavior overrides inherited behavior
//! 7. the extension's statics override the copied statics
//! 8. the child keeps a handle to its parent for explicit parent calls
//! 9. the child can itself be derived from
//!
//! Defaults are never shared between a type, its parent, its children, or its
//! instances.

mod behavior;
mod extension;
mod statics;

pub use behavior::{Behavior, Construction, Constructor, Method, INITIALIZE};
pub use extension::Extension;
pub use statics::StaticProps;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use configurator_merge::{clone_tree, merge_into};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::builtin_defaults;
use crate::instance::{Configurable, ConstructOptions};

/// Name of the type returned by [`ConfigType::root`]
pub const ROOT_TYPE_NAME: &str = "Configurator";

/// Version static carried by the root type
pub const VERSION: &str = "0.01";

struct TypeInner {
    name: String,
    parent: Option<ConfigType>,
    defaults: RefCell<Value>,
    statics: RefCell<StaticProps>,
    behavior: Behavior,
}

/// A configurable type: default tree, statics, and behavior.
///
/// Cloning a `ConfigType` clones a handle; both handles name the same type.
#[derive(Clone)]
pub struct ConfigType {
    inner: Rc<TypeInner>,
}

impl ConfigType {
    /// The base type, carrying the built-in default schema
    pub fn root() -> Self {
        let mut statics = Map::new();
        statics.insert("version".to_string(), Value::String(VERSION.to_string()));
        Self::new_root(ROOT_TYPE_NAME, builtin_defaults(), statics, Behavior::new())
    }

    /// A parentless type with its own base configuration
    pub fn with_defaults(name: impl Into<String>, defaults: &Value) -> Self {
        Self::new_root(name, clone_tree(defaults), Map::new(), Behavior::new())
    }

    /// A parentless type with explicit statics and behavior
    pub fn new_root(
        name: impl Into<String>,
        defaults: Value,
        statics: Map<String, Value>,
        behavior: Behavior,
    ) -> Self {
        let defaults = if defaults.is_object() {
            defaults
        } else {
            clone_tree(&defaults)
        };
        Self {
            inner: Rc::new(TypeInner {
                name: name.into(),
                parent: None,
                defaults: RefCell::new(defaults),
                statics: RefCell::new(StaticProps::new(statics)),
                behavior,
            }),
        }
    }

    /// Build a child type
    pub fn derive(&self, name: impl Into<String>, extension: Extension) -> ConfigType {
        let name = name.into();
        let Extension {
            config,
            behavior,
            statics,
        } = extension;

        let mut child_statics = StaticProps::derived_from(&self.inner.statics.borrow());

        let mut defaults = clone_tree(&self.inner.defaults.borrow());
        if let Some(config) = &config {
            merge_into(&mut defaults, config);
        }

        let mut child_behavior = Behavior::new();
        if let Some(overrides) = behavior {
            child_behavior.overlay(overrides);
        }

        if let Some(statics) = statics {
            child_statics.extend(statics);
        }

        debug!(
            parent = %self.inner.name,
            child = %name,
            methods = child_behavior.methods.len(),
            custom_constructor = child_behavior.has_constructor(),
            "derived config type"
        );

        ConfigType {
            inner: Rc::new(TypeInner {
                name,
                parent: Some(self.clone()),
                defaults: RefCell::new(defaults),
                statics: RefCell::new(child_statics),
                behavior: child_behavior,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The type this one was derived from
    pub fn parent(&self) -> Option<&ConfigType> {
        self.inner.parent.as_ref()
    }

    /// This type followed by each ancestor up to the root
    pub fn ancestry(&self) -> impl Iterator<Item = &ConfigType> {
        std::iter::successors(Some(self), |t| t.parent())
    }

    /// The parentless ancestor of this type (or the type itself)
    pub fn root_type(&self) -> &ConfigType {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// True if `other` is this type or one of its ancestors
    pub fn is_a(&self, other: &ConfigType) -> bool {
        self.ancestry().any(|t| t == other)
    }

    /// Independent copy of the default tree
    pub fn defaults(&self) -> Value {
        clone_tree(&self.inner.defaults.borrow())
    }

    /// Read access to the default tree without copying
    pub fn defaults_ref(&self) -> Ref<'_, Value> {
        self.inner.defaults.borrow()
    }

    /// Direct write access to the default tree.
    ///
    /// Changes affect instances constructed afterwards. Existing instances and
    /// derived types hold their own copies and never see them.
    pub fn defaults_mut(&self) -> RefMut<'_, Value> {
        self.inner.defaults.borrow_mut()
    }

    /// Merge `update` into the default tree
    pub fn update_defaults(&self, update: &Value) {
        merge_into(&mut self.inner.defaults.borrow_mut(), update);
    }

    /// Static property, own layer first
    pub fn static_prop(&self, key: &str) -> Option<Value> {
        self.inner.statics.borrow().get(key).cloned()
    }

    /// All statics, flattened
    pub fn statics(&self) -> Map<String, Value> {
        self.inner.statics.borrow().effective()
    }

    /// Record a static in this type's own layer
    pub fn set_static(&self, key: impl Into<String>, value: Value) {
        self.inner.statics.borrow_mut().set(key, value);
    }

    /// The behavior defined directly on this type
    pub fn behavior(&self) -> &Behavior {
        &self.inner.behavior
    }

    /// Resolve a method through this type and its ancestors
    pub fn method(&self, name: &str) -> Option<Method> {
        self.ancestry()
            .find_map(|t| t.inner.behavior.method(name))
            .cloned()
    }

    /// Resolve a method starting at the parent type
    pub fn super_method(&self, name: &str) -> Option<Method> {
        self.parent().and_then(|p| p.method(name))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.ancestry().any(|t| t.inner.behavior.method(name).is_some())
    }

    /// Instance options that constructor options are layered over
    pub fn default_options(&self) -> Map<String, Value> {
        self.ancestry()
            .find_map(|t| t.inner.behavior.options.clone())
            .unwrap_or_default()
    }

    /// Option names copied onto instance properties
    pub fn config_options(&self) -> Vec<String> {
        self.ancestry()
            .find_map(|t| t.inner.behavior.config_options.clone())
            .unwrap_or_default()
    }

    /// Construct an instance of this type
    pub fn construct(&self, props: Option<&Value>, options: ConstructOptions) -> Configurable {
        self.construct_as(self, props.unwrap_or(&Value::Null), &options)
    }

    /// Construct an instance with no overrides
    pub fn instance(&self) -> Configurable {
        self.construct(None, ConstructOptions::default())
    }

    /// Run this type's constructor (own or inherited) to build a `target` instance
    pub fn construct_as(
        &self,
        target: &ConfigType,
        props: &Value,
        options: &ConstructOptions,
    ) -> Configurable {
        let inherited = self.ancestry().find_map(|t| {
            t.inner
                .behavior
                .constructor
                .clone()
                .map(|constructor| (t, constructor))
        });

        match inherited {
            Some((owner, constructor)) => constructor(&Construction {
                target,
                owner,
                props,
                options,
            }),
            None => Configurable::construct_base(target, props, options),
        }
    }
}

impl PartialEq for ConfigType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ConfigType {}

impl fmt::Debug for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigType")
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(|p| p.name()))
            .field("behavior", &self.inner.behavior)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> ConfigType {
        ConfigType::with_defaults("Base", &json!({"a": {"x": 1}}))
    }

    #[test]
    fn test_root_carries_builtin_defaults() {
        let root = ConfigType::root();
        assert_eq!(root.name(), ROOT_TYPE_NAME);
        assert_eq!(root.defaults_ref()["router"]["routes"][""], "index");
        assert_eq!(root.static_prop("version"), Some(json!(VERSION)));
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_child_config_is_additive() {
        let child = base().derive(
            "Child",
            Extension::new().with_config(json!({"a": {"y": 2}, "b": true})),
        );
        assert_eq!(child.defaults(), json!({"a": {"x": 1, "y": 2}, "b": true}));
    }

    #[test]
    fn test_defaults_isolated_both_ways() {
        let parent = base();
        let child = parent.derive("Child", Extension::new().with_config(json!({"a": {"x": 2}})));

        parent.defaults_mut()["a"]["x"] = json!(10);
        assert_eq!(child.defaults_ref()["a"]["x"], 2);

        child.defaults_mut()["a"]["x"] = json!(20);
        assert_eq!(parent.defaults_ref()["a"]["x"], 10);
    }

    #[test]
    fn test_statics_copied_then_overridden() {
        let parent = base();
        parent.set_static("kind", json!("base"));
        parent.set_static("shared", json!(1));

        let child = parent.derive("Child", Extension::new().with_static("kind", json!("child")));
        parent.set_static("shared", json!(2));

        assert_eq!(child.static_prop("kind"), Some(json!("child")));
        assert_eq!(child.static_prop("shared"), Some(json!(1)));
        assert_eq!(parent.static_prop("kind"), Some(json!("base")));
    }

    #[test]
    fn test_method_resolution_and_super() {
        let parent = base().derive(
            "Parent",
            Extension::new()
                .with_method("describe", |_, _| json!("parent"))
                .with_method("only_parent", |_, _| json!(true)),
        );
        let child = parent.derive(
            "Child",
            Extension::new().with_method("describe", |_, _| json!("child")),
        );

        let mut instance = child.instance();
        assert_eq!(instance.invoke("describe", &[]), Some(json!("child")));
        assert_eq!(instance.invoke("only_parent", &[]), Some(json!(true)));
        assert_eq!(instance.invoke("missing", &[]), None);

        let inherited = child.super_method("describe").map(|m| m(&mut instance, &[]));
        assert_eq!(inherited, Some(json!("parent")));
    }

    #[test]
    fn test_ancestry_and_is_a() {
        let root = base();
        let mid = root.derive("Mid", Extension::new());
        let leaf = mid.derive("Leaf", Extension::new());

        let names: Vec<&str> = leaf.ancestry().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Leaf", "Mid", "Base"]);
        assert_eq!(leaf.root_type(), &root);
        assert!(leaf.is_a(&mid));
        assert!(!mid.is_a(&leaf));
    }

    #[test]
    fn test_derive_does_not_construct() {
        use std::cell::Cell;
        use std::rc::Rc;

        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let parent = base().derive(
            "Parent",
            Extension::new().with_constructor(move |c| {
                counter.set(counter.get() + 1);
                c.forward_to_parent()
            }),
        );

        let child = parent.derive("Child", Extension::new());
        assert_eq!(calls.get(), 0);

        let instance = child.instance();
        assert_eq!(calls.get(), 1);
        assert_eq!(instance.kind(), &child);
    }

    #[test]
    fn test_with_defaults_normalizes_non_objects() {
        let t = ConfigType::with_defaults("Odd", &json!(null));
        assert_eq!(t.defaults(), json!({}));
    }
}
