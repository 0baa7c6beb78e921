//! Behavior tables
//!
//! Each type owns one [`Behavior`]: the methods, constructor, and option
//! settings it defines itself. Anything it does not define is looked up on the
//! parent type's table.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use super::ConfigType;
use crate::instance::{Configurable, ConstructOptions};

/// Name of the hook run at the end of construction
pub const INITIALIZE: &str = "initialize";

/// Instance method: receives the instance and positional arguments
pub type Method = Rc<dyn Fn(&mut Configurable, &[Value]) -> Value>;

/// Replacement constructor
pub type Constructor = Rc<dyn Fn(&Construction<'_>) -> Configurable>;

/// Arguments handed to a constructor
pub struct Construction<'a> {
    /// Type the instance is being built for
    pub target: &'a ConfigType,
    /// Type whose constructor is running
    pub owner: &'a ConfigType,
    /// First constructor argument
    pub props: &'a Value,
    /// Second constructor argument
    pub options: &'a ConstructOptions,
}

impl Construction<'_> {
    /// Run the parent's constructor with the same arguments
    pub fn forward_to_parent(&self) -> Configurable {
        self.forward_with(self.props, self.options)
    }

    /// Run the parent's constructor with replacement arguments
    pub fn forward_with(&self, props: &Value, options: &ConstructOptions) -> Configurable {
        match self.owner.parent() {
            Some(parent) => parent.construct_as(self.target, props, options),
            None => Configurable::construct_base(self.target, props, options),
        }
    }
}

/// Methods and construction settings defined directly on one type
#[derive(Clone, Default)]
pub struct Behavior {
    pub(crate) constructor: Option<Constructor>,
    pub(crate) methods: BTreeMap<String, Method>,
    pub(crate) options: Option<Map<String, Value>>,
    pub(crate) config_options: Option<Vec<String>>,
}

impl Behavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the inherited constructor
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Construction<'_>) -> Configurable + 'static,
    {
        self.constructor = Some(Rc::new(constructor));
        self
    }

    /// Define or override a method
    pub fn with_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Configurable, &[Value]) -> Value + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    /// Define the `initialize` hook
    pub fn with_initialize<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Configurable, &[Value]) + 'static,
    {
        self.with_method(INITIALIZE, move |instance, args| {
            hook(instance, args);
            Value::Null
        })
    }

    /// Instance options that constructor options are layered over
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = Some(options);
        self
    }

    /// Option names copied onto instance properties at construction
    pub fn with_config_options<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_options = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Method defined on this table only
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Names of the methods defined on this table
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Install `overrides` on top of this table
    pub(crate) fn overlay(&mut self, overrides: Behavior) {
        if overrides.constructor.is_some() {
            self.constructor = overrides.constructor;
        }
        self.methods.extend(overrides.methods);
        if overrides.options.is_some() {
            self.options = overrides.options;
        }
        if overrides.config_options.is_some() {
            self.config_options = overrides.config_options;
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("constructor", &self.constructor.is_some())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .field("config_options", &self.config_options)
            .finish()
    }
}
