//! Arguments to [`ConfigType::derive`](super::ConfigType::derive)

use serde_json::{Map, Value};

use super::behavior::{Behavior, Construction};
use crate::instance::Configurable;

/// Config overrides, behavior overrides, and statics for a derived type
#[derive(Debug, Clone, Default)]
pub struct Extension {
    /// Merged into the copy of the parent's defaults
    pub config: Option<Value>,
    /// Installed over the parent's behavior
    pub behavior: Option<Behavior>,
    /// Installed over the copy of the parent's statics
    pub statics: Option<Map<String, Value>>,
}

impl Extension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_statics(mut self, statics: Map<String, Value>) -> Self {
        self.statics = Some(statics);
        self
    }

    pub fn with_static(mut self, key: impl Into<String>, value: Value) -> Self {
        self.statics
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_method<F>(self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Configurable, &[Value]) -> Value + 'static,
    {
        self.map_behavior(|b| b.with_method(name, method))
    }

    pub fn with_initialize<F>(self, hook: F) -> Self
    where
        F: Fn(&mut Configurable, &[Value]) + 'static,
    {
        self.map_behavior(|b| b.with_initialize(hook))
    }

    pub fn with_constructor<F>(self, constructor: F) -> Self
    where
        F: Fn(&Construction<'_>) -> Configurable + 'static,
    {
        self.map_behavior(|b| b.with_constructor(constructor))
    }

    fn map_behavior(mut self, f: impl FnOnce(Behavior) -> Behavior) -> Self {
        let behavior = self.behavior.take().unwrap_or_default();
        self.behavior = Some(f(behavior));
        self
    }
}
