//! Type-level (static) properties
//!
//! A derived type starts with a by-value copy of its parent's effective
//! statics. Its own statics live in a separate layer that shadows the copy.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticProps {
    inherited: Map<String, Value>,
    own: Map<String, Value>,
}

impl StaticProps {
    /// Statics for a type with no parent
    pub fn new(own: Map<String, Value>) -> Self {
        Self {
            inherited: Map::new(),
            own,
        }
    }

    /// Statics for a derived type: `parent` is flattened into the copied layer
    pub fn derived_from(parent: &StaticProps) -> Self {
        Self {
            inherited: parent.effective(),
            own: Map::new(),
        }
    }

    /// Own layer first, then the copied layer
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.own.get(key).or_else(|| self.inherited.get(key))
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.own.insert(key.into(), value);
    }

    /// Install several own statics
    pub fn extend(&mut self, props: Map<String, Value>) {
        self.own.extend(props);
    }

    /// Drop an own static, uncovering the copied value if there is one
    pub fn remove_own(&mut self, key: &str) -> Option<Value> {
        self.own.remove(key)
    }

    /// Both layers flattened, own values winning
    pub fn effective(&self) -> Map<String, Value> {
        let mut flat = self.inherited.clone();
        for (key, value) in &self.own {
            flat.insert(key.clone(), value.clone());
        }
        flat
    }

    pub fn inherited(&self) -> &Map<String, Value> {
        &self.inherited
    }

    pub fn own(&self) -> &Map<String, Value> {
        &self.own
    }
}
