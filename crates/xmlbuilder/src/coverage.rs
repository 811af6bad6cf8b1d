//! Record which declared properties and suboptions were actually exercised.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::schema::Schema;

#[derive(Debug, Default)]
struct State {
    declared_properties: BTreeSet<String>,
    touched_properties: BTreeSet<String>,
    declared_suboptions: BTreeSet<String>,
    seen_suboptions: BTreeSet<String>,
}

/// Shared declared/touched bookkeeping. Attach one instance to builders and
/// parsers through an `Arc`; a test run then asserts nothing was missed.
#[derive(Debug, Default)]
pub struct Coverage {
    state: Mutex<State>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CoverageReport {
    pub declared_properties: usize,
    pub declared_suboptions: usize,
    pub untouched_properties: Vec<String>,
    pub unseen_suboptions: Vec<String>,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.untouched_properties.is_empty() && self.unseen_suboptions.is_empty()
    }
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Declare every property of `schema` and, recursively, of its children.
    pub fn declare_schema(&self, schema: &Schema) {
        let mut visited = BTreeSet::new();
        self.declare_recursive(schema, &mut visited);
    }

    fn declare_recursive(&self, schema: &Schema, visited: &mut BTreeSet<&'static str>) {
        if !visited.insert(schema.kind()) {
            return;
        }
        {
            let mut state = self.state();
            for spec in schema.properties() {
                state
                    .declared_properties
                    .insert(property_key(schema.kind(), spec.name));
            }
        }
        for child in schema.children() {
            self.declare_recursive((child.schema)(), visited);
        }
    }

    pub fn touch_property(&self, kind: &str, name: &str) {
        self.state().touched_properties.insert(property_key(kind, name));
    }

    pub fn declare_suboption(&self, name: impl Into<String>) {
        self.state().declared_suboptions.insert(name.into());
    }

    pub fn mark_suboption(&self, name: impl Into<String>) {
        self.state().seen_suboptions.insert(name.into());
    }

    pub fn untouched_properties(&self) -> Vec<String> {
        let state = self.state();
        state
            .declared_properties
            .difference(&state.touched_properties)
            .cloned()
            .collect()
    }

    pub fn unseen_suboptions(&self) -> Vec<String> {
        let state = self.state();
        state
            .declared_suboptions
            .difference(&state.seen_suboptions)
            .cloned()
            .collect()
    }

    pub fn report(&self) -> CoverageReport {
        let (declared_properties, declared_suboptions) = {
            let state = self.state();
            (
                state.declared_properties.len(),
                state.declared_suboptions.len(),
            )
        };
        CoverageReport {
            declared_properties,
            declared_suboptions,
            untouched_properties: self.untouched_properties(),
            unseen_suboptions: self.unseen_suboptions(),
        }
    }
}

fn property_key(kind: &str, name: &str) -> String {
    format!("{kind}.{name}")
}
