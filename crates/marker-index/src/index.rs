//! In-memory mirror of the marker directory

use std::collections::HashSet;

/// Known entry names: a set for membership plus a discovery-ordered list.
///
/// Both always hold exactly the same names. Recency lives on disk, so
/// nothing here reorders on access.
#[derive(Debug, Default)]
pub struct PresenceIndex {
    names: HashSet<String>,
    order: Vec<String>,
}

impl PresenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Add a name. Returns false if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string());
        self.order.push(name.to_string());
        true
    }

    /// Replace the contents wholesale with `names`, keeping their order
    pub fn rebuild(&mut self, names: Vec<String>) {
        self.names.clear();
        self.order.clear();
        for name in names {
            if self.names.insert(name.clone()) {
                self.order.push(name);
            }
        }
    }

    pub fn remove_many(&mut self, names: &[String]) {
        let mut removed = false;
        for name in names {
            removed |= self.names.remove(name);
        }
        if removed {
            let names = &self.names;
            self.order.retain(|n| names.contains(n));
        }
    }

    /// All names in discovery order
    pub fn snapshot(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Empty the index, returning what it held
    pub fn clear(&mut self) -> Vec<String> {
        self.names.clear();
        std::mem::take(&mut self.order)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
