//! In-memory store for tests and headless runs

use std::collections::HashMap;

use super::{PersistError, SaveStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SaveStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_items(&mut self, items: &[(&str, String)]) -> Result<(), PersistError> {
        for (key, value) in items {
            self.items.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn remove_items(&mut self, keys: &[&str]) -> Result<(), PersistError> {
        for key in keys {
            self.items.remove(*key);
        }
        Ok(())
    }
}
