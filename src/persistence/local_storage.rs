//! Browser LocalStorage backend

use wasm_bindgen::JsValue;
use web_sys::Storage;

use super::{PersistError, SaveStore};

pub struct LocalStorageStore {
    storage: Storage,
}

fn backend_error(context: &str, err: JsValue) -> PersistError {
    PersistError::Backend(format!("{}: {:?}", context, err))
}

impl LocalStorageStore {
    /// Open the window's LocalStorage
    pub fn open() -> Result<Self, PersistError> {
        let window =
            web_sys::window().ok_or_else(|| PersistError::Backend("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(|e| backend_error("localStorage access denied", e))?
            .ok_or_else(|| PersistError::Backend("localStorage unavailable".into()))?;
        Ok(Self { storage })
    }
}

impl SaveStore for LocalStorageStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.storage
            .get_item(key)
            .map_err(|e| backend_error("localStorage read failed", e))
    }

    fn set_items(&mut self, items: &[(&str, String)]) -> Result<(), PersistError> {
        for (key, value) in items {
            self.storage
                .set_item(key, value)
                .map_err(|e| backend_error("localStorage write failed", e))?;
        }
        Ok(())
    }

    fn remove_items(&mut self, keys: &[&str]) -> Result<(), PersistError> {
        for key in keys {
            self.storage
                .remove_item(key)
                .map_err(|e| backend_error("localStorage remove failed", e))?;
        }
        Ok(())
    }
}
