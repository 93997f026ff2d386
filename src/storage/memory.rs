use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::KeyValueStore;
use crate::error::{AppError, AppResult};

/// In-memory store for tests and ephemeral sessions.
///
/// Clones share the same entries, so a test can hand one clone to a service
/// and inspect or reload through another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    simulate_write_error: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        if self.simulate_write_error.get() {
            return Err(AppError::Storage("Simulated write error".to_string()));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        if self.simulate_write_error.get() {
            return Err(AppError::Storage("Simulated write error".to_string()));
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
