//! Identities of feed items that were already announced or suppressed.

use std::collections::HashSet;

use crate::app::Result;

pub trait Cache {
    fn seen(&self, id: &str) -> bool;
    fn add(&mut self, id: &str) -> Result<()>;
    fn remove(&mut self, id: &str) -> Result<()>;
}

/// Process-lifetime cache; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryCache {
    ids: HashSet<String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Cache for MemoryCache {
    fn seen(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn add(&mut self, id: &str) -> Result<()> {
        self.ids.insert(id.to_string());
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<()> {
        self.ids.remove(id);
        Ok(())
    }
}
