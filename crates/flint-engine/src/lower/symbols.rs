//! Variable symbol table
//!
//! Maps variable names to the stack slot that backs them within one function.

use crate::ir::MemorySlot;
use rustc_hash::FxHashMap;

/// Name -> slot mapping scoped to one function's lowering
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    slots: FxHashMap<String, MemorySlot>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` already has a slot
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Bind `name` to `slot`, replacing any previous binding
    pub fn insert(&mut self, name: impl Into<String>, slot: MemorySlot) {
        self.slots.insert(name.into(), slot);
    }

    /// Slot bound to `name`
    pub fn get(&self, name: &str) -> Option<MemorySlot> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ValueId;

    #[test]
    fn test_insert_and_get() {
        let mut symbols = SymbolTable::new();
        assert!(symbols.is_empty());
        assert!(!symbols.contains("a"));
        assert_eq!(symbols.get("a"), None);

        let slot = MemorySlot::new(ValueId(3));
        symbols.insert("a", slot);

        assert!(symbols.contains("a"));
        assert_eq!(symbols.get("a"), Some(slot));
        assert_eq!(symbols.len(), 1);
    }
}
