//! # String Interner
//!
//! Item names, pin names and type names come back from the engine over and
//! over. The interner keeps one shared copy of each so proxies can hand out
//! `Arc<str>` without reallocating per call.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Concurrent string pool.
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: DashMap<Arc<str>, ()>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pooled copy of `value`, adding it if missing. Equal inputs
    /// always yield pointer-equal results.
    pub fn intern(&self, value: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(value) {
            return Arc::clone(existing.key());
        }

        let candidate: Arc<str> = Arc::from(value);
        match self.strings.entry(Arc::clone(&candidate)) {
            // Another task won the race between get and entry
            Entry::Occupied(entry) => Arc::clone(entry.key()),
            Entry::Vacant(entry) => {
                entry.insert(());
                candidate
            }
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Drops every pooled string. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.strings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_shares_storage() {
        let interner = StringInterner::new();
        let a = interner.intern("camera");
        let b = interner.intern(&String::from("camera"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);

        let c = interner.intern("kernel");
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_clear_keeps_handed_out_strings() {
        let interner = StringInterner::new();
        let name = interner.intern("Render target");
        interner.clear();
        assert!(interner.is_empty());
        assert_eq!(&*name, "Render target");

        // A fresh copy is pooled after clearing
        let again = interner.intern("Render target");
        assert!(!Arc::ptr_eq(&name, &again));
    }
}
