//! Name to class resolution
//!
//! The bridge consumes a resolver; it does not decide how foreign type names
//! map onto script classes. A resolver may answer with several candidates
//! (for example an array-wrapped or ambiguous result); the bridge unwraps
//! those iteratively and takes the first.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::class::ScriptClassRef;

/// Answer of a [`ClassResolver`]
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A concrete class
    Class(ScriptClassRef),
    /// Several answers, in preference order
    Candidates(Vec<Resolution>),
    /// The name is not known
    Unknown,
}

impl Resolution {
    /// Unwrap to a concrete class, taking the first candidate at every level
    pub fn into_class(self) -> Option<ScriptClassRef> {
        let mut cur = self;
        loop {
            match cur {
                Resolution::Class(cls) => return Some(cls),
                Resolution::Candidates(list) => cur = list.into_iter().next()?,
                Resolution::Unknown => return None,
            }
        }
    }
}

impl From<ScriptClassRef> for Resolution {
    fn from(cls: ScriptClassRef) -> Self {
        Resolution::Class(cls)
    }
}

/// Maps dotted foreign type names to script classes
pub trait ClassResolver {
    /// Resolve a dotted foreign type name (`java.lang.String`)
    fn resolve(&self, name: &str) -> Resolution;
}

/// Resolver backed by a table of registered classes
#[derive(Default)]
pub struct ClassRegistry {
    entries: RefCell<FxHashMap<String, Resolution>>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under its foreign name
    pub fn register(&self, cls: ScriptClassRef) {
        let name = cls.foreign_name().to_string();
        self.entries.borrow_mut().insert(name, Resolution::Class(cls));
    }

    /// Register an arbitrary answer for `name`
    pub fn insert(&self, name: impl Into<String>, resolution: Resolution) {
        self.entries.borrow_mut().insert(name.into(), resolution);
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve(&self, name: &str) -> Resolution {
        self.entries
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Resolution::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ScriptClass;
    use std::rc::Rc;

    #[test]
    fn test_into_class_unwraps_candidates() {
        let a = ScriptClass::new("A", "test.A", None);
        let b = ScriptClass::new("B", "test.B", None);
        let nested = Resolution::Candidates(vec![
            Resolution::Candidates(vec![Resolution::Class(a.clone()), Resolution::Class(b)]),
            Resolution::Unknown,
        ]);
        let cls = nested.into_class().unwrap();
        assert!(Rc::ptr_eq(&cls, &a));
    }

    #[test]
    fn test_empty_candidates_is_unknown() {
        assert!(Resolution::Candidates(vec![]).into_class().is_none());
        assert!(Resolution::Unknown.into_class().is_none());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ClassRegistry::new();
        let list = ScriptClass::new("List", "java.util.ArrayList", None);
        registry.register(list.clone());
        assert_eq!(registry.len(), 1);
        let found = registry.resolve("java.util.ArrayList").into_class().unwrap();
        assert!(Rc::ptr_eq(&found, &list));
        assert!(registry.resolve("java.util.HashMap").into_class().is_none());
    }
}
