//! Symbol table for kernel emission.
//!
//! `Scope` uses `im::HashMap` for O(1) structural-sharing clone, so entering
//! a let or loop body is a cheap `child()` swapped in with `mem::replace`
//! and swapped back out when the body is done. The parent is never mutated,
//! so an inner binding cannot leak past its scope whatever the exit path.

use im::HashMap;

use crate::id::Id;

/// Name → result id bindings visible at one point of a kernel.
#[derive(Clone, Debug)]
pub struct Scope {
    bindings: HashMap<String, Id>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// A scope inheriting every binding of `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Bind `name`, shadowing any outer binding.
    pub fn bind(&mut self, name: impl Into<String>, id: Id) {
        self.bindings.insert(name.into(), id);
    }

    pub fn lookup(&self, name: &str) -> Option<Id> {
        self.bindings.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
