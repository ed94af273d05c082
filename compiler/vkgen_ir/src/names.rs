//! Hygienic name generation for rewrites.
//!
//! Rewrites that introduce let bindings need names that cannot capture or
//! shadow anything the front end produced. Front-end names never contain
//! `$`, so `prefix$N` names are always fresh.

/// Per-compile generator of fresh binding names.
#[derive(Debug, Default)]
pub struct UniqueNames {
    next: u32,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// A name of the form `prefix$N`, distinct from every earlier result.
    pub fn fresh(&mut self, prefix: &str) -> String {
        let n = self.next;
        self.next += 1;
        format!("{prefix}${n}")
    }
}
