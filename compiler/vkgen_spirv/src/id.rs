//! Result ids and their allocator.

use std::fmt;

/// A SPIR-V result id.
///
/// Ids are unique within one module and never reused. Zero is reserved as
/// invalid and is never handed out by [`IdAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Id(u32);

impl Id {
    /// The reserved invalid id.
    pub const INVALID: Id = Id(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Id(raw)
    }

    /// The raw operand word.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Sequential id counter shared by every segment of a module.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { next: 1 }
    }

    /// Hand out the next id.
    #[inline]
    pub fn allocate(&mut self) -> Id {
        let id = Id(self.next);
        self.next += 1;
        id
    }

    /// One past the highest id handed out; the module header's bound.
    #[inline]
    pub fn bound(&self) -> u32 {
        self.next
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
