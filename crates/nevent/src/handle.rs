//! Opaque handles addressing emitter objects in the host.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// External reference to a host object.
///
/// A handle is the only thing the hosting side holds on to; the native
/// emitter behind it is reached through the host's handle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    /// Wrap a raw handle id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id of this handle.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic handle allocator. Ids are never reused.
#[derive(Debug)]
pub(crate) struct HandleAllocator {
    next: AtomicU64,
}

impl HandleAllocator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next(&self) -> Handle {
        Handle(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let alloc = HandleAllocator::new();
        let a = alloc.next();
        let b = alloc.next();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(Handle::from_raw(7).to_string(), "#7");
        assert_eq!(Handle::from_raw(7).as_raw(), 7);
    }
}
