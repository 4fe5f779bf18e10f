//! Debug-only reentrancy guard.
//!
//! `ChainedHashMap` calls user code (the key hasher and `K: Eq`) while a
//! chain is being walked or relinked. A hasher or `Eq` impl that reaches
//! back into the same table through a raw pointer would observe a half
//! relinked chain, so debug builds panic on nested entry instead. Release
//! builds compile the guard away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table busy flag. Public entry points start with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Shared access from several threads is unsupported: keep the table !Sync.
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _nosync: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "reentrant call into ChainedHashMap from a key hasher or Eq impl"
            );
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _z: PhantomData };
        }
    }
}

/// Clears the busy flag on drop.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}
