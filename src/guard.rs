//! Re-entrancy guard and per-operation busy flags.
//!
//! Both are released by `Drop`, so every exit path of an operation
//! (success, error, early return) clears them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mutating operations gated by the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Save,
    Disconnect,
    StartIndexing,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Save,
        Operation::Disconnect,
        Operation::StartIndexing,
    ];

    fn index(self) -> usize {
        match self {
            Operation::Create => 0,
            Operation::Save => 1,
            Operation::Disconnect => 2,
            Operation::StartIndexing => 3,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Save => "save",
            Operation::Disconnect => "disconnect",
            Operation::StartIndexing => "start_indexing",
        })
    }
}

/// Allows at most one mutating operation in flight.
///
/// The check-and-set is synchronous, so a second call issued before the
/// first one's network request resolves is turned away immediately.
#[derive(Clone, Default)]
pub struct SubmissionGuard {
    latch: Arc<AtomicBool>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SubmissionPermit> {
        self.latch
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SubmissionPermit {
                latch: Arc::clone(&self.latch),
            })
    }

    pub fn is_held(&self) -> bool {
        self.latch.load(Ordering::SeqCst)
    }
}

/// Held while a guarded operation runs.
#[must_use = "the guard is released as soon as the permit is dropped"]
pub struct SubmissionPermit {
    latch: Arc<AtomicBool>,
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.latch.store(false, Ordering::SeqCst);
    }
}

/// Busy flags exposed to the host to disable controls.
#[derive(Clone, Default)]
pub struct BusyFlags {
    flags: Arc<[AtomicBool; 4]>,
}

impl BusyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self, op: Operation) -> BusyToken {
        self.flags[op.index()].store(true, Ordering::SeqCst);
        BusyToken {
            flags: Arc::clone(&self.flags),
            op,
        }
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.flags[op.index()].load(Ordering::SeqCst)
    }

    pub fn any(&self) -> bool {
        Operation::ALL.into_iter().any(|op| self.is_busy(op))
    }
}

/// Clears its busy flag on drop.
#[must_use = "the busy flag is cleared as soon as the token is dropped"]
pub struct BusyToken {
    flags: Arc<[AtomicBool; 4]>,
    op: Operation,
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        self.flags[self.op.index()].store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_admits_one_holder() {
        let guard = SubmissionGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn fails(guard: &SubmissionGuard) -> Result<(), &'static str> {
            let _permit = guard.try_acquire().ok_or("busy")?;
            Err("boom")
        }

        let guard = SubmissionGuard::new();
        assert_eq!(fails(&guard), Err("boom"));
        assert!(!guard.is_held());
    }

    #[test]
    fn test_busy_flags_are_independent() {
        let flags = BusyFlags::new();
        let saving = flags.raise(Operation::Save);
        assert!(flags.is_busy(Operation::Save));
        assert!(!flags.is_busy(Operation::Disconnect));
        assert!(flags.any());

        drop(saving);
        assert!(!flags.is_busy(Operation::Save));
        assert!(!flags.any());
    }
}
