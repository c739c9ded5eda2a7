//! Allocation instrumentation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::shape::ShapeId;

/// Size of an allocation as seen by a reporter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AllocationSize {
    /// Object layout grows after construction; no fixed size is known.
    Unknown,
    Bytes(usize),
}

/// Observer notified around every object allocation.
///
/// `on_enter` precedes construction and `on_return` follows it, so a
/// reporter can attribute everything in between to the allocation.
pub trait AllocationReporter: Send + Sync {
    fn on_enter(&self, size: AllocationSize);

    fn on_return(&self, shape: ShapeId, size: AllocationSize);
}

/// Reporter that ignores every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopReporter;

impl AllocationReporter for NoopReporter {
    #[inline]
    fn on_enter(&self, _size: AllocationSize) {}

    #[inline]
    fn on_return(&self, _shape: ShapeId, _size: AllocationSize) {}
}

/// Reporter that counts events, used by `--alloc-stats` and tests.
#[derive(Debug, Default)]
pub struct CountingReporter {
    entered: AtomicU64,
    returned: AtomicU64,
}

impl CountingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entered(&self) -> u64 {
        self.entered.load(Ordering::Relaxed)
    }

    pub fn returned(&self) -> u64 {
        self.returned.load(Ordering::Relaxed)
    }
}

impl AllocationReporter for CountingReporter {
    fn on_enter(&self, _size: AllocationSize) {
        self.entered.fetch_add(1, Ordering::Relaxed);
    }

    fn on_return(&self, _shape: ShapeId, _size: AllocationSize) {
        self.returned.fetch_add(1, Ordering::Relaxed);
    }
}
