//! Gauges shared across a nested call tree.
//!
//! When a transaction and the contract calls it makes must stay under one
//! combined ceiling, they share a [`SharedMeter`]. Each check-and-add runs
//! under a single lock, so the limit holds even if nested calls run on
//! different threads. A [`ChildMeter`] adds a sub-limit for one nested call
//! while still charging the shared parent.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use memgauge_core::{
    MemoryGauge, MemoryTotals, MemoryUsage, MeterConfig, MeteringError, MeteringResult,
};

use crate::meter::MemoryMeter;

/// A cloneable handle to one meter shared by several sub-computations.
#[derive(Debug, Clone)]
pub struct SharedMeter {
    inner: Arc<Mutex<MemoryMeter>>,
}

impl SharedMeter {
    /// Create a shared meter with the given configuration.
    pub fn new(config: MeterConfig) -> Self {
        Self::from_meter(MemoryMeter::new(config))
    }

    /// Share an existing meter.
    pub fn from_meter(meter: MemoryMeter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(meter)),
        }
    }

    /// Snapshot of the combined usage.
    pub fn totals(&self) -> MemoryTotals {
        self.inner.lock().totals()
    }

    /// Whether the combined ceiling has been violated.
    pub fn is_exhausted(&self) -> bool {
        self.inner.lock().is_exhausted()
    }

    /// Create a child that enforces `limit` for its own usage and also
    /// charges this meter.
    pub fn child(&self, limit: u64) -> ChildMeter {
        let parent_config = self.inner.lock().config().clone();
        debug!(limit, parent_limit = parent_config.limit, "Created child meter");

        ChildMeter {
            local: MemoryMeter::new(parent_config.with_limit(limit)),
            parent: self.clone(),
        }
    }

    /// Run `f` with exclusive access to the underlying meter.
    pub fn with_meter<R>(&self, f: impl FnOnce(&mut MemoryMeter) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl MemoryGauge for SharedMeter {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        // Check and add happen under one lock.
        self.inner.lock().use_memory(usage)
    }

    fn violation(&self) -> Option<MeteringError> {
        self.inner.lock().violation()
    }
}

/// A nested call's view of a shared meter, with its own sub-limit.
///
/// A usage is committed to neither the child nor the parent unless both
/// accept it.
#[derive(Debug)]
pub struct ChildMeter {
    local: MemoryMeter,
    parent: SharedMeter,
}

impl ChildMeter {
    /// Snapshot of this child's own usage.
    pub fn totals(&self) -> MemoryTotals {
        self.local.totals()
    }

    /// The shared parent.
    pub fn parent(&self) -> &SharedMeter {
        &self.parent
    }
}

impl MemoryGauge for ChildMeter {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        if let Err(error) = self.local.check(usage) {
            self.local.latch(&error);
            return Err(error);
        }
        if let Err(error) = self.parent.use_memory(usage) {
            self.local.latch(&error);
            return Err(error);
        }
        self.local.use_memory(usage)
    }

    // Parent rejections latch locally, so the local meter is enough.
    fn violation(&self) -> Option<MeteringError> {
        self.local.violation()
    }
}
