//! Memgauge Meter
//!
//! This crate provides the concrete memory gauges used by the runtime:
//!
//! - Per-run accounting via [`MemoryMeter`]
//! - Combined ceilings for nested calls via [`SharedMeter`] and [`ChildMeter`]
//! - Test doubles in [`testing`]
//!
//! # Metering Strategy
//!
//! 1. **One meter per run**: every script or transaction gets a fresh
//!    [`MemoryMeter`] that it owns exclusively, so no locking is needed.
//! 2. **Monotonic totals**: usage is never reclaimed mid-run. The meter
//!    models peak allocation pressure, not the live set.
//! 3. **Fatal violations**: the first usage that exceeds the limit or
//!    overflows the accounting domain exhausts the meter.
//!
//! ```ignore
//! use memgauge_meter::prelude::*;
//!
//! let mut meter = MemoryMeter::new(MeterConfig::default().with_limit(1024));
//! meter.use_memory(string_usage(11)?)?;
//! println!("{:?}", meter.totals());
//! ```
//!
//! ## Shared Ceilings
//!
//! ```ignore
//! let shared = SharedMeter::new(MeterConfig::default());
//! let mut call = shared.child(4096);
//! call.use_memory(usage)?; // charged to both
//! ```

pub mod meter;
pub mod shared;
pub mod testing;

// Re-export main types
pub use meter::MemoryMeter;
pub use shared::{ChildMeter, SharedMeter};
pub use testing::{NoopGauge, RecordingGauge};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::meter::MemoryMeter;
    pub use crate::shared::{ChildMeter, SharedMeter};
    pub use memgauge_core::prelude::*;
}
