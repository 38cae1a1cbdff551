//! Memgauge Host - Evaluator Integration
//!
//! This crate shows how an evaluator threads memory metering through every
//! allocation site:
//!
//! - [`Value`]: the value shapes whose construction is metered
//! - [`MeteredAllocator`]: charges the gauge, then builds the value
//! - [`Executor`] and [`ExecutionContext`]: per-run gauges, staged side
//!   effects, nested invocation and program-level error recovery
//!
//! A metering violation is always fatal. It unwinds the whole run, the
//! staged effects are dropped, and [`ExecutionContext::recover`] never
//! sees it.
//!
//! # Example
//!
//! ```ignore
//! use memgauge_host::prelude::*;
//!
//! let executor = Executor::new(MeterConfig::default().with_limit(4096));
//! let mut storage = Storage::new();
//!
//! let execution = executor.run("greet", &mut storage, |ctx| {
//!     let greeting = ctx.alloc().string("hello")?;
//!     ctx.write("greeting", greeting)?;
//!     Ok(())
//! });
//!
//! assert!(execution.is_success());
//! ```

pub mod allocator;
pub mod error;
pub mod execution;
pub mod value;

pub use allocator::MeteredAllocator;
pub use error::{ExecutionError, ExecutionResult};
pub use execution::{
    DEFAULT_MAX_CALL_DEPTH, Event, Execution, ExecutionContext, Executor, StagedEffects, Storage,
};
pub use value::{ArrayValue, BigUint, CompositeValue, Value};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::allocator::MeteredAllocator;
    pub use crate::error::{ExecutionError, ExecutionResult};
    pub use crate::execution::{Execution, ExecutionContext, Executor, Storage};
    pub use crate::value::{BigUint, Value};
    pub use memgauge_core::{MemoryGauge, MeterConfig};
}
