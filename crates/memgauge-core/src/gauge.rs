//! The memory gauge capability.
//!
//! Anything that meters memory depends on [`MemoryGauge`] only. Concrete
//! accumulators, shared gauges, and test doubles live in `memgauge-meter`.

use crate::error::{MeteringError, MeteringResult};
use crate::usage::MemoryUsage;

/// Accepts usage records and enforces a ceiling on their sum.
///
/// An `Err` is fatal: the caller must abort the current execution and must
/// not surface the error to the metered program as a catchable value.
pub trait MemoryGauge {
    /// Record one usage.
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()>;

    /// Record several usages in order, stopping at the first failure.
    fn use_memory_all<I>(&mut self, usages: I) -> MeteringResult<()>
    where
        I: IntoIterator<Item = MemoryUsage>,
        Self: Sized,
    {
        for usage in usages {
            self.use_memory(usage)?;
        }
        Ok(())
    }

    /// The first violation this gauge reported, if it keeps track.
    ///
    /// A run that returns normally after its gauge reported a violation
    /// still failed; executors check this before committing effects.
    fn violation(&self) -> Option<MeteringError> {
        None
    }
}

impl<G: MemoryGauge + ?Sized> MemoryGauge for &mut G {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        (**self).use_memory(usage)
    }

    fn violation(&self) -> Option<MeteringError> {
        (**self).violation()
    }
}

impl<G: MemoryGauge + ?Sized> MemoryGauge for Box<G> {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        (**self).use_memory(usage)
    }

    fn violation(&self) -> Option<MeteringError> {
        (**self).violation()
    }
}

/// Record a usage against an optional gauge. No gauge means unmetered.
pub fn use_memory(gauge: Option<&mut dyn MemoryGauge>, usage: MemoryUsage) -> MeteringResult<()> {
    match gauge {
        Some(gauge) => gauge.use_memory(usage),
        None => Ok(()),
    }
}

/// Record several usages against an optional gauge.
pub fn use_memory_all<I>(gauge: Option<&mut dyn MemoryGauge>, usages: I) -> MeteringResult<()>
where
    I: IntoIterator<Item = MemoryUsage>,
{
    if let Some(gauge) = gauge {
        for usage in usages {
            gauge.use_memory(usage)?;
        }
    }
    Ok(())
}
