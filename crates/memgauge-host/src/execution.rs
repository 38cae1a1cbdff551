//! Metered execution of scripts and transactions.
//!
//! An [`Executor`] gives every run a fresh gauge and an [`ExecutionContext`]
//! that stages side effects. Staged effects reach the caller's [`Storage`]
//! only when the run succeeds, so an aborted run leaves nothing behind.

use std::collections::BTreeMap;

use memgauge_core::{MemoryGauge, MemoryTotals, MeterConfig};
use memgauge_meter::MemoryMeter;
use tracing::{debug, warn};

use crate::allocator::MeteredAllocator;
use crate::error::{ExecutionError, ExecutionResult};
use crate::value::Value;

/// Default maximum depth of nested invocations.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// An event emitted by a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name.
    pub name: String,
    /// Event payload.
    pub payload: Value,
}

/// Persistent state that executions read and commit to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Storage {
    values: BTreeMap<String, Value>,
    events: Vec<Event>,
}

impl Storage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a stored value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store a value outside of any execution.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Events committed so far.
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

/// Side effects staged by a run, not yet visible in [`Storage`].
#[derive(Debug, Clone, Default)]
pub struct StagedEffects {
    writes: BTreeMap<String, Option<Value>>,
    events: Vec<Event>,
}

impl StagedEffects {
    /// Number of staged writes and removals.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Number of staged events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.events.is_empty()
    }

    /// Apply everything to `storage`.
    pub fn commit(self, storage: &mut Storage) {
        for (key, value) in self.writes {
            match value {
                Some(value) => {
                    storage.values.insert(key, value);
                }
                None => {
                    storage.values.remove(&key);
                }
            }
        }
        storage.events.extend(self.events);
    }
}

/// State available to a running program.
pub struct ExecutionContext<'s, G> {
    alloc: MeteredAllocator<G>,
    storage: &'s Storage,
    staged: StagedEffects,
    depth: usize,
    max_depth: usize,
}

impl<'s, G: MemoryGauge> ExecutionContext<'s, G> {
    /// Create a context reading from `storage` and charging `gauge`.
    pub fn new(gauge: G, storage: &'s Storage) -> Self {
        Self {
            alloc: MeteredAllocator::new(gauge),
            storage,
            staged: StagedEffects::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Set the maximum nesting depth for [`invoke`](Self::invoke).
    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The metered allocator. All values must be built through it.
    pub fn alloc(&mut self) -> &mut MeteredAllocator<G> {
        &mut self.alloc
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Effects staged so far.
    pub fn staged(&self) -> &StagedEffects {
        &self.staged
    }

    /// Read a value, seeing this run's own staged writes.
    pub fn read(&self, key: &str) -> Option<&Value> {
        match self.staged.writes.get(key) {
            Some(staged) => staged.as_ref(),
            None => self.storage.get(key),
        }
    }

    /// Stage a write. The storage path is charged.
    pub fn write(&mut self, key: &str, value: Value) -> ExecutionResult<()> {
        let usage = self.alloc.table().path_usage(key.len())?;
        self.alloc.charge(usage)?;
        self.staged.writes.insert(key.to_owned(), Some(value));
        Ok(())
    }

    /// Stage a removal, returning the value that was visible.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let previous = self.read(key).cloned();
        if previous.is_some() {
            self.staged.writes.insert(key.to_owned(), None);
        }
        previous
    }

    /// Stage an event. The event name is charged as a string.
    pub fn emit(&mut self, name: &str, payload: Value) -> ExecutionResult<()> {
        let usage = self.alloc.table().string_usage(name.len())?;
        self.alloc.charge(usage)?;
        self.staged.events.push(Event {
            name: name.to_owned(),
            payload,
        });
        Ok(())
    }

    /// Run a nested call against the same gauge and staged effects.
    pub fn invoke<R>(
        &mut self,
        name: &str,
        call: impl FnOnce(&mut Self) -> ExecutionResult<R>,
    ) -> ExecutionResult<R> {
        if self.depth >= self.max_depth {
            return Err(ExecutionError::CallDepthExceeded {
                limit: self.max_depth,
            });
        }

        self.depth += 1;
        debug!(function = name, depth = self.depth, "Invoking nested call");
        let result = call(self);
        self.depth -= 1;
        result
    }

    /// Run `body`, handing program errors to `handler`.
    ///
    /// Effects staged by a failed `body` are rolled back before the handler
    /// runs. Fatal errors skip the handler and propagate.
    pub fn recover<R>(
        &mut self,
        body: impl FnOnce(&mut Self) -> ExecutionResult<R>,
        handler: impl FnOnce(&mut Self, ExecutionError) -> ExecutionResult<R>,
    ) -> ExecutionResult<R> {
        let checkpoint = self.staged.clone();
        match body(self) {
            Ok(value) => Ok(value),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                self.staged = checkpoint;
                handler(self, error)
            }
        }
    }

    /// Split into the gauge and the staged effects.
    pub fn into_parts(self) -> (G, StagedEffects) {
        (self.alloc.into_gauge(), self.staged)
    }
}

/// Outcome of [`Executor::run`].
#[derive(Debug, Clone)]
pub struct Execution<R> {
    /// Name of the script or transaction.
    pub name: String,
    /// What the program returned.
    pub result: ExecutionResult<R>,
    /// Memory recorded by the run.
    pub totals: MemoryTotals,
}

impl<R> Execution<R> {
    /// Whether the run succeeded and its effects were committed.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs programs with metered memory.
#[derive(Debug, Clone)]
pub struct Executor {
    config: MeterConfig,
    max_call_depth: usize,
}

impl Executor {
    /// Create an executor whose runs use `config`.
    pub fn new(config: MeterConfig) -> Self {
        Self {
            config,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Set the maximum nesting depth.
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// The meter configuration.
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Run `program` with a fresh [`MemoryMeter`].
    pub fn run<R, F>(&self, name: &str, storage: &mut Storage, program: F) -> Execution<R>
    where
        F: FnOnce(&mut ExecutionContext<'_, &mut MemoryMeter>) -> ExecutionResult<R>,
    {
        let mut meter = MemoryMeter::new(self.config.clone());
        let result = self.run_with_gauge(name, &mut meter, storage, program);
        Execution {
            name: name.to_owned(),
            result,
            totals: meter.totals(),
        }
    }

    /// Run `program` against a caller-supplied gauge.
    ///
    /// The gauge must be fresh for this run unless it is deliberately
    /// shared with other runs under one ceiling.
    pub fn run_with_gauge<G, R, F>(
        &self,
        name: &str,
        gauge: G,
        storage: &mut Storage,
        program: F,
    ) -> ExecutionResult<R>
    where
        G: MemoryGauge,
        F: FnOnce(&mut ExecutionContext<'_, G>) -> ExecutionResult<R>,
    {
        debug!(name = name, "Execution started");

        let mut context =
            ExecutionContext::new(gauge, storage).with_max_call_depth(self.max_call_depth);
        let result = program(&mut context);
        let (gauge, effects) = context.into_parts();

        // A violation the program swallowed still aborts the run.
        let result = match (result, gauge.violation()) {
            (Ok(_), Some(violation)) => Err(ExecutionError::Metering(violation)),
            (result, _) => result,
        };

        match &result {
            Ok(_) => {
                debug!(
                    name = name,
                    writes = effects.write_count(),
                    events = effects.event_count(),
                    "Execution succeeded, committing effects"
                );
                effects.commit(storage);
            }
            Err(error) if error.is_fatal() => {
                warn!(name = name, error = %error, "Execution aborted by metering");
            }
            Err(error) => {
                debug!(name = name, error = %error, "Execution failed, effects discarded");
            }
        }

        result
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(MeterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgauge_core::{MemoryKind, MeteringError};
    use memgauge_meter::RecordingGauge;

    #[test]
    fn test_successful_run_commits() {
        let executor = Executor::new(MeterConfig::default().with_limit(1_000));
        let mut storage = Storage::new();

        let execution = executor.run("deposit", &mut storage, |ctx| {
            let amount = ctx.alloc().number(10)?;
            ctx.write("balance", amount)?;
            let payload = ctx.alloc().nil()?;
            ctx.emit("Deposited", payload)?;
            Ok(())
        });

        assert!(execution.is_success());
        assert_eq!(storage.get("balance"), Some(&Value::Number(10)));
        assert_eq!(storage.events().len(), 1);
        assert_eq!(execution.totals.amount(MemoryKind::Path), 8);
        assert_eq!(execution.totals.amount(MemoryKind::String), 10);
    }

    #[test]
    fn test_limit_violation_discards_effects() {
        let executor = Executor::new(MeterConfig::default().with_limit(20));
        let mut storage = Storage::new();
        storage.insert("balance", Value::Number(1));

        let execution: Execution<()> = executor.run("spam", &mut storage, |ctx| {
            ctx.write("balance", Value::Number(2))?;
            loop {
                let s = ctx.alloc().string("xxxx")?;
                ctx.alloc().concat(&s, &s)?;
            }
        });

        let error = execution.result.unwrap_err();
        assert!(matches!(
            error,
            ExecutionError::Metering(MeteringError::LimitExceeded { .. })
        ));
        assert_eq!(storage.get("balance"), Some(&Value::Number(1)));
        assert!(execution.totals.total <= 20);
    }

    #[test]
    fn test_swallowed_violation_still_aborts() {
        let executor = Executor::new(MeterConfig::default().with_limit(5));
        let mut storage = Storage::new();
        storage.insert("balance", Value::Number(1));

        let execution = executor.run("swallow", &mut storage, |ctx| {
            let _ = ctx.alloc().string("far too long");
            ctx.remove("balance");
            Ok(())
        });

        assert!(!execution.is_success());
        assert!(matches!(
            execution.result,
            Err(ExecutionError::Metering(MeteringError::LimitExceeded { limit: 5, .. }))
        ));
        assert_eq!(storage.get("balance"), Some(&Value::Number(1)));
        assert_eq!(execution.totals.total, 0);
    }

    #[test]
    fn test_program_error_discards_effects() {
        let executor = Executor::default();
        let mut storage = Storage::new();

        let execution: Execution<()> = executor.run("fail", &mut storage, |ctx| {
            ctx.write("k", Value::Nil)?;
            Err(ExecutionError::program("panic"))
        });

        assert!(!execution.is_success());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_reads_see_staged_writes() {
        let mut storage = Storage::new();
        storage.insert("a", Value::Number(1));
        let mut ctx = ExecutionContext::new(RecordingGauge::new(), &storage);

        ctx.write("a", Value::Number(2)).unwrap();
        assert_eq!(ctx.read("a"), Some(&Value::Number(2)));
        assert_eq!(ctx.remove("a"), Some(Value::Number(2)));
        assert_eq!(ctx.read("a"), None);
        assert_eq!(storage.get("a"), Some(&Value::Number(1)));
    }

    #[test]
    fn test_recover_rolls_back_and_handles_program_errors() {
        let storage = Storage::new();
        let mut ctx = ExecutionContext::new(RecordingGauge::new(), &storage);

        let value = ctx
            .recover(
                |ctx| {
                    ctx.write("partial", Value::Nil)?;
                    Err(ExecutionError::program("oops"))
                },
                |_, error| {
                    assert_eq!(error, ExecutionError::program("oops"));
                    Ok(Value::Bool(false))
                },
            )
            .unwrap();

        assert_eq!(value, Value::Bool(false));
        assert!(ctx.staged().is_empty());
    }

    #[test]
    fn test_recover_cannot_catch_metering() {
        let storage = Storage::new();
        let mut meter = MemoryMeter::with_limit(3);
        let mut ctx = ExecutionContext::new(&mut meter, &storage);

        let result = ctx.recover(
            |ctx| ctx.alloc().string("too long").map_err(ExecutionError::from),
            |_, _| panic!("handler must not run"),
        );

        assert!(result.unwrap_err().is_fatal());
        drop(ctx);
        assert!(meter.is_exhausted());
    }

    #[test]
    fn test_invoke_shares_gauge() {
        let executor = Executor::new(MeterConfig::default().with_limit(100));
        let mut storage = Storage::new();

        let execution = executor.run("outer", &mut storage, |ctx| {
            ctx.alloc().string("ab")?;
            ctx.invoke("inner", |ctx| {
                assert_eq!(ctx.depth(), 1);
                ctx.alloc().string("cd")?;
                Ok(())
            })
        });

        assert!(execution.is_success());
        assert_eq!(execution.totals.amount(MemoryKind::String), 6);
    }

    #[test]
    fn test_invoke_depth_limit() {
        let storage = Storage::new();
        let mut ctx =
            ExecutionContext::new(RecordingGauge::new(), &storage).with_max_call_depth(2);

        fn recurse<G: MemoryGauge>(ctx: &mut ExecutionContext<'_, G>) -> ExecutionResult<()> {
            ctx.invoke("recurse", recurse)
        }

        assert_eq!(
            recurse(&mut ctx),
            Err(ExecutionError::CallDepthExceeded { limit: 2 })
        );
        assert_eq!(ctx.depth(), 0);
    }
}
