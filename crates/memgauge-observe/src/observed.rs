//! A gauge wrapper that reports every usage as an event.

use std::sync::Arc;

use memgauge_core::{MemoryGauge, MemoryUsage, MeteringError, MeteringResult};

use crate::events::{EventDispatcher, GaugeEvent};

/// Wraps a gauge and emits [`GaugeEvent`]s for each usage.
///
/// Observation never changes the outcome: the inner gauge's result is
/// returned as is.
#[derive(Debug)]
pub struct ObservedGauge<G> {
    inner: G,
    dispatcher: Arc<EventDispatcher>,
    total: u64,
}

impl<G: MemoryGauge> ObservedGauge<G> {
    /// Wrap `inner`, reporting to `dispatcher`.
    pub fn new(inner: G, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            inner,
            dispatcher,
            total: 0,
        }
    }

    /// The wrapped gauge.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// The dispatcher events are reported to.
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Unwrap the gauge.
    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: MemoryGauge> MemoryGauge for ObservedGauge<G> {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        let result = self.inner.use_memory(usage);
        match &result {
            Ok(()) => {
                self.total = self.total.saturating_add(usage.amount);
                self.dispatcher.emit(GaugeEvent::UsageRecorded {
                    usage,
                    total: self.total,
                });
            }
            Err(error) => self.dispatcher.emit(GaugeEvent::UsageRejected {
                usage,
                error: error.clone(),
            }),
        }
        result
    }

    fn violation(&self) -> Option<MeteringError> {
        self.inner.violation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CollectingSubscriber, EventSubscriber};
    use memgauge_core::MemoryKind;
    use memgauge_meter::MemoryMeter;

    #[test]
    fn test_observed_gauge_passes_results_through() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let collector = Arc::new(CollectingSubscriber::new(100));
        dispatcher.subscribe(Arc::clone(&collector) as Arc<dyn EventSubscriber>);

        let mut gauge = ObservedGauge::new(MemoryMeter::with_limit(10), Arc::clone(&dispatcher));
        assert!(gauge.use_memory(MemoryUsage::new(MemoryKind::Nil, 6)).is_ok());
        assert!(gauge.use_memory(MemoryUsage::new(MemoryKind::Nil, 6)).is_err());

        let events = collector.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].1,
            GaugeEvent::UsageRecorded { total: 6, .. }
        ));
        assert_eq!(events[1].1.event_type(), "usage_rejected");
        assert_eq!(gauge.inner().total(), 6);
        assert!(matches!(
            gauge.violation(),
            Some(MeteringError::LimitExceeded { limit: 10, .. })
        ));
    }
}
