use std::sync::Mutex;

/// Counters for prediction episodes, shared with the shell for display.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub issued: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_issued(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.issued += 1;
        }
    }

    pub fn record_succeeded(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.succeeded += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failed += 1;
        }
    }

    pub fn record_discarded(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.discarded += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
