use hdrhistogram::{CreationError, Histogram};
use std::time::Duration;

/// Wall-clock cost of simulation ticks, in microseconds
pub struct TickStats {
    histogram: Histogram<u64>,
    overruns: u64,
}

impl TickStats {
    pub fn new() -> Result<Self, CreationError> {
        // 1µs to 60s at three significant figures
        let histogram = Histogram::new_with_bounds(1, 60_000_000, 3)?;
        Ok(Self { histogram, overruns: 0 })
    }

    pub fn record(&mut self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.histogram.saturating_record(micros.max(1));
    }

    pub fn record_overrun(&mut self) {
        self.overruns += 1;
    }

    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    pub fn percentile(&self, q: f64) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(q))
    }

    pub fn max(&self) -> Duration {
        Duration::from_micros(self.histogram.max())
    }

    pub fn mean(&self) -> Duration {
        Duration::from_micros(self.histogram.mean() as u64)
    }
}
