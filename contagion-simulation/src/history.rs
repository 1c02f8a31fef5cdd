//! Per-tick history of the outbreak for plotting.

use serde::Serialize;

use crate::simulation::Snapshot;

/// The three curves a progress graph draws, each as a fraction in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphSample {
    pub tick: u64,
    /// Infected share of the living population
    pub infected: f64,
    /// Deaths as a share of the starting population
    pub dead: f64,
    /// Recovered share of the living population
    pub recovered: f64,
}

impl GraphSample {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let counts = &snapshot.counts;
        let share = |part: usize, whole: usize| if whole == 0 { 0.0 } else { part as f64 / whole as f64 };
        Self {
            tick: snapshot.tick,
            infected: share(counts.infected, counts.active),
            dead: share(counts.dead, counts.initial),
            recovered: share(counts.recovered, counts.active),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeries {
    samples: Vec<GraphSample>,
    peak_infected: usize,
    peak_tick: u64,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: &Snapshot) {
        if snapshot.counts.infected > self.peak_infected {
            self.peak_infected = snapshot.counts.infected;
            self.peak_tick = snapshot.tick;
        }
        self.samples.push(GraphSample::from_snapshot(snapshot));
    }

    pub fn samples(&self) -> &[GraphSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&GraphSample> {
        self.samples.last()
    }

    /// Largest simultaneous infected count seen and the tick it happened
    pub fn peak_infected(&self) -> (usize, u64) {
        (self.peak_infected, self.peak_tick)
    }
}
