//! Ships simulation reports to an external consumer.
//!
//! A [`Serializer`] turns a [`Report`] into a self-delimiting frame and a
//! [`Sender`] writes the frame out. The [`TransportController`] ties the two
//! together and decides which ticks are reported.

mod sender;
mod serializer;

use contagion_config::{SenderType, SerializerType, TransportConfig};
use contagion_core::{HealthState, Rgb};
use contagion_simulation::{GraphSample, Simulation, Snapshot};
use log::debug;
use serde::Serialize;

pub use self::sender::{FileSender, NullSender, Sender, StdioSender, TransportError};
pub use self::serializer::{BinarySerializer, JsonSerializer, SerializationError, SerializeObject, Serializer};

/// Position and state of one agent, for renderers
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AgentReport {
    pub id: u32,
    pub generation: u32,
    pub x: f32,
    pub y: f32,
    pub state: HealthState,
    pub color: Rgb,
}

/// One reported tick
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Report {
    pub snapshot: Snapshot,
    pub agents: Option<Vec<AgentReport>>,
    /// Graph samples of the whole run, only on the final report
    pub history: Option<Vec<GraphSample>>,
}

impl Report {
    pub fn capture(simulation: &Simulation, include_agents: bool) -> Self {
        let agents = include_agents.then(|| {
            simulation
                .population()
                .iter()
                .map(|(id, agent)| AgentReport {
                    id: id.index(),
                    generation: id.generation(),
                    x: agent.position().x,
                    y: agent.position().y,
                    state: agent.state(),
                    color: agent.display_color(),
                })
                .collect()
        });
        Self {
            snapshot: simulation.snapshot(),
            agents,
            history: None,
        }
    }
}

pub struct TransportController {
    serializer: Box<dyn Serializer>,
    sender: Box<dyn Sender>,
    output_frequency: u32,
    include_agents: bool,
    last_reported_tick: Option<u64>,
    reports_sent: u64,
}

impl TransportController {
    /// Report every tick, snapshot only
    pub fn new(serializer: Box<dyn Serializer>, sender: Box<dyn Sender>) -> Self {
        Self {
            serializer,
            sender,
            output_frequency: 1,
            include_agents: false,
            last_reported_tick: None,
            reports_sent: 0,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let serializer: Box<dyn Serializer> = match config.serializer {
            SerializerType::Json => Box::new(JsonSerializer),
            SerializerType::Binary => Box::new(BinarySerializer),
        };

        let sender: Box<dyn Sender> = match config.sender {
            SenderType::Stdio => Box::new(StdioSender::new()),
            SenderType::Null => Box::new(NullSender),
            SenderType::File => {
                let path = config.output_path.as_deref().ok_or_else(|| {
                    TransportError::Configuration("the file sender needs an output_path".to_string())
                })?;
                Box::new(FileSender::new(path)?)
            }
        };

        Ok(Self::new(serializer, sender)
            .with_output_frequency(config.output_frequency)
            .with_agents(config.include_agents))
    }

    pub fn with_output_frequency(mut self, every: u32) -> Self {
        self.output_frequency = every.max(1);
        self
    }

    pub fn with_agents(mut self, include_agents: bool) -> Self {
        self.include_agents = include_agents;
        self
    }

    /// Serialize and send any value
    pub fn send_state<T: Serialize>(&mut self, state: &T) -> Result<(), TransportError> {
        let data = self.serializer.serialize_to_bytes(state)?;
        self.sender.send(&data)?;
        Ok(())
    }

    /// Report the simulation if its tick is due. Each tick is reported at most
    /// once, so cooldown frames are skipped.
    pub fn publish(&mut self, simulation: &Simulation) -> Result<bool, TransportError> {
        let tick = simulation.tick_count();
        let due = tick % u64::from(self.output_frequency) == 0;
        if !due || self.last_reported_tick == Some(tick) {
            return Ok(false);
        }
        self.send_report(simulation)?;
        Ok(true)
    }

    /// Send the closing report with the run's graph history and flush.
    ///
    /// Goes out even when the last tick was already reported.
    pub fn publish_final(&mut self, simulation: &Simulation) -> Result<(), TransportError> {
        let mut report = Report::capture(simulation, self.include_agents);
        report.history = Some(simulation.history().samples().to_vec());
        self.send(&report)?;
        self.sender.flush()
    }

    fn send_report(&mut self, simulation: &Simulation) -> Result<(), TransportError> {
        let report = Report::capture(simulation, self.include_agents);
        self.send(&report)
    }

    fn send(&mut self, report: &Report) -> Result<(), TransportError> {
        self.send_state(report)?;
        self.last_reported_tick = Some(report.snapshot.tick);
        self.reports_sent += 1;
        debug!("Reported tick {}", report.snapshot.tick);
        Ok(())
    }

    pub fn reports_sent(&self) -> u64 {
        self.reports_sent
    }

    pub fn flush(&mut self) -> Result<(), TransportError> {
        self.sender.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_config::SimulationConfig;
    use std::sync::{Arc, Mutex};

    /// Collects frames in memory
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Sender for Capture {
        fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn simulation(max_ticks: u64) -> Simulation {
        let config = SimulationConfig {
            n_susceptible: 8,
            n_infected: 1,
            n_quarantined: 1,
            max_ticks,
            seed: Some(5),
            ..SimulationConfig::default()
        };
        Simulation::configure(&config).unwrap()
    }

    #[test]
    fn reports_every_nth_tick_once() {
        let capture = Capture::default();
        let mut controller =
            TransportController::new(Box::new(JsonSerializer), Box::new(capture.clone())).with_output_frequency(3);
        let mut sim = simulation(7);

        while !sim.is_finished() {
            sim.step().unwrap();
            controller.publish(&sim).unwrap();
        }
        // Cooldown frames leave the tick at 7 and are never reported
        for _ in 0..5 {
            sim.step().unwrap();
            controller.publish(&sim).unwrap();
        }
        controller.publish_final(&sim).unwrap();

        let ticks: Vec<u64> = capture.lines().iter().map(|r| r["snapshot"]["tick"].as_u64().unwrap()).collect();
        assert_eq!(ticks, vec![3, 6, 7]);
        assert_eq!(controller.reports_sent(), 3);
    }

    #[test]
    fn agents_are_attached_on_request() {
        let capture = Capture::default();
        let mut controller =
            TransportController::new(Box::new(JsonSerializer), Box::new(capture.clone())).with_agents(true);
        let mut sim = simulation(3);
        sim.step().unwrap();
        controller.publish(&sim).unwrap();

        let reports = capture.lines();
        let agents = reports[0]["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 10);
        assert_eq!(reports[0]["snapshot"]["phase"], "running");
        assert!(agents.iter().any(|a| a["state"] == "infected"));
    }

    #[test]
    fn snapshot_only_by_default() {
        let capture = Capture::default();
        let mut controller = TransportController::new(Box::new(JsonSerializer), Box::new(capture.clone()));
        let mut sim = simulation(3);
        sim.step().unwrap();
        controller.publish(&sim).unwrap();

        let reports = capture.lines();
        assert!(reports[0]["agents"].is_null());
        assert!(reports[0]["history"].is_null());
        assert_eq!(reports[0]["snapshot"]["counts"]["initial"], 10);
    }

    #[test]
    fn final_report_carries_the_graph_history() {
        let capture = Capture::default();
        let mut controller = TransportController::new(Box::new(JsonSerializer), Box::new(capture.clone()));
        let mut sim = simulation(4);
        while !sim.is_finished() {
            sim.step().unwrap();
            controller.publish(&sim).unwrap();
        }
        // Tick 4 was already reported, the final report still goes out
        controller.publish_final(&sim).unwrap();

        let reports = capture.lines();
        assert_eq!(reports.len(), 5);
        assert!(reports[..4].iter().all(|r| r["history"].is_null()));

        let history = reports[4]["history"].as_array().unwrap();
        assert_eq!(history.len(), 4);
        let ticks: Vec<u64> = history.iter().map(|s| s["tick"].as_u64().unwrap()).collect();
        assert_eq!(ticks, vec![1, 2, 3, 4]);
        for sample in history {
            for curve in ["infected", "dead", "recovered"] {
                let share = sample[curve].as_f64().unwrap();
                assert!((0.0..=1.0).contains(&share));
            }
        }
    }

    #[test]
    fn file_sender_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.bin");
        let config = TransportConfig {
            serializer: SerializerType::Binary,
            sender: SenderType::File,
            output_path: Some(path.to_string_lossy().into_owned()),
            ..TransportConfig::default()
        };

        let mut controller = TransportController::from_config(&config).unwrap();
        let mut sim = simulation(2);
        sim.run().unwrap();
        controller.publish_final(&sim).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(bytes.len(), 4 + len);
    }

    #[test]
    fn file_sender_without_path_is_rejected() {
        let config = TransportConfig {
            sender: SenderType::File,
            ..TransportConfig::default()
        };
        assert!(matches!(
            TransportController::from_config(&config),
            Err(TransportError::Configuration(_))
        ));
    }
}
