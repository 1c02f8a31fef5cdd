//! Outbreak dynamics on top of `contagion-core`: the transmission rule, the
//! gate formulas and the tick-driven [`Simulation`].

mod error;
pub mod gate;
pub mod history;
pub mod simulation;
pub mod transmission;

pub use error::SimulationError;
pub use gate::{FnGate, TransmissionGate};
pub use history::{GraphSample, TimeSeries};
pub use simulation::{Phase, Simulation, Snapshot};
pub use transmission::{Contact, TransmissionModel};
