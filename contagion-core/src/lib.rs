//! Core agent model for the contagion simulator.
//!
//! Agents bounce around an [`Arena`]; a [`Population`] stores them densely and
//! tracks which cohort each one belongs to.

pub mod agent;
pub mod arena;
pub mod entity;
pub mod error;
pub mod motion;
pub mod population;

pub use agent::{Agent, Footprint, HealthState, InfectionOutcome, Rgb, DEFAULT_RADIUS};
pub use arena::{Arena, DEFAULT_PLACEMENT_MARGIN};
pub use entity::{AgentId, IdAllocator};
pub use error::CoreError;
pub use motion::{random_velocity, SpeedLimits};
pub use population::{Population, PopulationCounts, SeedPlan, StepReport, Transmission};

// Vector type used for positions and velocities
pub use glam::Vec2;
