//! A single simulated individual: kinematics plus infection state.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::error::CoreError;

/// Radius used by every agent unless configured otherwise
pub const DEFAULT_RADIUS: f32 = 5.0;

/// Epidemiological state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Susceptible,
    Infected,
    Recovered,
    Dead,
}

impl HealthState {
    /// States that are stored in a population (everything but `Dead`)
    pub const ACTIVE: [HealthState; 3] = [
        HealthState::Susceptible,
        HealthState::Infected,
        HealthState::Recovered,
    ];

    pub fn is_active(self) -> bool {
        self != HealthState::Dead
    }
}

/// RGB color hint for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const NEUTRAL: Rgb = Rgb(113, 113, 113);
    pub const ALERT: Rgb = Rgb(247, 82, 95);
    pub const CALM: Rgb = Rgb(58, 141, 222);
    pub const MOURNING: Rgb = Rgb(214, 198, 1);
}

impl From<HealthState> for Rgb {
    fn from(state: HealthState) -> Self {
        match state {
            HealthState::Susceptible => Rgb::NEUTRAL,
            HealthState::Infected => Rgb::ALERT,
            HealthState::Recovered => Rgb::CALM,
            HealthState::Dead => Rgb::MOURNING,
        }
    }
}

/// Result of ticking an agent's infection timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfectionOutcome {
    /// Not infected, nothing happened
    Unaffected,
    /// Still infected, timer decremented
    Ongoing,
    Recovered,
    Died,
}

/// Integer square footprint used for overlap tests.
///
/// The top-left corner is the truncated position, matching how sprites are
/// blitted, so two agents collide when their pixel squares intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub x: i32,
    pub y: i32,
    pub side: i32,
}

impl Footprint {
    /// Strict intersection: squares that only share an edge do not overlap
    pub fn intersects(&self, other: &Footprint) -> bool {
        self.x < other.x + other.side
            && other.x < self.x + self.side
            && self.y < other.y + other.side
            && other.y < self.y + self.side
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    state: HealthState,
    infection_timer: u32,
    death_probability: f64,
}

impl Agent {
    /// Create an agent with the given kinematics and state.
    ///
    /// An agent spawned directly as `Infected` has no timer running; use
    /// [`Agent::infect`] on a susceptible agent to start an infection.
    pub fn spawn_at(position: Vec2, velocity: Vec2, state: HealthState) -> Self {
        Self {
            position,
            velocity,
            radius: DEFAULT_RADIUS,
            state,
            infection_timer: 0,
            death_probability: 0.0,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn infection_timer(&self) -> u32 {
        self.infection_timer
    }

    pub fn death_probability(&self) -> f64 {
        self.death_probability
    }

    pub fn display_color(&self) -> Rgb {
        self.state.into()
    }

    pub fn footprint(&self) -> Footprint {
        Footprint {
            x: self.position.x as i32,
            y: self.position.y as i32,
            side: self.diameter().round() as i32,
        }
    }

    pub fn overlaps(&self, other: &Agent) -> bool {
        self.footprint().intersects(&other.footprint())
    }

    /// Move by one velocity step and bounce off the arena walls.
    ///
    /// The velocity component is mirrored once the new coordinate reaches
    /// `0` or `extent - diameter`. The position itself is not clamped, so an
    /// agent may overshoot a wall for one tick before heading back.
    pub fn advance(&mut self, arena: &Arena) {
        self.position += self.velocity;
        let limit = arena.bounce_limit(self.diameter());

        if self.position.x <= 0.0 || self.position.x >= limit.x {
            self.velocity.x = -self.velocity.x;
        }
        if self.position.y <= 0.0 || self.position.y >= limit.y {
            self.velocity.y = -self.velocity.y;
        }
    }

    /// Start an infection lasting `duration` ticks.
    pub fn infect(&mut self, duration: u32, death_probability: f64) -> Result<(), CoreError> {
        if self.state != HealthState::Susceptible {
            return Err(CoreError::PreconditionViolation { state: self.state });
        }
        self.state = HealthState::Infected;
        self.infection_timer = duration;
        self.death_probability = death_probability;
        Ok(())
    }

    pub(crate) fn set_state(&mut self, state: HealthState) {
        if state != HealthState::Infected {
            self.infection_timer = 0;
        }
        self.state = state;
    }

    /// Count the infection down by one tick, rolling for death on expiry.
    pub fn tick_infection<R: Rng + ?Sized>(&mut self, rng: &mut R) -> InfectionOutcome {
        if self.state != HealthState::Infected {
            return InfectionOutcome::Unaffected;
        }

        self.infection_timer = self.infection_timer.saturating_sub(1);
        if self.infection_timer > 0 {
            return InfectionOutcome::Ongoing;
        }

        let roll: f64 = rng.gen();
        if roll < self.death_probability {
            self.state = HealthState::Dead;
            InfectionOutcome::Died
        } else {
            self.state = HealthState::Recovered;
            InfectionOutcome::Recovered
        }
    }
}
