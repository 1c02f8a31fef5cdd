//! Builds a [`SimulationConfig`] from the handful of knobs the start menu
//! exposes, deriving the cohort split from the quarantine rate.

use crate::types::{GateFormula, SimulationConfig};
use crate::{validate_simulation, ConfigError};

/// Raw text the menu collected, one string per input box
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuFields {
    pub population: String,
    pub infection_length: String,
    pub contagiousness: String,
    pub death_rate: String,
    pub quarantine_rate: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigBuilder {
    population: i64,
    infection_length: i64,
    contagiousness: f64,
    death_rate: f64,
    quarantine_rate: f64,
    base: SimulationConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            population: 1500,
            infection_length: 200,
            contagiousness: 0.20,
            death_rate: 0.05,
            quarantine_rate: 0.75,
            base: SimulationConfig::default(),
        }
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the menu's text boxes. The first box that does not parse is reported.
    pub fn from_text_fields(fields: &MenuFields) -> Result<Self, ConfigError> {
        Ok(Self::new()
            .population(parse_field("population", &fields.population)?)
            .infection_length(parse_field("infection_length", &fields.infection_length)?)
            .contagiousness(parse_field("contagiousness", &fields.contagiousness)?)
            .death_rate(parse_field("death_rate", &fields.death_rate)?)
            .quarantine_rate(parse_field("quarantine_rate", &fields.quarantine_rate)?))
    }

    pub fn population(mut self, population: i64) -> Self {
        self.population = population;
        self
    }

    pub fn infection_length(mut self, ticks: i64) -> Self {
        self.infection_length = ticks;
        self
    }

    pub fn contagiousness(mut self, probability: f64) -> Self {
        self.contagiousness = probability;
        self
    }

    pub fn death_rate(mut self, probability: f64) -> Self {
        self.death_rate = probability;
        self
    }

    pub fn quarantine_rate(mut self, fraction: f64) -> Self {
        self.quarantine_rate = fraction;
        self
    }

    pub fn max_ticks(mut self, max_ticks: u64) -> Self {
        self.base.max_ticks = max_ticks;
        self
    }

    pub fn arena(mut self, width: f32, height: f32) -> Self {
        self.base.width = width;
        self.base.height = height;
        self
    }

    pub fn gate(mut self, gate: GateFormula) -> Self {
        self.base.gate = gate;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.base.seed = Some(seed);
        self
    }

    /// Split the population and validate the result.
    ///
    /// One agent starts infected, `floor(population * quarantine_rate)` start
    /// quarantined and the remainder (less the infected one) move freely.
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let population = self.population as f64;
        let quarantined = (population * self.quarantine_rate).floor();
        let susceptible = (population - population * self.quarantine_rate - 1.0).floor();

        let config = SimulationConfig {
            n_susceptible: susceptible as i64,
            n_infected: 1,
            n_quarantined: quarantined as i64,
            infection_duration: self.infection_length,
            infection_probability: self.contagiousness,
            death_probability: self.death_rate,
            quarantine_fraction: self.quarantine_rate,
            ..self.base
        };
        validate_simulation(&config)?;
        Ok(config)
    }
}
