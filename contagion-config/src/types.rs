use serde::{Deserialize, Serialize};

// --- Defaults (the simulator's start menu values) ---

fn default_width() -> f32 { 800.0 }
fn default_height() -> f32 { 600.0 }
fn default_n_susceptible() -> i64 { 374 }
fn default_n_infected() -> i64 { 1 }
fn default_n_quarantined() -> i64 { 1125 }
fn default_infection_duration() -> i64 { 200 }
fn default_infection_probability() -> f64 { 0.20 }
fn default_death_probability() -> f64 { 0.05 }
fn default_quarantine_fraction() -> f64 { 0.75 }
fn default_max_ticks() -> u64 { 2400 }
fn default_normal_speed() -> f32 { 2.0 }
fn default_quarantine_speed() -> f32 { 0.05 }
fn default_radius() -> f32 { 5.0 }
fn default_placement_margin() -> u32 { 10 }
fn default_placement_attempts() -> u32 { 8 }
fn default_output_frequency() -> u32 { 1 }

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// How the per-tick transmission gate turns `infection_probability` into the
/// probability that any transmission is evaluated during a tick.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(tag = "formula", rename_all = "lowercase")]
pub enum GateFormula {
    /// `p`
    #[default]
    Linear,
    /// `p^4`
    Quartic,
    /// `factor * p`, clamped to `[0, 1]`
    Scaled { factor: f64 },
}

/// Everything the engine needs for one run
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SimulationConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default = "default_n_susceptible")]
    pub n_susceptible: i64,
    #[serde(default = "default_n_infected")]
    pub n_infected: i64,
    /// Susceptible agents that barely move from the start
    #[serde(default = "default_n_quarantined")]
    pub n_quarantined: i64,
    /// Ticks an infection lasts
    #[serde(default = "default_infection_duration")]
    pub infection_duration: i64,
    #[serde(default = "default_infection_probability")]
    pub infection_probability: f64,
    #[serde(default = "default_death_probability")]
    pub death_probability: f64,
    /// Chance an agent self-isolates after a contact
    #[serde(default = "default_quarantine_fraction")]
    pub quarantine_fraction: f64,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    #[serde(default)]
    pub gate: GateFormula,
    #[serde(default = "default_normal_speed")]
    pub normal_speed: f32,
    #[serde(default = "default_quarantine_speed")]
    pub quarantine_speed: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_placement_margin")]
    pub placement_margin: u32,
    #[serde(default = "default_placement_attempts")]
    pub placement_attempts: u32,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            n_susceptible: default_n_susceptible(),
            n_infected: default_n_infected(),
            n_quarantined: default_n_quarantined(),
            infection_duration: default_infection_duration(),
            infection_probability: default_infection_probability(),
            death_probability: default_death_probability(),
            quarantine_fraction: default_quarantine_fraction(),
            max_ticks: default_max_ticks(),
            gate: GateFormula::default(),
            normal_speed: default_normal_speed(),
            quarantine_speed: default_quarantine_speed(),
            radius: default_radius(),
            placement_margin: default_placement_margin(),
            placement_attempts: default_placement_attempts(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// The start-menu defaults: 1500 agents, three quarters quarantining
    pub fn menu_defaults() -> Self {
        Self::default()
    }

    /// The first, menu-less release: 400 agents, long infections, a mild disease
    pub fn classic() -> Self {
        Self {
            n_susceptible: 135,
            n_infected: 1,
            n_quarantined: 264,
            infection_duration: 300,
            infection_probability: 0.1,
            death_probability: 0.05,
            quarantine_fraction: 0.66,
            max_ticks: 3000,
            ..Self::default()
        }
    }

    /// The first interactive release, which throttled contagiousness to a third
    pub fn throttled() -> Self {
        Self {
            n_susceptible: 149,
            n_infected: 1,
            n_quarantined: 450,
            infection_duration: 400,
            infection_probability: 0.05,
            death_probability: 0.25,
            quarantine_fraction: 0.75,
            max_ticks: 2300,
            gate: GateFormula::Scaled { factor: 0.33 },
            ..Self::default()
        }
    }

    /// Total number of agents at the start of a run
    pub fn initial_count(&self) -> i64 {
        self.n_susceptible + self.n_infected + self.n_quarantined
    }
}

// --- Transport ---

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializerType {
    #[default]
    Json,
    Binary,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    #[default]
    Stdio,
    File,
    Null,
}

/// Where per-tick snapshots are reported
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TransportConfig {
    #[serde(default)]
    pub serializer: SerializerType,
    #[serde(default)]
    pub sender: SenderType,
    /// Required for the file sender
    #[serde(default)]
    pub output_path: Option<String>,
    /// Report every N ticks
    #[serde(default = "default_output_frequency")]
    pub output_frequency: u32,
    /// Attach every agent's position and state to each report
    #[serde(default)]
    pub include_agents: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            serializer: SerializerType::default(),
            sender: SenderType::default(),
            output_path: None,
            output_frequency: default_output_frequency(),
            include_agents: false,
        }
    }
}
