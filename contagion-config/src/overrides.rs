//! Command-line overrides layered on top of a loaded config file.

use clap::{Args, ValueEnum};

use crate::types::{GateFormula, SimulationConfig};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateArg {
    Linear,
    Quartic,
    Scaled,
}

/// Flags that override individual simulation settings.
///
/// Meant to be `#[command(flatten)]`-ed into a binary's argument parser.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Arena width
    #[arg(long)]
    pub width: Option<f32>,
    /// Arena height
    #[arg(long)]
    pub height: Option<f32>,
    /// Freely moving susceptible agents
    #[arg(long)]
    pub susceptible: Option<i64>,
    /// Initially infected agents
    #[arg(long)]
    pub infected: Option<i64>,
    /// Quarantined (near-stationary) susceptible agents
    #[arg(long)]
    pub quarantined: Option<i64>,
    /// Infection length in ticks
    #[arg(long)]
    pub infection_duration: Option<i64>,
    #[arg(long)]
    pub infection_probability: Option<f64>,
    #[arg(long)]
    pub death_probability: Option<f64>,
    /// Chance an agent self-isolates after a contact
    #[arg(long)]
    pub quarantine_fraction: Option<f64>,
    /// Ticks of disease dynamics before the run freezes
    #[arg(long)]
    pub max_ticks: Option<u64>,
    /// Transmission gate formula
    #[arg(long, value_enum)]
    pub gate: Option<GateArg>,
    /// Multiplier used by the scaled gate
    #[arg(long, default_value_t = 0.33)]
    pub gate_factor: f64,
    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ConfigOverrides {
    /// Apply every flag that was given, leaving the rest untouched
    pub fn apply(&self, sim: &mut SimulationConfig) {
        macro_rules! set {
            ($($flag:ident => $field:ident),* $(,)?) => {
                $(if let Some(value) = self.$flag { sim.$field = value; })*
            };
        }
        set!(
            width => width,
            height => height,
            susceptible => n_susceptible,
            infected => n_infected,
            quarantined => n_quarantined,
            infection_duration => infection_duration,
            infection_probability => infection_probability,
            death_probability => death_probability,
            quarantine_fraction => quarantine_fraction,
            max_ticks => max_ticks,
        );

        if let Some(gate) = self.gate {
            sim.gate = match gate {
                GateArg::Linear => GateFormula::Linear,
                GateArg::Quartic => GateFormula::Quartic,
                GateArg::Scaled => GateFormula::Scaled { factor: self.gate_factor },
            };
        }
        if self.seed.is_some() {
            sim.seed = self.seed;
        }
    }
}
