//! The per-tick transmission gate.
//!
//! Before any contact is examined, one uniform draw decides whether
//! transmission is possible at all during the tick. The gate formula maps the
//! configured infection probability to the chance that this draw succeeds.

use contagion_config::GateFormula;

pub trait TransmissionGate: Send + Sync {
    /// Probability in `[0, 1]` that the gate opens this tick
    fn open_probability(&self, infection_probability: f64) -> f64;

    /// Whether a draw `roll` in `[0, 1)` opens the gate
    fn opens(&self, infection_probability: f64, roll: f64) -> bool {
        let p = self.open_probability(infection_probability).clamp(0.0, 1.0);
        roll >= 1.0 - p
    }
}

impl TransmissionGate for GateFormula {
    fn open_probability(&self, infection_probability: f64) -> f64 {
        match *self {
            GateFormula::Linear => infection_probability,
            GateFormula::Quartic => infection_probability.powi(4),
            GateFormula::Scaled { factor } => (factor * infection_probability).clamp(0.0, 1.0),
        }
    }
}

/// Wraps a plain function as a custom gate
pub struct FnGate<F>(pub F);

impl<F> TransmissionGate for FnGate<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn open_probability(&self, infection_probability: f64) -> f64 {
        (self.0)(infection_probability)
    }
}
