//! Contact-based transmission with a global per-tick gate.

use contagion_core::{AgentId, CoreError, HealthState, Population, SpeedLimits, Transmission};
use log::debug;
use rand::{Rng, RngCore};

use crate::gate::TransmissionGate;

/// A susceptible agent and the infected agent it caught the infection from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub target: AgentId,
    pub infector: AgentId,
}

/// Decides once per tick which susceptible agents become infected.
///
/// Two stages, in order:
/// 1. one uniform draw against the gate; on failure nothing happens this tick.
/// 2. every susceptible agent whose footprint overlaps an infected agent's
///    footprint is infected.
///
/// After each transmission the new case and its infector both redraw their
/// velocity, self-isolating with probability `quarantine_fraction`.
pub struct TransmissionModel {
    infection_probability: f64,
    infection_duration: u32,
    death_probability: f64,
    quarantine_fraction: f64,
    speeds: SpeedLimits,
    gate: Box<dyn TransmissionGate>,
    gate_opened: bool,
}

impl TransmissionModel {
    pub fn new(
        infection_probability: f64,
        infection_duration: u32,
        death_probability: f64,
        quarantine_fraction: f64,
        speeds: SpeedLimits,
        gate: Box<dyn TransmissionGate>,
    ) -> Self {
        Self {
            infection_probability,
            infection_duration,
            death_probability,
            quarantine_fraction,
            speeds,
            gate,
            gate_opened: false,
        }
    }

    /// Swap in a different gate formula
    pub fn set_gate(&mut self, gate: Box<dyn TransmissionGate>) {
        self.gate = gate;
    }

    /// Whether the gate opened during the most recent tick
    pub fn gate_opened(&self) -> bool {
        self.gate_opened
    }

    /// Every susceptible agent overlapping an infected one, paired with the
    /// first such infected agent in storage order.
    ///
    /// Exhaustive pairwise test against the infected cohort as it stands now.
    pub fn find_contacts(population: &Population) -> Vec<Contact> {
        let infected: Vec<_> = population
            .cohort(HealthState::Infected)
            .map(|(id, agent)| (id, agent.footprint()))
            .collect();
        if infected.is_empty() {
            return Vec::new();
        }

        population
            .cohort(HealthState::Susceptible)
            .filter_map(|(target, agent)| {
                let footprint = agent.footprint();
                infected
                    .iter()
                    .find(|(_, other)| footprint.intersects(other))
                    .map(|(infector, _)| Contact { target, infector: *infector })
            })
            .collect()
    }
}

impl Transmission for TransmissionModel {
    fn transmit(&mut self, population: &mut Population, rng: &mut dyn RngCore) -> Result<usize, CoreError> {
        let roll: f64 = rng.gen();
        self.gate_opened = self.gate.opens(self.infection_probability, roll);
        if !self.gate_opened {
            return Ok(0);
        }

        // Contacts are fixed before anyone changes state, so a fresh case
        // cannot pass the infection on within the same tick.
        let contacts = Self::find_contacts(population);
        for contact in &contacts {
            population.infect(contact.target, self.infection_duration, self.death_probability)?;

            let velocity = self.speeds.redraw(rng, self.quarantine_fraction);
            population.set_velocity(contact.target, velocity)?;
            let velocity = self.speeds.redraw(rng, self.quarantine_fraction);
            population.set_velocity(contact.infector, velocity)?;
        }

        if !contacts.is_empty() {
            debug!("Gate opened: {} new infections", contacts.len());
        }
        Ok(contacts.len())
    }
}
