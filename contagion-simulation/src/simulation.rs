//! The outbreak state machine: `Seeding -> Running -> Cooldown`.

use contagion_config::{validate_simulation, ConfigError, SimulationConfig};
use contagion_core::{Arena, Population, PopulationCounts, SeedPlan, SpeedLimits, StepReport};
use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::error::SimulationError;
use crate::gate::TransmissionGate;
use crate::history::TimeSeries;
use crate::transmission::TransmissionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing placed yet
    Seeding,
    /// Disease dynamics run each tick
    Running,
    /// Agents keep moving but nobody changes state any more
    Cooldown,
}

/// Read-only view of the outbreak after a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub counts: PopulationCounts,
    /// Share of the starting population that has ever been infected
    pub attack_rate: f64,
    /// Events of the step that produced this snapshot
    pub last_step: StepReport,
}

impl Snapshot {
    pub fn new(tick: u64, phase: Phase, counts: PopulationCounts, last_step: StepReport) -> Self {
        let ever_infected = counts.infected + counts.recovered + counts.dead;
        let attack_rate = if counts.initial == 0 {
            0.0
        } else {
            ever_infected as f64 / counts.initial as f64
        };
        Self { tick, phase, counts, attack_rate, last_step }
    }
}

pub struct Simulation {
    arena: Arena,
    plan: SeedPlan,
    population: Population,
    transmission: TransmissionModel,
    rng: Pcg64,
    seed: u64,
    phase: Phase,
    tick_count: u64,
    max_ticks: u64,
    cooldown_frames: u64,
    last_step: StepReport,
    history: TimeSeries,
}

impl Simulation {
    /// Validate `config` and build a simulation waiting to be seeded.
    ///
    /// Without a configured seed one is drawn at random and logged so the run
    /// can be replayed.
    pub fn configure(config: &SimulationConfig) -> Result<Self, SimulationError> {
        validate_simulation(config)?;

        let arena = Arena::with_margin(config.width, config.height, config.placement_margin)
            .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))?;
        let infection_duration = u32::try_from(config.infection_duration).map_err(|_| {
            ConfigError::InvalidConfiguration(format!(
                "infection_duration {} is too long",
                config.infection_duration
            ))
        })?;
        let speeds = SpeedLimits {
            normal: config.normal_speed,
            quarantine: config.quarantine_speed,
        };
        let plan = SeedPlan {
            // Validation guarantees the counts are non-negative
            n_susceptible: config.n_susceptible as usize,
            n_infected: config.n_infected as usize,
            n_quarantined: config.n_quarantined as usize,
            infection_duration,
            death_probability: config.death_probability,
            speeds,
            radius: config.radius,
            placement_attempts: config.placement_attempts,
        };
        let transmission = TransmissionModel::new(
            config.infection_probability,
            infection_duration,
            config.death_probability,
            config.quarantine_fraction,
            speeds,
            Box::new(config.gate),
        );

        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random();
                info!("No seed configured, using {}", seed);
                seed
            }
        };

        Ok(Self {
            arena,
            plan,
            population: Population::new(),
            transmission,
            rng: Pcg64::seed_from_u64(seed),
            seed,
            phase: Phase::Seeding,
            tick_count: 0,
            max_ticks: config.max_ticks,
            cooldown_frames: 0,
            last_step: StepReport::default(),
            history: TimeSeries::new(),
        })
    }

    /// Run `config` against hand-placed agents instead of a random seeding.
    pub fn from_population(config: &SimulationConfig, population: Population) -> Result<Self, SimulationError> {
        let mut simulation = Self::configure(config)?;
        simulation.population = population;
        simulation.enter_running();
        Ok(simulation)
    }

    /// Replace the configured gate formula
    pub fn with_gate(mut self, gate: Box<dyn TransmissionGate>) -> Self {
        self.transmission.set_gate(gate);
        self
    }

    /// Place the starting population. Happens on the first `step` if not
    /// called beforehand.
    pub fn seed(&mut self) -> Result<(), SimulationError> {
        if self.phase != Phase::Seeding {
            return Err(SimulationError::AlreadySeeded);
        }
        self.population = Population::seed(&self.plan, &self.arena, &mut self.rng)?;
        info!(
            "Seeded {} agents ({} infected, {} quarantined) with seed {}",
            self.population.initial_count(),
            self.plan.n_infected,
            self.plan.n_quarantined,
            self.seed
        );
        self.enter_running();
        Ok(())
    }

    fn enter_running(&mut self) {
        if self.max_ticks == 0 {
            self.enter_cooldown();
        } else {
            self.phase = Phase::Running;
        }
    }

    fn enter_cooldown(&mut self) {
        self.phase = Phase::Cooldown;
        let counts = self.population.counts();
        info!(
            "Outbreak over after {} ticks: {} infected, {} recovered, {} dead of {}",
            self.tick_count, counts.infected, counts.recovered, counts.dead, counts.initial
        );
    }

    /// Advance one tick, or one cosmetic frame once the run is over.
    pub fn step(&mut self) -> Result<Snapshot, SimulationError> {
        if self.phase == Phase::Seeding {
            self.seed()?;
        }
        if self.phase == Phase::Cooldown {
            self.population.advance_all(&self.arena);
            self.cooldown_frames += 1;
            self.last_step = StepReport::default();
            return Ok(self.snapshot());
        }

        let report = self.population.step(&self.arena, &mut self.transmission, &mut self.rng)?;
        self.tick_count += 1;
        self.last_step = report;
        if report.transmissions > 0 || report.deaths > 0 {
            debug!(
                "Tick {}: {} infected, {} recovered, {} died",
                self.tick_count, report.transmissions, report.recoveries, report.deaths
            );
        }

        let snapshot = self.snapshot();
        self.history.record(&snapshot);
        if self.tick_count >= self.max_ticks {
            self.enter_cooldown();
        }
        Ok(snapshot)
    }

    /// Step until the outbreak window closes and return the final snapshot
    pub fn run(&mut self) -> Result<Snapshot, SimulationError> {
        if self.phase == Phase::Seeding {
            self.seed()?;
        }
        while self.phase == Phase::Running {
            self.step()?;
        }
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.tick_count, self.phase, self.population.counts(), self.last_step)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Cooldown
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    pub fn cooldown_frames(&self) -> u64 {
        self.cooldown_frames
    }

    /// Seed the RNG was started from
    pub fn rng_seed(&self) -> u64 {
        self.seed
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn history(&self) -> &TimeSeries {
        &self.history
    }

    /// Whether the transmission gate opened on the latest tick
    pub fn gate_opened(&self) -> bool {
        self.transmission.gate_opened()
    }
}
