//! Dense, generationally indexed agent storage partitioned into cohorts.
//!
//! Cohort membership is the agent's [`HealthState`] tag. Changing cohort keeps
//! the agent's id, position and velocity; only death frees the slot.

use log::{debug, trace, warn};
use rand::{Rng, RngCore};
use serde::Serialize;

use crate::agent::{Agent, HealthState, InfectionOutcome};
use crate::arena::Arena;
use crate::entity::{AgentId, IdAllocator};
use crate::error::CoreError;
use crate::motion::SpeedLimits;

/// How to populate the arena at the start of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    pub n_susceptible: usize,
    pub n_infected: usize,
    /// Susceptible agents that start out nearly stationary
    pub n_quarantined: usize,
    pub infection_duration: u32,
    pub death_probability: f64,
    pub speeds: SpeedLimits,
    pub radius: f32,
    /// Placement tries per agent before accepting an overlap
    pub placement_attempts: u32,
}

impl SeedPlan {
    pub fn total(&self) -> usize {
        self.n_susceptible + self.n_infected + self.n_quarantined
    }
}

/// Decides which susceptible agents catch the infection during a tick.
pub trait Transmission {
    /// Infect agents in `population`, returning how many transmissions happened.
    fn transmit(&mut self, population: &mut Population, rng: &mut dyn RngCore) -> Result<usize, CoreError>;
}

/// Read-only cohort sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PopulationCounts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
    pub active: usize,
    pub initial: usize,
}

/// What happened during one population step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StepReport {
    pub transmissions: usize,
    pub recoveries: usize,
    pub deaths: usize,
}

#[derive(Debug, Default, Clone)]
pub struct Population {
    slots: Vec<Option<Agent>>,
    ids: IdAllocator,
    cohort_sizes: [usize; 3],
    initial_count: usize,
}

fn cohort_index(state: HealthState) -> Option<usize> {
    match state {
        HealthState::Susceptible => Some(0),
        HealthState::Infected => Some(1),
        HealthState::Recovered => Some(2),
        HealthState::Dead => None,
    }
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a population from hand-placed agents
    pub fn from_agents<I>(agents: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = Agent>,
    {
        let mut population = Self::new();
        for agent in agents {
            population.insert(agent)?;
        }
        Ok(population)
    }

    /// Scatter a fresh population over the arena.
    ///
    /// Placement avoids overlapping already placed agents on a best-effort
    /// basis: after `placement_attempts` misses the last candidate is kept.
    pub fn seed<R: Rng + ?Sized>(plan: &SeedPlan, arena: &Arena, rng: &mut R) -> Result<Self, CoreError> {
        let mut population = Self::new();
        let mut crowded = 0usize;

        let cohorts = [
            (plan.n_susceptible, false, false),
            (plan.n_infected, true, false),
            (plan.n_quarantined, false, true),
        ];

        for (count, infected, quarantined) in cohorts {
            for _ in 0..count {
                let (position, clear) = population.find_spot(plan, arena, rng);
                if !clear {
                    crowded += 1;
                }
                let velocity = plan.speeds.draw(rng, quarantined);
                let mut agent = Agent::spawn_at(position, velocity, HealthState::Susceptible)
                    .with_radius(plan.radius);
                if infected {
                    agent.infect(plan.infection_duration, plan.death_probability)?;
                }
                population.insert(agent)?;
            }
        }

        if crowded > 0 {
            warn!(
                "{} of {} agents were placed overlapping a neighbour after {} attempts",
                crowded,
                plan.total(),
                plan.placement_attempts
            );
        }
        debug!("Seeded population: {:?}", population.counts());
        Ok(population)
    }

    fn find_spot<R: Rng + ?Sized>(&self, plan: &SeedPlan, arena: &Arena, rng: &mut R) -> (glam::Vec2, bool) {
        let mut candidate = arena.random_position(rng);
        for _ in 0..plan.placement_attempts.max(1) {
            let probe = Agent::spawn_at(candidate, glam::Vec2::ZERO, HealthState::Susceptible)
                .with_radius(plan.radius);
            if !self.iter().any(|(_, other)| other.overlaps(&probe)) {
                return (candidate, true);
            }
            candidate = arena.random_position(rng);
        }
        (candidate, false)
    }

    /// Add an agent. Every insert counts towards the initial population.
    ///
    /// Infected agents must come from [`Agent::infect`] so their timer runs.
    pub fn insert(&mut self, agent: Agent) -> Result<AgentId, CoreError> {
        let cohort = cohort_index(agent.state()).ok_or(CoreError::InactiveAgent)?;
        if agent.state() == HealthState::Infected && agent.infection_timer() == 0 {
            return Err(CoreError::UntimedInfection);
        }
        let id = self.ids.allocate();
        let index = id.index() as usize;
        if index == self.slots.len() {
            self.slots.push(Some(agent));
        } else {
            self.slots[index] = Some(agent);
        }
        self.cohort_sizes[cohort] += 1;
        self.initial_count += 1;
        Ok(id)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        if !self.ids.is_live(id) {
            return None;
        }
        self.slots.get(id.index() as usize).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: AgentId) -> Result<&mut Agent, CoreError> {
        if !self.ids.is_live(id) {
            return Err(CoreError::UnknownAgent(id));
        }
        self.slots
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(CoreError::UnknownAgent(id))
    }

    /// Remove an agent for good; its id becomes stale.
    ///
    /// A removed agent no longer counts as active, so it shows up in the
    /// dead tally.
    pub fn remove(&mut self, id: AgentId) -> Result<Agent, CoreError> {
        if !self.ids.is_live(id) {
            return Err(CoreError::UnknownAgent(id));
        }
        let agent = self.slots[id.index() as usize]
            .take()
            .ok_or(CoreError::UnknownAgent(id))?;
        self.ids.free(id);
        // A dead agent has already left its cohort
        if let Some(cohort) = cohort_index(agent.state()) {
            self.cohort_sizes[cohort] -= 1;
        }
        Ok(agent)
    }

    /// Move a susceptible agent into the infected cohort
    pub fn infect(&mut self, id: AgentId, duration: u32, death_probability: f64) -> Result<(), CoreError> {
        self.get_mut(id)?.infect(duration, death_probability)?;
        self.retag(HealthState::Susceptible, HealthState::Infected);
        Ok(())
    }

    /// Move an agent into another cohort, keeping its id and kinematics.
    ///
    /// Infections start through [`Population::infect`] so they get a timer.
    /// Reclassifying to `Dead` removes the agent.
    pub fn reclassify(&mut self, id: AgentId, to: HealthState) -> Result<(), CoreError> {
        let agent = self.get_mut(id)?;
        let from = agent.state();
        if to == HealthState::Infected && from != HealthState::Infected {
            return Err(CoreError::PreconditionViolation { state: from });
        }
        if from == to {
            return Ok(());
        }
        agent.set_state(to);
        self.retag(from, to);
        if to == HealthState::Dead {
            self.remove(id)?;
        }
        Ok(())
    }

    pub fn set_velocity(&mut self, id: AgentId, velocity: glam::Vec2) -> Result<(), CoreError> {
        self.get_mut(id)?.set_velocity(velocity);
        Ok(())
    }

    fn retag(&mut self, from: HealthState, to: HealthState) {
        if let Some(cohort) = cohort_index(from) {
            self.cohort_sizes[cohort] -= 1;
        }
        if let Some(cohort) = cohort_index(to) {
            self.cohort_sizes[cohort] += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            let id = self.ids.id_at(index as u32)?;
            slot.as_ref().map(|agent| (id, agent))
        })
    }

    /// Agents currently tagged with `state`, in storage order
    pub fn cohort(&self, state: HealthState) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.iter().filter(move |(_, agent)| agent.state() == state)
    }

    pub fn len(&self) -> usize {
        self.cohort_sizes.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    pub fn cohort_size(&self, state: HealthState) -> usize {
        cohort_index(state).map_or(self.dead_count(), |cohort| self.cohort_sizes[cohort])
    }

    pub fn dead_count(&self) -> usize {
        self.initial_count - self.len()
    }

    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            susceptible: self.cohort_sizes[0],
            infected: self.cohort_sizes[1],
            recovered: self.cohort_sizes[2],
            dead: self.dead_count(),
            active: self.len(),
            initial: self.initial_count,
        }
    }

    /// Move every agent one tick
    pub fn advance_all(&mut self, arena: &Arena) {
        for agent in self.slots.iter_mut().flatten() {
            agent.advance(arena);
        }
    }

    /// Run the infection clock for every infected agent.
    ///
    /// Agents that die are removed; recovered agents change cohort in place.
    pub fn resolve_infections(&mut self, rng: &mut dyn RngCore) -> Result<(usize, usize), CoreError> {
        let infected: Vec<AgentId> = self.cohort(HealthState::Infected).map(|(id, _)| id).collect();
        let (mut recoveries, mut deaths) = (0, 0);

        for id in infected {
            match self.get_mut(id)?.tick_infection(rng) {
                InfectionOutcome::Recovered => {
                    self.retag(HealthState::Infected, HealthState::Recovered);
                    recoveries += 1;
                    trace!("Agent {:?} recovered", id);
                }
                InfectionOutcome::Died => {
                    self.retag(HealthState::Infected, HealthState::Dead);
                    self.remove(id)?;
                    deaths += 1;
                    trace!("Agent {:?} died", id);
                }
                InfectionOutcome::Ongoing | InfectionOutcome::Unaffected => {}
            }
        }
        Ok((recoveries, deaths))
    }

    /// One full tick: motion, then transmission, then infection timers.
    pub fn step<T>(&mut self, arena: &Arena, transmission: &mut T, rng: &mut dyn RngCore) -> Result<StepReport, CoreError>
    where
        T: Transmission + ?Sized,
    {
        self.advance_all(arena);
        let transmissions = transmission.transmit(self, rng)?;
        let (recoveries, deaths) = self.resolve_infections(rng)?;
        Ok(StepReport { transmissions, recoveries, deaths })
    }

    pub fn snapshot(&self) -> PopulationCounts {
        self.counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn plan(n_susceptible: usize, n_infected: usize, n_quarantined: usize) -> SeedPlan {
        SeedPlan {
            n_susceptible,
            n_infected,
            n_quarantined,
            infection_duration: 5,
            death_probability: 0.0,
            speeds: SpeedLimits::default(),
            radius: 5.0,
            placement_attempts: 8,
        }
    }

    fn agent_at(x: f32, y: f32, state: HealthState) -> Agent {
        Agent::spawn_at(Vec2::new(x, y), Vec2::ZERO, state)
    }

    /// Infects every susceptible agent, whatever the geometry
    struct InfectEveryone;

    impl Transmission for InfectEveryone {
        fn transmit(&mut self, population: &mut Population, _rng: &mut dyn RngCore) -> Result<usize, CoreError> {
            let targets: Vec<AgentId> = population.cohort(HealthState::Susceptible).map(|(id, _)| id).collect();
            for id in &targets {
                population.infect(*id, 2, 1.0)?;
            }
            Ok(targets.len())
        }
    }

    #[test]
    fn seeding_fills_each_cohort() {
        let arena = Arena::new(800.0, 600.0).unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        let population = Population::seed(&plan(30, 2, 10), &arena, &mut rng).unwrap();

        let counts = population.counts();
        assert_eq!(counts.susceptible, 40);
        assert_eq!(counts.infected, 2);
        assert_eq!(counts.recovered, 0);
        assert_eq!(counts.dead, 0);
        assert_eq!(counts.initial, 42);

        for (_, agent) in population.cohort(HealthState::Infected) {
            assert_eq!(agent.infection_timer(), 5);
        }
        // Quarantined agents come last and barely move
        let slow = population.iter().skip(32).all(|(_, a)| a.velocity().abs().max_element() <= 0.05);
        assert!(slow);
    }

    #[test]
    fn seeding_prefers_free_space() {
        let arena = Arena::new(800.0, 600.0).unwrap();
        let mut rng = Pcg64::seed_from_u64(9);
        let population = Population::seed(&plan(20, 0, 0), &arena, &mut rng).unwrap();
        let agents: Vec<&Agent> = population.iter().map(|(_, a)| a).collect();
        for (i, a) in agents.iter().enumerate() {
            for b in &agents[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn dead_agents_cannot_be_inserted() {
        let mut population = Population::new();
        let result = population.insert(agent_at(1.0, 1.0, HealthState::Dead));
        assert_eq!(result, Err(CoreError::InactiveAgent));
        assert_eq!(population.initial_count(), 0);
    }

    #[test]
    fn infected_agents_need_a_running_timer() {
        let mut population = Population::new();
        let result = population.insert(agent_at(1.0, 1.0, HealthState::Infected));
        assert_eq!(result, Err(CoreError::UntimedInfection));
        assert_eq!(population.initial_count(), 0);

        let mut agent = agent_at(1.0, 1.0, HealthState::Susceptible);
        agent.infect(3, 0.0).unwrap();
        population.insert(agent).unwrap();
        assert_eq!(population.cohort_size(HealthState::Infected), 1);
    }

    #[test]
    fn infect_moves_agent_between_cohorts_keeping_identity() {
        let mut population = Population::new();
        let id = population.insert(agent_at(50.0, 50.0, HealthState::Susceptible)).unwrap();
        population.infect(id, 4, 0.2).unwrap();

        assert_eq!(population.cohort_size(HealthState::Susceptible), 0);
        assert_eq!(population.cohort_size(HealthState::Infected), 1);
        let agent = population.get(id).unwrap();
        assert_eq!(agent.position(), Vec2::new(50.0, 50.0));
        assert_eq!(agent.state(), HealthState::Infected);

        // Second infection is a precondition violation and leaves counts alone
        let err = population.infect(id, 4, 0.2).unwrap_err();
        assert_eq!(err, CoreError::PreconditionViolation { state: HealthState::Infected });
        assert_eq!(population.cohort_size(HealthState::Infected), 1);
    }

    #[test]
    fn reclassify_keeps_identity() {
        let mut population = Population::new();
        let id = population.insert(agent_at(20.0, 30.0, HealthState::Susceptible)).unwrap();
        population.infect(id, 9, 0.0).unwrap();

        population.reclassify(id, HealthState::Recovered).unwrap();
        let agent = population.get(id).unwrap();
        assert_eq!(agent.state(), HealthState::Recovered);
        assert_eq!(agent.infection_timer(), 0);
        assert_eq!(agent.position(), Vec2::new(20.0, 30.0));
        assert_eq!(population.cohort_size(HealthState::Infected), 0);
        assert_eq!(population.cohort_size(HealthState::Recovered), 1);

        let err = population.reclassify(id, HealthState::Infected).unwrap_err();
        assert_eq!(err, CoreError::PreconditionViolation { state: HealthState::Recovered });

        population.reclassify(id, HealthState::Dead).unwrap();
        assert!(population.get(id).is_none());
        assert_eq!(population.counts().dead, 1);
        assert_eq!(population.counts().recovered, 0);
    }

    #[test]
    fn removed_ids_go_stale_and_slots_are_reused() {
        let mut population = Population::new();
        let first = population.insert(agent_at(1.0, 1.0, HealthState::Susceptible)).unwrap();
        population.remove(first).unwrap();
        assert!(population.get(first).is_none());
        assert_eq!(population.remove(first), Err(CoreError::UnknownAgent(first)));
        assert_eq!(population.dead_count(), 1);

        let second = population.insert(agent_at(2.0, 2.0, HealthState::Recovered)).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert_eq!(population.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![second]);
    }

    #[test]
    fn step_runs_motion_transmission_then_timers() {
        let arena = Arena::new(800.0, 600.0).unwrap();
        let mut rng = Pcg64::seed_from_u64(4);
        let mut population = Population::from_agents([
            Agent::spawn_at(Vec2::new(100.0, 100.0), Vec2::new(1.0, 0.0), HealthState::Susceptible),
            agent_at(300.0, 300.0, HealthState::Susceptible),
            agent_at(400.0, 300.0, HealthState::Recovered),
        ])
        .unwrap();

        let report = population.step(&arena, &mut InfectEveryone, &mut rng).unwrap();
        assert_eq!(report, StepReport { transmissions: 2, recoveries: 0, deaths: 0 });
        let (_, moved) = population.iter().next().unwrap();
        assert_eq!(moved.position(), Vec2::new(101.0, 100.0));
        assert_eq!(moved.infection_timer(), 1);

        let report = population.step(&arena, &mut InfectEveryone, &mut rng).unwrap();
        assert_eq!(report, StepReport { transmissions: 0, recoveries: 0, deaths: 2 });

        let counts = population.snapshot();
        assert_eq!(counts.active, 1);
        assert_eq!(counts.dead, 2);
        assert_eq!(counts.recovered, 1);
        assert_eq!(counts.susceptible + counts.infected + counts.recovered + counts.dead, counts.initial);
    }
}
