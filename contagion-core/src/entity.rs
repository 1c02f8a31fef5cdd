use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable handle to an agent slot in a [`Population`](crate::Population).
///
/// The generation is bumped whenever the slot is freed, so a handle to a dead
/// agent never resolves to whoever reuses the slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    index: u32,
    generation: u32,
}

impl AgentId {
    pub fn new(index: u32, generation: u32) -> Self {
        AgentId { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Hands out agent ids, recycling freed slots
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    generations: Vec<u32>,        // Current generation per slot
    occupied: Vec<bool>,
    recycled: VecDeque<u32>,      // Freed slots waiting for reuse
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id, reusing the oldest freed slot first
    pub fn allocate(&mut self) -> AgentId {
        if let Some(index) = self.recycled.pop_front() {
            self.occupied[index as usize] = true;
            AgentId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.occupied.push(true);
            AgentId::new(index, 0)
        }
    }

    /// Free an id. Returns false if the id was already stale.
    pub fn free(&mut self, id: AgentId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.generations[id.index as usize] += 1;
        self.occupied[id.index as usize] = false;
        self.recycled.push_back(id.index);
        true
    }

    pub fn is_live(&self, id: AgentId) -> bool {
        let index = id.index as usize;
        self.generations.get(index) == Some(&id.generation) && self.occupied[index]
    }

    /// The live id occupying `index`, if any
    pub fn id_at(&self, index: u32) -> Option<AgentId> {
        let id = AgentId::new(index, *self.generations.get(index as usize)?);
        self.is_live(id).then_some(id)
    }
}
