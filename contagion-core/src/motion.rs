use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Speed bounds for freshly drawn velocities.
///
/// Each velocity component is drawn uniformly from `[-limit, limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimits {
    /// Agents moving about normally
    pub normal: f32,
    /// Agents keeping to themselves
    pub quarantine: f32,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self { normal: 2.0, quarantine: 0.05 }
    }
}

impl SpeedLimits {
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, quarantined: bool) -> Vec2 {
        let limit = if quarantined { self.quarantine } else { self.normal };
        random_velocity(rng, limit)
    }

    /// Quarantine with probability `quarantine_fraction`, otherwise move normally.
    pub fn redraw<R: Rng + ?Sized>(&self, rng: &mut R, quarantine_fraction: f64) -> Vec2 {
        let roll: f64 = rng.gen();
        self.draw(rng, roll <= quarantine_fraction)
    }
}

/// Uniform velocity with both components in `[-limit, limit)`
pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R, limit: f32) -> Vec2 {
    Vec2::new(
        rng.gen::<f32>() * 2.0 * limit - limit,
        rng.gen::<f32>() * 2.0 * limit - limit,
    )
}
