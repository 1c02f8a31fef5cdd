//! The bounded rectangle agents move in.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;

/// Distance kept from every wall when placing agents
pub const DEFAULT_PLACEMENT_MARGIN: u32 = 10;

/// Rectangular arena spanning `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arena {
    width: f32,
    height: f32,
    placement_margin: u32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Result<Self, CoreError> {
        Self::with_margin(width, height, DEFAULT_PLACEMENT_MARGIN)
    }

    pub fn with_margin(width: f32, height: f32, placement_margin: u32) -> Result<Self, CoreError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(CoreError::InvalidArena(format!(
                "dimensions must be positive, got {width} x {height}"
            )));
        }
        // Placement draws from [margin, extent - margin), which must be non-empty
        let span = 2.0 * placement_margin as f32;
        if width.floor() <= span || height.floor() <= span {
            return Err(CoreError::InvalidArena(format!(
                "{width} x {height} is too small for a placement margin of {placement_margin}"
            )));
        }
        Ok(Self { width, height, placement_margin })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn placement_margin(&self) -> u32 {
        self.placement_margin
    }

    /// Far wall an agent of the given diameter bounces off, per axis
    pub fn bounce_limit(&self, diameter: f32) -> Vec2 {
        Vec2::new(self.width - diameter, self.height - diameter)
    }

    /// Uniform integer coordinates in `[margin, extent - margin)` on both axes.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let margin = self.placement_margin as i64;
        let x = rng.gen_range(margin..self.width.floor() as i64 - margin);
        let y = rng.gen_range(margin..self.height.floor() as i64 - margin);
        Vec2::new(x as f32, y as f32)
    }
}
