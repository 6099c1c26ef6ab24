//! Field-of-view weighting of pairwise interactions.

use crate::structs::Vector2D;

pub const DEFAULT_PHI: f64 = 100.0;
pub const DEFAULT_OUT_OF_VIEW_FACTOR: f64 = 0.5;

/// Down-weights forces whose source lies outside an agent's view cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldOfView {
    cos_phi: f64,
    out_of_view_factor: f64,
}

impl Default for FieldOfView {
    fn default() -> Self {
        FieldOfView::new(DEFAULT_PHI, DEFAULT_OUT_OF_VIEW_FACTOR)
    }
}

impl FieldOfView {
    /// `phi` is the half-angle of the view cone in degrees.
    pub fn new(phi: f64, out_of_view_factor: f64) -> Self {
        FieldOfView {
            cos_phi: phi.to_radians().cos(),
            out_of_view_factor,
        }
    }

    /// Weight of a single interaction: 1 when `force_direction` is inside the
    /// cone around `desired_direction`, the out-of-view factor otherwise.
    pub fn weight(&self, desired_direction: &Vector2D, force_direction: &Vector2D) -> f64 {
        if desired_direction.dot(force_direction) > force_direction.magnitude() * self.cos_phi {
            1.0
        } else {
            self.out_of_view_factor
        }
    }

    /// Weights for every ordered pair `(a, b)`. Self-pairs get weight 0.
    pub fn weights(&self, desired_directions: &[Vector2D], force_directions: &[Vec<Vector2D>]) -> Vec<Vec<f64>> {
        desired_directions
            .iter()
            .zip(force_directions)
            .enumerate()
            .map(|(a, (e_a, row))| {
                row.iter()
                    .enumerate()
                    .map(|(b, f)| if a == b { 0.0 } else { self.weight(e_a, f) })
                    .collect()
            })
            .collect()
    }
}
