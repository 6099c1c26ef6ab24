//! # Interaction Potentials
//!
//! Repulsive potentials between pedestrians and between pedestrians and
//! obstacles. Forces are the negative gradients of these potentials with
//! respect to the relative position.
//!
//! ## Pedestrian-pedestrian
//!
//! The potential of agent `b` as felt by agent `a` is
//! `V(b) = v0 * exp(-b / sigma)`, where `b` is the semi-minor axis of an
//! ellipse with foci at `a`'s relative position now and after `b` takes one
//! step along its desired direction:
//!
//! ```text
//! b = 0.5 * sqrt((|r_ab| + |r_ab - dt * s_b * e_b|)^2 - (dt * s_b)^2)
//! ```
//!
//! ## Pedestrian-obstacle
//!
//! `U(r_aB) = u0 * exp(-|r_aB| / r)` with `r_aB` pointing from the closest
//! sampled point of obstacle `B` to agent `a`.
//!
//! Both gradients are forward finite differences with step [`GRADIENT_DELTA`].

use crate::stateutils;
use crate::structs::{AgentState, Obstacle, Vector2D};
use nalgebra::Vector2;

/// Finite-difference step used for potential gradients.
pub const GRADIENT_DELTA: f64 = 1e-3;

fn finite_difference_grad<F>(r: Vector2<f64>, value: F) -> Vector2<f64>
where
    F: Fn(Vector2<f64>) -> f64,
{
    let v = value(r);
    let dvdx = (value(r + Vector2::new(GRADIENT_DELTA, 0.0)) - v) / GRADIENT_DELTA;
    let dvdy = (value(r + Vector2::new(0.0, GRADIENT_DELTA)) - v) / GRADIENT_DELTA;
    Vector2::new(dvdx, dvdy)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedPedPotential {
    pub delta_t: f64,
    pub v0: f64,
    pub sigma: f64,
}

impl PedPedPotential {
    pub fn new(delta_t: f64, v0: f64, sigma: f64) -> Self {
        PedPedPotential { delta_t, v0, sigma }
    }

    pub fn value_b(&self, b: f64) -> f64 {
        self.v0 * (-b / self.sigma).exp()
    }

    /// Semi-minor axis of the interaction ellipse.
    pub fn b(&self, r_ab: Vector2<f64>, speed_b: f64, e_b: Vector2<f64>) -> f64 {
        let step = self.delta_t * speed_b;
        let in_sqrt = (r_ab.norm() + (r_ab - e_b * step).norm()).powi(2) - step * step;
        // the radicand is non-negative by the triangle inequality up to rounding
        0.5 * in_sqrt.max(0.0).sqrt()
    }

    pub fn value_r_ab(&self, r_ab: Vector2<f64>, speed_b: f64, e_b: Vector2<f64>) -> f64 {
        self.value_b(self.b(r_ab, speed_b, e_b))
    }

    /// Gradient of the potential of every agent `b` felt by every agent `a`,
    /// with respect to `r_ab = r_a - r_b`. Self-interactions are zero.
    pub fn grad_r_ab(&self, states: &[AgentState]) -> Vec<Vec<Vector2D>> {
        let speeds = stateutils::speeds(states);
        let directions = stateutils::desired_directions(states);

        states
            .iter()
            .enumerate()
            .map(|(a, state_a)| {
                states
                    .iter()
                    .enumerate()
                    .map(|(b, state_b)| {
                        if a == b {
                            return Vector2D::ZERO;
                        }
                        let r_ab: Vector2<f64> = (state_a.position - state_b.position).into();
                        let e_b: Vector2<f64> = directions[b].into();
                        Vector2D::from(finite_difference_grad(r_ab, |r| self.value_r_ab(r, speeds[b], e_b)))
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PedSpacePotential<'a> {
    pub space: &'a [Obstacle],
    pub u0: f64,
    pub r: f64,
}

impl<'a> PedSpacePotential<'a> {
    pub fn new(space: &'a [Obstacle], u0: f64, r: f64) -> Self {
        PedSpacePotential { space, u0, r }
    }

    pub fn value_r_a_obstacle(&self, r_a_obstacle: Vector2<f64>) -> f64 {
        self.u0 * (-r_a_obstacle.norm() / self.r).exp()
    }

    /// Vectors from the closest point of each non-empty obstacle to each agent.
    pub fn r_a_obstacle(&self, states: &[AgentState]) -> Vec<Vec<Vector2D>> {
        states
            .iter()
            .map(|state| {
                self.space
                    .iter()
                    .filter_map(|obstacle| obstacle.closest_point(&state.position))
                    .map(|closest| state.position - closest)
                    .collect()
            })
            .collect()
    }

    /// Gradient of every obstacle's potential at every agent. One row per
    /// agent, one entry per non-empty obstacle.
    pub fn grad_r_a_obstacle(&self, states: &[AgentState]) -> Vec<Vec<Vector2D>> {
        self.r_a_obstacle(states)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|r_a_b| {
                        Vector2D::from(finite_difference_grad(r_a_b.into(), |r| self.value_r_a_obstacle(r)))
                    })
                    .collect()
            })
            .collect()
    }
}
