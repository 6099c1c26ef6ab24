//! # Core Data Structures
//!
//! This module defines the fundamental data types used throughout the library:
//!
//! - **Point**: 2D position in continuous space
//! - **Vector2D**: 2D velocity/direction/force vector with arithmetic operations
//! - **AgentState**: Complete state of a pedestrian (position, velocity, goal, speed, tau)
//! - **Obstacle / Space**: Sampled obstacle boundaries used by the space potential
//! - **Group / ForceMatrix**: Index sets and per-agent force rows

use crate::error::ForceError;
use nalgebra::Vector2;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Indices into the agent list that share a social group.
pub type Group = Vec<usize>;

/// One force vector per agent, aligned with agent index.
pub type ForceMatrix = Vec<Vector2D>;

/// Obstacles present in the scene.
pub type Space = Vec<Obstacle>;

#[cfg_attr(feature = "python", pyo3::pyclass)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub x: f64,
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Sub for Point {
    type Output = Vector2D;

    fn sub(self, other: Point) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

#[cfg_attr(feature = "python", pyo3::pyclass)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub x: f64,
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vector2D { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(&self) -> Vector2D {
        let mag = self.magnitude();
        if mag > 0.0 {
            Vector2D {
                x: self.x / mag,
                y: self.y / mag,
            }
        } else {
            Vector2D::ZERO
        }
    }

    pub fn dot(&self, other: &Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vector2D {
    type Output = Vector2D;

    fn add(self, other: Vector2D) -> Vector2D {
        Vector2D {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vector2D {
    fn add_assign(&mut self, other: Vector2D) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2D {
    type Output = Vector2D;

    fn sub(self, other: Vector2D) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f64> for Vector2D {
    type Output = Vector2D;

    fn mul(self, scalar: f64) -> Vector2D {
        Vector2D {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Neg for Vector2D {
    type Output = Vector2D;

    fn neg(self) -> Vector2D {
        Vector2D {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl From<Vector2<f64>> for Vector2D {
    fn from(v: Vector2<f64>) -> Self {
        Vector2D::new(v.x, v.y)
    }
}

impl From<Vector2D> for Vector2<f64> {
    fn from(v: Vector2D) -> Self {
        Vector2::new(v.x, v.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(p: Point) -> Self {
        Vector2::new(p.x, p.y)
    }
}

/// Kinematic state of a single pedestrian for one tick.
#[cfg_attr(feature = "python", pyo3::pyclass)]
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub position: Point,
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub velocity: Vector2D,
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub goal: Point,
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub desired_speed: f64,
    /// Relaxation time in seconds.
    #[cfg_attr(feature = "python", pyo3(get, set))]
    pub tau: f64,
}

impl AgentState {
    pub fn new(position: Point, velocity: Vector2D, goal: Point, desired_speed: f64, tau: f64) -> Self {
        AgentState {
            position,
            velocity,
            goal,
            desired_speed,
            tau,
        }
    }

    /// Builds an agent from a numeric state row.
    ///
    /// Two layouts are accepted:
    /// - `[x, y, vx, vy, gx, gy, tau]`, desired speed taken as the current speed
    /// - `[x, y, vx, vy, gx, gy, desired_speed, tau]`
    pub fn from_row(row: &[f64]) -> Result<Self, ForceError> {
        match *row {
            [x, y, vx, vy, gx, gy, tau] => {
                let velocity = Vector2D::new(vx, vy);
                Ok(AgentState::new(Point::new(x, y), velocity, Point::new(gx, gy), velocity.magnitude(), tau))
            }
            [x, y, vx, vy, gx, gy, desired_speed, tau] => Ok(AgentState::new(
                Point::new(x, y),
                Vector2D::new(vx, vy),
                Point::new(gx, gy),
                desired_speed,
                tau,
            )),
            _ if row.len() < 7 => Err(ForceError::MissingRelaxationTime { columns: row.len() }),
            _ => Err(ForceError::ShapeMismatch {
                what: "state row",
                expected: 8,
                actual: row.len(),
            }),
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }
}

/// An obstacle given as densely sampled boundary points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Obstacle {
    pub points: Vec<Point>,
}

impl Obstacle {
    pub fn new(points: Vec<Point>) -> Self {
        Obstacle { points }
    }

    /// Sampled point closest to `position`, if the obstacle has any points.
    pub fn closest_point(&self, position: &Point) -> Option<Point> {
        self.points
            .iter()
            .copied()
            .min_by(|a, b| {
                a.distance(position)
                    .partial_cmp(&b.distance(position))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Point Tests ====================

    #[test]
    fn test_point_distance_diagonal() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(&p2), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn test_point_sub_operator() {
        let v = Point::new(5.0, 7.0) - Point::new(2.0, 3.0);
        assert_eq!(v, Vector2D::new(3.0, 4.0));
    }

    // ==================== Vector2D Tests ====================

    #[test]
    fn test_vector2d_magnitude_345() {
        assert_eq!(Vector2D::new(-3.0, -4.0).magnitude(), 5.0);
    }

    #[test]
    fn test_vector2d_normalize_zero() {
        let n = Vector2D::ZERO.normalize();
        assert!(n.is_zero());
        assert!(!n.x.is_nan());
    }

    #[test]
    fn test_vector2d_normalize_345() {
        let n = Vector2D::new(3.0, 4.0).normalize();
        assert!((n.x - 0.6).abs() < 1e-10);
        assert!((n.y - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_vector2d_operators() {
        let v1 = Vector2D::new(1.0, 2.0);
        let v2 = Vector2D::new(3.0, 4.0);
        assert_eq!(v1 + v2, Vector2D::new(4.0, 6.0));
        assert_eq!(v2 - v1, Vector2D::new(2.0, 2.0));
        assert_eq!(v1 * 2.0, Vector2D::new(2.0, 4.0));
        assert_eq!(-v1, Vector2D::new(-1.0, -2.0));
        assert_eq!(v1.dot(&v2), 11.0);

        let mut acc = Vector2D::ZERO;
        acc += v1;
        acc += v2;
        assert_eq!(acc, Vector2D::new(4.0, 6.0));
    }

    #[test]
    fn test_vector2d_nalgebra_conversion() {
        let v = Vector2D::new(1.5, -2.5);
        let na: Vector2<f64> = v.into();
        assert_eq!(na, Vector2::new(1.5, -2.5));
        assert_eq!(Vector2D::from(na), v);
    }

    // ==================== AgentState Tests ====================

    #[test]
    fn test_agent_state_from_seven_column_row() {
        let agent = AgentState::from_row(&[1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 0.5]).unwrap();
        assert_eq!(agent.position, Point::new(1.0, 2.0));
        assert_eq!(agent.velocity, Vector2D::new(3.0, 4.0));
        assert_eq!(agent.goal, Point::new(10.0, 20.0));
        assert_eq!(agent.desired_speed, 5.0);
        assert_eq!(agent.tau, 0.5);
    }

    #[test]
    fn test_agent_state_from_eight_column_row() {
        let agent = AgentState::from_row(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.3, 0.5]).unwrap();
        assert_eq!(agent.desired_speed, 1.3);
        assert_eq!(agent.tau, 0.5);
    }

    #[test]
    fn test_agent_state_row_without_tau_fails() {
        let err = AgentState::from_row(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap_err();
        assert!(matches!(err, ForceError::MissingRelaxationTime { columns: 6 }));
    }

    #[test]
    fn test_agent_state_row_too_wide_fails() {
        let err = AgentState::from_row(&[0.0; 9]).unwrap_err();
        assert!(matches!(err, ForceError::ShapeMismatch { actual: 9, .. }));
    }

    // ==================== Obstacle Tests ====================

    #[test]
    fn test_obstacle_closest_point() {
        let obstacle = Obstacle::new(vec![
            Point::new(0.0, 5.0),
            Point::new(1.0, 1.0),
            Point::new(4.0, 0.0),
        ]);
        assert_eq!(obstacle.closest_point(&Point::new(0.0, 0.0)), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_obstacle_closest_point_empty() {
        assert_eq!(Obstacle::default().closest_point(&Point::new(0.0, 0.0)), None);
    }
}
