//! Geometry helpers over agent states.
//!
//! All helpers guard degenerate input: zero-length vectors normalize to the
//! zero vector and empty point sets have the origin as centre, so no NaN
//! leaks into force arithmetic.

use crate::structs::{AgentState, Point, Vector2D};

/// Unit vectors from each agent's position towards its goal.
///
/// An agent standing on its goal gets the zero vector.
pub fn desired_directions(states: &[AgentState]) -> Vec<Vector2D> {
    states
        .iter()
        .map(|s| (s.goal - s.position).normalize())
        .collect()
}

/// Splits vectors into unit directions and their norms.
pub fn normalize(vectors: &[Vector2D]) -> (Vec<Vector2D>, Vec<f64>) {
    vectors.iter().map(|v| (v.normalize(), v.magnitude())).unzip()
}

/// Current speed of each agent.
pub fn speeds(states: &[AgentState]) -> Vec<f64> {
    states.iter().map(AgentState::speed).collect()
}

/// Unweighted arithmetic mean of the given positions.
pub fn group_center(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Pairwise differences: `diff[a][b] = points[a] - points[b]`.
pub fn vec_diff(points: &[Point]) -> Vec<Vec<Vector2D>> {
    points
        .iter()
        .map(|a| points.iter().map(|b| *a - *b).collect())
        .collect()
}
