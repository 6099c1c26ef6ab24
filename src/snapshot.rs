//! # Per-tick Scene Snapshot
//!
//! A [`SceneSnapshot`] freezes everything a force term may read during one
//! tick: agent states, groups, obstacles, the desired-direction cache and the
//! initial speeds. Snapshots are immutable; a new one is built every tick.
//!
//! [`SnapshotBuilder`] owns the only piece of state that outlives a tick: the
//! last initial speeds supplied by the caller. When a tick does not supply
//! speeds the previous ones are reused; if none were ever supplied each
//! agent's own desired speed is used.

use crate::error::ForceError;
use crate::stateutils;
use crate::structs::{AgentState, ForceMatrix, Group, Obstacle, Point, Space, Vector2D};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    states: Vec<AgentState>,
    groups: Option<Vec<Group>>,
    space: Option<Space>,
    desired_directions: Vec<Vector2D>,
    initial_speeds: Vec<f64>,
}

impl SceneSnapshot {
    pub fn states(&self) -> &[AgentState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn groups(&self) -> Option<&[Group]> {
        self.groups.as_deref()
    }

    pub fn space(&self) -> Option<&[Obstacle]> {
        self.space.as_deref()
    }

    /// Unit vectors towards each agent's goal, computed when the snapshot was built.
    pub fn desired_directions(&self) -> &[Vector2D] {
        &self.desired_directions
    }

    pub fn initial_speeds(&self) -> &[f64] {
        &self.initial_speeds
    }

    /// Positions of the given agents, in group order.
    pub fn member_positions(&self, group: &[usize]) -> Vec<Point> {
        group.iter().map(|&i| self.states[i].position).collect()
    }

    /// A zero force for every agent.
    pub fn zeros(&self) -> ForceMatrix {
        vec![Vector2D::ZERO; self.states.len()]
    }
}

/// Parses numeric state rows into agents. See [`AgentState::from_row`].
pub fn states_from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Vec<AgentState>, ForceError> {
    rows.iter().map(|row| AgentState::from_row(row.as_ref())).collect()
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    initial_speeds: Option<Vec<f64>>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial speeds carried over from earlier ticks, if any.
    pub fn initial_speeds(&self) -> Option<&[f64]> {
        self.initial_speeds.as_deref()
    }

    pub fn build(
        &mut self,
        states: Vec<AgentState>,
        groups: Option<Vec<Group>>,
        space: Option<Space>,
        initial_speeds: Option<Vec<f64>>,
    ) -> Result<SceneSnapshot, ForceError> {
        let n = states.len();

        if let Some(groups) = &groups {
            for (g, group) in groups.iter().enumerate() {
                if let Some(&index) = group.iter().find(|&&i| i >= n) {
                    return Err(ForceError::GroupIndexOutOfBounds {
                        group: g,
                        index,
                        agents: n,
                    });
                }
            }
        }

        if let Some(speeds) = initial_speeds {
            if speeds.len() != n {
                return Err(ForceError::ShapeMismatch {
                    what: "initial speeds",
                    expected: n,
                    actual: speeds.len(),
                });
            }
            self.initial_speeds = Some(speeds);
        }

        let initial_speeds = match &self.initial_speeds {
            Some(speeds) if speeds.len() == n => speeds.clone(),
            Some(speeds) => {
                return Err(ForceError::ShapeMismatch {
                    what: "carried-over initial speeds",
                    expected: n,
                    actual: speeds.len(),
                })
            }
            None => {
                debug!("no initial speeds supplied yet, using per-agent desired speeds");
                states.iter().map(|s| s.desired_speed).collect()
            }
        };

        let desired_directions = stateutils::desired_directions(&states);

        Ok(SceneSnapshot {
            states,
            groups,
            space,
            desired_directions,
            initial_speeds,
        })
    }
}
