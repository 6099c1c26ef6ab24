//! # Force Evaluator
//!
//! The entry point used by a simulation stepper once per tick:
//!
//! 1. [`ForceEvaluator::load_config`] resolves every active term's
//!    parameters (once, or whenever the configuration changes)
//! 2. [`ForceEvaluator::set_state`] freezes the tick's agents, groups,
//!    obstacles and optional initial speeds into a [`SceneSnapshot`]
//! 3. [`ForceEvaluator::get_force`] / [`ForceEvaluator::net_force`]
//!    evaluate the terms against that snapshot
//!
//! Results are never cached: every call evaluates the terms afresh.

use crate::config::ForceConfig;
use crate::error::ForceError;
use crate::forces::{build_force, Force, ForceKind, GroupRepulsiveForce, RepulsionGating};
use crate::snapshot::{SceneSnapshot, SnapshotBuilder};
use crate::structs::{AgentState, ForceMatrix, Group, Space, Vector2D};
use tracing::{debug, trace};

#[derive(Debug)]
pub struct ForceEvaluator {
    kinds: Vec<ForceKind>,
    config: ForceConfig,
    forces: Vec<Box<dyn Force>>,
    repulsion_gating: RepulsionGating,
    builder: SnapshotBuilder,
    snapshot: Option<SceneSnapshot>,
}

impl ForceEvaluator {
    /// Evaluator for the given terms, configured from `config`.
    pub fn new(config: &ForceConfig, kinds: &[ForceKind]) -> Result<Self, ForceError> {
        let mut evaluator = ForceEvaluator {
            kinds: kinds.to_vec(),
            config: config.clone(),
            forces: Vec::new(),
            repulsion_gating: RepulsionGating::default(),
            builder: SnapshotBuilder::new(),
            snapshot: None,
        };
        evaluator.load_config(config)?;
        Ok(evaluator)
    }

    /// Evaluator for every term that has a table in `config`, in registry order.
    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        let kinds: Vec<_> = ForceKind::ALL
            .into_iter()
            .filter(|kind| config.force(kind.name()).is_some())
            .collect();
        Self::new(config, &kinds)
    }

    /// Switches how the group repulsive term treats distant pairs.
    pub fn set_repulsion_gating(&mut self, gating: RepulsionGating) -> Result<(), ForceError> {
        self.repulsion_gating = gating;
        let config = self.config.clone();
        self.load_config(&config)
    }

    /// Rebuilds every active term from `config`.
    pub fn load_config(&mut self, config: &ForceConfig) -> Result<(), ForceError> {
        let mut forces = Vec::with_capacity(self.kinds.len());
        for &kind in &self.kinds {
            let force: Box<dyn Force> = if kind == ForceKind::GroupRepulsive {
                Box::new(GroupRepulsiveForce::from_config(config)?.with_gating(self.repulsion_gating))
            } else {
                build_force(kind, config)?
            };
            forces.push(force);
        }
        self.forces = forces;
        self.config = config.clone();
        debug!(forces = ?self.names(), time_step = config.time_step, "force config loaded");
        Ok(())
    }

    pub fn forces(&self) -> &[Box<dyn Force>] {
        &self.forces
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.forces.iter().map(|f| f.name()).collect()
    }

    /// Freezes the state of the current tick. `initial_speeds` of `None`
    /// keeps the speeds supplied on an earlier tick. A rejected state leaves
    /// the evaluator without a snapshot.
    pub fn set_state(
        &mut self,
        states: Vec<AgentState>,
        groups: Option<Vec<Group>>,
        space: Option<Space>,
        initial_speeds: Option<Vec<f64>>,
    ) -> Result<(), ForceError> {
        self.snapshot = None;
        let snapshot = self.builder.build(states, groups, space, initial_speeds)?;
        debug!(
            agents = snapshot.len(),
            groups = snapshot.groups().map_or(0, |g| g.len()),
            obstacles = snapshot.space().map_or(0, |s| s.len()),
            "state set"
        );
        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<&SceneSnapshot, ForceError> {
        self.snapshot.as_ref().ok_or(ForceError::StateNotSet)
    }

    /// Output of a single active term.
    pub fn get_force(&self, kind: ForceKind) -> Result<ForceMatrix, ForceError> {
        let snapshot = self.snapshot()?;
        let force = self
            .forces
            .iter()
            .find(|f| f.kind() == kind)
            .ok_or_else(|| ForceError::UnknownForce(kind.name().to_string()))?;
        force.compute(snapshot)
    }

    /// Output of every active term, keyed by name.
    pub fn get_forces(&self) -> Result<Vec<(&'static str, ForceMatrix)>, ForceError> {
        let snapshot = self.snapshot()?;
        self.forces
            .iter()
            .map(|force| {
                trace!(force = force.name(), "evaluating");
                Ok((force.name(), force.compute(snapshot)?))
            })
            .collect()
    }

    /// Element-wise sum of every active term.
    pub fn net_force(&self) -> Result<ForceMatrix, ForceError> {
        let mut net = vec![Vector2D::ZERO; self.snapshot()?.len()];
        for (_, forces) in self.get_forces()? {
            for (total, f) in net.iter_mut().zip(forces) {
                *total += f;
            }
        }
        Ok(net)
    }
}
