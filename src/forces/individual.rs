//! Force terms acting on each agent individually: goal attraction and
//! repulsion from other pedestrians and from obstacles.

use super::{Force, ForceBase, ForceKind};
use crate::config::ForceConfig;
use crate::error::ForceError;
use crate::fieldofview::{FieldOfView, DEFAULT_OUT_OF_VIEW_FACTOR, DEFAULT_PHI};
use crate::potentials::{PedPedPotential, PedSpacePotential};
use crate::snapshot::SceneSnapshot;
use crate::structs::{ForceMatrix, Vector2D};

/// Relaxation towards the desired velocity:
/// `F_i = (v0_i * e_i - v_i) / tau_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalAttractiveForce {
    base: ForceBase,
}

impl GoalAttractiveForce {
    pub const KIND: ForceKind = ForceKind::GoalAttractive;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        Ok(GoalAttractiveForce {
            base: ForceBase::load(Self::KIND, config)?,
        })
    }
}

impl Force for GoalAttractiveForce {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        let forces = snapshot
            .states()
            .iter()
            .zip(snapshot.desired_directions())
            .zip(snapshot.initial_speeds())
            .enumerate()
            .map(|(i, ((state, e), &v0))| {
                if !(state.tau.is_finite() && state.tau > 0.0) {
                    return Err(ForceError::InvalidRelaxationTime { agent: i, tau: state.tau });
                }
                Ok((*e * v0 - state.velocity) * (1.0 / state.tau))
            })
            .collect::<Result<ForceMatrix, _>>()?;
        Ok(self.base.scale(forces))
    }
}

/// Pairwise repulsion between pedestrians, down-weighted for pedestrians
/// outside the field of view.
#[derive(Debug, Clone, PartialEq)]
pub struct PedRepulsiveForce {
    base: ForceBase,
    potential: PedPedPotential,
    fov: FieldOfView,
}

impl PedRepulsiveForce {
    pub const KIND: ForceKind = ForceKind::PedRepulsive;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        let base = ForceBase::load(Self::KIND, config)?;
        let name = Self::KIND.name();
        let v0 = base.params.required(name, "v0")?;
        let sigma = base.params.required(name, "sigma")?;
        if sigma <= 0.0 {
            return Err(ForceError::InvalidParameter {
                force: name,
                key: "sigma",
                value: sigma,
            });
        }
        let phi = base.params.optional(name, "fov_phi", DEFAULT_PHI)?;
        let out_of_view = base.params.optional(name, "fov_factor", DEFAULT_OUT_OF_VIEW_FACTOR)?;

        Ok(PedRepulsiveForce {
            potential: PedPedPotential::new(base.time_step, v0, sigma),
            fov: FieldOfView::new(phi, out_of_view),
            base,
        })
    }

    pub fn potential(&self) -> &PedPedPotential {
        &self.potential
    }
}

impl Force for PedRepulsiveForce {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        // the gradient is the negated force, i.e. the direction the force comes from
        let grad = self.potential.grad_r_ab(snapshot.states());
        let weights = self.fov.weights(snapshot.desired_directions(), &grad);

        let forces = grad
            .iter()
            .zip(&weights)
            .map(|(row, w_row)| {
                row.iter()
                    .zip(w_row)
                    .fold(Vector2D::ZERO, |acc, (g, &w)| acc + (-*g) * w)
            })
            .collect();
        Ok(self.base.scale(forces))
    }
}

/// Repulsion from obstacles. Without a space the force is exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceRepulsiveForce {
    base: ForceBase,
    u0: f64,
    r: f64,
}

impl SpaceRepulsiveForce {
    pub const KIND: ForceKind = ForceKind::SpaceRepulsive;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        let base = ForceBase::load(Self::KIND, config)?;
        let name = Self::KIND.name();
        let u0 = base.params.required(name, "u0")?;
        let r = base.params.required(name, "r")?;
        if r <= 0.0 {
            return Err(ForceError::InvalidParameter {
                force: name,
                key: "r",
                value: r,
            });
        }
        Ok(SpaceRepulsiveForce { base, u0, r })
    }
}

impl Force for SpaceRepulsiveForce {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        let Some(space) = snapshot.space() else {
            return Ok(snapshot.zeros());
        };

        let potential = PedSpacePotential::new(space, self.u0, self.r);
        let forces = potential
            .grad_r_a_obstacle(snapshot.states())
            .into_iter()
            .map(|row| row.into_iter().fold(Vector2D::ZERO, |acc, g| acc + (-g)))
            .collect();
        Ok(self.base.scale(forces))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceParams;
    use crate::snapshot::SnapshotBuilder;
    use crate::structs::{AgentState, Obstacle, Point};
    use approx::assert_relative_eq;

    fn agent(pos: (f64, f64), vel: (f64, f64), goal: (f64, f64), speed: f64, tau: f64) -> AgentState {
        AgentState::new(
            Point::new(pos.0, pos.1),
            Vector2D::new(vel.0, vel.1),
            Point::new(goal.0, goal.1),
            speed,
            tau,
        )
    }

    fn snapshot(states: Vec<AgentState>) -> SceneSnapshot {
        SnapshotBuilder::new().build(states, None, None, None).unwrap()
    }

    fn ped_config() -> ForceConfig {
        ForceConfig::default().with_force(
            "ped_repulsive_force",
            ForceParams::new().with("factor", 1.0).with("v0", 2.1).with("sigma", 0.3),
        )
    }

    // ==================== GoalAttractiveForce ====================

    #[test]
    fn test_goal_two_agents_from_rest() {
        let force = GoalAttractiveForce::from_config(&ForceConfig::default()).unwrap();
        let snap = snapshot(vec![
            agent((0.0, 0.0), (0.0, 0.0), (10.0, 0.0), 1.0, 0.5),
            agent((0.0, 2.0), (0.0, 0.0), (10.0, 2.0), 1.0, 0.5),
        ]);
        let f = force.compute(&snap).unwrap();
        for fi in &f {
            assert_relative_eq!(fi.x, 2.0);
            assert_relative_eq!(fi.y, 0.0);
        }
    }

    #[test]
    fn test_goal_zero_speed_is_pure_damping() {
        let config = ForceConfig::default().with_force("goal_attractive_force", ForceParams::new().with("factor", 3.0));
        let force = GoalAttractiveForce::from_config(&config).unwrap();
        let states = vec![
            agent((0.0, 0.0), (1.0, -2.0), (5.0, 5.0), 0.0, 0.5),
            agent((3.0, 1.0), (-0.5, 0.25), (-5.0, 2.0), 0.0, 2.0),
        ];
        let snap = SnapshotBuilder::new().build(states.clone(), None, None, Some(vec![0.0, 0.0])).unwrap();
        let f = force.compute(&snap).unwrap();
        for (fi, s) in f.iter().zip(&states) {
            assert_relative_eq!(fi.x, -s.velocity.x / s.tau * 3.0);
            assert_relative_eq!(fi.y, -s.velocity.y / s.tau * 3.0);
        }
    }

    #[test]
    fn test_goal_uses_supplied_initial_speeds() {
        let force = GoalAttractiveForce::from_config(&ForceConfig::default()).unwrap();
        let snap = SnapshotBuilder::new()
            .build(vec![agent((0.0, 0.0), (0.0, 0.0), (0.0, 4.0), 1.0, 1.0)], None, None, Some(vec![1.5]))
            .unwrap();
        let f = force.compute(&snap).unwrap();
        assert_relative_eq!(f[0].y, 1.5);
    }

    #[test]
    fn test_goal_rejects_invalid_tau() {
        let force = GoalAttractiveForce::from_config(&ForceConfig::default()).unwrap();
        for tau in [0.0, -1.0, f64::NAN] {
            let snap = snapshot(vec![
                agent((0.0, 0.0), (0.0, 0.0), (1.0, 0.0), 1.0, 0.5),
                agent((1.0, 0.0), (0.0, 0.0), (2.0, 0.0), 1.0, tau),
            ]);
            let err = force.compute(&snap).unwrap_err();
            assert!(matches!(err, ForceError::InvalidRelaxationTime { agent: 1, .. }));
        }
    }

    // ==================== PedRepulsiveForce ====================

    #[test]
    fn test_ped_requires_potential_parameters() {
        let config = ForceConfig::default().with_force("ped_repulsive_force", ForceParams::new().with("factor", 1.0).with("v0", 2.1));
        let err = PedRepulsiveForce::from_config(&config).unwrap_err();
        assert!(matches!(err, ForceError::MissingParameter { key: "sigma", .. }));

        let err = PedRepulsiveForce::from_config(&ForceConfig::default()).unwrap_err();
        assert!(matches!(err, ForceError::MissingParameter { key: "v0", .. }));
    }

    #[test]
    fn test_ped_uses_global_time_step() {
        let config = ForceConfig {
            time_step: 0.1,
            ..ped_config()
        };
        let force = PedRepulsiveForce::from_config(&config).unwrap();
        assert_eq!(force.potential().delta_t, 0.1);
    }

    #[test]
    fn test_ped_single_agent_has_no_force() {
        let force = PedRepulsiveForce::from_config(&ped_config()).unwrap();
        let f = force.compute(&snapshot(vec![agent((0.0, 0.0), (0.0, 0.0), (1.0, 0.0), 1.0, 0.5)])).unwrap();
        assert_eq!(f, vec![Vector2D::ZERO]);
    }

    #[test]
    fn test_ped_facing_agents_push_apart() {
        let force = PedRepulsiveForce::from_config(&ped_config()).unwrap();
        let snap = snapshot(vec![
            agent((0.0, 0.0), (0.0, 0.0), (10.0, 0.0), 1.0, 0.5),
            agent((1.0, 0.0), (0.0, 0.0), (-10.0, 0.0), 1.0, 0.5),
        ]);
        let f = force.compute(&snap).unwrap();
        assert!(f[0].x < 0.0);
        assert!(f[1].x > 0.0);
        assert_relative_eq!(f[0].x, -f[1].x, max_relative = 1e-2);
        assert_relative_eq!(f[0].y, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_ped_out_of_view_is_down_weighted() {
        let config = ForceConfig::default().with_force(
            "ped_repulsive_force",
            ForceParams::new()
                .with("factor", 1.0)
                .with("v0", 2.1)
                .with("sigma", 0.3)
                .with("fov_factor", 0.25),
        );
        let force = PedRepulsiveForce::from_config(&config).unwrap();
        // agent 0 walks towards agent 1; agent 1 walks away from agent 0
        let snap = snapshot(vec![
            agent((0.0, 0.0), (0.0, 0.0), (10.0, 0.0), 1.0, 0.5),
            agent((1.0, 0.0), (0.0, 0.0), (10.0, 0.0), 1.0, 0.5),
        ]);
        let f = force.compute(&snap).unwrap();
        assert_relative_eq!(f[1].x, -f[0].x * 0.25, max_relative = 1e-2);
    }

    // ==================== SpaceRepulsiveForce ====================

    fn space_config() -> ForceConfig {
        ForceConfig::default().with_force(
            "space_repulsive_force",
            ForceParams::new().with("factor", 2.0).with("u0", 10.0).with("r", 0.2),
        )
    }

    #[test]
    fn test_space_without_space_is_exact_zero() {
        let force = SpaceRepulsiveForce::from_config(&space_config()).unwrap();
        for n in [0, 1, 5] {
            let states = (0..n)
                .map(|i| agent((i as f64, 0.0), (1.0, 0.0), (10.0, 0.0), 1.0, 0.5))
                .collect();
            let f = force.compute(&snapshot(states)).unwrap();
            assert_eq!(f.len(), n);
            assert!(f.iter().all(|v| v.x == 0.0 && v.y == 0.0));
        }
    }

    #[test]
    fn test_space_with_empty_space_is_zero() {
        let force = SpaceRepulsiveForce::from_config(&space_config()).unwrap();
        let snap = SnapshotBuilder::new()
            .build(vec![agent((0.0, 0.0), (0.0, 0.0), (1.0, 0.0), 1.0, 0.5)], None, Some(Vec::new()), None)
            .unwrap();
        assert_eq!(force.compute(&snap).unwrap(), vec![Vector2D::ZERO]);
    }

    #[test]
    fn test_space_pushes_away_from_wall() {
        let force = SpaceRepulsiveForce::from_config(&space_config()).unwrap();
        let wall = Obstacle::new((0..=20).map(|i| Point::new(-1.0 + i as f64 * 0.1, 0.5)).collect());
        let snap = SnapshotBuilder::new()
            .build(vec![agent((0.0, 0.0), (0.0, 0.0), (1.0, 0.0), 1.0, 0.5)], None, Some(vec![wall]), None)
            .unwrap();
        let f = force.compute(&snap).unwrap();
        assert!(f[0].y < 0.0);
        assert_relative_eq!(f[0].x, 0.0, epsilon = 1e-2);

        // analytic magnitude: factor * u0 / r * exp(-d / r)
        let expected = 2.0 * 10.0 / 0.2 * (-0.5_f64 / 0.2).exp();
        assert_relative_eq!(-f[0].y, expected, max_relative = 1e-2);
    }

    #[test]
    fn test_space_requires_parameters() {
        let config = ForceConfig::default().with_force("space_repulsive_force", ForceParams::new().with("factor", 1.0).with("u0", 10.0));
        let err = SpaceRepulsiveForce::from_config(&config).unwrap_err();
        assert!(matches!(err, ForceError::MissingParameter { key: "r", .. }));
    }
}
