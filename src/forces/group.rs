//! Force terms between members of the same social group.
//!
//! All group terms return the zero matrix when the snapshot has no groups.
//! Group membership is expected to be disjoint; agents listed in several
//! groups accumulate the contributions of each.

use super::{Force, ForceBase, ForceKind};
use crate::config::ForceConfig;
use crate::error::ForceError;
use crate::snapshot::SceneSnapshot;
use crate::stateutils;
use crate::structs::{ForceMatrix, Vector2D};
use tracing::trace;

/// Distance from the group centre beyond which members are pulled back in.
fn coherence_threshold(group_size: usize) -> f64 {
    (group_size as f64 - 1.0) / 2.0
}

/// Displacement from each member to the group centre, in group order.
fn displacements_to_center(snapshot: &SceneSnapshot, group: &[usize]) -> Vec<Vector2D> {
    let positions = snapshot.member_positions(group);
    let center = stateutils::group_center(&positions);
    positions.iter().map(|p| center - *p).collect()
}

/// Unit pull towards the group centre for members farther than
/// `(size - 1) / 2` from it. Members closer than that feel nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCoherenceForce {
    base: ForceBase,
}

impl GroupCoherenceForce {
    pub const KIND: ForceKind = ForceKind::GroupCoherence;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        Ok(GroupCoherenceForce {
            base: ForceBase::load(Self::KIND, config)?,
        })
    }
}

impl Force for GroupCoherenceForce {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        let mut forces = snapshot.zeros();
        let Some(groups) = snapshot.groups() else {
            return Ok(forces);
        };

        for group in groups.iter().filter(|g| !g.is_empty()) {
            let threshold = coherence_threshold(group.len());
            let (units, norms) = stateutils::normalize(&displacements_to_center(snapshot, group));
            for ((&i, unit), norm) in group.iter().zip(units).zip(norms) {
                if norm >= threshold {
                    forces[i] += unit;
                }
            }
        }
        Ok(self.base.scale(forces))
    }
}

/// Smooth version of [`GroupCoherenceForce`]: the raw displacement to the
/// centre, gated by `(tanh(|d| - threshold) + 1) / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCoherenceForceAlt {
    base: ForceBase,
}

impl GroupCoherenceForceAlt {
    pub const KIND: ForceKind = ForceKind::GroupCoherenceAlt;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        Ok(GroupCoherenceForceAlt {
            base: ForceBase::load(Self::KIND, config)?,
        })
    }

    pub fn softened_factor(norm: f64, threshold: f64) -> f64 {
        ((norm - threshold).tanh() + 1.0) / 2.0
    }
}

impl Force for GroupCoherenceForceAlt {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        let mut forces = snapshot.zeros();
        let Some(groups) = snapshot.groups() else {
            return Ok(forces);
        };

        for group in groups.iter().filter(|g| !g.is_empty()) {
            let threshold = coherence_threshold(group.len());
            for (&i, d) in group.iter().zip(displacements_to_center(snapshot, group)) {
                forces[i] += d * Self::softened_factor(d.magnitude(), threshold);
            }
        }
        Ok(self.base.scale(forces))
    }
}

/// How [`GroupRepulsiveForce`] treats pairs farther apart than its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepulsionGating {
    /// Every pairwise displacement is accumulated; the threshold has no
    /// effect. Reproduces the historical output of this term.
    #[default]
    Compatible,
    /// Only displacements with norm at most the threshold are accumulated.
    WithinThreshold,
}

/// Pairwise term between group members. Member `b` accumulates
/// `r_a - r_b` over every member `a` of its group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRepulsiveForce {
    base: ForceBase,
    threshold: f64,
    gating: RepulsionGating,
}

impl GroupRepulsiveForce {
    pub const KIND: ForceKind = ForceKind::GroupRepulsive;
    pub const DEFAULT_THRESHOLD: f64 = 0.5;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        let base = ForceBase::load(Self::KIND, config)?;
        let threshold = base
            .params
            .optional(Self::KIND.name(), "threshold", Self::DEFAULT_THRESHOLD)?;
        Ok(GroupRepulsiveForce {
            base,
            threshold,
            gating: RepulsionGating::default(),
        })
    }

    pub fn with_gating(mut self, gating: RepulsionGating) -> Self {
        self.gating = gating;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn gating(&self) -> RepulsionGating {
        self.gating
    }
}

impl Force for GroupRepulsiveForce {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        let mut forces = snapshot.zeros();
        let Some(groups) = snapshot.groups() else {
            return Ok(forces);
        };

        for group in groups {
            let diff = stateutils::vec_diff(&snapshot.member_positions(group));
            for row in &diff {
                for (&b, d) in group.iter().zip(row) {
                    let keep = match self.gating {
                        RepulsionGating::Compatible => true,
                        RepulsionGating::WithinThreshold => d.magnitude() <= self.threshold,
                    };
                    if keep {
                        forces[b] += *d;
                    }
                }
            }
        }
        Ok(self.base.scale(forces))
    }
}

/// Turns members away from their walking direction when the rest of the
/// group falls outside their vision angle.
///
/// For member `i` the angle between its desired direction `e_i` and the
/// direction to the centre of the *other* members is compared with
/// `vision_angle`; the excess, in radians, yields `F_i = -excess * e_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupGazeForce {
    base: ForceBase,
    vision_angle: f64,
}

impl GroupGazeForce {
    pub const KIND: ForceKind = ForceKind::GroupGaze;
    pub const DEFAULT_VISION_ANGLE: f64 = 100.0;

    pub fn from_config(config: &ForceConfig) -> Result<Self, ForceError> {
        let base = ForceBase::load(Self::KIND, config)?;
        let name = Self::KIND.name();
        let legacy = base.params.optional(name, "fov_phi", Self::DEFAULT_VISION_ANGLE)?;
        let vision_angle = base.params.optional(name, "vision_angle", legacy)?;
        Ok(GroupGazeForce { base, vision_angle })
    }

    /// Vision half-angle in degrees.
    pub fn vision_angle(&self) -> f64 {
        self.vision_angle
    }

    /// Angle in degrees between two unit vectors.
    pub fn angle_between(a: &Vector2D, b: &Vector2D) -> f64 {
        a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

impl Force for GroupGazeForce {
    fn base(&self) -> &ForceBase {
        &self.base
    }

    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError> {
        let mut forces = snapshot.zeros();
        let Some(groups) = snapshot.groups() else {
            return Ok(forces);
        };
        let directions = snapshot.desired_directions();

        for group in groups.iter().filter(|g| g.len() > 1) {
            let positions = snapshot.member_positions(group);
            for (k, &i) in group.iter().enumerate() {
                let others: Vec<_> = positions
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != k)
                    .map(|(_, p)| *p)
                    .collect();
                let to_center = (stateutils::group_center(&others) - positions[k]).normalize();
                // standing on the partners' centre gives no direction to look at
                if to_center.is_zero() {
                    trace!(agent = i, "group gaze: on partners' centre");
                    continue;
                }
                let angle = Self::angle_between(&directions[i], &to_center);
                let excess = if angle > self.vision_angle {
                    (angle - self.vision_angle).to_radians()
                } else {
                    0.0
                };
                trace!(agent = i, angle, excess, "group gaze");
                forces[i] += -(directions[i] * excess);
            }
        }
        Ok(self.base.scale(forces))
    }
}
