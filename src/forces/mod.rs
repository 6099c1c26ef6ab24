//! # Force Terms
//!
//! Every force term implements [`Force`]: given an immutable
//! [`SceneSnapshot`] it returns one force vector per agent. Terms are
//! independent of each other; the net force is the sum of their outputs.
//!
//! ## Terms
//!
//! | kind                  | name                        | parameters                         |
//! |-----------------------|-----------------------------|------------------------------------|
//! | goal attractive       | `goal_attractive_force`     | `factor`                           |
//! | ped repulsive         | `ped_repulsive_force`       | `factor v0 sigma [fov_phi fov_factor]` |
//! | space repulsive       | `space_repulsive_force`     | `factor u0 r`                      |
//! | group coherence       | `group_coherence_force`     | `factor`                           |
//! | group coherence (alt) | `group_coherence_force_alt` | `factor`                           |
//! | group repulsive       | `group_repulsive_force`     | `factor [threshold]`               |
//! | group gaze            | `group_gaze_force`          | `factor [vision_angle]`            |
//!
//! ## Configuration
//!
//! Each term resolves its parameters once, at construction. When the
//! config has a table under the term's name, `factor` is read from that
//! table but `time_step` is always read from the *global* config, even if
//! the table carries its own `time_step`. Without a table the term keeps
//! `factor = 1.0` and `time_step = 0.4`.

mod group;
mod individual;

pub use group::{
    GroupCoherenceForce, GroupCoherenceForceAlt, GroupGazeForce, GroupRepulsiveForce, RepulsionGating,
};
pub use individual::{GoalAttractiveForce, PedRepulsiveForce, SpaceRepulsiveForce};

use crate::config::{ForceConfig, ForceParams, DEFAULT_TIME_STEP};
use crate::error::ForceError;
use crate::snapshot::SceneSnapshot;
use crate::structs::ForceMatrix;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_FACTOR: f64 = 1.0;

/// Converts a CamelCase identifier to snake_case by inserting `_` before
/// every uppercase letter except the first character, then lowercasing.
///
/// Consecutive capitals are split individually: `"FOVForce"` becomes
/// `"f_o_v_force"`.
pub fn camel_to_snake(camel: &str) -> String {
    let mut snake = String::with_capacity(camel.len() + 4);
    for (i, ch) in camel.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            snake.push('_');
        }
        snake.extend(ch.to_lowercase());
    }
    snake
}

/// The closed set of force terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ForceKind {
    GoalAttractive,
    PedRepulsive,
    SpaceRepulsive,
    GroupCoherence,
    GroupCoherenceAlt,
    GroupRepulsive,
    GroupGaze,
}

/// `(kind, type name, stable name)`; stable names are `camel_to_snake(type name)`.
const REGISTRY: [(ForceKind, &str, &str); 7] = [
    (ForceKind::GoalAttractive, "GoalAttractiveForce", "goal_attractive_force"),
    (ForceKind::PedRepulsive, "PedRepulsiveForce", "ped_repulsive_force"),
    (ForceKind::SpaceRepulsive, "SpaceRepulsiveForce", "space_repulsive_force"),
    (ForceKind::GroupCoherence, "GroupCoherenceForce", "group_coherence_force"),
    (ForceKind::GroupCoherenceAlt, "GroupCoherenceForceAlt", "group_coherence_force_alt"),
    (ForceKind::GroupRepulsive, "GroupRepulsiveForce", "group_repulsive_force"),
    (ForceKind::GroupGaze, "GroupGazeForce", "group_gaze_force"),
];

impl ForceKind {
    pub const ALL: [ForceKind; 7] = [
        ForceKind::GoalAttractive,
        ForceKind::PedRepulsive,
        ForceKind::SpaceRepulsive,
        ForceKind::GroupCoherence,
        ForceKind::GroupCoherenceAlt,
        ForceKind::GroupRepulsive,
        ForceKind::GroupGaze,
    ];

    fn entry(self) -> &'static (ForceKind, &'static str, &'static str) {
        &REGISTRY[self as usize]
    }

    pub fn type_name(self) -> &'static str {
        self.entry().1
    }

    /// Stable snake_case name, also the key of the term's config table.
    pub fn name(self) -> &'static str {
        self.entry().2
    }

    pub fn from_name(name: &str) -> Result<Self, ForceError> {
        REGISTRY
            .iter()
            .find(|(_, type_name, stable)| *stable == name || *type_name == name)
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| ForceError::UnknownForce(name.to_string()))
    }
}

impl fmt::Display for ForceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForceKind {
    type Err = ForceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForceKind::from_name(s)
    }
}

/// Settings shared by every force term.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceBase {
    pub kind: ForceKind,
    pub factor: f64,
    pub time_step: f64,
    pub params: ForceParams,
}

impl ForceBase {
    pub fn new(kind: ForceKind) -> Self {
        ForceBase {
            kind,
            factor: DEFAULT_FACTOR,
            time_step: DEFAULT_TIME_STEP,
            params: ForceParams::new(),
        }
    }

    pub fn load(kind: ForceKind, config: &ForceConfig) -> Result<Self, ForceError> {
        let mut base = ForceBase::new(kind);
        base.load_config(config)?;
        Ok(base)
    }

    /// Applies the term's table from `config`. An absent or empty table
    /// leaves the current settings untouched. The global time step must be
    /// finite and positive either way.
    pub fn load_config(&mut self, config: &ForceConfig) -> Result<(), ForceError> {
        let name = self.kind.name();
        if !(config.time_step.is_finite() && config.time_step > 0.0) {
            return Err(ForceError::InvalidParameter {
                force: name,
                key: "time_step",
                value: config.time_step,
            });
        }
        let params = match config.force(name) {
            Some(params) if !params.is_empty() => params,
            _ => {
                debug!(force = name, "no config table, keeping defaults");
                return Ok(());
            }
        };

        self.factor = params.required(name, "factor")?;
        self.time_step = config.time_step;
        self.params = params.clone();
        debug!(force = name, factor = self.factor, time_step = self.time_step, "loaded force config");
        Ok(())
    }

    /// Scales a raw force matrix by this term's factor.
    pub fn scale(&self, mut forces: ForceMatrix) -> ForceMatrix {
        for f in forces.iter_mut() {
            *f = *f * self.factor;
        }
        forces
    }
}

pub trait Force: fmt::Debug + Send + Sync {
    fn base(&self) -> &ForceBase;

    /// Per-agent force for the given snapshot, already scaled by `factor`.
    fn compute(&self, snapshot: &SceneSnapshot) -> Result<ForceMatrix, ForceError>;

    fn kind(&self) -> ForceKind {
        self.base().kind
    }

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn factor(&self) -> f64 {
        self.base().factor
    }

    fn time_step(&self) -> f64 {
        self.base().time_step
    }
}

/// Instantiates the term `kind` with parameters resolved from `config`.
pub fn build_force(kind: ForceKind, config: &ForceConfig) -> Result<Box<dyn Force>, ForceError> {
    let force: Box<dyn Force> = match kind {
        ForceKind::GoalAttractive => Box::new(GoalAttractiveForce::from_config(config)?),
        ForceKind::PedRepulsive => Box::new(PedRepulsiveForce::from_config(config)?),
        ForceKind::SpaceRepulsive => Box::new(SpaceRepulsiveForce::from_config(config)?),
        ForceKind::GroupCoherence => Box::new(GroupCoherenceForce::from_config(config)?),
        ForceKind::GroupCoherenceAlt => Box::new(GroupCoherenceForceAlt::from_config(config)?),
        ForceKind::GroupRepulsive => Box::new(GroupRepulsiveForce::from_config(config)?),
        ForceKind::GroupGaze => Box::new(GroupGazeForce::from_config(config)?),
    };
    Ok(force)
}

pub fn build_forces(config: &ForceConfig, kinds: &[ForceKind]) -> Result<Vec<Box<dyn Force>>, ForceError> {
    kinds.iter().map(|&kind| build_force(kind, config)).collect()
}
