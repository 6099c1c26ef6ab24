//! # Social Force
//!
//! The force kernel of a social-force pedestrian simulation, with optional
//! Python bindings.
//!
//! For every simulation tick the kernel computes one force vector per agent
//! as the sum of independent force terms:
//!
//! - **Goal attraction**: relaxation towards the desired velocity.
//! - **Pedestrian repulsion**: elliptical pairwise potential, weighted by
//!   field of view.
//! - **Obstacle repulsion**: exponential potential to the closest point of
//!   every obstacle.
//! - **Group terms**: coherence (hard and smooth), intra-group repulsion
//!   and gaze alignment.
//!
//! ## Usage
//!
//! ```
//! use social_force::{AgentState, ForceConfig, ForceEvaluator, ForceKind, Point, Vector2D};
//!
//! let mut forces = ForceEvaluator::new(&ForceConfig::default(), &[ForceKind::GoalAttractive]).unwrap();
//! let agent = AgentState::new(Point::new(0.0, 0.0), Vector2D::ZERO, Point::new(10.0, 0.0), 1.0, 0.5);
//! forces.set_state(vec![agent], None, None, None).unwrap();
//! assert_eq!(forces.net_force().unwrap()[0], Vector2D::new(2.0, 0.0));
//! ```
//!
//! Integrating the forces over time, building scenes and parsing config
//! files are left to the caller.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod fieldofview;
pub mod forces;
pub mod potentials;
pub mod snapshot;
pub mod stateutils;
pub mod structs;

#[cfg(feature = "python")]
mod python;

pub use config::{ForceConfig, ForceParams};
pub use error::ForceError;
pub use evaluator::ForceEvaluator;
pub use forces::{
    build_force, build_forces, camel_to_snake, Force, ForceBase, ForceKind, GoalAttractiveForce,
    GroupCoherenceForce, GroupCoherenceForceAlt, GroupGazeForce, GroupRepulsiveForce, PedRepulsiveForce,
    RepulsionGating, SpaceRepulsiveForce,
};
pub use snapshot::{SceneSnapshot, SnapshotBuilder};
pub use structs::{AgentState, ForceMatrix, Group, Obstacle, Point, Space, Vector2D};
