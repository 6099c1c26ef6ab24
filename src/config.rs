//! Configuration types for the force terms.
//!
//! A [`ForceConfig`] is a global `time_step` plus one numeric table per force,
//! keyed by the force's stable name:
//!
//! ```json
//! {
//!   "time_step": 0.4,
//!   "ped_repulsive_force": { "factor": 1.5, "v0": 2.1, "sigma": 0.3 }
//! }
//! ```

use crate::error::ForceError;
use crate::forces::ForceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_TIME_STEP: f64 = 0.4;

fn default_time_step() -> f64 {
    DEFAULT_TIME_STEP
}

/// Numeric parameters of a single force term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForceParams(HashMap<String, f64>);

impl ForceParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Looks up `key`, failing if it is absent or not a finite number.
    pub fn required(&self, force: &'static str, key: &'static str) -> Result<f64, ForceError> {
        match self.get(key) {
            Some(value) if value.is_finite() => Ok(value),
            Some(value) => Err(ForceError::InvalidParameter { force, key, value }),
            None => Err(ForceError::MissingParameter { force, key }),
        }
    }

    /// Looks up `key`, falling back to `default` when absent.
    pub fn optional(&self, force: &'static str, key: &'static str, default: f64) -> Result<f64, ForceError> {
        match self.get(key) {
            Some(value) if value.is_finite() => Ok(value),
            Some(value) => Err(ForceError::InvalidParameter { force, key, value }),
            None => Ok(default),
        }
    }
}

impl FromIterator<(String, f64)> for ForceParams {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        ForceParams(iter.into_iter().collect())
    }
}

/// Whether a config section belongs to a force term, by either spelling
/// of the term's name.
pub fn is_force_section(key: &str) -> bool {
    ForceKind::from_name(key).is_ok()
}

/// Global force configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceConfig {
    /// Shared simulation time step, used by every force term.
    #[serde(default = "default_time_step")]
    pub time_step: f64,

    /// Per-force parameter tables keyed by force name.
    #[serde(flatten)]
    pub forces: HashMap<String, ForceParams>,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            forces: HashMap::new(),
        }
    }
}

impl ForceConfig {
    /// Parses a JSON object of config sections. A section named after a
    /// force term must be a numeric table. Other sections that are not
    /// numeric tables, such as scene settings, are skipped.
    pub fn from_json_str(json: &str) -> Result<Self, ForceError> {
        let sections: serde_json::Map<String, Value> = serde_json::from_str(json)?;
        let mut config = ForceConfig::default();
        for (key, value) in sections {
            if key == "time_step" {
                config.time_step = serde_json::from_value(value)?;
                continue;
            }
            match serde_json::from_value::<ForceParams>(value) {
                Ok(params) => {
                    config.forces.insert(key, params);
                }
                Err(err) if is_force_section(&key) => return Err(err.into()),
                Err(_) => debug!(section = %key, "skipping non-numeric config section"),
            }
        }
        Ok(config)
    }

    pub fn with_force(mut self, name: &str, params: ForceParams) -> Self {
        self.forces.insert(name.to_string(), params);
        self
    }

    pub fn force(&self, name: &str) -> Option<&ForceParams> {
        self.forces.get(name)
    }

    /// Stock parameters for pedestrian crowds.
    pub fn standard() -> Self {
        ForceConfig::default()
            .with_force("goal_attractive_force", ForceParams::new().with("factor", 1.0))
            .with_force(
                "ped_repulsive_force",
                ForceParams::new()
                    .with("factor", 1.5)
                    .with("v0", 2.1)
                    .with("sigma", 0.3)
                    .with("fov_phi", 100.0)
                    .with("fov_factor", 0.5),
            )
            .with_force(
                "space_repulsive_force",
                ForceParams::new().with("factor", 1.0).with("u0", 10.0).with("r", 0.2),
            )
            .with_force("group_coherence_force", ForceParams::new().with("factor", 3.0))
            .with_force(
                "group_repulsive_force",
                ForceParams::new().with("factor", 1.0).with("threshold", 0.55),
            )
            .with_force(
                "group_gaze_force",
                ForceParams::new().with("factor", 4.0).with("vision_angle", 90.0),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_reads_time_step_and_tables() {
        let config = ForceConfig::from_json_str(
            r#"{
                "time_step": 0.25,
                "ped_repulsive_force": { "factor": 1.5, "v0": 2.1, "sigma": 0.3 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.time_step, 0.25);
        let ped = config.force("ped_repulsive_force").unwrap();
        assert_eq!(ped.get("v0"), Some(2.1));
        assert_eq!(ped.get("sigma"), Some(0.3));
        assert!(config.force("group_gaze_force").is_none());
    }

    #[test]
    fn test_from_json_defaults_time_step() {
        let config = ForceConfig::from_json_str(r#"{ "goal_attractive_force": { "factor": 2.0 } }"#).unwrap();
        assert_eq!(config.time_step, DEFAULT_TIME_STEP);
    }

    #[test]
    fn test_from_json_rejects_non_numeric_parameter() {
        let err = ForceConfig::from_json_str(r#"{ "goal_attractive_force": { "factor": "big" } }"#).unwrap_err();
        assert!(matches!(err, ForceError::Config(_)));
    }

    #[test]
    fn test_from_json_skips_scene_sections() {
        let config = ForceConfig::from_json_str(
            r#"{
                "scene": { "enable_group": true, "agent_radius": 0.35, "resolution": 10 },
                "labels": "corridor",
                "goal_attractive_force": { "factor": 2.0 }
            }"#,
        )
        .unwrap();
        assert!(config.force("scene").is_none());
        assert!(config.force("labels").is_none());
        assert_eq!(config.force("goal_attractive_force").unwrap().get("factor"), Some(2.0));
    }

    #[test]
    fn test_from_json_rejects_non_numeric_time_step() {
        let err = ForceConfig::from_json_str(r#"{ "time_step": "fast" }"#).unwrap_err();
        assert!(matches!(err, ForceError::Config(_)));
    }

    #[test]
    fn test_force_sections_by_either_spelling() {
        assert!(is_force_section("group_gaze_force"));
        assert!(is_force_section("GroupGazeForce"));
        assert!(!is_force_section("scene"));
    }

    #[test]
    fn test_required_parameter_missing() {
        let params = ForceParams::new().with("v0", 2.1);
        let err = params.required("ped_repulsive_force", "sigma").unwrap_err();
        assert!(matches!(
            err,
            ForceError::MissingParameter { force: "ped_repulsive_force", key: "sigma" }
        ));
    }

    #[test]
    fn test_required_parameter_rejects_nan() {
        let params = ForceParams::new().with("u0", f64::NAN);
        let err = params.required("space_repulsive_force", "u0").unwrap_err();
        assert!(matches!(err, ForceError::InvalidParameter { key: "u0", .. }));
    }

    #[test]
    fn test_optional_parameter_default() {
        let params = ForceParams::new();
        assert_eq!(params.optional("group_repulsive_force", "threshold", 0.5).unwrap(), 0.5);
        let params = params.with("threshold", 0.8);
        assert_eq!(params.optional("group_repulsive_force", "threshold", 0.5).unwrap(), 0.8);
    }

    #[test]
    fn test_standard_config_covers_every_force() {
        let config = ForceConfig::standard();
        for name in [
            "goal_attractive_force",
            "ped_repulsive_force",
            "space_repulsive_force",
            "group_coherence_force",
            "group_repulsive_force",
            "group_gaze_force",
        ] {
            assert!(config.force(name).is_some(), "missing table for {name}");
        }
    }
}
