//! Python bindings, enabled with the `python` feature.
//!
//! ```python
//! import social_force as sf
//!
//! forces = sf.Forces({"time_step": 0.4, "goal_attractive_force": {"factor": 1.0}})
//! forces.set_state([[0, 0, 0, 0, 10, 0, 0.5]], initial_speeds=[1.0])
//! forces.get_force("goal_attractive_force")   # [(2.0, 0.0)]
//! ```

use crate::config::{is_force_section, ForceConfig, ForceParams};
use crate::error::ForceError;
use crate::evaluator::ForceEvaluator;
use crate::forces::{camel_to_snake, ForceKind, RepulsionGating};
use crate::snapshot::states_from_rows;
use crate::structs::{AgentState, ForceMatrix, Obstacle, Point, Vector2D};
use pyo3::exceptions::{PyIndexError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashMap;
use tracing::debug;

impl From<ForceError> for PyErr {
    fn from(err: ForceError) -> PyErr {
        match err {
            ForceError::GroupIndexOutOfBounds { .. } => PyIndexError::new_err(err.to_string()),
            ForceError::StateNotSet => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

#[pymethods]
impl Point {
    #[new]
    fn py_new(x: f64, y: f64) -> Self {
        Point::new(x, y)
    }

    #[pyo3(name = "distance")]
    fn py_distance(&self, other: &Point) -> f64 {
        self.distance(other)
    }

    fn __repr__(&self) -> String {
        format!("Point({:.2}, {:.2})", self.x, self.y)
    }
}

#[pymethods]
impl Vector2D {
    #[new]
    fn py_new(x: f64, y: f64) -> Self {
        Vector2D::new(x, y)
    }

    #[pyo3(name = "magnitude")]
    fn py_magnitude(&self) -> f64 {
        self.magnitude()
    }

    #[pyo3(name = "normalize")]
    fn py_normalize(&self) -> Vector2D {
        self.normalize()
    }

    fn __repr__(&self) -> String {
        format!("Vector2D({:.2}, {:.2})", self.x, self.y)
    }
}

#[pymethods]
impl AgentState {
    #[new]
    fn py_new(position: Point, velocity: Vector2D, goal: Point, desired_speed: f64, tau: f64) -> Self {
        AgentState::new(position, velocity, goal, desired_speed, tau)
    }

    #[staticmethod]
    #[pyo3(name = "from_row")]
    fn py_from_row(row: Vec<f64>) -> PyResult<Self> {
        Ok(AgentState::from_row(&row)?)
    }

    fn __repr__(&self) -> String {
        format!(
            "AgentState(pos=({:.2}, {:.2}), vel=({:.2}, {:.2}), goal=({:.2}, {:.2}), tau={:.2})",
            self.position.x, self.position.y, self.velocity.x, self.velocity.y, self.goal.x, self.goal.y, self.tau
        )
    }
}

/// Converts a Python config dict with the same section rules as
/// [`ForceConfig::from_json_str`].
fn config_from_dict(dict: &Bound<'_, PyDict>) -> PyResult<ForceConfig> {
    let mut config = ForceConfig::default();
    for (key, value) in dict.iter() {
        let key: String = key.extract()?;
        if key == "time_step" {
            config.time_step = value.extract()?;
            continue;
        }
        match value.extract::<HashMap<String, f64>>() {
            Ok(table) => config = config.with_force(&key, table.into_iter().collect::<ForceParams>()),
            Err(err) if is_force_section(&key) => return Err(err),
            Err(_) => debug!(section = %key, "skipping non-numeric config section"),
        }
    }
    Ok(config)
}

fn to_tuples(forces: ForceMatrix) -> Vec<(f64, f64)> {
    forces.into_iter().map(|f| (f.x, f.y)).collect()
}

/// Stateful force evaluator exposed to Python.
#[pyclass(name = "Forces")]
pub struct PyForces {
    evaluator: ForceEvaluator,
}

#[pymethods]
impl PyForces {
    /// Without `names`, every force with a table in `config` is active.
    /// Without `config`, the standard pedestrian parameters are used.
    #[new]
    #[pyo3(signature = (config=None, names=None))]
    fn new(config: Option<&Bound<'_, PyDict>>, names: Option<Vec<String>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => config_from_dict(dict)?,
            None => ForceConfig::standard(),
        };
        let evaluator = match names {
            Some(names) => {
                let kinds = names
                    .iter()
                    .map(|name| ForceKind::from_name(name))
                    .collect::<Result<Vec<_>, _>>()?;
                ForceEvaluator::new(&config, &kinds)?
            }
            None => ForceEvaluator::from_config(&config)?,
        };
        Ok(PyForces { evaluator })
    }

    #[getter]
    fn names(&self) -> Vec<&'static str> {
        self.evaluator.names()
    }

    fn load_config(&mut self, config: &Bound<'_, PyDict>) -> PyResult<()> {
        let config = config_from_dict(config)?;
        Ok(self.evaluator.load_config(&config)?)
    }

    /// Restricts group repulsion to members within its threshold.
    fn set_group_repulsion_gated(&mut self, gated: bool) -> PyResult<()> {
        let gating = if gated {
            RepulsionGating::WithinThreshold
        } else {
            RepulsionGating::Compatible
        };
        Ok(self.evaluator.set_repulsion_gating(gating)?)
    }

    /// `state` rows are `[x, y, vx, vy, gx, gy, tau]` or
    /// `[x, y, vx, vy, gx, gy, desired_speed, tau]`; `space` is a list of
    /// obstacles, each a list of `(x, y)` boundary points.
    #[pyo3(signature = (state, groups=None, space=None, initial_speeds=None))]
    fn set_state(
        &mut self,
        state: Vec<Vec<f64>>,
        groups: Option<Vec<Vec<usize>>>,
        space: Option<Vec<Vec<(f64, f64)>>>,
        initial_speeds: Option<Vec<f64>>,
    ) -> PyResult<()> {
        let states = states_from_rows(&state)?;
        let space = space.map(|obstacles| {
            obstacles
                .into_iter()
                .map(|points| Obstacle::new(points.into_iter().map(|(x, y)| Point::new(x, y)).collect()))
                .collect()
        });
        Ok(self.evaluator.set_state(states, groups, space, initial_speeds)?)
    }

    fn get_force(&self, name: &str) -> PyResult<Vec<(f64, f64)>> {
        let kind = ForceKind::from_name(name)?;
        Ok(to_tuples(self.evaluator.get_force(kind)?))
    }

    fn get_forces(&self) -> PyResult<HashMap<&'static str, Vec<(f64, f64)>>> {
        Ok(self
            .evaluator
            .get_forces()?
            .into_iter()
            .map(|(name, forces)| (name, to_tuples(forces)))
            .collect())
    }

    fn net_force(&self) -> PyResult<Vec<(f64, f64)>> {
        Ok(to_tuples(self.evaluator.net_force()?))
    }
}

#[pyfunction]
fn force_names() -> Vec<&'static str> {
    ForceKind::ALL.iter().map(|kind| kind.name()).collect()
}

#[pyfunction]
#[pyo3(name = "camel_to_snake")]
fn py_camel_to_snake(name: &str) -> String {
    camel_to_snake(name)
}

#[pymodule]
fn social_force(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data structures
    m.add_class::<Point>()?;
    m.add_class::<Vector2D>()?;
    m.add_class::<AgentState>()?;

    // Force evaluation
    m.add_class::<PyForces>()?;

    // Utility functions
    m.add_function(wrap_pyfunction!(force_names, m)?)?;
    m.add_function(wrap_pyfunction!(py_camel_to_snake, m)?)?;

    Ok(())
}
