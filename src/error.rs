//! Errors raised while configuring or evaluating force terms.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForceError {
    /// A required numeric parameter is absent from the force's config table.
    #[error("force `{force}` is missing required parameter `{key}`")]
    MissingParameter { force: &'static str, key: &'static str },

    #[error("force `{force}` parameter `{key}` has invalid value {value}")]
    InvalidParameter {
        force: &'static str,
        key: &'static str,
        value: f64,
    },

    /// A group refers to an agent row that does not exist.
    #[error("group {group} references agent {index}, but only {agents} agents exist")]
    GroupIndexOutOfBounds {
        group: usize,
        index: usize,
        agents: usize,
    },

    /// Forces were requested before any state was supplied.
    #[error("no state has been set; call set_state before evaluating forces")]
    StateNotSet,

    #[error("state row has {columns} columns; relaxation time tau is missing")]
    MissingRelaxationTime { columns: usize },

    #[error("agent {agent} has invalid relaxation time {tau}")]
    InvalidRelaxationTime { agent: usize, tau: f64 },

    #[error("{what}: expected {expected} entries, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown force `{0}`")]
    UnknownForce(String),

    #[error("malformed force config: {0}")]
    Config(#[from] serde_json::Error),
}
