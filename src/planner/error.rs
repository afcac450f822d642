//! Planning errors.

use thiserror::Error;

use super::node::PlanNode;

/// Result type for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Query planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{kind} node {id} has {found} children, expected {expected}")]
    Arity {
        id: u64,
        kind: String,
        expected: usize,
        found: usize,
    },

    #[error("node {id} is stale: stored cost {cost} / rows {rows}, model gives {expected_cost} / {expected_rows}")]
    Inconsistent {
        id: u64,
        cost: f64,
        rows: u64,
        expected_cost: f64,
        expected_rows: u64,
    },

    #[error("unknown optimization rule: {0}")]
    UnknownRule(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PlanError {
    /// Arity violation for `node`.
    pub(crate) fn arity(node: &PlanNode) -> Self {
        PlanError::Arity {
            id: node.id.get(),
            kind: node.kind.name().to_string(),
            expected: node.kind.arity(),
            found: node.children.len(),
        }
    }
}
