//! Cost and cardinality model.
//!
//! Every estimate on an internal node is a pure function of its kind and its
//! children's estimates. Leaves carry the values they were seeded with.

use super::error::{PlanError, PlanResult};
use super::node::{JoinMethod, NodeKind, PlanNode};

/// Cost per row for a sequential scan.
pub const SEQ_SCAN_PER_ROW: f64 = 1.0;
/// Cost per row for an index scan.
pub const INDEX_SCAN_PER_ROW: f64 = 0.1;
/// Share of scan cost spent on I/O.
pub const IO_SHARE: f64 = 0.8;
/// Share of scan cost spent on CPU.
pub const CPU_SHARE: f64 = 0.2;
pub const MIN_JOIN_SELECTIVITY: f64 = 0.001;
pub const MAX_JOIN_SELECTIVITY: f64 = 0.5;
/// Selectivity of a single conjunct, assumed independent.
pub const CONJUNCT_SELECTIVITY: f64 = 0.3;
/// Cost per input row for filter evaluation.
pub const FILTER_PER_ROW: f64 = 0.1;
/// Cost per row to build the hash table on the left input.
pub const HASH_BUILD_PER_ROW: f64 = 1.2;
/// Cost per row to probe with the right input.
pub const HASH_PROBE_PER_ROW: f64 = 0.1;
/// Sort factor applied to `n log2 n` for merge join.
pub const MERGE_SORT_FACTOR: f64 = 0.05;
pub const MERGE_PER_ROW: f64 = 0.1;
/// Factor applied to a scan converted to an index scan.
pub const INDEX_DISCOUNT: f64 = 0.2;
/// Inputs below this many rows on both sides favor nested loops.
pub const NESTED_LOOP_THRESHOLD: u64 = 1000;

/// Cost and cardinality of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub cost: f64,
    pub cardinality: u64,
}

/// Cost of scanning `rows` rows, split into rounded I/O and CPU shares.
pub fn scan_cost(rows: u64, indexed: bool) -> f64 {
    let per_row = if indexed { INDEX_SCAN_PER_ROW } else { SEQ_SCAN_PER_ROW };
    let base = rows as f64 * per_row;
    (base * IO_SHARE).ceil() + (base * CPU_SHARE).ceil()
}

/// Fraction of the cross product surviving a join.
pub fn join_selectivity(left: u64, right: u64) -> f64 {
    let (min, max) = (left.min(right) as f64, left.max(right) as f64);
    if max == 0.0 {
        return MAX_JOIN_SELECTIVITY;
    }
    let base = 1.0 / max.sqrt();
    let scaled = base * (0.1 + 0.9 * (min / max));
    scaled.clamp(MIN_JOIN_SELECTIVITY, MAX_JOIN_SELECTIVITY)
}

/// Fraction of rows surviving `conjuncts` independent predicates.
pub fn filter_selectivity(conjuncts: usize) -> f64 {
    CONJUNCT_SELECTIVITY.powi(conjuncts as i32)
}

pub fn join_cardinality(left: u64, right: u64) -> u64 {
    (left as f64 * right as f64 * join_selectivity(left, right)).ceil() as u64
}

/// Cost of joining two costed inputs with `method`.
pub fn join_cost(method: JoinMethod, left: &PlanNode, right: &PlanNode) -> f64 {
    let (lc, rc) = (left.cost, right.cost);
    let (lcard, rcard) = (left.cardinality as f64, right.cardinality as f64);
    match method {
        JoinMethod::NestedLoop => lc + lcard * rc,
        JoinMethod::Hash => lc + rc + lcard * HASH_BUILD_PER_ROW + rcard * HASH_PROBE_PER_ROW,
        JoinMethod::Merge => {
            let n = lcard + rcard;
            let sort = if n > 0.0 { n * n.log2() * MERGE_SORT_FACTOR } else { 0.0 };
            lc + rc + sort + n * MERGE_PER_ROW
        }
    }
}

/// Scan cost after switching to an index.
pub fn index_discount(cost: f64) -> f64 {
    (cost * INDEX_DISCOUNT).ceil()
}

/// Estimate for `node` from its children, or `None` for a leaf.
///
/// Fails when the child count does not match the node's kind.
pub fn derive(node: &PlanNode) -> PlanResult<Option<Estimate>> {
    if node.children.len() != node.kind.arity() {
        return Err(PlanError::arity(node));
    }
    let estimate = match (&node.kind, node.children.as_slice()) {
        (NodeKind::TableScan { .. } | NodeKind::IndexScan { .. }, _) => return Ok(None),
        (NodeKind::Filter { predicates }, [child]) => Estimate {
            cost: child.cost + (child.cardinality as f64 * FILTER_PER_ROW).ceil(),
            cardinality: (child.cardinality as f64 * filter_selectivity(predicates.len())).ceil()
                as u64,
        },
        (NodeKind::Join { method }, [left, right]) => Estimate {
            cost: join_cost(*method, left, right),
            cardinality: join_cardinality(left.cardinality, right.cardinality),
        },
        (_, children @ [first, ..]) => Estimate {
            cost: children.iter().map(|c| c.cost).sum::<f64>().ceil(),
            cardinality: first.cardinality,
        },
        _ => return Err(PlanError::arity(node)),
    };
    Ok(Some(estimate))
}

/// Recompute `node` from its (already current) children.
pub fn refresh(mut node: PlanNode) -> PlanResult<PlanNode> {
    if let Some(estimate) = derive(&node)? {
        node.cost = estimate.cost;
        node.cardinality = estimate.cardinality;
    }
    Ok(node)
}

/// Recompute every node, children first.
pub fn recompute(mut node: PlanNode) -> PlanResult<PlanNode> {
    node.children = node
        .children
        .into_iter()
        .map(recompute)
        .collect::<PlanResult<Vec<_>>>()?;
    refresh(node)
}

/// Check that every node agrees with the model.
pub fn verify(node: &PlanNode) -> PlanResult<()> {
    for child in &node.children {
        verify(child)?;
    }
    if let Some(expected) = derive(node)? {
        if expected.cost != node.cost || expected.cardinality != node.cardinality {
            return Err(PlanError::Inconsistent {
                id: node.id.get(),
                cost: node.cost,
                rows: node.cardinality,
                expected_cost: expected.cost,
                expected_rows: expected.cardinality,
            });
        }
    }
    Ok(())
}
