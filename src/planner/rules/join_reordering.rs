//! Rebuild left-deep join chains as balanced hash-join trees.

use super::{RewriteContext, RewriteRule, RuleId};
use crate::planner::cost;
use crate::planner::error::{PlanError, PlanResult};
use crate::planner::node::{JoinMethod, PlanNode};

/// Flattens a left-deep join chain, orders its inputs by ascending
/// cardinality and joins them back as a balanced tree.
pub struct JoinReordering;

impl RewriteRule for JoinReordering {
    fn id(&self) -> RuleId {
        RuleId::JoinReordering
    }

    fn rewrite(&self, node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
        reorder(node, ctx)
    }
}

fn reorder(mut node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
    node.children = std::mem::take(&mut node.children)
        .into_iter()
        .map(|child| reorder(child, ctx))
        .collect::<PlanResult<_>>()?;

    if !is_left_deep(&node) {
        return cost::refresh(node);
    }

    let mut inputs = Vec::new();
    flatten(node, &mut inputs);
    inputs.sort_by_key(|n| n.cardinality);
    log::trace!(
        "reordering join inputs: {:?}",
        inputs.iter().map(|n| n.scan_table().unwrap_or("?")).collect::<Vec<_>>()
    );
    balanced(inputs, ctx)
}

/// A join whose left input is a join and whose right input is not.
fn is_left_deep(node: &PlanNode) -> bool {
    match node.children.as_slice() {
        [left, right] => node.is_join() && left.is_join() && !right.is_join(),
        _ => false,
    }
}

/// Collect the non-join inputs of a join tree, left to right.
fn flatten(node: PlanNode, out: &mut Vec<PlanNode>) {
    if node.is_join() {
        for child in node.children {
            flatten(child, out);
        }
    } else {
        out.push(node);
    }
}

/// Join `inputs` pairwise by recursive midpoint split.
fn balanced(mut inputs: Vec<PlanNode>, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
    if inputs.len() <= 1 {
        return inputs
            .pop()
            .ok_or_else(|| PlanError::Internal("join tree without inputs".into()));
    }
    let right = inputs.split_off(inputs.len() / 2);
    let left = balanced(inputs, ctx)?;
    let right = balanced(right, ctx)?;
    cost::refresh(PlanNode::join(ctx.next_id(), JoinMethod::Hash, left, right))
}
