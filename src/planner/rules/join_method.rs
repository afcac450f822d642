//! Pick a physical algorithm for every join.

use super::{RewriteContext, RewriteRule, RuleId};
use crate::planner::cost::{self, NESTED_LOOP_THRESHOLD};
use crate::planner::error::PlanResult;
use crate::planner::node::{self, JoinMethod, NodeKind, PlanNode};

/// Chooses nested loops for small inputs, merge join for sorted inputs and
/// hash join otherwise. Runs bottom-up so each choice sees final child
/// estimates.
pub struct JoinMethodSelection;

impl RewriteRule for JoinMethodSelection {
    fn id(&self) -> RuleId {
        RuleId::JoinMethodSelection
    }

    fn rewrite(&self, node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
        choose(node, ctx)
    }
}

fn choose(mut node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
    node.children = std::mem::take(&mut node.children)
        .into_iter()
        .map(|child| choose(child, ctx))
        .collect::<PlanResult<_>>()?;

    if let [left, right] = node.children.as_slice() {
        if node.is_join() {
            let method = method_for(left, right);
            node.description = node::join_description(method, left, right);
            node.kind = NodeKind::Join { method };
        }
    }
    cost::refresh(node)
}

/// Method for joining `left` and `right`.
pub fn method_for(left: &PlanNode, right: &PlanNode) -> JoinMethod {
    if left.cardinality < NESTED_LOOP_THRESHOLD && right.cardinality < NESTED_LOOP_THRESHOLD {
        JoinMethod::NestedLoop
    } else if left.is_sorted() && right.is_sorted() {
        JoinMethod::Merge
    } else {
        JoinMethod::Hash
    }
}
