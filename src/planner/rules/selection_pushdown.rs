//! Push filter conjuncts below joins.

use super::{RewriteContext, RewriteRule, RuleId};
use crate::planner::cost;
use crate::planner::error::PlanResult;
use crate::planner::node::{NodeId, NodeKind, PlanNode};
use crate::sql::Predicate;

/// Moves each conjunct of a filter sitting on a join to the join side whose
/// table it names. Conjuncts naming both sides, or neither, stay put.
pub struct SelectionPushdown;

impl RewriteRule for SelectionPushdown {
    fn id(&self) -> RuleId {
        RuleId::SelectionPushdown
    }

    fn rewrite(&self, node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
        push(node, ctx)
    }
}

fn push(node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
    let mut node = push_through_join(node, ctx);
    node.children = std::mem::take(&mut node.children)
        .into_iter()
        .map(|child| push(child, ctx))
        .collect::<PlanResult<_>>()?;
    cost::refresh(node)
}

fn push_through_join(node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanNode {
    let PlanNode {
        id,
        kind,
        description,
        cost,
        cardinality,
        mut children,
    } = node;

    match (kind, children.pop()) {
        (NodeKind::Filter { predicates }, Some(join))
            if children.is_empty() && join.is_join() && join.children.len() == 2 =>
        {
            split(id, predicates, join, ctx)
        }
        (kind, child) => {
            children.extend(child);
            PlanNode {
                id,
                kind,
                description,
                cost,
                cardinality,
                children,
            }
        }
    }
}

fn split(
    id: NodeId,
    predicates: Vec<Predicate>,
    join: PlanNode,
    ctx: &mut RewriteContext<'_>,
) -> PlanNode {
    let left_table = join.children[0].scan_table().map(str::to_owned);
    let right_table = join.children[1].scan_table().map(str::to_owned);
    let names = |p: &Predicate, table: &Option<String>| table.as_deref().is_some_and(|t| p.mentions(t));

    let mut to_left = Vec::new();
    let mut to_right = Vec::new();
    let mut residual = Vec::new();
    for predicate in predicates {
        match (names(&predicate, &left_table), names(&predicate, &right_table)) {
            (true, false) => to_left.push(predicate),
            (false, true) => to_right.push(predicate),
            _ => residual.push(predicate),
        }
    }

    let PlanNode {
        id: join_id,
        kind,
        mut children,
        ..
    } = join;
    let mut right = children.pop();
    let mut left = children.pop();
    if !to_left.is_empty() {
        left = left.map(|l| PlanNode::filter(ctx.next_id(), l, to_left));
    }
    if !to_right.is_empty() {
        right = right.map(|r| PlanNode::filter(ctx.next_id(), r, to_right));
    }

    let join = match (kind, left, right) {
        (NodeKind::Join { method }, Some(left), Some(right)) => {
            PlanNode::join(join_id, method, left, right)
        }
        // Unreachable given the caller's checks; keep the pieces together.
        (kind, left, right) => PlanNode::new(join_id, kind, "")
            .with_children(left.into_iter().chain(right).collect()),
    };

    if residual.is_empty() {
        join
    } else {
        PlanNode::filter(id, join, residual)
    }
}
