//! Swap table scans for index scans under filters on indexed columns.

use super::{RewriteContext, RewriteRule, RuleId};
use crate::catalog::Catalog;
use crate::planner::cost;
use crate::planner::error::PlanResult;
use crate::planner::node::{NodeKind, PlanNode};
use crate::sql::Predicate;

/// Converts a table scan whose direct parent is a filter referencing one of
/// the table's indexed columns into an index scan.
///
/// Only the scan's own cost is discounted; cardinality is untouched.
pub struct IndexSelection;

impl RewriteRule for IndexSelection {
    fn id(&self) -> RuleId {
        RuleId::IndexSelection
    }

    fn rewrite(&self, node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode> {
        let node = select(node, None, ctx.catalog());
        cost::recompute(node)
    }
}

/// Top-down walk; `enclosing` holds the parent filter's conjuncts, if the
/// parent is a filter.
fn select(mut node: PlanNode, enclosing: Option<&[Predicate]>, catalog: &Catalog) -> PlanNode {
    if let NodeKind::TableScan { table, .. } = &node.kind {
        let index = enclosing.and_then(|predicates| index_for(table, predicates, catalog));
        return match index {
            Some(index) => to_index_scan(node, index),
            None => node,
        };
    }

    let children = std::mem::take(&mut node.children);
    let children = children
        .into_iter()
        .map(|child| select(child, node.predicates(), catalog))
        .collect::<Vec<_>>();
    node.children = children;
    node
}

/// Index on the first indexed column of `table` that `predicates` reference.
fn index_for(table: &str, predicates: &[Predicate], catalog: &Catalog) -> Option<String> {
    let schema = catalog.table(table)?;
    schema
        .indexed_columns()
        .find(|column| predicates.iter().any(|p| p.references_column(&column.name)))
        .map(|column| column.index_name(table))
}

fn to_index_scan(node: PlanNode, index: String) -> PlanNode {
    let table = node.table().unwrap_or_default().to_string();
    log::debug!("using {} for scan of {}", index, table);
    PlanNode {
        description: format!("Index Scan on {} using {}", table, index),
        kind: NodeKind::IndexScan { table, index },
        cost: cost::index_discount(node.cost),
        ..node
    }
}
