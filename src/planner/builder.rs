//! Naive plan construction.
//!
//! The naive plan is the deliberately unoptimized baseline: joins in the
//! order they were written, all nested loops, with every WHERE conjunct in a
//! single filter on top.

use super::error::PlanResult;
use super::node::{JoinMethod, NodeId, NodeIds, PlanNode};
use super::plan::QueryPlan;
use crate::catalog::{Catalog, TableSchema};
use crate::sql::{extract, Extraction, Predicate};

/// Table planned when a query names none.
pub const UNKNOWN_TABLE: &str = "unknown";

/// Builds the unoptimized baseline plan for a query.
pub struct NaivePlanBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> NaivePlanBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Build the naive plan for `sql`.
    ///
    /// Any text is accepted; what the extractor cannot find is simply absent
    /// from the plan.
    pub fn build(&self, sql: &str) -> PlanResult<QueryPlan> {
        self.build_extraction(&extract(sql))
    }

    /// Build the naive plan from already extracted tables and conditions.
    pub fn build_extraction(&self, extraction: &Extraction) -> PlanResult<QueryPlan> {
        let mut ids = NodeIds::new();
        let tree = if extraction.is_join() {
            self.join_tree(extraction, &mut ids)
        } else {
            self.single_table(extraction, &mut ids)
        };

        let root = if extraction.conditions.is_empty() {
            tree
        } else {
            PlanNode::filter(ids.next_id(), tree, extraction.conditions.clone())
        };

        let plan = QueryPlan::new(root)?;
        log::debug!(
            "naive plan over {} table(s): cost {:.2}, rows {}",
            extraction.tables.len().max(1),
            plan.total_cost(),
            plan.estimated_rows()
        );
        Ok(plan)
    }

    /// Plain sequential scan; indexes are left to the optimizer.
    fn single_table(&self, extraction: &Extraction, ids: &mut NodeIds) -> PlanNode {
        let name = extraction
            .tables
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_TABLE);
        let table = self.catalog.resolve(name);
        PlanNode::table_scan(ids.next_id(), &table.name, table.row_count)
    }

    /// Left-deep nested loop joins in written order.
    fn join_tree(&self, extraction: &Extraction, ids: &mut NodeIds) -> PlanNode {
        let leaves: Vec<PlanNode> = extraction
            .tables
            .iter()
            .map(|name| leaf(&self.catalog.resolve(name), &extraction.conditions, ids.next_id()))
            .collect();

        let mut leaves = leaves.into_iter();
        let Some(mut tree) = leaves.next() else {
            return self.single_table(extraction, ids);
        };
        for right in leaves {
            tree = PlanNode::join(ids.next_id(), JoinMethod::NestedLoop, tree, right);
        }
        tree
    }
}

/// Scan leaf for one joined table. An index is used only when some conjunct
/// compares `table.column` on an indexed column.
fn leaf(table: &TableSchema, conditions: &[Predicate], id: NodeId) -> PlanNode {
    let indexed = table
        .indexed_columns()
        .find(|column| conditions.iter().any(|p| p.compares(&table.name, &column.name)));

    match indexed {
        Some(column) => PlanNode::index_scan(
            id,
            &table.name,
            column.index_name(&table.name),
            table.row_count,
        ),
        None => PlanNode::table_scan(id, &table.name, table.row_count),
    }
}
