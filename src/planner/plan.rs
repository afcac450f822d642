//! A complete, fully-costed plan tree.

use std::fmt;

use serde::Serialize;

use super::cost;
use super::error::PlanResult;
use super::node::{NodeKind, PlanNode};

/// A plan tree whose totals are read off its root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    root: PlanNode,
    total_cost: f64,
    estimated_rows: u64,
}

impl QueryPlan {
    /// Recompute `root` and wrap it.
    pub fn new(root: PlanNode) -> PlanResult<Self> {
        let root = cost::recompute(root)?;
        Ok(Self {
            total_cost: root.cost,
            estimated_rows: root.cardinality,
            root,
        })
    }

    pub fn root(&self) -> &PlanNode {
        &self.root
    }

    pub fn into_root(self) -> PlanNode {
        self.root
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn estimated_rows(&self) -> u64 {
        self.estimated_rows
    }

    /// Check every node against the cost model.
    pub fn verify(&self) -> PlanResult<()> {
        cost::verify(&self.root)
    }

    /// Equality ignoring node ids.
    pub fn same_shape(&self, other: &QueryPlan) -> bool {
        self.root.same_shape(&other.root)
    }

    fn format_node(&self, f: &mut fmt::Formatter<'_>, node: &PlanNode, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);

        match &node.kind {
            NodeKind::TableScan { table, sorted } => {
                write!(f, "{}TableScan: {}", pad, table)?;
                if *sorted {
                    write!(f, " (sorted)")?;
                }
            }
            NodeKind::IndexScan { table, index } => {
                write!(f, "{}IndexScan: {} using {}", pad, table, index)?;
            }
            NodeKind::Filter { .. } => {
                write!(f, "{}Filter: {}", pad, node.condition().unwrap_or_default())?;
            }
            NodeKind::Join { method } => {
                write!(f, "{}{}", pad, method.name())?;
            }
            NodeKind::Sort { keys } => {
                write!(f, "{}Sort: [{}]", pad, keys.join(", "))?;
            }
            NodeKind::Aggregate => {
                write!(f, "{}Aggregate", pad)?;
            }
            NodeKind::GroupBy { keys } => {
                write!(f, "{}GroupBy: [{}]", pad, keys.join(", "))?;
            }
            NodeKind::Project { columns } => {
                write!(f, "{}Project: [{}]", pad, columns.join(", "))?;
            }
        }

        writeln!(f, " (rows: {}, cost: {:.2})", node.cardinality, node.cost)?;

        for child in &node.children {
            self.format_node(f, child, indent + 1)?;
        }

        Ok(())
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Plan (estimated cost: {:.2}, rows: {}):",
            self.total_cost, self.estimated_rows
        )?;
        self.format_node(f, &self.root, 0)
    }
}
