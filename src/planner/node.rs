//! Plan tree nodes.
//!
//! A node's kind is a closed set of variants, each carrying only the fields
//! that make sense for it. Children live in an ordered `Vec` whose length must
//! match [`NodeKind::arity`]; the cost model rejects any node that breaks this.

use std::fmt;

use serde::Serialize;

use super::cost;
use crate::sql::Predicate;

/// Node identifier, unique within one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source.
#[derive(Debug, Clone)]
pub struct NodeIds {
    next: u64,
}

impl Default for NodeIds {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Continue numbering after the largest id in `root`.
    pub fn after(root: &PlanNode) -> Self {
        Self {
            next: root.max_id().get() + 1,
        }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// Physical join algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum JoinMethod {
    NestedLoop,
    Hash,
    Merge,
}

impl JoinMethod {
    /// Operator name, e.g. `HashJoin`.
    pub fn name(&self) -> &'static str {
        match self {
            JoinMethod::NestedLoop => "NestedLoopJoin",
            JoinMethod::Hash => "HashJoin",
            JoinMethod::Merge => "MergeJoin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JoinMethod::NestedLoop => "Nested Loop Join",
            JoinMethod::Hash => "Hash Join",
            JoinMethod::Merge => "Merge Join",
        }
    }
}

impl fmt::Display for JoinMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a node does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Full table scan.
    TableScan {
        table: String,
        /// Output is known to be ordered.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        sorted: bool,
    },

    /// Scan through an index.
    IndexScan { table: String, index: String },

    /// Conjunctive filter.
    Filter {
        #[serde(rename = "conditions")]
        predicates: Vec<Predicate>,
    },

    Join { method: JoinMethod },

    Sort { keys: Vec<String> },

    Aggregate,

    GroupBy { keys: Vec<String> },

    Project { columns: Vec<String> },
}

impl NodeKind {
    /// Number of children this kind takes.
    pub fn arity(&self) -> usize {
        match self {
            NodeKind::TableScan { .. } | NodeKind::IndexScan { .. } => 0,
            NodeKind::Join { .. } => 2,
            NodeKind::Filter { .. }
            | NodeKind::Sort { .. }
            | NodeKind::Aggregate
            | NodeKind::GroupBy { .. }
            | NodeKind::Project { .. } => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::TableScan { .. } => "TableScan",
            NodeKind::IndexScan { .. } => "IndexScan",
            NodeKind::Filter { .. } => "Filter",
            NodeKind::Join { method } => method.name(),
            NodeKind::Sort { .. } => "Sort",
            NodeKind::Aggregate => "Aggregate",
            NodeKind::GroupBy { .. } => "GroupBy",
            NodeKind::Project { .. } => "Project",
        }
    }
}

/// A node in a plan tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub description: String,
    pub cost: f64,
    pub cardinality: u64,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Create a node with no children and zero estimates.
    pub fn new(id: NodeId, kind: NodeKind, description: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            description: description.into(),
            cost: 0.0,
            cardinality: 0,
            children: Vec::new(),
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_cardinality(mut self, cardinality: u64) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<PlanNode>) -> Self {
        self.children = children;
        self
    }

    /// Sequential scan seeded from a table's row count.
    pub fn table_scan(id: NodeId, table: impl Into<String>, row_count: u64) -> Self {
        let table = table.into();
        let description = format!("Table Scan on {}", table);
        Self::new(id, NodeKind::TableScan { table, sorted: false }, description)
            .with_cost(cost::scan_cost(row_count, false))
            .with_cardinality(row_count)
    }

    /// Index scan seeded from a table's row count.
    pub fn index_scan(
        id: NodeId,
        table: impl Into<String>,
        index: impl Into<String>,
        row_count: u64,
    ) -> Self {
        let (table, index) = (table.into(), index.into());
        let description = format!("Index Scan on {} using {}", table, index);
        Self::new(id, NodeKind::IndexScan { table, index }, description)
            .with_cost(cost::scan_cost(row_count, true))
            .with_cardinality(row_count)
    }

    /// Flag a table scan as producing ordered output.
    pub fn sorted(mut self) -> Self {
        if let NodeKind::TableScan { ref mut sorted, .. } = self.kind {
            *sorted = true;
        }
        self
    }

    /// Filter over `child`. Estimates are left for the cost model.
    pub fn filter(id: NodeId, child: PlanNode, predicates: Vec<Predicate>) -> Self {
        let description = format!("Filter: {}", join_conditions(&predicates));
        Self::new(id, NodeKind::Filter { predicates }, description).with_child(child)
    }

    /// Join of `left` and `right`. Estimates are left for the cost model.
    pub fn join(id: NodeId, method: JoinMethod, left: PlanNode, right: PlanNode) -> Self {
        let description = join_description(method, &left, &right);
        Self::new(id, NodeKind::Join { method }, description).with_children(vec![left, right])
    }

    pub fn sort(id: NodeId, child: PlanNode, keys: Vec<String>) -> Self {
        let description = format!("Sort: {}", keys.join(", "));
        Self::new(id, NodeKind::Sort { keys }, description).with_child(child)
    }

    pub fn group_by(id: NodeId, child: PlanNode, keys: Vec<String>) -> Self {
        let description = format!("Group By: {}", keys.join(", "));
        Self::new(id, NodeKind::GroupBy { keys }, description).with_child(child)
    }

    pub fn aggregate(id: NodeId, child: PlanNode) -> Self {
        Self::new(id, NodeKind::Aggregate, "Aggregate").with_child(child)
    }

    pub fn project(id: NodeId, child: PlanNode, columns: Vec<String>) -> Self {
        let description = format!("Project: {}", columns.join(", "));
        Self::new(id, NodeKind::Project { columns }, description).with_child(child)
    }

    /// Table read by a scan node.
    pub fn table(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::TableScan { table, .. } | NodeKind::IndexScan { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Filter condition as text, conjuncts joined with `AND`.
    pub fn condition(&self) -> Option<String> {
        self.predicates().map(join_conditions)
    }

    pub fn predicates(&self) -> Option<&[Predicate]> {
        match &self.kind {
            NodeKind::Filter { predicates } => Some(predicates),
            _ => None,
        }
    }

    pub fn index(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::IndexScan { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn join_method(&self) -> Option<JoinMethod> {
        match self.kind {
            NodeKind::Join { method } => Some(method),
            _ => None,
        }
    }

    pub fn is_join(&self) -> bool {
        self.join_method().is_some()
    }

    pub fn is_scan(&self) -> bool {
        self.table().is_some()
    }

    /// Whether the node's output is ordered, as merge join requires.
    pub fn is_sorted(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Sort { .. } | NodeKind::IndexScan { .. } | NodeKind::TableScan { sorted: true, .. }
        )
    }

    /// Table of the nearest scan reached by following first children.
    pub fn scan_table(&self) -> Option<&str> {
        match self.table() {
            Some(table) => Some(table),
            None => self.children.first().and_then(PlanNode::scan_table),
        }
    }

    /// Tables of every scan leaf, left to right.
    pub fn leaf_tables(&self) -> Vec<&str> {
        self.nodes().into_iter().filter_map(PlanNode::table).collect()
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> Vec<&PlanNode> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a PlanNode>) {
        out.push(self);
        for child in &self.children {
            child.collect_nodes(out);
        }
    }

    pub fn max_id(&self) -> NodeId {
        self.nodes().into_iter().map(|n| n.id).max().unwrap_or(self.id)
    }

    /// Equality ignoring node ids.
    pub fn same_shape(&self, other: &PlanNode) -> bool {
        self.kind == other.kind
            && self.description == other.description
            && self.cost == other.cost
            && self.cardinality == other.cardinality
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }
}

fn join_conditions(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(Predicate::text)
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Description for a join, e.g. `Hash Join: customers ⋈ orders`.
pub fn join_description(method: JoinMethod, left: &PlanNode, right: &PlanNode) -> String {
    format!("{}: {} ⋈ {}", method.display_name(), label(left), label(right))
}

fn label(node: &PlanNode) -> String {
    if let Some(table) = node.table() {
        return table.to_string();
    }
    match (node.is_join(), node.children.as_slice()) {
        (true, [left, right]) => format!("({} ⋈ {})", label(left), label(right)),
        (_, [child, ..]) => label(child),
        _ => node.kind.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> NodeIds {
        NodeIds::new()
    }

    #[test]
    fn test_node_ids_are_monotonic() {
        let mut ids = ids();
        assert_eq!(ids.next_id(), NodeId::new(1));
        assert_eq!(ids.next_id(), NodeId::new(2));
    }

    #[test]
    fn test_ids_continue_after_tree() {
        let mut ids = ids();
        let left = PlanNode::table_scan(ids.next_id(), "a", 10);
        let right = PlanNode::table_scan(ids.next_id(), "b", 10);
        let join = PlanNode::join(ids.next_id(), JoinMethod::Hash, left, right);
        assert_eq!(NodeIds::after(&join).next_id(), NodeId::new(4));
    }

    #[test]
    fn test_arity() {
        assert_eq!(NodeKind::Aggregate.arity(), 1);
        assert_eq!(NodeKind::Join { method: JoinMethod::Merge }.arity(), 2);
        assert_eq!(
            NodeKind::IndexScan { table: "t".into(), index: "i".into() }.arity(),
            0
        );
    }

    #[test]
    fn test_scan_accessors() {
        let mut ids = ids();
        let scan = PlanNode::index_scan(ids.next_id(), "orders", "idx_orders_id", 100);
        assert_eq!(scan.table(), Some("orders"));
        assert_eq!(scan.index(), Some("idx_orders_id"));
        assert!(scan.is_sorted());
        assert!(!PlanNode::table_scan(ids.next_id(), "t", 1).is_sorted());
        assert!(PlanNode::table_scan(ids.next_id(), "t", 1).sorted().is_sorted());
    }

    #[test]
    fn test_filter_condition_text() {
        let mut ids = ids();
        let scan = PlanNode::table_scan(ids.next_id(), "t", 1);
        let filter = PlanNode::filter(
            ids.next_id(),
            scan,
            vec![Predicate::parse("t.a = 1"), Predicate::parse("t.b > 2")],
        );
        assert_eq!(filter.condition().as_deref(), Some("t.a = 1 AND t.b > 2"));
        assert_eq!(filter.description, "Filter: t.a = 1 AND t.b > 2");
        assert_eq!(filter.scan_table(), Some("t"));
    }

    #[test]
    fn test_join_description_and_leaves() {
        let mut ids = ids();
        let a = PlanNode::table_scan(ids.next_id(), "a", 1);
        let b = PlanNode::table_scan(ids.next_id(), "b", 1);
        let c = PlanNode::table_scan(ids.next_id(), "c", 1);
        let ab = PlanNode::join(ids.next_id(), JoinMethod::NestedLoop, a, b);
        let abc = PlanNode::join(ids.next_id(), JoinMethod::Hash, ab, c);
        assert_eq!(abc.description, "Hash Join: (a ⋈ b) ⋈ c");
        assert_eq!(abc.leaf_tables(), vec!["a", "b", "c"]);
        assert_eq!(abc.scan_table(), Some("a"));
        assert_eq!(abc.nodes().len(), 5);
    }

    #[test]
    fn test_same_shape_ignores_ids() {
        let a = PlanNode::table_scan(NodeId::new(1), "a", 10);
        let b = PlanNode::table_scan(NodeId::new(9), "a", 10);
        assert!(a.same_shape(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_serialized_shape() {
        let scan = PlanNode::table_scan(NodeId::new(3), "customers", 5000);
        let json = serde_json::to_value(&scan).unwrap();
        assert_eq!(json["type"], "TableScan");
        assert_eq!(json["table"], "customers");
        assert_eq!(json["id"], 3);
        assert_eq!(json["cardinality"], 5000);
        assert!(json.get("sorted").is_none());
    }
}
