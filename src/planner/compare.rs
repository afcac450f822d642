//! Naive versus optimized plan comparison, and the export document.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::PlanResult;
use super::node::NodeKind;
use super::plan::QueryPlan;

/// How much cheaper the optimized plan is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    pub cost_reduction: f64,
    /// Reduction as a percentage of the naive cost; 0 when that cost is 0.
    pub percentage_improvement: f64,
}

impl Improvement {
    pub fn between(naive: &QueryPlan, optimized: &QueryPlan) -> Self {
        let cost_reduction = naive.total_cost() - optimized.total_cost();
        let percentage_improvement = if naive.total_cost() > 0.0 {
            cost_reduction / naive.total_cost() * 100.0
        } else {
            0.0
        };
        Self {
            cost_reduction,
            percentage_improvement,
        }
    }
}

/// Operator counts for one plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    /// Join operator name to count.
    pub join_methods: BTreeMap<&'static str, usize>,
    pub index_scans: usize,
    pub filters: usize,
}

impl PlanSummary {
    pub fn of(plan: &QueryPlan) -> Self {
        let mut summary = Self::default();
        for node in plan.root().nodes() {
            match node.kind {
                NodeKind::Join { method } => {
                    *summary.join_methods.entry(method.name()).or_default() += 1;
                }
                NodeKind::IndexScan { .. } => summary.index_scans += 1,
                NodeKind::Filter { .. } => summary.filters += 1,
                _ => {}
            }
        }
        summary
    }

    fn join_list(&self) -> String {
        self.join_methods
            .iter()
            .map(|(name, count)| format!("{} {}", count, name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A naive plan, its optimized counterpart and what changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanComparison {
    naive: QueryPlan,
    optimized: QueryPlan,
    improvement: Improvement,
}

impl PlanComparison {
    pub fn new(naive: QueryPlan, optimized: QueryPlan) -> Self {
        let improvement = Improvement::between(&naive, &optimized);
        Self {
            naive,
            optimized,
            improvement,
        }
    }

    pub fn naive(&self) -> &QueryPlan {
        &self.naive
    }

    pub fn optimized(&self) -> &QueryPlan {
        &self.optimized
    }

    pub fn improvement(&self) -> Improvement {
        self.improvement
    }

    /// Human-readable notes on what the optimizer changed.
    pub fn details(&self) -> Vec<String> {
        let naive = PlanSummary::of(&self.naive);
        let optimized = PlanSummary::of(&self.optimized);
        let mut notes = Vec::new();

        if self.improvement.cost_reduction > 0.0 {
            notes.push(format!(
                "Reduced estimated cost from {:.0} to {:.0}, a {:.1}% improvement",
                self.naive.total_cost(),
                self.optimized.total_cost(),
                self.improvement.percentage_improvement
            ));
        }
        if naive.join_methods != optimized.join_methods {
            notes.push(format!(
                "Changed join methods from {} to {}",
                naive.join_list(),
                optimized.join_list()
            ));
        }
        if optimized.index_scans > naive.index_scans {
            notes.push(format!(
                "Increased index usage from {} to {} index scans",
                naive.index_scans, optimized.index_scans
            ));
        }
        if optimized.filters != naive.filters {
            notes.push(format!(
                "Changed filter placement or count from {} to {}",
                naive.filters, optimized.filters
            ));
        }
        notes
    }

    /// The export document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::planner::builder::NaivePlanBuilder;
    use crate::planner::node::{NodeId, PlanNode};
    use crate::planner::optimizer::Optimizer;
    use crate::planner::rules::RuleSet;

    fn compare(sql: &str, rules: &str) -> PlanComparison {
        let catalog = Catalog::sample();
        let naive = NaivePlanBuilder::new(&catalog).build(sql).unwrap();
        let optimized = Optimizer::new()
            .optimize(&naive, &RuleSet::parse(rules).unwrap(), &catalog)
            .unwrap();
        PlanComparison::new(naive, optimized)
    }

    #[test]
    fn test_improvement() {
        let c = compare("SELECT * FROM customers WHERE country = \"USA\"", "all");
        assert_eq!(c.improvement().cost_reduction, 4000.0);
        let pct = c.improvement().percentage_improvement;
        assert!((pct - 4000.0 / 5500.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_cost_plan_has_zero_percentage() {
        let empty = QueryPlan::new(PlanNode::table_scan(NodeId::new(1), "t", 0)).unwrap();
        let improvement = Improvement::between(&empty, &empty);
        assert_eq!(improvement.percentage_improvement, 0.0);
    }

    #[test]
    fn test_details() {
        let c = compare(
            "SELECT * FROM customers JOIN orders ON customers.id = orders.customer_id \
             WHERE orders.status = 'open' AND customers.country = 'USA'",
            "all",
        );
        let details = c.details();
        assert!(details[0].starts_with("Reduced estimated cost from "));
        assert!(details
            .iter()
            .any(|d| d.starts_with("Changed join methods from 1 NestedLoopJoin to ")));
        assert!(details.iter().any(|d| d == "Changed filter placement or count from 1 to 2"));
    }

    #[test]
    fn test_no_rules_no_details() {
        let c = compare("SELECT * FROM customers, orders", "none");
        assert!(c.details().is_empty());
        assert_eq!(c.improvement().cost_reduction, 0.0);
    }

    #[test]
    fn test_summary_counts() {
        let c = compare(
            "SELECT * FROM customers, orders WHERE customers.id = 1 AND orders.status = 'x'",
            "none",
        );
        let summary = PlanSummary::of(c.naive());
        assert_eq!(summary.index_scans, 2);
        assert_eq!(summary.filters, 1);
        assert_eq!(summary.join_methods.get("NestedLoopJoin"), Some(&1));
    }

    #[test]
    fn test_export_document() {
        let c = compare("SELECT * FROM customers WHERE country = \"USA\"", "all");
        let json: serde_json::Value = serde_json::from_str(&c.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["naive"]["totalCost"], 5500.0);
        assert_eq!(json["optimized"]["totalCost"], 1500.0);
        assert_eq!(json["improvement"]["costReduction"], 4000.0);
        assert!(json["improvement"]["percentageImprovement"].is_number());
        assert_eq!(json["optimized"]["root"]["children"][0]["type"], "IndexScan");
    }
}
