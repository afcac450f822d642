//! Query planner - turns query text into a naive and an optimized plan.
//!
//! The planner is the entry point for plan simulation.

use super::builder::NaivePlanBuilder;
use super::compare::PlanComparison;
use super::error::PlanResult;
use super::optimizer::Optimizer;
use super::plan::QueryPlan;
use super::rules::RuleSet;
use crate::catalog::Catalog;

/// The query planner.
pub struct QueryPlanner {
    catalog: Catalog,
    optimizer: Optimizer,
}

impl QueryPlanner {
    /// Create a new query planner.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            optimizer: Optimizer::new(),
        }
    }

    /// Create a planner with a custom optimizer.
    pub fn with_optimizer(catalog: Catalog, optimizer: Optimizer) -> Self {
        Self { catalog, optimizer }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Build the naive baseline plan for `sql`.
    pub fn plan_naive(&self, sql: &str) -> PlanResult<QueryPlan> {
        NaivePlanBuilder::new(&self.catalog).build(sql)
    }

    /// Optimize an existing plan with the `enabled` rules.
    pub fn optimize(&self, naive: &QueryPlan, enabled: &RuleSet) -> PlanResult<QueryPlan> {
        self.optimizer.optimize(naive, enabled, &self.catalog)
    }

    /// Plan `sql` both ways.
    pub fn plan(&self, sql: &str, enabled: &RuleSet) -> PlanResult<PlanComparison> {
        let naive = self.plan_naive(sql)?;
        let optimized = self.optimize(&naive, enabled)?;
        Ok(PlanComparison::new(naive, optimized))
    }

    /// Render both plans as text.
    pub fn explain(&self, sql: &str, enabled: &RuleSet) -> PlanResult<String> {
        let comparison = self.plan(sql, enabled)?;
        let mut out = String::new();
        out.push_str("Naive ");
        out.push_str(&comparison.naive().to_string());
        out.push_str("\nOptimized ");
        out.push_str(&comparison.optimized().to_string());
        Ok(out)
    }
}
