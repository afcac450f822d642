//! Rule-based plan optimizer.
//!
//! The optimizer runs the enabled rules over an owned copy of the naive plan
//! in a fixed order, recomputing estimates after each rule, and repeats the
//! whole sequence until the plan stops changing.

use super::cost;
use super::error::PlanResult;
use super::node::{NodeIds, PlanNode};
use super::plan::QueryPlan;
use super::rules::{
    IndexSelection, JoinMethodSelection, JoinReordering, RewriteContext, RewriteRule, RuleId,
    RuleSet, SelectionPushdown,
};
use crate::catalog::Catalog;

/// Default cap on full passes over the rule sequence.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// The optimizer.
pub struct Optimizer {
    rules: Vec<Box<dyn RewriteRule>>,
    max_iterations: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    /// Create an optimizer with every rule, in pipeline order.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(SelectionPushdown),
                Box::new(JoinReordering),
                Box::new(IndexSelection),
                Box::new(JoinMethodSelection),
            ],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Limit the number of passes. At least one pass always runs.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Rules this optimizer knows, in the order they run.
    pub fn rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(|r| r.id())
    }

    /// Optimize `naive` with the `enabled` rules.
    ///
    /// Works on a deep copy; `naive` is never touched. The result never costs
    /// more than the input: a rewrite sequence that would raise the cost is
    /// discarded in favor of the input plan.
    pub fn optimize(
        &self,
        naive: &QueryPlan,
        enabled: &RuleSet,
        catalog: &Catalog,
    ) -> PlanResult<QueryPlan> {
        let input = cost::recompute(naive.root().clone())?;
        let mut ctx = RewriteContext::new(catalog, NodeIds::after(&input));

        let mut current = input.clone();
        for iteration in 1..=self.max_iterations {
            let next = self.run_pass(current.clone(), enabled, &mut ctx)?;
            let converged = next.same_shape(&current);
            current = next;
            if converged {
                log::debug!("optimizer converged after {} pass(es)", iteration);
                break;
            }
            if iteration == self.max_iterations {
                log::warn!(
                    "optimizer stopped after {} passes without converging",
                    self.max_iterations
                );
            }
        }

        let optimized = QueryPlan::new(current)?;
        if optimized.total_cost() > input.cost {
            log::debug!(
                "rewrites raised cost from {:.2} to {:.2}, keeping input plan",
                input.cost,
                optimized.total_cost()
            );
            return QueryPlan::new(input);
        }
        Ok(optimized)
    }

    /// One pass of every enabled rule, in pipeline order.
    fn run_pass(
        &self,
        mut node: PlanNode,
        enabled: &RuleSet,
        ctx: &mut RewriteContext<'_>,
    ) -> PlanResult<PlanNode> {
        for rule in self.rules.iter().filter(|r| enabled.contains(r.id())) {
            let before = node.cost;
            node = cost::recompute(rule.rewrite(node, ctx)?)?;
            log::debug!("{}: cost {:.2} -> {:.2}", rule.name(), before, node.cost);
        }
        Ok(node)
    }
}
