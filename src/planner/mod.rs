//! Query planning and optimization.
//!
//! This module builds a naive plan tree from query text, estimates its cost,
//! and rewrites a copy of it with cost-based rules.

mod builder;
mod compare;
pub mod cost;
mod error;
mod node;
mod optimizer;
mod plan;
mod planner;
pub mod rules;

pub use builder::{NaivePlanBuilder, UNKNOWN_TABLE};
pub use compare::{Improvement, PlanComparison, PlanSummary};
pub use error::{PlanError, PlanResult};
pub use node::{join_description, JoinMethod, NodeId, NodeIds, NodeKind, PlanNode};
pub use optimizer::{Optimizer, DEFAULT_MAX_ITERATIONS};
pub use plan::QueryPlan;
pub use planner::QueryPlanner;
pub use rules::{OptimizationRule, RewriteContext, RewriteRule, RuleId, RuleSet};
