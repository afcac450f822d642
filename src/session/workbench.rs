//! Workbench - the stateful front end over the planner.
//!
//! A workbench holds the catalog, the rule switches and the current
//! naive/optimized plan pair. Submitting a query replaces the pair; toggling
//! a rule re-optimizes the current naive plan.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::samples;
use crate::catalog::{Catalog, CatalogError};
use crate::planner::{
    OptimizationRule, Optimizer, PlanComparison, PlanError, QueryPlan, QueryPlanner, RuleId,
    RuleSet, DEFAULT_MAX_ITERATIONS,
};
use crate::sql::{validate, ValidationError};

/// Result type for workbench operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Workbench errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid query: {0}")]
    Validation(#[from] ValidationError),

    #[error("no query has been planned yet")]
    NoPlan,

    #[error("unknown sample query: {0}")]
    UnknownSample(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Workbench configuration options.
#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    /// Catalog JSON file. The demo catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Rules enabled at start.
    pub enabled_rules: RuleSet,
    /// Pre-validate queries before planning.
    pub validate: bool,
    /// Cap on optimizer passes.
    pub max_iterations: usize,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            enabled_rules: RuleSet::all(),
            validate: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl WorkbenchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the catalog from `path`.
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn enabled_rules(mut self, rules: RuleSet) -> Self {
        self.enabled_rules = rules;
        self
    }

    /// Set validate flag.
    pub fn validate(mut self, value: bool) -> Self {
        self.validate = value;
        self
    }

    pub fn max_iterations(mut self, value: usize) -> Self {
        self.max_iterations = value;
        self
    }
}

/// The workbench handle.
pub struct Workbench {
    planner: QueryPlanner,
    rules: Vec<OptimizationRule>,
    validate: bool,
    query: Option<String>,
    plans: Option<PlanComparison>,
}

impl Workbench {
    /// Open a workbench, loading the configured catalog.
    pub fn open(config: WorkbenchConfig) -> SessionResult<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::sample(),
        };
        Ok(Self::with_config(catalog, config))
    }

    /// Workbench over `catalog` with default settings.
    pub fn new(catalog: Catalog) -> Self {
        Self::with_config(catalog, WorkbenchConfig::default())
    }

    /// Workbench over `catalog`; the config's catalog path is ignored.
    pub fn with_config(catalog: Catalog, config: WorkbenchConfig) -> Self {
        let rules = OptimizationRule::defaults()
            .into_iter()
            .map(|rule| OptimizationRule {
                enabled: config.enabled_rules.contains(rule.id),
                ..rule
            })
            .collect();
        let optimizer = Optimizer::new().with_max_iterations(config.max_iterations);
        Self {
            planner: QueryPlanner::with_optimizer(catalog, optimizer),
            rules,
            validate: config.validate,
            query: None,
            plans: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.planner.catalog()
    }

    /// Rule descriptors in presentation order.
    pub fn rules(&self) -> &[OptimizationRule] {
        &self.rules
    }

    pub fn enabled_rules(&self) -> RuleSet {
        RuleSet::enabled_in(&self.rules)
    }

    /// Validate and plan `sql`, replacing the current plan pair.
    ///
    /// On failure the previous query and plans are kept.
    pub fn submit(&mut self, sql: &str) -> SessionResult<&PlanComparison> {
        if self.validate {
            validate(sql)?;
        }
        let comparison = self.planner.plan(sql, &self.enabled_rules())?;
        log::info!(
            "planned query: naive cost {:.2}, optimized cost {:.2}",
            comparison.naive().total_cost(),
            comparison.optimized().total_cost()
        );
        self.query = Some(sql.to_string());
        Ok(&*self.plans.insert(comparison))
    }

    /// Submit one of the bundled sample queries.
    pub fn load_sample(&mut self, id: &str) -> SessionResult<&PlanComparison> {
        let sample = samples::sample(id).ok_or_else(|| SessionError::UnknownSample(id.to_string()))?;
        self.submit(sample.query)
    }

    /// Flip a rule and re-optimize. Returns whether the rule is now enabled.
    pub fn toggle_rule(&mut self, id: RuleId) -> SessionResult<bool> {
        let enabled = !self.enabled_rules().contains(id);
        self.set_rule(id, enabled)?;
        Ok(enabled)
    }

    /// Switch a rule on or off and re-optimize the current plan.
    pub fn set_rule(&mut self, id: RuleId, enabled: bool) -> SessionResult<()> {
        for rule in self.rules.iter_mut().filter(|r| r.id == id) {
            rule.enabled = enabled;
        }
        log::debug!("rule {} {}", id, if enabled { "enabled" } else { "disabled" });
        self.reoptimize()
    }

    fn reoptimize(&mut self) -> SessionResult<()> {
        if let Some(current) = &self.plans {
            let optimized = self.planner.optimize(current.naive(), &self.enabled_rules())?;
            let naive = current.naive().clone();
            self.plans = Some(PlanComparison::new(naive, optimized));
        }
        Ok(())
    }

    /// Text of the last successfully planned query.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn naive_plan(&self) -> Option<&QueryPlan> {
        self.plans.as_ref().map(PlanComparison::naive)
    }

    pub fn optimized_plan(&self) -> Option<&QueryPlan> {
        self.plans.as_ref().map(PlanComparison::optimized)
    }

    /// The current plan pair.
    pub fn comparison(&self) -> SessionResult<&PlanComparison> {
        self.plans.as_ref().ok_or(SessionError::NoPlan)
    }

    /// The current plan pair as the JSON export document.
    pub fn export_json(&self) -> SessionResult<String> {
        Ok(self.comparison()?.to_json_pretty()?)
    }

    /// Write the export document to `path`.
    pub fn export_to(&self, path: impl AsRef<Path>) -> SessionResult<()> {
        let json = self.export_json()?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("exported plans to {}", path.as_ref().display());
        Ok(())
    }
}
