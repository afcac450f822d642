//! Optimization rules.
//!
//! Each rule consumes a plan subtree and returns a rewritten one. Rules never
//! mutate a tree shared with another plan; the optimizer hands them an owned
//! copy and recomputes estimates after every rule.

mod index_selection;
mod join_method;
mod join_reordering;
mod selection_pushdown;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{PlanError, PlanResult};
use super::node::{NodeId, NodeIds, PlanNode};
use crate::catalog::Catalog;

pub use index_selection::IndexSelection;
pub use join_method::JoinMethodSelection;
pub use join_reordering::JoinReordering;
pub use selection_pushdown::SelectionPushdown;

/// Rule identifier. Ordering is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    SelectionPushdown,
    JoinReordering,
    IndexSelection,
    JoinMethodSelection,
}

impl RuleId {
    /// Every rule, in pipeline order.
    pub const ALL: [RuleId; 4] = [
        RuleId::SelectionPushdown,
        RuleId::JoinReordering,
        RuleId::IndexSelection,
        RuleId::JoinMethodSelection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::SelectionPushdown => "selection_pushdown",
            RuleId::JoinReordering => "join_reordering",
            RuleId::IndexSelection => "index_selection",
            RuleId::JoinMethodSelection => "join_method_selection",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::SelectionPushdown => "Selection Pushdown",
            RuleId::JoinReordering => "Join Reordering",
            RuleId::IndexSelection => "Index Selection",
            RuleId::JoinMethodSelection => "Join Method Selection",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RuleId::SelectionPushdown => {
                "Pushes filters down the query plan to reduce intermediate result sizes"
            }
            RuleId::JoinReordering => "Reorders joins based on table sizes and selectivity",
            RuleId::IndexSelection => "Uses available indexes for faster data access",
            RuleId::JoinMethodSelection => "Chooses between nested loop, hash, or merge join",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        RuleId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| PlanError::UnknownRule(s.trim().to_string()))
    }
}

/// A rule as presented to users: identity, labels and whether it is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizationRule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl OptimizationRule {
    pub fn new(id: RuleId, enabled: bool) -> Self {
        Self {
            id,
            name: id.name().to_string(),
            description: id.description().to_string(),
            enabled,
        }
    }

    /// The four rules in presentation order, all enabled.
    ///
    /// Presentation order differs from pipeline order; the optimizer always
    /// runs rules in pipeline order.
    pub fn defaults() -> Vec<Self> {
        [
            RuleId::JoinReordering,
            RuleId::SelectionPushdown,
            RuleId::IndexSelection,
            RuleId::JoinMethodSelection,
        ]
        .into_iter()
        .map(|id| Self::new(id, true))
        .collect()
    }
}

/// A set of enabled rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(BTreeSet<RuleId>);

impl RuleSet {
    pub fn all() -> Self {
        RuleId::ALL.into_iter().collect()
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list of rule ids. `all` and `none` are
    /// accepted as shorthands; an empty list enables nothing.
    pub fn parse(list: &str) -> PlanResult<Self> {
        match list.trim().to_ascii_lowercase().as_str() {
            "all" => return Ok(Self::all()),
            "none" | "" => return Ok(Self::none()),
            _ => {}
        }
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RuleId::from_str)
            .collect()
    }

    /// The enabled ids among `rules`.
    pub fn enabled_in(rules: &[OptimizationRule]) -> Self {
        rules.iter().filter(|r| r.enabled).map(|r| r.id).collect()
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.0.contains(&id)
    }

    pub fn set(&mut self, id: RuleId, enabled: bool) {
        if enabled {
            self.0.insert(id);
        } else {
            self.0.remove(&id);
        }
    }

    /// Flip `id`, returning whether it is now enabled.
    pub fn toggle(&mut self, id: RuleId) -> bool {
        let enabled = !self.contains(id);
        self.set(id, enabled);
        enabled
    }

    /// Enabled ids in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RuleId> for RuleSet {
    fn from_iter<I: IntoIterator<Item = RuleId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.0.iter().map(RuleId::as_str).collect();
        f.write_str(&ids.join(","))
    }
}

/// State shared by the rules of one optimizer run.
pub struct RewriteContext<'a> {
    catalog: &'a Catalog,
    ids: NodeIds,
}

impl<'a> RewriteContext<'a> {
    pub fn new(catalog: &'a Catalog, ids: NodeIds) -> Self {
        Self { catalog, ids }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Fresh id for a node created by a rewrite.
    pub fn next_id(&mut self) -> NodeId {
        self.ids.next_id()
    }
}

/// A plan rewrite.
pub trait RewriteRule: Send + Sync {
    fn id(&self) -> RuleId;

    fn name(&self) -> &str {
        self.id().name()
    }

    /// Rewrite `node`, returning the new subtree.
    ///
    /// The result may carry stale estimates; callers recompute.
    fn rewrite(&self, node: PlanNode, ctx: &mut RewriteContext<'_>) -> PlanResult<PlanNode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_id_parsing() {
        assert_eq!("index_selection".parse::<RuleId>().unwrap(), RuleId::IndexSelection);
        assert_eq!(" Join-Reordering ".parse::<RuleId>().unwrap(), RuleId::JoinReordering);
        assert!(matches!(
            "magic".parse::<RuleId>(),
            Err(PlanError::UnknownRule(name)) if name == "magic"
        ));
    }

    #[test]
    fn test_rule_ids_roundtrip_through_display() {
        for id in RuleId::ALL {
            assert_eq!(id.to_string().parse::<RuleId>().unwrap(), id);
        }
    }

    #[test]
    fn test_rule_set_orders_by_pipeline() {
        let set = RuleSet::parse("join_method_selection, selection_pushdown").unwrap();
        let ids: Vec<_> = set.iter().collect();
        assert_eq!(ids, vec![RuleId::SelectionPushdown, RuleId::JoinMethodSelection]);
        assert_eq!(set.to_string(), "selection_pushdown,join_method_selection");
    }

    #[test]
    fn test_rule_set_shorthands() {
        assert_eq!(RuleSet::parse("all").unwrap().len(), 4);
        assert!(RuleSet::parse("none").unwrap().is_empty());
        assert!(RuleSet::parse("").unwrap().is_empty());
        assert!(RuleSet::parse("index_selection,bogus").is_err());
    }

    #[test]
    fn test_toggle() {
        let mut set = RuleSet::all();
        assert!(!set.toggle(RuleId::JoinReordering));
        assert!(!set.contains(RuleId::JoinReordering));
        assert!(set.toggle(RuleId::JoinReordering));
        assert_eq!(set, RuleSet::all());
    }

    #[test]
    fn test_defaults_are_enabled() {
        let rules = OptimizationRule::defaults();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules[0].id, RuleId::JoinReordering);
        assert_eq!(RuleSet::enabled_in(&rules), RuleSet::all());
    }

    #[test]
    fn test_serialized_ids() {
        let json = serde_json::to_string(&RuleSet::parse("index_selection").unwrap()).unwrap();
        assert_eq!(json, "[\"index_selection\"]");
    }
}
