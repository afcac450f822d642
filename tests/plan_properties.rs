//! Property-based tests for plan construction and optimization.

#![allow(clippy::float_cmp)]

use proptest::prelude::*;
use proptest::sample::{select, subsequence};

use plansim::catalog::Catalog;
use plansim::planner::{PlanNode, QueryPlan, QueryPlanner, RuleId, RuleSet};

const TABLES: [&str; 4] = ["customers", "orders", "order_items", "products"];

const COLUMNS: [&str; 8] = [
    "id",
    "country",
    "status",
    "category",
    "total",
    "quantity",
    "customer_id",
    "name",
];

/// Strategy for one WHERE conjunct over `tables`.
fn arb_condition(tables: Vec<&'static str>) -> BoxedStrategy<String> {
    prop_oneof![
        (select(tables.clone()), select(COLUMNS.to_vec()))
            .prop_map(|(t, c)| format!("{}.{} = 1", t, c)),
        (select(tables.clone()), select(tables))
            .prop_map(|(a, b)| format!("{}.id = {}.id", a, b)),
        select(COLUMNS.to_vec()).prop_map(|c| format!("{} > 5", c)),
    ]
    .boxed()
}

/// Strategy for a query over one to four catalog tables.
fn arb_query() -> impl Strategy<Value = String> {
    subsequence(TABLES.to_vec(), 1..=4)
        .prop_shuffle()
        .prop_flat_map(|tables| {
            let conditions = prop::collection::vec(arb_condition(tables.clone()), 0..4);
            (Just(tables), conditions, any::<bool>())
        })
        .prop_map(|(tables, conditions, join_syntax)| {
            let from = if join_syntax {
                let mut from = tables[0].to_string();
                for pair in tables.windows(2) {
                    from.push_str(&format!(" JOIN {} ON {}.id = {}.id", pair[1], pair[0], pair[1]));
                }
                from
            } else {
                tables.join(", ")
            };
            let mut sql = format!("SELECT * FROM {}", from);
            if !conditions.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&conditions.join(" AND "));
            }
            sql.push(';');
            sql
        })
}

/// Strategy for any subset of rules.
fn arb_rules() -> impl Strategy<Value = RuleSet> {
    any::<[bool; 4]>().prop_map(|flags| {
        RuleId::ALL
            .into_iter()
            .zip(flags)
            .filter(|(_, on)| *on)
            .map(|(id, _)| id)
            .collect()
    })
}

fn conjuncts(plan: &QueryPlan) -> Vec<String> {
    let mut texts: Vec<String> = plan
        .root()
        .nodes()
        .into_iter()
        .filter_map(PlanNode::predicates)
        .flatten()
        .map(|p| p.text().to_string())
        .collect();
    texts.sort();
    texts
}

fn leaf_tables(plan: &QueryPlan) -> Vec<String> {
    let mut tables: Vec<String> = plan.root().leaf_tables().into_iter().map(String::from).collect();
    tables.sort();
    tables
}

fn planner() -> QueryPlanner {
    QueryPlanner::new(Catalog::sample())
}

proptest! {
    #[test]
    fn estimates_are_consistent(sql in arb_query(), rules in arb_rules()) {
        let plans = planner().plan(&sql, &rules).unwrap();
        prop_assert!(plans.naive().verify().is_ok());
        prop_assert!(plans.optimized().verify().is_ok());
        prop_assert_eq!(plans.naive().total_cost(), plans.naive().root().cost);
        prop_assert_eq!(plans.optimized().estimated_rows(), plans.optimized().root().cardinality);
    }

    #[test]
    fn optimization_never_raises_cost(sql in arb_query(), rules in arb_rules()) {
        let plans = planner().plan(&sql, &rules).unwrap();
        prop_assert!(plans.optimized().total_cost() <= plans.naive().total_cost());
        prop_assert!(plans.improvement().cost_reduction >= 0.0);
    }

    #[test]
    fn reoptimizing_is_a_fixed_point(sql in arb_query(), rules in arb_rules()) {
        let planner = planner();
        let once = planner.plan(&sql, &rules).unwrap();
        let twice = planner.optimize(once.optimized(), &rules).unwrap();
        prop_assert_eq!(twice.total_cost(), once.optimized().total_cost());
    }

    #[test]
    fn no_rules_is_identity(sql in arb_query()) {
        let plans = planner().plan(&sql, &RuleSet::none()).unwrap();
        prop_assert_eq!(plans.naive(), plans.optimized());
    }

    #[test]
    fn pushdown_preserves_conjuncts(sql in arb_query()) {
        let rules: RuleSet = [RuleId::SelectionPushdown].into_iter().collect();
        let plans = planner().plan(&sql, &rules).unwrap();
        prop_assert_eq!(conjuncts(plans.naive()), conjuncts(plans.optimized()));
    }

    #[test]
    fn reordering_preserves_tables(sql in arb_query()) {
        let rules: RuleSet = [RuleId::JoinReordering].into_iter().collect();
        let plans = planner().plan(&sql, &rules).unwrap();
        prop_assert_eq!(leaf_tables(plans.naive()), leaf_tables(plans.optimized()));
    }

    #[test]
    fn all_rules_preserve_tables_and_conjuncts(sql in arb_query()) {
        let plans = planner().plan(&sql, &RuleSet::all()).unwrap();
        prop_assert_eq!(leaf_tables(plans.naive()), leaf_tables(plans.optimized()));
        prop_assert_eq!(conjuncts(plans.naive()), conjuncts(plans.optimized()));
    }

    #[test]
    fn index_selection_keeps_cardinality(sql in arb_query()) {
        let rules: RuleSet = [RuleId::IndexSelection].into_iter().collect();
        let plans = planner().plan(&sql, &rules).unwrap();
        prop_assert!(plans.optimized().total_cost() <= plans.naive().total_cost());
        prop_assert_eq!(plans.optimized().estimated_rows(), plans.naive().estimated_rows());
    }
}

#[test]
fn documented_examples() {
    let planner = planner();

    let only = |id: RuleId| -> RuleSet { [id].into_iter().collect() };

    let single = planner
        .plan("SELECT * FROM customers WHERE country = \"USA\";", &only(RuleId::IndexSelection))
        .unwrap();
    assert_eq!(single.naive().total_cost(), 5500.0);
    assert_eq!(single.naive().estimated_rows(), 1500);
    assert_eq!(single.optimized().root().children[0].cost, 1000.0);
    assert_eq!(single.optimized().estimated_rows(), 1500);

    let join = planner
        .plan(
            "SELECT * FROM customers JOIN orders ON customers.id = orders.customer_id;",
            &only(RuleId::JoinMethodSelection),
        )
        .unwrap();
    assert_eq!(join.naive().total_cost(), 5000.0 + 5000.0 * 50000.0);
    assert_eq!(join.optimized().total_cost(), 66_000.0);
}
