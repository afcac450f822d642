//! plansim - a query plan simulator
//!
//! This crate shows how a relational planner turns a SQL query into a plan
//! tree, and how cost-based rewrite rules turn that naive plan into a cheaper
//! one. Queries are never executed; table and column references are matched
//! lexically against a schema catalog of row counts and indexes.
//!
//! # Example
//!
//! ```
//! use plansim::catalog::Catalog;
//! use plansim::planner::{QueryPlanner, RuleSet};
//!
//! let planner = QueryPlanner::new(Catalog::sample());
//! let plans = planner
//!     .plan("SELECT * FROM customers WHERE country = 'USA'", &RuleSet::all())
//!     .unwrap();
//! assert!(plans.optimized().total_cost() < plans.naive().total_cost());
//! ```

pub mod catalog;
pub mod planner;
pub mod session;
pub mod sql;
