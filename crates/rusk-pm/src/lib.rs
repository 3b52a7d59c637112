//! rusk-pm: dependency resolution and package query core.
//!
//! The crate models a package universe as a pool of solvables organized
//! into repos, exposes a compositional query engine over it, and computes
//! transaction plans through a goal engine backed by a SAT solver. It never
//! executes transactions and never mutates persisted state; metadata
//! parsing, downloading and installation live elsewhere.

pub mod advisory;
pub mod error;
pub mod goal;
pub mod package_set;
pub mod pool;
pub mod query;
pub mod sack;
pub mod selector;
pub mod solver;

pub use advisory::{Advisory, AdvisoryDef, AdvisoryKind, AdvisoryPkg};
pub use error::{Error, Result};
pub use goal::{format_all_problem_rules, Goal, GoalActions, PackageReason, PackageState};
pub use package_set::PackageSet;
pub use pool::{Dep, DepId, Id, Pool, RelOp, SolvableId};
pub use query::{CmpType, ExcludeFlags, Query, QueryKey};
pub use sack::{PackageDef, Sack};
pub use selector::Selector;
pub use solver::{
    Job, JobFlags, Solver, SolverFlag, StepType, Transaction, TransactionMode,
};
