//! The goal engine: accumulates user actions into a staging job, drives the
//! solver, enforces installonly limits and protected packages, and exposes
//! the resulting transaction or problem reports.

mod problems;

use std::cmp::Ordering;
use std::path::Path;

use bitflags::bitflags;

pub use problems::format_all_problem_rules;

use crate::error::{Error, Result};
use crate::package_set::PackageSet;
use crate::pool::{Pool, SolvableId};
use crate::query::{ExcludeFlags, Query, QueryKey};
use crate::sack::Sack;
use crate::selector::Selector;
use crate::solver::{
    Job, JobFlags, Reason, RuleClass, RuleKind, Solver, SolverFlag, StepType, Transaction,
    TransactionMode,
};

bitflags! {
    /// Actions accumulated on a goal plus the per-run flags of [`Goal::run`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GoalActions: u32 {
        const INSTALL          = 1 << 0;
        const UPGRADE          = 1 << 1;
        const UPGRADE_ALL      = 1 << 2;
        const DISTUPGRADE      = 1 << 3;
        const DISTUPGRADE_ALL  = 1 << 4;
        const ERASE            = 1 << 5;
        const ALLOW_UNINSTALL  = 1 << 6;
        const ALLOW_DOWNGRADE  = 1 << 7;
        const FORCE_BEST       = 1 << 8;
        const VERIFY           = 1 << 9;
        const IGNORE_WEAK      = 1 << 10;
        const IGNORE_WEAK_DEPS = 1 << 11;
    }
}

/// Why a package ended up in the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageReason {
    User,
    Clean,
    Weakdep,
    Dep,
}

/// Restriction for conflict/broken-dependency listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Installed,
    Available,
}

pub struct Goal<'a> {
    sack: &'a Sack,
    staging: Job,
    actions: GoalActions,
    protected: PackageSet,
    protect_running_kernel: bool,
    exclude_from_weak: PackageSet,
    removal_of_protected: Option<PackageSet>,
    solver: Option<Solver<'a>>,
    transaction: Option<Transaction>,
}

impl Clone for Goal<'_> {
    /// An independent goal sharing only the sack; the solver handle and any
    /// transaction stay behind.
    fn clone(&self) -> Self {
        Self {
            sack: self.sack,
            staging: self.staging.clone(),
            actions: self.actions,
            protected: self.protected.clone(),
            protect_running_kernel: self.protect_running_kernel,
            exclude_from_weak: self.exclude_from_weak.clone(),
            removal_of_protected: self.removal_of_protected.clone(),
            solver: None,
            transaction: None,
        }
    }
}

impl<'a> Goal<'a> {
    pub fn new(sack: &'a Sack) -> Self {
        Self {
            sack,
            staging: Job::new(),
            actions: GoalActions::empty(),
            protected: PackageSet::new(),
            protect_running_kernel: true,
            exclude_from_weak: PackageSet::new(),
            removal_of_protected: None,
            solver: None,
            transaction: None,
        }
    }

    pub fn sack(&self) -> &'a Sack {
        self.sack
    }

    pub fn actions(&self) -> GoalActions {
        self.actions
    }

    pub fn has_actions(&self, actions: GoalActions) -> bool {
        self.actions.intersects(actions)
    }

    pub fn job_length(&self) -> usize {
        self.staging.len()
    }

    // ---- staging actions --------------------------------------------------

    fn package_to_job(&mut self, id: SolvableId, action: JobFlags) {
        self.sack.recompute_considered();
        self.sack.make_provides_ready();
        let what = self.sack.pool().queue_to_id(vec![id]);
        self.staging.push(
            JobFlags::SOLVABLE_ONE_OF | JobFlags::SETARCH | JobFlags::SETEVR | action,
            what,
        );
    }

    /// Request installation of a concrete package. An optional request is
    /// weak: its failure does not fail the goal.
    pub fn install(&mut self, id: SolvableId, optional: bool) {
        let mut action = JobFlags::INSTALL;
        if optional {
            action |= JobFlags::WEAK;
        }
        self.actions |= GoalActions::INSTALL | GoalActions::ALLOW_DOWNGRADE;
        self.package_to_job(id, action);
    }

    pub fn install_selector(&mut self, selector: &Selector<'_>, optional: bool) -> Result<()> {
        let mut action = JobFlags::INSTALL;
        if optional {
            action |= JobFlags::WEAK;
        }
        self.actions |= GoalActions::INSTALL | GoalActions::ALLOW_DOWNGRADE;
        selector.to_job(&mut self.staging, action)
    }

    pub fn erase(&mut self, id: SolvableId, clean_deps: bool) {
        let mut action = JobFlags::ERASE;
        if clean_deps {
            action |= JobFlags::CLEANDEPS;
        }
        self.actions |= GoalActions::ERASE;
        self.staging.push(JobFlags::SOLVABLE | action, id);
    }

    pub fn erase_selector(&mut self, selector: &Selector<'_>, clean_deps: bool) -> Result<()> {
        let mut action = JobFlags::ERASE;
        if clean_deps {
            action |= JobFlags::CLEANDEPS;
        }
        self.actions |= GoalActions::ERASE;
        selector.to_job(&mut self.staging, action)
    }

    /// Upgrade everything to the best available candidates.
    pub fn upgrade_all(&mut self) {
        self.actions |= GoalActions::UPGRADE_ALL;
        self.staging.push(JobFlags::SOLVABLE_ALL | JobFlags::UPDATE, 0);
    }

    pub fn upgrade(&mut self, id: SolvableId) {
        self.actions |= GoalActions::UPGRADE;
        self.package_to_job(id, JobFlags::UPDATE);
    }

    pub fn upgrade_selector(&mut self, selector: &Selector<'_>) -> Result<()> {
        self.actions |= GoalActions::UPGRADE;
        let mut action = JobFlags::UPDATE;
        if selector.has_pkgs() {
            action |= JobFlags::TARGETED;
        }
        selector.to_job(&mut self.staging, action)
    }

    /// Distupgrade: sync everything to the repo versions, downgrades
    /// included.
    pub fn distupgrade_all(&mut self) -> Result<()> {
        self.actions |=
            GoalActions::DISTUPGRADE | GoalActions::DISTUPGRADE_ALL | GoalActions::ALLOW_DOWNGRADE;
        let mut query = Query::new(self.sack);
        query.available();
        let mut selector = Selector::new(self.sack);
        selector.set_pkgs(query.run_set().clone())?;
        selector.to_job(&mut self.staging, JobFlags::DISTUPGRADE)
    }

    pub fn distupgrade(&mut self, id: SolvableId) {
        self.actions |= GoalActions::DISTUPGRADE | GoalActions::ALLOW_DOWNGRADE;
        self.package_to_job(id, JobFlags::DISTUPGRADE);
    }

    pub fn distupgrade_selector(&mut self, selector: &Selector<'_>) -> Result<()> {
        self.actions |= GoalActions::DISTUPGRADE | GoalActions::ALLOW_DOWNGRADE;
        selector.to_job(&mut self.staging, JobFlags::DISTUPGRADE)
    }

    /// Pin a package to its current state.
    pub fn lock(&mut self, id: SolvableId) {
        self.staging.push(JobFlags::SOLVABLE | JobFlags::LOCK, id);
    }

    pub fn favor(&mut self, id: SolvableId) {
        self.staging.push(JobFlags::SOLVABLE | JobFlags::FAVOR, id);
    }

    pub fn disfavor(&mut self, id: SolvableId) {
        self.staging.push(JobFlags::SOLVABLE | JobFlags::DISFAVOR, id);
    }

    pub fn user_installed(&mut self, id: SolvableId) {
        self.staging.push(JobFlags::SOLVABLE | JobFlags::USERINSTALLED, id);
    }

    pub fn user_installed_set(&mut self, pkgs: &PackageSet) {
        for id in pkgs.iter() {
            self.user_installed(id);
        }
    }

    // ---- protected packages -----------------------------------------------

    pub fn add_protected(&mut self, pkgs: &PackageSet) {
        self.protected.union_with(pkgs);
    }

    pub fn set_protected(&mut self, pkgs: &PackageSet) {
        self.protected = pkgs.clone();
    }

    pub fn protect_running_kernel(&self) -> bool {
        self.protect_running_kernel
    }

    pub fn set_protect_running_kernel(&mut self, value: bool) {
        self.protect_running_kernel = value;
    }

    fn protected_running_kernel(&self) -> Option<SolvableId> {
        if self.protect_running_kernel {
            self.sack.running_kernel()
        } else {
            None
        }
    }

    // ---- weak excludes ----------------------------------------------------

    pub fn add_exclude_from_weak(&mut self, pkgs: &PackageSet) {
        self.exclude_from_weak.union_with(pkgs);
    }

    pub fn add_exclude_from_weak_pkg(&mut self, id: SolvableId) {
        self.exclude_from_weak.set(id);
    }

    pub fn reset_exclude_from_weak(&mut self) {
        self.exclude_from_weak = PackageSet::new();
    }

    /// Detect weak dependencies that would newly materialize and exclude
    /// them: unmet recommends of installed packages, and available packages
    /// supplementing something already installed.
    pub fn exclude_from_weak_autodetect(&mut self) {
        let pool = self.sack.pool();
        let mut installed_query = Query::with_flags(self.sack, ExcludeFlags::IgnoreExcludes);
        installed_query.installed();
        if installed_query.is_empty() {
            return;
        }
        let mut base_query = Query::new(self.sack);
        base_query.apply();

        let installed_ids: Vec<SolvableId> = installed_query.run_ids();
        let installed_names: std::collections::HashSet<i32> =
            installed_ids.iter().map(|&id| pool.solvable(id).name).collect();

        // unmet recommends of installed packages
        for &id in &installed_ids {
            let recommends = pool.solvable(id).recommends.clone();
            for rec in recommends {
                let dep = pool.dep(rec);
                if matches!(dep, crate::pool::Dep::Rich(_)) {
                    continue;
                }
                let mut query = base_query.clone();
                // a provider may be installed in a different version, so
                // versioned recommends match by name only
                let filter_dep = match dep {
                    crate::pool::Dep::Versioned { name, .. } => pool.rel2id(name, None, ""),
                    _ => rec,
                };
                if query.add_filter_reldep(QueryKey::Provides, filter_dep).is_err() {
                    continue;
                }
                if query.is_empty() {
                    continue;
                }
                let mut test_installed = query.clone();
                test_installed.installed();
                if test_installed.is_empty() {
                    self.exclude_from_weak.union_with(query.run_set());
                }
            }
        }

        // supplements of available packages whose name is not installed
        let mut available_query = base_query.clone();
        available_query.available();
        for id in available_query.run_ids() {
            let s = pool.solvable(id);
            if installed_names.contains(&s.name) {
                continue;
            }
            let supplements: Vec<_> = s
                .supplements
                .iter()
                .copied()
                .filter(|&dep| !matches!(pool.dep(dep), crate::pool::Dep::Rich(_)))
                .collect();
            if supplements.is_empty() {
                continue;
            }
            let mut query = installed_query.clone();
            if query.add_filter_reldeps(QueryKey::Provides, supplements).is_err() {
                continue;
            }
            if !query.is_empty() {
                self.exclude_from_weak.set(id);
            }
        }
    }

    // ---- job construction and solving -------------------------------------

    fn construct_job(&self, flags: GoalActions) -> Job {
        let mut job = self.staging.clone();
        if flags.contains(GoalActions::FORCE_BEST) {
            for entry in job.entries_mut() {
                entry.flags |= JobFlags::FORCEBEST;
            }
        }
        for id in self.exclude_from_weak.iter() {
            job.push(JobFlags::SOLVABLE | JobFlags::EXCLUDEFROMWEAK, id);
        }
        // installonly packages keep old versions alongside new ones
        for &dep in self.sack.installonly() {
            job.push(JobFlags::SOLVABLE_PROVIDES | JobFlags::MULTIVERSION, dep);
        }
        self.allow_uninstall_all_but_protected(&mut job, flags);
        if flags.contains(GoalActions::VERIFY) {
            job.push(JobFlags::SOLVABLE_ALL | JobFlags::VERIFY, 0);
        }
        job
    }

    fn allow_uninstall_all_but_protected(&self, job: &mut Job, flags: GoalActions) {
        if !flags.contains(GoalActions::ALLOW_UNINSTALL) {
            return;
        }
        let considered = self.sack.considered();
        let protected_kernel = self.protected_running_kernel();
        for id in self.sack.installed_set().iter() {
            if !self.protected.has(id) && Some(id) != protected_kernel && considered.has(id) {
                job.push(JobFlags::SOLVABLE | JobFlags::ALLOWUNINSTALL, id);
            }
        }
    }

    /// Build the final job and solve. Returns false when no consistent plan
    /// exists or the plan would remove protected packages; the problem
    /// reporters carry the details. A later run discards previous results
    /// and starts over.
    pub fn run(&mut self, flags: GoalActions) -> bool {
        let job = self.construct_job(flags);
        self.actions |= flags;
        self.solve(job, flags)
    }

    fn solve(&mut self, mut job: Job, flags: GoalActions) -> bool {
        self.sack.recompute_considered();
        self.sack.make_provides_ready();
        self.transaction = None;
        self.removal_of_protected = None;

        let mut solver = Solver::new(self.sack);
        let vendor = self.sack.allow_vendor_change();
        solver.set_flag(SolverFlag::AllowVendorChange, vendor);
        solver.set_flag(SolverFlag::DupAllowVendorChange, vendor);
        // don't erase packages that are no longer in any repo
        solver.set_flag(SolverFlag::KeepOrphans, true);
        // no arch change for forcebest
        solver.set_flag(SolverFlag::BestObeyPolicy, true);
        // support package splits via obsoletes
        solver.set_flag(SolverFlag::YumObsoletes, true);
        solver.set_flag(SolverFlag::UrpmReorder, true);
        if flags.contains(GoalActions::IGNORE_WEAK_DEPS) {
            solver.set_flag(SolverFlag::IgnoreRecommended, true);
        }
        if self.actions.contains(GoalActions::ALLOW_DOWNGRADE) {
            solver.set_flag(SolverFlag::AllowDowngrade, true);
        }

        // with IGNORE_WEAK soft-request failures surface as errors
        if flags.contains(GoalActions::IGNORE_WEAK) {
            for entry in job.entries_mut() {
                entry.flags &= !JobFlags::WEAK;
            }
        }

        if solver.solve(&job) > 0 {
            self.solver = Some(solver);
            return false;
        }

        if self.limit_installonly_packages(&solver, &mut job) {
            // allow erasing non-installonly packages that depend on a
            // kernel about to be erased
            self.allow_uninstall_all_but_protected(&mut job, GoalActions::ALLOW_UNINSTALL);
            if solver.solve(&job) > 0 {
                self.solver = Some(solver);
                return false;
            }
        }

        self.transaction = Some(solver.create_transaction());
        self.solver = Some(solver);

        !self.protected_in_removals()
    }

    /// Enforce the installonly limit: for each installonly dependency with
    /// more decided providers than allowed, keep the newest `limit` of each
    /// name and erase the rest, sparing the running kernel and anything
    /// depending on it. Returns whether the job changed.
    fn limit_installonly_packages(&self, solver: &Solver<'_>, job: &mut Job) -> bool {
        let limit = self.sack.installonly_limit();
        if limit == 0 {
            return false;
        }
        let pool = self.sack.pool();
        let running_kernel = self.sack.running_kernel();
        let mut reresolve = false;

        for &dep in self.sack.installonly() {
            let mut providers: Vec<SolvableId> = pool
                .for_provides(dep)
                .into_iter()
                .filter(|&p| solver.decision_level(p) > 0)
                .collect();
            if providers.len() <= limit {
                continue;
            }
            if !providers.iter().any(|&p| !pool.is_installed(p)) {
                continue;
            }

            providers.sort_by(|&a, &b| installonly_sort_key(pool, running_kernel, a, b));

            // walk same-name blocks from the end, newest first
            while let Some(&last) = providers.last() {
                let name = pool.solvable(last).name;
                let mut same_names = Vec::new();
                while providers.last().is_some_and(|&p| pool.solvable(p).name == name) {
                    same_names.push(providers.pop().unwrap());
                }
                if same_names.len() <= limit {
                    continue;
                }
                reresolve = true;
                for (index, &id) in same_names.iter().enumerate() {
                    let action =
                        if index < limit { JobFlags::INSTALL } else { JobFlags::ERASE };
                    job.push(action | JobFlags::SOLVABLE, id);
                }
            }
        }
        reresolve
    }

    /// Gather ERASE and OBSOLETED ids; the goal fails when any is protected
    /// or the protected running kernel.
    fn protected_in_removals(&mut self) -> bool {
        let protected_kernel = self.protected_running_kernel();
        if self.protected.is_empty() && protected_kernel.is_none() {
            return false;
        }
        let Ok(mut removals) = self.list_results(StepType::Erase, None) else {
            return false;
        };
        if let Ok(obsoleted) = self.list_results(StepType::Obsoleted, None) {
            removals.union_with(&obsoleted);
        }
        let mut hit = false;
        let offenders: Vec<SolvableId> = removals
            .iter()
            .filter(|&id| self.protected.has(id) || Some(id) == protected_kernel)
            .collect();
        let mut set = PackageSet::new();
        for id in offenders {
            set.set(id);
            hit = true;
        }
        self.removal_of_protected = Some(set);
        hit
    }

    // ---- results ----------------------------------------------------------

    fn list_results(&self, filter1: StepType, filter2: Option<StepType>) -> Result<PackageSet> {
        let Some(transaction) = &self.transaction else {
            if self.solver.is_none() {
                return Err(Error::Internal("no solver in the goal".to_string()));
            }
            if let Some(protected) = &self.removal_of_protected {
                if !protected.is_empty() {
                    return Err(Error::RemovalOfProtected { names: self.protected_names() });
                }
            }
            return Err(Error::NoSolution);
        };

        let common = TransactionMode::SHOW_OBSOLETES | TransactionMode::CHANGE_IS_REINSTALL;
        let mut out = PackageSet::new();
        for step in transaction.steps() {
            let mode = if filter1 == StepType::Obsoleted {
                common
            } else {
                common | TransactionMode::SHOW_ACTIVE | TransactionMode::SHOW_ALL
            };
            let Some(step_type) = transaction.transaction_type(step.id, mode) else { continue };
            if step_type == filter1 || Some(step_type) == filter2 {
                out.set(step.id);
            }
        }
        Ok(out)
    }

    pub fn list_installs(&self) -> Result<PackageSet> {
        self.list_results(StepType::Install, Some(StepType::Obsoletes))
    }

    pub fn list_erasures(&self) -> Result<PackageSet> {
        self.list_results(StepType::Erase, None)
    }

    pub fn list_obsoleted(&self) -> Result<PackageSet> {
        self.list_results(StepType::Obsoleted, None)
    }

    pub fn list_reinstalls(&self) -> Result<PackageSet> {
        self.list_results(StepType::Reinstall, None)
    }

    pub fn list_upgrades(&self) -> Result<PackageSet> {
        self.list_results(StepType::Upgrade, None)
    }

    pub fn list_downgrades(&self) -> Result<PackageSet> {
        self.list_results(StepType::Downgrade, None)
    }

    pub fn list_obsoleted_by_package(&self, id: SolvableId) -> Result<Vec<SolvableId>> {
        let transaction = self
            .transaction
            .as_ref()
            .ok_or_else(|| Error::Internal("no transaction in the goal".to_string()))?;
        Ok(transaction.all_obs_pkgs(id))
    }

    pub fn list_unneeded(&self) -> Result<PackageSet> {
        let solver = self
            .solver
            .as_ref()
            .ok_or_else(|| Error::Internal("no solver in the goal".to_string()))?;
        Ok(solver.unneeded().into_iter().collect())
    }

    pub fn list_suggested(&self) -> Result<PackageSet> {
        let solver = self
            .solver
            .as_ref()
            .ok_or_else(|| Error::Internal("no solver in the goal".to_string()))?;
        Ok(solver.suggestions().into_iter().collect())
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// Why the solver touched this package: USER for job decisions, CLEAN
    /// for cleandeps erasures, WEAKDEP for weak pulls, DEP otherwise. With
    /// no solver yet, USER.
    pub fn get_reason(&self, id: SolvableId) -> PackageReason {
        let Some(solver) = &self.solver else {
            return PackageReason::User;
        };
        let Some((reason, rule)) = solver.describe_decision(id) else {
            return PackageReason::Dep;
        };
        if matches!(reason, Reason::Unit | Reason::ResolveJob) {
            let class = rule.and_then(|r| solver.rule_class(r));
            if matches!(class, Some(RuleClass::Job) | Some(RuleClass::Best)) {
                return PackageReason::User;
            }
        }
        if reason == Reason::CleandepsErase || solver.get_cleandeps().has(id) {
            return PackageReason::Clean;
        }
        if reason == Reason::Weakdep {
            return PackageReason::Weakdep;
        }
        PackageReason::Dep
    }

    // ---- problem reporting ------------------------------------------------

    /// Solver problems, plus one for a protected-removal violation.
    pub fn count_problems(&self) -> usize {
        let solver_problems = self.solver.as_ref().map_or(0, |s| s.problem_count());
        let protected = self
            .removal_of_protected
            .as_ref()
            .map_or(0, |set| usize::from(!set.is_empty()));
        solver_problems + protected
    }

    fn protected_names(&self) -> Vec<String> {
        let pool = self.sack.pool();
        let mut names: Vec<String> = self
            .removal_of_protected
            .iter()
            .flat_map(|set| set.iter())
            .map(|id| pool.id2str(pool.solvable(id).name).to_string())
            .collect();
        names.dedup();
        names
    }

    /// The diagnostic for a protected-removal failure, empty when there is
    /// none.
    fn describe_protected_removal(&self) -> String {
        let message = "The operation would result in removing the following protected packages: ";
        if let Some(set) = &self.removal_of_protected {
            if !set.is_empty() {
                return format!("{message}{}", self.protected_names().join(", "));
            }
        }
        // no explicit removal set: look for protected packages behind
        // broken-dependency problems
        let Ok(broken) = self.list_broken_dependency_pkgs(PackageState::Installed) else {
            return String::new();
        };
        let protected_kernel = self.protected_running_kernel();
        let pool = self.sack.pool();
        let names: Vec<String> = broken
            .iter()
            .filter(|&id| self.protected.has(id) || Some(id) == protected_kernel)
            .map(|id| pool.id2str(pool.solvable(id).name).to_string())
            .collect();
        if names.is_empty() {
            return String::new();
        }
        format!("{message}{}", names.join(", "))
    }

    /// Rule descriptions for one problem. A protected-removal violation
    /// renders as a single entry.
    pub fn describe_problem_rules(&self, problem: usize, pkgs: bool) -> Vec<String> {
        if problem >= self.count_problems() {
            return Vec::new();
        }
        let protected = self.describe_protected_removal();
        if !protected.is_empty() {
            return vec![protected];
        }
        let Some(solver) = &self.solver else {
            return Vec::new();
        };
        if problem >= solver.problem_count() {
            return Vec::new();
        }
        problems::describe_solver_problem(
            self.sack,
            solver,
            self.sack.module_excludes(),
            problem,
            pkgs,
        )
    }

    /// All problems, with identical rule lists deduplicated across problems.
    pub fn describe_all_problem_rules(&self, pkgs: bool) -> Vec<Vec<String>> {
        let mut output: Vec<Vec<String>> = Vec::new();
        for problem in 0..self.count_problems() {
            let rules = self.describe_problem_rules(problem, pkgs);
            if rules.is_empty() {
                continue;
            }
            let duplicate = output.iter().any(|saved| {
                saved.len() == rules.len() && rules.iter().all(|rule| saved.contains(rule))
            });
            if !duplicate {
                output.push(rules);
            }
        }
        output
    }

    /// Packages named by conflict problem rules, filtered to the requested
    /// state; available duplicates of installed NEVRAs are dropped.
    pub fn list_conflict_pkgs(&self, state: PackageState) -> Result<PackageSet> {
        self.list_problem_pkgs(state, |kind| {
            matches!(
                kind,
                RuleKind::PkgConflicts | RuleKind::PkgSelfConflict | RuleKind::PkgSameName
            )
        })
    }

    /// Packages named by broken-dependency problem rules.
    pub fn list_broken_dependency_pkgs(&self, state: PackageState) -> Result<PackageSet> {
        self.list_problem_pkgs(state, |kind| {
            matches!(kind, RuleKind::PkgNothingProvidesDep | RuleKind::PkgRequires)
        })
    }

    fn list_problem_pkgs(
        &self,
        state: PackageState,
        wanted: impl Fn(RuleKind) -> bool,
    ) -> Result<PackageSet> {
        let solver = self
            .solver
            .as_ref()
            .ok_or_else(|| Error::Internal("no solver in the goal".to_string()))?;
        let pool = self.sack.pool();
        let mut out = PackageSet::new();
        let mut masked_available = PackageSet::new();

        for problem in 0..solver.problem_count() {
            for &rid in solver.find_all_problem_rules(problem) {
                for info in solver.all_rule_infos(rid) {
                    if !wanted(info.kind) {
                        continue;
                    }
                    for id in [info.source, info.target] {
                        if id <= 0 {
                            continue;
                        }
                        let installed = pool.is_installed(id);
                        match state {
                            PackageState::Available if installed => {
                                masked_available.set(id);
                            }
                            PackageState::Available => out.set(id),
                            PackageState::Installed if installed => out.set(id),
                            PackageState::Installed => {}
                        }
                    }
                }
            }
        }

        if masked_available.is_empty() {
            return Ok(out);
        }
        // drop available packages that are the same NEVRA as an installed one
        let dupes: Vec<SolvableId> = out
            .iter()
            .filter(|&id| {
                masked_available.iter().any(|other| {
                    let a = pool.solvable(id);
                    let b = pool.solvable(other);
                    a.name == b.name && a.evr == b.evr && a.arch == b.arch
                })
            })
            .collect();
        for id in dupes {
            out.clear(id);
        }
        Ok(out)
    }

    // ---- diagnostics ------------------------------------------------------

    /// Write the decision queue to the debug log.
    pub fn log_decisions(&self) -> Result<()> {
        let solver = self
            .solver
            .as_ref()
            .ok_or_else(|| Error::Internal("no solver set".to_string()))?;
        let pool = self.sack.pool();
        for &(literal, rule, reason) in solver.decision_queue() {
            let id = literal.unsigned_abs() as SolvableId;
            log::debug!(
                "decision: {} {} ({:?}, rule {:?})",
                if literal > 0 { "install" } else { "drop" },
                pool.solvable2str(id),
                reason,
                rule
            );
        }
        Ok(())
    }

    /// Dump the job, the resulting transaction and any problems into a
    /// directory, creating intermediate directories as needed.
    pub fn write_debugdata(&self, dir: &Path) -> Result<()> {
        let solver = self
            .solver
            .as_ref()
            .ok_or_else(|| Error::Internal("no solver set".to_string()))?;
        std::fs::create_dir_all(dir)?;
        log::debug!("writing solver debugdata to {}", dir.display());

        let pool = self.sack.pool();
        let mut out = String::new();
        out.push_str("# rusk solver testcase\n");
        out.push_str("job:\n");
        for entry in self.staging.iter() {
            out.push_str(&format!("  {:?} {}\n", entry.flags, entry.what));
        }
        match &self.transaction {
            Some(transaction) => {
                out.push_str("result transaction:\n");
                for step in transaction.steps() {
                    out.push_str(&format!(
                        "  {:?} {}\n",
                        step.step_type,
                        pool.solvable2str(step.id)
                    ));
                }
            }
            None => {
                out.push_str("result problems:\n");
                for problem in 0..solver.problem_count() {
                    for line in self.describe_problem_rules(problem, true) {
                        out.push_str(&format!("  {line}\n"));
                    }
                }
            }
        }
        std::fs::write(dir.join("testcase.t"), out)?;
        Ok(())
    }
}

/// Total order for installonly pruning: group by name, installed before
/// available, running-kernel-dependent packages last, same-EVR-as-kernel
/// next to last, then ascending EVR.
fn installonly_sort_key(
    pool: &Pool,
    running_kernel: Option<SolvableId>,
    a: SolvableId,
    b: SolvableId,
) -> Ordering {
    let sa = pool.solvable(a);
    let sb = pool.solvable(b);
    let name = sa.name.cmp(&sb.name);
    if name != Ordering::Equal {
        return name;
    }
    let avail = (!pool.is_installed(a)).cmp(&!pool.is_installed(b));
    if avail != Ordering::Equal {
        return avail;
    }
    if let Some(kernel) = running_kernel {
        let rank = |id: SolvableId| -> u8 {
            if id == kernel || can_depend_on(pool, id, kernel) {
                2
            } else if pool.solvable(id).evr == pool.solvable(kernel).evr {
                1
            } else {
                0
            }
        };
        let kernel_rank = rank(a).cmp(&rank(b));
        if kernel_rank != Ordering::Equal {
            return kernel_rank;
        }
    }
    pool.evrcmp_solvables(a, b).then_with(|| a.cmp(&b))
}

/// Does `a` require anything `b` provides?
fn can_depend_on(pool: &Pool, a: SolvableId, b: SolvableId) -> bool {
    pool.solvable(a).requires.iter().any(|&req| pool.for_provides(req).contains(&b))
}
