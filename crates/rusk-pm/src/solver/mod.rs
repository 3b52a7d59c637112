//! The dependency solver.
//!
//! Consumes a job of (flags, operand) pairs, builds SAT rules from it and
//! the package universe, and resolves them with unit propagation and
//! first-UIP conflict learning. On failure each problem is a list of rule
//! ids whose (kind, source, target, dep) quadruples feed the problem
//! reporter.

pub mod decisions;
pub mod job;
pub mod policy;
pub mod rule;
pub mod transaction;
mod watch;

use std::collections::HashMap;
use std::collections::HashSet;

pub use decisions::Reason;
pub use job::{Job, JobEntry, JobFlags};
pub use rule::{Literal, Rule, RuleClass, RuleId, RuleKind, RuleSet};
pub use transaction::{StepType, Transaction, TransactionMode, TransactionStep};

use crate::package_set::PackageSet;
use crate::pool::{Dep, DepId, Id, SolvableId};
use crate::sack::Sack;
use decisions::Decisions;
use policy::Policy;
use watch::{PropagateResult, Propagator, WatchGraph};

/// Tunable solver behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverFlag {
    AllowVendorChange,
    DupAllowVendorChange,
    KeepOrphans,
    BestObeyPolicy,
    YumObsoletes,
    UrpmReorder,
    IgnoreRecommended,
    AllowDowngrade,
}

/// A rule-info quadruple, the unit of problem rendering.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    pub kind: RuleKind,
    pub source: SolvableId,
    pub target: SolvableId,
    pub dep: DepId,
}

pub struct Solver<'a> {
    sack: &'a Sack,
    flags: HashSet<SolverFlag>,
    rules: RuleSet,
    decisions: Decisions,
    problems: Vec<Vec<RuleId>>,
    policy: Policy,
    considered: PackageSet,
    installed: PackageSet,
    multiversion: PackageSet,
    allow_uninstall: PackageSet,
    userinstalled: PackageSet,
    exclude_from_weak: PackageSet,
    update_targets: PackageSet,
    distupgrade_targets: PackageSet,
    erase_targets: PackageSet,
    cleandeps_from: Vec<SolvableId>,
    cleandeps: PackageSet,
    name_index: HashMap<Id, Vec<SolvableId>>,
    verify: bool,
    solved: bool,
}

impl<'a> Solver<'a> {
    pub fn new(sack: &'a Sack) -> Self {
        Self {
            sack,
            flags: HashSet::new(),
            rules: RuleSet::new(),
            decisions: Decisions::new(),
            problems: Vec::new(),
            policy: Policy::new(),
            considered: PackageSet::new(),
            installed: PackageSet::new(),
            multiversion: PackageSet::new(),
            allow_uninstall: PackageSet::new(),
            userinstalled: PackageSet::new(),
            exclude_from_weak: PackageSet::new(),
            update_targets: PackageSet::new(),
            distupgrade_targets: PackageSet::new(),
            erase_targets: PackageSet::new(),
            cleandeps_from: Vec::new(),
            cleandeps: PackageSet::new(),
            name_index: HashMap::new(),
            verify: false,
            solved: false,
        }
    }

    pub fn set_flag(&mut self, flag: SolverFlag, enabled: bool) {
        if enabled {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    pub fn get_flag(&self, flag: SolverFlag) -> bool {
        self.flags.contains(&flag)
    }

    // ---- solving ----------------------------------------------------------

    /// Resolve the job. Returns the number of problems; zero means a
    /// consistent assignment was found.
    pub fn solve(&mut self, job: &Job) -> usize {
        self.sack.recompute_considered();
        self.sack.make_provides_ready();

        self.rules = RuleSet::new();
        self.problems.clear();
        self.solved = false;
        self.considered = self.sack.considered();
        self.installed = self.sack.installed_set();
        self.build_name_index();
        self.collect_job_sets(job);
        self.compute_cleandeps_closure();
        self.generate_rules(job);
        log::info!("generated {} rules from {} job entries", self.rules.len(), job.len());

        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > 100 {
                log::warn!("solver exceeded retry budget");
                break;
            }
            self.decisions.reset();
            self.disable_learned_rules();
            match self.run_sat() {
                Ok(()) => break,
                Err(problem) => {
                    // weak rules lose silently
                    if let Some(&weak_id) = problem.iter().find(|&&rid| {
                        self.rules.get(rid).is_some_and(|r| r.weak && !r.is_disabled())
                    }) {
                        log::debug!("disabling weak rule {weak_id} after conflict");
                        self.rules.disable(weak_id);
                        continue;
                    }
                    // disable the driving job rules so independent problems
                    // can still surface
                    let mut disabled_any = false;
                    for &rid in &problem {
                        let job_rule = self.rules.get(rid).is_some_and(|r| {
                            r.kind().class() == RuleClass::Job && !r.is_disabled()
                        });
                        if job_rule {
                            self.rules.disable(rid);
                            disabled_any = true;
                        }
                    }
                    self.problems.push(problem);
                    if !disabled_any {
                        break;
                    }
                }
            }
        }

        self.solved = self.problems.is_empty();
        self.problems.len()
    }

    fn disable_learned_rules(&mut self) {
        let learned: Vec<RuleId> = self
            .rules
            .iter()
            .filter(|r| r.kind() == RuleKind::Learned && !r.is_disabled())
            .map(|r| r.id())
            .collect();
        for id in learned {
            self.rules.disable(id);
        }
    }

    fn run_sat(&mut self) -> Result<(), Vec<RuleId>> {
        let mut watches = WatchGraph::from_rules(&self.rules);
        let mut propagate_index = 0usize;

        self.decisions.increment_level(); // level 1 holds assertions
        self.process_assertions()?;

        let mut iterations = 0u32;
        loop {
            iterations += 1;
            if iterations > 100_000 {
                return Err(Vec::new());
            }

            if let Err(conflict) = Self::propagate_all(
                &mut watches,
                &self.rules,
                &mut self.decisions,
                &mut propagate_index,
            ) {
                if self.decisions.level() <= 1 {
                    return Err(self.analyze_unsolvable(conflict));
                }
                self.analyze_and_backtrack(&mut watches, conflict, &mut propagate_index)?;
                continue;
            }

            if let Some((candidates, rule_id)) = self.select_next() {
                let selected = candidates[0];
                let reason = match self.rules.get(rule_id).map(|r| r.kind().class()) {
                    Some(RuleClass::Job) => Reason::ResolveJob,
                    _ => Reason::Resolve,
                };
                self.decisions.increment_level();
                self.decisions.decide(selected, Some(rule_id), reason);
                continue;
            }
            if self.decide_weak_dep() {
                continue;
            }
            if self.keep_next_installed() {
                continue;
            }
            return Ok(());
        }
    }

    fn process_assertions(&mut self) -> Result<(), Vec<RuleId>> {
        // empty rules are unsatisfiable requirements
        let empty: Vec<RuleId> = self
            .rules
            .iter()
            .filter(|r| !r.is_disabled() && r.is_empty())
            .map(|r| r.id())
            .collect();
        for rid in empty {
            if self.rules.get(rid).is_some_and(|r| r.weak) {
                self.rules.disable(rid);
            } else {
                return Err(vec![rid]);
            }
        }

        let assertion_ids: Vec<RuleId> = self
            .rules
            .iter()
            .filter(|r| !r.is_disabled() && r.is_assertion())
            .map(|r| r.id())
            .collect();
        for rid in assertion_ids {
            let (literal, weak, reason) = {
                let rule = self.rules.get(rid).unwrap();
                if rule.is_disabled() {
                    continue;
                }
                let reason = if rule.cleandeps {
                    Reason::CleandepsErase
                } else if rule.kind().class() == RuleClass::Job {
                    Reason::ResolveJob
                } else {
                    Reason::Unit
                };
                (rule.literals()[0], rule.weak, reason)
            };
            if self.decisions.conflict(literal) {
                if weak {
                    self.rules.disable(rid);
                    continue;
                }
                let mut problem = self.analyze_unsolvable(rid);
                if let Some(other) = self.decisions.decision_rule(literal) {
                    if !problem.contains(&other) {
                        problem.push(other);
                    }
                }
                return Err(problem);
            }
            if !self.decisions.satisfied(literal) {
                self.decisions.decide(literal, Some(rid), reason);
            }
        }
        Ok(())
    }

    fn propagate_all(
        watches: &mut WatchGraph,
        rules: &RuleSet,
        decisions: &mut Decisions,
        propagate_index: &mut usize,
    ) -> Result<(), RuleId> {
        while *propagate_index < decisions.len() {
            let (literal, _, _) = decisions.queue()[*propagate_index];
            *propagate_index += 1;

            let results = {
                let frozen = &*decisions;
                let mut propagator = Propagator::new(watches, rules);
                propagator.propagate(literal, |lit| {
                    let id = lit.unsigned_abs() as SolvableId;
                    if frozen.decided(id) {
                        Some(frozen.satisfied(lit))
                    } else {
                        None
                    }
                })
            };

            for result in results {
                match result {
                    PropagateResult::Ok => {}
                    PropagateResult::Unit(unit_lit, rule_id) => {
                        if decisions.conflict(unit_lit) {
                            return Err(rule_id);
                        }
                        if !decisions.satisfied(unit_lit) {
                            decisions.decide(unit_lit, Some(rule_id), Reason::Unit);
                        }
                    }
                    PropagateResult::Conflict(rule_id) => return Err(rule_id),
                }
            }
        }
        Ok(())
    }

    /// First-UIP conflict analysis; backtrack and decide the learned
    /// literal. Errors when no valid backtrack level exists.
    fn analyze_and_backtrack(
        &mut self,
        watches: &mut WatchGraph,
        conflict: RuleId,
        propagate_index: &mut usize,
    ) -> Result<(), Vec<RuleId>> {
        let (learned_literal, backtrack_level, learned_rule) = self.analyze_conflict(conflict);

        if backtrack_level == 0 || backtrack_level >= self.decisions.level() {
            return Err(self.analyze_unsolvable(conflict));
        }

        self.decisions.revert_to_level(backtrack_level);
        *propagate_index = self.decisions.len();

        if !learned_rule.is_empty() {
            let learned_id = self.rules.add(learned_rule);
            watches.add_rule(self.rules.get(learned_id).unwrap());
            self.decisions.decide(learned_literal, Some(learned_id), Reason::Unit);
        }
        Ok(())
    }

    fn analyze_conflict(&self, conflict_rule_id: RuleId) -> (Literal, u32, Rule) {
        let current_level = self.decisions.level();
        let decisions = self.decisions.queue();

        let mut seen: HashSet<SolvableId> = HashSet::new();
        let mut num_at_current_level = 0usize;
        let mut other_learned: Vec<Literal> = Vec::new();
        let mut backtrack_level = 0u32;
        let mut learned_literal: Option<Literal> = None;
        let mut decision_idx = decisions.len();
        let mut current_rule = self.rules.get(conflict_rule_id);

        loop {
            if let Some(rule) = current_rule {
                for &lit in rule.literals() {
                    let id = lit.unsigned_abs() as SolvableId;
                    if seen.contains(&id) || self.decisions.satisfied(lit) {
                        continue;
                    }
                    seen.insert(id);
                    match self.decisions.decision_level(lit) {
                        Some(0) | None => {}
                        Some(level) if level == current_level => num_at_current_level += 1,
                        Some(1) => {}
                        Some(level) => {
                            other_learned.push(lit);
                            backtrack_level = backtrack_level.max(level);
                        }
                    }
                }
            }

            if num_at_current_level == 0 {
                break;
            }

            // walk back to the most recent decision we have seen
            loop {
                if decision_idx == 0 {
                    break;
                }
                decision_idx -= 1;
                let (lit, _, _) = decisions[decision_idx];
                let id = lit.unsigned_abs() as SolvableId;
                if seen.remove(&id) {
                    num_at_current_level -= 1;
                    if num_at_current_level == 0 {
                        // the unique implication point
                        learned_literal = Some(-lit);
                    } else {
                        current_rule = self
                            .decisions
                            .decision_rule(lit)
                            .and_then(|rid| self.rules.get(rid));
                    }
                    break;
                }
            }

            if learned_literal.is_some() || decision_idx == 0 {
                break;
            }
        }

        let learned_literal = learned_literal.unwrap_or_else(|| {
            decisions
                .iter()
                .rev()
                .find(|(lit, _, _)| self.decisions.decision_level(*lit) == Some(current_level))
                .map(|&(lit, _, _)| -lit)
                .unwrap_or(1)
        });

        let mut literals = vec![learned_literal];
        for &lit in &other_learned {
            literals.push(-lit);
        }

        let mut backtrack_level = backtrack_level;
        if backtrack_level >= current_level {
            backtrack_level = current_level.saturating_sub(1);
        }
        if backtrack_level == 0 && current_level > 1 {
            backtrack_level = 1;
        }

        (learned_literal, backtrack_level, Rule::learned(literals))
    }

    /// Collect the conflicting rule and, transitively, the rules that forced
    /// its literals.
    fn analyze_unsolvable(&self, conflict: RuleId) -> Vec<RuleId> {
        let mut problem = vec![conflict];
        let mut idx = 0;
        while idx < problem.len() {
            if let Some(rule) = self.rules.get(problem[idx]) {
                for &lit in rule.literals() {
                    if let Some(rid) = self.decisions.decision_rule(lit) {
                        if !problem.contains(&rid)
                            && self.rules.get(rid).is_some_and(|r| r.kind() != RuleKind::Learned)
                        {
                            problem.push(rid);
                        }
                    }
                }
            }
            idx += 1;
        }
        problem
    }

    // ---- decision heuristics ----------------------------------------------

    /// The next undecided choice point: job one-of rules first, then
    /// requires of packages going in, then keep-or-replace rules.
    fn select_next(&self) -> Option<(Vec<SolvableId>, RuleId)> {
        let pool = self.sack.pool();

        for rule in self.rules.as_slice() {
            if rule.is_disabled() || rule.kind().class() != RuleClass::Job {
                continue;
            }
            let literals = rule.literals();
            if literals.len() < 2 {
                continue;
            }
            if literals.iter().any(|&l| self.decisions.satisfied(l)) {
                continue;
            }
            let mut queue: Vec<SolvableId> = literals
                .iter()
                .filter(|&&l| l > 0 && self.decisions.undecided(l))
                .copied()
                .collect();
            if !queue.is_empty() {
                self.policy.order_candidates(pool, &mut queue, false);
                // a distupgrade syncs to the repo version even when that
                // means going down
                if self.distupgrade_targets.has(rule.source) {
                    queue.sort_by_key(|&id| pool.is_installed(id));
                }
                return Some((queue, rule.id()));
            }
        }

        for rule in self.rules.as_slice() {
            if rule.is_disabled() || rule.kind() != RuleKind::PkgRequires {
                continue;
            }
            let literals = rule.literals();
            let source_lit = literals[0];
            if source_lit >= 0 {
                continue;
            }
            if !self.decisions.decided_install(-source_lit) {
                continue;
            }
            if literals[1..].iter().any(|&l| self.decisions.satisfied(l)) {
                continue;
            }
            let mut queue: Vec<SolvableId> = literals[1..]
                .iter()
                .filter(|&&l| l > 0 && self.decisions.undecided(l))
                .copied()
                .collect();
            if !queue.is_empty() {
                self.policy.order_candidates(pool, &mut queue, true);
                return Some((queue, rule.id()));
            }
        }

        for rule in self.rules.as_slice() {
            if rule.is_disabled()
                || !matches!(rule.kind(), RuleKind::Update | RuleKind::Distupgrade)
            {
                continue;
            }
            let literals = rule.literals();
            if literals.len() < 2 {
                continue;
            }
            if literals.iter().any(|&l| self.decisions.satisfied(l)) {
                continue;
            }
            let mut queue: Vec<SolvableId> = literals
                .iter()
                .filter(|&&l| l > 0 && self.decisions.undecided(l))
                .copied()
                .collect();
            if queue.is_empty() {
                continue;
            }
            let target = rule.source;
            let modernize = self.update_targets.has(target) || self.distupgrade_targets.has(target);
            self.policy.order_candidates(pool, &mut queue, !modernize);
            return Some((queue, rule.id()));
        }

        None
    }

    /// Install the best provider of an unmet recommends of a package going
    /// in, unless weak deps are ignored or the provider is excluded.
    fn decide_weak_dep(&mut self) -> bool {
        if self.get_flag(SolverFlag::IgnoreRecommended) {
            return false;
        }
        let pool = self.sack.pool();
        let incoming: Vec<SolvableId> = self
            .decisions
            .installed_packages()
            .filter(|&p| !self.installed.has(p))
            .collect();
        for p in incoming {
            let recommends = pool.solvable(p).recommends.clone();
            for rec in recommends {
                if matches!(pool.dep(rec), Dep::Rich(_)) {
                    continue;
                }
                let providers: Vec<SolvableId> = pool
                    .for_provides(rec)
                    .into_iter()
                    .filter(|&q| self.considered.has(q))
                    .collect();
                if providers.is_empty() {
                    continue;
                }
                let satisfied = providers.iter().any(|&q| {
                    self.decisions.decided_install(q)
                        || (self.installed.has(q) && !self.decisions.decided_remove(q))
                });
                if satisfied {
                    continue;
                }
                let mut candidates: Vec<SolvableId> = providers
                    .into_iter()
                    .filter(|&q| {
                        self.decisions.undecided(q) && !self.exclude_from_weak.has(q)
                    })
                    .collect();
                if candidates.is_empty() {
                    continue;
                }
                self.policy.order_candidates(pool, &mut candidates, false);
                self.decisions.increment_level();
                self.decisions.decide(candidates[0], None, Reason::Weakdep);
                return true;
            }
        }
        false
    }

    /// Keep the next untouched installed package, orphans included.
    fn keep_next_installed(&mut self) -> bool {
        let next = self.installed.iter().find(|&i| self.decisions.undecided(i));
        if let Some(i) = next {
            self.decisions.increment_level();
            self.decisions.decide(i, None, Reason::Keep);
            return true;
        }
        false
    }

    // ---- rule generation --------------------------------------------------

    fn build_name_index(&mut self) {
        let pool = self.sack.pool();
        self.name_index.clear();
        for id in pool.solvable_ids() {
            self.name_index.entry(pool.solvable(id).name).or_default().push(id);
        }
    }

    fn collect_job_sets(&mut self, job: &Job) {
        self.multiversion = PackageSet::new();
        self.allow_uninstall = PackageSet::new();
        self.userinstalled = PackageSet::new();
        self.exclude_from_weak = PackageSet::new();
        self.update_targets = PackageSet::new();
        self.distupgrade_targets = PackageSet::new();
        self.erase_targets = PackageSet::new();
        self.cleandeps_from.clear();
        self.cleandeps = PackageSet::new();
        self.policy = Policy::new();
        self.verify = false;

        for entry in job.iter() {
            let f = entry.flags;
            if f.contains(JobFlags::MULTIVERSION) {
                for id in self.expand_selection(entry) {
                    self.multiversion.set(id);
                }
            }
            if f.contains(JobFlags::ALLOWUNINSTALL) {
                for id in self.expand_selection(entry) {
                    self.allow_uninstall.set(id);
                }
            }
            if f.contains(JobFlags::USERINSTALLED) {
                for id in self.expand_selection(entry) {
                    self.userinstalled.set(id);
                }
            }
            if f.contains(JobFlags::EXCLUDEFROMWEAK) {
                for id in self.expand_selection(entry) {
                    self.exclude_from_weak.set(id);
                }
            }
            if f.contains(JobFlags::FAVOR) {
                self.policy.favored.extend(self.expand_selection(entry));
            }
            if f.contains(JobFlags::DISFAVOR) {
                self.policy.disfavored.extend(self.expand_selection(entry));
            }
            if f.contains(JobFlags::ERASE) {
                let ids = self.expand_selection(entry);
                for &id in &ids {
                    self.erase_targets.set(id);
                }
                if f.contains(JobFlags::CLEANDEPS) {
                    self.cleandeps_from.extend(ids);
                }
            }
            if f.contains(JobFlags::VERIFY) {
                self.verify = true;
            }
        }
    }

    /// Expand a job entry's selection into concrete solvable ids, masked by
    /// the considered map.
    fn expand_selection(&self, entry: &JobEntry) -> Vec<SolvableId> {
        expand_entry(self.sack.pool(), &self.considered, entry)
    }

    fn generate_rules(&mut self, job: &Job) {
        let pool = self.sack.pool();
        let allow_downgrade = self.get_flag(SolverFlag::AllowDowngrade);
        let mut queue: Vec<SolvableId> = Vec::new();

        for entry in job.iter() {
            let f = entry.flags;
            if f.contains(JobFlags::INSTALL) {
                let mut candidates = self.expand_selection(entry);
                if f.contains(JobFlags::FORCEBEST) {
                    candidates = self.policy.best_subset(pool, &candidates);
                }
                if candidates.is_empty() {
                    let kind = if f.selection() == JobFlags::SOLVABLE_PROVIDES {
                        RuleKind::JobNothingProvidesDep
                    } else {
                        RuleKind::JobUnknownPackage
                    };
                    let mut rule = Rule::new(Vec::new(), kind).with_dep(selection_dep(entry));
                    if f.contains(JobFlags::WEAK) {
                        rule = rule.weak();
                    }
                    self.rules.add(rule);
                } else {
                    let literals: Vec<Literal> = candidates.clone();
                    let mut rule =
                        Rule::new(literals, RuleKind::Job).with_dep(selection_dep(entry));
                    if f.contains(JobFlags::WEAK) {
                        rule = rule.weak();
                    }
                    self.rules.add(rule);
                    queue.extend(candidates);
                }
            } else if f.contains(JobFlags::ERASE) {
                for id in self.expand_selection(entry) {
                    self.rules.add(Rule::assertion(-id, RuleKind::Job).with_source(id));
                }
            } else if f.intersects(JobFlags::UPDATE | JobFlags::DISTUPGRADE) {
                let dist = f.contains(JobFlags::DISTUPGRADE);
                if f.selection() == JobFlags::SOLVABLE_ALL {
                    let targets = self.installed.clone();
                    for i in targets.iter() {
                        if dist {
                            self.distupgrade_targets.set(i);
                        } else {
                            self.update_targets.set(i);
                        }
                    }
                } else {
                    for c in self.expand_selection(entry) {
                        if self.installed.has(c) {
                            if dist {
                                self.distupgrade_targets.set(c);
                            } else {
                                self.update_targets.set(c);
                            }
                            continue;
                        }
                        let counterpart = pool.what_upgrades(c).or_else(|| {
                            if dist || allow_downgrade {
                                pool.what_downgrades(c)
                            } else {
                                None
                            }
                        });
                        if let Some(i) = counterpart {
                            if dist {
                                self.distupgrade_targets.set(i);
                            } else {
                                self.update_targets.set(i);
                            }
                            self.rules.add(
                                Rule::new(vec![i, c], RuleKind::Job).with_source(i).with_target(c),
                            );
                            queue.push(c);
                        }
                    }
                }
            } else if f.contains(JobFlags::LOCK) {
                for id in self.expand_selection(entry) {
                    let literal = if self.installed.has(id) { id } else { -id };
                    self.rules.add(Rule::assertion(literal, RuleKind::Job).with_source(id));
                }
            }
        }

        // cleandeps erasures are weak: they yield to anything that still
        // needs the package
        let cleandeps = self.cleandeps.clone();
        for id in cleandeps.iter() {
            let mut rule = Rule::assertion(-id, RuleKind::Job).with_source(id).weak();
            rule.cleandeps = true;
            self.rules.add(rule);
        }

        // keep-or-replace rules for installed packages
        let installed = self.installed.clone();
        for i in installed.iter() {
            if self.erase_targets.has(i)
                || self.allow_uninstall.has(i)
                || self.cleandeps.has(i)
            {
                continue;
            }
            let mut literals: Vec<Literal> = vec![i];
            if self.considered.has(i) && !self.multiversion.has(i) {
                let s = pool.solvable(i);
                let allow_down =
                    allow_downgrade || self.distupgrade_targets.has(i);
                let noarch = pool.lookup_str("noarch");
                if let Some(same_name) = self.name_index.get(&s.name) {
                    for &a in same_name {
                        if a == i || self.installed.has(a) || !self.considered.has(a) {
                            continue;
                        }
                        let sa = pool.solvable(a);
                        let arch_ok = sa.arch == s.arch
                            || Some(sa.arch) == noarch
                            || Some(s.arch) == noarch;
                        if !arch_ok {
                            continue;
                        }
                        let newer = pool.evrcmp_solvables(a, i) == std::cmp::Ordering::Greater;
                        if newer || allow_down {
                            literals.push(a);
                        }
                    }
                }
                for o in pool.solvable_ids() {
                    if self.installed.has(o)
                        || !self.considered.has(o)
                        || pool.solvable(o).obsoletes.is_empty()
                        || pool.solvable(o).name == s.name
                    {
                        continue;
                    }
                    let hits = pool.solvable(o).obsoletes.iter().any(|&obs| {
                        pool.solvable_provides_dep(i, obs)
                            && (pool.obsolete_uses_provides || pool.match_nevr(i, obs))
                    });
                    if hits {
                        literals.push(o);
                    }
                }
            }
            queue.extend(literals[1..].iter().copied());
            let kind = if self.distupgrade_targets.has(i) {
                RuleKind::Distupgrade
            } else {
                RuleKind::Update
            };
            self.rules.add(Rule::new(literals, kind).with_source(i));
        }

        // transitive package rules
        let mut seen = PackageSet::with_capacity(pool.nsolvables());
        while let Some(p) = queue.pop() {
            if seen.has(p) {
                continue;
            }
            seen.set(p);
            self.add_package_rules(p, &mut queue);
        }
    }

    fn add_package_rules(&mut self, p: SolvableId, queue: &mut Vec<SolvableId>) {
        let pool = self.sack.pool();
        let s = pool.solvable(p).clone();
        let available = !self.installed.has(p);

        if available && !self.considered.has(p) {
            self.rules.add(Rule::assertion(-p, RuleKind::PkgNotInstallable).with_source(p));
            return;
        }

        if available || self.verify {
            for &req in &s.requires {
                if matches!(pool.dep(req), Dep::Rich(_)) {
                    continue;
                }
                if pool
                    .dep_name(req)
                    .is_some_and(|name| pool.id2str(name).starts_with("rpmlib("))
                {
                    continue;
                }
                let providers: Vec<SolvableId> = pool
                    .for_provides(req)
                    .into_iter()
                    .filter(|&q| self.considered.has(q))
                    .collect();
                if providers.is_empty() {
                    self.rules.add(
                        Rule::assertion(-p, RuleKind::PkgNothingProvidesDep)
                            .with_source(p)
                            .with_dep(req),
                    );
                } else {
                    self.rules.add(
                        Rule::requires(p, &providers, RuleKind::PkgRequires)
                            .with_source(p)
                            .with_dep(req),
                    );
                    queue.extend(providers);
                }
            }
        }

        for &con in &s.conflicts {
            for q in pool.for_provides(con) {
                if !self.considered.has(q) {
                    continue;
                }
                if q == p {
                    self.rules.add(
                        Rule::assertion(-p, RuleKind::PkgSelfConflict)
                            .with_source(p)
                            .with_dep(con),
                    );
                } else {
                    self.rules.add(
                        Rule::conflict(p, q, RuleKind::PkgConflicts)
                            .with_source(p)
                            .with_target(q)
                            .with_dep(con),
                    );
                }
            }
        }

        if available {
            for &obs in &s.obsoletes {
                for q in pool.for_provides(obs) {
                    if q == p || !self.considered.has(q) {
                        continue;
                    }
                    if pool.solvable(q).name == s.name {
                        continue;
                    }
                    if !pool.obsolete_uses_provides && !pool.match_nevr(q, obs) {
                        continue;
                    }
                    self.rules.add(
                        Rule::conflict(p, q, RuleKind::PkgObsoletes)
                            .with_source(p)
                            .with_target(q)
                            .with_dep(obs),
                    );
                }
            }

            let same_name = self.name_index.get(&s.name).cloned().unwrap_or_default();
            for q in same_name {
                if q == p || !self.considered.has(q) {
                    continue;
                }
                if self.multiversion.has(p) && self.multiversion.has(q) {
                    continue;
                }
                let kind = if self.installed.has(q) {
                    RuleKind::PkgImplicitObsoletes
                } else {
                    RuleKind::PkgSameName
                };
                self.rules.add(Rule::conflict(p, q, kind).with_source(p).with_target(q));
            }
        }
    }

    /// Expand CLEANDEPS erase targets to the dependencies only they needed.
    fn compute_cleandeps_closure(&mut self) {
        if self.cleandeps_from.is_empty() {
            return;
        }
        let pool = self.sack.pool();
        let mut clean = PackageSet::with_capacity(pool.nsolvables());

        loop {
            let mut changed = false;
            for d in self.installed.iter() {
                if self.erase_targets.has(d) || clean.has(d) || self.userinstalled.has(d) {
                    continue;
                }
                let wanted = self
                    .cleandeps_from
                    .iter()
                    .copied()
                    .chain(clean.iter())
                    .any(|e| requires_provider(pool, e, d));
                if !wanted {
                    continue;
                }
                let erased = |id: SolvableId| self.erase_targets.has(id) || clean.has(id);
                let needed = self.installed.iter().any(|keeper| {
                    keeper != d
                        && !erased(keeper)
                        && requires_without_alternative(pool, keeper, d, &erased, &self.installed)
                });
                if !needed {
                    clean.set(d);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        self.cleandeps = clean;
    }

    // ---- results ----------------------------------------------------------

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn create_transaction(&self) -> Transaction {
        Transaction::from_decisions(self.sack, &self.decisions, &self.multiversion)
    }

    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    pub fn find_all_problem_rules(&self, problem: usize) -> &[RuleId] {
        self.problems.get(problem).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rule_info(&self, rid: RuleId) -> Option<RuleInfo> {
        self.rules.get(rid).map(|rule| RuleInfo {
            kind: rule.kind(),
            source: rule.source,
            target: rule.target,
            dep: rule.dep,
        })
    }

    pub fn all_rule_infos(&self, rid: RuleId) -> Vec<RuleInfo> {
        self.rule_info(rid).into_iter().collect()
    }

    pub fn rule_class(&self, rid: RuleId) -> Option<RuleClass> {
        self.rules.get(rid).map(|r| r.kind().class())
    }

    /// Positive level when the package goes in, negative when it stays out,
    /// zero when untouched.
    pub fn decision_level(&self, id: SolvableId) -> i32 {
        match self.decisions.decision_level(id) {
            Some(level) if self.decisions.decided_install(id) => level.max(1) as i32,
            Some(level) => -(level.max(1) as i32),
            None => 0,
        }
    }

    pub fn describe_decision(&self, id: SolvableId) -> Option<(Reason, Option<RuleId>)> {
        self.decisions.decision_reason(id)
    }

    pub fn decision_queue(&self) -> &[(Literal, Option<RuleId>, Reason)] {
        self.decisions.queue()
    }

    /// Installed packages no user-installed package needs, directly or
    /// transitively through requires and recommends.
    pub fn unneeded(&self) -> Vec<SolvableId> {
        let pool = self.sack.pool();
        let current: Vec<SolvableId> = self
            .installed
            .iter()
            .filter(|&i| self.decisions.decided_install(i))
            .collect();
        let mut reachable = PackageSet::with_capacity(pool.nsolvables());
        let mut worklist: Vec<SolvableId> = current
            .iter()
            .copied()
            .filter(|&i| self.userinstalled.has(i))
            .collect();
        for &id in &worklist {
            reachable.set(id);
        }
        while let Some(p) = worklist.pop() {
            let s = pool.solvable(p);
            for &dep in s.requires.iter().chain(s.recommends.iter()) {
                for q in pool.for_provides(dep) {
                    if self.decisions.decided_install(q)
                        && self.installed.has(q)
                        && !reachable.has(q)
                    {
                        reachable.set(q);
                        worklist.push(q);
                    }
                }
            }
        }
        current.into_iter().filter(|&i| !reachable.has(i)).collect()
    }

    /// Packages erased purely because a cleandeps erasure no longer needs
    /// them.
    pub fn get_cleandeps(&self) -> PackageSet {
        let mut out = self.cleandeps.clone();
        let removed: Vec<SolvableId> =
            out.iter().filter(|&id| !self.decisions.decided_remove(id)).collect();
        for id in removed {
            out.clear(id);
        }
        out
    }

    /// Uninstalled providers of recommends of packages going in.
    pub fn recommendations(&self) -> Vec<SolvableId> {
        self.weak_dep_listing(false)
    }

    /// Uninstalled providers of suggests of packages going in.
    pub fn suggestions(&self) -> Vec<SolvableId> {
        self.weak_dep_listing(true)
    }

    fn weak_dep_listing(&self, suggests: bool) -> Vec<SolvableId> {
        let pool = self.sack.pool();
        let mut out = Vec::new();
        for p in self.decisions.installed_packages() {
            let s = pool.solvable(p);
            let deps = if suggests { &s.suggests } else { &s.recommends };
            for &dep in deps {
                for q in pool.for_provides(dep) {
                    if !self.decisions.decided_install(q)
                        && !self.installed.has(q)
                        && self.considered.has(q)
                        && !out.contains(&q)
                    {
                        out.push(q);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    pub fn multiversion_set(&self) -> &PackageSet {
        &self.multiversion
    }
}

/// Expand a selection entry into concrete solvable ids, masked by the
/// given considered map.
pub(crate) fn expand_entry(
    pool: &crate::pool::Pool,
    considered: &PackageSet,
    entry: &JobEntry,
) -> Vec<SolvableId> {
    match entry.flags.selection() {
        JobFlags::SOLVABLE => vec![entry.what],
        JobFlags::SOLVABLE_ALL => {
            pool.solvable_ids().filter(|&id| considered.has(id)).collect()
        }
        JobFlags::SOLVABLE_REPO => {
            let repo = pool.repo(entry.what);
            (repo.start..repo.end).filter(|&id| considered.has(id)).collect()
        }
        JobFlags::SOLVABLE_ONE_OF => pool
            .id_to_queue(entry.what)
            .into_iter()
            .filter(|&id| considered.has(id))
            .collect(),
        JobFlags::SOLVABLE_NAME => pool
            .solvable_ids()
            .filter(|&id| considered.has(id))
            .filter(|&id| matches_name_selection(pool, id, entry.what))
            .collect(),
        JobFlags::SOLVABLE_PROVIDES => pool
            .for_provides(entry.what)
            .into_iter()
            .filter(|&id| considered.has(id))
            .collect(),
        _ => Vec::new(),
    }
}

/// Does a name-kind selection dep match the solvable, honoring arch and
/// EVR qualifications?
fn matches_name_selection(pool: &crate::pool::Pool, id: SolvableId, dep: DepId) -> bool {
    let s = pool.solvable(id);
    match pool.dep(dep) {
        Dep::Name(name) => s.name == name,
        Dep::Versioned { name, op, evr } => {
            s.name == name
                && crate::pool::intersect_evrs(
                    crate::pool::RelOp::Eq,
                    pool.id2str(s.evr),
                    op,
                    &evr,
                )
        }
        Dep::Arch { base, arch } => s.arch == arch && matches_name_selection(pool, id, base),
        Dep::EvrQual { base, evr, version_only } => {
            let ord = if version_only {
                rusk_evr::vercmp(
                    rusk_evr::Evr::parse(pool.id2str(s.evr)).version,
                    rusk_evr::Evr::parse(&evr).version,
                )
            } else {
                rusk_evr::evrcmp(pool.id2str(s.evr), &evr)
            };
            ord == std::cmp::Ordering::Equal && matches_name_selection(pool, id, base)
        }
        Dep::Rich(_) => false,
    }
}

/// The dep id a selection carries for diagnostics, when it has one.
fn selection_dep(entry: &JobEntry) -> DepId {
    match entry.flags.selection() {
        JobFlags::SOLVABLE_NAME | JobFlags::SOLVABLE_PROVIDES => entry.what,
        _ => 0,
    }
}

fn requires_provider(pool: &crate::pool::Pool, from: SolvableId, provider: SolvableId) -> bool {
    pool.solvable(from)
        .requires
        .iter()
        .any(|&req| pool.for_provides(req).contains(&provider))
}

/// Does `keeper` require `d` with no surviving alternative provider?
fn requires_without_alternative(
    pool: &crate::pool::Pool,
    keeper: SolvableId,
    d: SolvableId,
    erased: &dyn Fn(SolvableId) -> bool,
    installed: &PackageSet,
) -> bool {
    pool.solvable(keeper).requires.iter().any(|&req| {
        let providers = pool.for_provides(req);
        providers.contains(&d)
            && !providers
                .iter()
                .any(|&q| q != d && installed.has(q) && !erased(q))
    })
}
