//! The transaction: package state transitions derived from solver
//! decisions.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::package_set::PackageSet;
use crate::pool::SolvableId;
use crate::sack::Sack;
use crate::solver::decisions::Decisions;

bitflags! {
    /// View modes for [`Transaction::transaction_type`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransactionMode: u32 {
        const SHOW_OBSOLETES      = 1 << 0;
        const CHANGE_IS_REINSTALL = 1 << 1;
        const SHOW_ACTIVE         = 1 << 2;
        const SHOW_ALL            = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    Install,
    Reinstall,
    Upgrade,
    Downgrade,
    /// Incoming package replacing differently-named installed packages.
    Obsoletes,
    Erase,
    /// Installed package replaced by a differently-named incoming one.
    Obsoleted,
}

#[derive(Debug, Clone, Copy)]
pub struct TransactionStep {
    pub id: SolvableId,
    pub step_type: StepType,
}

/// Derived invariants: every incoming step id is available, every
/// ERASE/OBSOLETED id is installed.
#[derive(Debug, Default)]
pub struct Transaction {
    steps: Vec<TransactionStep>,
    /// incoming id -> differently-named installed packages it replaces
    obsoleted_by: HashMap<SolvableId, Vec<SolvableId>>,
    /// incoming id -> same-name installed package it upgrades/downgrades
    replaced: HashMap<SolvableId, SolvableId>,
}

impl Transaction {
    /// Derive steps from solver decisions. Installed packages decided out
    /// become erasures unless an incoming package claims them; incoming
    /// packages classify by their claimed counterpart's EVR. Multiversion
    /// packages never claim a counterpart, so their old versions show up as
    /// plain erasures.
    pub(crate) fn from_decisions(
        sack: &Sack,
        decisions: &Decisions,
        multiversion: &PackageSet,
    ) -> Self {
        let pool = sack.pool();
        let noarch = pool.lookup_str("noarch");

        let mut outgoing: Vec<SolvableId> = Vec::new();
        if let Some(repo_id) = pool.installed_repo() {
            let repo = pool.repo(repo_id);
            for id in repo.start..repo.end {
                if decisions.decided_remove(id) {
                    outgoing.push(id);
                }
            }
        }
        let incoming: Vec<SolvableId> = pool
            .solvable_ids()
            .filter(|&id| !pool.is_installed(id) && decisions.decided_install(id))
            .collect();

        let mut tx = Transaction::default();
        let mut claimed: HashMap<SolvableId, SolvableId> = HashMap::new();

        for &a in &incoming {
            let s = pool.solvable(a);

            // identical package still installed and kept: nothing changes
            let unchanged = pool.installed_repo().is_some_and(|repo_id| {
                let repo = pool.repo(repo_id);
                (repo.start..repo.end).any(|i| {
                    let si = pool.solvable(i);
                    si.name == s.name
                        && si.evr == s.evr
                        && si.arch == s.arch
                        && decisions.decided_install(i)
                })
            });
            if unchanged {
                continue;
            }

            let counterpart = if multiversion.has(a) {
                None
            } else {
                outgoing
                    .iter()
                    .copied()
                    .filter(|&i| !claimed.contains_key(&i))
                    .filter(|&i| {
                        let si = pool.solvable(i);
                        si.name == s.name
                            && (si.arch == s.arch
                                || Some(si.arch) == noarch
                                || Some(s.arch) == noarch)
                    })
                    .max_by(|&x, &y| pool.evrcmp_solvables(x, y))
            };

            let step_type = match counterpart {
                Some(i) => {
                    claimed.insert(i, a);
                    tx.replaced.insert(a, i);
                    match pool.evrcmp_solvables(a, i) {
                        std::cmp::Ordering::Greater => StepType::Upgrade,
                        std::cmp::Ordering::Less => StepType::Downgrade,
                        std::cmp::Ordering::Equal => StepType::Reinstall,
                    }
                }
                None => StepType::Install,
            };
            tx.steps.push(TransactionStep { id: a, step_type });
        }

        for &i in &outgoing {
            if claimed.contains_key(&i) {
                // replaced by the same name; shown through the incoming step
                continue;
            }
            let obsoleter = incoming.iter().copied().find(|&a| {
                let sa = pool.solvable(a);
                sa.name != pool.solvable(i).name
                    && sa.obsoletes.iter().any(|&obs| {
                        pool.solvable_provides_dep(i, obs)
                            && (pool.obsolete_uses_provides || pool.match_nevr(i, obs))
                    })
            });
            match obsoleter {
                Some(a) => {
                    tx.obsoleted_by.entry(a).or_default().push(i);
                    tx.steps.push(TransactionStep { id: i, step_type: StepType::Obsoleted });
                }
                None => tx.steps.push(TransactionStep { id: i, step_type: StepType::Erase }),
            }
        }

        tx
    }

    pub fn steps(&self) -> &[TransactionStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The view type of a step under the given mode. With SHOW_OBSOLETES an
    /// incoming install that replaces differently-named packages reads as
    /// OBSOLETES.
    pub fn transaction_type(&self, id: SolvableId, mode: TransactionMode) -> Option<StepType> {
        let step = self.steps.iter().find(|s| s.id == id)?;
        let mut step_type = step.step_type;
        if step_type == StepType::Install
            && mode.contains(TransactionMode::SHOW_OBSOLETES)
            && self.obsoleted_by.contains_key(&id)
        {
            step_type = StepType::Obsoletes;
        }
        Some(step_type)
    }

    /// Every installed package the incoming `id` pushes out: its same-name
    /// counterpart plus everything it obsoletes.
    pub fn all_obs_pkgs(&self, id: SolvableId) -> Vec<SolvableId> {
        let mut out = Vec::new();
        if let Some(&replaced) = self.replaced.get(&id) {
            out.push(replaced);
        }
        if let Some(obsoleted) = self.obsoleted_by.get(&id) {
            out.extend_from_slice(obsoleted);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sack::{PackageDef, Sack};
    use crate::solver::decisions::Reason;

    fn decide(decisions: &mut Decisions, literal: i32) {
        decisions.decide(literal, None, Reason::Unit);
    }

    fn upgrade_sack() -> Sack {
        let mut sack = Sack::new();
        sack.add_repo("@System", 99, true, vec![PackageDef::new("foo", "1-1", "x86_64")]);
        sack.add_repo("updates", 99, false, vec![PackageDef::new("foo", "2-1", "x86_64")]);
        sack
    }

    #[test]
    fn test_plain_install() {
        let mut sack = Sack::new();
        sack.add_repo("fedora", 99, false, vec![PackageDef::new("foo", "1-1", "x86_64")]);
        let mut decisions = Decisions::new();
        decide(&mut decisions, 1);

        let tx = Transaction::from_decisions(&sack, &decisions, &PackageSet::new());
        assert_eq!(tx.steps().len(), 1);
        assert_eq!(tx.steps()[0].step_type, StepType::Install);
    }

    #[test]
    fn test_upgrade_pairs_old_and_new() {
        let sack = upgrade_sack();
        let mut decisions = Decisions::new();
        decide(&mut decisions, -1);
        decide(&mut decisions, 2);

        let tx = Transaction::from_decisions(&sack, &decisions, &PackageSet::new());
        assert_eq!(tx.steps().len(), 1);
        assert_eq!(tx.steps()[0].step_type, StepType::Upgrade);
        assert_eq!(tx.all_obs_pkgs(2), vec![1]);
    }

    #[test]
    fn test_erase_without_replacement() {
        let sack = upgrade_sack();
        let mut decisions = Decisions::new();
        decide(&mut decisions, -1);

        let tx = Transaction::from_decisions(&sack, &decisions, &PackageSet::new());
        assert_eq!(tx.steps().len(), 1);
        assert_eq!(tx.steps()[0].step_type, StepType::Erase);
    }

    #[test]
    fn test_multiversion_does_not_pair() {
        let sack = upgrade_sack();
        let mut decisions = Decisions::new();
        decide(&mut decisions, -1);
        decide(&mut decisions, 2);
        let mut multiversion = PackageSet::new();
        multiversion.set(1);
        multiversion.set(2);

        let tx = Transaction::from_decisions(&sack, &decisions, &multiversion);
        let types: Vec<_> = tx.steps().iter().map(|s| s.step_type).collect();
        assert!(types.contains(&StepType::Install));
        assert!(types.contains(&StepType::Erase));
    }

    #[test]
    fn test_obsoleted_by_different_name() {
        let mut sack = Sack::new();
        sack.add_repo("@System", 99, true, vec![PackageDef::new("oldtool", "1-1", "x86_64")]);
        let mut newtool = PackageDef::new("newtool", "2-1", "x86_64");
        newtool.obsoletes.push("oldtool < 2".to_string());
        sack.add_repo("fedora", 99, false, vec![newtool]);

        let mut decisions = Decisions::new();
        decide(&mut decisions, -1);
        decide(&mut decisions, 2);

        let tx = Transaction::from_decisions(&sack, &decisions, &PackageSet::new());
        assert_eq!(
            tx.transaction_type(2, TransactionMode::SHOW_OBSOLETES),
            Some(StepType::Obsoletes)
        );
        assert_eq!(
            tx.transaction_type(1, TransactionMode::SHOW_OBSOLETES),
            Some(StepType::Obsoleted)
        );
        assert_eq!(tx.all_obs_pkgs(2), vec![1]);
    }

    #[test]
    fn test_unchanged_package_produces_no_step() {
        let sack = upgrade_sack();
        let mut decisions = Decisions::new();
        // same nevra would be a reinstall; here the installed copy stays
        decide(&mut decisions, 1);

        let tx = Transaction::from_decisions(&sack, &decisions, &PackageSet::new());
        assert!(tx.is_empty());
    }
}
