//! Per-keyname filter routines and the derived query operations.
//!
//! Every routine reads the query's current result set and marks hits in a
//! scratch set; `apply` folds the scratch into the result, honoring NOT.

use std::cmp::Ordering;

use rusk_evr::{evrcmp, Evr};

use crate::goal::Goal;
use crate::package_set::PackageSet;
use crate::pool::{Pool, SolvableId};
use crate::query::filter::{glob_matcher, CmpType, Filter, QueryKey};
use crate::query::{ExcludeFlags, Query};

impl Query<'_> {
    pub(crate) fn filter_pkg(&self, f: &Filter, m: &mut PackageSet) {
        if let Some(pkgs) = f.pkgs() {
            m.union_with(pkgs);
        }
    }

    /// Name matching. Exact matches intern and compare ids; with more than
    /// two patterns the id list is sorted and binary-searched, the linear
    /// scan being faster for the common one-or-two-pattern case.
    pub(crate) fn filter_name(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let cmp = f.cmp;

        if cmp.contains(CmpType::EQ) && !cmp.contains(CmpType::ICASE) {
            if f.strs().len() < 3 {
                for value in f.strs() {
                    let Some(name_id) = pool.lookup_str(value) else { continue };
                    for id in result.iter() {
                        if pool.solvable(id).name == name_id {
                            m.set(id);
                        }
                    }
                }
                return;
            }
            let mut names: Vec<_> = f.strs().iter().filter_map(|v| pool.lookup_str(v)).collect();
            names.sort_unstable();
            for id in result.iter() {
                if names.binary_search(&pool.solvable(id).name).is_ok() {
                    m.set(id);
                }
            }
            return;
        }

        for value in f.strs() {
            let matcher = if cmp.contains(CmpType::GLOB) {
                glob_matcher(value, cmp.contains(CmpType::ICASE))
            } else {
                None
            };
            for id in result.iter() {
                let name = pool.id2str(pool.solvable(id).name);
                let hit = if cmp.contains(CmpType::GLOB) {
                    matcher.as_ref().is_some_and(|g| g.is_match(name))
                } else if cmp.contains(CmpType::SUBSTR) {
                    if cmp.contains(CmpType::ICASE) {
                        name.to_lowercase().contains(&value.to_lowercase())
                    } else {
                        name.contains(value.as_str())
                    }
                } else if cmp.contains(CmpType::EQ) {
                    name.eq_ignore_ascii_case(value)
                } else {
                    false
                };
                if hit {
                    m.set(id);
                }
            }
        }
    }

    pub(crate) fn filter_epoch(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for &epoch in f.nums() {
            for id in result.iter() {
                let evr = pool.id2str(pool.solvable(id).evr);
                let pkg_epoch = Evr::parse(evr).epoch_num() as i64;
                if cmp_hit(pkg_epoch.cmp(&epoch), f.cmp) {
                    m.set(id);
                }
            }
        }
    }

    pub(crate) fn filter_evr(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for value in f.strs() {
            for id in result.iter() {
                let evr = pool.id2str(pool.solvable(id).evr);
                if cmp_hit(evrcmp(evr, value), f.cmp) {
                    m.set(id);
                }
            }
        }
    }

    /// NEVRA glob/equality against the rendered `name[-[0:]evr].arch`,
    /// including the epoch only when the pattern carries one.
    pub(crate) fn filter_nevra_glob(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for pattern in f.strs() {
            if pattern.contains(['(', '/', '=', '<', '>', ' ']) {
                continue;
            }
            let with_epoch = pattern.contains(':');
            let matcher = if f.cmp.contains(CmpType::GLOB) {
                glob_matcher(pattern, f.cmp.contains(CmpType::ICASE))
            } else {
                None
            };
            for id in result.iter() {
                let nevra = pool.solvable_nevra(id, with_epoch);
                let hit = if f.cmp.contains(CmpType::GLOB) {
                    matcher.as_ref().is_some_and(|g| g.is_match(&nevra))
                } else if f.cmp.contains(CmpType::ICASE) {
                    nevra.eq_ignore_ascii_case(pattern)
                } else {
                    nevra == *pattern
                };
                if hit {
                    m.set(id);
                }
            }
        }
    }

    /// Version and release filters. Globs match just the v or r slice;
    /// strict comparisons pad with `-0` / `0-` so the full EVR comparator
    /// can be reused.
    pub(crate) fn filter_version_release(&self, f: &Filter, m: &mut PackageSet, version: bool) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for value in f.strs() {
            let padded = if version { format!("{value}-0") } else { format!("0-{value}") };
            let matcher = if f.cmp.contains(CmpType::GLOB) {
                glob_matcher(value, false)
            } else {
                None
            };
            for id in result.iter() {
                let evr = Evr::parse(pool.id2str(pool.solvable(id).evr));
                let slice = if version { evr.version } else { evr.release };
                if f.cmp.contains(CmpType::GLOB) {
                    if matcher.as_ref().is_some_and(|g| g.is_match(slice)) {
                        m.set(id);
                    }
                    continue;
                }
                let padded_pkg =
                    if version { format!("{slice}-0") } else { format!("0-{slice}") };
                if cmp_hit(evrcmp(&padded_pkg, &padded), f.cmp) {
                    m.set(id);
                }
            }
        }
    }

    pub(crate) fn filter_arch(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for value in f.strs() {
            if f.cmp.contains(CmpType::EQ) {
                let Some(arch_id) = pool.str2archid(value) else { continue };
                for id in result.iter() {
                    if pool.solvable(id).arch == arch_id {
                        m.set(id);
                    }
                }
            } else if f.cmp.contains(CmpType::GLOB) {
                let Some(matcher) = glob_matcher(value, false) else { continue };
                for id in result.iter() {
                    if matcher.is_match(pool.id2str(pool.solvable(id).arch)) {
                        m.set(id);
                    }
                }
            }
        }
    }

    pub(crate) fn filter_sourcerpm(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for value in f.strs() {
            for id in result.iter() {
                let Some(src) = pool.solvable(id).sourcerpm else { continue };
                let srcrpm = pool.id2str(src);
                // cheap first-byte check before the full compare
                if srcrpm.as_bytes().first() != value.as_bytes().first() {
                    continue;
                }
                if srcrpm == value {
                    m.set(id);
                }
            }
        }
    }

    /// Obsoletes against a literal target set: a candidate hits when any of
    /// its obsoletes reldeps has a provider inside the target set. Without
    /// the pool's obsolete-uses-provides flag the provider must also match
    /// the reldep by package name.
    pub(crate) fn filter_obsoletes(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let Some(target) = f.pkgs() else { return };
        self.sack().make_provides_ready();
        for id in result.iter() {
            if obsoletes_target(pool, id, target) {
                m.set(id);
            }
        }
    }

    /// Same as [`filter_obsoletes`], but per name only the installed
    /// candidates and the highest-priority repo group participate.
    pub(crate) fn filter_obsoletes_by_priority(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let Some(target) = f.pkgs() else { return };
        self.sack().make_provides_ready();

        let mut candidates: Vec<SolvableId> = result.iter().collect();
        if candidates.is_empty() {
            return;
        }
        candidates.sort_by(|&a, &b| {
            let sa = pool.solvable(a);
            let sb = pool.solvable(b);
            sa.name
                .cmp(&sb.name)
                .then_with(|| pool.repo_priority(a).cmp(&pool.repo_priority(b)))
        });
        let mut name = 0;
        let mut priority = 0;
        for &id in &candidates {
            let s = pool.solvable(id);
            let is_group_head = name != s.name;
            if pool.is_installed(id) && obsoletes_target(pool, id, target) {
                m.set(id);
            }
            if is_group_head {
                name = s.name;
                priority = pool.repo_priority(id);
                if obsoletes_target(pool, id, target) {
                    m.set(id);
                }
            } else if priority == pool.repo_priority(id) && obsoletes_target(pool, id, target) {
                m.set(id);
            }
        }
    }

    pub(crate) fn filter_provides_reldep(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        self.sack().make_provides_ready();
        for &dep in f.reldeps() {
            for provider in pool.for_provides(dep) {
                m.set(provider);
            }
        }
    }

    /// Requires/conflicts/... matched by reldep intersection against each
    /// candidate's attribute array.
    pub(crate) fn filter_rco_reldep(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let key = f.key.dep_array_key();
        for id in result.iter() {
            let s = pool.solvable(id);
            'candidate: for &filter_dep in f.reldeps() {
                for &dep in s.dep_array(key) {
                    if pool.match_dep(filter_dep, dep) {
                        m.set(id);
                        break 'candidate;
                    }
                }
            }
        }
    }

    /// Requires/conflicts/... matched against concrete target packages: a
    /// candidate hits when one of its deps is satisfied by a target's name
    /// or provides.
    pub(crate) fn filter_dep_solvable(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let Some(targets) = f.pkgs() else { return };
        self.sack().make_provides_ready();
        let key = f.key.dep_array_key();
        for id in result.iter() {
            let s = pool.solvable(id);
            'candidate: for target in targets.iter() {
                for &dep in s.dep_array(key) {
                    if pool.solvable_provides_dep(target, dep) || pool.match_nevr(target, dep) {
                        m.set(id);
                        break 'candidate;
                    }
                }
            }
        }
    }

    pub(crate) fn filter_reponame(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        debug_assert_eq!(f.cmp.without_not(), CmpType::EQ);
        let matched: Vec<bool> = pool
            .repos()
            .iter()
            .map(|repo| f.strs().iter().any(|v| v == &repo.name))
            .collect();
        for id in result.iter() {
            if matched[pool.solvable(id).repo as usize] {
                m.set(id);
            }
        }
    }

    pub(crate) fn filter_location(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        for value in f.strs() {
            for id in result.iter() {
                let Some(location) = pool.solvable(id).location else { continue };
                if pool.id2str(location) == value {
                    m.set(id);
                }
            }
        }
    }

    /// Latest filters: sort into blocks of equal name (and arch, and repo
    /// priority for the by-priority variant) and keep the first `k` distinct
    /// EVRs of each block, or skip the first `-k` when negative. For the
    /// by-priority variant only the best-priority block of each (name, arch)
    /// participates.
    pub(crate) fn filter_latest(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let by_arch = matches!(f.key, QueryKey::LatestPerArch | QueryKey::LatestPerArchByPriority);
        let by_priority = f.key == QueryKey::LatestPerArchByPriority;

        for &latest in f.nums() {
            if latest == 0 {
                continue;
            }
            let mut samename: Vec<SolvableId> = result.iter().collect();
            samename.sort_by(|&a, &b| {
                let sa = pool.solvable(a);
                let sb = pool.solvable(b);
                let mut ord = sa.name.cmp(&sb.name);
                if by_arch {
                    ord = ord.then_with(|| sa.arch.cmp(&sb.arch));
                }
                if by_priority {
                    ord = ord.then_with(|| pool.repo_priority(a).cmp(&pool.repo_priority(b)));
                }
                ord.then_with(|| pool.evrcmp_solvables(b, a)).then_with(|| a.cmp(&b))
            });

            let same_block = |a: SolvableId, b: SolvableId| {
                let sa = pool.solvable(a);
                let sb = pool.solvable(b);
                sa.name == sb.name && (!by_arch || sa.arch == sb.arch)
            };

            let mut start_block: Option<usize> = None;
            let mut make_block = true;
            for i in 0..samename.len() {
                match start_block {
                    None => start_block = Some(i),
                    Some(start) => {
                        if !same_block(samename[start], samename[i]) {
                            if make_block {
                                add_latest_to_map(pool, m, &samename[start..i], latest);
                            }
                            make_block = true;
                            start_block = Some(i);
                        } else if by_priority
                            && make_block
                            && pool.repo_priority(samename[start]) != pool.repo_priority(samename[i])
                        {
                            // lower-priority repo versions of this block are dropped
                            add_latest_to_map(pool, m, &samename[start..i], latest);
                            make_block = false;
                        }
                    }
                }
            }
            if let Some(start) = start_block {
                if make_block {
                    add_latest_to_map(pool, m, &samename[start..], latest);
                }
            }
        }
    }

    /// Upgrades/Downgrades: available candidates that relate to an installed
    /// package of the same name.
    pub(crate) fn filter_updown(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        self.sack().make_provides_ready();
        if pool.installed_repo().is_none() {
            return;
        }
        let down = f.key == QueryKey::Downgrades;
        for &num in f.nums() {
            if num == 0 {
                continue;
            }
            for id in result.iter() {
                if pool.is_installed(id) {
                    continue;
                }
                let related =
                    if down { pool.what_downgrades(id) } else { pool.what_upgrades(id) };
                if related.is_some() {
                    m.set(id);
                }
            }
        }
    }

    /// Upgrades restricted to the best-priority repo group of each name.
    pub(crate) fn filter_updown_by_priority(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        self.sack().make_provides_ready();
        if pool.installed_repo().is_none() {
            return;
        }
        for &num in f.nums() {
            if num == 0 {
                continue;
            }
            let mut candidates: Vec<SolvableId> =
                result.iter().filter(|&id| !pool.is_installed(id)).collect();
            if candidates.is_empty() {
                continue;
            }
            candidates.sort_by(|&a, &b| {
                pool.solvable(a)
                    .name
                    .cmp(&pool.solvable(b).name)
                    .then_with(|| pool.repo_priority(a).cmp(&pool.repo_priority(b)))
            });
            let mut name = 0;
            let mut priority = 0;
            for &id in &candidates {
                let s = pool.solvable(id);
                let in_group = if name != s.name {
                    name = s.name;
                    priority = pool.repo_priority(id);
                    true
                } else {
                    priority == pool.repo_priority(id)
                };
                if in_group && pool.what_upgrades(id).is_some() {
                    m.set(id);
                }
            }
        }
    }

    /// Upgradable/Downgradable: mark the installed counterparts that some
    /// candidate in the current result would upgrade or downgrade.
    pub(crate) fn filter_updown_able(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        self.sack().make_provides_ready();
        if pool.installed_repo().is_none() {
            return;
        }
        let considered = match self.exclude_flags() {
            ExcludeFlags::ApplyExcludes => self.sack().considered(),
            flags => self.sack().considered_for(flags),
        };
        let down = f.key == QueryKey::Downgradable;
        for &num in f.nums() {
            if num == 0 {
                continue;
            }
            for p in pool.solvable_ids() {
                if !considered.has(p) || pool.is_installed(p) {
                    continue;
                }
                let what = if down { pool.what_downgrades(p) } else { pool.what_upgrades(p) };
                if let Some(what) = what {
                    if result.has(what) {
                        m.set(what);
                    }
                }
            }
        }
    }

    /// Fallback attribute search for DESCRIPTION, SUMMARY, URL and FILE.
    pub(crate) fn filter_dataiterator(&self, f: &Filter, m: &mut PackageSet) {
        let pool = self.sack().pool();
        let result = self.result.as_ref().unwrap();
        let icase = f.cmp.contains(CmpType::ICASE);
        for value in f.strs() {
            let matcher =
                if f.cmp.contains(CmpType::GLOB) { glob_matcher(value, icase) } else { None };
            let hit = |text: &str| -> bool {
                if f.cmp.contains(CmpType::GLOB) {
                    matcher.as_ref().is_some_and(|g| g.is_match(text))
                } else if f.cmp.contains(CmpType::SUBSTR) {
                    if icase {
                        text.to_lowercase().contains(&value.to_lowercase())
                    } else {
                        text.contains(value.as_str())
                    }
                } else if icase {
                    text.eq_ignore_ascii_case(value)
                } else {
                    text == value
                }
            };
            for id in result.iter() {
                let s = pool.solvable(id);
                let matched = match f.key {
                    QueryKey::File => s.filelist.iter().any(|&file| hit(pool.id2str(file))),
                    QueryKey::Description => s.description.is_some_and(|d| hit(pool.id2str(d))),
                    QueryKey::Summary => s.summary.is_some_and(|d| hit(pool.id2str(d))),
                    QueryKey::Url => s.url.is_some_and(|d| hit(pool.id2str(d))),
                    _ => false,
                };
                if matched {
                    m.set(id);
                }
            }
        }
    }

    // ---- derived operations ----------------------------------------------

    /// Installed packages whose (name, arch) has no available counterpart.
    /// Regular excludes are ignored on the available side so packages of
    /// non-active modules still count as counterparts.
    pub fn filter_extras(&mut self) {
        self.apply();
        let sack = self.sack();
        let pool = sack.pool();

        let mut installed_query = self.clone();
        installed_query.installed();
        let installed: Vec<SolvableId> = installed_query.run_set().iter().collect();
        let result = self.result.as_mut().unwrap();
        result.clear_all();
        if installed.is_empty() {
            return;
        }

        let mut available =
            Query::with_flags(sack, ExcludeFlags::IgnoreRegularExcludes);
        available.available();
        let mut names_arch: Vec<(i32, i32)> = available
            .run_set()
            .iter()
            .map(|id| {
                let s = pool.solvable(id);
                (s.name, s.arch)
            })
            .collect();
        names_arch.sort_unstable();

        let result = self.result.as_mut().unwrap();
        for id in installed {
            let s = pool.solvable(id);
            if names_arch.binary_search(&(s.name, s.arch)).is_err() {
                result.set(id);
            }
        }
    }

    /// Installed packages present more than once with differing (evr, arch).
    pub fn filter_duplicated(&mut self) {
        self.installed();
        let pool = self.sack().pool();

        let mut samename: Vec<SolvableId> = self.result.as_ref().unwrap().iter().collect();
        samename.sort_by(|&a, &b| {
            pool.solvable(a)
                .name
                .cmp(&pool.solvable(b).name)
                .then_with(|| pool.evrcmp_solvables(b, a))
                .then_with(|| a.cmp(&b))
        });

        let result = self.result.as_mut().unwrap();
        result.clear_all();
        let mut start = 0;
        for i in 1..=samename.len() {
            let block_ends = i == samename.len()
                || pool.solvable(samename[i]).name != pool.solvable(samename[start]).name;
            if block_ends {
                add_duplicates_to_map(pool, result, &samename[start..i]);
                start = i;
            }
        }
    }

    /// Keep only packages built after the cutoff.
    pub fn filter_recent(&mut self, cutoff: u64) {
        self.apply();
        let pool = self.sack().pool();
        let result = self.result.as_mut().unwrap();
        let stale: Vec<SolvableId> =
            result.iter().filter(|&id| pool.solvable(id).buildtime <= cutoff).collect();
        for id in stale {
            result.clear(id);
        }
    }

    /// Restrict to installed packages recorded as user-installed.
    pub fn filter_user_installed(&mut self, user_installed: &PackageSet) {
        self.installed();
        self.result.as_mut().unwrap().intersect_with(user_installed);
    }

    /// Keep the packages a dependency-aware autoremove would drop: run a
    /// throwaway goal with the given user-installed set and intersect with
    /// the solver's unneeded report.
    pub fn filter_unneeded(&mut self, user_installed: &PackageSet) -> crate::Result<()> {
        self.unneeded_or_safe_to_remove(user_installed, false)
    }

    /// Like [`filter_unneeded`], but also treats the query's own packages
    /// as no longer user-installed, answering "what would removing these
    /// leave behind".
    pub fn filter_safe_to_remove(&mut self, user_installed: &PackageSet) -> crate::Result<()> {
        self.unneeded_or_safe_to_remove(user_installed, true)
    }

    fn unneeded_or_safe_to_remove(
        &mut self,
        user_installed: &PackageSet,
        safe_to_remove: bool,
    ) -> crate::Result<()> {
        self.apply();
        let sack = self.sack();

        let mut user = sack.installed_set();
        user.intersect_with(user_installed);
        if safe_to_remove {
            user.subtract(self.result.as_ref().unwrap());
        }

        let mut goal = Goal::new(sack);
        goal.user_installed_set(&user);
        if !goal.run(crate::goal::GoalActions::empty()) {
            return Err(crate::Error::Internal("autoremove goal failed".to_string()));
        }
        let unneeded = goal.list_unneeded()?;
        self.result.as_mut().unwrap().intersect_with(&unneeded);
        Ok(())
    }
}

fn cmp_hit(ord: Ordering, cmp: CmpType) -> bool {
    match ord {
        Ordering::Greater => cmp.contains(CmpType::GT),
        Ordering::Less => cmp.contains(CmpType::LT),
        Ordering::Equal => cmp.contains(CmpType::EQ),
    }
}

fn obsoletes_target(pool: &Pool, id: SolvableId, target: &PackageSet) -> bool {
    let s = pool.solvable(id);
    for &obs in &s.obsoletes {
        for provider in pool.for_provides(obs) {
            if !target.has(provider) {
                continue;
            }
            if !pool.obsolete_uses_provides && !pool.match_nevr(provider, obs) {
                continue;
            }
            return true;
        }
    }
    false
}

/// Mark the first `latest` distinct EVRs of a sorted same-name block, or
/// everything but the first `-latest` when negative.
fn add_latest_to_map(pool: &Pool, m: &mut PackageSet, block: &[SolvableId], latest: i64) {
    if block.is_empty() {
        return;
    }
    let mut version_counter: i64 = 0;
    let mut previous_evr = pool.solvable(block[0]).evr;
    for &id in block {
        let current_evr = pool.solvable(id).evr;
        if previous_evr != current_evr {
            version_counter += 1;
            previous_evr = current_evr;
        }
        if latest > 0 {
            if version_counter >= latest {
                return;
            }
        } else if version_counter < -latest {
            continue;
        }
        m.set(id);
    }
}

/// Within a same-name block, set every pair that differs in (evr, arch)
/// beyond a plain arch split of the same EVR.
fn add_duplicates_to_map(pool: &Pool, result: &mut PackageSet, block: &[SolvableId]) {
    for (pos, &first) in block.iter().enumerate() {
        for &second in &block[pos + 1..] {
            let s1 = pool.solvable(first);
            let s2 = pool.solvable(second);
            if s1.evr == s2.evr && s1.arch != s2.arch {
                continue;
            }
            result.set(first);
            result.set(second);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CmpType;
    use crate::sack::{PackageDef, Sack};

    fn latest_sack() -> Sack {
        let mut sack = Sack::new();
        sack.add_repo(
            "fedora",
            99,
            false,
            vec![
                PackageDef::new("foo", "1-1", "i686"),
                PackageDef::new("foo", "2-1", "i686"),
                PackageDef::new("foo", "1-1", "x86_64"),
                PackageDef::new("foo", "2-1", "x86_64"),
                PackageDef::new("foo", "3-1", "x86_64"),
            ],
        );
        sack
    }

    #[test]
    fn test_latest_per_arch_keep_one() {
        let sack = latest_sack();
        let mut query = Query::new(&sack);
        query.add_filter_num(QueryKey::LatestPerArch, CmpType::EQ, 1).unwrap();
        // foo-2.i686 and foo-3.x86_64
        assert_eq!(query.run_ids(), vec![2, 5]);
    }

    #[test]
    fn test_latest_per_arch_skip_newest() {
        let sack = latest_sack();
        let mut query = Query::new(&sack);
        query.add_filter_num(QueryKey::LatestPerArch, CmpType::EQ, -1).unwrap();
        // everything but the newest of each arch block
        assert_eq!(query.run_ids(), vec![1, 3, 4]);
    }

    #[test]
    fn test_latest_ignoring_arch() {
        let sack = latest_sack();
        let mut query = Query::new(&sack);
        query.add_filter_num(QueryKey::Latest, CmpType::EQ, 1).unwrap();
        // the single highest EVR across arches
        assert_eq!(query.run_ids(), vec![5]);
    }

    #[test]
    fn test_latest_distinct_evr_counting() {
        let mut sack = Sack::new();
        sack.add_repo(
            "fedora",
            99,
            false,
            vec![
                PackageDef::new("bar", "2-1", "i686"),
                PackageDef::new("bar", "2-1", "x86_64"),
                PackageDef::new("bar", "1-1", "x86_64"),
            ],
        );
        let mut query = Query::new(&sack);
        query.add_filter_num(QueryKey::Latest, CmpType::EQ, 1).unwrap();
        // both arch variants of the newest EVR count as one version
        assert_eq!(query.run_ids(), vec![1, 2]);
    }

    #[test]
    fn test_upgrades_and_upgradable() {
        let mut sack = Sack::new();
        sack.add_repo(
            "@System",
            99,
            true,
            vec![PackageDef::new("foo", "1-1", "x86_64")],
        );
        sack.add_repo(
            "updates",
            99,
            false,
            vec![
                PackageDef::new("foo", "2-1", "x86_64"),
                PackageDef::new("foo", "0.5-1", "x86_64"),
            ],
        );

        let mut upgrades = Query::new(&sack);
        upgrades.add_filter_num(QueryKey::Upgrades, CmpType::EQ, 1).unwrap();
        assert_eq!(upgrades.run_ids(), vec![2]);

        let mut downgrades = Query::new(&sack);
        downgrades.add_filter_num(QueryKey::Downgrades, CmpType::EQ, 1).unwrap();
        assert_eq!(downgrades.run_ids(), vec![3]);

        let mut upgradable = Query::new(&sack);
        upgradable.add_filter_num(QueryKey::Upgradable, CmpType::EQ, 1).unwrap();
        assert_eq!(upgradable.run_ids(), vec![1]);
    }

    #[test]
    fn test_provides_and_requires_filters() {
        let mut sack = Sack::new();
        let mut webserver = PackageDef::new("webserver", "1.0-1", "x86_64");
        webserver.provides.push("httpd-service = 1.0".to_string());
        let mut site = PackageDef::new("site", "1.0-1", "noarch");
        site.requires.push("httpd-service >= 0.5".to_string());
        sack.add_repo("fedora", 99, false, vec![webserver, site]);

        let mut provides = Query::new(&sack);
        provides
            .add_filter_str(QueryKey::Provides, CmpType::EQ, "httpd-service >= 0.9")
            .unwrap();
        assert_eq!(provides.run_ids(), vec![1]);

        let mut requires = Query::new(&sack);
        requires
            .add_filter_str(QueryKey::Requires, CmpType::EQ, "httpd-service")
            .unwrap();
        assert_eq!(requires.run_ids(), vec![2]);
    }

    #[test]
    fn test_obsoletes_pkg_filter() {
        let mut sack = Sack::new();
        let mut new_pkg = PackageDef::new("newtool", "2.0-1", "x86_64");
        new_pkg.obsoletes.push("oldtool < 2.0".to_string());
        sack.add_repo("@System", 99, true, vec![PackageDef::new("oldtool", "1.0-1", "x86_64")]);
        sack.add_repo("fedora", 99, false, vec![new_pkg]);

        let mut installed = Query::new(&sack);
        installed.installed();
        let target = installed.run_set().clone();

        let mut query = Query::new(&sack);
        query.add_filter_pkgs(QueryKey::Obsoletes, CmpType::EQ, &target).unwrap();
        assert_eq!(query.run_ids(), vec![2]);
    }

    #[test]
    fn test_file_filter() {
        let mut sack = Sack::new();
        let mut pkg = PackageDef::new("grep", "3.1-1", "x86_64");
        pkg.filelist.push("/usr/bin/grep".to_string());
        sack.add_repo("fedora", 99, false, vec![pkg]);

        let mut query = Query::new(&sack);
        query.add_filter_str(QueryKey::File, CmpType::EQ, "/usr/bin/grep").unwrap();
        assert_eq!(query.run_ids(), vec![1]);

        let mut glob = Query::new(&sack);
        glob.add_filter_str(QueryKey::File, CmpType::GLOB, "/usr/bin/gr*").unwrap();
        assert_eq!(glob.run_ids(), vec![1]);
    }

    #[test]
    fn test_extras() {
        let mut sack = Sack::new();
        sack.add_repo(
            "@System",
            99,
            true,
            vec![
                PackageDef::new("shipped", "1-1", "x86_64"),
                PackageDef::new("localonly", "1-1", "x86_64"),
            ],
        );
        sack.add_repo("fedora", 99, false, vec![PackageDef::new("shipped", "1-1", "x86_64")]);

        let mut query = Query::new(&sack);
        query.filter_extras();
        assert_eq!(query.run_ids(), vec![2]);
    }

    #[test]
    fn test_duplicated() {
        let mut sack = Sack::new();
        sack.add_repo(
            "@System",
            99,
            true,
            vec![
                PackageDef::new("kernel", "1-1", "x86_64"),
                PackageDef::new("kernel", "2-1", "x86_64"),
                PackageDef::new("single", "1-1", "x86_64"),
            ],
        );
        let mut query = Query::new(&sack);
        query.filter_duplicated();
        assert_eq!(query.run_ids(), vec![1, 2]);
    }

    #[test]
    fn test_recent() {
        let mut sack = Sack::new();
        let mut old = PackageDef::new("old", "1-1", "x86_64");
        old.buildtime = 100;
        let mut fresh = PackageDef::new("fresh", "1-1", "x86_64");
        fresh.buildtime = 1000;
        sack.add_repo("fedora", 99, false, vec![old, fresh]);

        let mut query = Query::new(&sack);
        query.filter_recent(500);
        assert_eq!(query.run_ids(), vec![2]);
    }
}
