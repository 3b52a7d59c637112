//! The query engine: a compositional filter pipeline over the package
//! universe.
//!
//! A query is a lazy plan. `add_filter_*` appends filters after validating
//! them against the keyname's family; `apply` materializes the result set
//! and clears the filter list. Any mutation invalidates a previous apply.

mod advisory;
pub mod filter;
mod matchers;

use rusk_evr::{Form, Nevra, FORMS_MOST_SPEC};

pub use filter::{CmpType, Filter, Match, QueryKey};

use crate::error::{Error, Result};
use crate::package_set::PackageSet;
use crate::pool::{DepId, RelOp, SolvableId};
use crate::sack::Sack;

/// Which exclude masks an individual query honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcludeFlags {
    #[default]
    ApplyExcludes,
    IgnoreRegularExcludes,
    IgnoreModularExcludes,
    IgnoreExcludes,
}

#[derive(Clone)]
pub struct Query<'a> {
    sack: &'a Sack,
    flags: ExcludeFlags,
    filters: Vec<Filter>,
    pub(crate) result: Option<PackageSet>,
    applied: bool,
}

impl<'a> Query<'a> {
    pub fn new(sack: &'a Sack) -> Self {
        Self::with_flags(sack, ExcludeFlags::ApplyExcludes)
    }

    pub fn with_flags(sack: &'a Sack, flags: ExcludeFlags) -> Self {
        Self { sack, flags, filters: Vec::new(), result: None, applied: false }
    }

    pub fn sack(&self) -> &'a Sack {
        self.sack
    }

    pub(crate) fn exclude_flags(&self) -> ExcludeFlags {
        self.flags
    }

    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Reset to the freshly-created state.
    pub fn clear(&mut self) {
        self.applied = false;
        self.result = None;
        self.filters.clear();
    }

    // ---- add_filter -------------------------------------------------------

    pub fn add_filter_num(&mut self, key: QueryKey, cmp: CmpType, value: i64) -> Result<()> {
        self.add_filter_nums(key, cmp, &[value])
    }

    pub fn add_filter_nums(&mut self, key: QueryKey, cmp: CmpType, values: &[i64]) -> Result<()> {
        filter::valid_filter_num(key, cmp)?;
        self.applied = false;
        self.filters.push(Filter { key, cmp, matches: Match::Nums(values.to_vec()) });
        Ok(())
    }

    pub fn add_filter_pkgs(&mut self, key: QueryKey, cmp: CmpType, pkgs: &PackageSet) -> Result<()> {
        filter::valid_filter_pkg(key, cmp)?;
        self.applied = false;
        self.filters.push(Filter { key, cmp, matches: Match::Pkgs(pkgs.clone()) });
        Ok(())
    }

    pub fn add_filter_reldep(&mut self, key: QueryKey, dep: DepId) -> Result<()> {
        filter::valid_filter_reldep(key)?;
        self.applied = false;
        self.filters.push(Filter { key, cmp: CmpType::EQ, matches: Match::Reldeps(vec![dep]) });
        Ok(())
    }

    /// An empty reldep list forces an empty query, matching nothing.
    pub fn add_filter_reldeps(&mut self, key: QueryKey, deps: Vec<DepId>) -> Result<()> {
        filter::valid_filter_reldep(key)?;
        self.applied = false;
        if deps.is_empty() {
            self.force_empty();
        } else {
            self.filters.push(Filter { key, cmp: CmpType::EQ, matches: Match::Reldeps(deps) });
        }
        Ok(())
    }

    pub fn add_filter_str(&mut self, key: QueryKey, cmp: CmpType, value: &str) -> Result<()> {
        self.add_filter_strs(key, cmp, &[value])
    }

    pub fn add_filter_strs(&mut self, key: QueryKey, cmp: CmpType, values: &[&str]) -> Result<()> {
        if key == QueryKey::NevraStrict {
            if !cmp.intersects(CmpType::EQ | CmpType::GT | CmpType::LT) {
                return Err(Error::BadQuery("NEVRA_STRICT needs EQ, GT or LT".to_string()));
            }
            self.apply();
            self.filter_nevra_strict(cmp, values);
            return Ok(());
        }

        // GLOB without a wildcard downgrades to EQ
        let mut cmp = cmp;
        if cmp.contains(CmpType::GLOB) && !values.iter().any(|v| filter::is_glob_pattern(v)) {
            cmp = (cmp & !CmpType::GLOB) | CmpType::EQ;
        }
        filter::valid_filter_str(key, cmp)?;
        self.applied = false;

        if key.is_reldep_key() {
            return self.add_reldep_filter_from_strs(key, cmp, values);
        }

        let values: Vec<String> = if key == QueryKey::File {
            // trailing slash on a file pattern is noise
            values
                .iter()
                .map(|v| v.strip_suffix('/').filter(|s| !s.is_empty()).unwrap_or(v).to_string())
                .collect()
        } else {
            values.iter().map(|v| v.to_string()).collect()
        };
        self.filters.push(Filter { key, cmp, matches: Match::Strs(values) });
        Ok(())
    }

    /// String matches against reldep keynames turn into interned reldeps; a
    /// pattern naming nothing in the pool forces an empty query.
    fn add_reldep_filter_from_strs(
        &mut self,
        key: QueryKey,
        cmp: CmpType,
        values: &[&str],
    ) -> Result<()> {
        let mut deps = Vec::new();
        if cmp.without_not() == CmpType::GLOB {
            for value in values {
                deps.extend(self.reldeps_matching_glob(value));
            }
        } else {
            for value in values {
                deps.extend(self.dep_from_str(value));
            }
        }
        if deps.is_empty() {
            self.force_empty();
            return Ok(());
        }
        self.filters.push(Filter { key, cmp: CmpType::EQ, matches: Match::Reldeps(deps) });
        Ok(())
    }

    /// Apply each field of a parsed NEVRA as a glob filter.
    pub fn add_filter_nevra(&mut self, nevra: &Nevra, icase: bool) -> Result<()> {
        let glob = if icase { CmpType::GLOB | CmpType::ICASE } else { CmpType::GLOB };
        if !nevra.name.is_empty() && nevra.name != "*" {
            self.add_filter_str(QueryKey::Name, glob, &nevra.name)?;
        }
        if let Some(epoch) = nevra.epoch {
            self.add_filter_num(QueryKey::Epoch, CmpType::EQ, epoch as i64)?;
        }
        if !nevra.version.is_empty() && nevra.version != "*" {
            self.add_filter_str(QueryKey::Version, CmpType::GLOB, &nevra.version)?;
        }
        if !nevra.release.is_empty() && nevra.release != "*" {
            self.add_filter_str(QueryKey::Release, CmpType::GLOB, &nevra.release)?;
        }
        if !nevra.arch.is_empty() && nevra.arch != "*" {
            self.add_filter_str(QueryKey::Arch, CmpType::GLOB, &nevra.arch)?;
        }
        Ok(())
    }

    fn force_empty(&mut self) {
        self.filters.push(Filter {
            key: QueryKey::Empty,
            cmp: CmpType::EQ,
            matches: Match::Nums(vec![1]),
        });
    }

    /// Parse `name [op evr]` against the pool without creating new strings;
    /// an unknown name can provide nothing and yields `None`.
    fn dep_from_str(&self, s: &str) -> Option<DepId> {
        let pool = self.sack.pool();
        let s = s.trim();
        if s.starts_with('(') {
            return None;
        }
        for (token, op) in [
            (" <= ", RelOp::Le),
            (" >= ", RelOp::Ge),
            (" < ", RelOp::Lt),
            (" > ", RelOp::Gt),
            (" = ", RelOp::Eq),
        ] {
            if let Some(pos) = s.find(token) {
                let name = pool.lookup_str(&s[..pos])?;
                return Some(pool.rel2id(name, Some(op), s[pos + token.len()..].trim()));
            }
        }
        let name = pool.lookup_str(s)?;
        Some(pool.rel2id(name, None, ""))
    }

    /// Expand a glob over every name known to the provides index.
    fn reldeps_matching_glob(&self, pattern: &str) -> Vec<DepId> {
        let Some(matcher) = filter::glob_matcher(pattern, false) else {
            return Vec::new();
        };
        let pool = self.sack.pool();
        pool.make_provides_ready();
        let mut deps = Vec::new();
        for (id, s) in pool.strings() {
            if matcher.is_match(s) && !pool.for_provides(pool.rel2id(id, None, "")).is_empty() {
                deps.push(pool.rel2id(id, None, ""));
            }
        }
        deps
    }

    // ---- apply ------------------------------------------------------------

    /// Materialize the result. Filters fold into the result in order; a NOT
    /// filter subtracts its matches, anything else intersects.
    pub fn apply(&mut self) {
        if self.applied {
            return;
        }
        if self.result.is_none() {
            self.init_result();
        }
        let filters = std::mem::take(&mut self.filters);
        let mut m = PackageSet::with_capacity(self.sack.pool().nsolvables());
        for f in &filters {
            m.clear_all();
            self.dispatch_filter(f, &mut m);
            let result = self.result.as_mut().unwrap();
            if f.cmp.contains(CmpType::NOT) {
                result.subtract(&m);
            } else {
                result.intersect_with(&m);
            }
        }
        self.applied = true;
    }

    fn dispatch_filter(&self, f: &Filter, m: &mut PackageSet) {
        match f.key {
            // All and Empty leave m untouched; Empty & EQ empties the result
            QueryKey::All | QueryKey::Empty => {}
            QueryKey::Pkg => self.filter_pkg(f, m),
            QueryKey::Name => self.filter_name(f, m),
            QueryKey::Epoch => self.filter_epoch(f, m),
            QueryKey::Evr => self.filter_evr(f, m),
            QueryKey::Nevra => self.filter_nevra_glob(f, m),
            QueryKey::Version => self.filter_version_release(f, m, true),
            QueryKey::Release => self.filter_version_release(f, m, false),
            QueryKey::Arch => self.filter_arch(f, m),
            QueryKey::Sourcerpm => self.filter_sourcerpm(f, m),
            QueryKey::Obsoletes => match &f.matches {
                Match::Reldeps(_) => self.filter_rco_reldep(f, m),
                _ => self.filter_obsoletes(f, m),
            },
            QueryKey::ObsoletesByPriority => self.filter_obsoletes_by_priority(f, m),
            QueryKey::Provides => match &f.matches {
                Match::Reldeps(_) => self.filter_provides_reldep(f, m),
                _ => self.filter_dep_solvable(f, m),
            },
            QueryKey::Conflicts
            | QueryKey::Enhances
            | QueryKey::Recommends
            | QueryKey::Requires
            | QueryKey::Suggests
            | QueryKey::Supplements => match &f.matches {
                Match::Reldeps(_) => self.filter_rco_reldep(f, m),
                _ => self.filter_dep_solvable(f, m),
            },
            QueryKey::Reponame => self.filter_reponame(f, m),
            QueryKey::Location => self.filter_location(f, m),
            QueryKey::Advisory
            | QueryKey::AdvisoryBug
            | QueryKey::AdvisoryCve
            | QueryKey::AdvisorySeverity
            | QueryKey::AdvisoryType => self.filter_advisory(f, m, f.key),
            QueryKey::Latest | QueryKey::LatestPerArch | QueryKey::LatestPerArchByPriority => {
                self.filter_latest(f, m)
            }
            QueryKey::Upgradable | QueryKey::Downgradable => self.filter_updown_able(f, m),
            QueryKey::Upgrades | QueryKey::Downgrades => self.filter_updown(f, m),
            QueryKey::UpgradesByPriority => self.filter_updown_by_priority(f, m),
            QueryKey::NevraStrict => {
                // handled immediately at add_filter time
            }
            QueryKey::Description | QueryKey::Summary | QueryKey::Url | QueryKey::File => {
                self.filter_dataiterator(f, m)
            }
        }
    }

    fn init_result(&mut self) {
        let mut set = self.sack.pkg_solvables_set();
        match self.flags {
            ExcludeFlags::ApplyExcludes => {
                self.sack.recompute_considered();
                set.intersect_with(&self.sack.considered());
            }
            flags => {
                set.intersect_with(&self.sack.considered_for(flags));
            }
        }
        self.result = Some(set);
    }

    // ---- results ----------------------------------------------------------

    /// Apply and borrow the result set.
    pub fn run_set(&mut self) -> &PackageSet {
        self.apply();
        self.result.as_ref().unwrap()
    }

    /// Apply and collect the matching ids in ascending order.
    pub fn run_ids(&mut self) -> Vec<SolvableId> {
        self.run_set().iter().collect()
    }

    /// The result of a previous apply, if any.
    pub fn result_set(&self) -> Option<&PackageSet> {
        self.result.as_ref()
    }

    pub fn size(&mut self) -> usize {
        self.run_set().size()
    }

    pub fn is_empty(&mut self) -> bool {
        self.run_set().is_empty()
    }

    // ---- set algebra ------------------------------------------------------

    pub fn union(&mut self, other: &mut Query<'_>) {
        self.apply();
        other.apply();
        self.result.as_mut().unwrap().union_with(other.result.as_ref().unwrap());
    }

    pub fn intersection(&mut self, other: &mut Query<'_>) {
        self.apply();
        other.apply();
        self.result.as_mut().unwrap().intersect_with(other.result.as_ref().unwrap());
    }

    pub fn difference(&mut self, other: &mut Query<'_>) {
        self.apply();
        other.apply();
        self.result.as_mut().unwrap().subtract(other.result.as_ref().unwrap());
    }

    // ---- repo restriction -------------------------------------------------

    /// Restrict to the installed repo.
    pub fn installed(&mut self) {
        self.apply();
        let installed = self.sack.installed_set();
        self.result.as_mut().unwrap().intersect_with(&installed);
    }

    /// Exclude the installed repo.
    pub fn available(&mut self) {
        self.apply();
        let installed = self.sack.installed_set();
        self.result.as_mut().unwrap().subtract(&installed);
    }

    // ---- subject resolution -----------------------------------------------

    /// Interpret a user-supplied subject string. NEVRA forms are tried in
    /// order, restoring the pre-filter state between attempts; failing all,
    /// fall back to a nevra glob, a provides glob, then a file glob for
    /// path-shaped subjects. Returns whether anything matched and the
    /// parsed NEVRA when a form match won.
    pub fn filter_subject(
        &mut self,
        subject: &str,
        forms: Option<&[Form]>,
        icase: bool,
        with_nevra: bool,
        with_provides: bool,
        with_filenames: bool,
    ) -> (bool, Option<Nevra>) {
        self.apply();
        let orig = self.clone();

        if with_nevra {
            let try_forms = forms.unwrap_or(FORMS_MOST_SPEC);
            for &form in try_forms {
                if let Some(nevra) = Nevra::parse(subject, form) {
                    if self.add_filter_nevra(&nevra, icase).is_ok() && !self.is_empty() {
                        return (true, Some(nevra));
                    }
                    self.restore_from(&orig);
                }
            }
            if forms.is_none() {
                self.restore_from(&orig);
                let _ = self.add_filter_str(QueryKey::Nevra, CmpType::GLOB, subject);
                if !self.is_empty() {
                    return (true, None);
                }
            }
        }

        if with_provides {
            self.restore_from(&orig);
            let _ = self.add_filter_str(QueryKey::Provides, CmpType::GLOB, subject);
            if !self.is_empty() {
                return (true, None);
            }
        }

        if with_filenames && (subject.starts_with('/') || subject.starts_with("*/")) {
            self.restore_from(&orig);
            let _ = self.add_filter_str(QueryKey::File, CmpType::GLOB, subject);
            if !self.is_empty() {
                return (true, None);
            }
        }

        self.restore_from(&orig);
        self.force_empty();
        self.apply();
        (false, None)
    }

    fn restore_from(&mut self, orig: &Query<'a>) {
        self.filters = orig.filters.clone();
        self.result = orig.result.clone();
        self.applied = orig.applied;
    }

    // ---- NEVRA_STRICT -----------------------------------------------------

    /// Applied immediately: needs the pre-applied result and custom
    /// comparators. Patterns must carry both `-` separators and an arch
    /// suffix; leading-zero epochs are stripped.
    fn filter_nevra_strict(&mut self, cmp: CmpType, patterns: &[&str]) {
        let pool = self.sack.pool();
        let create_evr_id = !cmp.intersects(CmpType::LT | CmpType::GT);

        let mut compare_set: Vec<NevraId> = patterns
            .iter()
            .filter_map(|p| NevraId::parse(self.sack, p, create_evr_id))
            .collect();
        let result = self.result.as_mut().unwrap();
        if compare_set.is_empty() {
            if !cmp.contains(CmpType::NOT) {
                result.clear_all();
            }
            return;
        }

        let mut matched = PackageSet::with_capacity(pool.nsolvables());
        if create_evr_id {
            compare_set.sort_unstable_by_key(|n| (n.name, n.arch, n.evr));
            for id in result.iter() {
                let s = pool.solvable(id);
                let probe = (s.name, s.arch, s.evr);
                let idx = compare_set.partition_point(|n| (n.name, n.arch, n.evr) < probe);
                if compare_set.get(idx).map(|n| (n.name, n.arch, n.evr)) == Some(probe) {
                    matched.set(id);
                }
            }
        } else {
            compare_set.sort_unstable_by_key(|n| (n.name, n.arch));
            for id in result.iter() {
                let s = pool.solvable(id);
                let probe = (s.name, s.arch);
                let mut idx = compare_set.partition_point(|n| (n.name, n.arch) < probe);
                while idx < compare_set.len()
                    && compare_set[idx].name == s.name
                    && compare_set[idx].arch == s.arch
                {
                    let ord = rusk_evr::evrcmp(pool.id2str(s.evr), &compare_set[idx].evr_str);
                    let hit = match ord {
                        std::cmp::Ordering::Greater => cmp.contains(CmpType::GT),
                        std::cmp::Ordering::Less => cmp.contains(CmpType::LT),
                        std::cmp::Ordering::Equal => cmp.contains(CmpType::EQ),
                    };
                    if hit {
                        matched.set(id);
                        break;
                    }
                    idx += 1;
                }
            }
        }

        if cmp.contains(CmpType::NOT) {
            result.subtract(&matched);
        } else {
            result.intersect_with(&matched);
        }
    }
}

/// A NEVRA pattern resolved to pool ids for strict matching.
struct NevraId {
    name: crate::pool::Id,
    arch: crate::pool::Id,
    evr: crate::pool::Id,
    evr_str: String,
}

impl NevraId {
    /// Parse `name-[e:]evr.arch`, stripping leading-zero epochs the way the
    /// pool normalizes them. With `create_evr_id` the EVR must already be
    /// interned for the pattern to match anything.
    fn parse(sack: &Sack, pattern: &str, create_evr_id: bool) -> Option<Self> {
        let bytes = pattern.as_bytes();
        let mut evr_delim: Option<usize> = None;
        let mut release_delim: Option<usize> = None;
        let mut arch_delim: Option<usize> = None;
        for (pos, &b) in bytes.iter().enumerate() {
            if b == b'-' {
                evr_delim = release_delim;
                release_delim = Some(pos);
            } else if b == b'.' {
                arch_delim = Some(pos);
            }
        }

        let mut evr_delim = evr_delim?;
        if evr_delim == 0 {
            return None;
        }
        let name_end = evr_delim;

        // strip "0:", "00:" and the like, as the pool does for epochs
        let mut index = 1;
        while evr_delim + index < bytes.len() && bytes[evr_delim + index] == b'0' {
            index += 1;
            if evr_delim + index < bytes.len() && bytes[evr_delim + index] == b':' {
                evr_delim += index;
            }
        }

        let release_delim = release_delim?;
        let arch_delim = arch_delim?;
        if release_delim.saturating_sub(evr_delim) <= 1
            || arch_delim <= release_delim + 1
            || arch_delim == pattern.len() - 1
        {
            return None;
        }

        let pool = sack.pool();
        let name = pool.lookup_str(&pattern[..name_end])?;
        let evr_text = &pattern[evr_delim + 1..arch_delim];
        let arch = pool.lookup_str(&pattern[arch_delim + 1..])?;

        if create_evr_id {
            let evr = pool.lookup_str(evr_text)?;
            Some(Self { name, arch, evr, evr_str: String::new() })
        } else {
            Some(Self { name, arch, evr: 0, evr_str: evr_text.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sack::PackageDef;

    fn test_sack() -> Sack {
        let mut sack = Sack::new();
        sack.add_repo(
            "@System",
            99,
            true,
            vec![
                PackageDef::new("dnf", "0:2.8.9-1.fc27", "noarch"),
                PackageDef::new("kernel", "5.0-1", "x86_64"),
            ],
        );
        sack.add_repo(
            "fedora",
            99,
            false,
            vec![
                PackageDef::new("dnf", "0:3.0.0-1.fc27", "noarch"),
                PackageDef::new("kernel", "5.1-1", "x86_64"),
                PackageDef::new("emacs", "26.1-1", "x86_64"),
            ],
        );
        sack
    }

    #[test]
    fn test_apply_without_filters_returns_everything() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        assert_eq!(query.size(), 5);
    }

    #[test]
    fn test_name_filter() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        query.add_filter_str(QueryKey::Name, CmpType::EQ, "kernel").unwrap();
        assert_eq!(query.run_ids(), vec![2, 4]);
    }

    #[test]
    fn test_not_filter_subtracts() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        query.add_filter_str(QueryKey::Name, CmpType::NEQ, "kernel").unwrap();
        assert_eq!(query.run_ids(), vec![1, 3, 5]);
    }

    #[test]
    fn test_composition_invariant() {
        // q.filter(name=X) ∪ q.filter(name NEQ X) == q
        let sack = test_sack();
        let mut with = Query::new(&sack);
        with.add_filter_str(QueryKey::Name, CmpType::EQ, "dnf").unwrap();
        let mut without = Query::new(&sack);
        without.add_filter_str(QueryKey::Name, CmpType::NEQ, "dnf").unwrap();
        with.union(&mut without);
        assert_eq!(with.run_ids(), Query::new(&sack).run_ids());
    }

    #[test]
    fn test_apply_is_pure() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        query.add_filter_str(QueryKey::Name, CmpType::EQ, "emacs").unwrap();
        let mut clone = query.clone();
        assert_eq!(query.run_ids(), clone.run_ids());
    }

    #[test]
    fn test_empty_filter_forces_empty() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        query.add_filter_num(QueryKey::Empty, CmpType::EQ, 1).unwrap();
        assert!(query.is_empty());
    }

    #[test]
    fn test_glob_downgrade_to_eq() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        // no wildcard: behaves as exact match even with GLOB requested
        query.add_filter_str(QueryKey::Name, CmpType::GLOB, "emacs").unwrap();
        assert_eq!(query.run_ids(), vec![5]);
    }

    #[test]
    fn test_nevra_strict_epoch_forms() {
        let sack = test_sack();

        let mut query = Query::new(&sack);
        query
            .add_filter_str(QueryKey::NevraStrict, CmpType::EQ, "dnf-0:2.8.9-1.fc27.noarch")
            .unwrap();
        assert_eq!(query.run_ids(), vec![1]);

        let mut query = Query::new(&sack);
        query
            .add_filter_str(QueryKey::NevraStrict, CmpType::EQ, "dnf-2.8.9-1.fc27.noarch")
            .unwrap();
        assert_eq!(query.run_ids(), vec![1]);

        // no arch suffix: matches nothing
        let mut query = Query::new(&sack);
        query
            .add_filter_str(QueryKey::NevraStrict, CmpType::EQ, "dnf-2.8.9-1.fc27")
            .unwrap();
        assert!(query.is_empty());
    }

    #[test]
    fn test_nevra_strict_gt() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        query
            .add_filter_str(QueryKey::NevraStrict, CmpType::GT, "dnf-2.8.9-1.fc27.noarch")
            .unwrap();
        assert_eq!(query.run_ids(), vec![3]);
    }

    #[test]
    fn test_installed_available() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        query.installed();
        assert_eq!(query.run_ids(), vec![1, 2]);

        let mut query = Query::new(&sack);
        query.available();
        assert_eq!(query.run_ids(), vec![3, 4, 5]);
    }

    #[test]
    fn test_filter_subject_nevra_form() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        let (matched, nevra) = query.filter_subject("kernel-5.1-1.x86_64", None, false, true, true, true);
        assert!(matched);
        let nevra = nevra.unwrap();
        assert_eq!(nevra.name, "kernel");
        assert_eq!(query.run_ids(), vec![4]);
    }

    #[test]
    fn test_filter_subject_name_form() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        let (matched, nevra) = query.filter_subject("emacs", None, false, true, true, true);
        assert!(matched);
        assert_eq!(nevra.unwrap().name, "emacs");
        assert_eq!(query.run_ids(), vec![5]);
    }

    #[test]
    fn test_filter_subject_no_match() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        let (matched, _) = query.filter_subject("no-such-package", None, false, true, true, true);
        assert!(!matched);
        assert!(query.is_empty());
    }

    #[test]
    fn test_bad_query_leaves_query_usable() {
        let sack = test_sack();
        let mut query = Query::new(&sack);
        assert!(query.add_filter_str(QueryKey::Location, CmpType::GLOB, "x*").is_err());
        query.add_filter_str(QueryKey::Name, CmpType::EQ, "emacs").unwrap();
        assert_eq!(query.run_ids(), vec![5]);
    }
}
