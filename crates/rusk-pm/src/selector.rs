//! Selectors bundle query-produced match criteria into solver job entries.
//!
//! A selector holds at most one match per slot. The name, provides, file
//! and pkgs slots select candidates (at least one must be set); arch, evr
//! and reponame only refine an existing selection. Every entry produced by
//! the candidate slots other than pkgs and file has selection kind
//! SOLVABLE_NAME or SOLVABLE_PROVIDES before the post-filters run; the
//! arch/evr rewrites rely on wrapping those dep operands.

use crate::error::{Error, Result};
use crate::package_set::PackageSet;
use crate::pool::{Dep, RelOp};
use crate::query::filter::{glob_matcher, is_glob_pattern};
use crate::query::CmpType;
use crate::sack::Sack;
use crate::solver::{expand_entry, Job, JobFlags};

#[derive(Debug, Clone)]
struct StrMatch {
    cmp: CmpType,
    pattern: String,
}

#[derive(Clone)]
pub struct Selector<'a> {
    sack: &'a Sack,
    name: Option<StrMatch>,
    provides: Option<StrMatch>,
    file: Option<StrMatch>,
    pkgs: Option<PackageSet>,
    arch: Option<String>,
    evr: Option<String>,
    version: Option<String>,
    reponame: Option<String>,
}

impl<'a> Selector<'a> {
    pub fn new(sack: &'a Sack) -> Self {
        Self {
            sack,
            name: None,
            provides: None,
            file: None,
            pkgs: None,
            arch: None,
            evr: None,
            version: None,
            reponame: None,
        }
    }

    fn str_match(cmp: CmpType, pattern: &str, allow_glob: bool) -> Result<StrMatch> {
        let mut cmp = cmp;
        if cmp == CmpType::GLOB && !is_glob_pattern(pattern) {
            cmp = CmpType::EQ;
        }
        let valid = cmp == CmpType::EQ || (allow_glob && cmp == CmpType::GLOB);
        if !valid {
            return Err(Error::BadSelector(format!(
                "incorrect comparison type for selector filter: {cmp:?}"
            )));
        }
        Ok(StrMatch { cmp, pattern: pattern.to_string() })
    }

    pub fn set_name(&mut self, cmp: CmpType, pattern: &str) -> Result<()> {
        self.name = Some(Self::str_match(cmp, pattern, true)?);
        Ok(())
    }

    pub fn set_provides(&mut self, cmp: CmpType, pattern: &str) -> Result<()> {
        self.provides = Some(Self::str_match(cmp, pattern, true)?);
        Ok(())
    }

    pub fn set_file(&mut self, cmp: CmpType, pattern: &str) -> Result<()> {
        self.file = Some(Self::str_match(cmp, pattern, true)?);
        Ok(())
    }

    pub fn set_pkgs(&mut self, pkgs: PackageSet) -> Result<()> {
        self.pkgs = Some(pkgs);
        Ok(())
    }

    pub fn set_arch(&mut self, arch: &str) -> Result<()> {
        self.arch = Some(Self::str_match(CmpType::EQ, arch, false)?.pattern);
        Ok(())
    }

    /// Constrain to a full epoch:version-release.
    pub fn set_evr(&mut self, evr: &str) -> Result<()> {
        self.evr = Some(Self::str_match(CmpType::EQ, evr, false)?.pattern);
        Ok(())
    }

    /// Constrain to a version, ignoring the release.
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        self.version = Some(Self::str_match(CmpType::EQ, version, false)?.pattern);
        Ok(())
    }

    pub fn set_reponame(&mut self, name: &str) -> Result<()> {
        self.reponame = Some(Self::str_match(CmpType::EQ, name, false)?.pattern);
        Ok(())
    }

    pub fn has_pkgs(&self) -> bool {
        self.pkgs.is_some()
    }

    /// Translate into job entries carrying `action`, appended to `job`.
    pub fn to_job(&self, job: &mut Job, action: JobFlags) -> Result<()> {
        let any_req = self.name.is_some()
            || self.provides.is_some()
            || self.file.is_some()
            || self.pkgs.is_some();
        let any_opt = self.arch.is_some()
            || self.evr.is_some()
            || self.version.is_some()
            || self.reponame.is_some();
        if !any_req {
            if any_opt {
                return Err(Error::BadSelector(
                    "no name, provides, file or pkgs in the selector".to_string(),
                ));
            }
            return Ok(());
        }

        self.sack.recompute_considered();
        self.sack.make_provides_ready();
        let pool = self.sack.pool();
        let mut selection = Job::new();

        if let Some(pkgs) = &self.pkgs {
            let ids: Vec<_> = pkgs.iter().collect();
            let what = pool.queue_to_id(ids);
            selection.push(
                JobFlags::SOLVABLE_ONE_OF | JobFlags::SETARCH | JobFlags::SETEVR,
                what,
            );
        }

        if let Some(name) = &self.name {
            match name.cmp {
                CmpType::EQ => {
                    if let Some(id) = pool.lookup_str(&name.pattern) {
                        selection.push(JobFlags::SOLVABLE_NAME, pool.rel2id(id, None, ""));
                    }
                }
                _ => {
                    let Some(matcher) = glob_matcher(&name.pattern, false) else {
                        return Ok(());
                    };
                    let mut matched = Vec::new();
                    for id in pool.solvable_ids() {
                        let name_id = pool.solvable(id).name;
                        if !matched.contains(&name_id) && matcher.is_match(pool.id2str(name_id)) {
                            matched.push(name_id);
                        }
                    }
                    for name_id in matched {
                        let dep = pool.rel2id(name_id, None, "");
                        if !selection.contains(JobFlags::SOLVABLE_NAME, dep) {
                            selection.push(JobFlags::SOLVABLE_NAME, dep);
                        }
                    }
                }
            }
        }

        if let Some(file) = &self.file {
            let icase = file.cmp == CmpType::GLOB;
            let matcher = match file.cmp {
                CmpType::GLOB => glob_matcher(&file.pattern, icase),
                _ => None,
            };
            let mut ids = Vec::new();
            for id in pool.solvable_ids() {
                let hit = pool.solvable(id).filelist.iter().any(|&f| {
                    let path = pool.id2str(f);
                    match &matcher {
                        Some(m) => m.is_match(path),
                        None => path == file.pattern,
                    }
                });
                if hit {
                    ids.push(id);
                }
            }
            if !ids.is_empty() {
                let what = pool.queue_to_id(ids);
                selection.push(JobFlags::SOLVABLE_ONE_OF, what);
            }
        }

        if let Some(provides) = &self.provides {
            match provides.cmp {
                CmpType::EQ => {
                    if let Some(dep) = self.provide_dep_from_str(&provides.pattern) {
                        selection.push(JobFlags::SOLVABLE_PROVIDES, dep);
                    }
                }
                _ => {
                    // a glob that matches nothing selects nothing
                    let Some(matcher) = glob_matcher(&provides.pattern, false) else {
                        return Ok(());
                    };
                    for (id, s) in pool.strings() {
                        if !matcher.is_match(s) {
                            continue;
                        }
                        let dep = pool.rel2id(id, None, "");
                        if !pool.for_provides(dep).is_empty()
                            && !selection.contains(JobFlags::SOLVABLE_PROVIDES, dep)
                        {
                            selection.push(JobFlags::SOLVABLE_PROVIDES, dep);
                        }
                    }
                }
            }
        }

        // arch and evr rewrite the dep operand of each entry
        if let Some(arch) = &self.arch {
            let Some(arch_id) = pool.str2archid(arch) else {
                // unknown arch: the selection collapses to nothing
                return Ok(());
            };
            for entry in selection.entries_mut() {
                if entry.flags.selection() != JobFlags::SOLVABLE_NAME {
                    return Err(Error::BadSelector(
                        "arch filter needs a name-based selection".to_string(),
                    ));
                }
                entry.what = pool.intern_dep(Dep::Arch { base: entry.what, arch: arch_id });
                entry.flags |= JobFlags::SETARCH;
            }
        }

        let evr_filter = match (&self.evr, &self.version) {
            (Some(evr), _) => Some((evr.clone(), false, JobFlags::SETEVR)),
            (None, Some(version)) => Some((version.clone(), true, JobFlags::SETEV)),
            (None, None) => None,
        };
        if let Some((evr, version_only, flag)) = evr_filter {
            for entry in selection.entries_mut() {
                if entry.flags.selection() != JobFlags::SOLVABLE_NAME {
                    return Err(Error::BadSelector(
                        "evr filter needs a name-based selection".to_string(),
                    ));
                }
                entry.what = pool.intern_dep(Dep::EvrQual {
                    base: entry.what,
                    evr: evr.clone(),
                    version_only,
                });
                entry.flags |= flag;
            }
        }

        if let Some(reponame) = &self.reponame {
            let repo_id = pool
                .repos()
                .iter()
                .position(|repo| &repo.name == reponame)
                .map(|index| index as crate::pool::RepoId);
            let considered = self.sack.considered();
            let mut filtered = Job::new();
            for entry in selection.iter() {
                let ids: Vec<_> = expand_entry(pool, &considered, entry)
                    .into_iter()
                    .filter(|&id| Some(pool.solvable(id).repo) == repo_id)
                    .collect();
                if !ids.is_empty() {
                    let what = pool.queue_to_id(ids);
                    let modifiers = entry.flags & !JobFlags::SELECT_MASK;
                    filtered.push(
                        JobFlags::SOLVABLE_ONE_OF | JobFlags::SETREPO | modifiers,
                        what,
                    );
                }
            }
            selection = filtered;
        }

        for entry in selection.iter() {
            job.push(entry.flags | action, entry.what);
        }
        Ok(())
    }

    /// Parse `name [op evr]` into a provides dep; unknown names select
    /// nothing.
    fn provide_dep_from_str(&self, s: &str) -> Option<crate::pool::DepId> {
        let pool = self.sack.pool();
        let s = s.trim();
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
}
