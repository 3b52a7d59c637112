//! The sack owns the pool and the resolution-relevant configuration that
//! sits next to it: exclude masks, installonly settings, the running
//! kernel, and the advisory collection.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

use crate::advisory::{Advisory, AdvisoryDef, AdvisoryKind, AdvisoryPkg};
use crate::package_set::PackageSet;
use crate::pool::{Dep, DepId, Pool, RelOp, RepoId, Solvable, SolvableId};
use crate::query::ExcludeFlags;

/// Package description used to populate a repo. Dependency strings take the
/// `name`, `name op evr`, or `(rich)` forms.
#[derive(Debug, Clone, Default)]
pub struct PackageDef {
    pub name: String,
    pub evr: String,
    pub arch: String,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    pub obsoletes: Vec<String>,
    pub conflicts: Vec<String>,
    pub recommends: Vec<String>,
    pub suggests: Vec<String>,
    pub supplements: Vec<String>,
    pub enhances: Vec<String>,
    pub filelist: Vec<String>,
    pub sourcerpm: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub buildtime: u64,
}

impl PackageDef {
    pub fn new(name: &str, evr: &str, arch: &str) -> Self {
        Self {
            name: name.to_string(),
            evr: evr.to_string(),
            arch: arch.to_string(),
            ..Default::default()
        }
    }
}

/// Strip an explicit zero epoch: the pool stores EVRs the way the solver
/// compares them, and `0:1.0-1` is the same version as `1.0-1`.
fn normalize_evr(evr: &str) -> String {
    if rusk_evr::Evr::has_explicit_epoch(evr) {
        let parsed = rusk_evr::Evr::parse(evr);
        if parsed.epoch_num() == 0 {
            return evr[evr.find(':').unwrap() + 1..].to_string();
        }
    }
    evr.to_string()
}

pub struct Sack {
    pool: Pool,
    regular_excludes: PackageSet,
    module_excludes: PackageSet,
    includes: Option<PackageSet>,
    installonly: Vec<DepId>,
    installonly_limit: usize,
    running_kernel: Cell<Option<SolvableId>>,
    allow_vendor_change: bool,
    // keyed by advisory name, iteration in insertion order
    advisories: IndexMap<String, Advisory>,
    considered: RefCell<Option<PackageSet>>,
    pkg_solvables: RefCell<Option<PackageSet>>,
}

impl Default for Sack {
    fn default() -> Self {
        Self::new()
    }
}

impl Sack {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            regular_excludes: PackageSet::new(),
            module_excludes: PackageSet::new(),
            includes: None,
            installonly: Vec::new(),
            installonly_limit: 0,
            running_kernel: Cell::new(None),
            allow_vendor_change: true,
            advisories: IndexMap::new(),
            considered: RefCell::new(None),
            pkg_solvables: RefCell::new(None),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    // ---- loading ----------------------------------------------------------

    /// Add a repo with its packages as one contiguous id block. Every
    /// package gets the implicit `name = evr` self-provide.
    pub fn add_repo(
        &mut self,
        name: &str,
        priority: i32,
        installed: bool,
        packages: Vec<PackageDef>,
    ) -> RepoId {
        let solvables: Vec<Solvable> = packages.iter().map(|def| self.build_solvable(def)).collect();
        self.invalidate_caches();
        self.pool.add_repo(name, priority, installed, solvables)
    }

    fn build_solvable(&mut self, def: &PackageDef) -> Solvable {
        let evr_str = normalize_evr(&def.evr);
        let pool = &mut self.pool;
        let name = pool.str2id(&def.name);
        let evr = pool.str2id(&evr_str);
        let arch = pool.str2id(&def.arch);

        let mut provides: Vec<DepId> = vec![pool.intern_dep(Dep::Versioned {
            name,
            op: RelOp::Eq,
            evr: evr_str,
        })];
        provides.extend(def.provides.iter().map(|d| pool.parse_dep(d)));

        let parse_all =
            |pool: &mut Pool, deps: &[String]| deps.iter().map(|d| pool.parse_dep(d)).collect();

        Solvable {
            name,
            evr,
            arch,
            repo: 0, // fixed up by Pool::add_repo
            requires: parse_all(pool, &def.requires),
            provides,
            obsoletes: parse_all(pool, &def.obsoletes),
            conflicts: parse_all(pool, &def.conflicts),
            recommends: parse_all(pool, &def.recommends),
            suggests: parse_all(pool, &def.suggests),
            supplements: parse_all(pool, &def.supplements),
            enhances: parse_all(pool, &def.enhances),
            filelist: def.filelist.iter().map(|f| pool.str2id(f)).collect(),
            sourcerpm: def.sourcerpm.as_deref().map(|s| pool.str2id(s)),
            description: def.description.as_deref().map(|s| pool.str2id(s)),
            summary: def.summary.as_deref().map(|s| pool.str2id(s)),
            url: def.url.as_deref().map(|s| pool.str2id(s)),
            location: def.location.as_deref().map(|s| pool.str2id(s)),
            vendor: def.vendor.as_deref().map(|s| pool.str2id(s)),
            buildtime: def.buildtime,
        }
    }

    pub fn add_advisory(&mut self, def: AdvisoryDef) {
        let packages = def
            .packages
            .iter()
            .map(|(name, evr, arch)| AdvisoryPkg {
                name: self.pool.str2id(name),
                evr: self.pool.str2id(&normalize_evr(evr)),
                arch: self.pool.str2id(arch),
            })
            .collect();
        self.advisories.insert(
            def.name.clone(),
            Advisory {
                name: def.name,
                kind: AdvisoryKind::from_str(&def.kind),
                severity: def.severity,
                bugs: def.bugs,
                cves: def.cves,
                packages,
            },
        );
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Advisory> {
        self.advisories.values()
    }

    pub fn advisory(&self, name: &str) -> Option<&Advisory> {
        self.advisories.get(name)
    }

    // ---- excludes and considered ------------------------------------------

    pub fn add_excludes(&mut self, pkgs: &PackageSet) {
        self.regular_excludes.union_with(pkgs);
        self.invalidate_caches();
    }

    pub fn remove_excludes(&mut self, pkgs: &PackageSet) {
        self.regular_excludes.subtract(pkgs);
        self.invalidate_caches();
    }

    pub fn set_module_excludes(&mut self, pkgs: &PackageSet) {
        self.module_excludes = pkgs.clone();
        self.invalidate_caches();
    }

    pub fn module_excludes(&self) -> &PackageSet {
        &self.module_excludes
    }

    pub fn set_includes(&mut self, pkgs: Option<PackageSet>) {
        self.includes = pkgs;
        self.invalidate_caches();
    }

    fn invalidate_caches(&mut self) {
        *self.considered.borrow_mut() = None;
        *self.pkg_solvables.borrow_mut() = None;
    }

    /// The visibility mask for a given exclude policy. Always freshly sized
    /// to the current pool width.
    pub fn considered_for(&self, flags: ExcludeFlags) -> PackageSet {
        let mut set = self.pkg_solvables_set();
        match flags {
            ExcludeFlags::ApplyExcludes => {
                set.subtract(&self.regular_excludes);
                set.subtract(&self.module_excludes);
                self.apply_includes(&mut set);
            }
            ExcludeFlags::IgnoreRegularExcludes => {
                set.subtract(&self.module_excludes);
            }
            ExcludeFlags::IgnoreModularExcludes => {
                set.subtract(&self.regular_excludes);
                self.apply_includes(&mut set);
            }
            ExcludeFlags::IgnoreExcludes => {}
        }
        set
    }

    fn apply_includes(&self, set: &mut PackageSet) {
        let Some(includes) = &self.includes else { return };
        // includes restrict available packages only; installed stay visible
        let installed = self.installed_set();
        let mut keep = includes.clone();
        keep.union_with(&installed);
        set.intersect_with(&keep);
    }

    /// Recompute the default considered mask. Must run before any
    /// provides-based lookup; queries and goals call it on entry.
    pub fn recompute_considered(&self) {
        *self.considered.borrow_mut() = Some(self.considered_for(ExcludeFlags::ApplyExcludes));
    }

    pub fn considered(&self) -> PackageSet {
        if self.considered.borrow().is_none() {
            self.recompute_considered();
        }
        self.considered.borrow().as_ref().unwrap().clone()
    }

    /// Is the solvable masked out of the default considered map?
    pub fn disabled_solvable(&self, id: SolvableId) -> bool {
        !self.considered().has(id)
    }

    pub fn make_provides_ready(&self) {
        self.pool.make_provides_ready();
    }

    /// The set of all package solvables, cached until the pool changes.
    pub fn pkg_solvables_set(&self) -> PackageSet {
        if self.pkg_solvables.borrow().is_none() {
            *self.pkg_solvables.borrow_mut() = Some(self.pool.all_solvables_set());
        }
        self.pkg_solvables.borrow().as_ref().unwrap().clone()
    }

    pub fn installed_set(&self) -> PackageSet {
        let mut set = PackageSet::with_capacity(self.pool.nsolvables());
        if let Some(repo_id) = self.pool.installed_repo() {
            let repo = self.pool.repo(repo_id);
            for id in repo.start..repo.end {
                set.set(id);
            }
        }
        set
    }

    // ---- configuration ----------------------------------------------------

    /// Declare installonly dependencies (kernel-like packages whose versions
    /// coexist) as dep strings.
    pub fn set_installonly(&mut self, deps: &[&str]) {
        self.installonly = deps.iter().map(|d| self.pool.parse_dep(d)).collect();
    }

    pub fn installonly(&self) -> &[DepId] {
        &self.installonly
    }

    pub fn set_installonly_limit(&mut self, limit: usize) {
        self.installonly_limit = limit;
    }

    pub fn installonly_limit(&self) -> usize {
        self.installonly_limit
    }

    pub fn set_running_kernel(&self, id: Option<SolvableId>) {
        self.running_kernel.set(id);
    }

    pub fn running_kernel(&self) -> Option<SolvableId> {
        self.running_kernel.get()
    }

    pub fn set_allow_vendor_change(&mut self, allow: bool) {
        self.allow_vendor_change = allow;
    }

    pub fn allow_vendor_change(&self) -> bool {
        self.allow_vendor_change
    }
}
