//! The package universe: interned strings, relational dependencies,
//! solvables, and repos.
//!
//! Ids are stable for the lifetime of the pool and a solvable's
//! `(name, evr, arch, repo)` is immutable once added. Solvable ids are
//! 1-based; id 0 is reserved. Each repo owns a contiguous `[start, end)`
//! id range and at most one repo is the installed one.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;

use rusk_evr::{evrcmp, vercmp, Evr};

use crate::package_set::PackageSet;

/// Interned string id. 0 is never a valid id.
pub type Id = i32;
/// Index into the solvable array. 1-based; 0 is reserved.
pub type SolvableId = Id;
/// Index into the repo registry.
pub type RepoId = Id;
/// Interned relational-dependency id. A separate id space from strings.
pub type DepId = Id;

/// Comparison part of a versioned dependency atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn has_eq(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Le | RelOp::Ge)
    }

    pub fn has_lt(self) -> bool {
        matches!(self, RelOp::Lt | RelOp::Le)
    }

    pub fn has_gt(self) -> bool {
        matches!(self, RelOp::Gt | RelOp::Ge)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

/// A relational dependency. Either an atom, an ARCH- or EVR-qualified
/// compound over another dependency, or an unparsed rich dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dep {
    /// Bare name.
    Name(Id),
    /// `name op evr`.
    Versioned { name: Id, op: RelOp, evr: String },
    /// `base . arch` qualification; `base` is a dep id.
    Arch { base: DepId, arch: Id },
    /// `base = evr` qualification; `base` is a dep id. With `version_only`
    /// the release part of candidates is ignored.
    EvrQual { base: DepId, evr: String, version_only: bool },
    /// Rich dependency kept as its source text, e.g. `(A if B)`.
    Rich(String),
}

/// Attribute array selector on a solvable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepArrayKey {
    Requires,
    Provides,
    Obsoletes,
    Conflicts,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
}

/// One unit in the pool. All string-ish fields are interned ids; the dep
/// arrays hold dep ids.
#[derive(Debug, Clone)]
pub struct Solvable {
    pub name: Id,
    pub evr: Id,
    pub arch: Id,
    pub repo: RepoId,
    pub requires: Vec<DepId>,
    pub provides: Vec<DepId>,
    pub obsoletes: Vec<DepId>,
    pub conflicts: Vec<DepId>,
    pub recommends: Vec<DepId>,
    pub suggests: Vec<DepId>,
    pub supplements: Vec<DepId>,
    pub enhances: Vec<DepId>,
    pub filelist: Vec<Id>,
    pub sourcerpm: Option<Id>,
    pub description: Option<Id>,
    pub summary: Option<Id>,
    pub url: Option<Id>,
    pub location: Option<Id>,
    pub vendor: Option<Id>,
    pub buildtime: u64,
}

impl Solvable {
    pub fn dep_array(&self, key: DepArrayKey) -> &[DepId] {
        match key {
            DepArrayKey::Requires => &self.requires,
            DepArrayKey::Provides => &self.provides,
            DepArrayKey::Obsoletes => &self.obsoletes,
            DepArrayKey::Conflicts => &self.conflicts,
            DepArrayKey::Recommends => &self.recommends,
            DepArrayKey::Suggests => &self.suggests,
            DepArrayKey::Supplements => &self.supplements,
            DepArrayKey::Enhances => &self.enhances,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Repo {
    pub name: String,
    pub priority: i32,
    pub start: SolvableId,
    pub end: SolvableId,
}

#[derive(Default)]
struct DepTable {
    list: Vec<Dep>,
    index: HashMap<Dep, DepId>,
}

impl DepTable {
    fn intern(&mut self, dep: Dep) -> DepId {
        if let Some(&id) = self.index.get(&dep) {
            return id;
        }
        let id = self.list.len() as DepId + 1;
        self.index.insert(dep.clone(), id);
        self.list.push(dep);
        id
    }

    fn get(&self, id: DepId) -> Dep {
        self.list[(id - 1) as usize].clone()
    }
}

/// Process-wide package universe.
pub struct Pool {
    strings: Vec<String>,
    string_index: HashMap<String, Id>,
    solvables: Vec<Solvable>,
    repos: Vec<Repo>,
    installed: Option<RepoId>,
    deps: RefCell<DepTable>,
    // name string id -> providing solvables, built by make_provides_ready
    whatprovides: RefCell<HashMap<Id, Vec<SolvableId>>>,
    // file path string id -> owning solvables
    fileprovides: RefCell<HashMap<Id, Vec<SolvableId>>>,
    provides_ready: Cell<bool>,
    // arena backing SOLVABLE_ONE_OF job operands
    queues: RefCell<Vec<Vec<SolvableId>>>,
    /// When set, obsoletes match against all provides instead of package
    /// names only.
    pub obsolete_uses_provides: bool,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            string_index: HashMap::new(),
            solvables: vec![Solvable {
                // id 0 placeholder, never returned
                name: 0,
                evr: 0,
                arch: 0,
                repo: -1,
                requires: Vec::new(),
                provides: Vec::new(),
                obsoletes: Vec::new(),
                conflicts: Vec::new(),
                recommends: Vec::new(),
                suggests: Vec::new(),
                supplements: Vec::new(),
                enhances: Vec::new(),
                filelist: Vec::new(),
                sourcerpm: None,
                description: None,
                summary: None,
                url: None,
                location: None,
                vendor: None,
                buildtime: 0,
            }],
            repos: Vec::new(),
            installed: None,
            deps: RefCell::new(DepTable::default()),
            whatprovides: RefCell::new(HashMap::new()),
            fileprovides: RefCell::new(HashMap::new()),
            provides_ready: Cell::new(false),
            queues: RefCell::new(Vec::new()),
            obsolete_uses_provides: false,
        }
    }

    // ---- string interning -------------------------------------------------

    /// Intern a string, creating an id when unknown.
    pub fn str2id(&mut self, s: &str) -> Id {
        if let Some(&id) = self.string_index.get(s) {
            return id;
        }
        let id = self.strings.len() as Id + 1;
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), id);
        id
    }

    /// Look a string up without creating an id.
    pub fn lookup_str(&self, s: &str) -> Option<Id> {
        self.string_index.get(s).copied()
    }

    pub fn id2str(&self, id: Id) -> &str {
        &self.strings[(id - 1) as usize]
    }

    /// All interned strings with their ids, in id order.
    pub fn strings(&self) -> impl Iterator<Item = (Id, &str)> {
        self.strings.iter().enumerate().map(|(i, s)| (i as Id + 1, s.as_str()))
    }

    /// Intern an architecture name; `None` when the arch has never been
    /// seen, which callers treat as "matches nothing".
    pub fn str2archid(&self, arch: &str) -> Option<Id> {
        self.lookup_str(arch)
    }

    // ---- dep interning ----------------------------------------------------

    pub fn intern_dep(&self, dep: Dep) -> DepId {
        self.deps.borrow_mut().intern(dep)
    }

    /// Intern `name op evr` (or a bare name when `op` is `None`).
    pub fn rel2id(&self, name: Id, op: Option<RelOp>, evr: &str) -> DepId {
        match op {
            None => self.intern_dep(Dep::Name(name)),
            Some(op) => self.intern_dep(Dep::Versioned { name, op, evr: evr.to_string() }),
        }
    }

    pub fn dep(&self, id: DepId) -> Dep {
        self.deps.borrow().get(id)
    }

    /// The name string id at the bottom of a (possibly compound) dep.
    pub fn dep_name(&self, id: DepId) -> Option<Id> {
        match self.dep(id) {
            Dep::Name(name) => Some(name),
            Dep::Versioned { name, .. } => Some(name),
            Dep::Arch { base, .. } => self.dep_name(base),
            Dep::EvrQual { base, .. } => self.dep_name(base),
            Dep::Rich(_) => None,
        }
    }

    /// Render a dep back to its `name op evr` string form.
    pub fn dep2str(&self, id: DepId) -> String {
        match self.dep(id) {
            Dep::Name(name) => self.id2str(name).to_string(),
            Dep::Versioned { name, op, evr } => {
                format!("{} {} {}", self.id2str(name), op.as_str(), evr)
            }
            Dep::Arch { base, arch } => {
                format!("{}.{}", self.dep2str(base), self.id2str(arch))
            }
            Dep::EvrQual { base, evr, .. } => format!("{} = {}", self.dep2str(base), evr),
            Dep::Rich(text) => text,
        }
    }

    /// Parse a textual dependency: `name`, `name op evr`, or a rich dep in
    /// parentheses. Only for pool construction, hence `&mut`.
    pub fn parse_dep(&mut self, s: &str) -> DepId {
        let s = s.trim();
        if s.starts_with('(') {
            return self.intern_dep(Dep::Rich(s.to_string()));
        }
        for (token, op) in [
            (" <= ", RelOp::Le),
            (" >= ", RelOp::Ge),
            (" < ", RelOp::Lt),
            (" > ", RelOp::Gt),
            (" = ", RelOp::Eq),
        ] {
            if let Some(pos) = s.find(token) {
                let name = self.str2id(&s[..pos]);
                let evr = s[pos + token.len()..].trim().to_string();
                return self.intern_dep(Dep::Versioned { name, op, evr });
            }
        }
        let name = self.str2id(s);
        self.intern_dep(Dep::Name(name))
    }

    // ---- repos and solvables ----------------------------------------------

    /// Open a repo and append its solvables as one contiguous block.
    pub(crate) fn add_repo(
        &mut self,
        name: &str,
        priority: i32,
        installed: bool,
        solvables: Vec<Solvable>,
    ) -> RepoId {
        let repo_id = self.repos.len() as RepoId;
        let start = self.solvables.len() as SolvableId;
        for mut s in solvables {
            s.repo = repo_id;
            self.solvables.push(s);
        }
        let end = self.solvables.len() as SolvableId;
        self.repos.push(Repo { name: name.to_string(), priority, start, end });
        if installed {
            self.installed = Some(repo_id);
        }
        self.provides_ready.set(false);
        repo_id
    }

    pub fn solvable(&self, id: SolvableId) -> &Solvable {
        &self.solvables[id as usize]
    }

    /// Number of entries in the solvable array, including the reserved 0.
    pub fn nsolvables(&self) -> usize {
        self.solvables.len()
    }

    /// Iterate all package solvable ids in ascending order.
    pub fn solvable_ids(&self) -> impl Iterator<Item = SolvableId> {
        1..self.solvables.len() as SolvableId
    }

    pub fn repos(&self) -> &[Repo] {
        &self.repos
    }

    pub fn repo(&self, id: RepoId) -> &Repo {
        &self.repos[id as usize]
    }

    pub fn installed_repo(&self) -> Option<RepoId> {
        self.installed
    }

    pub fn is_installed(&self, id: SolvableId) -> bool {
        self.installed == Some(self.solvable(id).repo)
    }

    pub fn repo_priority(&self, id: SolvableId) -> i32 {
        self.repo(self.solvable(id).repo).priority
    }

    // ---- provides ---------------------------------------------------------

    /// (Re)build the whatprovides and file indexes. The engine calls this
    /// before any provides-based lookup.
    pub fn make_provides_ready(&self) {
        if self.provides_ready.get() {
            return;
        }
        let mut by_name: HashMap<Id, Vec<SolvableId>> = HashMap::new();
        let mut by_file: HashMap<Id, Vec<SolvableId>> = HashMap::new();
        for id in self.solvable_ids() {
            let s = self.solvable(id);
            for &dep_id in &s.provides {
                if let Some(name) = self.dep_name(dep_id) {
                    let providers = by_name.entry(name).or_default();
                    if providers.last() != Some(&id) {
                        providers.push(id);
                    }
                }
            }
            for &file in &s.filelist {
                by_file.entry(file).or_default().push(id);
            }
        }
        *self.whatprovides.borrow_mut() = by_name;
        *self.fileprovides.borrow_mut() = by_file;
        self.provides_ready.set(true);
    }

    /// All solvables whose provides (or file list, for absolute paths)
    /// satisfy `dep`, in ascending id order.
    pub fn for_provides(&self, dep_id: DepId) -> Vec<SolvableId> {
        self.make_provides_ready();
        let dep = self.dep(dep_id);
        if let Dep::Name(name) = dep {
            if self.id2str(name).starts_with('/') {
                let mut out = self.fileprovides.borrow().get(&name).cloned().unwrap_or_default();
                out.sort_unstable();
                out.dedup();
                return out;
            }
        }
        let Some(name) = self.dep_name(dep_id) else {
            return Vec::new();
        };
        let candidates = self.whatprovides.borrow().get(&name).cloned().unwrap_or_default();
        candidates
            .into_iter()
            .filter(|&p| self.solvable_provides_dep(p, dep_id))
            .collect()
    }

    /// Does any provides entry of `id` intersect `dep`?
    pub fn solvable_provides_dep(&self, id: SolvableId, dep_id: DepId) -> bool {
        let s = self.solvable(id);
        match self.dep(dep_id) {
            Dep::Arch { base, arch } => {
                s.arch == arch && self.solvable_provides_dep(id, base)
            }
            Dep::EvrQual { base, evr, version_only } => {
                let cmp = if version_only {
                    vercmp(Evr::parse(self.id2str(s.evr)).version, Evr::parse(&evr).version)
                } else {
                    evrcmp(self.id2str(s.evr), &evr)
                };
                cmp == Ordering::Equal && self.solvable_provides_dep(id, base)
            }
            _ => {
                let dep_name = self.dep_name(dep_id);
                s.provides.iter().any(|&p| {
                    self.dep_name(p) == dep_name && self.match_dep(p, dep_id)
                })
            }
        }
    }

    /// Do two dependencies intersect: same name and overlapping EVR ranges.
    pub fn match_dep(&self, a: DepId, b: DepId) -> bool {
        let da = self.dep(a);
        let db = self.dep(b);
        let (name_a, name_b) = match (self.dep_name(a), self.dep_name(b)) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };
        if name_a != name_b {
            return false;
        }
        match (&da, &db) {
            (Dep::Versioned { op: op_a, evr: evr_a, .. }, Dep::Versioned { op: op_b, evr: evr_b, .. }) => {
                intersect_evrs(*op_a, evr_a, *op_b, evr_b)
            }
            // a bare name intersects any range
            _ => true,
        }
    }

    /// Does `dep` name-and-version match the solvable itself (not its
    /// provides)? Used by the obsoletes semantics when
    /// `obsolete_uses_provides` is off.
    pub fn match_nevr(&self, id: SolvableId, dep_id: DepId) -> bool {
        let s = self.solvable(id);
        match self.dep(dep_id) {
            Dep::Name(name) => s.name == name,
            Dep::Versioned { name, op, evr } => {
                s.name == name && intersect_evrs(RelOp::Eq, self.id2str(s.evr), op, &evr)
            }
            _ => false,
        }
    }

    // ---- upgrades ---------------------------------------------------------

    /// The installed solvable that `id` would upgrade: same name, compatible
    /// arch, strictly lower EVR. `None` when nothing qualifies.
    pub fn what_upgrades(&self, id: SolvableId) -> Option<SolvableId> {
        self.what_updown(id, Ordering::Less)
    }

    /// The installed solvable that `id` would downgrade.
    pub fn what_downgrades(&self, id: SolvableId) -> Option<SolvableId> {
        self.what_updown(id, Ordering::Greater)
    }

    fn what_updown(&self, id: SolvableId, wanted: Ordering) -> Option<SolvableId> {
        let installed = self.installed_repo()?;
        if self.solvable(id).repo == installed {
            return None;
        }
        let s = self.solvable(id);
        let repo = self.repo(installed);
        let noarch = self.lookup_str("noarch");
        for other_id in repo.start..repo.end {
            let other = self.solvable(other_id);
            if other.name != s.name {
                continue;
            }
            let arch_ok = other.arch == s.arch
                || Some(other.arch) == noarch
                || Some(s.arch) == noarch;
            if !arch_ok {
                continue;
            }
            if evrcmp(self.id2str(other.evr), self.id2str(s.evr)) == wanted {
                return Some(other_id);
            }
        }
        None
    }

    // ---- rendering --------------------------------------------------------

    /// Canonical `name-evr.arch`.
    pub fn solvable2str(&self, id: SolvableId) -> String {
        let s = self.solvable(id);
        format!(
            "{}-{}.{}",
            self.id2str(s.name),
            self.id2str(s.evr),
            self.id2str(s.arch)
        )
    }

    /// Render `name[-[epoch:]evr].arch`, inserting or dropping the epoch so
    /// the output's shape matches `with_epoch`.
    pub fn solvable_nevra(&self, id: SolvableId, with_epoch: bool) -> String {
        let s = self.solvable(id);
        let evr = self.id2str(s.evr);
        let has_epoch = Evr::has_explicit_epoch(evr);
        let evr_out = if has_epoch == with_epoch {
            evr.to_string()
        } else if with_epoch {
            format!("0:{evr}")
        } else {
            evr[evr.find(':').unwrap() + 1..].to_string()
        };
        format!("{}-{}.{}", self.id2str(s.name), evr_out, self.id2str(s.arch))
    }

    /// Compare two solvables' EVRs.
    pub fn evrcmp_solvables(&self, a: SolvableId, b: SolvableId) -> Ordering {
        evrcmp(
            self.id2str(self.solvable(a).evr),
            self.id2str(self.solvable(b).evr),
        )
    }

    // ---- id queue arena ---------------------------------------------------

    /// Store an id list and return a handle usable as a single job operand.
    pub fn queue_to_id(&self, ids: Vec<SolvableId>) -> Id {
        let mut queues = self.queues.borrow_mut();
        queues.push(ids);
        queues.len() as Id
    }

    pub fn id_to_queue(&self, id: Id) -> Vec<SolvableId> {
        self.queues.borrow()[(id - 1) as usize].clone()
    }

    /// The full set of package solvables as a set.
    pub fn all_solvables_set(&self) -> PackageSet {
        let mut set = PackageSet::with_capacity(self.nsolvables());
        for id in self.solvable_ids() {
            set.set(id);
        }
        set
    }
}

/// Range intersection for two versioned atoms, release-tolerant: when one
/// side carries no release the release parts are ignored.
pub fn intersect_evrs(op_a: RelOp, evr_a: &str, op_b: RelOp, evr_b: &str) -> bool {
    if op_a.has_lt() && op_b.has_lt() {
        return true;
    }
    if op_a.has_gt() && op_b.has_gt() {
        return true;
    }
    match evrcmp_match(evr_a, evr_b) {
        Ordering::Equal => op_a.has_eq() && op_b.has_eq(),
        Ordering::Greater => op_a.has_lt() || op_b.has_gt(),
        Ordering::Less => op_a.has_gt() || op_b.has_lt(),
    }
}

/// EVR compare that ignores the release when either side omits it.
fn evrcmp_match(a: &str, b: &str) -> Ordering {
    let ea = Evr::parse(a);
    let eb = Evr::parse(b);
    let epoch = ea.epoch_num().cmp(&eb.epoch_num());
    if epoch != Ordering::Equal {
        return epoch;
    }
    let version = vercmp(ea.version, eb.version);
    if version != Ordering::Equal {
        return version;
    }
    if ea.release.is_empty() || eb.release.is_empty() {
        return Ordering::Equal;
    }
    vercmp(ea.release, eb.release)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(mut pool: Pool, packages: Vec<Solvable>) -> Pool {
        pool.add_repo("test", 99, false, packages);
        pool
    }

    fn simple_solvable(pool: &mut Pool, name: &str, evr: &str, arch: &str) -> Solvable {
        let name_id = pool.str2id(name);
        let evr_id = pool.str2id(evr);
        let arch_id = pool.str2id(arch);
        let self_provide = pool.intern_dep(Dep::Versioned {
            name: name_id,
            op: RelOp::Eq,
            evr: evr.to_string(),
        });
        Solvable {
            name: name_id,
            evr: evr_id,
            arch: arch_id,
            repo: 0,
            requires: Vec::new(),
            provides: vec![self_provide],
            obsoletes: Vec::new(),
            conflicts: Vec::new(),
            recommends: Vec::new(),
            suggests: Vec::new(),
            supplements: Vec::new(),
            enhances: Vec::new(),
            filelist: Vec::new(),
            sourcerpm: None,
            description: None,
            summary: None,
            url: None,
            location: None,
            vendor: None,
            buildtime: 0,
        }
    }

    #[test]
    fn test_string_interning_stable() {
        let mut pool = Pool::new();
        let a = pool.str2id("kernel");
        let b = pool.str2id("kernel");
        assert_eq!(a, b);
        assert_eq!(pool.id2str(a), "kernel");
        assert_eq!(pool.lookup_str("nonexistent"), None);
    }

    #[test]
    fn test_parse_dep_forms() {
        let mut pool = Pool::new();
        let plain = pool.parse_dep("libfoo");
        assert!(matches!(pool.dep(plain), Dep::Name(_)));

        let versioned = pool.parse_dep("libfoo >= 2.0");
        match pool.dep(versioned) {
            Dep::Versioned { op, evr, .. } => {
                assert_eq!(op, RelOp::Ge);
                assert_eq!(evr, "2.0");
            }
            other => panic!("unexpected dep {other:?}"),
        }

        let rich = pool.parse_dep("(A if B)");
        assert!(matches!(pool.dep(rich), Dep::Rich(_)));
    }

    #[test]
    fn test_for_provides_versioned() {
        let mut pool = Pool::new();
        let s = simple_solvable(&mut pool, "libfoo", "2.0-1", "x86_64");
        let mut pool = pool_with(pool, vec![s]);

        let ok = pool.parse_dep("libfoo >= 1.5");
        let too_new = pool.parse_dep("libfoo > 2.0-1");
        assert_eq!(pool.for_provides(ok), vec![1]);
        assert!(pool.for_provides(too_new).is_empty());
    }

    #[test]
    fn test_match_nevr() {
        let mut pool = Pool::new();
        let s = simple_solvable(&mut pool, "kernel", "5.0-1", "x86_64");
        let mut pool = pool_with(pool, vec![s]);

        let lower = pool.parse_dep("kernel < 6.0");
        let exact = pool.parse_dep("kernel = 5.0-1");
        let other = pool.parse_dep("kernel-core < 6.0");
        assert!(pool.match_nevr(1, lower));
        assert!(pool.match_nevr(1, exact));
        assert!(!pool.match_nevr(1, other));
    }

    #[test]
    fn test_what_upgrades() {
        let mut pool = Pool::new();
        let old = simple_solvable(&mut pool, "foo", "1.0-1", "x86_64");
        let newer = simple_solvable(&mut pool, "foo", "2.0-1", "x86_64");
        pool.add_repo("@System", 99, true, vec![old]);
        pool.add_repo("updates", 99, false, vec![newer]);

        let new_id = pool.repo(1).start;
        let installed_id = pool.repo(0).start;
        assert_eq!(pool.what_upgrades(new_id), Some(installed_id));
        assert_eq!(pool.what_downgrades(new_id), None);
    }

    #[test]
    fn test_nevra_rendering_epoch() {
        let mut pool = Pool::new();
        let s = simple_solvable(&mut pool, "dnf", "3:2.8.9-1.fc27", "noarch");
        let pool = pool_with(pool, vec![s]);

        assert_eq!(pool.solvable_nevra(1, true), "dnf-3:2.8.9-1.fc27.noarch");
        assert_eq!(pool.solvable_nevra(1, false), "dnf-2.8.9-1.fc27.noarch");
    }

    #[test]
    fn test_intersect_evrs() {
        assert!(intersect_evrs(RelOp::Eq, "1.0", RelOp::Ge, "0.5"));
        assert!(!intersect_evrs(RelOp::Eq, "1.0", RelOp::Gt, "1.0"));
        assert!(intersect_evrs(RelOp::Lt, "2.0", RelOp::Gt, "1.0"));
        // release-tolerant equality
        assert!(intersect_evrs(RelOp::Eq, "1.0-3", RelOp::Eq, "1.0"));
    }
}
