//! SAT rules and the rule store.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::pool::{DepId, SolvableId};

/// A literal: positive means "install", negative means "keep out".
pub type Literal = i32;

pub type RuleId = u32;

/// What produced a rule. Doubles as the rule-info kind reported to the
/// problem renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// A user job entry (install/erase/lock request).
    Job,
    /// A job selection that matched no package.
    JobUnknownPackage,
    /// A job provides selection with no provider.
    JobNothingProvidesDep,
    /// A request the solver cannot express.
    JobUnsupported,
    /// A requested dependency the system itself already provides.
    JobProvidedBySystem,
    /// Generic dependency problem.
    Pkg,
    /// Keep-or-replace rule for an installed package.
    Update,
    /// Keep-or-sync rule during distupgrade.
    Distupgrade,
    /// Candidate excluded by arch policy.
    Infarch,
    /// A best-candidate constraint.
    Best,
    /// `-p | providers...`
    PkgRequires,
    /// A requirement with no providers at all.
    PkgNothingProvidesDep,
    /// A candidate masked out or otherwise uninstallable.
    PkgNotInstallable,
    /// Two versions of one name cannot coexist.
    PkgSameName,
    /// Explicit conflict between two packages.
    PkgConflicts,
    /// `p` conflicts with something it provides itself.
    PkgSelfConflict,
    /// Explicit obsoletes between two packages.
    PkgObsoletes,
    /// An installed package's obsoletes hitting a candidate.
    PkgInstalledObsoletes,
    /// Same-name replacement of an installed package.
    PkgImplicitObsoletes,
    /// Two candidates obsoleting the same package.
    Yumobs,
    /// Learned during conflict analysis.
    Learned,
}

/// Coarse rule class used for decision reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    Job,
    Pkg,
    Update,
    Best,
    Learned,
}

impl RuleKind {
    pub fn class(self) -> RuleClass {
        match self {
            RuleKind::Job
            | RuleKind::JobUnknownPackage
            | RuleKind::JobNothingProvidesDep
            | RuleKind::JobUnsupported
            | RuleKind::JobProvidedBySystem => RuleClass::Job,
            RuleKind::Update | RuleKind::Distupgrade => RuleClass::Update,
            RuleKind::Best => RuleClass::Best,
            RuleKind::Learned => RuleClass::Learned,
            _ => RuleClass::Pkg,
        }
    }
}

/// A disjunction of literals with bookkeeping for problem reporting.
#[derive(Clone)]
pub struct Rule {
    literals: Vec<Literal>,
    kind: RuleKind,
    id: RuleId,
    /// Source solvable for diagnostics (0 = none).
    pub source: SolvableId,
    /// Target solvable for diagnostics (0 = none).
    pub target: SolvableId,
    /// Dependency involved, for diagnostics (0 = none).
    pub dep: DepId,
    /// Weak rules are silently disabled instead of failing the solve.
    pub weak: bool,
    /// Marks a cleandeps erasure assertion.
    pub cleandeps: bool,
    disabled: bool,
}

impl Rule {
    pub fn new(literals: Vec<Literal>, kind: RuleKind) -> Self {
        Self {
            literals,
            kind,
            id: 0,
            source: 0,
            target: 0,
            dep: 0,
            weak: false,
            cleandeps: false,
            disabled: false,
        }
    }

    pub fn assertion(literal: Literal, kind: RuleKind) -> Self {
        Self::new(vec![literal], kind)
    }

    /// `if source is in, one of targets must be` — targets may be empty for
    /// an unsatisfiable requirement.
    pub fn requires(source: SolvableId, targets: &[SolvableId], kind: RuleKind) -> Self {
        let mut literals = vec![-source];
        literals.extend(targets.iter().copied());
        Self::new(literals, kind)
    }

    /// The two packages cannot both be in.
    pub fn conflict(a: SolvableId, b: SolvableId, kind: RuleKind) -> Self {
        Self::new(vec![-a, -b], kind)
    }

    pub fn learned(literals: Vec<Literal>) -> Self {
        Self::new(literals, RuleKind::Learned)
    }

    pub fn with_source(mut self, source: SolvableId) -> Self {
        self.source = source;
        self
    }

    pub fn with_target(mut self, target: SolvableId) -> Self {
        self.target = target;
        self
    }

    pub fn with_dep(mut self, dep: DepId) -> Self {
        self.dep = dep;
        self
    }

    pub fn weak(mut self) -> Self {
        self.weak = true;
        self
    }

    pub fn set_id(&mut self, id: RuleId) {
        self.id = id;
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn is_assertion(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    /// Order-insensitive hash of the literals, for deduplication.
    pub fn literal_hash(&self) -> u64 {
        let mut sorted = self.literals.clone();
        sorted.sort_unstable();
        let mut hasher = DefaultHasher::new();
        sorted.hash(&mut hasher);
        hasher.finish()
    }

    pub fn equals_literals(&self, other: &Rule) -> bool {
        if self.literals.len() != other.literals.len() {
            return false;
        }
        let mut a = self.literals.clone();
        let mut b = other.literals.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({:?}, {:?})", self.kind, self.literals)
    }
}

/// Rule store with id assignment and literal-level deduplication. Rules of
/// the same literal set but different kinds are kept separate so problem
/// reporting stays precise.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    hashes: HashMap<(RuleKind, u64), RuleId>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut rule: Rule) -> RuleId {
        let key = (rule.kind(), rule.literal_hash());
        if let Some(&existing) = self.hashes.get(&key) {
            if self.rules[existing as usize].equals_literals(&rule) {
                return existing;
            }
        }
        let id = self.rules.len() as RuleId;
        rule.set_id(id);
        self.hashes.insert(key, id);
        self.rules.push(rule);
        id
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id as usize)
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        self.rules.get_mut(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[Rule] {
        &self.rules
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_assertion())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn disable(&mut self, id: RuleId) {
        if let Some(rule) = self.get_mut(id) {
            rule.disable();
        }
    }
}
