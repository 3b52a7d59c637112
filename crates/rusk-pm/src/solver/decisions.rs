//! Decision tracking for the solver.
//!
//! A flat map indexed by solvable id gives O(1) lookups: 0 = undecided,
//! positive = installed at that level, negative = kept out at that level.
//! Levels are stored off by one so level 0 stays distinguishable from
//! undecided.

use crate::pool::SolvableId;
use crate::solver::rule::{Literal, RuleId};

/// Why a decision was taken; reported back through `describe_decision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Forced by an assertion rule.
    Unit,
    /// Chosen to satisfy a job rule.
    ResolveJob,
    /// Chosen to satisfy a package or update rule.
    Resolve,
    /// Pulled in by a weak dependency.
    Weakdep,
    /// Erased because only a removed package needed it.
    CleandepsErase,
    /// An installed package kept as is.
    Keep,
}

#[derive(Debug)]
pub struct Decisions {
    decision_map: Vec<i32>,
    queue: Vec<(Literal, Option<RuleId>, Reason)>,
    level: u32,
}

impl Default for Decisions {
    fn default() -> Self {
        Self::new()
    }
}

impl Decisions {
    pub fn new() -> Self {
        Self { decision_map: Vec::new(), queue: Vec::new(), level: 0 }
    }

    fn ensure_capacity(&mut self, id: SolvableId) {
        let idx = id as usize;
        if idx >= self.decision_map.len() {
            self.decision_map.resize(idx + 1, 0);
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn increment_level(&mut self) {
        self.level += 1;
    }

    /// Record a decision at the current level. Returns false on conflict
    /// with an existing decision.
    pub fn decide(&mut self, literal: Literal, rule: Option<RuleId>, reason: Reason) -> bool {
        let id = literal.unsigned_abs() as SolvableId;
        self.ensure_capacity(id);
        let existing = self.decision_map[id as usize];
        if existing != 0 {
            return (existing > 0) == (literal > 0);
        }
        let level_value = (self.level + 1) as i32;
        self.decision_map[id as usize] = if literal > 0 { level_value } else { -level_value };
        self.queue.push((literal, rule, reason));
        true
    }

    pub fn satisfied(&self, literal: Literal) -> bool {
        let idx = literal.unsigned_abs() as usize;
        match self.decision_map.get(idx) {
            Some(&d) if d != 0 => (d > 0) == (literal > 0),
            _ => false,
        }
    }

    pub fn conflict(&self, literal: Literal) -> bool {
        let idx = literal.unsigned_abs() as usize;
        match self.decision_map.get(idx) {
            Some(&d) if d != 0 => (d > 0) != (literal > 0),
            _ => false,
        }
    }

    pub fn decided(&self, id: SolvableId) -> bool {
        matches!(self.decision_map.get(id as usize), Some(&d) if d != 0)
    }

    pub fn undecided(&self, id: SolvableId) -> bool {
        !self.decided(id)
    }

    pub fn decided_install(&self, id: SolvableId) -> bool {
        matches!(self.decision_map.get(id as usize), Some(&d) if d > 0)
    }

    pub fn decided_remove(&self, id: SolvableId) -> bool {
        matches!(self.decision_map.get(id as usize), Some(&d) if d < 0)
    }

    pub fn decision_level(&self, literal: Literal) -> Option<u32> {
        let idx = literal.unsigned_abs() as usize;
        match self.decision_map.get(idx) {
            Some(&d) if d != 0 => Some(d.unsigned_abs() - 1),
            _ => None,
        }
    }

    /// The rule that produced the decision on this package, if any.
    pub fn decision_rule(&self, literal: Literal) -> Option<RuleId> {
        let id = literal.unsigned_abs() as SolvableId;
        self.queue
            .iter()
            .find(|(lit, _, _)| lit.unsigned_abs() as SolvableId == id)
            .and_then(|&(_, rule, _)| rule)
    }

    pub fn decision_reason(&self, id: SolvableId) -> Option<(Reason, Option<RuleId>)> {
        self.queue
            .iter()
            .find(|(lit, _, _)| lit.unsigned_abs() as SolvableId == id)
            .map(|&(_, rule, reason)| (reason, rule))
    }

    /// Drop every decision above the target level.
    pub fn revert_to_level(&mut self, target: u32) {
        let cutoff = (target + 1) as i32;
        for decision in &mut self.decision_map {
            if *decision != 0 && decision.unsigned_abs() as i32 > cutoff {
                *decision = 0;
            }
        }
        let map = &self.decision_map;
        self.queue.retain(|(lit, _, _)| {
            let idx = lit.unsigned_abs() as usize;
            idx < map.len() && map[idx] != 0
        });
        self.level = target;
    }

    pub fn installed_packages(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.decision_map
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0)
            .map(|(id, _)| id as SolvableId)
    }

    pub fn queue(&self) -> &[(Literal, Option<RuleId>, Reason)] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn reset(&mut self) {
        self.decision_map.fill(0);
        self.queue.clear();
        self.level = 0;
    }
}
