//! Two-watched-literal graph for unit propagation.
//!
//! Each non-assertion rule watches two of its literals. When a watched
//! literal becomes false the watch moves to another non-false literal;
//! failing that, the rule is unit or conflicting.

use crate::solver::rule::{Literal, Rule, RuleId, RuleSet};

#[derive(Debug, Clone, Copy)]
pub(crate) struct WatchNode {
    rule_id: RuleId,
    other_watch: Literal,
}

#[derive(Debug, Default)]
pub struct WatchGraph {
    watches: Vec<Vec<WatchNode>>,
}

impl WatchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn literal_to_index(literal: Literal) -> usize {
        let abs = literal.unsigned_abs() as usize;
        if literal > 0 {
            abs * 2
        } else {
            abs * 2 + 1
        }
    }

    fn watches_mut(&mut self, literal: Literal) -> &mut Vec<WatchNode> {
        let idx = Self::literal_to_index(literal);
        if idx >= self.watches.len() {
            self.watches.resize(idx + 1, Vec::new());
        }
        &mut self.watches[idx]
    }

    pub fn from_rules(rules: &RuleSet) -> Self {
        let mut graph = Self::new();
        for rule in rules.iter() {
            if rule.is_disabled() || rule.literals().len() < 2 {
                continue;
            }
            graph.add_rule(rule);
        }
        graph
    }

    pub fn add_rule(&mut self, rule: &Rule) {
        let literals = rule.literals();
        if literals.len() < 2 {
            return;
        }
        let (watch1, watch2) = (literals[0], literals[1]);
        self.watches_mut(watch1).push(WatchNode { rule_id: rule.id(), other_watch: watch2 });
        self.watches_mut(watch2).push(WatchNode { rule_id: rule.id(), other_watch: watch1 });
    }

    fn get_watches(&self, literal: Literal) -> &[WatchNode] {
        let idx = Self::literal_to_index(literal);
        self.watches.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    fn remove_watch(&mut self, literal: Literal, rule_id: RuleId) {
        let idx = Self::literal_to_index(literal);
        if idx < self.watches.len() {
            self.watches[idx].retain(|w| w.rule_id != rule_id);
        }
    }

    fn move_watch(&mut self, rule_id: RuleId, from: Literal, to: Literal, other: Literal) {
        self.remove_watch(from, rule_id);
        self.watches_mut(to).push(WatchNode { rule_id, other_watch: other });
    }
}

/// Outcome of propagating one decided literal into one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagateResult {
    Ok,
    /// The rule became unit; the literal must be decided with the rule as
    /// its reason.
    Unit(Literal, RuleId),
    Conflict(RuleId),
}

pub struct Propagator<'a> {
    graph: &'a mut WatchGraph,
    rules: &'a RuleSet,
}

impl<'a> Propagator<'a> {
    pub fn new(graph: &'a mut WatchGraph, rules: &'a RuleSet) -> Self {
        Self { graph, rules }
    }

    /// Propagate a freshly decided literal. `is_satisfied` returns `None`
    /// for undecided literals.
    pub fn propagate<F>(&mut self, literal: Literal, mut is_satisfied: F) -> Vec<PropagateResult>
    where
        F: FnMut(Literal) -> Option<bool>,
    {
        let mut results = Vec::new();
        let false_literal = -literal;
        let watches: Vec<_> = self.graph.get_watches(false_literal).to_vec();

        for watch in watches {
            let Some(rule) = self.rules.get(watch.rule_id) else { continue };
            if rule.is_disabled() {
                continue;
            }

            let other = watch.other_watch;
            let outcome = match is_satisfied(other) {
                Some(true) => PropagateResult::Ok,
                Some(false) => {
                    self.find_new_watch(rule, false_literal, other, &mut is_satisfied)
                }
                None => self.check_unit(rule, false_literal, other, &mut is_satisfied),
            };
            if outcome != PropagateResult::Ok {
                results.push(outcome);
            }
        }

        results
    }

    /// Both watched literals are false: find a replacement watch, else the
    /// rule is conflicting.
    fn find_new_watch<F>(
        &mut self,
        rule: &Rule,
        false_literal: Literal,
        other_false: Literal,
        is_satisfied: &mut F,
    ) -> PropagateResult
    where
        F: FnMut(Literal) -> Option<bool>,
    {
        for &lit in rule.literals() {
            if lit == false_literal || lit == other_false {
                continue;
            }
            if is_satisfied(lit) != Some(false) {
                self.graph.move_watch(rule.id(), false_literal, lit, other_false);
                return PropagateResult::Ok;
            }
        }
        PropagateResult::Conflict(rule.id())
    }

    /// One watched literal false, the other undecided: if every other
    /// literal is false the rule is unit on the undecided one.
    fn check_unit<F>(
        &mut self,
        rule: &Rule,
        false_literal: Literal,
        undecided: Literal,
        is_satisfied: &mut F,
    ) -> PropagateResult
    where
        F: FnMut(Literal) -> Option<bool>,
    {
        for &lit in rule.literals() {
            if lit == false_literal || lit == undecided {
                continue;
            }
            if is_satisfied(lit) != Some(false) {
                self.graph.move_watch(rule.id(), false_literal, lit, undecided);
                return PropagateResult::Ok;
            }
        }
        PropagateResult::Unit(undecided, rule.id())
    }
}
