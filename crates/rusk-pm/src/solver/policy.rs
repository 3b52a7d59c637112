//! Candidate ordering policy.
//!
//! When several packages can satisfy a requirement the policy decides which
//! to try first: favored before ordinary before disfavored, installed before
//! available, better repo priority first (smaller value wins), then higher
//! EVR, then insertion order.

use std::collections::HashSet;

use crate::pool::{Pool, SolvableId};

#[derive(Debug, Default)]
pub struct Policy {
    pub favored: HashSet<SolvableId>,
    pub disfavored: HashSet<SolvableId>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    fn bias(&self, id: SolvableId) -> i32 {
        if self.disfavored.contains(&id) {
            1
        } else if self.favored.contains(&id) {
            -1
        } else {
            0
        }
    }

    /// Sort candidates best-first.
    pub fn order_candidates(
        &self,
        pool: &Pool,
        candidates: &mut [SolvableId],
        prefer_installed: bool,
    ) {
        candidates.sort_by(|&a, &b| {
            let bias = self.bias(a).cmp(&self.bias(b));
            if bias != std::cmp::Ordering::Equal {
                return bias;
            }
            if prefer_installed {
                let inst = pool.is_installed(b).cmp(&pool.is_installed(a));
                if inst != std::cmp::Ordering::Equal {
                    return inst;
                }
            }
            pool.repo_priority(a)
                .cmp(&pool.repo_priority(b))
                .then_with(|| pool.evrcmp_solvables(b, a))
                .then_with(|| a.cmp(&b))
        });
    }

    /// Reduce to the best-EVR candidates of each name, for FORCEBEST jobs.
    pub fn best_subset(&self, pool: &Pool, candidates: &[SolvableId]) -> Vec<SolvableId> {
        let mut by_name: Vec<SolvableId> = candidates.to_vec();
        by_name.sort_by(|&a, &b| {
            pool.solvable(a)
                .name
                .cmp(&pool.solvable(b).name)
                .then_with(|| pool.evrcmp_solvables(b, a))
                .then_with(|| a.cmp(&b))
        });
        let mut out = Vec::new();
        let mut current_name = 0;
        let mut best_evr = 0;
        for id in by_name {
            let s = pool.solvable(id);
            if s.name != current_name {
                current_name = s.name;
                best_evr = s.evr;
                out.push(id);
            } else if s.evr == best_evr
                || pool.evrcmp_solvables(id, out[out.len() - 1]) == std::cmp::Ordering::Equal
            {
                out.push(id);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sack::{PackageDef, Sack};

    fn sack() -> Sack {
        let mut sack = Sack::new();
        sack.add_repo("@System", 99, true, vec![PackageDef::new("foo", "1-1", "x86_64")]);
        sack.add_repo(
            "updates",
            99,
            false,
            vec![
                PackageDef::new("foo", "2-1", "x86_64"),
                PackageDef::new("foo", "3-1", "x86_64"),
            ],
        );
        sack
    }

    #[test]
    fn test_order_prefers_highest_evr() {
        let sack = sack();
        let policy = Policy::new();
        let mut candidates = vec![2, 3];
        policy.order_candidates(sack.pool(), &mut candidates, false);
        assert_eq!(candidates, vec![3, 2]);
    }

    #[test]
    fn test_order_prefers_installed_when_asked() {
        let sack = sack();
        let policy = Policy::new();
        let mut candidates = vec![2, 3, 1];
        policy.order_candidates(sack.pool(), &mut candidates, true);
        assert_eq!(candidates[0], 1);
    }

    #[test]
    fn test_favor_and_disfavor() {
        let sack = sack();
        let mut policy = Policy::new();
        policy.favored.insert(2);
        policy.disfavored.insert(3);
        let mut candidates = vec![2, 3];
        policy.order_candidates(sack.pool(), &mut candidates, false);
        assert_eq!(candidates, vec![2, 3]);
    }

    #[test]
    fn test_best_subset() {
        let sack = sack();
        let policy = Policy::new();
        let best = policy.best_subset(sack.pool(), &[1, 2, 3]);
        assert_eq!(best, vec![3]);
    }
}
