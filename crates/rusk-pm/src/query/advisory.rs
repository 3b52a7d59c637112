//! Advisory-driven filters: classic NEVRA matching against advisory
//! packages, and the set-level security-upgrade mode (EQG).

use std::cmp::Ordering;

use rusk_evr::evrcmp;

use crate::advisory::AdvisoryPkg;
use crate::package_set::PackageSet;
use crate::pool::{Pool, SolvableId};
use crate::query::filter::{CmpType, Filter, QueryKey};
use crate::query::{ExcludeFlags, Query};

impl Query<'_> {
    /// Reduce to packages named by matching advisories. Classic mode
    /// compares each candidate's NEVRA against the advisory packages; EQG
    /// treats the filter as a security-upgrade selection, optionally
    /// restricted to upgrade candidates (UPGRADE) and extended to all
    /// higher-EVR siblings (GT).
    pub(crate) fn filter_advisory(&self, f: &Filter, m: &mut PackageSet, key: QueryKey) {
        let sack = self.sack();
        let pool = sack.pool();
        let result = self.result.as_ref().unwrap();

        let mut pkgs: Vec<AdvisoryPkg> = Vec::new();
        for advisory in sack.advisories() {
            let matched = f.strs().iter().any(|value| match key {
                QueryKey::Advisory => advisory.match_name(value),
                QueryKey::AdvisoryBug => advisory.match_bug(value),
                QueryKey::AdvisoryCve => advisory.match_cve(value),
                QueryKey::AdvisoryType => advisory.match_kind(value),
                QueryKey::AdvisorySeverity => advisory.match_severity(value),
                _ => false,
            });
            if matched {
                pkgs.extend_from_slice(&advisory.packages);
            }
        }
        pkgs.sort_unstable_by_key(|p| (p.name, p.arch, p.evr));

        if f.cmp.contains(CmpType::EQG) {
            self.filter_advisory_eqg(f, m, &pkgs);
            return;
        }

        // classic: binary-search each candidate against the advisory pkgs
        let exact = f.cmp.without_not() == CmpType::EQ;
        if pkgs.is_empty() {
            return;
        }
        for id in result.iter() {
            let s = pool.solvable(id);
            if exact {
                let probe = (s.name, s.arch, s.evr);
                let idx = pkgs.partition_point(|p| (p.name, p.arch, p.evr) < probe);
                if pkgs.get(idx).map(|p| (p.name, p.arch, p.evr)) == Some(probe) {
                    m.set(id);
                }
            } else {
                let probe = (s.name, s.arch);
                let mut idx = pkgs.partition_point(|p| (p.name, p.arch) < probe);
                while idx < pkgs.len() && pkgs[idx].name == s.name && pkgs[idx].arch == s.arch {
                    let ord = evrcmp(pool.id2str(s.evr), pool.id2str(pkgs[idx].evr));
                    let hit = match ord {
                        Ordering::Greater => f.cmp.contains(CmpType::GT),
                        Ordering::Less => f.cmp.contains(CmpType::LT),
                        Ordering::Equal => f.cmp.contains(CmpType::EQ),
                    };
                    if hit {
                        m.set(id);
                        break;
                    }
                    idx += 1;
                }
            }
        }
    }

    fn filter_advisory_eqg(&self, f: &Filter, m: &mut PackageSet, pkgs: &[AdvisoryPkg]) {
        let sack = self.sack();
        let pool = sack.pool();
        let result = self.result.as_ref().unwrap();
        let noarch = pool.lookup_str("noarch");

        let mut installed_latest: Vec<SolvableId> = Vec::new();
        let mut candidates: Vec<SolvableId>;

        if f.cmp.contains(CmpType::UPGRADE) {
            // Candidates must share (name, arch) with an installed pkg,
            // share the name when noarch is involved on either side, or
            // obsolete something installed or about to be installed.
            let mut installed = Query::with_flags(sack, ExcludeFlags::IgnoreExcludes);
            installed.installed();
            installed
                .add_filter_num(QueryKey::LatestPerArch, CmpType::EQ, 1)
                .expect("latest filter is valid");
            installed_latest = installed.run_set().iter().collect();
            installed_latest.sort_unstable_by_key(|&id| pool.solvable(id).name);

            let mut possibly_obsoleted = Query::with_flags(sack, ExcludeFlags::IgnoreExcludes);
            possibly_obsoleted
                .add_filter_pkgs(QueryKey::Pkg, CmpType::EQ, result)
                .expect("pkg filter is valid");
            possibly_obsoleted
                .add_filter_num(QueryKey::Upgrades, CmpType::EQ, 1)
                .expect("upgrades filter is valid");
            possibly_obsoleted.union(&mut installed);

            let mut obsoleters = Query::with_flags(sack, ExcludeFlags::IgnoreExcludes);
            obsoleters
                .add_filter_pkgs(QueryKey::Pkg, CmpType::EQ, result)
                .expect("pkg filter is valid");
            obsoleters.available();
            obsoleters
                .add_filter_pkgs(
                    QueryKey::Obsoletes,
                    CmpType::EQ,
                    possibly_obsoleted.run_set(),
                )
                .expect("obsoletes filter is valid");
            candidates = obsoleters.run_set().iter().collect();

            for id in result.iter() {
                let s = pool.solvable(id);
                let idx =
                    installed_latest.partition_point(|&i| pool.solvable(i).name < s.name);
                for &inst in &installed_latest[idx..] {
                    let si = pool.solvable(inst);
                    if si.name != s.name {
                        break;
                    }
                    if s.arch == si.arch
                        || Some(s.arch) == noarch
                        || Some(si.arch) == noarch
                    {
                        candidates.push(id);
                        break;
                    }
                }
            }

            // keep only the best-priority repo group per (name, arch)
            candidates.sort_by(|&a, &b| {
                let sa = pool.solvable(a);
                let sb = pool.solvable(b);
                sa.name
                    .cmp(&sb.name)
                    .then_with(|| sa.arch.cmp(&sb.arch))
                    .then_with(|| pool.repo_priority(a).cmp(&pool.repo_priority(b)))
            });
            let mut pruned = Vec::with_capacity(candidates.len());
            let mut name = 0;
            let mut arch = 0;
            let mut priority = 0;
            for &id in &candidates {
                let s = pool.solvable(id);
                if pool.is_installed(id) {
                    pruned.push(id);
                } else if name != s.name || arch != s.arch {
                    name = s.name;
                    arch = s.arch;
                    priority = pool.repo_priority(id);
                    pruned.push(id);
                } else if priority == pool.repo_priority(id) {
                    pruned.push(id);
                }
            }
            candidates = pruned;
        } else {
            candidates = result.iter().collect();
        }

        candidates.sort_by(|&a, &b| {
            let sa = pool.solvable(a);
            let sb = pool.solvable(b);
            sa.name
                .cmp(&sb.name)
                .then_with(|| sa.arch.cmp(&sb.arch))
                .then_with(|| pool.evrcmp_solvables(a, b))
        });

        for pkg in pkgs {
            if f.cmp.contains(CmpType::UPGRADE)
                && advisory_already_resolved(pool, &installed_latest, pkg)
            {
                continue;
            }
            // the first candidate at or above the advisory EVR satisfies it
            let idx = candidates.partition_point(|&c| {
                let s = pool.solvable(c);
                (s.name, s.arch) < (pkg.name, pkg.arch)
                    || ((s.name, s.arch) == (pkg.name, pkg.arch)
                        && evrcmp(pool.id2str(s.evr), pool.id2str(pkg.evr)) == Ordering::Less)
            });
            let mut idx = idx;
            let mut first = true;
            while idx < candidates.len() {
                let s = pool.solvable(candidates[idx]);
                if s.name != pkg.name || s.arch != pkg.arch {
                    break;
                }
                m.set(candidates[idx]);
                if first && !f.cmp.contains(CmpType::GT) {
                    break;
                }
                first = false;
                idx += 1;
            }
        }
    }

    /// Applicable advisory packages relative to the query result: for each
    /// candidate, the advisory entries of the same (name, arch) whose EVR
    /// compares as requested against the candidate's.
    pub fn advisory_packages(&mut self, cmp: CmpType) -> Vec<AdvisoryPkg> {
        self.apply();
        let sack = self.sack();
        let pool = sack.pool();

        let mut pkgs: Vec<AdvisoryPkg> = sack
            .advisories()
            .flat_map(|a| a.packages.iter().copied())
            .collect();
        pkgs.sort_unstable_by_key(|p| (p.name, p.arch, p.evr));

        let mut out = Vec::new();
        if pkgs.is_empty() {
            return out;
        }
        for id in self.result.as_ref().unwrap().iter() {
            let s = pool.solvable(id);
            let probe = (s.name, s.arch);
            let mut idx = pkgs.partition_point(|p| (p.name, p.arch) < probe);
            while idx < pkgs.len() && pkgs[idx].name == s.name && pkgs[idx].arch == s.arch {
                let ord = evrcmp(pool.id2str(pkgs[idx].evr), pool.id2str(s.evr));
                let hit = match ord {
                    Ordering::Greater => cmp.contains(CmpType::GT),
                    Ordering::Less => cmp.contains(CmpType::LT),
                    Ordering::Equal => cmp.contains(CmpType::EQ),
                };
                if hit {
                    out.push(pkgs[idx]);
                }
                idx += 1;
            }
        }
        out
    }
}

/// In UPGRADE mode an advisory entry whose EVR is not above the installed
/// version asks for nothing.
fn advisory_already_resolved(
    pool: &Pool,
    installed_latest: &[SolvableId],
    pkg: &AdvisoryPkg,
) -> bool {
    let idx = installed_latest.partition_point(|&i| pool.solvable(i).name < pkg.name);
    for &inst in &installed_latest[idx..] {
        let s = pool.solvable(inst);
        if s.name != pkg.name {
            break;
        }
        if s.arch == pkg.arch
            && evrcmp(pool.id2str(s.evr), pool.id2str(pkg.evr)) != Ordering::Less
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::AdvisoryDef;
    use crate::sack::{PackageDef, Sack};

    fn security_sack() -> Sack {
        let mut sack = Sack::new();
        sack.add_repo(
            "@System",
            99,
            true,
            vec![PackageDef::new("openssl", "1.0-1", "x86_64")],
        );
        sack.add_repo(
            "updates",
            99,
            false,
            vec![
                PackageDef::new("openssl", "1.0-2", "x86_64"),
                PackageDef::new("openssl", "1.0-3", "x86_64"),
            ],
        );
        let mut advisory = AdvisoryDef::new("RUSKSA-2024-001", "security");
        advisory.severity = Some("Important".to_string());
        advisory.cves.push("CVE-2024-0001".to_string());
        advisory.packages.push(("openssl".to_string(), "1.0-2".to_string(), "x86_64".to_string()));
        sack.add_advisory(advisory);
        sack
    }

    #[test]
    fn test_advisory_classic_eq() {
        let sack = security_sack();
        let mut query = Query::new(&sack);
        query
            .add_filter_str(QueryKey::Advisory, CmpType::EQ, "RUSKSA-2024-001")
            .unwrap();
        // exactly the advisory NEVRA
        assert_eq!(query.run_ids(), vec![2]);
    }

    #[test]
    fn test_advisory_classic_gt() {
        let sack = security_sack();
        let mut query = Query::new(&sack);
        query
            .add_filter_str(QueryKey::AdvisoryType, CmpType::GT, "security")
            .unwrap();
        // strictly newer than the advisory NEVRA
        assert_eq!(query.run_ids(), vec![3]);
    }

    #[test]
    fn test_advisory_eqg_upgrade_minimal() {
        let sack = security_sack();
        let mut query = Query::new(&sack);
        query
            .add_filter_str(
                QueryKey::AdvisoryType,
                CmpType::EQG | CmpType::UPGRADE,
                "security",
            )
            .unwrap();
        // the lowest candidate satisfying the advisory
        assert_eq!(query.run_ids(), vec![2]);
    }

    #[test]
    fn test_advisory_eqg_upgrade_all_higher() {
        let sack = security_sack();
        let mut query = Query::new(&sack);
        query
            .add_filter_str(
                QueryKey::AdvisoryType,
                CmpType::EQG | CmpType::UPGRADE | CmpType::GT,
                "security",
            )
            .unwrap();
        assert_eq!(query.run_ids(), vec![2, 3]);
    }

    #[test]
    fn test_advisory_eqg_skips_resolved() {
        let mut sack = Sack::new();
        sack.add_repo(
            "@System",
            99,
            true,
            vec![PackageDef::new("openssl", "1.0-2", "x86_64")],
        );
        sack.add_repo(
            "updates",
            99,
            false,
            vec![PackageDef::new("openssl", "1.0-2", "x86_64")],
        );
        let mut advisory = AdvisoryDef::new("RUSKSA-2024-001", "security");
        advisory.packages.push(("openssl".to_string(), "1.0-2".to_string(), "x86_64".to_string()));
        sack.add_advisory(advisory);

        let mut query = Query::new(&sack);
        query
            .add_filter_str(
                QueryKey::AdvisoryType,
                CmpType::EQG | CmpType::UPGRADE,
                "security",
            )
            .unwrap();
        // installed version already satisfies the advisory
        assert!(query.is_empty());
    }

    #[test]
    fn test_advisory_cve_and_severity_match() {
        let sack = security_sack();

        let mut by_cve = Query::new(&sack);
        by_cve.add_filter_str(QueryKey::AdvisoryCve, CmpType::EQ, "CVE-2024-0001").unwrap();
        assert_eq!(by_cve.run_ids(), vec![2]);

        let mut by_severity = Query::new(&sack);
        by_severity
            .add_filter_str(QueryKey::AdvisorySeverity, CmpType::EQ, "Important")
            .unwrap();
        assert_eq!(by_severity.run_ids(), vec![2]);
    }

    #[test]
    fn test_advisory_packages_listing() {
        let sack = security_sack();
        let mut query = Query::new(&sack);
        query.installed();
        let pkgs = query.advisory_packages(CmpType::GT);
        assert_eq!(pkgs.len(), 1);
        assert_eq!(sack.pool().id2str(pkgs[0].evr), "1.0-2");
    }
}
