//! Cross-cutting query engine tests: exclude masks, strict NEVRA matching,
//! latest partitions, and subject resolution.

use rusk_pm::{CmpType, ExcludeFlags, PackageDef, PackageSet, Query, QueryKey, Sack};

fn versioned_sack() -> Sack {
    let mut sack = Sack::new();
    sack.add_repo(
        "@System",
        99,
        true,
        vec![PackageDef::new("dnf", "0:2.8.9-1.fc27", "noarch")],
    );
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
fn result_stays_inside_considered() {
    let mut sack = versioned_sack();
    let mut excluded = PackageSet::new();
    excluded.set(3);
    excluded.set(4);
    sack.add_excludes(&excluded);

    let mut query = Query::new(&sack);
    let considered = sack.considered();
    for id in query.run_set().iter() {
        assert!(considered.has(id));
    }
    assert!(!query.run_set().has(3));

    // a query ignoring excludes still sees everything
    let mut unmasked = Query::with_flags(&sack, ExcludeFlags::IgnoreExcludes);
    assert!(unmasked.run_set().has(3));
}

#[test]
fn nevra_strict_epoch_parse() {
    let sack = versioned_sack();

    for pattern in ["dnf-0:2.8.9-1.fc27.noarch", "dnf-2.8.9-1.fc27.noarch"] {
        let mut query = Query::new(&sack);
        query.add_filter_str(QueryKey::NevraStrict, CmpType::EQ, pattern).unwrap();
        assert_eq!(query.run_ids(), vec![1], "pattern {pattern}");
    }

    // no arch suffix: matches nothing
    let mut query = Query::new(&sack);
    query
        .add_filter_str(QueryKey::NevraStrict, CmpType::EQ, "dnf-2.8.9-1.fc27")
        .unwrap();
    assert!(query.is_empty());
}

#[test]
fn nevra_strict_roundtrip_installed() {
    let sack = versioned_sack();
    let pool = sack.pool();
    let mut installed = Query::new(&sack);
    installed.installed();
    for id in installed.run_ids() {
        let nevra = pool.solvable_nevra(id, false);
        let mut query = Query::new(&sack);
        query.add_filter_str(QueryKey::NevraStrict, CmpType::EQ, &nevra).unwrap();
        assert_eq!(query.run_ids(), vec![id], "nevra {nevra}");
    }
}

#[test]
fn latest_per_arch_partition() {
    let sack = versioned_sack();

    let mut keep_one = Query::new(&sack);
    keep_one.add_filter_num(QueryKey::LatestPerArch, CmpType::EQ, 1).unwrap();
    // foo-2.i686 and foo-3.x86_64 (and the sole installed dnf)
    assert_eq!(keep_one.run_ids(), vec![1, 3, 6]);

    let mut skip_one = Query::new(&sack);
    skip_one.add_filter_num(QueryKey::LatestPerArch, CmpType::EQ, -1).unwrap();
    assert_eq!(skip_one.run_ids(), vec![2, 4, 5]);
}

#[test]
fn latest_respects_evr_ordering_invariant() {
    let sack = versioned_sack();
    let pool = sack.pool();

    let mut latest = Query::new(&sack);
    latest.add_filter_num(QueryKey::LatestPerArch, CmpType::EQ, 1).unwrap();
    let kept = latest.run_ids();

    let mut all = Query::new(&sack);
    for id in all.run_ids() {
        let s = pool.solvable(id);
        for &winner in &kept {
            let w = pool.solvable(winner);
            if w.name == s.name && w.arch == s.arch {
                assert_ne!(
                    pool.evrcmp_solvables(id, winner),
                    std::cmp::Ordering::Greater,
                    "excluded {id} has higher EVR than kept {winner}"
                );
            }
        }
    }
}

#[test]
fn subject_resolution_prefers_specific_forms() {
    let mut sack = Sack::new();
    let mut grep = PackageDef::new("grep", "3.1-1", "x86_64");
    grep.filelist.push("/usr/bin/grep".to_string());
    grep.provides.push("text-matcher = 1".to_string());
    sack.add_repo("fedora", 99, false, vec![grep]);

    // full NEVRA
    let mut by_nevra = Query::new(&sack);
    let (ok, parsed) = by_nevra.filter_subject("grep-3.1-1.x86_64", None, false, true, true, true);
    assert!(ok);
    assert_eq!(parsed.unwrap().name, "grep");
    assert_eq!(by_nevra.run_ids(), vec![1]);

    // provides fallback
    let mut by_provides = Query::new(&sack);
    let (ok, parsed) = by_provides.filter_subject("text-matcher", None, false, true, true, true);
    assert!(ok);
    assert!(parsed.is_none());
    assert_eq!(by_provides.run_ids(), vec![1]);

    // file fallback
    let mut by_file = Query::new(&sack);
    let (ok, _) = by_file.filter_subject("/usr/bin/grep", None, false, true, true, true);
    assert!(ok);
    assert_eq!(by_file.run_ids(), vec![1]);

    // nothing matches: the query ends up empty but stays usable
    let mut none = Query::new(&sack);
    let (ok, _) = none.filter_subject("gone-1.0-1.x86_64", None, false, true, true, true);
    assert!(!ok);
    assert!(none.is_empty());
}

#[test]
fn reponame_filter() {
    let sack = versioned_sack();
    let mut query = Query::new(&sack);
    query.add_filter_str(QueryKey::Reponame, CmpType::EQ, "@System").unwrap();
    assert_eq!(query.run_ids(), vec![1]);
}

#[test]
fn epoch_filter() {
    let mut sack = Sack::new();
    sack.add_repo(
        "fedora",
        99,
        false,
        vec![
            PackageDef::new("zlib", "1:1.2-1", "x86_64"),
            PackageDef::new("zlib", "1.3-1", "x86_64"),
        ],
    );
    let mut query = Query::new(&sack);
    query.add_filter_num(QueryKey::Epoch, CmpType::GT, 0).unwrap();
    assert_eq!(query.run_ids(), vec![1]);
}

#[test]
fn evr_and_version_filters() {
    let sack = versioned_sack();

    let mut newer = Query::new(&sack);
    newer.add_filter_str(QueryKey::Name, CmpType::EQ, "foo").unwrap();
    newer.add_filter_str(QueryKey::Evr, CmpType::GT, "1-1").unwrap();
    assert_eq!(newer.run_ids(), vec![3, 5, 6]);

    let mut version_glob = Query::new(&sack);
    version_glob.add_filter_str(QueryKey::Version, CmpType::GLOB, "2*").unwrap();
    version_glob.add_filter_str(QueryKey::Name, CmpType::EQ, "foo").unwrap();
    assert_eq!(version_glob.run_ids(), vec![3, 5]);
}

#[test]
fn nevra_glob_filter() {
    let sack = versioned_sack();
    let mut query = Query::new(&sack);
    query.add_filter_str(QueryKey::Nevra, CmpType::GLOB, "foo-2*.x86_64").unwrap();
    assert_eq!(query.run_ids(), vec![5]);
}
