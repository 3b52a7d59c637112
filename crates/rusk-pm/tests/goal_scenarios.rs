//! End-to-end goal engine tests over small, explicit package universes.

use rusk_pm::{
    format_all_problem_rules, CmpType, Goal, GoalActions, PackageDef, PackageReason, PackageSet,
    Query, QueryKey, Sack, Selector,
};

fn ids(set: &PackageSet) -> Vec<i32> {
    set.iter().collect()
}

#[test]
fn simple_install() {
    let mut sack = Sack::new();
    sack.add_repo("fedora", 99, false, vec![PackageDef::new("A", "1.0-1", "x86_64")]);

    let mut goal = Goal::new(&sack);
    let mut selector = Selector::new(&sack);
    selector.set_name(CmpType::EQ, "A").unwrap();
    goal.install_selector(&selector, false).unwrap();

    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_installs().unwrap()), vec![1]);
    assert!(goal.list_erasures().unwrap().is_empty());
}

#[test]
fn install_pulls_dependencies() {
    let mut sack = Sack::new();
    let mut app = PackageDef::new("app", "1.0-1", "x86_64");
    app.requires.push("libapp >= 1.0".to_string());
    sack.add_repo(
        "fedora",
        99,
        false,
        vec![app, PackageDef::new("libapp", "1.5-1", "x86_64")],
    );

    let mut goal = Goal::new(&sack);
    goal.install(1, false);
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_installs().unwrap()), vec![1, 2]);

    // the job operand gets USER, the dependency DEP
    assert_eq!(goal.get_reason(1), PackageReason::User);
    assert_eq!(goal.get_reason(2), PackageReason::Dep);
}

#[test]
fn protected_erase_blocked() {
    let mut sack = Sack::new();
    sack.add_repo("@System", 99, true, vec![PackageDef::new("kernel", "5.0-1", "x86_64")]);

    let mut goal = Goal::new(&sack);
    let mut protected = PackageSet::new();
    protected.set(1);
    goal.add_protected(&protected);

    let mut selector = Selector::new(&sack);
    selector.set_name(CmpType::EQ, "kernel").unwrap();
    goal.erase_selector(&selector, false).unwrap();

    assert!(!goal.run(GoalActions::empty()));
    assert_eq!(goal.count_problems(), 1);
    let problems = goal.describe_all_problem_rules(true);
    assert_eq!(problems.len(), 1);
    assert!(problems[0][0].contains(
        "The operation would result in removing the following protected packages: kernel"
    ));
}

#[test]
fn erase_unprotected_succeeds() {
    let mut sack = Sack::new();
    sack.add_repo(
        "@System",
        99,
        true,
        vec![
            PackageDef::new("kernel", "5.0-1", "x86_64"),
            PackageDef::new("doomed", "1.0-1", "x86_64"),
        ],
    );
    let mut goal = Goal::new(&sack);
    let mut protected = PackageSet::new();
    protected.set(1);
    goal.add_protected(&protected);
    goal.erase(2, false);

    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_erasures().unwrap()), vec![2]);
    // nothing protected was touched
    let erased = goal.list_erasures().unwrap();
    assert!(!erased.has(1));
}

fn installonly_sack() -> Sack {
    let mut sack = Sack::new();
    sack.add_repo(
        "@System",
        99,
        true,
        vec![
            PackageDef::new("kernel", "1-1", "x86_64"),
            PackageDef::new("kernel", "2-1", "x86_64"),
            PackageDef::new("kernel", "3-1", "x86_64"),
        ],
    );
    sack.add_repo("updates", 99, false, vec![PackageDef::new("kernel", "4-1", "x86_64")]);
    sack.set_installonly(&["kernel"]);
    sack.set_installonly_limit(3);
    sack.set_running_kernel(Some(3));
    sack
}

#[test]
fn installonly_prunes_oldest() {
    let sack = installonly_sack();
    let mut goal = Goal::new(&sack);
    goal.install(4, false);

    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_installs().unwrap()), vec![4]);
    assert_eq!(ids(&goal.list_erasures().unwrap()), vec![1]);
}

#[test]
fn installonly_limit_invariant() {
    let sack = installonly_sack();
    let mut goal = Goal::new(&sack);
    goal.install(4, false);
    assert!(goal.run(GoalActions::empty()));

    let installs = goal.list_installs().unwrap();
    let erasures = goal.list_erasures().unwrap();
    // installed kernels after the transaction
    let mut after: Vec<i32> = (1..=3).filter(|&id| !erasures.has(id)).collect();
    after.extend(installs.iter());
    assert!(after.len() <= sack.installonly_limit());
}

#[test]
fn installonly_under_limit_keeps_everything() {
    let mut sack = installonly_sack();
    sack.set_installonly_limit(5);
    let mut goal = Goal::new(&sack);
    goal.install(4, false);
    assert!(goal.run(GoalActions::empty()));
    assert!(goal.list_erasures().unwrap().is_empty());
}

#[test]
fn conflicting_requests_reported() {
    let mut sack = Sack::new();
    sack.add_repo(
        "fedora",
        99,
        false,
        vec![
            PackageDef::new("A", "1-1", "x86_64"),
            PackageDef::new("A", "2-1", "x86_64"),
        ],
    );
    let mut goal = Goal::new(&sack);
    goal.install(1, false);
    goal.install(2, false);

    assert!(!goal.run(GoalActions::empty()));
    assert!(goal.count_problems() >= 1);
    let problems = goal.describe_all_problem_rules(true);
    let all: Vec<&String> = problems.iter().flatten().collect();
    assert!(all.iter().any(|line| line.contains("conflicting requests")));
}

#[test]
fn problem_rules_deduplicated() {
    let mut sack = Sack::new();
    sack.add_repo(
        "fedora",
        99,
        false,
        vec![
            PackageDef::new("A", "1-1", "x86_64"),
            PackageDef::new("A", "2-1", "x86_64"),
        ],
    );
    let mut goal = Goal::new(&sack);
    goal.install(1, false);
    goal.install(2, false);
    assert!(!goal.run(GoalActions::empty()));

    for problem in goal.describe_all_problem_rules(true) {
        let mut unique = problem.clone();
        unique.dedup();
        assert_eq!(problem.len(), unique.len());
    }
}

#[test]
fn format_single_problem() {
    let mut sack = Sack::new();
    let mut app = PackageDef::new("app", "1.0-1", "x86_64");
    app.requires.push("nowhere".to_string());
    sack.add_repo("fedora", 99, false, vec![app]);

    let mut goal = Goal::new(&sack);
    goal.install(1, false);
    assert!(!goal.run(GoalActions::empty()));

    let rendered = format_all_problem_rules(&goal.describe_all_problem_rules(true));
    assert!(rendered.starts_with("Problem: "));
    assert!(rendered.contains("nothing provides nowhere needed by app-1.0-1.x86_64 from fedora"));
}

#[test]
fn upgrade_all_upgrades() {
    let mut sack = Sack::new();
    sack.add_repo("@System", 99, true, vec![PackageDef::new("foo", "1-1", "x86_64")]);
    sack.add_repo("updates", 99, false, vec![PackageDef::new("foo", "2-1", "x86_64")]);

    let mut goal = Goal::new(&sack);
    goal.upgrade_all();
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_upgrades().unwrap()), vec![2]);
    assert!(goal.list_erasures().unwrap().is_empty());
}

#[test]
fn upgrade_selector_targets_one_name() {
    let mut sack = Sack::new();
    sack.add_repo(
        "@System",
        99,
        true,
        vec![
            PackageDef::new("foo", "1-1", "x86_64"),
            PackageDef::new("bar", "1-1", "x86_64"),
        ],
    );
    sack.add_repo(
        "updates",
        99,
        false,
        vec![
            PackageDef::new("foo", "2-1", "x86_64"),
            PackageDef::new("bar", "2-1", "x86_64"),
        ],
    );

    let mut goal = Goal::new(&sack);
    let mut selector = Selector::new(&sack);
    selector.set_name(CmpType::EQ, "foo").unwrap();
    goal.upgrade_selector(&selector).unwrap();
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_upgrades().unwrap()), vec![3]);
    // bar stays untouched
    assert!(!goal.list_upgrades().unwrap().has(4));
}

#[test]
fn distupgrade_syncs_down_to_repo_version() {
    let mut sack = Sack::new();
    sack.add_repo("@System", 99, true, vec![PackageDef::new("foo", "2-1", "x86_64")]);
    sack.add_repo("stable", 99, false, vec![PackageDef::new("foo", "1-1", "x86_64")]);

    let mut goal = Goal::new(&sack);
    goal.distupgrade_all().unwrap();
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_downgrades().unwrap()), vec![2]);
}

#[test]
fn optional_install_failure_is_soft() {
    let mut sack = Sack::new();
    let mut broken = PackageDef::new("broken", "1-1", "x86_64");
    broken.requires.push("missing".to_string());
    sack.add_repo("fedora", 99, false, vec![broken]);

    let mut goal = Goal::new(&sack);
    goal.install(1, true);
    assert!(goal.run(GoalActions::empty()));
    assert!(goal.list_installs().unwrap().is_empty());

    // with IGNORE_WEAK the soft request fails loudly
    let mut strict = Goal::new(&sack);
    strict.install(1, true);
    assert!(!strict.run(GoalActions::IGNORE_WEAK));
}

#[test]
fn force_best_restricts_to_newest() {
    let mut sack = Sack::new();
    sack.add_repo(
        "fedora",
        99,
        false,
        vec![
            PackageDef::new("pkg", "1-1", "x86_64"),
            PackageDef::new("pkg", "2-1", "x86_64"),
        ],
    );
    let mut goal = Goal::new(&sack);
    let mut selector = Selector::new(&sack);
    selector.set_name(CmpType::EQ, "pkg").unwrap();
    goal.install_selector(&selector, false).unwrap();
    assert!(goal.run(GoalActions::FORCE_BEST));
    assert_eq!(ids(&goal.list_installs().unwrap()), vec![2]);
}

#[test]
fn erase_with_clean_deps_reason() {
    let mut sack = Sack::new();
    let mut app = PackageDef::new("app", "1.0-1", "x86_64");
    app.requires.push("helper".to_string());
    sack.add_repo(
        "@System",
        99,
        true,
        vec![app, PackageDef::new("helper", "1.0-1", "x86_64")],
    );

    let mut goal = Goal::new(&sack);
    goal.erase(1, true);
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_erasures().unwrap()), vec![1, 2]);
    assert_eq!(goal.get_reason(1), PackageReason::User);
    assert_eq!(goal.get_reason(2), PackageReason::Clean);
}

#[test]
fn obsoletes_shown_in_installs_and_obsoleted() {
    let mut sack = Sack::new();
    sack.add_repo("@System", 99, true, vec![PackageDef::new("oldtool", "1-1", "x86_64")]);
    let mut newtool = PackageDef::new("newtool", "2-1", "x86_64");
    newtool.obsoletes.push("oldtool < 2".to_string());
    sack.add_repo("fedora", 99, false, vec![newtool]);

    let mut goal = Goal::new(&sack);
    goal.install(2, false);
    assert!(goal.run(GoalActions::empty()));

    assert_eq!(ids(&goal.list_installs().unwrap()), vec![2]);
    assert_eq!(ids(&goal.list_obsoleted().unwrap()), vec![1]);
    assert!(goal.list_erasures().unwrap().is_empty());
    assert_eq!(goal.list_obsoleted_by_package(2).unwrap(), vec![1]);
}

#[test]
fn listing_before_run_is_an_error() {
    let mut sack = Sack::new();
    sack.add_repo("fedora", 99, false, vec![PackageDef::new("A", "1-1", "x86_64")]);
    let goal = Goal::new(&sack);
    assert!(goal.list_installs().is_err());
}

#[test]
fn rerun_discards_previous_transaction() {
    let mut sack = Sack::new();
    sack.add_repo(
        "fedora",
        99,
        false,
        vec![
            PackageDef::new("A", "1-1", "x86_64"),
            PackageDef::new("B", "1-1", "x86_64"),
        ],
    );
    let mut goal = Goal::new(&sack);
    goal.install(1, false);
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_installs().unwrap()), vec![1]);

    goal.install(2, false);
    assert!(goal.run(GoalActions::empty()));
    assert_eq!(ids(&goal.list_installs().unwrap()), vec![1, 2]);
}

#[test]
fn goal_clone_is_independent() {
    let mut sack = Sack::new();
    sack.add_repo("fedora", 99, false, vec![PackageDef::new("A", "1-1", "x86_64")]);
    let mut goal = Goal::new(&sack);
    goal.install(1, false);

    let mut copy = goal.clone();
    assert!(goal.run(GoalActions::empty()));
    // the clone shares only the sack; it still has to run on its own
    assert!(copy.list_installs().is_err());
    assert!(copy.run(GoalActions::empty()));
    assert_eq!(ids(&copy.list_installs().unwrap()), vec![1]);
}

#[test]
fn weak_autodetect_excludes_unwanted_recommends() {
    let mut sack = Sack::new();
    let mut installed_app = PackageDef::new("app", "1-1", "x86_64");
    installed_app.recommends.push("tool".to_string());
    sack.add_repo("@System", 99, true, vec![installed_app]);
    let mut new_app = PackageDef::new("app", "2-1", "x86_64");
    new_app.recommends.push("tool".to_string());
    sack.add_repo(
        "updates",
        99,
        false,
        vec![new_app, PackageDef::new("tool", "1-1", "x86_64")],
    );

    // without the autodetect the upgrade drags the recommends in
    let mut eager = Goal::new(&sack);
    eager.upgrade_all();
    assert!(eager.run(GoalActions::empty()));
    assert!(eager.list_installs().unwrap().has(3));

    // the installed app never had its recommends satisfied, so keep it that way
    let mut goal = Goal::new(&sack);
    goal.exclude_from_weak_autodetect();
    goal.upgrade_all();
    assert!(goal.run(GoalActions::empty()));
    assert!(!goal.list_installs().unwrap().has(3));
    assert_eq!(ids(&goal.list_upgrades().unwrap()), vec![2]);
}

#[test]
fn user_installed_drives_unneeded() {
    let mut sack = Sack::new();
    let mut app = PackageDef::new("app", "1-1", "x86_64");
    app.requires.push("dep".to_string());
    sack.add_repo(
        "@System",
        99,
        true,
        vec![
            app,
            PackageDef::new("dep", "1-1", "x86_64"),
            PackageDef::new("orphan", "1-1", "x86_64"),
        ],
    );

    let mut user = PackageSet::new();
    user.set(1);
    let mut query = Query::new(&sack);
    query.filter_unneeded(&user).unwrap();
    assert_eq!(query.run_ids(), vec![3]);
}

#[test]
fn safe_to_remove_includes_freed_deps() {
    let mut sack = Sack::new();
    let mut app = PackageDef::new("app", "1-1", "x86_64");
    app.requires.push("dep".to_string());
    sack.add_repo(
        "@System",
        99,
        true,
        vec![app, PackageDef::new("dep", "1-1", "x86_64")],
    );

    let mut user = PackageSet::new();
    user.set(1);
    let mut query = Query::new(&sack);
    query.add_filter_str(QueryKey::Name, CmpType::EQ, "app").unwrap();
    query.filter_safe_to_remove(&user).unwrap();
    // with app no longer counted as user-installed, nothing keeps it alive
    assert_eq!(query.run_ids(), vec![1]);
}

#[test]
fn write_debugdata_creates_dump() {
    let mut sack = Sack::new();
    sack.add_repo("fedora", 99, false, vec![PackageDef::new("A", "1-1", "x86_64")]);
    let mut goal = Goal::new(&sack);
    goal.install(1, false);
    assert!(goal.run(GoalActions::empty()));

    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("debugdata").join("run");
    goal.write_debugdata(&nested).unwrap();
    let dump = std::fs::read_to_string(nested.join("testcase.t")).unwrap();
    assert!(dump.contains("result transaction:"));
    assert!(dump.contains("A-1-1.x86_64"));
}
