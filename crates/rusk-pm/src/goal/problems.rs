//! Rendering of solver rule infos into diagnostic strings.
//!
//! Two taxonomies share the same rule kinds: one speaks about packages, the
//! other about modules. A package renders as the canonical `name-evr.arch`;
//! a module identifier renders as `description:evr:summary.arch`.

use crate::package_set::PackageSet;
use crate::pool::SolvableId;
use crate::sack::Sack;
use crate::solver::{RuleInfo, RuleKind, Solver};

fn pkg2str(sack: &Sack, id: SolvableId) -> String {
    sack.pool().solvable2str(id)
}

fn module2str(sack: &Sack, id: SolvableId) -> String {
    let pool = sack.pool();
    let s = pool.solvable(id);
    let description = s.description.map(|d| pool.id2str(d)).unwrap_or("");
    let summary = s.summary.map(|d| pool.id2str(d)).unwrap_or("");
    format!(
        "{}:{}:{}.{}",
        description,
        pool.id2str(s.evr),
        summary,
        pool.id2str(s.arch)
    )
}

fn repo2str(sack: &Sack, id: SolvableId) -> String {
    let pool = sack.pool();
    pool.repo(pool.solvable(id).repo).name.clone()
}

fn dep2str(sack: &Sack, dep: crate::pool::DepId) -> String {
    if dep == 0 {
        return "unknown".to_string();
    }
    sack.pool().dep2str(dep)
}

/// Render one rule-info quadruple. `pkgs` selects the package taxonomy over
/// the module one.
pub(crate) fn rule_info_to_string(
    sack: &Sack,
    module_excludes: &PackageSet,
    info: &RuleInfo,
    pkgs: bool,
) -> String {
    let noun = if pkgs { "package" } else { "module" };
    let id2str: fn(&Sack, SolvableId) -> String = if pkgs { pkg2str } else { module2str };
    let source = info.source;
    let target = info.target;

    match info.kind {
        RuleKind::Distupgrade => format!(
            "{} from {} does not belong to a distupgrade repository",
            id2str(sack, source),
            repo2str(sack, source)
        ),
        RuleKind::Infarch => format!(
            "{} from {} has inferior architecture",
            id2str(sack, source),
            repo2str(sack, source)
        ),
        RuleKind::Update => format!(
            "problem with installed {} {}",
            noun,
            id2str(sack, source)
        ),
        RuleKind::Job => "conflicting requests".to_string(),
        RuleKind::JobUnsupported => "unsupported request".to_string(),
        RuleKind::JobProvidedBySystem => {
            format!("{} is provided by the system", dep2str(sack, info.dep))
        }
        RuleKind::JobNothingProvidesDep => {
            format!("nothing provides requested {}", dep2str(sack, info.dep))
        }
        RuleKind::JobUnknownPackage => {
            format!("{} {} does not exist", noun, dep2str(sack, info.dep))
        }
        RuleKind::Best => {
            if source > 0 {
                format!(
                    "cannot install the best update candidate for {} {}",
                    noun,
                    id2str(sack, source)
                )
            } else {
                "cannot install the best candidate for the job".to_string()
            }
        }
        RuleKind::PkgNotInstallable => {
            if sack.disabled_solvable(source) {
                if module_excludes.has(source) {
                    if pkgs {
                        format!(
                            "package {} from {} is filtered out by modular filtering",
                            pkg2str(sack, source),
                            repo2str(sack, source)
                        )
                    } else {
                        format!(
                            "module {} from {} is disabled",
                            module2str(sack, source),
                            repo2str(sack, source)
                        )
                    }
                } else if pkgs {
                    format!(
                        "package {} from {} is filtered out by exclude filtering",
                        pkg2str(sack, source),
                        repo2str(sack, source)
                    )
                } else {
                    format!(
                        "module {} from {} is disabled",
                        module2str(sack, source),
                        repo2str(sack, source)
                    )
                }
            } else {
                format!(
                    "{} {} from {} is not installable",
                    noun,
                    id2str(sack, source),
                    repo2str(sack, source)
                )
            }
        }
        RuleKind::PkgNothingProvidesDep => {
            if pkgs {
                format!(
                    "nothing provides {} needed by {} from {}",
                    dep2str(sack, info.dep),
                    pkg2str(sack, source),
                    repo2str(sack, source)
                )
            } else {
                format!(
                    "nothing provides {} needed by module {} from {}",
                    dep2str(sack, info.dep),
                    module2str(sack, source),
                    repo2str(sack, source)
                )
            }
        }
        RuleKind::PkgSameName => format!(
            "cannot install both {} from {} and {} from {}",
            id2str(sack, source),
            repo2str(sack, source),
            id2str(sack, target),
            repo2str(sack, target)
        ),
        RuleKind::PkgConflicts => format!(
            "{} {} from {} conflicts with {} provided by {} from {}",
            noun,
            id2str(sack, source),
            repo2str(sack, source),
            dep2str(sack, info.dep),
            id2str(sack, target),
            repo2str(sack, target)
        ),
        RuleKind::PkgObsoletes => format!(
            "{} {} from {} obsoletes {} provided by {} from {}",
            noun,
            id2str(sack, source),
            repo2str(sack, source),
            dep2str(sack, info.dep),
            id2str(sack, target),
            repo2str(sack, target)
        ),
        RuleKind::PkgInstalledObsoletes => format!(
            "installed {} {} obsoletes {} provided by {} from {}",
            noun,
            id2str(sack, source),
            dep2str(sack, info.dep),
            id2str(sack, target),
            repo2str(sack, target)
        ),
        RuleKind::PkgImplicitObsoletes => format!(
            "{} {} from {} implicitly obsoletes {} provided by {} from {}",
            noun,
            id2str(sack, source),
            repo2str(sack, source),
            dep2str(sack, info.dep),
            id2str(sack, target),
            repo2str(sack, target)
        ),
        RuleKind::PkgRequires => format!(
            "{} {} from {} requires {}, but none of the providers can be installed",
            noun,
            id2str(sack, source),
            repo2str(sack, source),
            dep2str(sack, info.dep)
        ),
        RuleKind::PkgSelfConflict => format!(
            "{} {} from {} conflicts with {} provided by itself",
            noun,
            id2str(sack, source),
            repo2str(sack, source),
            dep2str(sack, info.dep)
        ),
        RuleKind::Yumobs => format!(
            "both {} {} from {} and {} from {} obsolete {}",
            noun,
            id2str(sack, source),
            repo2str(sack, source),
            id2str(sack, target),
            repo2str(sack, target),
            dep2str(sack, info.dep)
        ),
        // anything else falls back to a generic dependency complaint
        RuleKind::Pkg | RuleKind::Learned => "some dependency problem".to_string(),
    }
}

/// Collect the (deduplicated) rule strings of one solver problem.
pub(crate) fn describe_solver_problem(
    sack: &Sack,
    solver: &Solver<'_>,
    module_excludes: &PackageSet,
    problem: usize,
    pkgs: bool,
) -> Vec<String> {
    let mut output: Vec<String> = Vec::new();
    for &rid in solver.find_all_problem_rules(problem) {
        for info in solver.all_rule_infos(rid) {
            let line = rule_info_to_string(sack, module_excludes, &info, pkgs);
            if !output.contains(&line) {
                output.push(line);
            }
        }
    }
    output
}

/// Render problem lists the way the CLI prints them: a single problem as
/// `Problem: ...`, several as `Problem N: ...`, rules joined by `"\n  - "`.
pub fn format_all_problem_rules(problems: &[Vec<String>]) -> String {
    if problems.is_empty() {
        return String::new();
    }
    if problems.len() == 1 {
        return format!("Problem: {}", problems[0].join("\n  - "));
    }
    let mut output = String::new();
    for (index, problem) in problems.iter().enumerate() {
        if index > 0 {
            output.push_str("\n ");
        }
        output.push_str(&format!("Problem {}: {}", index + 1, problem.join("\n  - ")));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_single_problem() {
        let problems = vec![vec!["conflicting requests".to_string(), "more".to_string()]];
        assert_eq!(
            format_all_problem_rules(&problems),
            "Problem: conflicting requests\n  - more"
        );
    }

    #[test]
    fn test_format_multiple_problems() {
        let problems = vec![
            vec!["first".to_string()],
            vec!["second".to_string(), "detail".to_string()],
        ];
        assert_eq!(
            format_all_problem_rules(&problems),
            "Problem 1: first\n Problem 2: second\n  - detail"
        );
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_all_problem_rules(&[]), "");
    }
}
