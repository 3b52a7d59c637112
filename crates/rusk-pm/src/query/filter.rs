//! Filter model: keynames, comparison types, match values, and the
//! validity table.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::package_set::PackageSet;
use crate::pool::{DepArrayKey, DepId};

/// What a filter selects on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKey {
    Pkg,
    All,
    Empty,
    Name,
    Epoch,
    Evr,
    Nevra,
    NevraStrict,
    Version,
    Release,
    Arch,
    Sourcerpm,
    Obsoletes,
    ObsoletesByPriority,
    Provides,
    Conflicts,
    Enhances,
    Recommends,
    Requires,
    Suggests,
    Supplements,
    Reponame,
    Location,
    Advisory,
    AdvisoryBug,
    AdvisoryCve,
    AdvisorySeverity,
    AdvisoryType,
    Latest,
    LatestPerArch,
    LatestPerArchByPriority,
    Upgradable,
    Upgrades,
    UpgradesByPriority,
    Downgradable,
    Downgrades,
    Description,
    Summary,
    Url,
    File,
}

bitflags! {
    /// Comparison type. A bitset: `NEQ` is `NOT | EQ`, `EQG` combines with
    /// `UPGRADE` and `GT` for the advisory security-upgrade modes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CmpType: u32 {
        const EQ = 1 << 0;
        const LT = 1 << 1;
        const GT = 1 << 2;
        const ICASE = 1 << 3;
        const SUBSTR = 1 << 4;
        const GLOB = 1 << 5;
        const NOT = 1 << 6;
        const EQG = 1 << 7;
        const UPGRADE = 1 << 8;
        const NEQ = Self::NOT.bits() | Self::EQ.bits();
    }
}

impl CmpType {
    /// The comparison with the NOT handled by `apply` stripped off.
    pub fn without_not(self) -> CmpType {
        self & !CmpType::NOT
    }
}

/// Heterogeneous filter match value.
#[derive(Debug, Clone)]
pub enum Match {
    Nums(Vec<i64>),
    Strs(Vec<String>),
    Reldeps(Vec<DepId>),
    Pkgs(PackageSet),
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub key: QueryKey,
    pub cmp: CmpType,
    pub matches: Match,
}

impl Filter {
    pub fn strs(&self) -> &[String] {
        match &self.matches {
            Match::Strs(v) => v,
            _ => &[],
        }
    }

    pub fn nums(&self) -> &[i64] {
        match &self.matches {
            Match::Nums(v) => v,
            _ => &[],
        }
    }

    pub fn reldeps(&self) -> &[DepId] {
        match &self.matches {
            Match::Reldeps(v) => v,
            _ => &[],
        }
    }

    pub fn pkgs(&self) -> Option<&PackageSet> {
        match &self.matches {
            Match::Pkgs(set) => Some(set),
            _ => None,
        }
    }
}

impl QueryKey {
    pub(crate) fn is_num_key(self) -> bool {
        matches!(
            self,
            QueryKey::Empty
                | QueryKey::Epoch
                | QueryKey::Latest
                | QueryKey::LatestPerArch
                | QueryKey::LatestPerArchByPriority
                | QueryKey::Upgradable
                | QueryKey::Upgrades
                | QueryKey::UpgradesByPriority
                | QueryKey::Downgradable
                | QueryKey::Downgrades
        )
    }

    pub(crate) fn is_pkg_key(self) -> bool {
        matches!(
            self,
            QueryKey::Pkg | QueryKey::Obsoletes | QueryKey::ObsoletesByPriority
        )
    }

    pub(crate) fn is_reldep_key(self) -> bool {
        matches!(
            self,
            QueryKey::Conflicts
                | QueryKey::Enhances
                | QueryKey::Obsoletes
                | QueryKey::Provides
                | QueryKey::Recommends
                | QueryKey::Requires
                | QueryKey::Suggests
                | QueryKey::Supplements
        )
    }

    pub(crate) fn is_str_key(self) -> bool {
        matches!(
            self,
            QueryKey::Advisory
                | QueryKey::AdvisoryBug
                | QueryKey::AdvisoryCve
                | QueryKey::AdvisorySeverity
                | QueryKey::AdvisoryType
                | QueryKey::Arch
                | QueryKey::Description
                | QueryKey::Enhances
                | QueryKey::Evr
                | QueryKey::File
                | QueryKey::Location
                | QueryKey::Name
                | QueryKey::Nevra
                | QueryKey::NevraStrict
                | QueryKey::Provides
                | QueryKey::Recommends
                | QueryKey::Release
                | QueryKey::Reponame
                | QueryKey::Requires
                | QueryKey::Sourcerpm
                | QueryKey::Suggests
                | QueryKey::Summary
                | QueryKey::Supplements
                | QueryKey::Obsoletes
                | QueryKey::Conflicts
                | QueryKey::Url
                | QueryKey::Version
        )
    }

    /// The solvable dep array a reldep keyname reads.
    pub(crate) fn dep_array_key(self) -> DepArrayKey {
        match self {
            QueryKey::Conflicts => DepArrayKey::Conflicts,
            QueryKey::Enhances => DepArrayKey::Enhances,
            QueryKey::Obsoletes => DepArrayKey::Obsoletes,
            QueryKey::Requires => DepArrayKey::Requires,
            QueryKey::Recommends => DepArrayKey::Recommends,
            QueryKey::Suggests => DepArrayKey::Suggests,
            QueryKey::Supplements => DepArrayKey::Supplements,
            QueryKey::Provides => DepArrayKey::Provides,
            _ => unreachable!("not a reldep keyname: {self:?}"),
        }
    }
}

pub(crate) fn valid_filter_str(key: QueryKey, cmp: CmpType) -> Result<()> {
    let cmp = cmp.without_not();
    let ok = key.is_str_key()
        && match key {
            QueryKey::Location | QueryKey::Sourcerpm | QueryKey::NevraStrict => {
                cmp == CmpType::EQ
            }
            QueryKey::Arch => cmp.intersects(CmpType::EQ | CmpType::GLOB),
            QueryKey::Name => cmp.intersects(CmpType::EQ | CmpType::GLOB | CmpType::SUBSTR),
            _ => true,
        };
    if ok {
        Ok(())
    } else {
        Err(Error::BadQuery(format!("invalid string match for {key:?}")))
    }
}

pub(crate) fn valid_filter_num(key: QueryKey, cmp: CmpType) -> Result<()> {
    let cmp = cmp.without_not();
    let ok = key.is_num_key() && !cmp.intersects(CmpType::ICASE | CmpType::SUBSTR | CmpType::GLOB);
    if ok {
        Ok(())
    } else {
        Err(Error::BadQuery(format!("invalid numeric match for {key:?}")))
    }
}

pub(crate) fn valid_filter_pkg(key: QueryKey, cmp: CmpType) -> Result<()> {
    let ok = (key.is_pkg_key() || key.is_reldep_key())
        && (cmp == CmpType::EQ || cmp == CmpType::NEQ);
    if ok {
        Ok(())
    } else {
        Err(Error::BadQuery(format!("invalid package-set match for {key:?}")))
    }
}

pub(crate) fn valid_filter_reldep(key: QueryKey) -> Result<()> {
    if key.is_reldep_key() {
        Ok(())
    } else {
        Err(Error::BadQuery(format!("invalid reldep match for {key:?}")))
    }
}

/// Does the pattern contain any glob wildcard?
pub(crate) fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '[', '?'])
}

/// fnmatch-style matcher: `*` crosses `/` like plain fnmatch does. Returns
/// `None` for malformed patterns, which callers treat as matching nothing.
pub(crate) fn glob_matcher(pattern: &str, icase: bool) -> Option<globset::GlobMatcher> {
    globset::GlobBuilder::new(pattern)
        .literal_separator(false)
        .case_insensitive(icase)
        .build()
        .ok()
        .map(|g| g.compile_matcher())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neq_is_not_eq() {
        assert_eq!(CmpType::NEQ, CmpType::NOT | CmpType::EQ);
        assert_eq!(CmpType::NEQ.without_not(), CmpType::EQ);
    }

    #[test]
    fn test_str_validity() {
        assert!(valid_filter_str(QueryKey::Name, CmpType::GLOB).is_ok());
        assert!(valid_filter_str(QueryKey::Name, CmpType::ICASE | CmpType::EQ).is_err());
        assert!(valid_filter_str(QueryKey::Location, CmpType::EQ).is_ok());
        assert!(valid_filter_str(QueryKey::Location, CmpType::GLOB).is_err());
        assert!(valid_filter_str(QueryKey::Arch, CmpType::SUBSTR).is_err());
        assert!(valid_filter_str(QueryKey::Description, CmpType::SUBSTR | CmpType::ICASE).is_ok());
        // NOT is always stripped before validation
        assert!(valid_filter_str(QueryKey::Name, CmpType::NEQ).is_ok());
    }

    #[test]
    fn test_num_validity() {
        assert!(valid_filter_num(QueryKey::Latest, CmpType::EQ).is_ok());
        assert!(valid_filter_num(QueryKey::Epoch, CmpType::GT).is_ok());
        assert!(valid_filter_num(QueryKey::Latest, CmpType::GLOB).is_err());
        assert!(valid_filter_num(QueryKey::Name, CmpType::EQ).is_err());
    }

    #[test]
    fn test_pkg_validity() {
        assert!(valid_filter_pkg(QueryKey::Pkg, CmpType::EQ).is_ok());
        assert!(valid_filter_pkg(QueryKey::Pkg, CmpType::NEQ).is_ok());
        assert!(valid_filter_pkg(QueryKey::Pkg, CmpType::GT).is_err());
        assert!(valid_filter_pkg(QueryKey::Obsoletes, CmpType::EQ).is_ok());
    }

    #[test]
    fn test_glob_detection() {
        assert!(is_glob_pattern("foo*"));
        assert!(is_glob_pattern("foo[ab]"));
        assert!(!is_glob_pattern("foo"));
    }

    #[test]
    fn test_glob_crosses_slash() {
        let m = glob_matcher("/usr/*grep", false).unwrap();
        assert!(m.is_match("/usr/bin/grep"));
    }
}
