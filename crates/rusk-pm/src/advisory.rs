use crate::pool::Id;

/// Advisory category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisoryKind {
    Security,
    Bugfix,
    Enhancement,
    Newpackage,
    Unknown,
}

impl AdvisoryKind {
    pub fn from_str(s: &str) -> Self {
        match s {
            "security" => AdvisoryKind::Security,
            "bugfix" => AdvisoryKind::Bugfix,
            "enhancement" => AdvisoryKind::Enhancement,
            "newpackage" => AdvisoryKind::Newpackage,
            _ => AdvisoryKind::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdvisoryKind::Security => "security",
            AdvisoryKind::Bugfix => "bugfix",
            AdvisoryKind::Enhancement => "enhancement",
            AdvisoryKind::Newpackage => "newpackage",
            AdvisoryKind::Unknown => "unknown",
        }
    }
}

/// A package an advisory applies to, interned against the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisoryPkg {
    pub name: Id,
    pub arch: Id,
    pub evr: Id,
}

/// An advisory record. The core never parses these; they arrive fully
/// formed from the metadata layer.
#[derive(Debug, Clone)]
pub struct Advisory {
    pub name: String,
    pub kind: AdvisoryKind,
    pub severity: Option<String>,
    pub bugs: Vec<String>,
    pub cves: Vec<String>,
    pub packages: Vec<AdvisoryPkg>,
}

impl Advisory {
    pub fn match_name(&self, value: &str) -> bool {
        self.name == value
    }

    pub fn match_bug(&self, value: &str) -> bool {
        self.bugs.iter().any(|b| b == value)
    }

    pub fn match_cve(&self, value: &str) -> bool {
        self.cves.iter().any(|c| c == value)
    }

    pub fn match_kind(&self, value: &str) -> bool {
        self.kind == AdvisoryKind::from_str(value)
    }

    pub fn match_severity(&self, value: &str) -> bool {
        self.severity.as_deref() == Some(value)
    }
}

/// Builder-side advisory description with plain strings; the sack interns
/// it on insertion.
#[derive(Debug, Clone, Default)]
pub struct AdvisoryDef {
    pub name: String,
    pub kind: String,
    pub severity: Option<String>,
    pub bugs: Vec<String>,
    pub cves: Vec<String>,
    /// `(name, evr, arch)` triples.
    pub packages: Vec<(String, String, String)>,
}

impl AdvisoryDef {
    pub fn new(name: &str, kind: &str) -> Self {
        Self { name: name.to_string(), kind: kind.to_string(), ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(AdvisoryKind::from_str("security"), AdvisoryKind::Security);
        assert_eq!(AdvisoryKind::from_str("typo"), AdvisoryKind::Unknown);
        assert_eq!(AdvisoryKind::Bugfix.as_str(), "bugfix");
    }

    #[test]
    fn test_advisory_matching() {
        let advisory = Advisory {
            name: "RUSKSA-2024-001".to_string(),
            kind: AdvisoryKind::Security,
            severity: Some("Critical".to_string()),
            bugs: vec!["123456".to_string()],
            cves: vec!["CVE-2024-0001".to_string()],
            packages: Vec::new(),
        };
        assert!(advisory.match_name("RUSKSA-2024-001"));
        assert!(advisory.match_bug("123456"));
        assert!(advisory.match_cve("CVE-2024-0001"));
        assert!(advisory.match_kind("security"));
        assert!(advisory.match_severity("Critical"));
        assert!(!advisory.match_severity("Low"));
    }
}
