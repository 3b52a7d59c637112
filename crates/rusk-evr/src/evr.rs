//! EVR string splitting

/// Borrowed view of an `epoch:version-release` string split into its parts.
///
/// A missing epoch reads as `"0"`; a missing release reads as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evr<'a> {
    pub epoch: &'a str,
    pub version: &'a str,
    pub release: &'a str,
}

impl<'a> Evr<'a> {
    /// Split an EVR string. The epoch is everything before the first `:`,
    /// the release everything after the first `-` of the remainder.
    pub fn parse(evr: &'a str) -> Self {
        let (epoch, rest) = match evr.find(':') {
            Some(pos) if evr[..pos].bytes().all(|b| b.is_ascii_digit()) => {
                (&evr[..pos], &evr[pos + 1..])
            }
            _ => ("0", evr),
        };
        let (version, release) = match rest.find('-') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };
        Self { epoch, version, release }
    }

    /// Epoch as a number; an empty or malformed epoch is 0.
    pub fn epoch_num(&self) -> u64 {
        self.epoch.parse().unwrap_or(0)
    }

    /// True when the string spelled out an epoch, even `0:`.
    pub fn has_explicit_epoch(evr: &str) -> bool {
        match evr.find(':') {
            Some(pos) => evr[..pos].bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let evr = Evr::parse("3:2.8.9-1.fc27");
        assert_eq!(evr.epoch, "3");
        assert_eq!(evr.version, "2.8.9");
        assert_eq!(evr.release, "1.fc27");
    }

    #[test]
    fn test_parse_no_epoch() {
        let evr = Evr::parse("2.8.9-1.fc27");
        assert_eq!(evr.epoch, "0");
        assert_eq!(evr.epoch_num(), 0);
        assert_eq!(evr.version, "2.8.9");
    }

    #[test]
    fn test_parse_no_release() {
        let evr = Evr::parse("1.0");
        assert_eq!(evr.version, "1.0");
        assert_eq!(evr.release, "");
    }

    #[test]
    fn test_explicit_epoch() {
        assert!(Evr::has_explicit_epoch("0:1.0-1"));
        assert!(!Evr::has_explicit_epoch("1.0-1"));
        assert!(!Evr::has_explicit_epoch("git:abc-1"));
    }
}
