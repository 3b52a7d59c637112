//! NEVRA pattern forms
//!
//! A package subject typed by a user is ambiguous: `pkg-1.0-1.x86_64` could
//! be a full NEVRA or a name that happens to contain dashes. Each [`Form`]
//! is one way of cutting the string; callers try forms in order until one
//! produces a match against the package universe.

use crate::evr::Evr;

/// The pattern forms a subject string can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// `name-[epoch:]version-release.arch`
    Nevra,
    /// `name.arch`
    Na,
    /// `name`
    Name,
    /// `name-[epoch:]version-release`
    Nevr,
    /// `name-[epoch:]version`
    Nev,
}

/// Default try-order: most specific form first.
pub const FORMS_MOST_SPEC: &[Form] = &[Form::Nevra, Form::Na, Form::Name, Form::Nevr, Form::Nev];

/// A subject cut into NEVRA parts. Absent parts are empty strings; an absent
/// epoch is `None` (an explicit `0:` parses as `Some(0)`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nevra {
    pub name: String,
    pub epoch: Option<u64>,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nevra {
    /// Cut `subject` according to `form`. Returns `None` when the string
    /// does not have the separators the form demands or a part is empty.
    pub fn parse(subject: &str, form: Form) -> Option<Self> {
        match form {
            Form::Name => {
                if subject.is_empty() {
                    return None;
                }
                Some(Self { name: subject.to_string(), ..Default::default() })
            }
            Form::Na => {
                let dot = subject.rfind('.')?;
                let (name, arch) = (&subject[..dot], &subject[dot + 1..]);
                if name.is_empty() || arch.is_empty() || arch.contains('-') {
                    return None;
                }
                Some(Self {
                    name: name.to_string(),
                    arch: arch.to_string(),
                    ..Default::default()
                })
            }
            Form::Nev => {
                let dash = subject.rfind('-')?;
                let (name, ev) = (&subject[..dash], &subject[dash + 1..]);
                if name.is_empty() || ev.is_empty() {
                    return None;
                }
                let (epoch, version) = split_epoch(ev);
                Some(Self {
                    name: name.to_string(),
                    epoch,
                    version: version.to_string(),
                    ..Default::default()
                })
            }
            Form::Nevr => {
                let (name, ev, release) = cut_evr(subject)?;
                let (epoch, version) = split_epoch(ev);
                Some(Self {
                    name: name.to_string(),
                    epoch,
                    version: version.to_string(),
                    release: release.to_string(),
                    ..Default::default()
                })
            }
            Form::Nevra => {
                let dot = subject.rfind('.')?;
                let (nevr, arch) = (&subject[..dot], &subject[dot + 1..]);
                if arch.is_empty() || arch.contains('-') {
                    return None;
                }
                let (name, ev, release) = cut_evr(nevr)?;
                let (epoch, version) = split_epoch(ev);
                Some(Self {
                    name: name.to_string(),
                    epoch,
                    version: version.to_string(),
                    release: release.to_string(),
                    arch: arch.to_string(),
                })
            }
        }
    }

    /// Render back to the canonical `name-[epoch:]version-release.arch`
    /// shape, leaving out the parts that are absent.
    pub fn to_pattern(&self) -> String {
        let mut out = self.name.clone();
        if !self.version.is_empty() {
            out.push('-');
            if let Some(epoch) = self.epoch {
                out.push_str(&epoch.to_string());
                out.push(':');
            }
            out.push_str(&self.version);
            if !self.release.is_empty() {
                out.push('-');
                out.push_str(&self.release);
            }
        }
        if !self.arch.is_empty() {
            out.push('.');
            out.push_str(&self.arch);
        }
        out
    }
}

/// Split `name-ev-release` at the last two dashes.
fn cut_evr(s: &str) -> Option<(&str, &str, &str)> {
    let release_dash = s.rfind('-')?;
    let (head, release) = (&s[..release_dash], &s[release_dash + 1..]);
    let version_dash = head.rfind('-')?;
    let (name, ev) = (&head[..version_dash], &head[version_dash + 1..]);
    if name.is_empty() || ev.is_empty() || release.is_empty() {
        return None;
    }
    Some((name, ev, release))
}

/// Peel a numeric `epoch:` prefix off a version string.
fn split_epoch(ev: &str) -> (Option<u64>, &str) {
    if Evr::has_explicit_epoch(ev) {
        let pos = ev.find(':').unwrap();
        if let Ok(epoch) = ev[..pos].parse() {
            return (Some(epoch), &ev[pos + 1..]);
        }
    }
    (None, ev)
}
