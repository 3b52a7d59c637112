//! Solver job: an ordered sequence of (flags, operand) pairs.
//!
//! The flat pair layout is what the solver ingests; the builder methods on
//! [`Job`] keep pushes paired. A flags word packs one selection kind, one
//! action, and any modifiers.

use bitflags::bitflags;

use crate::pool::Id;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JobFlags: u32 {
        // selection kinds
        const SOLVABLE          = 1 << 0;
        const SOLVABLE_NAME     = 1 << 1;
        const SOLVABLE_PROVIDES = 1 << 2;
        const SOLVABLE_ONE_OF   = 1 << 3;
        const SOLVABLE_ALL      = 1 << 4;
        const SOLVABLE_REPO     = 1 << 5;

        // actions
        const INSTALL         = 1 << 8;
        const ERASE           = 1 << 9;
        const UPDATE          = 1 << 10;
        const DISTUPGRADE     = 1 << 11;
        const LOCK            = 1 << 12;
        const FAVOR           = 1 << 13;
        const DISFAVOR        = 1 << 14;
        const USERINSTALLED   = 1 << 15;
        const ALLOWUNINSTALL  = 1 << 16;
        const VERIFY          = 1 << 17;
        const MULTIVERSION    = 1 << 18;
        const EXCLUDEFROMWEAK = 1 << 19;

        // modifiers
        const WEAK      = 1 << 20;
        const CLEANDEPS = 1 << 21;
        const FORCEBEST = 1 << 22;
        const TARGETED  = 1 << 23;
        const SETEV     = 1 << 24;
        const SETEVR    = 1 << 25;
        const SETARCH   = 1 << 26;
        const SETREPO   = 1 << 27;

        const SELECT_MASK = Self::SOLVABLE.bits()
            | Self::SOLVABLE_NAME.bits()
            | Self::SOLVABLE_PROVIDES.bits()
            | Self::SOLVABLE_ONE_OF.bits()
            | Self::SOLVABLE_ALL.bits()
            | Self::SOLVABLE_REPO.bits();
    }
}

impl JobFlags {
    pub fn selection(self) -> JobFlags {
        self & JobFlags::SELECT_MASK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobEntry {
    pub flags: JobFlags,
    pub what: Id,
}

/// The staging/final job. Entries keep insertion order; the solver never
/// reorders them.
#[derive(Debug, Clone, Default)]
pub struct Job {
    entries: Vec<JobEntry>,
}

impl Job {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, flags: JobFlags, what: Id) {
        self.entries.push(JobEntry { flags, what });
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobEntry> {
        self.entries.iter()
    }

    pub fn entries_mut(&mut self) -> &mut [JobEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, flags: JobFlags, what: Id) -> bool {
        self.entries.iter().any(|e| e.flags == flags && e.what == what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_mask() {
        let flags = JobFlags::SOLVABLE_NAME | JobFlags::INSTALL | JobFlags::WEAK;
        assert_eq!(flags.selection(), JobFlags::SOLVABLE_NAME);
    }

    #[test]
    fn test_job_preserves_order() {
        let mut job = Job::new();
        job.push(JobFlags::SOLVABLE | JobFlags::ERASE, 7);
        job.push(JobFlags::SOLVABLE_ALL | JobFlags::UPDATE, 0);
        let entries: Vec<_> = job.iter().collect();
        assert_eq!(entries[0].what, 7);
        assert!(entries[1].flags.contains(JobFlags::UPDATE));
    }
}
