//! EVR version ordering and NEVRA pattern parsing
//!
//! This crate provides the version ordering used by rpm-style package
//! managers: an EVR is an `epoch:version-release` triple where the epoch is
//! a plain integer and version/release are compared segment-wise (numeric
//! runs numerically, alphabetic runs lexically, `~` sorting before anything
//! and `^` sorting right after its base). It also parses the NEVRA pattern
//! forms used to interpret user-supplied package subjects.

mod compare;
mod evr;
mod nevra;

pub use compare::{evrcmp, vercmp};
pub use evr::Evr;
pub use nevra::{Form, Nevra, FORMS_MOST_SPEC};
