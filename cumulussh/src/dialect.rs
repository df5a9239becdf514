//! Dialect detection.
//!
//! Cumulus Linux ships two mutually exclusive configuration CLIs: the
//! legacy line-oriented NCLU (`net ...`, up to 4.x) and the declarative
//! NVUE (`nv ...`, 5.x onwards). A session probes the device once at
//! open and the classification never changes afterwards - every
//! subsequent operation is translated for the detected dialect without
//! re-checking.

use std::fmt;

/// Command the probe sends. On NVUE devices it reports the system
/// description; on NCLU devices it fails with an unknown-command
/// message that lacks the marker below.
pub const VERSION_PROBE: &str = "nv show system";

/// Substring that identifies an NVUE device in the probe output.
pub const NVUE_MARKER: &str = "Cumulus Linux 5";

/// Configuration CLI family of the target device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Legacy `net` CLI: candidate lines are applied to a pending
    /// buffer one command at a time.
    Nclu,

    /// Declarative `nv` CLI: the candidate is staged server-side and
    /// applied by revision.
    Nvue,
}

impl Dialect {
    /// Classify a device from its [`VERSION_PROBE`] output.
    pub fn from_probe(output: &str) -> Self {
        if output.contains(NVUE_MARKER) {
            Dialect::Nvue
        } else {
            Dialect::Nclu
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Nclu => write!(f, "nclu"),
            Dialect::Nvue => write!(f, "nvue"),
        }
    }
}
