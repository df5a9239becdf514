//! Command translation and output scraping.
//!
//! [`Translator`] is the pure mapping from transaction operations to
//! the concrete command text of the active dialect. The free functions
//! below scrape the device's textual replies; the CLI output format is
//! the real wire format here and every marker they rely on is spelled
//! out next to the function.

use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::Dialect;

/// Marker opening the trailing section of `net pending` output that
/// lists commands which matched the running config (no-ops).
const PENDING_NOOP_MARKER: &str = "net add/del commands";

/// Markers bracketing the warning text in an `nv config apply`
/// confirmation question.
const WARNING_OPEN: &str = "Warning:";
const WARNING_CLOSE: &str = "Are you";

/// ANSI color escapes as NCLU emits them in diffs.
static COLOR_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[\d+m").expect("color escape pattern is valid"));

/// Maps transaction operations to dialect-specific command text.
///
/// Constructed once per session from the detected dialect; it never
/// probes the device.
#[derive(Debug, Clone, Copy)]
pub struct Translator {
    dialect: Dialect,
}

impl Translator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Drop the staged candidate.
    pub fn discard(&self) -> &'static str {
        match self.dialect {
            Dialect::Nclu => "net abort",
            Dialect::Nvue => "nv config detach",
        }
    }

    /// Show the delta between candidate and running config.
    pub fn compare(&self) -> &'static str {
        match self.dialect {
            Dialect::Nclu => "net pending",
            Dialect::Nvue => "nv config diff --color off",
        }
    }

    /// Apply the staged candidate.
    pub fn commit(&self) -> &'static str {
        match self.dialect {
            Dialect::Nclu => "net commit",
            Dialect::Nvue => "nv config apply",
        }
    }

    /// Undo the last committed change (NCLU keeps this as a single
    /// command; NVUE rolls back by revision instead).
    pub fn rollback_last(&self) -> &'static str {
        "net rollback last"
    }

    /// List applied revisions, most recent first. NCLU has no revision
    /// history.
    pub fn history(&self) -> Option<&'static str> {
        match self.dialect {
            Dialect::Nclu => None,
            Dialect::Nvue => Some("nv config history |grep rev_id:"),
        }
    }

    /// Apply the configuration recorded at `revision`.
    pub fn apply_revision(&self, revision: &str) -> String {
        format!("nv config apply {revision}")
    }
}

/// Strip ANSI color escapes from a diff.
pub fn strip_color(text: &str) -> String {
    COLOR_ESCAPE.replace_all(text, "").into_owned()
}

/// Normalize `net pending` output into the effective diff.
///
/// Everything from the no-op section marker onward is dropped; an empty
/// remainder means the candidate matches the running config and is a
/// valid "no diff", not an error.
pub fn trim_pending_diff(raw: &str) -> String {
    let cleaned = strip_color(raw);
    let effective = cleaned
        .split(PENDING_NOOP_MARKER)
        .next()
        .unwrap_or_default();
    effective.trim().to_string()
}

/// Pull the device's own warning out of an `nv config apply`
/// confirmation question, i.e. the text between `Warning:` and
/// `Are you`. Falls back to the whole (trimmed) reply when the
/// markers are missing, so the caller never loses the device text.
pub fn extract_apply_warning(reply: &str) -> String {
    let Some((_, after_open)) = reply.split_once(WARNING_OPEN) else {
        return reply.trim().to_string();
    };
    let warning = match after_open.split_once(WARNING_CLOSE) {
        Some((warning, _)) => warning,
        None => after_open,
    };
    warning.trim().to_string()
}

/// Second-most-recent revision token from `nv config history` output.
///
/// Lines look like `rev_id: '20230815_120201.123456'`, newest first;
/// the token preceding the last applied revision is the rollback
/// target. `None` when the history has no previous revision or an
/// unexpected shape.
pub fn previous_revision(history: &str) -> Option<String> {
    let line = history.lines().nth(1)?;
    let token = line.split_whitespace().nth(1)?;
    let token = token.trim_matches('\'');
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
