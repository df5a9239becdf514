//! Configuration transaction lifecycle.
//!
//! One in-flight change attempt per session: `Idle` (no candidate) to
//! `Loaded` (candidate staged) and back through commit or discard. The
//! `Loaded` state is the presence of a [`ConfigTransaction`] on the
//! session; transitions all live in this module.
//!
//! Compare, commit and discard are deliberate no-ops in `Idle`, as is
//! rollback before anything was committed - callers can drive the
//! lifecycle unconditionally without tracking state themselves.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::DeviceSession;
use crate::command::{self, Translator};
use crate::dialect::Dialect;
use crate::error::{ChannelError, ConfigError, Result};
use crate::output;

/// Device replies containing either marker mean the line was refused.
const REJECTION_MARKERS: [&str; 2] = ["error", "not found"];

/// NVUE appends this when `nv config apply` wants confirmation.
const CONFIRM_MARKER: &str = "[y/N]";

/// A staged-but-uncommitted change attempt.
///
/// For NCLU the recorded lines have already been applied to the
/// device's pending buffer one by one; for NVUE they are the staging
/// commands sent to the detached candidate. Either way the device
/// holds the real state - this records what was sent.
#[derive(Debug, Default)]
pub(crate) struct ConfigTransaction {
    lines: Vec<String>,
}

/// Where a candidate configuration comes from.
///
/// A file of commands, inline text (split on newlines), or an explicit
/// sequence of command lines. Blank lines are filtered out everywhere.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    File(PathBuf),
    Text(String),
    Lines(Vec<String>),
}

impl CandidateSource {
    /// Resolve to the non-empty candidate lines.
    async fn resolve(self) -> Result<Vec<String>> {
        let lines: Vec<String> = match self {
            CandidateSource::File(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ConfigError::InvalidInput {
                    message: format!("cannot read '{}': {e}", path.display()),
                })?
                .lines()
                .map(str::to_string)
                .collect(),
            CandidateSource::Text(text) => text.lines().map(str::to_string).collect(),
            CandidateSource::Lines(lines) => lines,
        };

        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        if lines.is_empty() {
            return Err(ConfigError::InvalidInput {
                message: "a file, config text, or command lines must be provided".to_string(),
            }
            .into());
        }
        Ok(lines)
    }
}

impl From<&str> for CandidateSource {
    fn from(text: &str) -> Self {
        CandidateSource::Text(text.to_string())
    }
}

impl From<String> for CandidateSource {
    fn from(text: String) -> Self {
        CandidateSource::Text(text)
    }
}

impl From<Vec<String>> for CandidateSource {
    fn from(lines: Vec<String>) -> Self {
        CandidateSource::Lines(lines)
    }
}

impl From<&Path> for CandidateSource {
    fn from(path: &Path) -> Self {
        CandidateSource::File(path.to_path_buf())
    }
}

impl From<PathBuf> for CandidateSource {
    fn from(path: PathBuf) -> Self {
        CandidateSource::File(path)
    }
}

impl DeviceSession {
    /// Stage a candidate configuration.
    ///
    /// Each non-empty line goes to the device in order. A reply
    /// carrying an error marker aborts the load with
    /// [`ConfigError::ApplyRejected`] naming the offending line;
    /// lines sent before it stay applied to the device's pending
    /// buffer (a property of the legacy CLI, preserved here - discard
    /// the partial candidate to get rid of them). Loading on top of an
    /// existing candidate extends it.
    pub async fn load_candidate(&mut self, source: impl Into<CandidateSource>) -> Result<()> {
        let lines = source.into().resolve().await?;

        let channel = self
            .channel
            .as_deref_mut()
            .ok_or(ChannelError::NotConnected)?;

        debug!("loading candidate ({} lines)", lines.len());

        // The transaction exists from the first line sent, not from
        // success: a rejected load leaves a partial candidate on the
        // device, and that partial candidate must remain discardable.
        let tx = self.transaction.get_or_insert_with(ConfigTransaction::default);

        for line in lines {
            let reply = output::text(channel, &line).await?;
            if REJECTION_MARKERS.iter().any(|marker| reply.contains(marker)) {
                warn!("device rejected candidate line '{line}'");
                return Err(ConfigError::ApplyRejected { command: line }.into());
            }
            tx.lines.push(line);
        }
        Ok(())
    }

    /// Diff between the candidate and the running config.
    ///
    /// Empty string when nothing is pending. The diff is computed by
    /// the device on every call, never cached; NCLU output is cut at
    /// its no-op section and color escapes are stripped for both
    /// dialects.
    pub async fn compare_candidate(&mut self) -> Result<String> {
        if self.transaction.is_none() {
            return Ok(String::new());
        }
        let dialect = self.dialect.ok_or(ChannelError::NotConnected)?;
        let channel = self
            .channel
            .as_deref_mut()
            .ok_or(ChannelError::NotConnected)?;

        let raw = output::text(channel, Translator::new(dialect).compare()).await?;
        let diff = match dialect {
            Dialect::Nclu => command::trim_pending_diff(&raw),
            Dialect::Nvue => command::strip_color(&raw).trim().to_string(),
        };
        Ok(diff)
    }

    /// Apply the candidate to the running config.
    ///
    /// No-op when nothing is loaded. NVUE may answer with a
    /// confirmation question: `force` answers yes; otherwise the
    /// question is answered no, the candidate is discarded, and
    /// [`ConfigError::MergeRejected`] carries the device's warning.
    /// On success the session becomes rollback-eligible and returns
    /// to `Idle`.
    pub async fn commit_candidate(&mut self, force: bool) -> Result<()> {
        let Some(tx) = self.transaction.as_ref() else {
            return Ok(());
        };
        let staged = tx.lines.len();
        let dialect = self.dialect.ok_or(ChannelError::NotConnected)?;
        let channel = self
            .channel
            .as_deref_mut()
            .ok_or(ChannelError::NotConnected)?;

        debug!("committing candidate of {staged} staged lines (force: {force})");
        let translator = Translator::new(dialect);
        let reply = output::text(channel, translator.commit()).await?;

        if dialect == Dialect::Nvue && reply.contains(CONFIRM_MARKER) {
            if force {
                output::text(channel, "y").await?;
            } else {
                output::text(channel, "n").await?;
                self.discard_candidate().await?;
                return Err(ConfigError::MergeRejected {
                    warning: command::extract_apply_warning(&reply),
                }
                .into());
            }
        }

        self.transaction = None;
        self.applied = true;
        Ok(())
    }

    /// Drop the candidate, returning the session to `Idle`.
    ///
    /// No-op when nothing is loaded. The abort reply is not inspected:
    /// whatever the device says, this session no longer has a
    /// candidate.
    pub async fn discard_candidate(&mut self) -> Result<()> {
        if self.transaction.is_none() {
            return Ok(());
        }
        let dialect = self.dialect.ok_or(ChannelError::NotConnected)?;
        let channel = self
            .channel
            .as_deref_mut()
            .ok_or(ChannelError::NotConnected)?;

        debug!("discarding candidate");
        output::text(channel, Translator::new(dialect).discard()).await?;
        self.transaction = None;
        Ok(())
    }

    /// Undo the last change committed through this session.
    ///
    /// Silent no-op when nothing was committed - there is nothing to
    /// undo, so no command reaches the device. NVUE devices roll back
    /// by re-applying the revision that preceded the last commit; the
    /// revision history is queried from the device at call time and
    /// never stored.
    pub async fn rollback(&mut self) -> Result<()> {
        if !self.applied {
            return Ok(());
        }
        let dialect = self.dialect.ok_or(ChannelError::NotConnected)?;
        let channel = self
            .channel
            .as_deref_mut()
            .ok_or(ChannelError::NotConnected)?;

        debug!("rolling back last committed change");
        let translator = Translator::new(dialect);

        if let Some(history_command) = translator.history() {
            let history = output::text(channel, history_command).await?;
            let revision = command::previous_revision(&history).ok_or_else(|| {
                ConfigError::MalformedOutput {
                    command: history_command.to_string(),
                }
            })?;
            output::text(channel, &translator.apply_revision(&revision)).await?;
        } else {
            output::text(channel, translator.rollback_last()).await?;
        }

        self.applied = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testing::ScriptedChannel;

    fn session(dialect: Dialect, channel: ScriptedChannel) -> DeviceSession {
        DeviceSession::with_channel(Box::new(channel), dialect)
    }

    #[tokio::test]
    async fn discard_after_load_returns_to_idle() {
        for dialect in [Dialect::Nclu, Dialect::Nvue] {
            let channel = ScriptedChannel::new();
            let log = channel.log();
            let mut session = session(dialect, channel);

            session.load_candidate("net add vlan 10").await.unwrap();
            assert!(session.has_candidate());

            session.discard_candidate().await.unwrap();
            assert!(!session.has_candidate());

            // Compare after discard is empty and costs no device
            // interaction.
            let sent_before = log.lock().unwrap().len();
            assert_eq!(session.compare_candidate().await.unwrap(), "");
            assert_eq!(log.lock().unwrap().len(), sent_before);
        }
    }

    #[tokio::test]
    async fn discard_sends_the_dialect_abort_command() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.load_candidate("nv set system hostname leaf01").await.unwrap();
        session.discard_candidate().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            ["nv set system hostname leaf01", "nv config detach"]
        );
    }

    #[tokio::test]
    async fn compare_in_idle_is_empty_and_idempotent() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nclu, channel);

        assert_eq!(session.compare_candidate().await.unwrap(), "");
        assert_eq!(session.compare_candidate().await.unwrap(), "");
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_line_aborts_load_and_keeps_earlier_lines_sent() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // first line accepted
        channel.push_reply("ERROR: error\nInvalid config"); // second refused
        let log = channel.log();
        let mut session = session(Dialect::Nclu, channel);

        let err = session
            .load_candidate(vec![
                "net add vlan 10".to_string(),
                "net add bogus thing".to_string(),
                "net add vlan 20".to_string(),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Config(ConfigError::ApplyRejected { ref command })
                if command == "net add bogus thing"
        ));
        // The first line went out and is not retracted; the third was
        // never sent.
        assert_eq!(
            *log.lock().unwrap(),
            ["net add vlan 10", "net add bogus thing"]
        );

        // The partial candidate is still discardable.
        assert!(session.has_candidate());
        session.discard_candidate().await.unwrap();
        assert_eq!(log.lock().unwrap().last().unwrap(), "net abort");
    }

    #[tokio::test]
    async fn empty_candidate_is_invalid_input() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nclu, channel);

        for source in [
            CandidateSource::Text("\n   \n".to_string()),
            CandidateSource::Lines(Vec::new()),
        ] {
            let err = session.load_candidate(source).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Config(ConfigError::InvalidInput { .. })
            ));
        }
        assert!(log.lock().unwrap().is_empty());
        assert!(!session.has_candidate());
    }

    #[tokio::test]
    async fn missing_candidate_file_is_invalid_input() {
        let channel = ScriptedChannel::new();
        let mut session = session(Dialect::Nclu, channel);

        let err = session
            .load_candidate(PathBuf::from("/nonexistent/candidate.conf"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn nclu_compare_trims_the_noop_section() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // load
        channel.push_reply("+ interface swp1\nnet add/del commands\nnet add vlan 10");
        let log = channel.log();
        let mut session = session(Dialect::Nclu, channel);

        session.load_candidate("net add interface swp1").await.unwrap();
        let diff = session.compare_candidate().await.unwrap();

        assert_eq!(diff, "+ interface swp1");
        assert_eq!(log.lock().unwrap().last().unwrap(), "net pending");
    }

    #[tokio::test]
    async fn nclu_commit_is_unconditional_and_enables_rollback() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nclu, channel);

        session.load_candidate("net add vlan 10").await.unwrap();
        session.commit_candidate(false).await.unwrap();
        assert!(!session.has_candidate());

        session.rollback().await.unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            ["net add vlan 10", "net commit", "net rollback last"]
        );
    }

    #[tokio::test]
    async fn commit_in_idle_is_a_noop() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.commit_candidate(true).await.unwrap();
        assert!(log.lock().unwrap().is_empty());

        // And it does not make the session rollback-eligible.
        session.rollback().await.unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nvue_commit_declined_discards_and_reports_the_warning() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // staging line
        channel.push_reply(
            "Warning: The following services will be restarted.\nAre you sure? [y/N]",
        );
        channel.push_reply(""); // answer "n"
        channel.push_reply(""); // nv config detach
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.load_candidate("nv set vrf mgmt").await.unwrap();
        let err = session.commit_candidate(false).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Config(ConfigError::MergeRejected { ref warning })
                if warning == "The following services will be restarted."
        ));
        // The caller always lands in Idle after a declined commit.
        assert!(!session.has_candidate());
        assert_eq!(
            *log.lock().unwrap(),
            ["nv set vrf mgmt", "nv config apply", "n", "nv config detach"]
        );

        // A declined commit never enables rollback.
        session.rollback().await.unwrap();
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn nvue_commit_forced_answers_yes() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // staging line
        channel.push_reply("Warning: disruptive.\nAre you sure? [y/N]");
        channel.push_reply(""); // answer "y"
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.load_candidate("nv set vrf mgmt").await.unwrap();
        session.commit_candidate(true).await.unwrap();

        assert!(!session.has_candidate());
        assert_eq!(
            *log.lock().unwrap(),
            ["nv set vrf mgmt", "nv config apply", "y"]
        );
    }

    #[tokio::test]
    async fn nvue_commit_without_question_applies_directly() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // staging line
        channel.push_reply("applied [rev_id: 3]");
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.load_candidate("nv set system hostname leaf01").await.unwrap();
        session.commit_candidate(false).await.unwrap();

        assert!(!session.has_candidate());
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rollback_without_commit_touches_nothing() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.rollback().await.unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nvue_rollback_applies_the_previous_revision() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // staging line
        channel.push_reply(""); // apply
        channel.push_reply("rev_id: '20230815_130000.000001'\nrev_id: '20230815_120201.123456'");
        channel.push_reply(""); // apply revision
        let log = channel.log();
        let mut session = session(Dialect::Nvue, channel);

        session.load_candidate("nv set vlan 10").await.unwrap();
        session.commit_candidate(false).await.unwrap();
        session.rollback().await.unwrap();

        assert_eq!(
            log.lock().unwrap().last().unwrap(),
            "nv config apply 20230815_120201.123456"
        );

        // Rollback consumed the eligibility; a second call is silent.
        let sent = log.lock().unwrap().len();
        session.rollback().await.unwrap();
        assert_eq!(log.lock().unwrap().len(), sent);
    }

    #[tokio::test]
    async fn nvue_rollback_with_short_history_is_malformed_output() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply(""); // staging line
        channel.push_reply(""); // apply
        channel.push_reply("rev_id: '20230815_130000.000001'");
        let mut session = session(Dialect::Nvue, channel);

        session.load_candidate("nv set vlan 10").await.unwrap();
        session.commit_candidate(false).await.unwrap();
        let err = session.rollback().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Config(ConfigError::MalformedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn loading_twice_extends_the_same_candidate() {
        let channel = ScriptedChannel::new();
        let log = channel.log();
        let mut session = session(Dialect::Nclu, channel);

        session.load_candidate("net add vlan 10").await.unwrap();
        session.load_candidate("net add vlan 20").await.unwrap();

        assert!(session.has_candidate());
        assert_eq!(*log.lock().unwrap(), ["net add vlan 10", "net add vlan 20"]);

        // One discard clears the merged candidate.
        session.discard_candidate().await.unwrap();
        assert!(!session.has_candidate());
    }
}
