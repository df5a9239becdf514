//! Device session: the composition root.
//!
//! A [`DeviceSession`] owns the channel to one switch, the dialect
//! detected when the session opened, and the lifecycle of at most one
//! configuration transaction. Exactly one caller drives a session at a
//! time; every operation takes `&mut self`, so concurrent use of one
//! device needs either a lock around the session or one session per
//! task. Sessions to different devices share nothing.

mod builder;
mod transaction;

pub use builder::SessionBuilder;
pub use transaction::CandidateSource;

use log::debug;
use secrecy::SecretString;

use transaction::ConfigTransaction;

use crate::channel::{Channel, ChannelConfig, ShellChannel};
use crate::dialect::{self, Dialect};
use crate::error::{ChannelError, Result};
use crate::output;
use crate::transport::{SshConfig, SshTransport};

/// Interactive configuration session with a single Cumulus switch.
///
/// Built disconnected via [`SessionBuilder`]; [`open`](Self::open)
/// establishes the SSH channel, escalates privileges when configured,
/// and probes the dialect. The dialect is immutable until
/// [`close`](Self::close).
pub struct DeviceSession {
    ssh: SshConfig,
    channel_config: ChannelConfig,
    sudo: bool,
    sudo_password: Option<SecretString>,

    /// Exclusively owned channel (None when disconnected).
    channel: Option<Box<dyn Channel>>,

    /// Detected once per session, never re-probed.
    dialect: Option<Dialect>,

    /// The in-flight change attempt. `None` is the Idle state.
    transaction: Option<ConfigTransaction>,

    /// Whether this session committed a change, gating rollback.
    applied: bool,
}

impl DeviceSession {
    pub(crate) fn new(
        ssh: SshConfig,
        channel_config: ChannelConfig,
        sudo: bool,
        sudo_password: Option<SecretString>,
    ) -> Self {
        Self {
            ssh,
            channel_config,
            sudo,
            sudo_password,
            channel: None,
            dialect: None,
            transaction: None,
            applied: false,
        }
    }

    /// Build a session on an already-established channel.
    ///
    /// This is the seam for custom transports and for driving the
    /// transaction engine against a scripted channel in tests; `open`
    /// and `close` manage the channel for SSH-backed sessions instead.
    pub fn with_channel(channel: Box<dyn Channel>, dialect: Dialect) -> Self {
        Self {
            ssh: SshConfig::default(),
            channel_config: ChannelConfig::default(),
            sudo: false,
            sudo_password: None,
            channel: Some(channel),
            dialect: Some(dialect),
            transaction: None,
            applied: false,
        }
    }

    /// Connect, escalate privileges if configured, and detect the
    /// dialect. Any failure here is fatal to session setup.
    pub async fn open(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(ChannelError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(self.ssh.clone()).await?;
        let mut shell = ShellChannel::open(transport, self.channel_config.clone()).await?;

        if self.sudo {
            shell.escalate_sudo(self.sudo_password.as_ref()).await?;
        }

        let mut channel: Box<dyn Channel> = Box::new(shell);

        // Classify the device once; no retries - a device that cannot
        // answer the probe is a failed connection.
        let probe = output::text(channel.as_mut(), dialect::VERSION_PROBE).await?;
        let detected = Dialect::from_probe(&probe);
        debug!("{}: device speaks {detected}", self.ssh.host);

        self.channel = Some(channel);
        self.dialect = Some(detected);
        Ok(())
    }

    /// Disconnect and drop all session state, including any pending
    /// transaction and the rollback eligibility.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            channel.close().await?;
        }
        self.dialect = None;
        self.transaction = None;
        self.applied = false;
        Ok(())
    }

    /// Whether the underlying connection is still up.
    pub fn is_alive(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_alive())
    }

    /// Dialect detected at open, if connected.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Whether a candidate is currently loaded.
    pub fn has_candidate(&self) -> bool {
        self.transaction.is_some()
    }

    pub(crate) fn channel_mut(&mut self) -> Result<&mut (dyn Channel + 'static)> {
        self.channel
            .as_deref_mut()
            .ok_or_else(|| ChannelError::NotConnected.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChannel;

    #[tokio::test]
    async fn close_resets_session_state() {
        let mut channel = ScriptedChannel::new();
        channel.push_reply("");

        let mut session = DeviceSession::with_channel(Box::new(channel), Dialect::Nclu);
        session
            .load_candidate("net add interface swp1")
            .await
            .unwrap();
        assert!(session.has_candidate());
        assert!(session.is_alive());

        session.close().await.unwrap();
        assert!(!session.has_candidate());
        assert!(!session.is_alive());
        assert_eq!(session.dialect(), None);
    }

    #[tokio::test]
    async fn operations_require_a_connection() {
        let mut session = SessionBuilder::new("switch1").build();
        // Idle compare short-circuits, but a load must fail.
        assert!(session.compare_candidate().await.is_ok());
        assert!(session.load_candidate("net add vlan 10").await.is_err());
    }
}
