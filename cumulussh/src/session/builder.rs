//! Builder for device sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::DeviceSession;
use crate::channel::ChannelConfig;
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for constructing a [`DeviceSession`].
///
/// # Example
///
/// ```rust,no_run
/// use cumulussh::SessionBuilder;
///
/// # async fn example() -> Result<(), cumulussh::Error> {
/// let mut session = SessionBuilder::new("leaf01.lab")
///     .username("cumulus")
///     .password("CumulusLinux!")
///     .sudo()
///     .build();
/// session.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: String,
    auth: AuthMethod,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    sudo: bool,
    sudo_password: Option<SecretString>,
}

impl SessionBuilder {
    /// Create a builder for the given switch. The username defaults to
    /// `cumulus`, the factory account.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: "cumulus".to_string(),
            auth: AuthMethod::None,
            timeout: Duration::from_secs(60),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            sudo: false,
            sudo_password: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(password.into().into());
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(passphrase.into().into()),
        };
        self
    }

    /// Timeout for connecting and for each command round-trip.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Become root (`sudo su`) after login. The login password answers
    /// the sudo prompt unless [`sudo_password`](Self::sudo_password)
    /// overrides it; NOPASSWD setups never prompt.
    pub fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    /// Become root with a sudo password different from the login one.
    pub fn sudo_password(mut self, password: impl Into<String>) -> Self {
        self.sudo = true;
        self.sudo_password = Some(password.into().into());
        self
    }

    /// Build the session. This does not connect; call
    /// [`open`](DeviceSession::open) on the result.
    pub fn build(self) -> DeviceSession {
        let sudo_password = self.sudo_password.or_else(|| match &self.auth {
            AuthMethod::Password(password) => Some(password.clone()),
            _ => None,
        });

        let ssh = SshConfig {
            host: self.host,
            port: self.port,
            username: self.username,
            auth: self.auth,
            timeout: self.timeout,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
            ..SshConfig::default()
        };

        let channel_config = ChannelConfig {
            command_timeout: self.timeout,
            ..ChannelConfig::default()
        };

        DeviceSession::new(ssh, channel_config, self.sudo, sudo_password)
    }
}
