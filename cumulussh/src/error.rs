//! Error types for cumulussh.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for cumulussh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (connection, authentication, escalation)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Interactive channel errors (shell establishment, timeouts)
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Configuration transaction errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Transport layer errors. All of these are fatal to the session; the
/// driver never retries at this layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key changed since it was recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host key is not in known_hosts and strict checking is enabled
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts file could not be read or updated
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Privilege escalation (sudo) was refused by the device
    #[error("Privilege escalation failed: {message}")]
    EscalationFailed { message: String },

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Interactive channel errors. A command timeout here means the device
/// stopped answering; callers treat it as a dead session.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open the PTY on the session channel
    #[error("Failed to open PTY channel")]
    PtyOpenFailed,

    /// Failed to request a shell on the channel
    #[error("Failed to request shell")]
    ShellRequestFailed,

    /// No reply within the per-command timeout
    #[error("No reply within {0:?}")]
    Timeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// Session not connected
    #[error("Session not connected - call open() first")]
    NotConnected,

    /// Session already connected
    #[error("Session already connected")]
    AlreadyConnected,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Configuration transaction errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Candidate source was unusable: no file, no content, or an empty
    /// candidate after filtering blank lines
    #[error("Invalid candidate: {message}")]
    InvalidInput { message: String },

    /// The device rejected a candidate line during load. Lines sent
    /// before this one remain applied to the device's pending buffer.
    #[error("Command '{command}' cannot be applied")]
    ApplyRejected { command: String },

    /// The device declined to apply the staged configuration. The
    /// candidate has already been discarded when this is returned.
    #[error("Config cannot be applied: {warning}")]
    MergeRejected { warning: String },

    /// Structured output failed to parse twice in a row
    #[error("Malformed output from '{command}'")]
    MalformedOutput { command: String },
}

/// Result type alias using cumulussh's Error.
pub type Result<T> = std::result::Result<T, Error>;
