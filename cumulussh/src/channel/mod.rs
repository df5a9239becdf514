//! Interactive channel layer.
//!
//! A [`Channel`] is a persistent, authenticated text pipe to one switch
//! with send-then-read semantics: write a line, read everything the
//! device answers until its prompt returns or the stream goes idle.
//! Replies are matched to commands purely by ordering, so exactly one
//! command may be in flight at a time - the `&mut self` receiver
//! enforces that.

mod buffer;
mod shell;

pub use buffer::OutputBuffer;
pub use shell::ShellChannel;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Timing and buffering knobs for an interactive channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Upper bound for a single command round-trip. Expiry is fatal.
    pub command_timeout: Duration,

    /// How long the stream must stay quiet before a reply without a
    /// prompt is considered complete. This is what lets confirmation
    /// questions (`[y/N]`) come back as ordinary replies.
    pub idle_window: Duration,

    /// Number of bytes from the end of the buffer searched for the
    /// prompt pattern.
    pub search_depth: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(60),
            idle_window: Duration::from_millis(500),
            search_depth: 1000,
        }
    }
}

/// Send-then-read text channel to a single device.
///
/// [`ShellChannel`] is the SSH-backed implementation; tests drive the
/// transaction engine through scripted implementations of this trait.
#[async_trait]
pub trait Channel: Send {
    /// Send one command line and read back its reply, with the command
    /// echo and the trailing prompt line removed.
    async fn send_command(&mut self, command: &str) -> Result<String>;

    /// Whether the underlying connection is still up.
    fn is_alive(&self) -> bool;

    /// Tear the channel down.
    async fn close(&mut self) -> Result<()>;
}
