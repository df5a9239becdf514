//! SSH shell channel with timing-based reads.
//!
//! Cumulus CLIs are driven through a plain Linux shell, so there is no
//! structured framing to lean on: a reply is over when the shell prompt
//! comes back, or - for interactive questions that end without a prompt -
//! when the stream goes idle. Both cases are bounded by the per-command
//! timeout, whose expiry is fatal to the session.

use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use log::debug;
use regex::bytes::Regex;
use russh::ChannelMsg;
use russh::client::Msg;
use secrecy::{ExposeSecret, SecretString};

use super::buffer::OutputBuffer;
use super::{Channel, ChannelConfig};
use crate::error::{ChannelError, Result, TransportError};
use crate::transport::SshTransport;

/// Prompt of a Cumulus login shell, user (`$`) or root (`#`).
/// Anchored to the end of the buffer so `#` inside output lines does
/// not terminate a read early.
const PROMPT_PATTERN: &str = r"[$#][ \t]*$";

static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROMPT_PATTERN).expect("prompt pattern is valid"));

/// Interactive shell on one SSH connection.
pub struct ShellChannel {
    transport: SshTransport,
    channel: russh::Channel<Msg>,
    buffer: OutputBuffer,
    prompt: Regex,
    config: ChannelConfig,
}

impl ShellChannel {
    /// Open a PTY + shell on the transport and wait out the login
    /// banner so the first command starts from a clean prompt.
    pub async fn open(transport: SshTransport, config: ChannelConfig) -> Result<Self> {
        let channel = transport.open_shell().await?;

        let mut shell = Self {
            transport,
            channel,
            buffer: OutputBuffer::new(config.search_depth),
            prompt: PROMPT.clone(),
            config,
        };

        // An empty line forces the shell to re-print its prompt even if
        // the motd already scrolled past.
        shell.write_line("").await?;
        shell.read_reply().await?;

        Ok(shell)
    }

    /// Become root via `sudo su`, answering the password prompt when
    /// one appears (NOPASSWD setups never ask).
    ///
    /// Must be called before the channel is handed to the session; a
    /// refusal is a fatal transport error, not a retryable one.
    pub async fn escalate_sudo(&mut self, password: Option<&SecretString>) -> Result<()> {
        self.write_line("sudo su").await?;
        let reply = self.read_reply().await?;

        if reply.contains("[sudo]") {
            let Some(password) = password else {
                return Err(TransportError::EscalationFailed {
                    message: "sudo asked for a password but none was configured".to_string(),
                }
                .into());
            };
            // The password itself is neither logged nor echoed back.
            self.write_line(password.expose_secret()).await?;
            let reply = self.read_reply().await?;
            if reply.contains("Sorry") || reply.contains("incorrect") {
                return Err(TransportError::EscalationFailed {
                    message: "sudo password rejected".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let payload = format!("{line}\n");
        self.channel
            .data(payload.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until the prompt shows up in the buffer tail, or the stream
    /// has produced output and then gone idle, or the deadline passes.
    async fn read_reply(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.config.command_timeout;

        loop {
            if self.buffer.prompt_in_tail(&self.prompt) {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ChannelError::Timeout(self.config.command_timeout).into());
            }
            let wait = self.config.idle_window.min(deadline - now);

            match tokio::time::timeout(wait, self.channel.wait()).await {
                Ok(Some(ChannelMsg::Data { ref data })) => self.buffer.extend(data),
                Ok(Some(ChannelMsg::ExtendedData { ref data, .. })) => self.buffer.extend(data),
                Ok(Some(ChannelMsg::Eof | ChannelMsg::Close)) => {
                    if self.buffer.is_empty() {
                        return Err(ChannelError::Closed.into());
                    }
                    break;
                }
                Ok(Some(_)) => {}
                Ok(None) => return Err(ChannelError::Closed.into()),
                // Idle: done if the device said anything at all,
                // otherwise keep waiting for the first bytes.
                Err(_) if !self.buffer.is_empty() => break,
                Err(_) => {}
            }
        }

        Ok(self.buffer.take_string())
    }
}

#[async_trait]
impl Channel for ShellChannel {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        debug!("sending command: {command}");
        self.buffer.clear();
        self.write_line(command).await?;
        let raw = self.read_reply().await?;
        Ok(trim_reply(&raw, command))
    }

    fn is_alive(&self) -> bool {
        self.transport.is_alive()
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.channel.eof().await;
        self.transport.close().await
    }
}

/// Remove the echoed command from the head of a reply and the prompt
/// line from its tail.
fn trim_reply(raw: &str, command: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "");

    let mut lines: Vec<&str> = normalized.lines().collect();

    if let Some(first) = lines.first() {
        let first = first.trim_end();
        if !command.is_empty() && (first == command || first.ends_with(command)) {
            lines.remove(0);
        }
    }

    if let Some(last) = lines.last() {
        if PROMPT.is_match(last.as_bytes()) {
            lines.pop();
        }
    }

    lines.join("\n").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_and_prompt_are_trimmed() {
        let raw = "net pending\r\n+ interface swp1\r\ncumulus@switch:~$ ";
        assert_eq!(trim_reply(raw, "net pending"), "+ interface swp1");
    }

    #[test]
    fn echo_with_wrapped_prompt_prefix_is_trimmed() {
        let raw = "cumulus@switch:~$ net commit\nok\ncumulus@switch:~$ ";
        assert_eq!(trim_reply(raw, "net commit"), "ok");
    }

    #[test]
    fn reply_without_prompt_survives_intact() {
        let raw = "nv config apply\nWarning: there are changes\nAre you sure? [y/N]";
        assert_eq!(
            trim_reply(raw, "nv config apply"),
            "Warning: there are changes\nAre you sure? [y/N]"
        );
    }

    #[test]
    fn empty_command_keeps_first_line() {
        assert_eq!(trim_reply("motd text\n$ ", ""), "motd text");
    }

    #[test]
    fn prompt_pattern_ignores_hash_mid_output() {
        let pattern = &*PROMPT;
        assert!(pattern.is_match(b"root@switch:~# "));
        assert!(!pattern.is_match(b"# comment line\nmore output"));
    }
}
