//! Output normalization.
//!
//! Commands either answer with plain text or - for the `json` variants
//! of the show commands - with a JSON document. The JSON path gets a
//! bounded retry: a read on the timing-based channel can race the
//! device and capture a partial buffer, in which case the command is
//! sent once more and re-parsed. Two consecutive parse failures are a
//! [`ConfigError::MalformedOutput`] error; partial or empty structured
//! data is never returned.

use log::warn;
use serde_json::Value;

use crate::channel::Channel;
use crate::error::{ConfigError, Result};

/// Total number of send-and-parse attempts for structured output.
const STRUCTURED_ATTEMPTS: u32 = 2;

/// Reply of one executed command, tagged by the command that produced
/// it. A `Structured` value is always a complete parse.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedOutput {
    /// Raw reply of a plain-text command.
    Text { command: String, body: String },

    /// Fully parsed reply of a JSON-producing command.
    Structured { command: String, value: Value },
}

impl NormalizedOutput {
    /// The command this output came from.
    pub fn command(&self) -> &str {
        match self {
            NormalizedOutput::Text { command, .. }
            | NormalizedOutput::Structured { command, .. } => command,
        }
    }
}

/// Execute `command` on the channel, normalizing the reply.
///
/// With `expect_structured` the reply is parsed as JSON under the retry
/// policy above; otherwise the raw text is returned unconditionally.
/// This layer does not interpret command semantics.
pub async fn execute(
    channel: &mut dyn Channel,
    command: &str,
    expect_structured: bool,
) -> Result<NormalizedOutput> {
    if expect_structured {
        let value = structured(channel, command).await?;
        Ok(NormalizedOutput::Structured {
            command: command.to_string(),
            value,
        })
    } else {
        let body = text(channel, command).await?;
        Ok(NormalizedOutput::Text {
            command: command.to_string(),
            body,
        })
    }
}

/// Execute a plain-text command.
pub async fn text(channel: &mut dyn Channel, command: &str) -> Result<String> {
    channel.send_command(command).await
}

/// Execute a JSON-producing command with the bounded retry.
pub async fn structured(channel: &mut dyn Channel, command: &str) -> Result<Value> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let raw = channel.send_command(command).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < STRUCTURED_ATTEMPTS => {
                warn!("malformed output from '{command}' (attempt {attempt}): {err}");
            }
            Err(err) => {
                warn!("malformed output from '{command}' (attempt {attempt}, giving up): {err}");
                return Err(ConfigError::MalformedOutput {
                    command: command.to_string(),
                }
                .into());
            }
        }
    }
}
