//! Scripted channel for driving the engine without a device.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::channel::Channel;
use crate::error::Result;

/// Log of commands a [`ScriptedChannel`] has sent, shared so tests can
/// keep inspecting it after the channel moves into a session.
pub(crate) type CommandLog = Arc<Mutex<Vec<String>>>;

/// In-memory [`Channel`] returning queued replies in order.
///
/// Commands beyond the scripted replies answer with an empty string,
/// like a quiet device.
#[derive(Debug)]
pub(crate) struct ScriptedChannel {
    replies: VecDeque<String>,
    log: CommandLog,
    alive: bool,
}

impl ScriptedChannel {
    pub(crate) fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            log: Arc::new(Mutex::new(Vec::new())),
            alive: true,
        }
    }

    /// Queue the reply for the next unanswered command.
    pub(crate) fn push_reply(&mut self, reply: &str) {
        self.replies.push_back(reply.to_string());
    }

    /// Handle onto the command log, valid after the channel is moved.
    pub(crate) fn log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Commands sent so far, in order.
    pub(crate) fn sent(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.log.lock().unwrap().push(command.to_string());
        Ok(self.replies.pop_front().unwrap_or_default())
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    async fn close(&mut self) -> Result<()> {
        self.alive = false;
        Ok(())
    }
}
