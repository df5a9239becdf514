//! # Cumulussh
//!
//! Async SSH configuration driver for Cumulus Linux switches.
//!
//! Cumulussh drives staged configuration changes over an interactive
//! SSH session and presents one transaction contract for both Cumulus
//! CLI generations: the legacy line-oriented NCLU (`net ...`) and the
//! declarative NVUE (`nv ...`). The dialect is detected once when the
//! session opens; loading, diffing, committing, discarding and rolling
//! back all translate to the right commands for the device at hand.
//!
//! ## Features
//!
//! - Async SSH sessions via russh, with optional sudo escalation
//! - Automatic NCLU/NVUE dialect detection
//! - Staged load / compare / commit / discard / rollback lifecycle
//! - JSON output acquisition with retry against partial reads
//! - Read-only state queries (interfaces, ARP, environment)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cumulussh::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cumulussh::Error> {
//!     let mut session = SessionBuilder::new("leaf01.lab")
//!         .username("cumulus")
//!         .password("CumulusLinux!")
//!         .sudo()
//!         .build();
//!
//!     session.open().await?;
//!
//!     session.load_candidate("net add vlan 10").await?;
//!     println!("{}", session.compare_candidate().await?);
//!     session.commit_candidate(false).await?;
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod command;
pub mod dialect;
pub mod error;
pub mod output;
pub mod queries;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use channel::{Channel, ChannelConfig, ShellChannel};
pub use dialect::Dialect;
pub use error::{ChannelError, ConfigError, Error, Result, TransportError};
pub use output::NormalizedOutput;
pub use queries::{ArpEntry, Environment, Interface};
pub use session::{CandidateSource, DeviceSession, SessionBuilder};
pub use transport::{AuthMethod, HostKeyVerification, SshConfig};
