//! Session capability consumed by the session manager
//!
//! The engine only ever talks to [`Transport`] and [`NetconfSession`], so
//! tests can swap the SSH implementation for an in-memory one.

pub mod framing;
pub mod ssh;

pub use ssh::SshTransport;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Something that can open NETCONF sessions
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session to `addr` (`host:port`), giving up after `timeout`
    async fn dial(
        &self,
        addr: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Box<dyn NetconfSession>>;
}

/// An established NETCONF session
///
/// `exec` may be called from several tasks at once when a cached session
/// is shared by a concurrent block; implementations serialize internally.
#[async_trait]
pub trait NetconfSession: Send + Sync {
    /// Server-assigned session id from the hello exchange
    fn session_id(&self) -> u64;

    /// Send one RPC body and wait for its reply
    async fn exec(&self, rpc: &str) -> Result<String>;

    /// Release the session
    async fn close(&self) -> Result<()>;
}
