//! NETCONF over SSH using russh
//!
//! Password authentication only. The server host key is accepted without
//! verification, so the transport does not protect against an attacker in
//! the middle.

use super::framing::{self, FrameBuffer, MessageSource};
use super::{NetconfSession, Transport};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const NETCONF_SUBSYSTEM: &str = "netconf";

/// Dials NETCONF sessions over SSH
#[derive(Clone, Default)]
pub struct SshTransport {
    config: Arc<client::Config>,
}

impl SshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn connect(&self, addr: &str, username: &str, password: &str, timeout: Duration) -> Result<SshSession> {
        let mut handle = client::connect(self.config.clone(), addr, AcceptAnyHostKey)
            .await
            .map_err(|e| AppError::dial(format!("{}: {}", addr, e)))?;

        let authenticated = handle
            .authenticate_password(username, password)
            .await
            .map_err(|e| AppError::auth(format!("{}: {}", addr, e)))?;
        if !authenticated {
            return Err(AppError::auth(format!("{}: password rejected for {}", addr, username)));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| AppError::dial(format!("{}: failed to open channel: {}", addr, e)))?;
        channel
            .request_subsystem(true, NETCONF_SUBSYSTEM)
            .await
            .map_err(|e| AppError::dial(format!("{}: netconf subsystem refused: {}", addr, e)))?;

        let mut io = ChannelIo {
            channel,
            buffer: FrameBuffer::new(),
        };
        io.send(&framing::client_hello()).await?;
        let hello = io.next_message().await?;
        let session_id = framing::parse_session_id(&hello)?;

        Ok(SshSession {
            session_id,
            handle,
            io: Mutex::new(io),
            message_id: AtomicU64::new(0),
            close_timeout: timeout,
        })
    }
}

#[async_trait]
impl Transport for SshTransport {
    async fn dial(
        &self,
        addr: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Box<dyn NetconfSession>> {
        let session = tokio::time::timeout(timeout, self.connect(addr, username, password, timeout))
            .await
            .map_err(|_| AppError::dial(format!("{}: no session after {}s", addr, timeout.as_secs_f64())))??;
        Ok(Box::new(session))
    }
}

/// SSH client handler that trusts every server key
struct AcceptAnyHostKey;

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

struct ChannelIo {
    channel: Channel<Msg>,
    buffer: FrameBuffer,
}

impl ChannelIo {
    async fn send(&mut self, message: &str) -> Result<()> {
        let bytes = framing::frame(message);
        self.channel.data(&bytes[..]).await?;
        Ok(())
    }

    /// Send one RPC and wait for the reply carrying its message id
    async fn request(&mut self, message_id: u64, body: &str) -> Result<String> {
        self.send(&framing::wrap_rpc(message_id, body)).await?;
        framing::await_reply(self, message_id).await
    }
}

#[async_trait]
impl MessageSource for ChannelIo {
    async fn next_message(&mut self) -> Result<String> {
        loop {
            if let Some(message) = self.buffer.next_message()? {
                return Ok(message);
            }

            match self.channel.wait().await {
                Some(ChannelMsg::Data { ref data }) => self.buffer.extend(data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(AppError::transport("session closed by server"));
                }
                Some(_) => {}
            }
        }
    }
}

/// One NETCONF session on its own SSH connection
pub struct SshSession {
    session_id: u64,
    handle: Handle<AcceptAnyHostKey>,
    io: Mutex<ChannelIo>,
    message_id: AtomicU64,
    /// Bound on the close-session exchange
    close_timeout: Duration,
}

impl SshSession {
    fn next_message_id(&self) -> u64 {
        self.message_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl NetconfSession for SshSession {
    fn session_id(&self) -> u64 {
        self.session_id
    }

    async fn exec(&self, rpc: &str) -> Result<String> {
        let mut io = self.io.lock().await;
        let reply = io.request(self.next_message_id(), rpc).await?;
        framing::check_reply(reply)
    }

    /// Say goodbye with `<close-session/>`, then drop the SSH connection
    ///
    /// The goodbye is best effort and bounded by the dial timeout; the
    /// disconnect happens either way.
    async fn close(&self) -> Result<()> {
        let goodbye = async {
            let mut io = self.io.lock().await;
            io.request(self.next_message_id(), "<close-session/>").await
        };
        let _ = tokio::time::timeout(self.close_timeout, goodbye).await;

        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(AppError::from)
    }
}
