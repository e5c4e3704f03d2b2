//! Session manager
//!
//! Owns the cache of reused sessions keyed by `(client id, host:port)`.
//! Each key maps to a once-cell, so concurrent actions from one client
//! against one host share a single dial: the first caller dials, the rest
//! wait on the same cell. A failed dial leaves the cell empty and the next
//! caller tries again.

use crate::error::{AppError, Result};
use crate::logging::NetconfLogger;
use crate::suite::SshConfig;
use crate::transport::{NetconfSession, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::timeout;

type SessionKey = (usize, String);
type SessionCell = Arc<OnceCell<Arc<dyn NetconfSession>>>;

/// A session handed to one action
pub enum Lease {
    /// Cached for the rest of the run, closed by [`SessionManager::close_all`]
    Shared(Arc<dyn NetconfSession>),
    /// Dialed for this action only, the holder must close it
    Owned(Box<dyn NetconfSession>),
}

impl Lease {
    pub fn session(&self) -> &dyn NetconfSession {
        match self {
            Lease::Shared(session) => session.as_ref(),
            Lease::Owned(session) => session.as_ref(),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Lease::Shared(_))
    }
}

/// Hands out sessions and tracks the reused ones
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    dial_timeout: Duration,
    sessions: Mutex<HashMap<SessionKey, SessionCell>>,
    logger: Option<NetconfLogger>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, dial_timeout: Duration) -> Self {
        Self {
            transport,
            dial_timeout,
            sessions: Mutex::new(HashMap::new()),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: NetconfLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Get a session for `client` against the host in `config`
    ///
    /// Without connection reuse every call dials. With reuse the session is
    /// cached under `(client, address)` once the dial succeeds.
    pub async fn acquire(&self, client: usize, config: &SshConfig) -> Result<Lease> {
        let address = config.address();

        if !config.reuse_connection {
            let dialed = self.dial(config, &address).await;
            self.log_dial(client, &address, false, dialed.as_ref().err()).await;
            return dialed.map(Lease::Owned);
        }

        let cell = {
            let mut sessions = self.sessions.lock().await;
            sessions.entry((client, address.clone())).or_default().clone()
        };

        let dialed_now = AtomicBool::new(false);
        let acquired = cell
            .get_or_try_init(|| async {
                dialed_now.store(true, Ordering::Relaxed);
                self.dial(config, &address).await.map(Arc::<dyn NetconfSession>::from)
            })
            .await
            .cloned();

        if dialed_now.load(Ordering::Relaxed) || acquired.is_err() {
            self.log_dial(client, &address, true, acquired.as_ref().err()).await;
        }
        acquired.map(Lease::Shared)
    }

    async fn dial(&self, config: &SshConfig, address: &str) -> Result<Box<dyn NetconfSession>> {
        self.transport
            .dial(address, &config.username, &config.password, self.dial_timeout)
            .await
    }

    async fn log_dial(&self, client: usize, address: &str, reused: bool, error: Option<&AppError>) {
        if let Some(logger) = &self.logger {
            logger.log_dial(client, address, reused, error).await;
        }
    }

    /// Hand a lease back, closing the session if it was dialed for one action
    ///
    /// Shared sessions stay open until [`close_all`](Self::close_all).
    pub async fn release(&self, lease: Lease) -> Result<()> {
        match lease {
            Lease::Shared(_) => Ok(()),
            Lease::Owned(session) => self.close_session(session.as_ref()).await,
        }
    }

    /// Close one session, giving up after the dial timeout
    async fn close_session(&self, session: &dyn NetconfSession) -> Result<()> {
        timeout(self.dial_timeout, session.close()).await.map_err(|_| {
            AppError::timeout(format!(
                "session {} not closed after {}s",
                session.session_id(),
                self.dial_timeout.as_secs_f64()
            ))
        })?
    }

    /// Number of cached sessions that are currently open
    pub async fn cached_sessions(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.values().filter(|cell| cell.initialized()).count()
    }

    /// Close every cached session once and empty the cache
    ///
    /// Close failures and timeouts are logged and otherwise ignored. Returns the number
    /// of sessions a close was attempted on.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<(SessionKey, SessionCell)> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().collect()
        };

        let mut closed = 0;
        for ((_, address), cell) in drained {
            let Some(session) = cell.get() else {
                continue;
            };
            closed += 1;
            if let Err(e) = self.close_session(session.as_ref()).await {
                if let Some(logger) = &self.logger {
                    logger.log_close_failure(&address, &e).await;
                }
            }
        }
        closed
    }
}
