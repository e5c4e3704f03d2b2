//! Executes one NETCONF action and produces its result record

use crate::error::{AppError, Result};
use crate::logging::NetconfLogger;
use crate::models::NetconfResult;
use crate::netconf;
use crate::session::SessionManager;
use crate::suite::{NetconfAction, SshConfig};
use crate::transport::NetconfSession;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Runs NETCONF actions against sessions from a shared [`SessionManager`]
pub struct ActionExecutor {
    sessions: Arc<SessionManager>,
    exec_timeout: Option<Duration>,
    logger: Option<NetconfLogger>,
}

impl ActionExecutor {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            exec_timeout: None,
            logger: None,
        }
    }

    /// Bound each RPC round trip; `None` waits for as long as the server takes
    pub fn with_exec_timeout(mut self, exec_timeout: Option<Duration>) -> Self {
        self.exec_timeout = exec_timeout;
        self
    }

    pub fn with_logger(mut self, logger: NetconfLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Execute `action` for `client` and return exactly one result
    ///
    /// The payload is encoded before any session is requested, so an
    /// unsupported operation never touches the network. A session dialed
    /// for this action alone is closed before returning, whatever the
    /// outcome of the RPC. `latency` covers the RPC round trip only.
    pub async fn execute(
        &self,
        suite_start: Instant,
        client: usize,
        action: &NetconfAction,
        config: &SshConfig,
    ) -> NetconfResult {
        let result = NetconfResult::new(client, &action.hostname, &action.operation);

        let rpc = match netconf::encode(action) {
            Ok(rpc) => rpc,
            Err(e) => return self.finish(result.failed(e)).await,
        };
        for warning in &rpc.warnings {
            if let Some(logger) = &self.logger {
                logger
                    .log_encode_warning(client, &action.operation, &warning.to_string())
                    .await;
            }
        }

        let lease = match self.sessions.acquire(client, config).await {
            Ok(lease) => lease,
            Err(e) => return self.finish(result.failed(e)).await,
        };

        let mut result = result;
        result.session_id = lease.session().session_id();

        let started = Instant::now();
        let reply = self.exec(lease.session(), &rpc.body).await;
        let latency = started.elapsed();

        if let Err(e) = self.sessions.release(lease).await {
            if let Some(logger) = &self.logger {
                logger.log_close_failure(&config.address(), &e).await;
            }
        }

        let result = match reply {
            Ok(_) => {
                result.latency = NetconfResult::millis(latency);
                result.when = NetconfResult::millis(suite_start.elapsed());
                result
            }
            Err(e) => result.failed(e),
        };
        self.finish(result).await
    }

    async fn exec(&self, session: &dyn NetconfSession, body: &str) -> Result<String> {
        match self.exec_timeout {
            Some(limit) => timeout(limit, session.exec(body))
                .await
                .map_err(|_| AppError::timeout(format!("no reply within {}s", limit.as_secs_f64())))?,
            None => session.exec(body).await,
        }
    }

    async fn finish(&self, result: NetconfResult) -> NetconfResult {
        if let Some(logger) = &self.logger {
            logger.log_result(&result).await;
        }
        result
    }
}
