//! Run orchestration

use super::{ActionExecutor, VirtualClient};
use crate::error::{AppError, Result};
use crate::logging::{LoggerFactory, RunLogger};
use crate::models::{Config, NetconfResult};
use crate::session::SessionManager;
use crate::suite::TestSuite;
use crate::transport::Transport;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// What a finished run reports besides its result stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub elapsed: Duration,
    pub clients_completed: usize,
    pub results: usize,
    pub sessions_closed: usize,
}

/// Drives all virtual clients of one suite
pub struct Engine {
    suite: Arc<TestSuite>,
    sessions: Arc<SessionManager>,
    executor: Arc<ActionExecutor>,
    logger: RunLogger,
    run_id: String,
}

impl Engine {
    pub fn new(suite: TestSuite, transport: Arc<dyn Transport>, config: &Config) -> Self {
        let loggers = LoggerFactory::new(config.clone());

        let sessions = Arc::new(
            SessionManager::new(transport, config.dial_timeout()).with_logger(loggers.create_netconf_logger()),
        );
        let executor = ActionExecutor::new(sessions.clone())
            .with_exec_timeout(config.exec_timeout())
            .with_logger(loggers.create_netconf_logger());

        Self {
            suite: Arc::new(suite),
            sessions,
            executor: Arc::new(executor),
            logger: loggers.create_run_logger(),
            run_id: loggers.run_id().to_string(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Run every virtual client to completion
    ///
    /// Cached sessions are closed once all clients are done, then `sink` is
    /// dropped so the consumer sees the end of the stream. A client task
    /// that panicked fails the run, after the cleanup has happened.
    pub async fn run(&self, sink: mpsc::UnboundedSender<NetconfResult>) -> Result<RunSummary> {
        let started = Instant::now();
        self.logger
            .log_run_start(&self.run_id, self.suite.clients, self.suite.iterations, self.suite.rampup)
            .await;

        let handles: Vec<_> = (0..self.suite.clients)
            .map(|id| {
                let client = VirtualClient::new(
                    id,
                    self.suite.clone(),
                    self.executor.clone(),
                    sink.clone(),
                    started,
                )
                .with_logger(self.logger.clone());
                tokio::spawn(client.run())
            })
            .collect();

        let mut clients_completed = 0;
        let mut results = 0;
        let mut failure = None;
        for outcome in join_all(handles).await {
            match outcome {
                Ok(produced) => {
                    clients_completed += 1;
                    results += produced;
                }
                Err(e) => {
                    let message = format!("virtual client task failed: {}", e);
                    self.logger.log_client_failure(&message).await;
                    failure.get_or_insert(AppError::internal(message));
                }
            }
        }

        let sessions_closed = self.close_all_sessions().await;
        drop(sink);

        let elapsed = started.elapsed();
        self.logger
            .log_run_complete(&self.run_id, elapsed, sessions_closed)
            .await;

        if let Some(err) = failure {
            return Err(err);
        }

        Ok(RunSummary {
            run_id: self.run_id.clone(),
            elapsed,
            clients_completed,
            results,
            sessions_closed,
        })
    }

    /// Close every session still cached; safe to call more than once
    pub async fn close_all_sessions(&self) -> usize {
        self.sessions.close_all().await
    }
}
