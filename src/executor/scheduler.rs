//! Virtual client lifecycle
//!
//! `ramp-up delay -> init block (once) -> iteration blocks x iterations -> done`

use super::ActionExecutor;
use crate::error::AppError;
use crate::logging::RunLogger;
use crate::models::NetconfResult;
use crate::suite::{Action, Block, BlockType, TestSuite};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// One simulated NETCONF client
pub struct VirtualClient {
    id: usize,
    suite: Arc<TestSuite>,
    executor: Arc<ActionExecutor>,
    results: mpsc::UnboundedSender<NetconfResult>,
    suite_start: Instant,
    logger: Option<RunLogger>,
}

impl VirtualClient {
    pub fn new(
        id: usize,
        suite: Arc<TestSuite>,
        executor: Arc<ActionExecutor>,
        results: mpsc::UnboundedSender<NetconfResult>,
        suite_start: Instant,
    ) -> Self {
        Self {
            id,
            suite,
            executor,
            results,
            suite_start,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Start offset of client `id`: `rampup * id / clients` seconds
    pub fn rampup_delay(id: usize, clients: usize, rampup_seconds: u64) -> Duration {
        if clients == 0 {
            return Duration::ZERO;
        }
        let millis = rampup_seconds as u128 * 1000 * id as u128 / clients as u128;
        Duration::from_millis(millis as u64)
    }

    /// Run the whole client lifecycle, returning how many results it sent
    pub async fn run(self) -> usize {
        let delay = Self::rampup_delay(self.id, self.suite.clients, self.suite.rampup);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(logger) = &self.logger {
            logger.log_client_start(self.id, delay).await;
        }

        let mut produced = 0;
        if let Some(init) = self.suite.init_block() {
            produced += self.run_block(init).await;
        }
        for _ in 0..self.suite.iterations {
            for block in self.suite.iteration_blocks() {
                produced += self.run_block(block).await;
            }
        }

        if let Some(logger) = &self.logger {
            logger.log_client_done(self.id, produced).await;
        }
        produced
    }

    async fn run_block(&self, block: &Block) -> usize {
        match block.block_type {
            BlockType::Init | BlockType::Sequential => {
                let mut produced = 0;
                for action in &block.actions {
                    produced += self.run_action(action).await;
                }
                produced
            }
            BlockType::Concurrent => join_all(block.actions.iter().map(|action| self.run_action(action)))
                .await
                .into_iter()
                .sum(),
        }
    }

    async fn run_action(&self, action: &Action) -> usize {
        match action {
            Action::Sleep(sleep) => {
                tokio::time::sleep(Duration::from_secs(sleep.duration)).await;
                0
            }
            Action::Netconf(netconf) => {
                let result = match self.suite.config_for(&netconf.hostname) {
                    Some(config) => {
                        self.executor
                            .execute(self.suite_start, self.id, netconf, config)
                            .await
                    }
                    None => NetconfResult::new(self.id, &netconf.hostname, &netconf.operation)
                        .failed(AppError::unknown_host(netconf.hostname.as_str())),
                };
                // The receiver only goes away when the run is being torn down
                let _ = self.results.send(result);
                1
            }
        }
    }
}
