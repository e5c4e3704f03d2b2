//! nc-hammer
//!
//! A load-testing harness for NETCONF management servers reached over SSH.
//! A declarative test suite describes how many virtual clients to simulate,
//! how many iterations each runs, how their start is staggered, and the
//! blocks of NETCONF operations (and pauses) they execute. Every operation
//! produces one timing record on a shared result stream.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod netconf;
pub mod output;
pub mod session;
pub mod stats;
pub mod suite;
pub mod transport;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::{ActionExecutor, Engine, RunSummary, VirtualClient};
pub use models::{Config, NetconfResult};
pub use session::{Lease, SessionManager};
pub use suite::{Action, Block, BlockType, NetconfAction, SshConfig, TestSuite};
pub use transport::{NetconfSession, Transport};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_NETCONF_PORT: u16 = 830;
    pub const DEFAULT_DATASTORE: &str = "running";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    pub const DEFAULT_PROGRESS: bool = true;
    pub const RESULTS_FILE_NAME: &str = "results.jsonl";
    pub const SUITE_COPY_FILE_NAME: &str = "suite.yml";
}
