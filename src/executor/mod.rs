//! Execution engine
//!
//! - [`ActionExecutor`]: one NETCONF action in, one result out
//! - [`VirtualClient`]: ramp-up, init block, iteration loop and block dispatch
//! - [`Engine`]: spawns the clients, joins them and closes cached sessions

pub mod action;
pub mod engine;
pub mod scheduler;

pub use action::ActionExecutor;
pub use engine::{Engine, RunSummary};
pub use scheduler::VirtualClient;
