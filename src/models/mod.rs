//! Data models for nc-hammer

pub mod config;
pub mod result;

// Re-export main model types
pub use config::Config;
pub use result::NetconfResult;
