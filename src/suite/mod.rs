//! Test suite description
//!
//! A suite is loaded once from a YAML document, validated, and is read-only
//! afterwards. Keys in the document are lowercase:
//!
//! ```yaml
//! iterations: 5
//! clients: 2
//! rampup: 0
//! configs:
//!   - hostname: 10.0.0.1
//!     port: 830
//!     username: admin
//!     password: admin
//!     reuseconnection: true
//! blocks:
//!   - type: sequential
//!     actions:
//!       - netconf:
//!           hostname: 10.0.0.1
//!           operation: get-config
//!       - sleep:
//!           duration: 1
//! ```

pub mod template;
pub mod validation;

pub use template::SuiteTemplate;
pub use validation::{SuiteValidator, ValidationLevel, ValidationWarning};

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection parameters for one NETCONF agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshConfig {
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Keep one session per (client, host) open for the whole run
    #[serde(rename = "reuseconnection", default)]
    pub reuse_connection: bool,
}

impl SshConfig {
    /// `host:port` as handed to the transport
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

fn default_port() -> u16 {
    crate::defaults::DEFAULT_NETCONF_PORT
}

/// Subtree or xpath selection for get/get-config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub filter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,
    /// Raw XML placed inside the filter's top element
    pub select: String,
}

/// One NETCONF operation against a configured host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetconfAction {
    pub hostname: String,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Raw XML for edit-config, starting with the top element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl NetconfAction {
    /// Minimal action with only a host and an operation
    pub fn new(hostname: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            operation: operation.into(),
            source: None,
            target: None,
            filter: None,
            config: None,
        }
    }
}

/// Pause the issuing client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepAction {
    /// Seconds
    pub duration: u64,
}

/// Exactly one step of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub enum Action {
    Netconf(NetconfAction),
    Sleep(SleepAction),
}

/// Document shape of an action: both payloads optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    netconf: Option<NetconfAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sleep: Option<SleepAction>,
}

impl TryFrom<RawAction> for Action {
    type Error = String;

    fn try_from(raw: RawAction) -> std::result::Result<Self, Self::Error> {
        match (raw.netconf, raw.sleep) {
            (Some(netconf), None) => Ok(Action::Netconf(netconf)),
            (None, Some(sleep)) => Ok(Action::Sleep(sleep)),
            (None, None) => Err("action must define either netconf or sleep".to_string()),
            (Some(_), Some(_)) => Err("action cannot define both netconf and sleep".to_string()),
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Netconf(netconf) => RawAction { netconf: Some(netconf), sleep: None },
            Action::Sleep(sleep) => RawAction { netconf: None, sleep: Some(sleep) },
        }
    }
}

/// Dispatch discipline of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    /// Run once per client before the first iteration
    Init,
    /// One action at a time, in declared order
    Sequential,
    /// All actions at once, joined before the block completes
    Concurrent,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Init => "init",
            BlockType::Sequential => "sequential",
            BlockType::Concurrent => "concurrent",
        }
    }
}

/// Ordered group of actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// Top level suite document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(skip)]
    pub file: Option<PathBuf>,
    pub iterations: usize,
    pub clients: usize,
    /// Seconds over which client starts are spread
    #[serde(default)]
    pub rampup: u64,
    pub configs: Vec<SshConfig>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl TestSuite {
    /// Load and validate a suite from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::io(format!("Failed to read suite file {}: {}", path.display(), e))
        })?;
        let mut suite = Self::from_yaml_str(&content)?;
        suite.file = Some(path.to_path_buf());
        Ok(suite)
    }

    /// Parse and validate a suite from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let suite: TestSuite = serde_yaml::from_str(content)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Load-time validation; any error is fatal for the run
    pub fn validate(&self) -> Result<()> {
        SuiteValidator::validate(self)
    }

    /// Non-fatal observations about an already valid suite
    pub fn warnings(&self) -> Vec<ValidationWarning> {
        SuiteValidator::warnings(self)
    }

    /// Connection parameters for a hostname
    pub fn config_for(&self, hostname: &str) -> Option<&SshConfig> {
        self.configs.iter().find(|config| config.hostname == hostname)
    }

    /// Whether sessions to a host are kept open across actions
    pub fn is_reuse_connection(&self, hostname: &str) -> bool {
        self.config_for(hostname)
            .map(|config| config.reuse_connection)
            .unwrap_or(false)
    }

    /// The one-shot block, if declared
    pub fn init_block(&self) -> Option<&Block> {
        self.blocks.iter().find(|block| block.block_type == BlockType::Init)
    }

    /// Blocks repeated every iteration, in declaration order
    pub fn iteration_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|block| block.block_type != BlockType::Init)
    }

    /// Every NETCONF action in the suite
    pub fn netconf_actions(&self) -> impl Iterator<Item = &NetconfAction> {
        self.blocks.iter().flat_map(|block| block.actions.iter()).filter_map(|action| match action {
            Action::Netconf(netconf) => Some(netconf),
            Action::Sleep(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"
iterations: 2
clients: 3
rampup: 3
configs:
  - hostname: r1
    port: 8300
    username: admin
    password: secret
    reuseconnection: true
  - hostname: r2
    username: admin
    password: secret
blocks:
  - type: sequential
    actions:
      - netconf:
          hostname: r1
          operation: get-config
          source: candidate
      - sleep:
          duration: 1
  - type: init
    actions:
      - netconf:
          hostname: r2
          operation: edit-config
          config: <top><a>1</a></top>
  - type: concurrent
    actions:
      - netconf:
          hostname: r1
          operation: get
          filter:
            type: subtree
            ns: urn:example
            select: <interfaces/>
"#;

    #[test]
    fn test_parse_suite() {
        let suite = TestSuite::from_yaml_str(SUITE).unwrap();
        assert_eq!(suite.iterations, 2);
        assert_eq!(suite.clients, 3);
        assert_eq!(suite.rampup, 3);
        assert_eq!(suite.configs.len(), 2);
        assert_eq!(suite.configs[0].address(), "r1:8300");
        assert_eq!(suite.configs[1].port, 830);
        assert!(!suite.configs[1].reuse_connection);
    }

    #[test]
    fn test_init_block_is_hoisted() {
        let suite = TestSuite::from_yaml_str(SUITE).unwrap();
        let init = suite.init_block().unwrap();
        assert_eq!(init.actions.len(), 1);

        let types: Vec<BlockType> = suite.iteration_blocks().map(|b| b.block_type).collect();
        assert_eq!(types, vec![BlockType::Sequential, BlockType::Concurrent]);
    }

    #[test]
    fn test_lookups() {
        let suite = TestSuite::from_yaml_str(SUITE).unwrap();
        assert!(suite.config_for("r1").is_some());
        assert!(suite.config_for("r9").is_none());
        assert!(suite.is_reuse_connection("r1"));
        assert!(!suite.is_reuse_connection("r2"));
        assert!(!suite.is_reuse_connection("r9"));
        assert_eq!(suite.netconf_actions().count(), 3);
    }

    #[test]
    fn test_optional_fields() {
        let suite = TestSuite::from_yaml_str(SUITE).unwrap();
        let actions: Vec<&NetconfAction> = suite.netconf_actions().collect();
        assert_eq!(actions[0].source.as_deref(), Some("candidate"));
        assert!(actions[0].filter.is_none());

        let filter = actions[2].filter.as_ref().unwrap();
        assert_eq!(filter.filter_type, "subtree");
        assert_eq!(filter.ns.as_deref(), Some("urn:example"));
        assert_eq!(filter.select, "<interfaces/>");
    }

    #[test]
    fn test_action_requires_exactly_one_payload() {
        let both = r#"
iterations: 1
clients: 1
configs:
  - {hostname: r1, username: u, password: p}
blocks:
  - type: sequential
    actions:
      - netconf: {hostname: r1, operation: get}
        sleep: {duration: 1}
"#;
        assert!(matches!(TestSuite::from_yaml_str(both), Err(AppError::Parse(_))));

        let neither = r#"
iterations: 1
clients: 1
configs:
  - {hostname: r1, username: u, password: p}
blocks:
  - type: sequential
    actions:
      - {}
"#;
        assert!(matches!(TestSuite::from_yaml_str(neither), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_unknown_block_type_rejected() {
        let suite = r#"
iterations: 1
clients: 1
configs:
  - {hostname: r1, username: u, password: p}
blocks:
  - type: parallel
    actions: []
"#;
        assert!(matches!(TestSuite::from_yaml_str(suite), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_action_serializes_back_to_document_shape() {
        let action = Action::Sleep(SleepAction { duration: 2 });
        let yaml = serde_yaml::to_string(&action).unwrap();
        assert!(yaml.contains("sleep"));
        assert!(!yaml.contains("netconf"));
    }

    #[test]
    fn test_from_file_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.yml");
        std::fs::write(&path, SUITE).unwrap();

        let suite = TestSuite::from_file(&path).unwrap();
        assert_eq!(suite.file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_from_missing_file() {
        let result = TestSuite::from_file("/definitely/not/here.yml");
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
