//! Example suite written by `nc-hammer init`

use crate::error::{AppError, Result};
use std::path::Path;

pub struct SuiteTemplate;

impl SuiteTemplate {
    /// A commented suite exercising every block and action type
    pub fn example_yaml() -> &'static str {
        r#"# nc-hammer test suite
#
# iterations: how many times each client repeats the non-init blocks
# clients:    number of concurrent virtual clients
# rampup:     seconds over which client start times are spread
iterations: 5
clients: 2
rampup: 2

# One entry per NETCONF agent. Actions refer to these by hostname.
configs:
  - hostname: 192.168.1.1
    port: 830
    username: admin
    password: admin
    # keep one session per client open instead of dialing for every action
    reuseconnection: true

blocks:
  # runs once per client, before the first iteration
  - type: init
    actions:
      - netconf:
          hostname: 192.168.1.1
          operation: edit-config
          target: candidate
          config: <top xmlns="urn:example:config"><enabled>true</enabled></top>

  # actions run one after another
  - type: sequential
    actions:
      - netconf:
          hostname: 192.168.1.1
          operation: get-config
          source: running
          filter:
            type: subtree
            ns: urn:ietf:params:xml:ns:yang:ietf-interfaces
            select: <interfaces/>
      - sleep:
          duration: 1

  # actions start together; the block ends when all of them finish
  - type: concurrent
    actions:
      - netconf:
          hostname: 192.168.1.1
          operation: get
      - netconf:
          hostname: 192.168.1.1
          operation: get-config
"#
    }

    /// Write the example suite, refusing to replace an existing file
    pub fn write_to(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(AppError::io(format!("{} already exists, not overwriting", path.display())));
        }
        std::fs::write(path, Self::example_yaml())?;
        Ok(())
    }
}
