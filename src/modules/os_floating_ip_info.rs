use crate::config::ConfigManager;
use crate::modules::{Module, ModuleResult};
use crate::openstack::{NetworkClient, OpenStackCli};
use crate::process::CommandRunner;
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

pub const SCHEMA: &str = r#"
{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "title": "OpenStack Floating IP Info Module",
    "type": "object",
    "properties": {
        "floating_ip": {
            "type": "string",
            "description": "The id of the floating IP to return information about."
        },
        "cloud": {
            "type": "string",
            "description": "Named cloud from clouds.yaml to operate against."
        }
    },
    "additionalProperties": false,
    "required": ["floating_ip"]
}
"#;

#[derive(Debug, Deserialize)]
struct FloatingIpInfoArgs {
    floating_ip: String,
    cloud: Option<String>,
}

pub struct OsFloatingIpInfoModule {
    runner: Box<dyn CommandRunner>,
}

impl OsFloatingIpInfoModule {
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        OsFloatingIpInfoModule { runner }
    }

    /// Looks up the floating IP; a client failure becomes a failed result
    /// carrying the full error chain.
    pub fn lookup(client: &dyn NetworkClient, floating_ip: &str) -> ModuleResult {
        match client.get_ip(floating_ip) {
            Ok(fip) => ModuleResult::exit().with("floating_ip", fip),
            Err(e) => {
                let msg = e.to_string();
                let exception = format!("{:?}", anyhow::Error::from(e));
                ModuleResult::fail(msg).with("exception", exception)
            }
        }
    }
}

impl Module for OsFloatingIpInfoModule {
    fn name(&self) -> &'static str {
        "os_floating_ip_info"
    }

    fn schema(&self) -> &'static str {
        SCHEMA
    }

    fn run(&self, inputs: Value) -> Result<ModuleResult> {
        let args: FloatingIpInfoArgs = serde_json::from_value(inputs)?;
        let client = OpenStackCli::new(
            PathBuf::from(ConfigManager::instance().openstack_binary()),
            args.cloud,
            self.runner.as_ref(),
        );

        Ok(Self::lookup(&client, &args.floating_ip))
    }
}
