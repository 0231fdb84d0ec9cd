use crate::error::{Error, Result};
use crate::process::{check_rc, render_command, to_argv, CommandRunner};
use log::info;
use serde_json::Value;
use std::path::PathBuf;

/// Network lookups against an OpenStack cloud.
pub trait NetworkClient {
    /// Returns the floating IP with the given id as reported by the cloud.
    fn get_ip(&self, floating_ip: &str) -> Result<Value>;
}

/// [`NetworkClient`] backed by the `openstack` command line client.
pub struct OpenStackCli<'a> {
    binary: PathBuf,
    cloud: Option<String>,
    runner: &'a dyn CommandRunner,
}

impl<'a> OpenStackCli<'a> {
    pub fn new(binary: PathBuf, cloud: Option<String>, runner: &'a dyn CommandRunner) -> Self {
        OpenStackCli {
            binary,
            cloud,
            runner,
        }
    }

    fn command(&self, args: &[&str]) -> Vec<String> {
        let mut argv = to_argv([&self.binary]);
        if let Some(cloud) = &self.cloud {
            argv.push("--os-cloud".to_string());
            argv.push(cloud.clone());
        }
        argv.extend(to_argv(args));
        argv
    }
}

impl NetworkClient for OpenStackCli<'_> {
    fn get_ip(&self, floating_ip: &str) -> Result<Value> {
        let argv = self.command(&["floating", "ip", "show", floating_ip, "-f", "json"]);
        info!("Looking up floating IP {floating_ip}");

        let output = check_rc(&argv, self.runner.run(&argv, None)?)?;
        serde_json::from_str(&output.stdout).map_err(|source| Error::Parse {
            cmd: render_command(&argv),
            source,
        })
    }
}
