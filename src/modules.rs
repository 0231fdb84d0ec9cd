pub mod os_floating_ip_info;
pub mod terraform_output;

use crate::process::{CommandRunner, SystemRunner};
use crate::schema::validate_input;
use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use log::{debug, error};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use os_floating_ip_info::OsFloatingIpInfoModule;
pub use terraform_output::TerraformOutputModule;

/// Result reported by a module run, serialised as a flat JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ModuleResult {
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ModuleResult {
    pub fn exit() -> Self {
        ModuleResult::default()
    }

    pub fn fail(msg: impl Into<String>) -> Self {
        ModuleResult {
            failed: true,
            msg: Some(msg.into()),
            ..ModuleResult::default()
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// A self-contained automation module driven by JSON arguments.
pub trait Module {
    fn name(&self) -> &'static str;

    /// JSON Schema the module arguments are validated against.
    fn schema(&self) -> &'static str;

    /// Logic to execute the module after validation.
    fn run(&self, inputs: Value) -> Result<ModuleResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    TerraformOutput,
    OsFloatingIpInfo,
}

impl FromStr for ModuleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "terraform_output" => Ok(ModuleType::TerraformOutput),
            "os_floating_ip_info" => Ok(ModuleType::OsFloatingIpInfo),
            _ => Err(anyhow!("Module {} not supported", s)),
        }
    }
}

impl ModuleType {
    /// Instantiates the module with a runner that spawns real processes.
    pub fn create(self) -> Box<dyn Module> {
        self.create_with_runner(Box::new(SystemRunner))
    }

    pub fn create_with_runner(self, runner: Box<dyn CommandRunner>) -> Box<dyn Module> {
        match self {
            ModuleType::TerraformOutput => Box::new(TerraformOutputModule::new(runner)),
            ModuleType::OsFloatingIpInfo => Box::new(OsFloatingIpInfoModule::new(runner)),
        }
    }
}

/// Parses and validates `inputs`, runs `module` and folds any error into a
/// failed result.
pub fn execute(module: &dyn Module, inputs: &str) -> ModuleResult {
    let outcome = serde_json::from_str::<Value>(inputs)
        .map_err(|e| anyhow!("Failed to parse inputs as JSON: {}", e))
        .and_then(|inputs| {
            validate_input(module.name(), module.schema(), &inputs)?;
            debug!("Running module {}", module.name());
            module.run(inputs)
        });

    match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("Module {} failed: {e:#}", module.name());
            ModuleResult::fail(format!("{e:#}"))
        }
    }
}

/// Expands a leading `~` to the current user's home directory.
pub(crate) fn expand_user(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialise module result")
}
