//! Returns the outputs of an existing Terraform deployment.
//!
//! The backend is always (re)initialised first. If a workspace other than the
//! current one is requested it is selected for the duration of the call and
//! the original workspace is selected again afterwards.

use crate::config::ConfigManager;
use crate::modules::{expand_user, to_json, Module, ModuleResult};
use crate::process::CommandRunner;
use crate::terraform::{preflight, resolve_binary, InitOptions, Terraform};
use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

pub const SCHEMA: &str = r#"
{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "title": "Terraform Output Module",
    "type": "object",
    "properties": {
        "project_path": {
            "type": "string",
            "description": "The path to the root of the Terraform directory with the backend configuration."
        },
        "binary_path": {
            "type": "string",
            "description": "The path of a terraform binary to use, relative to the project path unless absolute."
        },
        "plugin_paths": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Paths containing Terraform plugin executable files."
        },
        "workspace": {
            "type": "string",
            "description": "The terraform workspace to work with."
        },
        "state_file": {
            "type": "string",
            "description": "The path to an existing Terraform state file to use."
        },
        "backend_config": {
            "type": "object",
            "description": "Key-values provided at init stage to the -backend-config parameter."
        },
        "backend_config_files": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Configuration files provided at init stage to the -backend-config parameter."
        }
    },
    "additionalProperties": false,
    "required": ["project_path"]
}
"#;

pub const FAILURE_MSG: &str = "Failure when getting Terraform outputs.";

#[derive(Debug, Deserialize)]
struct TerraformOutputArgs {
    project_path: PathBuf,
    binary_path: Option<PathBuf>,
    #[serde(default)]
    plugin_paths: Vec<PathBuf>,
    workspace: Option<String>,
    state_file: Option<PathBuf>,
    #[serde(default)]
    backend_config: IndexMap<String, Value>,
    #[serde(default)]
    backend_config_files: Vec<PathBuf>,
}

impl TerraformOutputArgs {
    fn init_options(&self) -> InitOptions {
        InitOptions {
            backend_config: self
                .backend_config
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect(),
            backend_config_files: self
                .backend_config_files
                .iter()
                .map(|p| expand_user(p))
                .collect(),
            plugin_paths: self.plugin_paths.iter().map(|p| expand_user(p)).collect(),
        }
    }
}

pub struct TerraformOutputModule {
    runner: Box<dyn CommandRunner>,
}

impl TerraformOutputModule {
    pub fn new(runner: Box<dyn CommandRunner>) -> Self {
        TerraformOutputModule { runner }
    }
}

impl Module for TerraformOutputModule {
    fn name(&self) -> &'static str {
        "terraform_output"
    }

    fn schema(&self) -> &'static str {
        SCHEMA
    }

    fn run(&self, inputs: Value) -> Result<ModuleResult> {
        let args: TerraformOutputArgs = serde_json::from_value(inputs)?;
        let config = ConfigManager::instance();

        let project_path = expand_user(&args.project_path);
        let workspace = args
            .workspace
            .clone()
            .unwrap_or_else(|| config.default_workspace());
        let binary = resolve_binary(
            args.binary_path.as_deref().map(expand_user).as_deref(),
            &project_path,
            &config.terraform_binary(),
        )?;
        preflight(&binary, &project_path)?;

        let terraform = Terraform::new(binary, project_path, self.runner.as_ref());
        terraform.init(&args.init_options())?;

        let state_file = args.state_file.as_deref().map(expand_user);
        let run = terraform.with_workspace(&workspace, |tf| tf.output(state_file.as_deref()))?;
        let command = run.command();

        if !run.output.success() {
            warn!("'{command}' exited with {}", run.output.rc);
            return Ok(ModuleResult::fail(FAILURE_MSG)
                .with("rc", run.output.rc)
                .with("stdout", run.output.stdout.as_str())
                .with("stdout_lines", lines(&run.output.stdout))
                .with("stderr", run.output.stderr.as_str())
                .with("stderr_lines", lines(&run.output.stderr))
                .with("cmd", command));
        }

        let outputs = run.parse()?;
        debug!("Read {} Terraform output(s)", outputs.len());

        Ok(ModuleResult::exit()
            .with("workspace", workspace)
            .with("outputs", to_json(&outputs)?)
            .with("stdout", run.output.stdout.as_str())
            .with("stderr", run.output.stderr.as_str())
            .with("command", command))
    }
}

fn lines(text: &str) -> Value {
    Value::Array(text.lines().map(|l| Value::String(l.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::execute;
    use crate::process::testing::{failed, ok, ScriptedRunner};
    use crate::process::CommandOutput;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    const OUTPUTS: &str = r#"{"bukkit_arn": {"sensitive": false, "type": "string", "value": "arn:aws:s3:::tf-test-bukkit"}}"#;

    fn project() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("terraform");
        std::fs::write(&binary, "").unwrap();
        (dir, binary)
    }

    fn module(
        respond: impl Fn(&[String]) -> CommandOutput + Send + Sync + 'static,
    ) -> (TerraformOutputModule, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new(respond));
        let module = TerraformOutputModule::new(Box::new(runner.clone()));
        (module, runner)
    }

    fn inputs(dir: &TempDir, binary: &PathBuf, extra: Value) -> String {
        let mut inputs = json!({
            "project_path": dir.path(),
            "binary_path": binary,
        });
        if let (Some(inputs), Value::Object(extra)) = (inputs.as_object_mut(), extra) {
            inputs.extend(extra);
        }
        inputs.to_string()
    }

    fn subcommand(argv: &[String]) -> String {
        argv[1..].join(" ")
    }

    #[test]
    fn test_reads_outputs() {
        let (dir, binary) = project();
        let (module, runner) = module(|argv| match argv[1].as_str() {
            "workspace" => ok("* default\n"),
            "output" => ok(OUTPUTS),
            _ => ok(""),
        });

        let result = execute(&module, &inputs(&dir, &binary, json!({})));

        assert!(!result.failed, "{:?}", result.msg);
        assert!(!result.changed);
        assert_eq!(result.get("workspace"), Some(&json!("default")));
        assert_eq!(
            result.get("outputs").unwrap()["bukkit_arn"]["value"],
            json!("arn:aws:s3:::tf-test-bukkit")
        );
        assert_eq!(
            result.get("command"),
            Some(&json!(format!("{} output -no-color -json", binary.display())))
        );

        let calls: Vec<String> = runner.calls().iter().map(|argv| subcommand(argv)).collect();
        assert_eq!(
            calls,
            [
                "init -input=false -reconfigure",
                "workspace list -no-color",
                "output -no-color -json",
            ]
        );
    }

    #[test]
    fn test_switches_and_restores_workspace() {
        let (dir, binary) = project();
        let (module, runner) = module(|argv| match (argv[1].as_str(), argv[2].as_str()) {
            ("workspace", "list") => ok("* default\n  staging\n"),
            ("output", _) => ok("{}"),
            _ => ok(""),
        });

        let result = execute(
            &module,
            &inputs(
                &dir,
                &binary,
                json!({
                    "workspace": "staging",
                    "backend_config": {"bucket": "state", "encrypt": true},
                    "plugin_paths": ["/opt/plugins"]
                }),
            ),
        );

        assert!(!result.failed, "{:?}", result.msg);
        assert_eq!(result.get("workspace"), Some(&json!("staging")));

        let calls: Vec<String> = runner.calls().iter().map(|argv| subcommand(argv)).collect();
        assert_eq!(
            calls,
            [
                "init -input=false -reconfigure -backend-config bucket=state -backend-config encrypt=true -plugin-dir /opt/plugins",
                "workspace list -no-color",
                "workspace select staging -no-color",
                "output -no-color -json",
                "workspace select default -no-color",
            ]
        );
    }

    #[test]
    fn test_missing_workspace() {
        let (dir, binary) = project();
        let (module, runner) = module(|argv| match argv[1].as_str() {
            "workspace" => ok("* default\n"),
            _ => ok(""),
        });

        let result = execute(&module, &inputs(&dir, &binary, json!({"workspace": "prod"})));

        assert!(result.failed);
        assert_eq!(result.msg.as_deref(), Some("Workspace 'prod' does not exist."));
        assert!(runner.calls().iter().all(|argv| argv[1] != "output"));
    }

    #[test]
    fn test_output_failure_is_reported() {
        let (dir, binary) = project();
        let (module, runner) = module(|argv| match (argv[1].as_str(), argv[2].as_str()) {
            ("workspace", "list") => ok("  default\n* dev\n"),
            ("output", _) => CommandOutput {
                rc: 1,
                stdout: "partial\n".to_string(),
                stderr: "Error: no state\nline two\n".to_string(),
            },
            _ => ok(""),
        });

        let result = execute(&module, &inputs(&dir, &binary, json!({})));

        assert!(result.failed);
        assert_eq!(result.msg.as_deref(), Some(FAILURE_MSG));
        assert_eq!(result.get("rc"), Some(&json!(1)));
        assert_eq!(result.get("stdout_lines"), Some(&json!(["partial"])));
        assert_eq!(
            result.get("stderr_lines"),
            Some(&json!(["Error: no state", "line two"]))
        );
        assert!(result.get("cmd").is_some());

        let last = runner.calls().pop().unwrap();
        assert_eq!(subcommand(&last), "workspace select dev -no-color");
    }

    #[test]
    fn test_init_failure() {
        let (dir, binary) = project();
        let (module, runner) = module(|_| failed(1, "Error: Failed to get existing workspaces"));

        let result = execute(&module, &inputs(&dir, &binary, json!({})));

        assert!(result.failed);
        assert!(result
            .msg
            .unwrap()
            .contains("Error: Failed to get existing workspaces"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_preflight_runs_before_any_command() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-terraform");
        let (module, runner) = module(|_| ok(""));

        let result = execute(&module, &inputs(&dir, &missing, json!({})));

        assert!(result.failed);
        assert!(result.msg.unwrap().contains("Path for Terraform binary"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_schema_rejects_unknown_arguments() {
        let (dir, binary) = project();
        let (module, runner) = module(|_| ok(""));

        let result = execute(&module, &inputs(&dir, &binary, json!({"force": true})));

        assert!(result.failed);
        assert!(runner.calls().is_empty());
    }
}
