//! Wrapper around the `terraform` command line binary.
//!
//! Commands are built as argument vectors and run through a [`CommandRunner`]
//! in the project directory; nothing here talks to Terraform in-process.

use crate::error::{Error, Result};
use crate::process::{check_rc, render_command, to_argv, CommandOutput, CommandRunner};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKSPACE: &str = "default";

/// One entry of `terraform output -json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerraformOutput {
    #[serde(default)]
    pub sensitive: bool,
    /// Terraform type expression, e.g. `"string"` or `["list", "string"]`.
    #[serde(rename = "type", default)]
    pub value_type: Value,
    pub value: Value,
}

pub type TerraformOutputs = IndexMap<String, TerraformOutput>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceContext {
    pub current: String,
    /// Workspaces other than the current one.
    pub all: Vec<String>,
}

impl Default for WorkspaceContext {
    fn default() -> Self {
        WorkspaceContext {
            current: DEFAULT_WORKSPACE.to_string(),
            all: Vec::new(),
        }
    }
}

/// Options for `terraform init`.
#[derive(Clone, Debug, Default)]
pub struct InitOptions {
    pub backend_config: IndexMap<String, String>,
    pub backend_config_files: Vec<PathBuf>,
    pub plugin_paths: Vec<PathBuf>,
}

/// A finished `terraform output` invocation, successful or not.
#[derive(Clone, Debug)]
pub struct OutputRun {
    pub argv: Vec<String>,
    pub output: CommandOutput,
}

impl OutputRun {
    pub fn command(&self) -> String {
        render_command(&self.argv)
    }

    pub fn parse(&self) -> Result<TerraformOutputs> {
        parse_outputs(&self.command(), &self.output.stdout)
    }
}

pub struct Terraform<'a> {
    binary: PathBuf,
    project_path: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> Terraform<'a> {
    pub fn new(binary: PathBuf, project_path: PathBuf, runner: &'a dyn CommandRunner) -> Self {
        Terraform {
            binary,
            project_path,
            runner,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    fn command<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut argv = to_argv([&self.binary]);
        argv.extend(to_argv(args));
        argv
    }

    fn run(&self, argv: &[String]) -> Result<CommandOutput> {
        self.runner.run(argv, Some(self.project_path.as_path()))
    }

    pub fn init(&self, options: &InitOptions) -> Result<CommandOutput> {
        let mut argv = self.command(["init", "-input=false", "-reconfigure"]);

        for (key, value) in &options.backend_config {
            argv.push("-backend-config".to_string());
            argv.push(format!("{key}={value}"));
        }
        for file in &options.backend_config_files {
            argv.push("-backend-config".to_string());
            argv.push(file.to_string_lossy().into_owned());
        }
        for plugin_path in &options.plugin_paths {
            argv.push("-plugin-dir".to_string());
            argv.push(plugin_path.to_string_lossy().into_owned());
        }

        info!("Initialising Terraform project {}", self.project_path.display());
        let output = self.run(&argv)?;
        check_rc(&argv, output)
    }

    /// Lists workspaces. A failing listing is only logged; whatever could be
    /// parsed from stdout is still returned.
    pub fn workspace_context(&self) -> Result<WorkspaceContext> {
        let argv = self.command(["workspace", "list", "-no-color"]);
        let output = self.run(&argv)?;

        if !output.success() {
            warn!("Failed to list Terraform workspaces:\r\n{}", output.stderr);
        }

        Ok(parse_workspace_list(&output.stdout))
    }

    pub fn select_workspace(&self, workspace: &str) -> Result<CommandOutput> {
        let argv = self.command(["workspace", "select", workspace, "-no-color"]);
        info!("Selecting Terraform workspace '{workspace}'");
        let output = self.run(&argv)?;
        check_rc(&argv, output)
    }

    /// Runs `f` with `workspace` selected, then switches back to whichever
    /// workspace was current before.
    ///
    /// The original workspace is restored even when `f` fails; in that case a
    /// failure to restore is logged and `f`'s error is returned.
    pub fn with_workspace<T, F>(&self, workspace: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let context = self.workspace_context()?;
        let switched = context.current != workspace;

        if switched {
            if !context.all.iter().any(|w| w == workspace) {
                return Err(Error::WorkspaceMissing(workspace.to_string()));
            }
            self.select_workspace(workspace)?;
        } else {
            debug!("Terraform workspace '{workspace}' already selected");
        }

        let outcome = f(self);

        if switched {
            if let Err(e) = self.select_workspace(&context.current) {
                if outcome.is_ok() {
                    return Err(e);
                }
                error!(
                    "Failed to restore Terraform workspace '{}': {e}",
                    context.current
                );
            }
        }

        outcome
    }

    /// Runs `terraform output -json`. `state_file` is passed only if it exists;
    /// relative paths are resolved against the project directory.
    pub fn output(&self, state_file: Option<&Path>) -> Result<OutputRun> {
        let mut argv = self.command(["output", "-no-color", "-json"]);

        if let Some(state_file) = state_file {
            let state_file = self.project_path.join(state_file);
            if state_file.exists() {
                argv.push("-state".to_string());
                argv.push(state_file.to_string_lossy().into_owned());
            } else {
                debug!(
                    "State file {} does not exist, using the configured backend",
                    state_file.display()
                );
            }
        }

        let output = self.run(&argv)?;
        Ok(OutputRun { argv, output })
    }
}

/// Parses `terraform workspace list`. The line marked `* ` is the current
/// workspace; when none is marked the current workspace is `default`.
pub fn parse_workspace_list(stdout: &str) -> WorkspaceContext {
    let mut context = WorkspaceContext::default();

    for line in stdout.lines() {
        let item = line.trim();
        if item.is_empty() {
            continue;
        }
        if let Some(current) = item.strip_prefix("* ") {
            context.current = current.trim().to_string();
        } else {
            context.all.push(item.to_string());
        }
    }

    context
}

pub fn parse_outputs(cmd: &str, stdout: &str) -> Result<TerraformOutputs> {
    serde_json::from_str(stdout).map_err(|source| Error::Parse {
        cmd: cmd.to_string(),
        source,
    })
}

/// Picks the binary to run: an explicit path (relative to the project
/// directory unless absolute), otherwise `default_name` looked up on `PATH`.
pub fn resolve_binary(
    binary_path: Option<&Path>,
    project_path: &Path,
    default_name: &str,
) -> Result<PathBuf> {
    match binary_path {
        Some(path) if path.is_absolute() => Ok(path.to_path_buf()),
        Some(path) => Ok(project_path.join(path)),
        None => which::which(default_name).map_err(|_| {
            Error::Precondition(format!(
                "Failed to find required executable \"{default_name}\" in paths"
            ))
        }),
    }
}

/// Checks the project directory and binary before anything is executed.
pub fn preflight(binary: &Path, project_path: &Path) -> Result<()> {
    let project = project_path.to_string_lossy();
    if project.is_empty() || !project.contains('/') {
        return Err(Error::Precondition(
            "Path for Terraform project can not be None or ''.".to_string(),
        ));
    }
    if !binary.exists() {
        return Err(Error::Precondition(format!(
            "Path for Terraform binary '{}' doesn't exist on this host - check the path and try again please.",
            binary.display()
        )));
    }
    if !project_path.is_dir() {
        return Err(Error::Precondition(format!(
            "Path for Terraform project '{project}' doesn't exist on this host - check the path and try again please."
        )));
    }
    Ok(())
}
