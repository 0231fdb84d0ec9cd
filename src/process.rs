use crate::error::{Error, Result};
use log::debug;
use shlex::Quoter;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

/// Captured result of an external command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.rc == 0
    }
}

pub trait CommandRunner: Send + Sync {
    /// Runs `argv` (program first) in `cwd` and captures its output.
    ///
    /// A non-zero exit status is not an error here; only failing to spawn is.
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<CommandOutput> {
        (**self).run(argv, cwd)
    }
}

/// Runs commands as local child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<CommandOutput> {
        let rendered = render_command(argv);
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::Precondition("Cannot run an empty command".to_string()));
        };

        debug!("Running '{rendered}'");
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().map_err(|source| Error::Spawn {
            cmd: rendered.clone(),
            source,
        })?;

        // Killed by a signal: no exit code.
        let rc = output.status.code().unwrap_or(-1);
        debug!("'{rendered}' exited with {rc}");

        Ok(CommandOutput {
            rc,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Renders `argv` as a single shell-quoted command line, for reporting.
pub fn render_command(argv: &[String]) -> String {
    Quoter::new()
        .allow_nul(true)
        .join(argv.iter().map(String::as_str))
        .unwrap_or_else(|_| argv.join(" "))
}

/// Turns a non-zero exit status into [`Error::CommandFailed`].
pub fn check_rc(argv: &[String], output: CommandOutput) -> Result<CommandOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(Error::CommandFailed {
            cmd: render_command(argv),
            output,
        })
    }
}

pub(crate) fn to_argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    parts
        .into_iter()
        .map(|part| part.as_ref().to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&[String]) -> CommandOutput + Send + Sync>;

    /// Records every command and answers from a closure instead of spawning.
    pub struct ScriptedRunner {
        responder: Responder,
        calls: Mutex<Vec<(Vec<String>, Option<PathBuf>)>>,
    }

    impl ScriptedRunner {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&[String]) -> CommandOutput + Send + Sync + 'static,
        {
            ScriptedRunner {
                responder: Box::new(responder),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(argv, _)| argv.clone())
                .collect()
        }

        pub fn cwds(&self) -> Vec<Option<PathBuf>> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, cwd)| cwd.clone())
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((argv.to_vec(), cwd.map(Path::to_path_buf)));
            Ok((self.responder)(argv))
        }
    }

    pub fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            rc: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(rc: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            rc,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}
