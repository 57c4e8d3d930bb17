//! Subprocess capability used by the auditors
//!
//! Audits only ever need "run this, give me stdout". Modelling that as a
//! trait keeps the parsing testable with canned output and keeps process
//! failures from escaping the audit boundary.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Subprocess timeout for audit commands
pub const COMMAND_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0} not found. Please install it first.")]
    NotFound(String),

    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),
}

/// Output of a finished command. A non-zero exit is not an error here:
/// `npm audit` and `npm outdated` both exit 1 when they have findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub exit_code: Option<i32>,
}

pub trait CommandRunner: Sync {
    fn run(&self, args: &[&str], cwd: &Path) -> Result<CommandOutput, CommandError>;
}

/// Runs real processes with a polling timeout.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(COMMAND_TIMEOUT_SECS),
        }
    }
}

impl SystemRunner {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, args: &[&str], cwd: &Path) -> Result<CommandOutput, CommandError> {
        let Some((program, rest)) = args.split_first() else {
            return Err(CommandError::Spawn {
                program: String::new(),
                message: "empty command".to_string(),
            });
        };

        debug!("Running {} {:?} in {}", program, rest, cwd.display());

        let mut child = Command::new(program)
            .args(rest)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CommandError::NotFound(program.to_string())
                } else {
                    CommandError::Spawn {
                        program: program.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        // Drain stdout on a thread so a chatty child can't fill the pipe
        // and stall while we poll for exit.
        let mut stdout_pipe = child.stdout.take();
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut buf);
            }
            buf
        });

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!("{} timed out after {}s", program, self.timeout.as_secs());
                        return Err(CommandError::Timeout(
                            program.to_string(),
                            self.timeout.as_secs(),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    return Err(CommandError::Spawn {
                        program: program.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        };

        let stdout = reader.join().unwrap_or_default();
        Ok(CommandOutput {
            stdout,
            exit_code: status.code(),
        })
    }
}

/// Run and hand back stdout, or `None` on any failure.
///
/// This is where command errors stop: they are logged and become "no data".
pub fn run_for_stdout(runner: &dyn CommandRunner, args: &[&str], cwd: &Path) -> Option<String> {
    match runner.run(args, cwd) {
        Ok(output) if !output.stdout.trim().is_empty() => Some(output.stdout),
        Ok(_) => {
            debug!("{} produced no output", args.join(" "));
            None
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Check whether a tool answers `--version`.
pub fn is_tool_installed(runner: &dyn CommandRunner, tool: &str) -> bool {
    runner
        .run(&[tool, "--version"], Path::new("."))
        .map(|o| o.exit_code == Some(0))
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Answers commands from a table keyed by `"<cwd-file-name>|<args>"`,
    /// or by `"<args>"` when no cwd-specific entry exists.
    #[derive(Default)]
    pub(crate) struct ScriptedRunner {
        pub responses: HashMap<String, Result<String, ()>>,
        pub calls: Mutex<Vec<(String, PathBuf)>>,
    }

    impl ScriptedRunner {
        pub(crate) fn respond(mut self, key: &str, stdout: &str) -> Self {
            self.responses.insert(key.to_string(), Ok(stdout.to_string()));
            self
        }

        pub(crate) fn fail(mut self, key: &str) -> Self {
            self.responses.insert(key.to_string(), Err(()));
            self
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, args: &[&str], cwd: &Path) -> Result<CommandOutput, CommandError> {
            let joined = args.join(" ");
            self.calls
                .lock()
                .unwrap()
                .push((joined.clone(), cwd.to_path_buf()));
            let dir = cwd
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let scoped = format!("{}|{}", dir, joined);
            match self.responses.get(&scoped).or_else(|| self.responses.get(&joined)) {
                Some(Ok(stdout)) => Ok(CommandOutput {
                    stdout: stdout.clone(),
                    exit_code: Some(0),
                }),
                Some(Err(())) => Err(CommandError::Spawn {
                    program: args[0].to_string(),
                    message: "scripted failure".to_string(),
                }),
                None => Err(CommandError::NotFound(args[0].to_string())),
            }
        }
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let runner = SystemRunner::default();
        let err = runner
            .run(&["definitely-not-a-real-binary-xyz"], Path::new("."))
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }

    #[test]
    fn test_empty_command_is_error() {
        let runner = SystemRunner::default();
        assert!(runner.run(&[], Path::new(".")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let runner = SystemRunner::default();
        let out = runner
            .run(&["sh", "-c", "echo hello; exit 3"], Path::new("."))
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let runner = SystemRunner::with_timeout(Duration::from_millis(200));
        let err = runner.run(&["sleep", "5"], Path::new(".")).unwrap_err();
        assert!(matches!(err, CommandError::Timeout(_, _)));
    }

    #[test]
    fn test_run_for_stdout_swallows_failures() {
        let runner = ScriptedRunner::default().fail("npm audit --json");
        assert!(run_for_stdout(&runner, &["npm", "audit", "--json"], Path::new(".")).is_none());
        assert!(run_for_stdout(&runner, &["unknown"], Path::new(".")).is_none());
    }
}
