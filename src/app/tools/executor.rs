//! Generic execution of external tools
//!
//! Every invocation is awaited to completion and produces a fresh
//! [`ToolInvocation`] carrying the captured output. A non-zero exit becomes
//! `ToolError::Execution` with the same diagnostics attached. There is no
//! timeout: the converters legitimately run for a long time on national
//! extracts.

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{info, warn};

use super::platform::OperatingSystem;
use super::resolver::{BinaryDescriptor, BinaryResolver, ToolSpec};
use crate::errors::{ToolError, ToolResult};

/// Record of one completed tool run
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub binary_path: PathBuf,
    pub arguments: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time; informational only
    pub duration: Duration,
    /// `None` when the process was ended by a signal
    pub exit_status: Option<i32>,
}

impl ToolInvocation {
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }

    pub fn command_line(&self) -> String {
        command_line(&self.binary_path, &self.arguments)
    }
}

/// A file-producing tool run: the invocation plus the path it was told to write
///
/// Whether the file was actually written is for the consumer to check.
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub invocation: ToolInvocation,
    pub output: PathBuf,
}

/// Launches binaries as subprocesses and captures their output
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    operating_system: OperatingSystem,
}

impl CommandExecutor {
    pub fn new(operating_system: OperatingSystem) -> Self {
        Self { operating_system }
    }

    /// Path handed to the OS for `binary`
    ///
    /// On Linux a bare relative path gets a `./` prefix, as bundled tools
    /// are not on the search path.
    pub fn program_path(&self, binary: &Path) -> PathBuf {
        let already_anchored = matches!(
            binary.components().next(),
            Some(Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_))
        );

        if self.operating_system.is_linux_family() && !already_anchored {
            Path::new(".").join(binary)
        } else {
            binary.to_path_buf()
        }
    }

    /// Runs `binary` with `arguments` and waits for it to exit
    ///
    /// # Errors
    ///
    /// Returns `ToolError::Spawn` if the process cannot be launched and
    /// `ToolError::Execution` if it exits unsuccessfully.
    pub async fn run(&self, binary: &Path, arguments: &[String]) -> ToolResult<ToolInvocation> {
        let program = self.program_path(binary);
        let command = command_line(&program, arguments);
        info!("Running: {}", command);

        let started = Instant::now();
        let output = Command::new(&program)
            .args(arguments)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                command: command.clone(),
                source,
            })?;
        let duration = started.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        info!("Finished in {:.2}s: {}", duration.as_secs_f64(), command);
        if !stderr.trim().is_empty() {
            warn!("stderr from {}: {}", program.display(), stderr.trim());
        }

        if !output.status.success() {
            return Err(ToolError::Execution {
                command,
                exit_code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(ToolInvocation {
            binary_path: program,
            arguments: arguments.to_vec(),
            stdout,
            stderr,
            duration,
            exit_status: output.status.code(),
        })
    }
}

/// A resolved binary paired with the executor that runs it
#[derive(Debug, Clone)]
pub struct ExternalTool {
    spec: ToolSpec,
    binary: BinaryDescriptor,
    executor: CommandExecutor,
}

impl ExternalTool {
    /// Resolves `spec` once; the choice is kept for the tool's lifetime
    pub fn resolve(resolver: &BinaryResolver, spec: ToolSpec) -> ToolResult<Self> {
        let binary = resolver.resolve(&spec)?;
        let executor = CommandExecutor::new(binary.operating_system.clone());
        Ok(Self {
            spec,
            binary,
            executor,
        })
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn binary(&self) -> &BinaryDescriptor {
        &self.binary
    }

    pub async fn run(&self, arguments: &[String]) -> ToolResult<ToolInvocation> {
        self.executor.run(&self.binary.path, arguments).await
    }
}

fn command_line(program: &Path, arguments: &[String]) -> String {
    std::iter::once(program.display().to_string())
        .chain(arguments.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_prefixes_bare_relative_paths() {
        let executor = CommandExecutor::new(OperatingSystem::Linux);
        assert_eq!(
            executor.program_path(Path::new("modules/osmtools/bin/Linux/osmconvert/64bits/osmconvert64")),
            PathBuf::from("./modules/osmtools/bin/Linux/osmconvert/64bits/osmconvert64")
        );
        assert_eq!(
            executor.program_path(Path::new("/opt/tools/osmconvert")),
            PathBuf::from("/opt/tools/osmconvert")
        );
        assert_eq!(
            executor.program_path(Path::new("./osmconvert")),
            PathBuf::from("./osmconvert")
        );
    }

    #[test]
    fn test_windows_paths_untouched() {
        let executor = CommandExecutor::new(OperatingSystem::Windows);
        assert_eq!(
            executor.program_path(Path::new("modules/osmtools/osmconvert.exe")),
            PathBuf::from("modules/osmtools/osmconvert.exe")
        );
    }

    #[test]
    fn test_command_line_rendering() {
        let line = command_line(
            Path::new("./osmfilter"),
            &["in.o5m".to_string(), "--keep=highway=".to_string()],
        );
        assert_eq!(line, "./osmfilter in.o5m --keep=highway=");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_output() {
        let executor = CommandExecutor::new(OperatingSystem::Linux);
        let invocation = executor
            .run(Path::new("/bin/sh"), &["-c".to_string(), "echo converted".to_string()])
            .await
            .unwrap();

        assert_eq!(invocation.stdout.trim(), "converted");
        assert_eq!(invocation.exit_status, Some(0));
        assert_eq!(invocation.arguments.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_execution_error() {
        let executor = CommandExecutor::new(OperatingSystem::Linux);
        let result = executor
            .run(
                Path::new("/bin/sh"),
                &["-c".to_string(), "echo broken input >&2; exit 3".to_string()],
            )
            .await;

        match result {
            Err(ToolError::Execution {
                exit_code, stderr, ..
            }) => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.contains("broken input"));
            }
            other => panic!("Expected Execution error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let executor = CommandExecutor::new(OperatingSystem::Windows);
        let result = executor
            .run(Path::new("/nonexistent/osmconvert"), &[])
            .await;
        assert!(matches!(result, Err(ToolError::Spawn { .. })));
    }
}
