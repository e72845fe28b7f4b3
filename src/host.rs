//! The seam between archdock and the operating system
//!
//! Every external program, lock probe, sleep and user lookup goes through the
//! [`Host`] trait. [`SystemHost`] talks to the real machine, [`DryRunHost`]
//! wraps any host and skips mutating commands, and the test suite scripts a
//! fake.
//!
//! # Execution Rule
//!
//! `SystemHost::run` is the only place that calls `Command::new`. It spawns
//! each child in its own process group and registers it with
//! [`ChildRegistry`] so an interrupted run cleans up after itself.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{ArchDockError, Result};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};

/// An external command, described before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Capture stdout/stderr instead of streaming them to the terminal
    pub capture: bool,
    /// Changes system state (skipped under dry-run)
    pub mutating: bool,
}

impl HostCommand {
    /// A mutating command whose output streams to the terminal
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            capture: false,
            mutating: true,
        }
    }

    /// A read-only command whose output is captured
    pub fn probe<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capture: true,
            mutating: false,
            ..Self::new(program, args)
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Stream output but treat the command as read-only
    pub fn read_only(mut self) -> Self {
        self.mutating = false;
        self
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a command that was started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Captured stdout; empty when the command streamed its output
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into `CommandFailed` for fail-fast call sites
    pub fn ensure_success(self, command: &HostCommand) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ArchDockError::command_failed(command.to_string(), self.exit_code))
        }
    }

    /// First non-empty line of stdout, trimmed
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

/// Operating-system collaborator.
///
/// `run` returns `Err` only when the command could not be started; a started
/// command that fails comes back as `Ok` with a non-zero `exit_code`.
pub trait Host {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput>;

    fn path_exists(&self, path: &Path) -> bool;

    /// Whether `binary` resolves on the search path
    fn has_binary(&self, binary: &str) -> bool;

    fn sleep(&self, duration: Duration);

    /// Name of the effective user
    fn current_user(&self) -> Result<String>;

    fn is_root(&self) -> bool;

    /// Mutating commands are only simulated
    fn is_dry_run(&self) -> bool {
        false
    }
}

impl<H: Host + ?Sized> Host for &H {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        (**self).run(command)
    }
    fn path_exists(&self, path: &Path) -> bool {
        (**self).path_exists(path)
    }
    fn has_binary(&self, binary: &str) -> bool {
        (**self).has_binary(binary)
    }
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
    fn current_user(&self) -> Result<String> {
        (**self).current_user()
    }
    fn is_root(&self) -> bool {
        (**self).is_root()
    }
    fn is_dry_run(&self) -> bool {
        (**self).is_dry_run()
    }
}

/// The real machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        tracing::debug!("exec: {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .in_new_process_group();
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }
        if command.capture {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let child = cmd.spawn().map_err(|source| ArchDockError::Spawn {
            command: command.to_string(),
            source,
        })?;
        let pid = child.id();
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }

        let waited = child.wait_with_output();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }
        let output = waited?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.is_success() {
            tracing::debug!(
                "`{}` exited with {:?}: {}",
                command,
                result.exit_code,
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn has_binary(&self, binary: &str) -> bool {
        binary_in_path(binary, std::env::var_os("PATH"))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn current_user(&self) -> Result<String> {
        let uid = nix::unistd::geteuid();
        match nix::unistd::User::from_uid(uid) {
            Ok(Some(user)) => Ok(user.name),
            Ok(None) => Err(ArchDockError::preflight(format!(
                "effective uid {} has no passwd entry",
                uid
            ))),
            Err(e) => Err(std::io::Error::from(e).into()),
        }
    }

    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }
}

/// Resolve `binary` against `search_path` in-process, so lookups do not depend
/// on a `which` executable being installed
fn binary_in_path(binary: &str, search_path: Option<OsString>) -> bool {
    let Ok(cwd) = std::env::current_dir() else {
        return false;
    };
    which::which_in(binary, search_path, cwd).is_ok()
}

/// Preview mode: read-only commands still execute so detection is realistic,
/// mutating ones are logged and reported as successful. Sleeps are skipped.
#[derive(Debug, Clone)]
pub struct DryRunHost<H> {
    inner: H,
}

impl<H: Host> DryRunHost<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: Host> Host for DryRunHost<H> {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        if command.mutating {
            tracing::info!("[dry-run] would run: {}", command);
            return Ok(CommandOutput::success(""));
        }
        self.inner.run(command)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.inner.path_exists(path)
    }

    fn has_binary(&self, binary: &str) -> bool {
        self.inner.has_binary(binary)
    }

    fn sleep(&self, duration: Duration) {
        tracing::debug!("[dry-run] skipping sleep of {:?}", duration);
    }

    fn current_user(&self) -> Result<String> {
        self.inner.current_user()
    }

    fn is_root(&self) -> bool {
        self.inner.is_root()
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
