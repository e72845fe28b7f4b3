//! Scripted `Host` used by the integration tests
//!
//! Commands are matched by prefix against their rendered form
//! (`pacman -Syu --noconfirm`). The most recently added matching rule wins;
//! unmatched commands succeed with empty output.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use archdock::{ArchDockError, CommandOutput, Host, HostCommand, Result};

#[derive(Debug, Clone)]
enum Response {
    Exit { code: i32, stdout: String },
    SpawnError,
}

pub struct ScriptedHost {
    rules: Vec<(String, Response)>,
    binaries: HashSet<String>,
    locked_checks: Cell<u32>,
    user: String,
    root: bool,
    calls: RefCell<Vec<String>>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ScriptedHost {
    /// Running as root, no binaries on the path, lock free
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            binaries: HashSet::new(),
            locked_checks: Cell::new(0),
            user: "root".to_string(),
            root: true,
            calls: RefCell::new(Vec::new()),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn with_binary(mut self, name: &str) -> Self {
        self.binaries.insert(name.to_string());
        self
    }

    pub fn without_binary(mut self, name: &str) -> Self {
        self.binaries.remove(name);
        self
    }

    pub fn respond(mut self, prefix: &str, code: i32, stdout: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            Response::Exit {
                code,
                stdout: stdout.to_string(),
            },
        ));
        self
    }

    pub fn fail(self, prefix: &str, code: i32) -> Self {
        self.respond(prefix, code, "")
    }

    pub fn spawn_error(mut self, prefix: &str) -> Self {
        self.rules.push((prefix.to_string(), Response::SpawnError));
        self
    }

    /// Lock file reported present for the next `checks` probes
    pub fn locked_for(self, checks: u32) -> Self {
        self.locked_checks.set(checks);
        self
    }

    pub fn running_as(mut self, user: &str, root: bool) -> Self {
        self.user = user.to_string();
        self.root = root;
        self
    }

    /// Docker and both compose variants answer
    pub fn with_docker(self) -> Self {
        self.with_binary("docker")
            .respond("docker --version", 0, "Docker version 27.3.1, build ce12230")
            .respond("docker compose version", 0, "Docker Compose version v2.29.7")
            .respond("docker-compose version", 0, "docker-compose version 1.29.2")
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.starts_with(prefix))
    }

    pub fn sleeps(&self) -> usize {
        self.sleeps.borrow().len()
    }
}

impl Host for ScriptedHost {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        let rendered = command.to_string();
        self.calls.borrow_mut().push(rendered.clone());

        let response = self
            .rules
            .iter()
            .rev()
            .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone());

        match response {
            None => Ok(CommandOutput::success("")),
            Some(Response::Exit { code, stdout }) => Ok(CommandOutput {
                exit_code: Some(code),
                stdout,
                stderr: String::new(),
            }),
            Some(Response::SpawnError) => Err(ArchDockError::Spawn {
                command: rendered,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }

    fn path_exists(&self, _path: &Path) -> bool {
        let left = self.locked_checks.get();
        if left > 0 {
            self.locked_checks.set(left - 1);
            true
        } else {
            false
        }
    }

    fn has_binary(&self, binary: &str) -> bool {
        self.binaries.contains(binary)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }

    fn current_user(&self) -> Result<String> {
        Ok(self.user.clone())
    }

    fn is_root(&self) -> bool {
        self.root
    }
}
