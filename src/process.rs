//! External tool invocation.
//!
//! Every build step that leaves this process (podman, tar, rpmbuild, copr,
//! mock) goes through [`Cmd`]. Output streams straight to the terminal so
//! long pulls and builds show progress; the command line is echoed first so
//! a failing step can be re-run by hand. Non-zero exits map to
//! [`Error::Tool`] with the tool's exit code and are always fatal.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Builder for one external tool invocation.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    sudo: bool,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            sudo: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(arg.into());
        }
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Run from `dir` instead of the current directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Run under sudo. Pulling images and archiving them needs root to
    /// capture every uid/gid/permission combination.
    pub fn sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    /// Run with inherited stdio, failing on non-zero exit.
    pub fn run(self) -> Result<()> {
        println!("> {}", self.render());

        let (program, args) = if self.sudo {
            let mut all = vec![self.program.clone()];
            all.extend(self.args.iter().cloned());
            ("sudo".to_string(), all)
        } else {
            (self.program.clone(), self.args.clone())
        };

        let mut command = Command::new(&program);
        command.args(&args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|e| Error::ToolMissing {
            tool: program.clone(),
            source: e,
        })?;

        if !status.success() {
            return Err(Error::Tool {
                tool: self.program,
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    fn render(&self) -> String {
        let mut parts = Vec::new();
        if self.sudo {
            parts.push("sudo".to_string());
        }
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}
