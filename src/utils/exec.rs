//! External command execution.
//!
//! A small builder API for running the external tools some processors shell
//! out to (`sass`, `optipng`, `jpegoptim`). Failures carry the command name
//! and its stderr.

use anyhow::{Context, Result, bail};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set the working directory.
    #[allow(dead_code)]
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Execute and return the captured output, failing on non-zero exit.
    pub fn run(self) -> Result<Output> {
        let name = self.program.to_string_lossy().into_owned();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("failed to execute `{name}`"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "command `{name}` failed with {}\n{}",
                output.status,
                stderr.trim()
            );
        }
        Ok(output)
    }
}

/// Probe whether a binary is runnable, the way the default pipeline decides
/// which external optimizers to register.
pub fn available(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args() {
        let cmd = Cmd::new("echo").arg("hello").args(["world", ""]);
        assert_eq!(cmd.program, OsString::from("echo"));
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn run_captures_stdout() {
        let output = Cmd::new("echo").arg("hi").run().unwrap();
        assert!(String::from_utf8_lossy(&output.stdout).contains("hi"));
    }

    #[test]
    fn run_reports_failure() {
        let err = Cmd::new("false").run().unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[test]
    fn probe_missing_binary() {
        assert!(!available("definitely-not-a-real-binary-3141", &["--version"]));
    }
}
