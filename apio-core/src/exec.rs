use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::err::Error;

/// Search path entries and variables applied to a spawned tool only.
/// The calling process' own environment is never modified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    pub path_prefix: Vec<PathBuf>,
    pub vars: Vec<(String, OsString)>,
    pub current_dir: Option<PathBuf>,
}

impl Environment {
    #[must_use]
    pub fn with_var(mut self, key: &str, value: impl Into<OsString>) -> Self {
        self.vars.push((key.to_string(), value.into()));
        self
    }

    /// `PATH` with the prefix entries ahead of `inherited`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an entry contains the platform path separator.
    pub fn search_path(&self, inherited: Option<&OsStr>) -> Result<OsString, Error> {
        let rest = inherited.map(env::split_paths).into_iter().flatten();
        env::join_paths(self.path_prefix.iter().cloned().chain(rest))
            .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, err)))
    }

    /// # Errors
    ///
    /// Will return `Err` if the search path cannot be built.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Result<Command, Error> {
        let mut cmd = Command::new(program);
        if !self.path_prefix.is_empty() {
            cmd.env("PATH", self.search_path(env::var_os("PATH").as_deref())?);
        }
        for (key, value) in &self.vars {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Plain,
    UpToDate,
    Warning,
    Error,
}

impl LineKind {
    #[must_use]
    pub fn of_stdout(line: &str) -> Self {
        if line.contains("is up to date") {
            Self::UpToDate
        } else {
            Self::Plain
        }
    }

    #[must_use]
    pub fn of_stderr(line: &str) -> Self {
        if line.to_lowercase().contains("error") {
            Self::Error
        } else {
            Self::Warning
        }
    }
}

/// Printed before build, upload and time runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub timestamp: String,
    pub board: String,
    pub rule: String,
}

/// Final `=== [SUCCESS] Took N seconds ===` line, split so the status can be highlighted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub success: bool,
    pub half_rule: String,
    pub text: String,
}

impl Summary {
    #[must_use]
    pub fn new(success: bool, duration: Duration, width: usize) -> Self {
        let text = format!(" Took {:.2} seconds ", duration.as_secs_f64());
        let half = width.saturating_sub(text.len() + 10) / 2;
        Self {
            success,
            half_rule: "=".repeat(half),
            text,
        }
    }

    #[must_use]
    pub fn status(&self) -> &'static str {
        if self.success {
            "SUCCESS"
        } else {
            " ERROR "
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}]{}{}",
            self.half_rule,
            self.status(),
            self.text,
            self.half_rule
        )
    }
}

/// Receives everything a run wants shown to the user.
pub trait OutputSink {
    fn stdout_line(&mut self, line: &str);
    fn stderr_line(&mut self, line: &str);
    fn header(&mut self, header: &Header);
    fn summary(&mut self, summary: &Summary);
}

pub trait Executor {
    /// Runs `program` to completion, relaying its output to `sink` line by line.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the process cannot be started.
    fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &Environment,
        sink: &mut dyn OutputSink,
    ) -> Result<i32, Error>;
}

enum Line {
    Out(String),
    Err(String),
}

/// Relays `pipe` line by line until end of stream. Bytes that are not UTF-8
/// are replaced rather than ending the relay.
fn forward<R: Read>(pipe: R, tx: &mpsc::Sender<Line>, wrap: fn(String) -> Line) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(%err, "pipe read failed");
                break;
            }
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send(wrap(line)).is_err() {
            break;
        }
    }
}

/// Spawns real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &Environment,
        sink: &mut dyn OutputSink,
    ) -> Result<i32, Error> {
        debug!(?program, ?args, "spawning");
        let mut child = env
            .command(program)?
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes drain concurrently so a full buffer can't stall the child.
        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            if let Some(pipe) = stdout {
                let tx = tx.clone();
                scope.spawn(move || forward(pipe, &tx, Line::Out));
            }
            if let Some(pipe) = stderr {
                let tx = tx.clone();
                scope.spawn(move || forward(pipe, &tx, Line::Err));
            }
            drop(tx);
            for line in rx {
                match line {
                    Line::Out(line) => sink.stdout_line(&line),
                    Line::Err(line) => sink.stderr_line(&line),
                }
            }
        });

        let status = child.wait()?;
        debug!(?status, "exited");
        Ok(status.code().unwrap_or(1))
    }
}
