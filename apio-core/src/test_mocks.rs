#![cfg(test)]
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::err::Error;
use crate::exec::{Environment, Executor, Header, OutputSink, Summary};

#[derive(Default)]
pub(crate) struct CollectSink {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub headers: Vec<Header>,
    pub summaries: Vec<Summary>,
}

impl OutputSink for CollectSink {
    fn stdout_line(&mut self, line: &str) {
        self.stdout.push(line.to_string());
    }

    fn stderr_line(&mut self, line: &str) {
        self.stderr.push(line.to_string());
    }

    fn header(&mut self, header: &Header) {
        self.headers.push(header.clone());
    }

    fn summary(&mut self, summary: &Summary) {
        self.summaries.push(summary.clone());
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Call {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Environment,
}

/// Replays canned output instead of spawning anything.
#[derive(Default)]
pub(crate) struct MockExecutor {
    stdout: Vec<String>,
    stderr: Vec<String>,
    code: i32,
    calls: RefCell<Vec<Call>>,
}

impl MockExecutor {
    pub(crate) fn new(stdout: &str, code: i32) -> Self {
        Self {
            stdout: stdout.lines().map(String::from).collect(),
            code,
            ..Self::default()
        }
    }

    pub(crate) fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = stderr.lines().map(String::from).collect();
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Executor for MockExecutor {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &Environment,
        sink: &mut dyn OutputSink,
    ) -> Result<i32, Error> {
        self.calls.borrow_mut().push(Call {
            program: program.to_path_buf(),
            args: args.to_vec(),
            env: env.clone(),
        });
        for line in &self.stdout {
            sink.stdout_line(line);
        }
        for line in &self.stderr {
            sink.stderr_line(line);
        }
        Ok(self.code)
    }
}
