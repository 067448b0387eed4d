use tracing::debug;

use crate::catalog::Catalog;
use crate::err::Error;
use crate::exec::{Executor, OutputSink};
use crate::project::Project;
use crate::resolve::{FpgaArgs, Resolution, Resolver, Rule};
use crate::runner::{Runner, RunnerConfig, Target};
use crate::scanner::System;
use crate::upload::select_device;

/// One entry point per CLI build command. Every method returns the build tool's exit code.
pub struct SCons<'a, E: Executor> {
    catalog: &'a Catalog,
    runner: Runner<'a, E>,
    system: System<'a, E>,
}

impl<'a, E: Executor> SCons<'a, E> {
    pub fn new(catalog: &'a Catalog, config: RunnerConfig, exec: &'a E) -> Self {
        let system = System::new(&config.home, exec);
        Self {
            catalog,
            runner: Runner::new(config, exec),
            system,
        }
    }

    /// The project file is parsed only when no flag identifies the FPGA.
    fn resolve(&self, args: &FpgaArgs) -> Result<Resolution, Error> {
        let workdir = &self.runner.config().workdir;
        let rule = Rule::select(args);
        let project = if rule.reads_project() {
            Project::read(workdir)?
        } else {
            if Project::exists(workdir) {
                rule.note_ignored_project();
            }
            None
        };
        Resolver::new(self.catalog).resolve(args, project.as_ref())
    }

    fn run(
        &self,
        target: Target,
        variables: Vec<String>,
        board: Option<&str>,
        sink: &mut dyn OutputSink,
    ) -> Result<i32, Error> {
        Ok(self.runner.run(target, variables, board, sink)?.exit_code)
    }

    /// # Errors
    ///
    /// Will return `Err` if the build tool cannot be started.
    pub fn clean(&self, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        self.run(Target::Clean, vec![], None, sink)
    }

    /// # Errors
    ///
    /// Will return `Err` if the build tool cannot be started.
    pub fn verify(&self, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        self.run(Target::Verify, vec![], None, sink)
    }

    /// # Errors
    ///
    /// Will return `Err` if the build tool cannot be started.
    pub fn sim(&self, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        self.run(Target::Sim, vec![], None, sink)
    }

    /// # Errors
    ///
    /// Will return `Err` if the FPGA cannot be resolved or the build tool cannot be started.
    pub fn build(&self, args: &FpgaArgs, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        let res = self.resolve(args)?;
        self.run(Target::Build, res.variables(), res.board.as_deref(), sink)
    }

    /// # Errors
    ///
    /// Will return `Err` if the FPGA cannot be resolved or the build tool cannot be started.
    pub fn time(&self, args: &FpgaArgs, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        let res = self.resolve(args)?;
        self.run(Target::Time, res.variables(), res.board.as_deref(), sink)
    }

    /// # Errors
    ///
    /// Will return `Err` if the FPGA cannot be resolved, no matching device is
    /// attached, or the build tool cannot be started.
    pub fn upload(
        &self,
        args: &FpgaArgs,
        device: Option<&str>,
        sink: &mut dyn OutputSink,
    ) -> Result<i32, Error> {
        let res = self.resolve(args)?;
        let ftdi_desc = match res.board.as_deref() {
            Some(board) => Some(
                self.catalog
                    .board(board)
                    .ok_or_else(|| Error::UnknownBoard(board.to_string()))?
                    .ftdi_desc
                    .as_str(),
            ),
            None => None,
        };
        if ftdi_desc.is_none() && device.is_none() {
            return Err(Error::InsufficientArguments);
        }

        let detected = self.system.detect_boards(sink)?;
        debug!(count = detected.len(), "detected devices");
        let device = select_device(ftdi_desc, device, &detected)?;

        let mut variables = res.variables();
        variables.push(format!("device={device}"));
        self.run(Target::Upload, variables, res.board.as_deref(), sink)
    }
}
