use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::err::Error;
use crate::exec::{Environment, Executor, Header, OutputSink, Summary};
use crate::home::{ApioHome, Toolchain};

pub const SCONSTRUCT: &str = "SConstruct";

pub const BUNDLED_SCONSTRUCT: &str = include_str!("../resources/SConstruct");

const CUSTOM_BOARD: &str = "custom board";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Clean,
    Verify,
    Sim,
    Build,
    Upload,
    Time,
}

impl Target {
    /// Argument selecting this target on the build tool's command line.
    #[must_use]
    pub fn arg(self) -> &'static str {
        match self {
            Self::Clean => "-c",
            Self::Verify => "verify",
            Self::Sim => "sim",
            Self::Build => "build",
            Self::Upload => "upload",
            Self::Time => "time",
        }
    }

    fn announces_board(self) -> bool {
        matches!(self, Self::Build | Self::Upload | Self::Time)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arg())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub home: ApioHome,
    /// Project directory the build tool runs in.
    pub workdir: PathBuf,
    pub terminal_width: usize,
    /// Launches the build tool script through this program when set.
    pub interpreter: Option<PathBuf>,
}

pub struct Runner<'e, E: Executor> {
    config: RunnerConfig,
    exec: &'e E,
}

impl<'e, E: Executor> Runner<'e, E> {
    pub fn new(config: RunnerConfig, exec: &'e E) -> Self {
        Self { config, exec }
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Toolchain binaries first on the search path, plus the simulator's library paths.
    #[must_use]
    pub fn environment(&self) -> Environment {
        let home = &self.config.home;
        Environment {
            path_prefix: vec![
                Toolchain::Iverilog.dir(home),
                Toolchain::Icestorm.dir(home),
            ],
            vars: vec![],
            current_dir: Some(self.config.workdir.clone()),
        }
        .with_var("IVL", home.iverilog_lib())
        .with_var("VLIB", home.iverilog_vlib())
    }

    fn check_toolchains(&self) {
        for toolchain in Toolchain::ALL {
            if !toolchain.is_installed(&self.config.home) {
                error!("{toolchain} toolchain is not installed");
                warn!("Please run:\n   apio install {}", toolchain.package());
            }
        }
    }

    /// `-f <default>` when the project has no build description of its own.
    fn build_description(&self) -> Result<Vec<String>, Error> {
        if self.config.workdir.join(SCONSTRUCT).is_file() {
            return Ok(vec![]);
        }
        info!("Using default {SCONSTRUCT} file");
        let path = self.config.home.default_sconstruct();
        // Refreshed whenever it differs from the bundled copy
        if fs::read_to_string(&path).ok().as_deref() != Some(BUNDLED_SCONSTRUCT) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            debug!(path = %path.display(), "writing default {SCONSTRUCT}");
            fs::write(&path, BUNDLED_SCONSTRUCT)?;
        }
        Ok(vec!["-f".into(), path.to_string_lossy().into_owned()])
    }

    fn header(&self, board: Option<&str>) -> Header {
        Header {
            timestamp: chrono::Local::now().format("%c").to_string(),
            board: board.unwrap_or(CUSTOM_BOARD).to_string(),
            rule: "-".repeat(self.config.terminal_width),
        }
    }

    /// Runs the build tool for `target` and reports the outcome to `sink`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the build tool cannot be started.
    pub fn run(
        &self,
        target: Target,
        mut variables: Vec<String>,
        board: Option<&str>,
        sink: &mut dyn OutputSink,
    ) -> Result<CommandResult, Error> {
        self.check_toolchains();
        variables.extend(self.build_description()?);

        let script = self.config.home.scons_dir().join("scons");
        let mut args = vec![];
        let program = match &self.config.interpreter {
            Some(interpreter) => {
                args.push(script.to_string_lossy().into_owned());
                interpreter.clone()
            }
            None => script,
        };
        args.extend(["-Q".to_string(), target.arg().to_string()]);

        if target.announces_board() {
            sink.header(&self.header(board));
        }
        info!("Executing: scons -Q {target} {}", variables.join(" "));
        args.extend(variables);

        let start = Instant::now();
        let exit_code = self
            .exec
            .run(&program, &args, &self.environment(), sink)?;
        let result = CommandResult {
            exit_code,
            duration: start.elapsed(),
        };
        sink.summary(&Summary::new(
            result.success(),
            result.duration,
            self.config.terminal_width,
        ));
        Ok(result)
    }
}

/// Copies the bundled build description into `dir`. An existing one is kept unless `force` is set.
///
/// # Errors
///
/// Will return `Err` if the file cannot be written.
pub fn create_sconstruct(dir: impl AsRef<Path>, force: bool) -> Result<bool, Error> {
    let path = dir.as_ref().join(SCONSTRUCT);
    if path.is_file() && !force {
        warn!("{SCONSTRUCT} file already exists, use --force to replace it");
        return Ok(false);
    }
    info!("Creating {SCONSTRUCT} file ...");
    fs::write(&path, BUNDLED_SCONSTRUCT)?;
    info!("File '{SCONSTRUCT}' has been successfully created!");
    Ok(true)
}
