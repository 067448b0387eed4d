use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use apio_core::{ApioHome, Catalog, FpgaArgs, RunnerConfig};
use terminal_size::{terminal_size, Width};
use tracing::level_filters::LevelFilter;

const DEFAULT_TERMINAL_WIDTH: usize = 80;

#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// Logging level. `Off` for silent operation.
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: LevelFilter,

    /// Load boards.json and fpgas.json from this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub resources: Option<PathBuf>,

    /// Run the SCons script through this Python interpreter
    #[arg(long, env = "APIO_PYTHON", global = true)]
    pub python: Option<PathBuf>,
}

impl CommonArgs {
    pub fn init_logger(&self) {
        tracing_subscriber::fmt()
            .with_max_level(self.log_level)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn catalog(&self) -> Result<Catalog> {
        match &self.resources {
            Some(dir) => Catalog::from_dir(dir)
                .with_context(|| format!("loading board tables from {}", dir.display())),
            None => Ok(Catalog::bundled()?),
        }
    }

    pub fn runner_config(&self) -> Result<RunnerConfig> {
        Ok(RunnerConfig {
            home: ApioHome::from_env().context("cannot locate the apio home directory")?,
            workdir: env::current_dir()?,
            terminal_width: terminal_width(),
            interpreter: self.python.clone(),
        })
    }
}

/// Width of the attached terminal, else `$COLUMNS`, else 80.
fn terminal_width() -> usize {
    let tty = terminal_size().map(|(Width(cols), _)| usize::from(cols));
    choose_width(tty, env::var("COLUMNS").ok().as_deref())
}

fn choose_width(tty: Option<usize>, columns: Option<&str>) -> usize {
    tty.filter(|&cols| cols > 0)
        .or_else(|| columns.and_then(|cols| cols.trim().parse().ok()))
        .filter(|&cols| cols > 0)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
}

#[derive(clap::Args, Debug, Default)]
pub struct FpgaOpts {
    /// Set the board
    #[arg(short, long)]
    pub board: Option<String>,

    /// Set the FPGA
    #[arg(long)]
    pub fpga: Option<String>,

    /// Set the FPGA size (1k/8k)
    #[arg(long)]
    pub size: Option<String>,

    /// Set the FPGA type (hx/lp)
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,

    /// Set the FPGA package
    #[arg(long)]
    pub pack: Option<String>,
}

impl From<FpgaOpts> for FpgaArgs {
    fn from(opts: FpgaOpts) -> Self {
        Self {
            board: opts.board,
            fpga: opts.fpga,
            size: opts.size,
            kind: opts.kind,
            pack: opts.pack,
        }
    }
}
