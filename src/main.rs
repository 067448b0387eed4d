use std::env;
use std::process::ExitCode;

use anyhow::Result;
use apio::{CommonArgs, FpgaOpts, TerminalSink};
use apio_core::{init_project, Catalog, Error, ProcessExecutor, SCons, System};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{error, warn};

/// Build, simulate and upload iCE40 designs with the apio toolchains.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the previous generated files
    Clean,
    /// Verify the verilog code
    Verify,
    /// Launch the verilog simulation
    Sim,
    /// Synthesize the bitstream
    Build(FpgaOpts),
    /// Upload the bitstream to the FPGA
    Upload {
        #[command(flatten)]
        fpga: FpgaOpts,

        /// Select a FTDI device index
        #[arg(short, long)]
        device: Option<String>,
    },
    /// Bitstream timing analysis
    Time(FpgaOpts),
    /// List connected USB devices
    Lsusb,
    /// List connected FTDI devices
    Lsftdi,
    /// Create a project file or a default SConstruct
    Init(InitArgs),
    /// List the supported boards
    Boards,
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("what").required(true).multiple(true).args(["board", "sconstruct"])))]
struct InitArgs {
    /// Write an apio.ini selecting this board
    #[arg(short, long)]
    board: Option<String>,

    /// Copy the default SConstruct into the project
    #[arg(short, long)]
    sconstruct: bool,

    /// Replace existing files
    #[arg(short, long)]
    force: bool,
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn init(catalog: &Catalog, opts: &InitArgs) -> Result<i32, Error> {
    let dir = env::current_dir()?;
    init_project(catalog, &dir, opts.board.as_deref(), opts.sconstruct, opts.force)?;
    Ok(0)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    args.common.init_logger();

    let catalog = args.common.catalog()?;
    let config = args.common.runner_config()?;
    let exec = ProcessExecutor;
    let mut sink = TerminalSink;

    let result = match args.command {
        Command::Clean => SCons::new(&catalog, config, &exec).clean(&mut sink),
        Command::Verify => SCons::new(&catalog, config, &exec).verify(&mut sink),
        Command::Sim => SCons::new(&catalog, config, &exec).sim(&mut sink),
        Command::Build(fpga) => SCons::new(&catalog, config, &exec).build(&fpga.into(), &mut sink),
        Command::Time(fpga) => SCons::new(&catalog, config, &exec).time(&fpga.into(), &mut sink),
        Command::Upload { fpga, device } => SCons::new(&catalog, config, &exec).upload(
            &fpga.into(),
            device.as_deref(),
            &mut sink,
        ),
        Command::Lsusb => System::new(&config.home, &exec).lsusb(&mut sink),
        Command::Lsftdi => System::new(&config.home, &exec).lsftdi(&mut sink),
        Command::Init(opts) => init(&catalog, &opts),
        Command::Boards => {
            for (id, board) in catalog.boards() {
                println!(
                    "{id:<14} {:<18} {:<28} {}",
                    board.fpga, board.ftdi_desc, board.name
                );
            }
            Ok(0)
        }
    };

    Ok(match result {
        Ok(code) => exit_code(code),
        Err(err) => {
            error!("{err}");
            if let Some(hint) = err.hint() {
                warn!("{hint}");
            }
            ExitCode::FAILURE
        }
    })
}
