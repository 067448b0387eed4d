#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod catalog;
mod err;
mod exec;
mod home;
mod project;
mod resolve;
mod runner;
mod scanner;
mod scons;
mod test_mocks;
mod upload;

pub use catalog::{Board, Catalog, FpgaSpec};
pub use err::Error;
pub use exec::{Environment, Executor, Header, LineKind, OutputSink, ProcessExecutor, Summary};
pub use home::{ApioHome, Toolchain};
pub use project::{init_project, Project, PROJECT_FILE};
pub use resolve::{FpgaArgs, Field, Resolution, Resolver, Rule};
pub use runner::{create_sconstruct, CommandResult, Runner, RunnerConfig, Target, SCONSTRUCT};
pub use scanner::{parse_devices, DetectedDevice, System};
pub use scons::SCons;
pub use upload::select_device;
