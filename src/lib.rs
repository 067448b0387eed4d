#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod term;
mod utils;

pub use term::TerminalSink;
pub use utils::{CommonArgs, FpgaOpts};
