use crate::resolve::Field;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Project(String),
    UnknownBoard(String),
    UnknownFpga(String),
    ContradictoryArguments(Vec<Field>),
    MissingBoard,
    MissingFpgaFields(Vec<Field>),
    InsufficientArguments,
    BoardNotDetected,
    ScanOutput(String),
}

fn join(fields: &[Field]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Remediation text shown after the error message, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingBoard => Some(
                "You have two options:\n  \
                 1) Execute your command with\n       `--board <boardname>`\n  \
                 2) Create an ini file using\n       `apio init --board <boardname>`",
            ),
            Self::InsufficientArguments => Some(
                "You have two options:\n  \
                 1) Execute your command with\n       `--device <deviceid>`\n  \
                 2) Execute your command with\n       `--board <boardname>`",
            ),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => err.fmt(f),
            Self::Json(err) => err.fmt(f),
            Self::Project(msg) => write!(f, "project file: {msg}"),
            Self::UnknownBoard(board) => write!(f, "unknown board: {board}"),
            Self::UnknownFpga(fpga) => write!(f, "unknown fpga: {fpga}"),
            Self::ContradictoryArguments(fields) => {
                write!(f, "contradictory arguments: {}", join(fields))
            }
            Self::MissingBoard => write!(f, "insufficient arguments: missing board"),
            Self::MissingFpgaFields(fields) => {
                write!(f, "insufficient arguments: missing {}", join(fields))
            }
            Self::InsufficientArguments => write!(f, "insufficient arguments: device or board"),
            Self::BoardNotDetected => write!(f, "board not detected"),
            Self::ScanOutput(msg) => write!(f, "unexpected device listing: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
