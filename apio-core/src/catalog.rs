use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::err::Error;

const BOARDS_FILE: &str = "boards.json";
const FPGAS_FILE: &str = "fpgas.json";

const BUNDLED_BOARDS: &str = include_str!("../resources/boards.json");
const BUNDLED_FPGAS: &str = include_str!("../resources/fpgas.json");

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Board {
    #[serde(default)]
    pub name: String,
    pub fpga: String,
    #[serde(rename = "ftdi-desc")]
    pub ftdi_desc: String,
}

/// The `(size, type, pack)` triple handed to the build description.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct FpgaSpec {
    pub size: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pack: String,
}

impl FpgaSpec {
    pub fn new(size: impl Into<String>, kind: impl Into<String>, pack: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            kind: kind.into(),
            pack: pack.into(),
        }
    }

    /// Build tool variables in `fpga_size`, `fpga_type`, `fpga_pack` order.
    /// Empty values are left out.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        [
            ("fpga_size", &self.size),
            ("fpga_type", &self.kind),
            ("fpga_pack", &self.pack),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
    }
}

/// Static board and FPGA tables. Read-only once loaded.
#[derive(Clone, Debug)]
pub struct Catalog {
    boards: BTreeMap<String, Board>,
    fpgas: BTreeMap<String, FpgaSpec>,
}

impl Catalog {
    /// # Errors
    ///
    /// Will return `Err` if either document is not a valid table.
    pub fn from_json(boards: &str, fpgas: &str) -> Result<Self, Error> {
        Ok(Self {
            boards: serde_json::from_str(boards)?,
            fpgas: serde_json::from_str(fpgas)?,
        })
    }

    /// Tables compiled into the binary.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the bundled resources are malformed.
    pub fn bundled() -> Result<Self, Error> {
        Self::from_json(BUNDLED_BOARDS, BUNDLED_FPGAS)
    }

    /// Loads `boards.json` and `fpgas.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if a file cannot be read or parsed.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let boards = fs::read_to_string(dir.join(BOARDS_FILE))?;
        let fpgas = fs::read_to_string(dir.join(FPGAS_FILE))?;
        Self::from_json(&boards, &fpgas)
    }

    #[must_use]
    pub fn board(&self, id: &str) -> Option<&Board> {
        self.boards.get(id)
    }

    #[must_use]
    pub fn fpga(&self, id: &str) -> Option<&FpgaSpec> {
        self.fpgas.get(id)
    }

    pub fn boards(&self) -> impl Iterator<Item = (&str, &Board)> {
        self.boards.iter().map(|(id, board)| (id.as_str(), board))
    }
}
