use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::err::Error;
use crate::runner::create_sconstruct;

pub const PROJECT_FILE: &str = "apio.ini";

const ENV_SECTION: &str = "env";

/// Contents of an `apio.ini` found in the working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Project {
    pub board: Option<String>,
}

impl Project {
    /// Reads the project file in `dir`. `Ok(None)` means there is no file.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file exists but cannot be read or parsed.
    pub fn read(dir: impl AsRef<Path>) -> Result<Option<Self>, Error> {
        match fs::read_to_string(dir.as_ref().join(PROJECT_FILE)) {
            Ok(text) => Self::parse(&text).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[must_use]
    pub fn exists(dir: impl AsRef<Path>) -> bool {
        dir.as_ref().join(PROJECT_FILE).is_file()
    }

    /// # Errors
    ///
    /// Will return `Err` on a line that is neither a section, a comment nor `key = value`.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut section = None;
        let mut board = None;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(name.trim());
                continue;
            }
            let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
                return Err(Error::Project(format!(
                    "line {}: expected `key = value`",
                    lineno + 1
                )));
            };
            if section == Some(ENV_SECTION) && key.trim() == "board" {
                let value = value.trim();
                board = (!value.is_empty()).then(|| value.to_string());
            }
        }
        Ok(Self { board })
    }

    /// Writes a project file selecting `board`. An existing file is kept unless `force` is set.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file cannot be written.
    pub fn write(dir: impl AsRef<Path>, board: &str, force: bool) -> Result<bool, Error> {
        let path = dir.as_ref().join(PROJECT_FILE);
        if path.is_file() && !force {
            warn!("{PROJECT_FILE} file already exists, use --force to replace it");
            return Ok(false);
        }
        fs::write(&path, format!("[{ENV_SECTION}]\nboard = {board}\n"))?;
        info!("File '{PROJECT_FILE}' has been successfully created!");
        Ok(true)
    }
}

/// Writes the files `apio init` asks for into `dir`: an `apio.ini` selecting
/// `board`, and a copy of the default SConstruct when `sconstruct` is set.
/// Existing files are kept unless `force` is set.
///
/// # Errors
///
/// Will return `Err` if `board` is not in the catalog or a file cannot be written.
pub fn init_project(
    catalog: &Catalog,
    dir: &Path,
    board: Option<&str>,
    sconstruct: bool,
    force: bool,
) -> Result<(), Error> {
    if let Some(board) = board {
        if catalog.board(board).is_none() {
            return Err(Error::UnknownBoard(board.to_string()));
        }
        Project::write(dir, board, force)?;
    }
    if sconstruct {
        create_sconstruct(dir, force)?;
    }
    Ok(())
}
