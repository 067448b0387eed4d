//! Wraps the USB/FTDI listing tools shipped in the system package.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, warn};

use crate::err::Error;
use crate::exec::{Environment, Executor, Header, OutputSink, Summary};
use crate::home::ApioHome;

const FIND_ALL: &str = "find_all";
const LISTDEVS: &str = "listdevs";

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Number\sof\sFTDI\sdevices\sfound:\s(\d+)").unwrap());
static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Checking\sdevice:\s(.*?)\r?$").unwrap());
static MANUFACTURER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Manufacturer:\s(.*?),").unwrap());
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Description:\s(.*?)\r?$").unwrap());

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectedDevice {
    pub index: String,
    pub manufacturer: String,
    pub description: String,
}

fn captures<'t>(re: &Regex, text: &'t str) -> Vec<&'t str> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Parses `find_all` output. The three per-device fields are paired up by position.
///
/// # Errors
///
/// Will return `Err` if the output announces more devices than it describes.
pub fn parse_devices(text: &str) -> Result<Vec<DetectedDevice>, Error> {
    let count = match COUNT_RE.captures(text).and_then(|c| c.get(1)) {
        Some(n) => n
            .as_str()
            .parse::<usize>()
            .map_err(|err| Error::ScanOutput(format!("device count: {err}")))?,
        None => 0,
    };
    let index = captures(&INDEX_RE, text);
    let manufacturer = captures(&MANUFACTURER_RE, text);
    let description = captures(&DESCRIPTION_RE, text);

    for (name, found) in [
        ("index", index.len()),
        ("manufacturer", manufacturer.len()),
        ("description", description.len()),
    ] {
        if found < count {
            return Err(Error::ScanOutput(format!(
                "{count} devices announced but only {found} {name} entries"
            )));
        }
    }

    Ok((0..count)
        .map(|i| DetectedDevice {
            index: index[i].to_string(),
            manufacturer: manufacturer[i].to_string(),
            description: description[i].to_string(),
        })
        .collect())
}

/// Collects output lines while echoing both streams as plain output.
struct Tee<'a> {
    inner: &'a mut dyn OutputSink,
    text: String,
}

impl OutputSink for Tee<'_> {
    fn stdout_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.inner.stdout_line(line);
    }

    fn stderr_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.inner.stdout_line(line);
    }

    fn header(&mut self, header: &Header) {
        self.inner.header(header);
    }

    fn summary(&mut self, summary: &Summary) {
        self.inner.summary(summary);
    }
}

pub struct System<'e, E: Executor> {
    tools_dir: PathBuf,
    exec: &'e E,
}

impl<'e, E: Executor> System<'e, E> {
    pub fn new(home: &ApioHome, exec: &'e E) -> Self {
        Self {
            tools_dir: home.usb_ftdi_tools_dir(),
            exec,
        }
    }

    fn tool(&self, name: &str) -> PathBuf {
        self.tools_dir
            .join(name)
            .with_extension(std::env::consts::EXE_EXTENSION)
    }

    /// Runs one of the listing tools. `None` means the system package is missing.
    fn run(&self, name: &str, sink: &mut dyn OutputSink) -> Result<Option<i32>, Error> {
        if !self.tools_dir.is_dir() {
            error!("system tools are not installed");
            warn!("Please run:\n   apio install system");
            return Ok(None);
        }
        let code = self
            .exec
            .run(&self.tool(name), &[], &Environment::default(), sink)?;
        Ok(Some(code))
    }

    /// # Errors
    ///
    /// Will return `Err` if the tool cannot be started.
    pub fn lsusb(&self, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        Ok(self.run(LISTDEVS, sink)?.unwrap_or(1))
    }

    /// # Errors
    ///
    /// Will return `Err` if the tool cannot be started.
    pub fn lsftdi(&self, sink: &mut dyn OutputSink) -> Result<i32, Error> {
        Ok(self.run(FIND_ALL, sink)?.unwrap_or(1))
    }

    /// Lists attached FTDI devices. Missing tools or a failing tool give an empty list.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the tool cannot be started or its output is truncated.
    pub fn detect_boards(&self, sink: &mut dyn OutputSink) -> Result<Vec<DetectedDevice>, Error> {
        let mut tee = Tee {
            inner: sink,
            text: String::new(),
        };
        match self.run(FIND_ALL, &mut tee)? {
            Some(0) => parse_devices(&tee.text),
            _ => Ok(vec![]),
        }
    }
}
