use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use directories::BaseDirs;

pub const HOME_DIR_VAR: &str = "APIO_HOME_DIR";

/// Root of the installed packages and system tools, `~/.apio` by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApioHome {
    root: PathBuf,
}

impl ApioHome {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$APIO_HOME_DIR`, else `.apio` under the user's home directory.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_override(env::var_os(HOME_DIR_VAR))
            .or_else(|| BaseDirs::new().map(|dirs| Self::new(dirs.home_dir().join(".apio"))))
    }

    fn from_override(dir: Option<OsString>) -> Option<Self> {
        dir.filter(|d| !d.is_empty()).map(Self::new)
    }

    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    #[must_use]
    pub fn usb_ftdi_tools_dir(&self) -> PathBuf {
        self.root.join("system").join("tools-usb-ftdi")
    }

    #[must_use]
    pub fn scons_dir(&self) -> PathBuf {
        self.packages_dir().join("tool-scons").join("script")
    }

    /// Value for `IVL`.
    #[must_use]
    pub fn iverilog_lib(&self) -> PathBuf {
        self.packages_dir()
            .join("toolchain-iverilog")
            .join("lib")
            .join("ivl")
    }

    /// Value for `VLIB`.
    #[must_use]
    pub fn iverilog_vlib(&self) -> PathBuf {
        self.packages_dir()
            .join("toolchain-iverilog")
            .join("vlib")
            .join("system.v")
    }

    #[must_use]
    pub fn default_sconstruct(&self) -> PathBuf {
        self.root.join("resources").join(crate::runner::SCONSTRUCT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toolchain {
    Icestorm,
    Iverilog,
    Scons,
}

impl Toolchain {
    pub const ALL: [Self; 3] = [Self::Icestorm, Self::Iverilog, Self::Scons];

    #[must_use]
    pub fn package(self) -> &'static str {
        match self {
            Self::Icestorm => "icestorm",
            Self::Iverilog => "iverilog",
            Self::Scons => "scons",
        }
    }

    /// Directory whose presence marks the toolchain as installed.
    #[must_use]
    pub fn dir(self, home: &ApioHome) -> PathBuf {
        match self {
            Self::Icestorm => home.packages_dir().join("toolchain-icestorm").join("bin"),
            Self::Iverilog => home.packages_dir().join("toolchain-iverilog").join("bin"),
            Self::Scons => home.scons_dir(),
        }
    }

    #[must_use]
    pub fn is_installed(self, home: &ApioHome) -> bool {
        self.dir(home).is_dir()
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.package())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    #[test]
    fn toolchain_layout() {
        let dir = tempfile::tempdir().unwrap();
        let home = ApioHome::new(dir.path());
        assert!(Toolchain::ALL.iter().all(|t| !t.is_installed(&home)));

        fs::create_dir_all(dir.path().join("packages/toolchain-icestorm/bin")).unwrap();
        fs::create_dir_all(dir.path().join("packages/tool-scons/script")).unwrap();
        assert!(Toolchain::Icestorm.is_installed(&home));
        assert!(Toolchain::Scons.is_installed(&home));
        assert!(!Toolchain::Iverilog.is_installed(&home));
    }

    #[test]
    fn home_dir_override() {
        let home = ApioHome::from_override(Some("/opt/apio".into())).unwrap();
        assert_eq!(home.packages_dir(), Path::new("/opt/apio/packages"));
        assert_eq!(ApioHome::from_override(Some(OsString::new())), None);
        assert_eq!(ApioHome::from_override(None), None);
    }

    #[test]
    fn default_home_is_dot_apio() {
        let Some(dirs) = BaseDirs::new() else { return };
        if env::var_os(HOME_DIR_VAR).is_some() {
            return;
        }
        let home = ApioHome::from_env().unwrap();
        assert_eq!(home, ApioHome::new(dirs.home_dir().join(".apio")));
    }

    #[test]
    fn iverilog_paths() {
        let home = ApioHome::new("/h");
        assert_eq!(
            home.iverilog_lib(),
            Path::new("/h/packages/toolchain-iverilog/lib/ivl")
        );
        assert_eq!(
            home.iverilog_vlib(),
            Path::new("/h/packages/toolchain-iverilog/vlib/system.v")
        );
        assert_eq!(
            home.usb_ftdi_tools_dir(),
            Path::new("/h/system/tools-usb-ftdi")
        );
    }
}
