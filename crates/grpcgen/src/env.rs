//! Managed environment layout.
//!
//! The managed environment is the project's virtual environment. The driver
//! needs three things from it: its root (excluded from source discovery), the
//! directory holding its executables (added to the generator's search path),
//! and its library install directory (base of extra include roots and of the
//! bundled well-known protos).

use std::fs;
use std::path::{Path, PathBuf};

/// Target platform conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// POSIX layout: `bin/`, `lib/pythonX.Y/site-packages`, no executable suffix.
    Unix,
    /// Windows layout: `Scripts\`, `Lib\site-packages`, `.exe` executables.
    Windows,
}

impl Platform {
    /// Returns the platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Suffix appended to executable names.
    #[must_use]
    pub const fn exe_suffix(self) -> &'static str {
        match self {
            Self::Unix => "",
            Self::Windows => ".exe",
        }
    }

    /// Name of the environment's executable directory.
    #[must_use]
    pub const fn scripts_dir(self) -> &'static str {
        match self {
            Self::Unix => "bin",
            Self::Windows => "Scripts",
        }
    }

    /// Whether generator plugins must be passed explicitly with `--plugin`.
    #[must_use]
    pub const fn needs_plugin_overrides(self) -> bool {
        matches!(self, Self::Windows)
    }
}

/// Paths of a managed environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPaths {
    /// Environment root.
    pub root: PathBuf,
    /// Directory containing the environment's executables.
    pub bin_dir: PathBuf,
    /// Library install directory (`site-packages`).
    pub site_packages: PathBuf,
    /// Layout conventions.
    pub platform: Platform,
}

impl EnvPaths {
    /// Derives the layout of the environment rooted at `root` for the current
    /// platform.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::for_platform(root, Platform::current())
    }

    /// Derives the layout of the environment rooted at `root` for `platform`.
    ///
    /// On Unix the first `lib/python*/site-packages` found is used; when none
    /// exists yet the path falls back to `lib/site-packages`.
    #[must_use]
    pub fn for_platform(root: impl Into<PathBuf>, platform: Platform) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        let bin_dir = root.join(platform.scripts_dir());
        let site_packages = match platform {
            Platform::Windows => root.join("Lib").join("site-packages"),
            Platform::Unix => find_site_packages(&root)
                .unwrap_or_else(|| root.join("lib").join("site-packages")),
        };

        Self {
            root,
            bin_dir,
            site_packages,
            platform,
        }
    }

    /// Overrides the library install directory.
    #[must_use]
    pub fn with_site_packages(mut self, site_packages: impl Into<PathBuf>) -> Self {
        self.site_packages = site_packages.into();
        self
    }

    /// Directory of protos bundled with `grpcio-tools`.
    #[must_use]
    pub fn well_known_protos(&self) -> PathBuf {
        self.site_packages.join("grpc_tools").join("_proto")
    }

    /// Path of an executable installed in the environment.
    #[must_use]
    pub fn executable(&self, name: &str) -> PathBuf {
        self.bin_dir
            .join(format!("{name}{}", self.platform.exe_suffix()))
    }
}

fn find_site_packages(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(root.join("lib"))
        .ok()?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("python"))
        .map(|entry| entry.path().join("site-packages"))
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
