use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::format::Format;

/// Which search-path and home-directory rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// No system-wide candidates; home comes from `USERPROFILE`.
    Windows,
    /// `/etc` and `/usr/local/etc` candidates; home comes from `HOME`.
    Posix,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// Interpret a platform name such as `"win32"`, `"windows"`, `"linux"` or
    /// `"darwin"`. Anything that isn't Windows is treated as POSIX.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "win32" | "win64" | "windows" => Platform::Windows,
            _ => Platform::Posix,
        }
    }

    /// The environment variable holding the user's home directory.
    pub fn home_var(self) -> &'static str {
        match self {
            Platform::Windows => "USERPROFILE",
            Platform::Posix => "HOME",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::current()
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Defaults,
    /// A config file, labelled with its display path (see [`ConfigPath::label`]).
    File(String),
    Environment,
    Flag,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Defaults => f.write_str("defaults"),
            Source::File(path) => f.write_str(path),
            Source::Environment => f.write_str("environment"),
            Source::Flag => f.write_str("flag"),
        }
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A discovered config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: PathBuf,
    /// 0 for the highest-precedence file, increasing toward lower precedence.
    pub rank: usize,
    /// Set when the extension names a format; such files skip sniffing.
    pub format: Option<Format>,
}

impl ConfigPath {
    pub fn new(path: PathBuf, rank: usize) -> Self {
        let format = Format::from_path(&path);
        Self { path, rank, format }
    }

    /// The path relative to `cwd` when that is shorter, else the path as is.
    pub fn label(&self, cwd: &Path) -> String {
        let absolute = self.path.to_string_lossy().into_owned();
        match relative_to(&self.path, cwd) {
            Some(rel) => {
                let rel = rel.to_string_lossy().into_owned();
                if rel.len() < absolute.len() {
                    rel
                } else {
                    absolute
                }
            }
            None => absolute,
        }
    }
}

/// Express `path` relative to `base`, walking up with `..` as needed.
/// Returns `None` when the two share no root (e.g. different drives).
pub(crate) fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part);
    }
    Some(rel)
}
