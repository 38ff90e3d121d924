//! Config file discovery and loading.
//!
//! # Discovery
//!
//! Without an explicit path, candidates are collected lowest precedence first:
//!
//! 1. `.{app}rc` in every directory from the filesystem root down to the
//!    working directory, so files closer to the working directory win.
//! 2. On non-Windows platforms: `/etc/{app}rc`, `/etc/{app}/config`,
//!    `/usr/local/etc/{app}rc`, `/usr/local/etc/{app}/config`.
//! 3. Under the home directory: `.{app}rc`, `.{app}/config`, `.config/{app}`,
//!    `.config/{app}/config`.
//!
//! Every candidate is also tried with `.json`, `.ini` and `.yaml` appended.
//! Only paths that exist as regular files are kept; missing files are never an
//! error. A path found twice (the home directory is usually also an ancestor
//! of the working directory) is kept at its higher-precedence position only.
//!
//! An explicit path (`--config` or [`RcfigBuilder::config_path`]) replaces the
//! whole search and must exist.
//!
//! # Loading
//!
//! Files whose extension names a format are parsed by that format and fail
//! loudly. The rest go through [`format::parse_unlabeled`]; a file nothing can
//! parse is skipped with a warning.
//!
//! [`RcfigBuilder::config_path`]: crate::RcfigBuilder::config_path

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::env::EnvMap;
use crate::error::RcfigError;
use crate::format;
use crate::types::{ConfigPath, Platform};
use crate::value::Mapping;

const VARIANTS: [&str; 4] = ["", ".json", ".ini", ".yaml"];

/// A loaded config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub path: ConfigPath,
    pub data: Mapping,
}

/// Every directory from the filesystem root down to `start`, shallowest first.
pub fn expand_ancestors_from(start: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = start.ancestors().map(Path::to_path_buf).collect();
    dirs.reverse();
    dirs
}

/// The user's home directory: the platform's home variable from `env`, else
/// whatever the OS reports.
pub fn home_dir(env: &EnvMap, platform: Platform) -> Option<PathBuf> {
    match env.get(platform.home_var()) {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => directories::UserDirs::new().map(|user| user.home_dir().to_path_buf()),
    }
}

/// All candidate paths in ascending precedence, existing or not.
pub fn candidate_paths(
    app_name: &str,
    cwd: &Path,
    home: Option<&Path>,
    platform: Platform,
) -> Vec<PathBuf> {
    let rc_name = format!(".{app_name}rc");
    let mut bases: Vec<PathBuf> = expand_ancestors_from(cwd)
        .into_iter()
        .map(|dir| dir.join(&rc_name))
        .collect();

    if platform != Platform::Windows {
        for etc in ["/etc", "/usr/local/etc"] {
            let etc = Path::new(etc);
            bases.push(etc.join(format!("{app_name}rc")));
            bases.push(etc.join(app_name).join("config"));
        }
    }

    if let Some(home) = home {
        bases.push(home.join(&rc_name));
        bases.push(home.join(format!(".{app_name}")).join("config"));
        bases.push(home.join(".config").join(app_name));
        bases.push(home.join(".config").join(app_name).join("config"));
    }

    bases
        .iter()
        .flat_map(|base| VARIANTS.iter().map(move |suffix| with_suffix(base, suffix)))
        .collect()
}

/// `~/.myapprc` + `.json` -> `~/.myapprc.json` (appended, not an extension swap).
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Find the config files to load, lowest precedence first.
///
/// `explicit` short-circuits the search; a relative explicit path is taken
/// relative to `cwd`.
pub fn discover(
    app_name: &str,
    cwd: &Path,
    home: Option<&Path>,
    platform: Platform,
    explicit: Option<&Path>,
) -> Result<Vec<ConfigPath>, RcfigError> {
    let found = match explicit {
        Some(path) => {
            let resolved = cwd.join(path);
            if !resolved.is_file() {
                return Err(RcfigError::ConfigPathNotFound(path.to_path_buf()));
            }
            vec![resolved]
        }
        None => {
            let existing: Vec<PathBuf> = candidate_paths(app_name, cwd, home, platform)
                .into_iter()
                .filter(|path| path.is_file())
                .collect();
            keep_last_occurrence(existing)
        }
    };

    tracing::debug!(app = app_name, paths = ?found, "discovered config files");

    let last = found.len().saturating_sub(1);
    Ok(found
        .into_iter()
        .enumerate()
        .map(|(i, path)| ConfigPath::new(path, last - i))
        .collect())
}

fn keep_last_occurrence(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths.into_iter().rev() {
        if !kept.contains(&path) {
            kept.push(path);
        }
    }
    kept.reverse();
    kept
}

/// Read and parse every discovered file, keeping the discovery order.
pub fn load_config_files(paths: &[ConfigPath]) -> Result<Vec<ConfigFile>, RcfigError> {
    paths.iter().map(load_config_file).collect()
}

fn load_config_file(path: &ConfigPath) -> Result<ConfigFile, RcfigError> {
    let text = fs::read_to_string(&path.path).map_err(|source| RcfigError::IoError {
        path: path.path.clone(),
        source,
    })?;

    let data = match path.format {
        Some(format) => format
            .parse(&text)
            .map_err(|message| RcfigError::ParseError {
                path: path.path.clone(),
                format,
                message,
            })?,
        None => format::parse_unlabeled(&text).unwrap_or_else(|| {
            let warning = RcfigError::ParseAmbiguous {
                path: path.path.clone(),
            };
            tracing::warn!("{warning}");
            Mapping::new()
        }),
    };

    Ok(ConfigFile {
        path: path.clone(),
        data,
    })
}
