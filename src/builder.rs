use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::args::{self, ParsedArgs};
use crate::env::{self, EnvMap};
use crate::error::RcfigError;
use crate::explain::Explanation;
use crate::file;
use crate::resolve::{self, ResolveInput};
use crate::template::Templater;
use crate::types::{ConfigPath, Platform};
use crate::value::{Mapping, Value};

/// Entry point for building an rcfig configuration.
pub struct Rcfig;

impl Rcfig {
    pub fn builder() -> RcfigBuilder {
        RcfigBuilder::new()
    }
}

/// Builder for configuring and loading layered configuration.
///
/// Only [`app_name()`](Self::app_name) and [`defaults()`](Self::defaults) are
/// required. Everything else defaults to the running process: its arguments,
/// its environment, its platform and its working directory.
#[derive(Debug, Clone)]
pub struct RcfigBuilder {
    app_name: Option<String>,
    defaults: Option<Value>,
    argv: Option<Vec<OsString>>,
    env: Option<EnvMap>,
    platform: Option<Platform>,
    cwd: Option<PathBuf>,
    config_path: Option<PathBuf>,
    unset_env_values: bool,
    parse_values: bool,
}

impl RcfigBuilder {
    fn new() -> Self {
        Self {
            app_name: None,
            defaults: None,
            argv: None,
            env: None,
            platform: None,
            cwd: None,
            config_path: None,
            unset_env_values: false,
            parse_values: true,
        }
    }

    /// Set the application name. It namespaces both lookups:
    /// - env vars → `{APP_NAME}__*` (any case)
    /// - files → `.{app_name}rc`, `/etc/{app_name}rc`, `~/.config/{app_name}`, ...
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// The lowest-precedence layer. Must be a mapping.
    pub fn defaults(mut self, defaults: impl Into<Value>) -> Self {
        self.defaults = Some(defaults.into());
        self
    }

    /// Arguments to read flags from, without the program name
    /// (default: `std::env::args_os().skip(1)`).
    pub fn argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.argv = Some(argv.into_iter().map(Into::into).collect());
        self
    }

    /// Environment snapshot to read from (default: the process environment).
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Override the platform rules (default: [`Platform::current`]).
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Directory the ancestor search starts from (default: the process's).
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Load this file instead of searching. `--config` on the command line
    /// takes precedence over it.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Remove consumed `{APP_NAME}__*` variables from the loader's environment
    /// snapshot (default: `false`).
    pub fn unset_env_values(mut self, unset: bool) -> Self {
        self.unset_env_values = unset;
        self
    }

    /// Coerce env and flag strings such as `"true"` or `"8080"` (default: `true`).
    pub fn parse_values(mut self, parse: bool) -> Self {
        self.parse_values = parse;
        self
    }

    fn effective_app_name(&self) -> Result<&str, RcfigError> {
        match self.app_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(RcfigError::InvalidArgument(
                "an application name is required; call .app_name()".into(),
            )),
        }
    }

    fn effective_defaults(&self) -> Result<Mapping, RcfigError> {
        match &self.defaults {
            Some(Value::Mapping(map)) => Ok(map.clone()),
            Some(other) => Err(RcfigError::InvalidArgument(format!(
                "defaults must be a mapping, got `{other}`"
            ))),
            None => Err(RcfigError::InvalidArgument(
                "defaults are required; call .defaults()".into(),
            )),
        }
    }

    fn effective_argv(&self) -> Vec<OsString> {
        match &self.argv {
            Some(argv) => argv.clone(),
            None => std::env::args_os().skip(1).collect(),
        }
    }

    fn effective_env(&self) -> EnvMap {
        match &self.env {
            Some(env) => env.clone(),
            None => std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    fn effective_platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }

    fn effective_cwd(&self) -> Result<PathBuf, RcfigError> {
        let cwd = match &self.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().map_err(|source| RcfigError::IoError {
                path: PathBuf::from("."),
                source,
            })?,
        };
        std::path::absolute(&cwd).map_err(|source| RcfigError::IoError { path: cwd, source })
    }

    /// Validate the options and snapshot the process state into a [`Loader`].
    pub fn build(self) -> Result<Loader, RcfigError> {
        let app_name = self.effective_app_name()?.to_string();
        let defaults = self.effective_defaults()?;
        let cwd = self.effective_cwd()?;

        Ok(Loader {
            app_name,
            defaults,
            args: ParsedArgs::parse(self.effective_argv()),
            env: self.effective_env(),
            platform: self.effective_platform(),
            cwd,
            config_path: self.config_path,
            unset_env_values: self.unset_env_values,
            parse_values: self.parse_values,
        })
    }

    /// Load and resolve the configuration through all layers.
    pub fn load(self) -> Result<Mapping, RcfigError> {
        self.build()?.to_object()
    }

    /// Like [`load()`](Self::load), but with every value tagged by its source.
    pub fn explain(self) -> Result<Explanation, RcfigError> {
        self.build()?.explain()
    }

    /// Load and deserialize into `T`.
    pub fn load_as<T: DeserializeOwned>(self) -> Result<T, RcfigError> {
        self.build()?.to_object_as()
    }
}

/// A validated configuration source.
///
/// Every call re-reads the config files, so edits on disk show up in the
/// next [`to_object()`](Self::to_object). The environment is a snapshot taken
/// at build time; with `unset_env_values`, consumed variables disappear from
/// it after the first resolution.
#[derive(Debug, Clone)]
pub struct Loader {
    app_name: String,
    defaults: Mapping,
    args: ParsedArgs,
    env: EnvMap,
    platform: Platform,
    cwd: PathBuf,
    config_path: Option<PathBuf>,
    unset_env_values: bool,
    parse_values: bool,
}

impl Loader {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The environment snapshot, minus anything already consumed with
    /// `unset_env_values`.
    pub fn env(&self) -> &EnvMap {
        &self.env
    }

    /// Non-flag arguments, in order.
    pub fn positional(&self) -> &[String] {
        &self.args.positional
    }

    /// The config files that would be loaded, lowest precedence first.
    pub fn config_paths(&self) -> Result<Vec<ConfigPath>, RcfigError> {
        let explicit = self.explicit_config_path();
        let home = file::home_dir(&self.env, self.platform);
        file::discover(
            &self.app_name,
            &self.cwd,
            home.as_deref(),
            self.platform,
            explicit.as_deref(),
        )
    }

    /// Resolve the configuration.
    pub fn to_object(&mut self) -> Result<Mapping, RcfigError> {
        let input = self.build_input()?;
        resolve::resolve(input)
    }

    /// Resolve the configuration and deserialize it into `T`.
    pub fn to_object_as<T: DeserializeOwned>(&mut self) -> Result<T, RcfigError> {
        let config = self.to_object()?;
        let json = serde_json::to_value(Value::Mapping(config)).map_err(|e| {
            RcfigError::InvalidValue {
                key: "<merged>".into(),
                reason: e.to_string(),
            }
        })?;
        serde_json::from_value(json).map_err(|e| RcfigError::InvalidValue {
            key: "<merged>".into(),
            reason: e.to_string(),
        })
    }

    /// Resolve the configuration with every value tagged by its source.
    pub fn explain(&mut self) -> Result<Explanation, RcfigError> {
        let input = self.build_input()?;
        resolve::explain(input)
    }

    fn explicit_config_path(&self) -> Option<PathBuf> {
        self.args
            .config_path()
            .or_else(|| self.config_path.clone())
    }

    /// Discover, load and convert every layer.
    fn build_input(&mut self) -> Result<ResolveInput<'_>, RcfigError> {
        let paths = self.config_paths()?;
        let files = file::load_config_files(&paths)?;
        let env = env::env_to_table(
            &self.app_name,
            &mut self.env,
            self.parse_values,
            self.unset_env_values,
        );
        let flags = args::flags_to_table(&self.args, self.parse_values);

        Ok(ResolveInput {
            defaults: self.defaults.clone(),
            files,
            env,
            flags,
            templater: Templater::new(&self.env, &self.cwd),
            cwd: &self.cwd,
        })
    }
}
