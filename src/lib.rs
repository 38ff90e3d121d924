//! Layered runtime configuration for a single application, rc-file style.
//!
//! rcfig merges hard-coded defaults, discovered config files, environment
//! variables and command-line flags into one structured value, and can tell
//! you which of them supplied each setting.
//!
//! ```ignore
//! let config = Rcfig::builder()
//!     .app_name("myapp")
//!     .defaults(json!({"port": 8080, "database": {"host": "localhost"}}))
//!     .load()?;
//! ```
//!
//! That call looks for `.myapprc` files from the filesystem root down to the
//! working directory, in `/etc` and `/usr/local/etc`, and under your home
//! directory; merges `MYAPP__*` environment variables; applies `--flags`;
//! and hands back the merged [`Mapping`]. Use
//! [`load_as()`](RcfigBuilder::load_as) to deserialize into your own type.
//!
//! # Layer precedence
//!
//! ```text
//! Defaults              .defaults(...)
//!        ↑ overridden by
//! Config files          discovery order, later files win
//!        ↑ overridden by
//! Environment vars      MYAPP__KEY
//!        ↑ overridden by
//! Flags                 --key value
//! ```
//!
//! Every layer is sparse: it only needs the keys it wants to change. Layers
//! merge structurally, so two mappings under the same key are merged
//! recursively while anything else (scalars, sequences, `null`) is replaced
//! by the higher layer.
//!
//! # Config files
//!
//! Candidates, lowest precedence first (each also tried with `.json`, `.ini`
//! and `.yaml` appended):
//!
//! ```text
//! /.myapprc
//! ...
//! {cwd}/../.myapprc
//! {cwd}/.myapprc
//! /etc/myapprc                    (not on Windows)
//! /etc/myapp/config               (not on Windows)
//! /usr/local/etc/myapprc          (not on Windows)
//! /usr/local/etc/myapp/config     (not on Windows)
//! ~/.myapprc
//! ~/.myapp/config
//! ~/.config/myapp
//! ~/.config/myapp/config
//! ```
//!
//! Missing files are skipped. A file with a format extension is parsed with
//! that format and must be valid. A file without one is sniffed as JSON, INI
//! or YAML, with the other parsers as fallbacks; if nothing can read it, it
//! is skipped with a warning.
//!
//! `--config path` (or [`config_path()`](RcfigBuilder::config_path)) loads
//! exactly that file instead, which may also be `.toml`.
//!
//! # Environment variables and flags
//!
//! | Source | Config key |
//! |--------|------------|
//! | `MYAPP__HOST` | `host` |
//! | `MYAPP__DATABASE__POOL_SIZE` | `database.poolSize` |
//! | `--database--pool-size 10` | `database.poolSize` |
//! | `--servers__0 a` | `servers = ["a"]` |
//!
//! The env prefix matches in any case. `__` (or `--` in flags) nests, and a
//! single `_` (or `-`) camel-cases the next letter. A numeric segment makes
//! its parent a sequence.
//!
//! Strings from both sources are coerced unless
//! [`parse_values(false)`](RcfigBuilder::parse_values) is set: `true`,
//! `false`, `null`, `NaN` and plain integers like `8080` (but not `007`).
//!
//! # Templates
//!
//! String values from any layer may reference the environment (`${HOME}`),
//! inline a file (`$(secrets/token)`), or cast the whole string with a
//! `boolean:`, `number:`, `string:`, `json:` or `regex:` prefix. See
//! [`Templater`].
//!
//! # Explaining a config
//!
//! [`explain()`](RcfigBuilder::explain) resolves the same value but tags
//! every leaf with its source, which serializes as
//! `{"val": ..., "src": "environment"}`. File sources are labelled with their
//! path, relative to the working directory when that is shorter.
//! [`explain::entries`] flattens an explanation into rows for display.
//!
//! # Logging
//!
//! rcfig emits [`tracing`](https://docs.rs/tracing) events: `debug` for
//! discovered files and failed parser trials, `warn` for unparseable config
//! files that were skipped. It never installs a subscriber.
//!
//! # Error handling
//!
//! All fallible operations return [`RcfigError`]. See the [`error`] module
//! for the full set.

pub mod error;
pub mod explain;
pub mod types;
pub mod value;

mod args;
mod assign;
mod builder;
mod env;
mod file;
mod format;
mod ini;
mod merge;
mod resolve;
mod template;

#[cfg(test)]
mod fixtures;

pub use args::ParsedArgs;
pub use assign::assign;
pub use builder::{Loader, Rcfig, RcfigBuilder};
pub use env::EnvMap;
pub use error::RcfigError;
pub use explain::{ExplainEntry, Explained, Explanation, Sourced};
pub use file::ConfigFile;
pub use format::Format;
pub use template::Templater;
pub use types::{ConfigPath, Platform, Source};
pub use value::{Mapping, Value};
