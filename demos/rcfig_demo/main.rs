//! # rcfig demo application
//!
//! A tiny tool that resolves its own configuration and prints it. It exists
//! to demonstrate and manually verify rcfig's layering.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example rcfig_demo -- show
//! cargo run --example rcfig_demo -- explain
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature             | How to exercise it                                              |
//! |---------------------|-----------------------------------------------------------------|
//! | Defaults            | `cargo run --example rcfig_demo -- show`                        |
//! | Config file         | `echo 'server: {port: 9000}' > .rcfigdemorc`, then `show`       |
//! | Env var override    | `RCFIGDEMO__SERVER__PORT=9999 cargo run --example rcfig_demo -- show` |
//! | Flag override       | `cargo run --example rcfig_demo -- show --server--port 7000`    |
//! | Explicit file       | `cargo run --example rcfig_demo -- show --config my.toml`       |
//! | Templates           | `cargo run --example rcfig_demo -- show --greeting 'hi ${USER}'` |
//! | Provenance          | `cargo run --example rcfig_demo -- explain`                     |
//! | Single key          | `cargo run --example rcfig_demo -- get server.port`             |

use std::process::ExitCode;

use serde_json::json;

use rcfig::{Rcfig, RcfigError, Value, explain};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RcfigError> {
    let mut loader = Rcfig::builder()
        .app_name("rcfigdemo")
        .defaults(json!({
            "greeting": "hello",
            "server": {"host": "127.0.0.1", "port": 8080},
            "display": {"color": "yellow"},
        }))
        .build()?;

    let positional = loader.positional().to_vec();
    match positional.first().map(String::as_str) {
        None | Some("show") => {
            let config = loader.to_object()?;
            println!("{}", Value::Mapping(config));
        }
        Some("explain") => {
            let explanation = loader.explain()?;
            let rows = explain::entries(&explanation);
            let width = rows.iter().map(|row| row.path.len()).max().unwrap_or(0);
            for row in rows {
                println!("{:width$}  {:<24}  {}", row.path, row.value.to_string(), row.source);
            }
        }
        Some("get") => {
            let key = positional.get(1).ok_or_else(|| {
                RcfigError::InvalidArgument("usage: rcfig_demo get <key>".into())
            })?;
            let config = Value::Mapping(loader.to_object()?);
            match config.pointer(key) {
                Some(value) => println!("{value}"),
                None => println!("{key} is not set"),
            }
        }
        Some("paths") => {
            for path in loader.config_paths()? {
                println!("{:>2}  {}", path.rank, path.path.display());
            }
        }
        Some(other) => {
            return Err(RcfigError::InvalidArgument(format!(
                "unknown command `{other}` (expected show, explain, get or paths)"
            )));
        }
    }
    Ok(())
}
