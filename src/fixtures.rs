#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::value::{Mapping, Value};

    /// Build a `Mapping` from a `json!` object literal.
    pub fn mapping(json: serde_json::Value) -> Mapping {
        match Value::from(json) {
            Value::Mapping(map) => map,
            other => panic!("expected a JSON object, got {other:?}"),
        }
    }

    pub fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    /// Log output collected by [`capture_logs`].
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run `f` with every `tracing` event down to DEBUG rendered as plain
    /// text, one line per event, and return its result alongside the text.
    pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let text = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        (result, text)
    }

    /// A throwaway filesystem laid out like a user's machine:
    ///
    /// ```text
    /// {root}/home/user                           <- HOME
    /// {root}/home/user/developer/project/dist    <- cwd
    /// ```
    pub struct Sandbox {
        pub dir: TempDir,
    }

    impl Sandbox {
        pub fn new() -> Self {
            let sandbox = Sandbox {
                dir: TempDir::new().unwrap(),
            };
            fs::create_dir_all(sandbox.cwd()).unwrap();
            sandbox
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        pub fn home(&self) -> PathBuf {
            self.root().join("home").join("user")
        }

        pub fn cwd(&self) -> PathBuf {
            self.home().join("developer").join("project").join("dist")
        }

        /// Write `content` to `rel` (relative to the sandbox root), creating
        /// parent directories. Returns the absolute path.
        pub fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.root().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        /// An environment snapshot whose `HOME` points into the sandbox.
        pub fn env(&self, pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
            let mut vars = env(pairs);
            vars.insert("HOME".into(), self.home().to_string_lossy().into_owned());
            vars
        }
    }

    #[test]
    fn sandbox_creates_cwd_under_home() {
        let sandbox = Sandbox::new();
        assert!(sandbox.cwd().is_dir());
        assert!(sandbox.cwd().starts_with(sandbox.home()));
    }

    #[test]
    fn capture_logs_collects_events() {
        let (value, logs) = capture_logs(|| {
            tracing::warn!(path = "a/b", "something odd");
            7
        });
        assert_eq!(value, 7);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("something odd"));
        assert!(logs.contains("a/b"));
    }

    #[test]
    fn sandbox_env_sets_home() {
        let sandbox = Sandbox::new();
        let vars = sandbox.env(&[("APP__X", "1")]);
        assert_eq!(vars["APP__X"], "1");
        assert_eq!(PathBuf::from(&vars["HOME"]), sandbox.home());
    }
}
