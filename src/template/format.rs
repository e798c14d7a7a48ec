//! Language-aware post-processing of rendered files.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// Reformats the rendered source of one file.
pub trait SourceFormatter {
    fn format(&self, source: &[u8]) -> Result<Vec<u8>>;
}

/// Pipes source through an external program on stdin and takes its stdout.
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    program: String,
    args: Vec<String>,
}

impl ExternalFormatter {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rustfmt() -> Self {
        Self::new("rustfmt", ["--emit", "stdout", "--edition", "2021"])
    }

    pub fn gofmt() -> Self {
        Self::new("gofmt", Vec::<String>::new())
    }
}

impl SourceFormatter for ExternalFormatter {
    fn format(&self, source: &[u8]) -> Result<Vec<u8>> {
        debug!("Running {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::FormatterError(format!("failed to run {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source).map_err(Error::IoError)?;
        }

        let output = child.wait_with_output().map_err(Error::IoError)?;
        if !output.status.success() {
            return Err(Error::FormatterError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Pretty-prints JSON documents, keeping key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl SourceFormatter for JsonFormatter {
    fn format(&self, source: &[u8]) -> Result<Vec<u8>> {
        let value: serde_json::Value = serde_json::from_slice(source)
            .map_err(|e| Error::FormatterError(format!("invalid JSON: {e}")))?;
        let mut formatted = serde_json::to_vec_pretty(&value)?;
        formatted.push(b'\n');
        Ok(formatted)
    }
}

/// Formatters keyed by the file extension they apply to.
pub struct Formatters {
    by_extension: HashMap<String, Box<dyn SourceFormatter>>,
}

impl Formatters {
    /// A registry that leaves every file untouched.
    pub fn none() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, extension: impl Into<String>, formatter: F) -> &mut Self
    where
        F: SourceFormatter + 'static,
    {
        self.by_extension.insert(extension.into(), Box::new(formatter));
        self
    }

    pub fn with<F>(mut self, extension: impl Into<String>, formatter: F) -> Self
    where
        F: SourceFormatter + 'static,
    {
        self.register(extension, formatter);
        self
    }

    /// Formatter for the file named `name`, chosen by its extension.
    pub fn for_name(&self, name: &str) -> Option<&dyn SourceFormatter> {
        let extension = Path::new(name).extension()?.to_str()?;
        self.by_extension.get(extension).map(|f| f.as_ref())
    }
}

impl Default for Formatters {
    fn default() -> Self {
        Formatters::none()
            .with("rs", ExternalFormatter::rustfmt())
            .with("go", ExternalFormatter::gofmt())
            .with("json", JsonFormatter)
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<_> = self.by_extension.keys().collect();
        extensions.sort();
        f.debug_struct("Formatters")
            .field("extensions", &extensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_extension() {
        let formatters = Formatters::default();
        assert!(formatters.for_name("src/main.rs").is_some());
        assert!(formatters.for_name("main.go").is_some());
        assert!(formatters.for_name("openapi.json").is_some());
        assert!(formatters.for_name("README.md").is_none());
        assert!(formatters.for_name(".gitignore").is_none());
        assert!(Formatters::none().for_name("main.rs").is_none());
    }

    #[test]
    fn test_json_formatter_keeps_key_order() {
        let formatted = JsonFormatter.format(br#"{"b":1,"a":[true]}"#).unwrap();
        assert_eq!(
            String::from_utf8(formatted).unwrap(),
            "{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}\n"
        );
        assert!(JsonFormatter.format(b"{not json").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_external_formatter_returns_program_output() {
        let formatter = ExternalFormatter::new("tr", ["a-z", "A-Z"]);
        let formatted = formatter.format(b"package main\n").unwrap();
        assert_eq!(formatted, b"PACKAGE MAIN\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_formatter_failure_carries_stderr() {
        let formatter = ExternalFormatter::new(
            "sh",
            ["-c", "cat >/dev/null; echo 'bad input' >&2; exit 3"],
        );
        match formatter.format(b"package main") {
            Err(Error::FormatterError(msg)) => {
                assert!(msg.contains("bad input"), "{msg}");
                assert!(msg.starts_with("sh exited with"), "{msg}");
            }
            other => panic!("Expected FormatterError, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_formatter_error() {
        let formatter = ExternalFormatter::new("waffle-no-such-formatter", ["-q"]);
        match formatter.format(b"package main") {
            Err(Error::FormatterError(msg)) => assert!(msg.contains("waffle-no-such-formatter")),
            other => panic!("Expected FormatterError, got {other:?}"),
        }
    }
}
