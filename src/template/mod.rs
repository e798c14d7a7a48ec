//! Template discovery and rendering.
//!
//! Every `.tmpl` resource under a [`TemplateRoot`] is parsed into one shared
//! minijinja environment, so templates can include each other regardless of
//! the order they were found in. Each renderable resource is then rendered
//! with the caller's configuration value and written below the destination
//! directory under its output name.
//!
//! Naming conventions:
//! - the `.tmpl` suffix is stripped: `src/main.rs.tmpl` -> `src/main.rs`
//! - a path segment starting with `!` starts with a dot instead:
//!   `!gitignore.tmpl` -> `.gitignore`
//! - a file starting with `$` is private: `$license.tmpl` is only available
//!   through `{% include "$license" %}` and is never written on its own.

use std::fs;
use std::path::{Path, PathBuf};

use cruet::Inflector;
use log::{debug, info, warn};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

use crate::error::{Error, FormatFailure, Result};

pub mod builtin;
pub mod format;
pub mod root;

pub use format::{ExternalFormatter, Formatters, JsonFormatter, SourceFormatter};
pub use root::{DirectoryRoot, Entry, MemoryRoot, TemplateRoot};

/// Suffix marking a file as a template resource.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Leading character of a path segment that becomes a literal dot.
pub const HIDDEN_MARKER: char = '!';

/// Leading character of a file that is only available for inclusion.
pub const PRIVATE_MARKER: char = '$';

/// Checks whether `path` names a template resource.
pub fn is_template(path: &str) -> bool {
    file_name(path).len() > TEMPLATE_SUFFIX.len() && path.ends_with(TEMPLATE_SUFFIX)
}

/// Checks whether the resource at `path` is private to other templates.
pub fn is_private(path: &str) -> bool {
    file_name(path).starts_with(PRIVATE_MARKER)
}

/// Computes the output name of the resource at `path`.
pub fn output_name(path: &str) -> String {
    path.strip_suffix(TEMPLATE_SUFFIX)
        .unwrap_or(path)
        .split('/')
        .map(|segment| match segment.strip_prefix(HIDDEN_MARKER) {
            Some(rest) => format!(".{rest}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.add_filter("snake_case", |value: String| value.to_snake_case());
    env.add_filter("kebab_case", |value: String| value.to_kebab_case());
    env.add_filter("pascal_case", |value: String| value.to_pascal_case());
    env
}

/// Recursively collects file paths below `dir` in lexicographic order.
fn walk(root: &dyn TemplateRoot, dir: &str, files: &mut Vec<String>) -> Result<()> {
    let mut entries = root.list(dir)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    for entry in entries {
        let path = if dir.is_empty() {
            entry.name
        } else {
            format!("{dir}/{}", entry.name)
        };
        if entry.is_dir {
            walk(root, &path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// All templates discovered under one template root.
#[derive(Debug)]
pub struct TemplateSet {
    env: Environment<'static>,
    renderable: Vec<String>,
}

impl TemplateSet {
    /// Walks `root` and parses every template resource into one namespace.
    ///
    /// Fails on the first resource that cannot be read or parsed; nothing is
    /// returned for a partially loaded root.
    pub fn discover(root: &dyn TemplateRoot) -> Result<Self> {
        let mut files = Vec::new();
        walk(root, "", &mut files)?;

        let mut env = environment();
        let mut renderable: Vec<String> = Vec::new();
        for path in files.iter().filter(|path| is_template(path)) {
            let name = output_name(path);
            let bytes = root.read(path)?;
            let source = String::from_utf8(bytes).map_err(|_| Error::TemplateRootError {
                path: path.clone(),
                reason: "template is not valid UTF-8".to_string(),
            })?;

            debug!("Parsing template {}", path);
            env.add_template_owned(name.clone(), source)
                .map_err(|source| Error::TemplateParseError {
                    name: path.clone(),
                    source,
                })?;

            if is_private(path) {
                continue;
            }
            if renderable.contains(&name) {
                warn!(
                    "Template {} overrides an earlier template named '{}'",
                    path, name
                );
            } else {
                renderable.push(name);
            }
        }

        Ok(Self { env, renderable })
    }

    /// Output names of the templates that are written on their own, in
    /// discovery order.
    pub fn renderable(&self) -> &[String] {
        &self.renderable
    }

    /// Checks whether a template, private or not, was discovered as `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Renders the template `name` into `buf`.
    pub fn render<S: Serialize>(&self, name: &str, config: &S, buf: &mut Vec<u8>) -> Result<()> {
        let render_error = |source: minijinja::Error| Error::TemplateRenderError {
            name: name.to_string(),
            source,
        };
        let template = self.env.get_template(name).map_err(render_error)?;
        template.render_to_write(config, &mut *buf).map_err(render_error)?;
        Ok(())
    }

    /// Renders every renderable template below `dest`.
    ///
    /// The first render or I/O failure stops the run; files written before it
    /// stay on disk. Formatting failures do not stop the run: the unformatted
    /// file is written and all such failures are returned together at the end.
    pub fn execute<S: Serialize>(
        &self,
        dest: &Path,
        config: &S,
        formatters: &Formatters,
    ) -> Result<()> {
        let mut buf = Vec::with_capacity(8192);
        let mut failures = Vec::new();

        for name in &self.renderable {
            buf.clear();
            self.render(name, config, &mut buf)?;

            let target = destination(dest, name);
            let formatted = match formatters.for_name(name) {
                Some(formatter) => match formatter.format(&buf) {
                    Ok(formatted) => Some(formatted),
                    Err(e) => {
                        warn!("Failed to format {}: {}", target.display(), e);
                        failures.push(FormatFailure {
                            path: target.clone(),
                            reason: e.to_string(),
                        });
                        None
                    }
                },
                None => None,
            };

            write_file(&target, formatted.as_deref().unwrap_or(&buf))?;
            info!("Generated {}", target.display());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::FormatError(failures))
        }
    }
}

/// Maps an output name onto the host path below `dest`.
pub fn destination(dest: &Path, name: &str) -> PathBuf {
    name.split('/')
        .fold(dest.to_path_buf(), |acc, segment| acc.join(segment))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::CreateDirError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| Error::WriteFileError {
        path: path.to_path_buf(),
        source,
    })
}

/// Discovers the templates under `root` and renders them into `dest`.
pub fn execute_templates<S: Serialize>(
    root: &dyn TemplateRoot,
    dest: &Path,
    config: &S,
    formatters: &Formatters,
) -> Result<()> {
    let templates = TemplateSet::discover(root)?;
    templates.execute(dest, config, formatters)
}
