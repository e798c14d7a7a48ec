//! Virtual template roots.
//!
//! The pipeline only needs to list directories and read files, so any
//! backing (a directory on disk, a compiled-in bundle, a test fixture) works
//! as long as it implements [`TemplateRoot`]. Paths are always `/`-separated
//! and relative to the root; the root itself is `""`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Capability interface over a tree of template resources.
pub trait TemplateRoot {
    /// Lists the direct entries of the directory at `path`.
    fn list(&self, path: &str) -> Result<Vec<Entry>>;

    /// Returns the exact bytes of the file at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

fn root_error(path: &str, reason: impl ToString) -> Error {
    Error::TemplateRootError {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Template root backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryRoot {
    root: PathBuf,
}

impl DirectoryRoot {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

impl TemplateRoot for DirectoryRoot {
    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let dir = self.resolve(path);
        let mut entries = Vec::new();
        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| root_error(path, e))?;
            let name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| root_error(path, "entry name is not valid UTF-8"))?
                .to_string();
            entries.push(Entry {
                name,
                is_dir: entry.file_type().is_dir(),
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        fs::read(self.resolve(path)).map_err(|e| root_error(path, e))
    }
}

/// Template root held entirely in memory, keyed by file path.
///
/// Directories are implied by the file paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoot {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> &mut Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn with(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: Into<String>, C: Into<Vec<u8>>> FromIterator<(P, C)> for MemoryRoot {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut root = MemoryRoot::new();
        for (path, contents) in iter {
            root.insert(path, contents);
        }
        root
    }
}

impl TemplateRoot for MemoryRoot {
    fn list(&self, path: &str) -> Result<Vec<Entry>> {
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut entries: BTreeMap<&str, bool> = BTreeMap::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    entries.insert(dir, true);
                }
                None => {
                    entries.entry(rest).or_insert(false);
                }
            }
        }

        if entries.is_empty() && !path.is_empty() {
            return Err(root_error(path, "no such directory"));
        }
        Ok(entries
            .into_iter()
            .map(|(name, is_dir)| Entry {
                name: name.to_string(),
                is_dir,
            })
            .collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| root_error(path, "no such file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_root_lists_implied_directories() {
        let root = MemoryRoot::new()
            .with("b.txt", "b")
            .with("src/main.rs.tmpl", "main")
            .with("src/bin/tool.rs.tmpl", "tool")
            .with("a.txt", "a");

        assert_eq!(
            root.list("").unwrap(),
            vec![Entry::file("a.txt"), Entry::file("b.txt"), Entry::dir("src")]
        );
        assert_eq!(
            root.list("src").unwrap(),
            vec![Entry::dir("bin"), Entry::file("main.rs.tmpl")]
        );
        assert_eq!(root.read("src/bin/tool.rs.tmpl").unwrap(), b"tool");
        assert!(root.list("missing").is_err());
        assert!(root.read("missing.tmpl").is_err());
    }
}
