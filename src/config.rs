//! Project configuration.
//! Loaded from and saved to `waffle.json` in the project root. Every field is
//! optional in the file; missing ones take their defaults.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "waffle.json";

/// A `major.minor.patch` version, ordered numerically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Version::default()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)$").expect("version pattern is valid")
    })
}

impl FromStr for Version {
    type Err = Error;

    /// Parses `1.2.3`, also accepting the `v1.2.3` form used by git tags.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::VersionError(s.to_string());
        let captures = version_pattern().captures(s.trim()).ok_or_else(invalid)?;
        let part = |i: usize| captures[i].parse::<u64>().map_err(|_| invalid());
        Ok(Version {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
}

/// A server controller mounted at a path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub description: String,
    pub maintainer: Maintainer,
    /// Project webpage.
    pub url: String,
    /// Module path, e.g. `github.com/owner/project`.
    pub module: String,
    pub version: Version,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub controllers: Vec<Controller>,
}

impl Config {
    /// Loads the configuration file at `path`.
    ///
    /// A missing file is not an error: the defaults are returned, with the
    /// project named after the directory containing `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            debug!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path).map_err(Error::IoError)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::ConfigError(format!("invalid {}: {}", path.display(), e)))?
        } else {
            debug!("{} does not exist, using defaults", path.display());
            Config::default()
        };

        if config.name.is_empty() {
            config.name = default_name(path);
        }
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path.as_ref(), content).map_err(Error::IoError)
    }

    /// Adds a controller, replacing one with the same name.
    pub fn add_controller(&mut self, name: &str, path: &str) {
        let controller = Controller {
            name: name.to_string(),
            path: path.to_string(),
        };
        match self.controllers.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = controller,
            None => self.controllers.push(controller),
        }
    }

    /// Removes a controller, reporting whether it existed.
    pub fn remove_controller(&mut self, name: &str) -> bool {
        let before = self.controllers.len();
        self.controllers.retain(|c| c.name != name);
        self.controllers.len() != before
    }
}

/// Name of the directory holding `path`, falling back to the current
/// directory.
fn default_name(path: &Path) -> String {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.canonicalize().ok(),
        _ => std::env::current_dir().ok(),
    };
    dir.as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
