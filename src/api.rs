//! OpenAPI description kept alongside the project configuration.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};

/// Name of the API description file.
pub const API_FILE: &str = "openapi.json";

const OPENAPI_VERSION: &str = "3.0.3";

/// Path item extension naming the controller that serves the path.
pub const CONTROLLER_KEY: &str = "x-controller";

/// An OpenAPI-shaped JSON document. Only the fields mirrored from the project
/// configuration are touched; everything else is preserved as-is, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiDocument {
    fields: IndexMap<String, Value>,
}

impl ApiDocument {
    /// Loads the document at `path`. A missing file yields an empty document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "{} does not exist, starting with an empty document",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(Error::IoError)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("invalid {}: {}", path.display(), e)))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        std::fs::write(path.as_ref(), content).map_err(Error::IoError)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Mirrors the configuration's title, description, contact, version and
    /// controllers into the document.
    ///
    /// Path items owned by a controller follow the controller list: items of
    /// removed or moved controllers are dropped. Path items without a
    /// controller are left alone.
    pub fn sync(&mut self, config: &Config) {
        self.fields
            .entry("openapi".to_string())
            .or_insert_with(|| Value::String(OPENAPI_VERSION.to_string()));

        update_object(&mut self.fields, "info", |info| {
            info.insert("title".to_string(), json!(config.name));
            info.insert("description".to_string(), json!(config.description));
            info.insert(
                "contact".to_string(),
                json!({
                    "name": config.maintainer.name,
                    "email": config.maintainer.email,
                    "url": config.url,
                }),
            );
            info.insert("version".to_string(), json!(config.version.to_string()));
        });

        update_object(&mut self.fields, "paths", |paths| {
            paths.retain(|path, item| keeps_path_item(config, path, item));

            for controller in &config.controllers {
                let item = paths.entry(controller.path.clone()).or_insert(Value::Null);
                let mut operations = into_object(item.take());
                operations.insert(CONTROLLER_KEY.to_string(), json!(controller.name));
                *item = Value::Object(operations);
            }
        });
    }
}

/// Whether a path item survives a sync: it has no controller, or its
/// controller is still configured at that path.
fn keeps_path_item(config: &Config, path: &str, item: &Value) -> bool {
    match item.get(CONTROLLER_KEY).and_then(Value::as_str) {
        Some(name) => config
            .controllers
            .iter()
            .any(|c| c.path == path && c.name == name),
        None => true,
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Applies `f` to the object stored under `key`. A missing or non-object
/// value is replaced by an empty object; the key keeps its position.
fn update_object<F>(fields: &mut IndexMap<String, Value>, key: &str, f: F)
where
    F: FnOnce(&mut Map<String, Value>),
{
    let slot = fields.entry(key.to_string()).or_insert(Value::Null);
    let mut map = into_object(slot.take());
    f(&mut map);
    *slot = Value::Object(map);
}

/// The project configuration together with its API description.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
    pub config: Config,
    pub api: ApiDocument,
}

impl Project {
    /// Loads both documents from the project directory `root`.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = Config::load(root.join(CONFIG_FILE))?;
        let api = ApiDocument::load(root.join(API_FILE))?;
        Ok(Self { root, config, api })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Syncs the API description with the configuration and saves both.
    pub fn save(&mut self) -> Result<()> {
        self.api.sync(&self.config);
        self.config.save(self.root.join(CONFIG_FILE))?;
        self.api.save(self.root.join(API_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Maintainer, Version};

    #[test]
    fn test_sync_preserves_unrelated_fields() {
        let mut api: ApiDocument = serde_json::from_value(json!({
            "openapi": "3.1.0",
            "info": {"title": "old", "x-logo": "logo.png"},
            "paths": {"/health": {}},
        }))
        .unwrap();

        let mut config = Config {
            name: "petstore".to_string(),
            description: "Pets".to_string(),
            maintainer: Maintainer {
                name: "Ann".to_string(),
                email: "ann@example.com".to_string(),
            },
            url: "https://example.com".to_string(),
            version: Version::new(1, 2, 3),
            ..Config::default()
        };
        config.add_controller("pets", "/pets");
        api.sync(&config);

        assert_eq!(api.get("openapi"), Some(&json!("3.1.0")));
        let info = api.get("info").unwrap();
        assert_eq!(info["title"], "petstore");
        assert_eq!(info["x-logo"], "logo.png");
        assert_eq!(info["version"], "1.2.3");
        assert_eq!(info["contact"]["email"], "ann@example.com");
        let paths = api.get("paths").unwrap();
        assert!(paths.get("/health").is_some());
        assert_eq!(paths["/pets"]["x-controller"], "pets");
    }

    #[test]
    fn test_sync_fills_empty_document() {
        let mut api = ApiDocument::default();
        api.sync(&Config::default());
        assert_eq!(api.get("openapi"), Some(&json!(OPENAPI_VERSION)));
        assert_eq!(api.get("info").unwrap()["version"], "0.0.0");
    }

    #[test]
    fn test_sync_follows_controller_changes() {
        let mut api = ApiDocument::default();
        let mut config = Config::default();
        config.add_controller("pets", "/pets");
        config.add_controller("users", "/users");
        api.sync(&config);

        config.remove_controller("users");
        config.add_controller("pets", "/v2/pets");
        api.sync(&config);

        let paths = api.get("paths").unwrap().as_object().unwrap();
        assert_eq!(paths.keys().collect::<Vec<_>>(), vec!["/v2/pets"]);
        assert_eq!(paths["/v2/pets"]["x-controller"], "pets");
    }

    #[test]
    fn test_sync_reassigns_paths() {
        let mut api: ApiDocument = serde_json::from_value(json!({
            "paths": {
                "/pets": {"get": {"summary": "List pets"}},
                "/users": {"x-controller": "accounts"},
                "/health": {"get": {}},
            },
        }))
        .unwrap();

        let mut config = Config::default();
        config.add_controller("pets", "/pets");
        config.add_controller("users", "/users");
        api.sync(&config);

        let paths = api.get("paths").unwrap();
        assert_eq!(paths["/pets"]["x-controller"], "pets");
        assert_eq!(paths["/pets"]["get"]["summary"], "List pets");
        assert_eq!(paths["/users"]["x-controller"], "users");
        assert!(paths.get("/health").is_some());
    }
}
