//! OpenAPI contract loading.
//!
//! The document is kept as a plain JSON value tree; operations and schemas are
//! interpreted lazily by the validator.

pub mod error;
pub(crate) mod path_template;
pub(crate) mod schema;

use error::Error;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Number, Value};
use std::{fs, path::Path};

lazy_static! {
    static ref SERVER_VARIABLE_REGEX: Regex = Regex::new(r"\{(?P<name>[^}]+)\}").unwrap();
    static ref SERVER_URL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^/]*(?P<path>/.*)?$").unwrap();
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SpecVersion {
    /// OpenAPI 3.0: JSON Schema draft 4 dialect plus `nullable`.
    V3_0,
    /// OpenAPI 3.1: JSON Schema 2020-12.
    V3_1,
}

#[derive(Debug, Clone)]
pub struct Contract {
    document: Value,
    version: SpecVersion,
    base_paths: Vec<String>,
}

impl Contract {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let document = yaml_to_json(serde_yaml::from_slice(bytes)?);
        let root = document.as_object().ok_or(Error::NotAMapping)?;

        // an unquoted `openapi: 3.0` arrives as a number
        let version = match root.get("openapi") {
            Some(Value::String(version)) => version.clone(),
            Some(Value::Number(version)) => version.to_string(),
            _ => return Err(Error::MissingVersion),
        };
        let version = if version.starts_with("3.0") {
            SpecVersion::V3_0
        } else if version.starts_with("3.1") {
            SpecVersion::V3_1
        } else {
            return Err(Error::UnsupportedVersion(version));
        };

        match root.get("paths") {
            None | Some(Value::Object(_)) => {}
            Some(_) => return Err(Error::InvalidPaths),
        }

        let base_paths = server_base_paths(root.get("servers"));

        Ok(Self {
            document,
            version,
            base_paths,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| crate::Error::ReadContract(path.into(), e))?;

        Self::parse(&contents).map_err(crate::Error::ParseContract)
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    /// Path prefixes taken from `servers`, without trailing slash, never `/` itself.
    pub fn base_paths(&self) -> &[String] {
        &self.base_paths
    }

    pub fn paths(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.document
            .get("paths")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|paths| paths.iter())
    }

    pub fn has_paths(&self) -> bool {
        self.paths().next().is_some()
    }

    /// Looks up a local reference such as `#/components/schemas/Pet`.
    pub fn lookup(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(&self.document);
        }

        self.document.pointer(pointer)
    }
}

fn server_base_paths(servers: Option<&Value>) -> Vec<String> {
    let mut base_paths: Vec<String> = Vec::new();

    for server in servers.and_then(Value::as_array).into_iter().flatten() {
        let url = match server.get("url").and_then(Value::as_str) {
            Some(url) => url,
            None => continue,
        };
        let variables = server.get("variables");
        let url = SERVER_VARIABLE_REGEX.replace_all(url, |captures: &Captures| {
            variables
                .and_then(|variables| variables.get(&captures["name"]))
                .and_then(|variable| variable.get("default"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        });

        let path = if let Some(captures) = SERVER_URL_REGEX.captures(&url) {
            captures
                .name("path")
                .map(|path| path.as_str().to_string())
                .unwrap_or_default()
        } else if url.starts_with('/') {
            url.to_string()
        } else {
            format!("/{}", url)
        };

        let path = path.trim_end_matches('/').to_string();
        if !path.is_empty() && !base_paths.contains(&path) {
            base_paths.push(path);
        }
    }

    base_paths
}

// YAML mapping keys may be integers (`200:`) or booleans; JSON keys are always strings.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => String::from("null"),
                    // complex keys have no meaning in an OpenAPI document
                    _ => continue,
                };
                object.insert(key, yaml_to_json(value));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}
