//! Reference resolution and JSON Schema compilation for contract schemas.

use super::{Contract, SpecVersion};
use crate::validator::AdvisoryWarning;
use serde_json::{json, Map, Value};
use std::{
    collections::{HashMap, HashSet},
    mem,
};

const MAX_DEPTH: usize = 64;

// keywords whose values are data, not schemas
const DATA_KEYWORDS: &[&str] = &[
    "default",
    "enum",
    "const",
    "example",
    "examples",
    "discriminator",
    "xml",
    "externalDocs",
];

// keywords whose values map arbitrary names to schemas
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Resolves local `$ref`s against a contract, collecting advisory warnings for
/// references that cannot be resolved.
pub struct SchemaResolver<'c> {
    contract: &'c Contract,
    warnings: Vec<AdvisoryWarning>,
    reported: HashSet<String>,
    active: Vec<String>,
    resolved: HashMap<String, Value>,
    cut_short: bool,
}

impl<'c> SchemaResolver<'c> {
    pub fn new(contract: &'c Contract) -> Self {
        Self {
            contract,
            warnings: Vec::new(),
            reported: HashSet::new(),
            active: Vec::new(),
            resolved: HashMap::new(),
            cut_short: false,
        }
    }

    pub fn warn<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        if self.reported.insert(message.clone()) {
            self.warnings.push(AdvisoryWarning::new(message));
        }
    }

    pub fn into_warnings(self) -> Vec<AdvisoryWarning> {
        self.warnings
    }

    /// Follows a chain of `$ref`s on a component object (parameter, response, ...).
    pub fn follow(&mut self, value: &'c Value) -> Option<&'c Value> {
        let contract = self.contract;
        let mut current = value;

        for _ in 0..MAX_DEPTH {
            match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => match contract.lookup(reference) {
                    Some(target) => current = target,
                    None => {
                        self.warn(format!("unresolved reference '{}'", reference));
                        return None;
                    }
                },
                None => return Some(current),
            }
        }

        self.warn("reference chain too deep");
        None
    }

    /// Inlines every `$ref` of a schema. Cycles and unresolvable references
    /// become the permissive schema `{}`.
    pub fn resolve_schema(&mut self, schema: &'c Value) -> Value {
        self.resolve(schema, 0)
    }

    fn resolve(&mut self, schema: &'c Value, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            self.cut_short = true;
            return json!({});
        }

        match schema {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    return self.resolve_reference(reference, depth);
                }

                let mut resolved = Map::new();
                for (key, value) in map {
                    let value = if DATA_KEYWORDS.contains(&key.as_str()) {
                        value.clone()
                    } else if SCHEMA_MAP_KEYWORDS.contains(&key.as_str()) {
                        self.resolve_map(value, depth)
                    } else {
                        self.resolve(value, depth + 1)
                    };
                    resolved.insert(key.clone(), value);
                }

                if self.contract.version() == SpecVersion::V3_0 {
                    if resolved.get("nullable") == Some(&Value::Bool(true)) {
                        resolved.remove("nullable");
                        return json!({ "anyOf": [Value::Object(resolved), { "type": "null" }] });
                    }
                    resolved.remove("nullable");
                }

                Value::Object(resolved)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item, depth + 1))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_map(&mut self, value: &'c Value, depth: usize) -> Value {
        match value {
            Value::Object(schemas) => Value::Object(
                schemas
                    .iter()
                    .map(|(name, schema)| (name.clone(), self.resolve(schema, depth + 1)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_reference(&mut self, reference: &str, depth: usize) -> Value {
        if self.active.iter().any(|active| active == reference) {
            self.cut_short = true;
            return json!({});
        }
        if let Some(resolved) = self.resolved.get(reference) {
            return resolved.clone();
        }

        let contract = self.contract;
        match contract.lookup(reference) {
            Some(target) => {
                let outer_cut_short = mem::replace(&mut self.cut_short, false);
                self.active.push(reference.to_string());
                let resolved = self.resolve(target, depth + 1);
                self.active.pop();

                // a result truncated by a cycle depends on where resolution started
                if !self.cut_short {
                    self.resolved
                        .insert(reference.to_string(), resolved.clone());
                }
                self.cut_short |= outer_cut_short;
                resolved
            }
            None => {
                self.warn(format!("unresolved reference '{}'", reference));
                json!({})
            }
        }
    }

    /// Resolves and compiles a schema in the dialect of the contract's version.
    pub fn compile(&mut self, schema: &'c Value, context: &str) -> Option<jsonschema::Validator> {
        let resolved = self.resolve_schema(schema);
        self.compile_resolved(&resolved, context)
    }

    pub fn compile_resolved(
        &mut self,
        resolved: &Value,
        context: &str,
    ) -> Option<jsonschema::Validator> {
        let compiled = match self.contract.version() {
            SpecVersion::V3_0 => jsonschema::draft4::new(resolved),
            SpecVersion::V3_1 => jsonschema::draft202012::new(resolved),
        };

        match compiled {
            Ok(validator) => Some(validator),
            Err(e) => {
                self.warn(format!("schema for {} does not compile: {}", context, e));
                None
            }
        }
    }
}
