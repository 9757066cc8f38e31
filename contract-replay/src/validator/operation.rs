//! Operations compiled out of a contract's `paths`.

use crate::contract::schema::SchemaResolver;
use serde_json::{Map, Value};
use std::fmt;

pub(crate) const METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
            ParameterLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// How a raw string parameter is turned into a JSON value before schema checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ValueType>),
    /// Parameters declared with `content` carry JSON.
    Json,
}

impl ValueType {
    pub fn from_schema(schema: &Value) -> Self {
        let declared = match schema.get("type") {
            Some(Value::String(name)) => Some(name.as_str()),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null"),
            _ => None,
        };

        match declared {
            Some("integer") => ValueType::Integer,
            Some("number") => ValueType::Number,
            Some("boolean") => ValueType::Boolean,
            Some("array") => ValueType::Array(Box::new(
                schema
                    .get("items")
                    .map(ValueType::from_schema)
                    .unwrap_or(ValueType::String),
            )),
            Some(_) => ValueType::String,
            None => ["anyOf", "oneOf", "allOf"]
                .iter()
                .filter_map(|keyword| schema.get(*keyword).and_then(Value::as_array))
                .flatten()
                .map(ValueType::from_schema)
                .find(|value_type| *value_type != ValueType::String)
                .unwrap_or(ValueType::String),
        }
    }
}

pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub explode: bool,
    pub value_type: ValueType,
    pub schema: Option<jsonschema::Validator>,
}

pub struct MediaType {
    pub name: String,
    pub schema: Option<jsonschema::Validator>,
}

pub struct RequestBody {
    pub required: bool,
    pub content: Vec<MediaType>,
}

pub struct HeaderSpec {
    pub name: String,
    pub required: bool,
    pub value_type: ValueType,
    pub schema: Option<jsonschema::Validator>,
}

pub struct ResponseSpec {
    pub headers: Vec<HeaderSpec>,
    pub content: Vec<MediaType>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StatusKey {
    Exact(u16),
    /// `4XX` is stored as `Range(4)`.
    Range(u16),
    Default,
}

impl StatusKey {
    fn parse(key: &str) -> Option<Self> {
        if key == "default" {
            return Some(StatusKey::Default);
        }
        let bytes = key.as_bytes();
        if bytes.len() == 3 && bytes[0].is_ascii_digit() && key[1..].eq_ignore_ascii_case("xx") {
            return Some(StatusKey::Range(u16::from(bytes[0] - b'0')));
        }
        key.parse().ok().map(StatusKey::Exact)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKey::Exact(code) => write!(f, "{}", code),
            StatusKey::Range(class) => write!(f, "{}XX", class),
            StatusKey::Default => write!(f, "default"),
        }
    }
}

pub struct Operation {
    pub method: String,
    pub template: String,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    pub responses: Vec<(StatusKey, ResponseSpec)>,
}

impl Operation {
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.template)
    }

    /// Exact code first, then its `NXX` range, then `default`.
    pub fn response_for(&self, status: u16) -> Option<&ResponseSpec> {
        let find = |wanted: StatusKey| {
            self.responses
                .iter()
                .find(|(key, _)| *key == wanted)
                .map(|(_, response)| response)
        };

        find(StatusKey::Exact(status))
            .or_else(|| find(StatusKey::Range(status / 100)))
            .or_else(|| find(StatusKey::Default))
    }

    pub fn defined_statuses(&self) -> String {
        self.responses
            .iter()
            .map(|(key, _)| key.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) struct OperationCompiler<'r, 'c> {
    resolver: &'r mut SchemaResolver<'c>,
}

impl<'r, 'c> OperationCompiler<'r, 'c> {
    pub fn new(resolver: &'r mut SchemaResolver<'c>) -> Self {
        Self { resolver }
    }

    pub fn compile_path_item(&mut self, template: &str, path_item: &'c Value) -> Vec<Operation> {
        let path_item = match self.resolver.follow(path_item) {
            Some(Value::Object(path_item)) => path_item,
            Some(_) => {
                self.resolver
                    .warn(format!("path item '{}' is not a mapping", template));
                return Vec::new();
            }
            None => return Vec::new(),
        };
        let shared_parameters = path_item.get("parameters");

        METHODS
            .iter()
            .filter_map(|method| {
                path_item
                    .get(*method)
                    .map(|operation| (method.to_ascii_uppercase(), operation))
            })
            .filter_map(|(method, operation)| match operation {
                Value::Object(operation) => {
                    Some(self.compile_operation(method, template, shared_parameters, operation))
                }
                _ => {
                    self.resolver
                        .warn(format!("operation {} {} is not a mapping", method, template));
                    None
                }
            })
            .collect()
    }

    fn compile_operation(
        &mut self,
        method: String,
        template: &str,
        shared_parameters: Option<&'c Value>,
        operation: &'c Map<String, Value>,
    ) -> Operation {
        let label = format!("{} {}", method, template);

        let mut parameters: Vec<Parameter> = Vec::new();
        let sources = [shared_parameters, operation.get("parameters")];
        for source in sources
            .iter()
            .copied()
            .flatten()
            .filter_map(Value::as_array)
        {
            for parameter in source {
                if let Some(parameter) = self.compile_parameter(&label, parameter) {
                    // operation-level definitions override path-level ones
                    parameters.retain(|existing| {
                        existing.name != parameter.name || existing.location != parameter.location
                    });
                    parameters.push(parameter);
                }
            }
        }

        let request_body = operation
            .get("requestBody")
            .and_then(|request_body| self.compile_request_body(&label, request_body));

        let mut responses = Vec::new();
        if let Some(Value::Object(declared)) = operation.get("responses") {
            for (key, response) in declared {
                match StatusKey::parse(key) {
                    Some(status) => {
                        if let Some(response) = self.compile_response(&label, key, response) {
                            responses.push((status, response));
                        }
                    }
                    None => self
                        .resolver
                        .warn(format!("{}: '{}' is not a response status", label, key)),
                }
            }
        }

        Operation {
            method,
            template: template.to_string(),
            parameters,
            request_body,
            responses,
        }
    }

    fn compile_parameter(&mut self, label: &str, parameter: &'c Value) -> Option<Parameter> {
        let parameter = self.resolver.follow(parameter)?;
        let name = parameter.get("name").and_then(Value::as_str);
        let location = parameter
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse);

        let (name, location) = match (name, location) {
            (Some(name), Some(location)) => (name.to_string(), location),
            _ => {
                self.resolver
                    .warn(format!("{}: parameter without a valid 'name' and 'in'", label));
                return None;
            }
        };

        let required = location == ParameterLocation::Path
            || parameter
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);
        let explode = parameter
            .get("explode")
            .and_then(Value::as_bool)
            .unwrap_or_else(|| {
                let style = parameter.get("style").and_then(Value::as_str);
                match style {
                    Some(style) => style == "form",
                    None => matches!(
                        location,
                        ParameterLocation::Query | ParameterLocation::Cookie
                    ),
                }
            });

        let context = format!("{} parameter '{}' of {}", location, name, label);
        let (value_type, schema) = if let Some(schema) = parameter.get("schema") {
            let resolved = self.resolver.resolve_schema(schema);
            (
                ValueType::from_schema(&resolved),
                self.resolver.compile_resolved(&resolved, &context),
            )
        } else if let Some(schema) = parameter
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.values().next())
            .and_then(|media_type| media_type.get("schema"))
        {
            (ValueType::Json, self.resolver.compile(schema, &context))
        } else {
            (ValueType::String, None)
        };

        Some(Parameter {
            name,
            location,
            required,
            explode,
            value_type,
            schema,
        })
    }

    fn compile_request_body(&mut self, label: &str, request_body: &'c Value) -> Option<RequestBody> {
        let request_body = self.resolver.follow(request_body)?;
        let required = request_body
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let content = self.compile_content(&format!("request body of {}", label), request_body);

        Some(RequestBody { required, content })
    }

    fn compile_response(&mut self, label: &str, key: &str, response: &'c Value) -> Option<ResponseSpec> {
        let response = self.resolver.follow(response)?;
        let context = format!("{} response of {}", key, label);

        let mut headers = Vec::new();
        if let Some(Value::Object(declared)) = response.get("headers") {
            for (name, header) in declared {
                // Content-Type is described by `content`, never by a header object
                if name.eq_ignore_ascii_case("content-type") {
                    continue;
                }
                let header = match self.resolver.follow(header) {
                    Some(header) => header,
                    None => continue,
                };
                let required = header
                    .get("required")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let (value_type, schema) = match header.get("schema") {
                    Some(schema) => {
                        let resolved = self.resolver.resolve_schema(schema);
                        (
                            ValueType::from_schema(&resolved),
                            self.resolver.compile_resolved(
                                &resolved,
                                &format!("header '{}' of {}", name, context),
                            ),
                        )
                    }
                    None => (ValueType::String, None),
                };
                headers.push(HeaderSpec {
                    name: name.clone(),
                    required,
                    value_type,
                    schema,
                });
            }
        }

        let content = self.compile_content(&context, response);

        Some(ResponseSpec { headers, content })
    }

    fn compile_content(&mut self, context: &str, owner: &'c Value) -> Vec<MediaType> {
        let mut content = Vec::new();

        if let Some(Value::Object(declared)) = owner.get("content") {
            for (name, media_type) in declared {
                let schema = media_type.get("schema").and_then(|schema| {
                    self.resolver
                        .compile(schema, &format!("{} ({})", context, name))
                });
                content.push(MediaType {
                    name: name
                        .split(';')
                        .next()
                        .unwrap_or("")
                        .trim()
                        .to_ascii_lowercase(),
                    schema,
                });
            }
        }

        content
    }
}
