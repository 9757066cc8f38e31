//! Contract conformance checks for rebuilt HTTP messages.

mod operation;
mod params;
mod request;
mod response;

use crate::{
    contract::{path_template::PathTemplate, schema::SchemaResolver, Contract},
    error::Error,
    message::{SyntheticRequest, SyntheticResponse},
    util,
};
use operation::{MediaType, Operation, OperationCompiler};
use serde_json::Value;
use std::fmt::{self, Display};

pub use operation::ParameterLocation;

/// Checks rebuilt messages against a contract.
pub trait Validator {
    fn validate_request(&self, request: &SyntheticRequest) -> Vec<ConformanceError>;
    fn validate_response(
        &self,
        request: &SyntheticRequest,
        response: &SyntheticResponse<'_>,
    ) -> Vec<ConformanceError>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    PathNotFound,
    OperationNotFound,
    MissingParameter,
    InvalidParameter,
    MissingRequestBody,
    UnsupportedMediaType,
    InvalidJson,
    SchemaViolation,
    UndefinedStatus,
    MissingHeader,
    InvalidHeader,
}

/// One violation of the contract by a request or a response.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConformanceError {
    pub kind: ErrorKind,
    pub message: String,
    pub reason: String,
}

impl ConformanceError {
    pub fn new<M: Into<String>, R: Into<String>>(kind: ErrorKind, message: M, reason: R) -> Self {
        Self {
            kind,
            message: message.into(),
            reason: reason.into(),
        }
    }
}

impl Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.message, self.reason)
        }
    }
}

/// A non-fatal problem found while compiling the contract.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AdvisoryWarning {
    pub message: String,
}

impl AdvisoryWarning {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for AdvisoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

struct Route {
    template: PathTemplate,
    operations: Vec<Operation>,
}

/// The contract compiled once into path matchers and JSON Schema validators.
pub struct ContractValidator {
    routes: Vec<Route>,
    base_paths: Vec<String>,
}

impl ContractValidator {
    pub fn build(contract: &Contract) -> Result<(Self, Vec<AdvisoryWarning>), Error> {
        let mut resolver = SchemaResolver::new(contract);
        let mut routes = Vec::new();

        for (template, path_item) in contract.paths() {
            let path_template = match PathTemplate::compile(template) {
                Ok(path_template) => path_template,
                Err(e) => {
                    resolver.warn(format!("path '{}' cannot be matched: {}", template, e));
                    continue;
                }
            };
            let operations = OperationCompiler::new(&mut resolver).compile_path_item(template, path_item);
            routes.push(Route {
                template: path_template,
                operations,
            });
        }

        if contract.has_paths() && routes.is_empty() {
            return Err(Error::BuildValidator(
                "none of the contract's paths could be compiled".into(),
            ));
        }

        // literal paths win over templated ones
        routes.sort_by_key(|route| route.template.parameter_count());

        let validator = Self {
            routes,
            base_paths: contract.base_paths().to_vec(),
        };

        Ok((validator, resolver.into_warnings()))
    }

    fn candidate_paths<'p>(&self, path: &'p str) -> Vec<&'p str> {
        let mut candidates = vec![path];

        for base_path in &self.base_paths {
            if path == base_path {
                candidates.push("/");
            } else if let Some(rest) = path.strip_prefix(base_path.as_str()) {
                if rest.starts_with('/') {
                    candidates.push(rest);
                }
            }
        }

        candidates
    }

    fn find_operation(
        &self,
        request: &SyntheticRequest,
    ) -> Result<(&Operation, Vec<(String, String)>), ConformanceError> {
        let path = request.uri().path();
        let method = request.method().as_str();
        let mut path_found = false;

        for candidate in self.candidate_paths(path) {
            for route in &self.routes {
                if let Some(path_values) = route.template.matches(candidate) {
                    path_found = true;
                    if let Some(operation) = route
                        .operations
                        .iter()
                        .find(|operation| operation.method.eq_ignore_ascii_case(method))
                    {
                        return Ok((operation, path_values));
                    }
                }
            }
        }

        if path_found {
            Err(ConformanceError::new(
                ErrorKind::OperationNotFound,
                format!("{} operation is not defined for path '{}'", method, path),
                "",
            ))
        } else {
            Err(ConformanceError::new(
                ErrorKind::PathNotFound,
                format!("{} {}: path is not defined by the contract", method, path),
                "",
            ))
        }
    }
}

impl Validator for ContractValidator {
    fn validate_request(&self, request: &SyntheticRequest) -> Vec<ConformanceError> {
        match self.find_operation(request) {
            Ok((operation, path_values)) => request::validate(operation, &path_values, request),
            Err(e) => vec![e],
        }
    }

    fn validate_response(
        &self,
        request: &SyntheticRequest,
        response: &SyntheticResponse<'_>,
    ) -> Vec<ConformanceError> {
        match self.find_operation(request) {
            Ok((operation, _)) => response::validate(operation, response),
            Err(e) => vec![e],
        }
    }
}

impl fmt::Debug for ContractValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractValidator")
            .field(
                "routes",
                &self
                    .routes
                    .iter()
                    .map(|route| route.template.template())
                    .collect::<Vec<_>>(),
            )
            .field("base_paths", &self.base_paths)
            .finish()
    }
}

pub(crate) fn schema_violations(
    schema: &jsonschema::Validator,
    instance: &Value,
    kind: ErrorKind,
    message: &str,
) -> Vec<ConformanceError> {
    schema
        .iter_errors(instance)
        .map(|e| {
            let location = e.instance_path.to_string();
            let reason = if location.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", location, e)
            };
            ConformanceError::new(kind, message, reason)
        })
        .collect()
}

/// Media type and JSON Schema checks for a non-empty body.
pub(crate) fn check_content(
    subject: &str,
    content: &[MediaType],
    headers: &hyper::HeaderMap,
    body: &[u8],
) -> Vec<ConformanceError> {
    if content.is_empty() || body.is_empty() {
        return Vec::new();
    }

    let declared = util::media_type(headers);
    let media_type = match declared.as_deref() {
        Some(declared) => match find_media_type(content, declared) {
            Some(media_type) => media_type,
            None => {
                return vec![ConformanceError::new(
                    ErrorKind::UnsupportedMediaType,
                    format!("{}: content type '{}' is not declared", subject, declared),
                    format!("declared: {}", declared_media_types(content)),
                )]
            }
        },
        None => {
            let fallback = content
                .iter()
                .find(|media_type| util::is_json_media_type(&media_type.name))
                .or_else(|| if content.len() == 1 { content.first() } else { None });
            match fallback {
                Some(media_type) => media_type,
                None => {
                    return vec![ConformanceError::new(
                        ErrorKind::UnsupportedMediaType,
                        format!("{}: missing Content-Type header", subject),
                        format!("declared: {}", declared_media_types(content)),
                    )]
                }
            }
        }
    };

    let schema = match &media_type.schema {
        Some(schema) => schema,
        None => return Vec::new(),
    };
    let effective = declared.as_deref().unwrap_or(&media_type.name);
    if !util::is_json_media_type(effective) {
        return Vec::new();
    }

    let instance: Value = match serde_json::from_slice(body) {
        Ok(instance) => instance,
        Err(e) => {
            return vec![ConformanceError::new(
                ErrorKind::InvalidJson,
                format!("{}: body is not valid JSON", subject),
                e.to_string(),
            )]
        }
    };

    schema_violations(
        schema,
        &instance,
        ErrorKind::SchemaViolation,
        &format!("{} failed schema validation", subject),
    )
}

fn find_media_type<'a>(content: &'a [MediaType], media_type: &str) -> Option<&'a MediaType> {
    let wildcard = media_type
        .split('/')
        .next()
        .map(|main_type| format!("{}/*", main_type));

    content
        .iter()
        .find(|candidate| candidate.name == media_type)
        .or_else(|| {
            wildcard.and_then(|wildcard| content.iter().find(|candidate| candidate.name == wildcard))
        })
        .or_else(|| content.iter().find(|candidate| candidate.name == "*/*"))
}

fn declared_media_types(content: &[MediaType]) -> String {
    content
        .iter()
        .map(|media_type| media_type.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
