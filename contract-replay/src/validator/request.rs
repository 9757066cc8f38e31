use super::{
    check_content,
    operation::{Operation, Parameter, ParameterLocation},
    params::{check_values, ValueRule},
    ConformanceError, ErrorKind,
};
use crate::message::SyntheticRequest;
use hyper::header::COOKIE;
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

pub(crate) fn validate(
    operation: &Operation,
    path_values: &[(String, String)],
    request: &SyntheticRequest,
) -> Vec<ConformanceError> {
    let mut errors = Vec::new();

    for parameter in &operation.parameters {
        let values = parameter_values(parameter, path_values, request);
        let rule = ValueRule {
            subject: format!(
                "{} parameter '{}' of {}",
                parameter.location,
                parameter.name,
                operation.label()
            ),
            required: parameter.required,
            explode: parameter.explode,
            value_type: &parameter.value_type,
            schema: parameter.schema.as_ref(),
        };
        errors.extend(check_values(
            &rule,
            &values,
            ErrorKind::MissingParameter,
            ErrorKind::InvalidParameter,
        ));
    }

    if let Some(request_body) = &operation.request_body {
        let subject = format!("request body of {}", operation.label());
        if request.body().is_empty() {
            if request_body.required {
                errors.push(ConformanceError::new(
                    ErrorKind::MissingRequestBody,
                    format!("{} is missing", subject),
                    "",
                ));
            }
        } else {
            errors.extend(check_content(
                &subject,
                &request_body.content,
                request.headers(),
                request.body(),
            ));
        }
    }

    errors
}

fn parameter_values(
    parameter: &Parameter,
    path_values: &[(String, String)],
    request: &SyntheticRequest,
) -> Vec<String> {
    match parameter.location {
        ParameterLocation::Path => path_values
            .iter()
            .filter(|(name, _)| *name == parameter.name)
            .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
            .collect(),
        ParameterLocation::Query => form_urlencoded::parse(request.uri().query().unwrap_or("").as_bytes())
            .filter(|(name, _)| *name == parameter.name)
            .map(|(_, value)| value.into_owned())
            .collect(),
        ParameterLocation::Header => request
            .headers()
            .get_all(parameter.name.as_str())
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect(),
        ParameterLocation::Cookie => request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                match (parts.next(), parts.next()) {
                    (Some(name), Some(value)) if name == parameter.name => Some(value.to_string()),
                    _ => None,
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        message::build_request, transcript::RequestRecord, validator::operation::ValueType,
    };
    use indexmap::IndexMap;

    fn synthetic(path: &str, headers: &[(&str, &str)]) -> SyntheticRequest {
        build_request(&RequestRecord {
            method: String::from("GET"),
            path: path.into(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<IndexMap<_, _>>(),
            body: None,
        })
        .unwrap()
    }

    fn parameter(name: &str, location: ParameterLocation) -> Parameter {
        Parameter {
            name: name.into(),
            location,
            required: false,
            explode: true,
            value_type: ValueType::String,
            schema: None,
        }
    }

    #[test]
    fn query_values_are_decoded() {
        let request = synthetic("/search?q=red+fox&q=blue%20cat&other=1", &[]);

        assert_eq!(
            parameter_values(&parameter("q", ParameterLocation::Query), &[], &request),
            vec!["red fox".to_string(), "blue cat".to_string()]
        );
    }

    #[test]
    fn path_values_are_percent_decoded() {
        let request = synthetic("/files/a%20b", &[]);
        let path_values = vec![("name".to_string(), "a%20b".to_string())];

        assert_eq!(
            parameter_values(&parameter("name", ParameterLocation::Path), &path_values, &request),
            vec!["a b".to_string()]
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = synthetic("/", &[("X-Api-Key", "secret")]);

        assert_eq!(
            parameter_values(&parameter("x-api-key", ParameterLocation::Header), &[], &request),
            vec!["secret".to_string()]
        );
    }

    #[test]
    fn cookies_are_split() {
        let request = synthetic("/", &[("Cookie", "session=abc; theme=dark")]);

        assert_eq!(
            parameter_values(&parameter("theme", ParameterLocation::Cookie), &[], &request),
            vec!["dark".to_string()]
        );
        assert!(parameter_values(&parameter("lang", ParameterLocation::Cookie), &[], &request).is_empty());
    }
}
