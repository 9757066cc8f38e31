use super::{
    check_content,
    operation::Operation,
    params::{check_values, ValueRule},
    ConformanceError, ErrorKind,
};
use crate::message::SyntheticResponse;

pub(crate) fn validate(operation: &Operation, response: &SyntheticResponse<'_>) -> Vec<ConformanceError> {
    let status = response.status().as_u16();
    let spec = match operation.response_for(status) {
        Some(spec) => spec,
        None => {
            return vec![ConformanceError::new(
                ErrorKind::UndefinedStatus,
                format!(
                    "response code '{}' is not defined by {}",
                    status,
                    operation.label()
                ),
                format!("defined: {}", operation.defined_statuses()),
            )]
        }
    };

    let subject = format!("{} response of {}", response.status_line(), operation.label());
    let mut errors = Vec::new();

    for header in &spec.headers {
        let values: Vec<String> = response
            .headers()
            .get_all(header.name.as_str())
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let rule = ValueRule {
            subject: format!("header '{}' of {}", header.name, subject),
            required: header.required,
            explode: false,
            value_type: &header.value_type,
            schema: header.schema.as_ref(),
        };
        errors.extend(check_values(
            &rule,
            &values,
            ErrorKind::MissingHeader,
            ErrorKind::InvalidHeader,
        ));
    }

    errors.extend(check_content(
        &subject,
        &spec.content,
        response.headers(),
        response.body(),
    ));

    errors
}
