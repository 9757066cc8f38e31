use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TEMPLATE_PARAMETER_REGEX: Regex = Regex::new(r"\{(?P<name>[^{}/]+)\}").unwrap();
}

/// A compiled `paths` key such as `/pets/{petId}`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    template: String,
    regex: Regex,
    parameter_names: Vec<String>,
}

impl PathTemplate {
    pub fn compile(template: &str) -> Result<Self, regex::Error> {
        let mut pattern = String::from("^");
        let mut parameter_names = Vec::new();
        let mut last_end = 0;
        let normalized = normalize(template);

        for captures in TEMPLATE_PARAMETER_REGEX.captures_iter(normalized) {
            let whole = captures.get(0).map_or(0..0, |m| m.range());
            pattern.push_str(&regex::escape(&normalized[last_end..whole.start]));
            // group names are positional: parameter names need not be valid identifiers
            pattern.push_str(&format!("(?P<p{}>[^/]+)", parameter_names.len()));
            parameter_names.push(captures["name"].to_string());
            last_end = whole.end;
        }
        pattern.push_str(&regex::escape(&normalized[last_end..]));
        pattern.push('$');

        Ok(Self {
            template: template.to_string(),
            regex: Regex::new(&pattern)?,
            parameter_names,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_names.len()
    }

    /// Raw (still percent-encoded) values of the template parameters on a match.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(normalize(path))?;

        Some(
            self.parameter_names
                .iter()
                .enumerate()
                .filter_map(|(index, name)| {
                    captures
                        .name(&format!("p{}", index))
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_template_matches_exactly() {
        let template = PathTemplate::compile("/pets").unwrap();

        assert_eq!(template.matches("/pets"), Some(vec![]));
        assert_eq!(template.matches("/pets/"), Some(vec![]));
        assert!(template.matches("/pets/1").is_none());
        assert!(template.matches("/petsx").is_none());
    }

    #[test]
    fn captures_parameters() {
        let template = PathTemplate::compile("/owners/{owner-id}/pets/{petId}").unwrap();

        assert_eq!(template.parameter_count(), 2);
        assert_eq!(
            template.matches("/owners/ann/pets/42"),
            Some(vec![
                ("owner-id".to_string(), "ann".to_string()),
                ("petId".to_string(), "42".to_string()),
            ])
        );
        assert!(template.matches("/owners/ann/pets").is_none());
        assert!(template.matches("/owners/a/b/pets/42").is_none());
    }

    #[test]
    fn parameters_may_share_a_segment() {
        let template = PathTemplate::compile("/files/{name}.{ext}").unwrap();

        assert_eq!(
            template.matches("/files/report.final.pdf"),
            Some(vec![
                ("name".to_string(), "report.final".to_string()),
                ("ext".to_string(), "pdf".to_string()),
            ])
        );
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let template = PathTemplate::compile("/v1.0/items(all)").unwrap();

        assert!(template.matches("/v1.0/items(all)").is_some());
        assert!(template.matches("/v1x0/items(all)").is_none());
    }

    #[test]
    fn root_template() {
        let template = PathTemplate::compile("/").unwrap();

        assert!(template.matches("/").is_some());
        assert!(template.matches("/pets").is_none());
    }
}
