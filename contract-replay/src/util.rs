use crate::message::error::Error;
use hyper::{
    header::{self, HeaderName, HeaderValue},
    HeaderMap,
};

pub fn put_headers<'a, I: IntoIterator<Item = (&'a String, &'a String)>>(
    header_map: &mut HeaderMap<HeaderValue>,
    headers: I,
) -> Result<(), Error> {
    for (key, value) in headers {
        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| Error::InvalidHeaderName(key.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| Error::InvalidHeaderValue(key.clone()))?;
        // single-value semantics: a repeated name replaces the earlier value
        header_map.insert(header_name, header_value);
    }

    Ok(())
}

/// Media type essence of the `Content-Type` header, lowercased and without parameters.
pub fn media_type(header_map: &HeaderMap) -> Option<String> {
    header_map
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|essence| !essence.is_empty())
}

pub fn is_json_media_type(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_headers_replaces_case_insensitive_duplicates() {
        let mut header_map = HeaderMap::new();
        let first = (String::from("X-Trace"), String::from("one"));
        let second = (String::from("x-trace"), String::from("two"));

        put_headers(
            &mut header_map,
            vec![(&first.0, &first.1), (&second.0, &second.1)],
        )
        .unwrap();

        assert_eq!(header_map.len(), 1);
        assert_eq!(header_map.get("x-trace").unwrap(), "two");
    }

    #[test]
    fn put_headers_rejects_illegal_names() {
        let mut header_map = HeaderMap::new();
        let bad = (String::from("bad header"), String::from("value"));

        let result = put_headers(&mut header_map, vec![(&bad.0, &bad.1)]);

        assert!(matches!(result, Err(Error::InvalidHeaderName(name)) if name == "bad header"));
    }

    #[test]
    fn media_type_strips_parameters() {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );

        assert_eq!(media_type(&header_map).as_deref(), Some("application/json"));
        assert!(media_type(&HeaderMap::new()).is_none());
    }

    #[test]
    fn json_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/plain"));
    }
}
