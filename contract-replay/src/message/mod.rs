//! Rebuilds in-memory HTTP messages from transcript records.

pub mod error;

use crate::{
    transcript::{RequestRecord, ResponseRecord},
    util,
};
use error::Error;
use hyper::{body::Bytes, HeaderMap, Method, Request, Response, StatusCode, Uri};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;
use std::{borrow::Cow, convert::TryFrom};

pub type SyntheticRequest = Request<Bytes>;

// characters a lenient URL parser accepts verbatim but `Uri` does not; `%` is left alone
const URI_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// A rebuilt response together with the request it answers.
///
/// The request is borrowed: it lives exactly as long as one entry's validation.
#[derive(Debug)]
pub struct SyntheticResponse<'req> {
    response: Response<Bytes>,
    request: &'req SyntheticRequest,
}

impl<'req> SyntheticResponse<'req> {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Standard reason phrase, absent for codes without one.
    pub fn reason(&self) -> Option<&'static str> {
        self.response.status().canonical_reason()
    }

    pub fn status_line(&self) -> String {
        match self.reason() {
            Some(reason) => format!("{} {}", self.status().as_u16(), reason),
            None => self.status().as_u16().to_string(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn body(&self) -> &Bytes {
        self.response.body()
    }

    pub fn request(&self) -> &'req SyntheticRequest {
        self.request
    }
}

pub fn build_request(record: &RequestRecord) -> Result<SyntheticRequest, Error> {
    let uri = parse_target(&record.path)?;
    let body = encode_body(record.body.as_ref())?;
    let method = Method::from_bytes(record.method.as_bytes())
        .map_err(|_| Error::InvalidMethod(record.method.clone()))?;

    let mut request = Request::builder().method(method).uri(uri).body(body)?;
    util::put_headers(request.headers_mut(), &record.headers)?;

    Ok(request)
}

pub fn build_response<'req>(
    record: &ResponseRecord,
    request: &'req SyntheticRequest,
) -> Result<SyntheticResponse<'req>, Error> {
    let status = u16::try_from(record.status)
        .ok()
        .and_then(|status| StatusCode::from_u16(status).ok())
        .ok_or(Error::InvalidStatusCode(record.status))?;
    let body = encode_body(record.body.as_ref())?;

    let mut response = Response::builder().status(status).body(body)?;
    util::put_headers(response.headers_mut(), &record.headers)?;

    Ok(SyntheticResponse { response, request })
}

fn parse_target(path: &str) -> Result<Uri, Error> {
    let invalid = |reason: &str| Error::InvalidPath(path.into(), reason.into());

    if path.starts_with(':') {
        return Err(invalid("missing protocol scheme"));
    }
    if path.chars().any(char::is_control) {
        return Err(invalid("invalid control character in URL"));
    }
    let path_end = path.find(|c| c == '?' || c == '#').unwrap_or(path.len());
    if !valid_escapes(&path[..path_end]) {
        return Err(invalid("invalid URL escape"));
    }

    // scheme-less relative references resolve against the root
    let target = if path.starts_with('/') || has_scheme(path) {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{}", path))
    };

    utf8_percent_encode(&target, URI_ESCAPES)
        .to_string()
        .parse::<Uri>()
        .map_err(|e| Error::InvalidPath(path.into(), e.to_string()))
}

// `://` before the first `/`, `?` or `#` marks an absolute URI
fn has_scheme(path: &str) -> bool {
    let first_delimiter = path
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(path.len());

    path.find("://")
        .map_or(false, |scheme_end| scheme_end < first_delimiter)
}

fn valid_escapes(path: &str) -> bool {
    let bytes = path.as_bytes();

    bytes.iter().enumerate().all(|(index, byte)| {
        *byte != b'%'
            || (bytes.get(index + 1).map_or(false, u8::is_ascii_hexdigit)
                && bytes.get(index + 2).map_or(false, u8::is_ascii_hexdigit))
    })
}

fn encode_body(body: Option<&Value>) -> Result<Bytes, Error> {
    match body {
        Some(value) => Ok(Bytes::from(serde_json::to_vec(value)?)),
        None => Ok(Bytes::new()),
    }
}
