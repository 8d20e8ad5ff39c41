//! HTTP transport types for the YOURLS API.
//!
//! # Design
//! Requests and responses are plain data. `ShortenerClient` builds an
//! `HttpRequest` and decodes an `HttpResponse`; whoever sits in between
//! (the bundled ureq transport, or a host with its own HTTP stack) performs
//! the actual I/O. All fields are owned so values can cross the FFI boundary.

use std::fmt;
use std::str::FromStr;

use crate::config::ResponseFormat;
use crate::error::ApiError;

/// Path of the YOURLS API script, relative to the installation url.
pub const API_PATH: &str = "/yourls-api.php";

/// HTTP verb used to reach the API. GET carries the parameters as a query
/// string, POST as an url-encoded form body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("get") {
            Ok(HttpMethod::Get)
        } else if s.eq_ignore_ascii_case("post") {
            Ok(HttpMethod::Post)
        } else {
            Err(ApiError::config(format!(
                "invalid value for 'method': {s:?} (expected get or post)"
            )))
        }
    }
}

/// Ordered request parameters. Inserting an existing key replaces its value
/// in place, so the original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` form of the parameters, usable
    /// both as a query string and as a POST body.
    pub fn encode(&self) -> String {
        // Serializing a slice of string pairs cannot fail.
        serde_urlencoded::to_string(&self.pairs).unwrap_or_default()
    }
}

impl From<Params> for Vec<(String, String)> {
    fn from(params: Params) -> Self {
        params.pairs
    }
}

/// An API request described as plain data.
///
/// `format` is the encoding the request asked the server for; the response
/// to this request is decoded with it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Params,
    pub format: ResponseFormat,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
