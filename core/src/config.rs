//! Client settings and their validation.
//!
//! # Design
//! `Settings` is the raw, host-supplied configuration: plain strings that can
//! come from a JSON document or the environment. `Settings::validate` turns it
//! into a `ClientConfig` in one step, rejecting any unknown format, filter or
//! method instead of silently falling back to a default.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::error::ApiError;
use crate::http::HttpMethod;

/// Response encoding requested from the server and used to decode its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
    Simple,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
            ResponseFormat::Simple => "simple",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            "simple" => Ok(ResponseFormat::Simple),
            other => Err(ApiError::config(format!(
                "invalid value for 'format': {other:?} (expected json, xml or simple)"
            ))),
        }
    }
}

/// Which subset of links a `stats` query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFilter {
    Top,
    Bottom,
    Rand,
    Last,
}

impl StatsFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsFilter::Top => "top",
            StatsFilter::Bottom => "bottom",
            StatsFilter::Rand => "rand",
            StatsFilter::Last => "last",
        }
    }
}

impl fmt::Display for StatsFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatsFilter {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(StatsFilter::Top),
            "bottom" => Ok(StatsFilter::Bottom),
            "rand" => Ok(StatsFilter::Rand),
            "last" => Ok(StatsFilter::Last),
            other => Err(ApiError::config(format!(
                "invalid value for 'filter': {other:?} (expected top, bottom, rand or last)"
            ))),
        }
    }
}

fn default_format() -> String {
    "simple".to_string()
}

fn default_filter() -> String {
    "top".to_string()
}

fn default_method() -> String {
    "get".to_string()
}

/// Raw settings as supplied by the host application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// YOURLS installation url, e.g. `https://sho.rt`.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Passed through to the transport as its overall request timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            signature: None,
            username: None,
            password: None,
            format: default_format(),
            filter: default_filter(),
            method: default_method(),
            timeout_secs: None,
        }
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn with_password(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format.to_string();
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = filter.to_string();
        self
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        serde_json::from_str(raw).map_err(|e| ApiError::config(format!("invalid settings document: {e}")))
    }

    /// Read settings from `YOURLS_*` environment variables.
    ///
    /// Only `YOURLS_URL` is required; the rest fall back to the same defaults
    /// as a JSON document with the key omitted.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let url = lookup("YOURLS_URL").ok_or_else(|| ApiError::config("YOURLS_URL is not set"))?;
        let timeout_secs = match lookup("YOURLS_TIMEOUT_SECS") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                ApiError::config(format!("YOURLS_TIMEOUT_SECS is not a number: {raw:?}"))
            })?),
            None => None,
        };
        Ok(Self {
            url,
            signature: lookup("YOURLS_SIGNATURE"),
            username: lookup("YOURLS_USERNAME"),
            password: lookup("YOURLS_PASSWORD"),
            format: lookup("YOURLS_FORMAT").unwrap_or_else(default_format),
            filter: lookup("YOURLS_FILTER").unwrap_or_else(default_filter),
            method: lookup("YOURLS_METHOD").unwrap_or_else(default_method),
            timeout_secs,
        })
    }

    /// Validate every field and produce the typed configuration.
    pub fn validate(&self) -> Result<ClientConfig, ApiError> {
        let base_url = self.url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::config("'url' must not be empty"));
        }
        Ok(ClientConfig {
            base_url: base_url.to_string(),
            credentials: Credentials::resolve(
                self.signature.as_deref(),
                self.username.as_deref(),
                self.password.as_deref(),
            ),
            format: self.format.parse()?,
            filter: self.filter.parse()?,
            method: self.method.parse()?,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Validated, immutable endpoint configuration.
///
/// `credentials` is `None` when neither authentication mode resolved; every
/// request built from such a configuration fails before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub format: ResponseFormat,
    pub filter: StatsFilter,
    pub method: HttpMethod,
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_an_empty_document() {
        let settings = Settings::from_json(r#"{"url":"https://sho.rt","signature":"abc"}"#).unwrap();
        assert_eq!(settings, Settings::new("https://sho.rt").with_signature("abc"));

        let config = settings.validate().unwrap();
        assert_eq!(config.format, ResponseFormat::Simple);
        assert_eq!(config.filter, StatsFilter::Top);
        assert_eq!(config.method, HttpMethod::Get);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = Settings::new("https://sho.rt/").validate().unwrap();
        assert_eq!(config.base_url, "https://sho.rt");
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let err = Settings::new("https://sho.rt")
            .with_signature("abc")
            .with_filter("middle")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ApiError::Configuration(ref msg) if msg.contains("filter")));
    }

    #[test]
    fn invalid_format_is_rejected() {
        let err = Settings::new("https://sho.rt").with_format("yaml").validate().unwrap_err();
        assert!(matches!(err, ApiError::Configuration(ref msg) if msg.contains("format")));
    }

    #[test]
    fn invalid_method_is_rejected() {
        let err = Settings::new("https://sho.rt").with_method("put").validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn method_accepts_upper_case() {
        let config = Settings::new("https://sho.rt").with_method("POST").validate().unwrap();
        assert_eq!(config.method, HttpMethod::Post);
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = Settings::new(" / ").validate().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_auth_still_validates() {
        let config = Settings::new("https://sho.rt").validate().unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn malformed_document_is_a_configuration_error() {
        let err = Settings::from_json(r#"{"signature":"abc"}"#).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn settings_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("YOURLS_URL", "https://sho.rt"),
            ("YOURLS_USERNAME", "admin"),
            ("YOURLS_PASSWORD", "secret"),
            ("YOURLS_FORMAT", "json"),
            ("YOURLS_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.username.as_deref(), Some("admin"));
        assert_eq!(settings.filter, "top");

        let config = settings.validate().unwrap();
        assert_eq!(config.format, ResponseFormat::Json);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(matches!(config.credentials, Some(Credentials::Password { .. })));
    }

    #[test]
    fn settings_from_lookup_requires_url() {
        let err = Settings::from_lookup(|_| None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn settings_from_lookup_rejects_bad_timeout() {
        let err = Settings::from_lookup(|k| match k {
            "YOURLS_URL" => Some("https://sho.rt".to_string()),
            "YOURLS_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
