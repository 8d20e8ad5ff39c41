//! Request builder and public operations of the YOURLS API client.
//!
//! # Design
//! `ShortenerClient` holds only its validated `ClientConfig` and a
//! transport; nothing changes between calls. Each operation is split into a
//! `build_*` method producing an authenticated `HttpRequest` and the shared
//! `parse_response`, so a host that owns its HTTP stack can do the I/O
//! itself. The one-call operations (`shorten`, `expand`, `url_stats`,
//! `stats`) chain build, transport and decode.

use tracing::debug;

use crate::auth::authenticate;
use crate::config::{ClientConfig, ResponseFormat, Settings, StatsFilter};
use crate::decode::decode;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Params, API_PATH};
use crate::transport::{Transport, UreqTransport};
use crate::types::LinkResult;

/// Synchronous client for one YOURLS installation.
#[derive(Debug, Clone)]
pub struct ShortenerClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl ShortenerClient<UreqTransport> {
    /// Validate `settings` and build a client using the ureq transport.
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let config = settings.validate()?;
        let transport = UreqTransport::new(config.timeout);
        Ok(Self { config, transport })
    }
}

impl<T: Transport> ShortenerClient<T> {
    pub fn with_transport(settings: &Settings, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            config: settings.validate()?,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.credentials.is_some()
    }

    pub fn endpoint(&self) -> String {
        format!("{}{API_PATH}", self.config.base_url)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_shorten(
        &self,
        url: &str,
        title: &str,
        keyword: Option<&str>,
        format: Option<ResponseFormat>,
    ) -> Result<HttpRequest, ApiError> {
        let format = format.unwrap_or(self.config.format);
        let mut params = Params::new();
        params.insert("action", "shorturl");
        params.insert("url", url);
        params.insert("title", title);
        params.insert("format", format.as_str());
        if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
            params.insert("keyword", keyword);
        }
        self.finish(params, format)
    }

    /// `shorturl` may be a bare keyword (`abc`) or a full short url.
    pub fn build_expand(&self, shorturl: &str, format: Option<ResponseFormat>) -> Result<HttpRequest, ApiError> {
        self.build_lookup("expand", shorturl, format)
    }

    pub fn build_url_stats(&self, shorturl: &str, format: Option<ResponseFormat>) -> Result<HttpRequest, ApiError> {
        self.build_lookup("url-stats", shorturl, format)
    }

    /// A `limit` of zero is treated as absent.
    pub fn build_stats(
        &self,
        filter: Option<StatsFilter>,
        limit: Option<u32>,
        format: Option<ResponseFormat>,
    ) -> Result<HttpRequest, ApiError> {
        let format = format.unwrap_or(self.config.format);
        let filter = filter.unwrap_or(self.config.filter);
        let mut params = Params::new();
        params.insert("action", "stats");
        params.insert("filter", filter.as_str());
        params.insert("format", format.as_str());
        if let Some(limit) = limit.filter(|l| *l > 0) {
            params.insert("limit", limit.to_string());
        }
        self.finish(params, format)
    }

    fn build_lookup(
        &self,
        action: &str,
        shorturl: &str,
        format: Option<ResponseFormat>,
    ) -> Result<HttpRequest, ApiError> {
        let format = format.unwrap_or(self.config.format);
        let mut params = Params::new();
        params.insert("action", action);
        params.insert("shorturl", shorturl);
        params.insert("format", format.as_str());
        self.finish(params, format)
    }

    fn finish(&self, mut params: Params, format: ResponseFormat) -> Result<HttpRequest, ApiError> {
        authenticate(self.config.credentials.as_ref(), &mut params)?;
        Ok(HttpRequest {
            method: self.config.method,
            url: self.endpoint(),
            params,
            format,
        })
    }

    // -----------------------------------------------------------------------
    // Response parsing
    // -----------------------------------------------------------------------

    /// Decode `response` using the format `request` asked for.
    pub fn parse_response(&self, request: &HttpRequest, response: &HttpResponse) -> Result<LinkResult, ApiError> {
        decode(request.format, response)
    }

    /// Send a built request through the transport and decode the reply.
    pub fn execute(&self, request: &HttpRequest) -> Result<LinkResult, ApiError> {
        let response = self.transport.execute(request)?;
        debug!(
            action = request.params.get("action").unwrap_or_default(),
            status = response.status,
            format = %request.format,
            content_type = response.header("content-type").unwrap_or_default(),
            "decoding API response"
        );
        self.parse_response(request, &response)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn shorten(
        &self,
        url: &str,
        title: &str,
        keyword: Option<&str>,
        format: Option<ResponseFormat>,
    ) -> Result<LinkResult, ApiError> {
        let request = self.build_shorten(url, title, keyword, format)?;
        self.execute(&request)
    }

    pub fn expand(&self, shorturl: &str, format: Option<ResponseFormat>) -> Result<LinkResult, ApiError> {
        let request = self.build_expand(shorturl, format)?;
        self.execute(&request)
    }

    pub fn url_stats(&self, shorturl: &str, format: Option<ResponseFormat>) -> Result<LinkResult, ApiError> {
        let request = self.build_url_stats(shorturl, format)?;
        self.execute(&request)
    }

    pub fn stats(
        &self,
        filter: Option<StatsFilter>,
        limit: Option<u32>,
        format: Option<ResponseFormat>,
    ) -> Result<LinkResult, ApiError> {
        let request = self.build_stats(filter, limit, format)?;
        self.execute(&request)
    }
}
