//! Blocking transports that carry an `HttpRequest` to the API.

use std::fmt;
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one request and returns the raw response.
///
/// Implementations report connection and timeout failures as
/// `ApiError::Transport` and hand back every HTTP status, 4xx/5xx included,
/// as a response for the decoder to judge.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// `Transport` backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending API request");

        let pairs = request.params.iter();
        let sent = match request.method {
            HttpMethod::Get => self.agent.get(&request.url).query_pairs(pairs).call(),
            HttpMethod::Post => self.agent.post(&request.url).send_form(pairs),
        };
        let mut response = sent.map_err(|e| ApiError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(Box::new(e)))?;

        trace!(status, bytes = body.len(), "received API response");
        Ok(HttpResponse { status, headers, body })
    }
}
