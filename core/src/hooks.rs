//! Entry points a host web application calls around each request.
//!
//! `setup` runs once per incoming request and hands back a ready client.
//! `before_output` runs just before the page is rendered and, when the page
//! asked for it, shortens the page's own url so the view can show it.

use tracing::debug;

use crate::client::ShortenerClient;
use crate::config::Settings;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::LinkResult;

/// What the host knows about the page being rendered.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Set by the page handler to request a short url for this page.
    pub shorten: bool,
    pub title: Option<String>,
    /// Host name the request was served under, e.g. `example.com`.
    pub server_name: String,
    /// Request path including any query string, e.g. `/posts/42`.
    pub path: String,
}

impl PageContext {
    pub fn page_url(&self) -> String {
        format!("http://{}{}", self.server_name, self.path)
    }
}

/// Per-request setup: build a client and insist on usable credentials.
pub fn setup(settings: &Settings) -> Result<ShortenerClient, ApiError> {
    let client = ShortenerClient::new(settings)?;
    require_credentials(&client)?;
    Ok(client)
}

/// `setup` for hosts that bring their own transport.
pub fn setup_with_transport<T: Transport>(settings: &Settings, transport: T) -> Result<ShortenerClient<T>, ApiError> {
    let client = ShortenerClient::with_transport(settings, transport)?;
    require_credentials(&client)?;
    Ok(client)
}

fn require_credentials<T: Transport>(client: &ShortenerClient<T>) -> Result<(), ApiError> {
    if client.is_authenticated() {
        let config = client.config();
        debug!(base_url = %config.base_url, format = %config.format, filter = %config.filter, "client ready");
        Ok(())
    } else {
        Err(ApiError::config("no authentication provided"))
    }
}

/// Shorten the current page's url when `page.shorten` is set.
///
/// Returns `Ok(None)` when the page did not ask for a short url.
pub fn before_output<T: Transport>(
    client: &ShortenerClient<T>,
    page: &PageContext,
) -> Result<Option<LinkResult>, ApiError> {
    if !page.shorten {
        return Ok(None);
    }
    let url = page.page_url();
    let title = match page.title.as_deref() {
        Some(title) if !title.is_empty() => title,
        _ => return Err(ApiError::MissingPageTitle(url)),
    };
    debug!(%url, "shortening page url before output");
    client.shorten(&url, title, None, None).map(Some)
}
