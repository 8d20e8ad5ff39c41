//! Synchronous client core for the YOURLS link-shortening API.
//!
//! # Overview
//! Turns four logical operations (shorten, expand, url-stats, stats) into
//! authenticated requests against `{url}/yourls-api.php` and decodes the
//! json, xml or simple-text reply into a `LinkResult`.
//!
//! # Design
//! - `Settings` is validated once into an immutable `ClientConfig`; unknown
//!   formats, filters or methods are rejected up front.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_response`, so the I/O boundary is explicit. `ShortenerClient`
//!   also runs the round trip itself through a `Transport`, ureq by default.
//! - A missing authentication mode fails every request before any I/O.
//! - `hooks` holds the two functions a host web application calls around
//!   each page request.

pub mod auth;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod hooks;
pub mod http;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::ShortenerClient;
pub use config::{ClientConfig, ResponseFormat, Settings, StatsFilter};
pub use error::ApiError;
pub use hooks::PageContext;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Params};
pub use transport::{Transport, UreqTransport};
pub use types::LinkResult;
