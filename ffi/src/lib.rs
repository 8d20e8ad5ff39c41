//! C-ABI wrapper around `yourls-core`.
//!
//! # Overview
//! Exposes the YOURLS client through `extern "C"` functions so a host web
//! application written in any language with a C FFI can build signed API
//! requests, decode the replies, or let this library run the round trip.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `yourls_build_*` mirror the core builders 1:1 and return null when the
//!   request cannot be built (null argument, unknown format/filter, no
//!   authentication configured).
//! - `yourls_parse_response` and `yourls_execute` share one `FfiResult`
//!   envelope with `FfiDataTag` + `void* data`.
//! - The C caller owns all returned pointers and must call the matching
//!   `yourls_*_free` / `yourls_free_*` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use yourls_core::{HttpRequest, HttpResponse, ResponseFormat, Settings, ShortenerClient, StatsFilter};

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client from a JSON settings document, e.g.
/// `{"url":"https://sho.rt","signature":"abc","format":"json"}`.
///
/// Returns null if `settings_json` is null, is not a valid settings
/// document, or names an unknown format, filter or method.
/// The caller must free the returned pointer with `yourls_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_client_new(settings_json: *const c_char) -> *mut FfiClient {
    catch_unwind(|| {
        let Some(raw) = (unsafe { read_str(settings_json) }) else {
            return std::ptr::null_mut();
        };
        let client = Settings::from_json(raw).and_then(|settings| ShortenerClient::new(&settings));
        match client {
            Ok(inner) => Box::into_raw(Box::new(FfiClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `yourls_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Parse an optional format argument. `Ok(None)` for null, `Err(())` for an
/// unknown or non-UTF-8 value.
fn format_arg(format: *const c_char) -> Result<Option<ResponseFormat>, ()> {
    if format.is_null() {
        return Ok(None);
    }
    let raw = unsafe { read_str(format) }.ok_or(())?;
    raw.parse().map(Some).map_err(|_| ())
}

/// Finish a build: convert to the C request or return null on error.
fn into_ffi(req: Result<HttpRequest, yourls_core::ApiError>) -> *mut FfiHttpRequest {
    match req {
        Ok(req) => FfiHttpRequest::from_core(req),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Build a `shorturl` request.
///
/// `keyword` and `format` may be null. Returns null if `client`, `url` or
/// `title` is null, if `format` is unknown, or if no authentication mode is
/// configured. The caller must free the result with `yourls_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_build_shorten(
    client: *const FfiClient,
    url: *const c_char,
    title: *const c_char,
    keyword: *const c_char,
    format: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(url), Some(title)) = (unsafe { read_str(url) }, unsafe { read_str(title) }) else {
            return std::ptr::null_mut();
        };
        let keyword = unsafe { read_str(keyword) };
        let Ok(format) = format_arg(format) else {
            return std::ptr::null_mut();
        };
        into_ffi(client.inner.build_shorten(url, title, keyword, format))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build an `expand` request. `shorturl` may be a keyword or a full short
/// url; `format` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_build_expand(
    client: *const FfiClient,
    shorturl: *const c_char,
    format: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(shorturl) = (unsafe { read_str(shorturl) }) else {
            return std::ptr::null_mut();
        };
        let Ok(format) = format_arg(format) else {
            return std::ptr::null_mut();
        };
        into_ffi(client.inner.build_expand(shorturl, format))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a `url-stats` request. `format` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_build_url_stats(
    client: *const FfiClient,
    shorturl: *const c_char,
    format: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(shorturl) = (unsafe { read_str(shorturl) }) else {
            return std::ptr::null_mut();
        };
        let Ok(format) = format_arg(format) else {
            return std::ptr::null_mut();
        };
        into_ffi(client.inner.build_url_stats(shorturl, format))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Build a `stats` request.
///
/// `filter` and `format` may be null to use the configured defaults;
/// `limit` of 0 leaves the limit out of the request.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_build_stats(
    client: *const FfiClient,
    filter: *const c_char,
    limit: u32,
    format: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let filter = if filter.is_null() {
            None
        } else {
            match unsafe { read_str(filter) }.map(str::parse::<StatsFilter>) {
                Some(Ok(filter)) => Some(filter),
                _ => return std::ptr::null_mut(),
            }
        };
        let Ok(format) = format_arg(format) else {
            return std::ptr::null_mut();
        };
        into_ffi(client.inner.build_stats(filter, Some(limit), format))
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse / execute
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null or
/// non-UTF-8 body becomes an empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = unsafe { read_str(resp.body) }.unwrap_or("");
    HttpResponse::new(resp.status, body)
}

/// Decode the response to a request built by `yourls_build_*`.
///
/// Returns a result with `data_tag = Link` on success.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_parse_response(
    client: *const FfiClient,
    request: *const FfiHttpRequest,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let Some(core_req) = (unsafe { request.as_ref() }).and_then(|r| unsafe { r.to_core() }) else {
            return FfiResult::null_arg("request");
        };
        let core_resp = ffi_response_to_core(unsafe { &*response });
        match client.inner.parse_response(&core_req, &core_resp) {
            Ok(link) => FfiResult::ok_link(link),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in yourls_parse_response"))
}

/// Send a request built by `yourls_build_*` over HTTP and decode the reply.
///
/// Blocks until the server answers or the configured timeout expires.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_execute(client: *const FfiClient, request: *const FfiHttpRequest) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let Some(core_req) = (unsafe { request.as_ref() }).and_then(|r| unsafe { r.to_core() }) else {
            return FfiResult::null_arg("request");
        };
        match client.inner.execute(&core_req) {
            Ok(link) => FfiResult::ok_link(link),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in yourls_execute"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn free_c(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free an `FfiHttpRequest` returned by any `yourls_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c(req.url);
        free_c(req.encoded);
        if !req.params.is_null() && req.params_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.params, req.params_len as usize);
            let params = unsafe { Box::from_raw(slice) };
            for p in params.iter() {
                free_c(p.key);
                free_c(p.value);
            }
        }
    }));
}

/// Free an `FfiResult` returned by `yourls_parse_response` or
/// `yourls_execute`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn yourls_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c(result.error_message);
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Link => {
                    let link = unsafe { Box::from_raw(result.data as *mut FfiLink) };
                    free_c(link.url);
                    free_c(link.fields_json);
                }
                FfiDataTag::None => {}
            }
        }
    }));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
