//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointer + length instead of `Vec`,
//! and enums with explicit discriminants. Conversions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use yourls_core::{ApiError, HttpMethod, HttpRequest, LinkResult, Params, ResponseFormat, ShortenerClient};

/// Opaque handle to a `ShortenerClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiClient {
    pub(crate) inner: ShortenerClient,
}

/// Copy a Rust string into a caller-owned C string. Interior NULs are dropped.
pub(crate) fn to_c(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', "")).unwrap_or_default().into_raw()
}

/// Borrow a C string as `&str`. `None` for null or invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiFormat {
    Json = 0,
    Xml = 1,
    Simple = 2,
}

impl From<ResponseFormat> for FfiFormat {
    fn from(f: ResponseFormat) -> Self {
        match f {
            ResponseFormat::Json => FfiFormat::Json,
            ResponseFormat::Xml => FfiFormat::Xml,
            ResponseFormat::Simple => FfiFormat::Simple,
        }
    }
}

impl From<FfiFormat> for ResponseFormat {
    fn from(f: FfiFormat) -> Self {
        match f {
            FfiFormat::Json => ResponseFormat::Json,
            FfiFormat::Xml => ResponseFormat::Xml,
            FfiFormat::Simple => ResponseFormat::Simple,
        }
    }
}

/// One request parameter as a key-value pair of C strings.
#[repr(C)]
pub struct FfiParam {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An API request described as C-compatible plain data.
///
/// Built by `yourls_build_*` functions. `encoded` is the url-encoded form of
/// `params`: append it after `?` for GET, send it as the body for POST.
/// `format` must be handed back unchanged when parsing the response.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub params: *mut FfiParam,
    pub params_len: u32,
    pub encoded: *mut c_char,
    pub format: FfiFormat,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let encoded = to_c(&req.params.encode());
        let url = to_c(&req.url);

        let ffi_params: Box<[FfiParam]> = req
            .params
            .iter()
            .map(|(k, v)| FfiParam {
                key: to_c(k),
                value: to_c(v),
            })
            .collect();
        let params_len = ffi_params.len() as u32;
        let params = if ffi_params.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(ffi_params) as *mut FfiParam
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            params,
            params_len,
            encoded,
            format: req.format.into(),
        }))
    }

    /// Rebuild the core request. `None` if a string field is not valid UTF-8.
    ///
    /// # Safety
    /// `self` must have been produced by `from_core` and not freed.
    pub(crate) unsafe fn to_core(&self) -> Option<HttpRequest> {
        let url = unsafe { read_str(self.url) }?.to_string();
        let mut params = Params::new();
        if !self.params.is_null() {
            let pairs = unsafe { std::slice::from_raw_parts(self.params, self.params_len as usize) };
            for pair in pairs {
                let key = unsafe { read_str(pair.key) }?;
                let value = unsafe { read_str(pair.value) }?;
                params.insert(key, value);
            }
        }
        Some(HttpRequest {
            method: self.method.into(),
            url,
            params,
            format: self.format.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller builds this on the stack after executing a request and
/// passes a pointer to `yourls_parse_response`. A null `body` means the
/// server sent nothing.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Configuration = 1,
    Transport = 2,
    Decode = 3,
    Http = 4,
    MissingPageTitle = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `yourls_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Link = 1,
}

/// A decoded result exposed to C.
///
/// `url` is null when the server sent an empty reply. `fields_json` is the
/// whole result as a flat JSON object, `{}` when empty.
#[repr(C)]
pub struct FfiLink {
    pub url: *mut c_char,
    pub fields_json: *mut c_char,
}

/// Result envelope for parse and execute.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data`
/// points to an `FfiLink`. On failure `error_code` names the category,
/// `error_message` is a human-readable C string and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut std::ffi::c_void,
}

impl FfiResult {
    pub(crate) fn ok_link(link: LinkResult) -> *mut Self {
        let fields: serde_json::Map<String, serde_json::Value> = link
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
            .collect();
        let fields_json = serde_json::Value::Object(fields).to_string();
        let ffi_link = Box::new(FfiLink {
            url: link.url().map(to_c).unwrap_or(std::ptr::null_mut()),
            fields_json: to_c(&fields_json),
        });
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag: FfiDataTag::Link,
            data: Box::into_raw(ffi_link) as *mut std::ffi::c_void,
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::Configuration(_) => (FfiErrorCode::Configuration, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::Decode(_) => (FfiErrorCode::Decode, 0),
            ApiError::Http { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::MissingPageTitle(_) => (FfiErrorCode::MissingPageTitle, 0),
        };
        Self::failure(error_code, http_status, &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, &format!("null or invalid argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg)
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: to_c(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }
}
