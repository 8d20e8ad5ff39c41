//! Response decoding for the three YOURLS output formats.
//!
//! `simple` replies are the url itself. `json` and `xml` replies are parsed
//! and the `shorturl` field is lifted into the result's `url` key: the
//! top-level field when present, otherwise the shallowest nested one
//! (url-stats wraps it in `link`, stats in `links/link_N`).

use std::collections::VecDeque;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

use crate::config::ResponseFormat;
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::types::LinkResult;

const SHORTURL: &str = "shorturl";
const XML_ROOT: &str = "result";

/// Decode `response` according to `format`.
///
/// A response without a body decodes to an empty result regardless of
/// format or status.
pub fn decode(format: ResponseFormat, response: &HttpResponse) -> Result<LinkResult, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(LinkResult::empty());
    }
    check_status(response)?;
    match format {
        ResponseFormat::Simple => Ok(LinkResult::from_url(&response.body)),
        ResponseFormat::Json => decode_json(&response.body),
        ResponseFormat::Xml => decode_xml(&response.body),
    }
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn decode_json(body: &str) -> Result<LinkResult, ApiError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| ApiError::decode(format!("malformed json: {e}")))?;
    let Value::Object(root) = &doc else {
        return Err(ApiError::decode("json reply is not an object"));
    };
    let url = find_json_shorturl(&doc).ok_or_else(|| ApiError::decode("json reply has no 'shorturl' field"))?;
    let extra = root
        .iter()
        .filter(|(k, _)| k.as_str() != SHORTURL)
        .filter_map(|(k, v)| json_scalar(v).map(|s| (k.clone(), s)));
    Ok(LinkResult::with_fields(url, extra))
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn find_json_shorturl(doc: &Value) -> Option<String> {
    let mut queue = VecDeque::from([doc]);
    while let Some(value) = queue.pop_front() {
        match value {
            Value::Object(map) => {
                if let Some(url) = map.get(SHORTURL).and_then(Value::as_str) {
                    return Some(url.to_string());
                }
                queue.extend(map.values());
            }
            Value::Array(items) => queue.extend(items),
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }
}

fn decode_xml(body: &str) -> Result<LinkResult, ApiError> {
    let root = parse_xml(body)?;
    if root.name != XML_ROOT {
        return Err(ApiError::decode(format!("expected <{XML_ROOT}> root element, found <{}>", root.name)));
    }
    let url = find_xml_shorturl(&root).ok_or_else(|| ApiError::decode("xml reply has no result/shorturl element"))?;
    let extra = root
        .children
        .iter()
        .filter(|child| child.children.is_empty() && child.name != SHORTURL)
        .map(|child| (child.name.clone(), child.text.clone()));
    Ok(LinkResult::with_fields(url, extra))
}

fn find_xml_shorturl(root: &Element) -> Option<String> {
    let mut queue: VecDeque<&Element> = root.children.iter().collect();
    while let Some(el) = queue.pop_front() {
        if el.name == SHORTURL {
            return Some(el.text.clone());
        }
        queue.extend(el.children.iter());
    }
    None
}

fn parse_xml(body: &str) -> Result<Element, ApiError> {
    let mut reader = Reader::from_str(body);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ApiError::decode(format!("malformed xml at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(Element::named(start.name().as_ref())),
            Event::Empty(start) => attach(&mut stack, &mut root, Element::named(start.name().as_ref()))?,
            Event::End(_) => {
                let el = stack.pop().ok_or_else(|| ApiError::decode("malformed xml: unmatched end tag"))?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| ApiError::decode(format!("malformed xml: {e}")))?;
                // Indentation between elements is not content.
                if !text.trim().is_empty() {
                    push_text(&mut stack, &text)?;
                }
            }
            Event::CData(data) => {
                let raw = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ApiError::decode(format!("malformed xml: <{}> is never closed", open.name)));
    }
    root.ok_or_else(|| ApiError::decode("malformed xml: no root element"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<(), ApiError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_none() => *root = Some(el),
        None => return Err(ApiError::decode("malformed xml: more than one root element")),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), ApiError> {
    match stack.last_mut() {
        Some(el) => {
            el.text.push_str(text);
            Ok(())
        }
        None => Err(ApiError::decode("malformed xml: text outside the root element")),
    }
}
