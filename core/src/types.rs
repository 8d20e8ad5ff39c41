//! Decoded API results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key under which the short (or, for `expand`, long) url is stored.
pub const URL_KEY: &str = "url";

/// Result of one API call: `url` plus any other scalar fields the reply
/// carried (`message`, `statusCode`, `longurl`, ...).
///
/// Empty when the server sent no body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkResult {
    fields: BTreeMap<String, String>,
}

impl LinkResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_url(url: &str) -> Self {
        let mut result = Self::default();
        result.fields.insert(URL_KEY.to_string(), url.to_string());
        result
    }

    pub(crate) fn with_fields(url: String, extra: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut fields: BTreeMap<String, String> = extra.into_iter().filter(|(k, _)| k != URL_KEY).collect();
        fields.insert(URL_KEY.to_string(), url);
        Self { fields }
    }

    pub fn url(&self) -> Option<&str> {
        self.get(URL_KEY)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
