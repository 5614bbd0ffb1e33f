//! # HTTP Request
//!
//! Transport-neutral request handed to [`Application::dispatch`]: whatever
//! server sits in front builds one of these.
//!
//! [`Application::dispatch`]: crate::application::Application::dispatch

use crate::error::Result;
use crate::json::parse_json_bytes;
use crate::router::Method;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::form_urlencoded;

/// An incoming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    query_string: Option<String>,
    query_params: IndexMap<String, String>,
    /// Lower-cased header names
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Request for `uri`, split into path and query string
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query_string) = match uri.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (uri.to_string(), None),
        };
        let query_params = parse_query_string(query_string.as_deref());

        Self {
            method,
            path,
            query_string,
            query_params,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Shorthand for a GET request
    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::Get, uri)
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Decoded query parameter
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Every decoded query parameter, in query order
    #[must_use]
    pub const fn query_params(&self) -> &IndexMap<String, String> {
        &self.query_params
    }

    /// Get raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Get the request body as bytes
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Get the request body as string (UTF-8)
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.body_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// `application/x-www-form-urlencoded` body fields
    #[must_use]
    pub fn form(&self) -> IndexMap<String, String> {
        parse_query_string(self.body_str())
    }

    /// Parse the body as JSON; `Ok(None)` without a body
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` for a malformed body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(body) = &self.body else {
            return Ok(None);
        };
        let mut bytes = body.clone();
        parse_json_bytes("request body", &mut bytes).map(Some)
    }
}

/// Parse query string into an ordered map
///
/// Handles URL decoding and duplicate keys (last value wins). Malformed
/// escapes are kept verbatim.
fn parse_query_string(query: Option<&str>) -> IndexMap<String, String> {
    query
        .map(|q| {
            form_urlencoded::parse(q.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}
