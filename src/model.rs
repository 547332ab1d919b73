//! The shared request model and its field groups.
//!
//! [`RequestModel`] is the single record every editor writes into and the
//! dispatcher reads from. Writes go through one setter per field group (url,
//! method, headers, body, response); each setter applies its change in one
//! step, bumps that group's generation counter and publishes the new
//! [`Revision`] to subscribers.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// HTTP methods a request can be composed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
}

impl Method {
    /// All supported methods, in selector order.
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    /// Returns the upper-case verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// The method after this one in selector order, wrapping around.
    pub fn next(&self) -> Method {
        match self {
            Method::Get => Method::Post,
            Method::Post => Method::Put,
            Method::Put => Method::Delete,
            Method::Delete => Method::Patch,
            Method::Patch => Method::Get,
        }
    }

    /// Returns `true` if a body is attached when dispatching with this method.
    pub fn allows_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::InvalidMethod(s.to_string()))
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Patch => http::Method::PATCH,
        }
    }
}

/// A flat, insertion-ordered header map.
///
/// Names keep the case they were entered with. Inserting a name that is
/// already present (exact match) replaces its value in place, so the last
/// write wins without moving the entry. Existence checks that must ignore
/// case go through [`Headers::contains_key_ignore_case`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Returns the value stored under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first value whose name matches `name` ignoring ASCII case.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if any name matches `name` ignoring ASCII case.
    pub fn contains_key_ignore_case(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Removes the entry stored under exactly `name`.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The outcome of the most recent dispatch.
///
/// A transport failure is recorded with `status = 0` and `status_text = "Error"`,
/// which no real HTTP response can produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResponseState {
    /// HTTP status code, or `0` for a failed dispatch.
    pub status: u16,

    /// Reason phrase, or `"Error"` for a failed dispatch.
    pub status_text: String,

    /// Response headers as returned by the transport.
    pub headers: Headers,

    /// Full response body as text, or the failure message.
    pub body: String,

    /// Wall-clock time from sending the request to reading the full body.
    ///
    /// `None` before the first dispatch and after a failure.
    #[serde(skip)]
    pub elapsed: Option<Duration>,
}

impl ResponseState {
    /// Status text recorded for a failed dispatch.
    pub const FAILURE_STATUS_TEXT: &'static str = "Error";

    /// Builds the sentinel record for a dispatch that never got a response.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            status_text: Self::FAILURE_STATUS_TEXT.to_string(),
            headers: Headers::new(),
            body: message.into(),
            elapsed: None,
        }
    }

    /// Returns `true` if this records a failed dispatch.
    pub fn is_failure(&self) -> bool {
        self.status == 0 && self.status_text == Self::FAILURE_STATUS_TEXT
    }
}

/// Per-field-group write generations.
///
/// Every effective write to a group increments that group's counter. A
/// component that remembers the generation its own write produced can tell
/// its own change apart from anyone else's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revision {
    /// Generation of the `url` field.
    pub url: u64,
    /// Generation of the `method` field.
    pub method: u64,
    /// Generation of the header map.
    pub headers: u64,
    /// Generation of the request body.
    pub body: u64,
    /// Generation of the response record.
    pub response: u64,
}

/// The request fields the dispatcher needs, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RequestSnapshot {
    /// Request method.
    pub method: Method,
    /// Request URL, including the query string.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Serialized request body.
    pub body: String,
}

/// A request model shared between editors and the dispatcher.
///
/// The lock is only ever held for the duration of a synchronous write or a
/// snapshot; the dispatcher releases it before awaiting the network.
pub type SharedModel = Arc<Mutex<RequestModel>>;

/// The single in-progress request definition plus the most recent response.
///
/// # Examples
///
/// ```
/// use reqform::{Method, RequestModel};
///
/// let mut model = RequestModel::new();
/// assert_eq!(model.method(), Method::Get);
/// assert_eq!(model.url(), "");
///
/// let before = model.revision().url;
/// model.set_url("https://api.example.com/users");
/// assert_eq!(model.revision().url, before + 1);
/// ```
#[derive(Debug)]
pub struct RequestModel {
    url: String,
    method: Method,
    headers: Headers,
    body: String,
    response: ResponseState,
    revision: Revision,
    notifier: watch::Sender<Revision>,
}

impl RequestModel {
    /// Creates an empty `GET` request with no URL, headers or body.
    pub fn new() -> Self {
        let (notifier, _) = watch::channel(Revision::default());
        Self {
            url: String::new(),
            method: Method::Get,
            headers: Headers::new(),
            body: String::new(),
            response: ResponseState::default(),
            revision: Revision::default(),
            notifier,
        }
    }

    /// Wraps the model in a [`SharedModel`] handle.
    pub fn into_shared(self) -> SharedModel {
        Arc::new(Mutex::new(self))
    }

    /// Subscribes to write notifications.
    ///
    /// The receiver always holds the latest [`Revision`]; hosts can await
    /// `changed()` and re-render.
    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.notifier.subscribe()
    }

    /// The current per-group generations.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Request URL, including the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Serialized request body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The most recent response, or the default record before any dispatch.
    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    /// Replaces the URL and returns the url generation.
    pub fn set_url(&mut self, url: impl Into<String>) -> u64 {
        let url = url.into();
        if url != self.url {
            self.url = url;
            self.revision.url += 1;
            self.publish();
        }
        self.revision.url
    }

    /// Replaces the method and returns the method generation.
    pub fn set_method(&mut self, method: Method) -> u64 {
        if method != self.method {
            self.method = method;
            self.revision.method += 1;
            self.publish();
        }
        self.revision.method
    }

    /// Replaces the whole header map and returns the headers generation.
    pub fn set_headers(&mut self, headers: Headers) -> u64 {
        if headers != self.headers {
            self.headers = headers;
            self.revision.headers += 1;
            self.publish();
        }
        self.revision.headers
    }

    /// Inserts a single header and returns the headers generation.
    pub fn insert_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> u64 {
        let mut headers = self.headers.clone();
        headers.insert(name, value);
        self.set_headers(headers)
    }

    /// Replaces the body and returns the body generation.
    pub fn set_body(&mut self, body: impl Into<String>) -> u64 {
        let body = body.into();
        if body != self.body {
            self.body = body;
            self.revision.body += 1;
            self.publish();
        }
        self.revision.body
    }

    /// Replaces the response record and returns the response generation.
    ///
    /// Every dispatch counts as a new response, even when it is identical to
    /// the previous one.
    pub fn set_response(&mut self, response: ResponseState) -> u64 {
        self.response = response;
        self.revision.response += 1;
        self.publish();
        self.revision.response
    }

    /// Captures the fields the dispatcher sends.
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    fn publish(&self) {
        self.notifier.send_replace(self.revision);
    }
}

impl Default for RequestModel {
    fn default() -> Self {
        Self::new()
    }
}
