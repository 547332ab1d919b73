//! Dispatcher: sends the model's request and writes the outcome back.
//!
//! The [`Dispatcher`] reads a snapshot of the shared model when `send` is
//! called, releases the model, performs a single network attempt, then writes
//! status, headers and body into the model in one step. Transport failures are
//! recorded in the model as a failed response, never returned as errors.
//! Use [`DispatcherBuilder`] to configure and create dispatchers.

use crate::body::{CONTENT_TYPE, FORM_URLENCODED, JSON};
use crate::{Error, Headers, Method, RequestSnapshot, ResponseState, Result, SharedModel};
use http::{HeaderName, HeaderValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use url::Url;

/// Whether a dispatch is currently outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Ready to send.
    Idle,
    /// A request is in flight; resubmission is refused.
    Sending,
}

/// What happened to a dispatch, for host notifications.
///
/// The same information is already in the model; this value only tells the
/// host which notification to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A response was received, whatever its status code.
    Success {
        /// HTTP status code
        status: u16,
        /// Reason phrase
        status_text: String,
    },
    /// No response was received.
    Failure {
        /// The failure message written into the response body
        message: String,
    },
}

impl DispatchOutcome {
    /// Returns `true` for [`DispatchOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success { .. })
    }
}

/// The request exactly as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// Request method.
    pub method: Method,
    /// Absolute request URL.
    pub url: String,
    /// Headers to send, after defaults and inference.
    pub headers: Headers,
    /// Body, present only for POST, PUT and PATCH with a non-empty body.
    pub body: Option<String>,
}

/// Guesses a media type for a body sent without a `Content-Type`.
///
/// JSON-looking text (`{` or `[` after trimming) maps to `application/json`;
/// otherwise text containing `=` maps to the URL-encoded form type.
///
/// ```
/// use reqform::dispatch::infer_content_type;
///
/// assert_eq!(infer_content_type(" [1, 2]"), Some("application/json"));
/// assert_eq!(
///     infer_content_type("a=1&b=2"),
///     Some("application/x-www-form-urlencoded;charset=UTF-8")
/// );
/// assert_eq!(infer_content_type("plain words"), None);
/// ```
pub fn infer_content_type(body: &str) -> Option<&'static str> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Some(JSON)
    } else if body.contains('=') {
        Some(FORM_URLENCODED)
    } else {
        None
    }
}

/// Sends the request held in a [`SharedModel`] and records the response.
///
/// The dispatcher is cheap to clone; clones share configuration, connection
/// pool and the in-flight flag.
///
/// # Examples
///
/// ```no_run
/// use reqform::{Dispatcher, RequestModel};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), reqform::Error> {
/// let dispatcher = Dispatcher::builder()
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "reqform/0.1")?
///     .build()?;
///
/// let model = RequestModel::new().into_shared();
/// model.lock().unwrap().set_url("https://httpbin.org/get");
///
/// let outcome = dispatcher.send(&model).await?;
/// println!("{:?}", outcome);
/// println!("{}", model.lock().unwrap().response().body);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    http_client: reqwest::Client,
    default_headers: Headers,
    timeout: Option<Duration>,
    infer_content_type: bool,
    sending: AtomicBool,
}

impl Dispatcher {
    /// Creates a new `DispatcherBuilder`.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Current state: `Sending` while a dispatch is outstanding.
    pub fn state(&self) -> DispatchState {
        if self.inner.sending.load(Ordering::Acquire) {
            DispatchState::Sending
        } else {
            DispatchState::Idle
        }
    }

    /// Returns `true` while a dispatch is outstanding.
    pub fn is_sending(&self) -> bool {
        self.state() == DispatchState::Sending
    }

    /// Sends the model's current request and writes the response into it.
    ///
    /// The snapshot is taken when this is called, so edits made up to that
    /// moment are included. The model is not locked while the request is in
    /// flight. Success and transport failure both return `Ok`; the model's
    /// response record and the returned outcome describe which it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SendInProgress`] without touching the model if another
    /// send on this dispatcher (or a clone of it) has not finished.
    pub async fn send(&self, model: &SharedModel) -> Result<DispatchOutcome> {
        let _sending = SendingGuard::acquire(&self.inner.sending).ok_or_else(|| {
            tracing::warn!("Refusing to send while a request is in flight");
            Error::SendInProgress
        })?;

        let snapshot = lock(model).snapshot();
        let request = self.prepare(&snapshot);
        let response = match self.execute(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    timeout = e.is_timeout(),
                    method = %request.method,
                    url = %request.url,
                    "Request failed"
                );
                ResponseState::failure(e.to_string())
            }
        };

        let outcome = if response.is_failure() {
            DispatchOutcome::Failure {
                message: response.body.clone(),
            }
        } else {
            DispatchOutcome::Success {
                status: response.status,
                status_text: response.status_text.clone(),
            }
        };
        lock(model).set_response(response);
        Ok(outcome)
    }

    /// Turns a model snapshot into the request that goes on the wire.
    ///
    /// Default headers are added only where the snapshot has no header of the
    /// same name (ignoring case). The body is attached only for methods that
    /// carry one, and only when non-empty; with inference enabled a missing
    /// `Content-Type` is guessed from it. The model itself is never modified.
    pub fn prepare(&self, snapshot: &RequestSnapshot) -> TransportRequest {
        let mut headers = snapshot.headers.clone();
        for (name, value) in self.inner.default_headers.iter() {
            if !headers.contains_key_ignore_case(name) {
                headers.insert(name, value);
            }
        }

        let body = if snapshot.method.allows_body() && !snapshot.body.is_empty() {
            Some(snapshot.body.clone())
        } else {
            None
        };

        if let Some(body) = &body {
            if self.inner.infer_content_type && !headers.contains_key_ignore_case(CONTENT_TYPE) {
                if let Some(content_type) = infer_content_type(body) {
                    headers.insert(CONTENT_TYPE, content_type);
                }
            }
        }

        TransportRequest {
            method: snapshot.method,
            url: snapshot.url.clone(),
            headers,
            body,
        }
    }

    /// Performs one network attempt and reads the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL is not absolute,
    /// [`Error::ConfigurationError`] if a header cannot be sent, and
    /// [`Error::Network`] for anything the transport reports.
    pub async fn execute(&self, request: &TransportRequest) -> Result<ResponseState> {
        let url = Url::parse(&request.url)?;

        tracing::info!(
            method = %request.method,
            url = %url,
            "Dispatching request"
        );

        let mut builder = self
            .inner
            .http_client
            .request(http::Method::from(request.method), url);

        for (name, value) in request.headers.iter() {
            let name = HeaderName::try_from(name)
                .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::try_from(value)
                .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
            builder = builder.header(name, value);
        }

        if let Some(timeout) = self.inner.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let start_time = Instant::now();
        let response = builder.send().await?;

        let status = response.status();
        let status_text = reason_phrase(&response);
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes());
            let merged = match headers.get(name.as_str()) {
                Some(existing) => format!("{}, {}", existing, value),
                None => value.into_owned(),
            };
            headers.insert(name.as_str(), merged);
        }

        let body = response.text().await?;
        let elapsed = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = elapsed.as_millis(),
            bytes = body.len(),
            "Received HTTP response"
        );

        Ok(ResponseState {
            status: status.as_u16(),
            status_text,
            headers,
            body,
            elapsed: Some(elapsed),
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_headers", &self.inner.default_headers)
            .field("timeout", &self.inner.timeout)
            .field("infer_content_type", &self.inner.infer_content_type)
            .field("state", &self.state())
            .finish()
    }
}

/// Holds the in-flight flag for the duration of one send.
struct SendingGuard<'a>(&'a AtomicBool);

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendingGuard(flag))
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The reason phrase the server sent, or the canonical one for the status
/// when the wire phrase was the canonical one (or absent).
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<hyper::ext::ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

fn lock(model: &SharedModel) -> MutexGuard<'_, crate::RequestModel> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for configuring and creating a [`Dispatcher`].
///
/// # Examples
///
/// ```
/// use reqform::DispatcherBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), reqform::Error> {
/// let dispatcher = DispatcherBuilder::new()
///     .timeout(Duration::from_secs(10))
///     .default_header("Accept", "application/json")?
///     .infer_content_type(false)
///     .build()?;
/// assert!(!dispatcher.is_sending());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct DispatcherBuilder {
    default_headers: Headers,
    timeout: Option<Duration>,
    infer_content_type: bool,
}

impl DispatcherBuilder {
    /// Creates a builder with no default headers, no timeout and content-type
    /// inference enabled.
    pub fn new() -> Self {
        Self {
            default_headers: Headers::new(),
            timeout: None,
            infer_content_type: true,
        }
    }

    /// Adds a header sent with every request unless the request sets it.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name.as_str(), value.as_ref());
        Ok(self)
    }

    /// Sets a per-request timeout. Without one the transport default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables or disables guessing `Content-Type` from the body at send time.
    pub fn infer_content_type(mut self, enabled: bool) -> Self {
        self.infer_content_type = enabled;
        self
    }

    /// Builds the configured `Dispatcher`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build(self) -> Result<Dispatcher> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Dispatcher {
            inner: Arc::new(DispatcherInner {
                http_client,
                default_headers: self.default_headers,
                timeout: self.timeout,
                infer_content_type: self.infer_content_type,
                sending: AtomicBool::new(false),
            }),
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
