//! Read-only projection of the model's response record for display.
//!
//! [`ResponseView`] borrows a [`ResponseState`] and derives everything a
//! response panel shows: status category, whether there is anything to show,
//! the body formatted for reading, and the metadata strip (size, media type,
//! headers). It has no way to modify the model.

use crate::ResponseState;
use std::time::Duration;

/// Status code category, used for display styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 200–299
    Success,
    /// 300–399
    Redirect,
    /// 400–499
    ClientError,
    /// 500 and above
    ServerError,
    /// Anything else, including the failed-dispatch sentinel `0`.
    Other,
}

impl StatusClass {
    /// Classifies a status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            500..=u16::MAX => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Success => "2xx success",
            StatusClass::Redirect => "3xx redirect",
            StatusClass::ClientError => "4xx client error",
            StatusClass::ServerError => "5xx server error",
            StatusClass::Other => "other",
        }
    }
}

/// Tone of the status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// 200–399.
    Positive,
    /// Everything else.
    Negative,
}

/// A response body prepared for display.
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedBody<'a> {
    /// The body parsed as JSON.
    Structured(serde_json::Value),
    /// The body did not parse; shown as-is.
    Raw(&'a str),
}

impl<'a> FormattedBody<'a> {
    /// Parses `text` as JSON, falling back to the text itself.
    ///
    /// Whole-valued floats such as `1.0` or `1e2` are stored as integers, so
    /// they display as `1` and `100`.
    pub fn parse(text: &'a str) -> Self {
        match serde_json::from_str(text) {
            Ok(mut value) => {
                normalize_numbers(&mut value);
                FormattedBody::Structured(value)
            }
            Err(_) => FormattedBody::Raw(text),
        }
    }

    /// The text to display.
    ///
    /// Structured values are pretty-printed with two-space indentation, except
    /// a bare JSON string, which shows its contents.
    pub fn display_text(&self) -> String {
        match self {
            FormattedBody::Structured(serde_json::Value::String(s)) => s.clone(),
            FormattedBody::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            FormattedBody::Raw(text) => (*text).to_string(),
        }
    }
}

/// Largest magnitude below which whole numbers print without an exponent.
const PLAIN_INTEGER_LIMIT: f64 = 1e21;

fn normalize_numbers(value: &mut serde_json::Value) {
    use serde_json::{Number, Value};

    match value {
        Value::Number(n) => {
            let Some(f) = n.as_f64().filter(|_| n.is_f64()) else {
                return;
            };
            if f.fract() != 0.0 || f.abs() >= PLAIN_INTEGER_LIMIT {
                return;
            }
            if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                *n = Number::from(f as i64);
            } else if f >= 0.0 && f < u64::MAX as f64 {
                *n = Number::from(f as u64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

/// One response header prepared for the header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    /// Header name as returned by the transport.
    pub name: &'a str,
    /// Value up to the first `;`.
    pub value: &'a str,
}

/// Display projection over a response record.
///
/// # Examples
///
/// ```
/// use reqform::{ResponseState, ResponseView, StatusClass};
///
/// let response = ResponseState {
///     status: 200,
///     status_text: "OK".to_string(),
///     body: r#"{"a":1}"#.to_string(),
///     ..Default::default()
/// };
/// let view = ResponseView::new(&response);
///
/// assert!(view.has_response());
/// assert_eq!(view.status_class(), StatusClass::Success);
/// assert_eq!(view.body_text(), "{\n  \"a\": 1\n}");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResponseView<'a> {
    response: &'a ResponseState,
}

impl<'a> ResponseView<'a> {
    /// Creates a view over `response`.
    pub fn new(response: &'a ResponseState) -> Self {
        Self { response }
    }

    /// Status code, `0` for a failed dispatch.
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Reason phrase, `"Error"` for a failed dispatch.
    pub fn status_text(&self) -> &'a str {
        &self.response.status_text
    }

    /// `"<status> <statusText>"`, as shown in the badge.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.response.status, self.response.status_text)
            .trim_end()
            .to_string()
    }

    /// Status category.
    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_status(self.response.status)
    }

    /// Badge tone: positive for 2xx and 3xx.
    pub fn badge(&self) -> Badge {
        if (200..400).contains(&self.response.status) {
            Badge::Positive
        } else {
            Badge::Negative
        }
    }

    /// Returns `true` if the body has any non-whitespace content.
    pub fn has_response(&self) -> bool {
        !self.response.body.trim().is_empty()
    }

    /// Returns `true` if the record is the failed-dispatch sentinel.
    pub fn is_failure(&self) -> bool {
        self.response.is_failure()
    }

    /// The body, parsed when possible.
    pub fn body(&self) -> FormattedBody<'a> {
        FormattedBody::parse(&self.response.body)
    }

    /// The body text as it should be displayed.
    pub fn body_text(&self) -> String {
        self.body().display_text()
    }

    /// The raw body to put on the clipboard, if there is one.
    pub fn clipboard_text(&self) -> Option<&'a str> {
        self.has_response().then_some(self.response.body.as_str())
    }

    /// Body length in kilobytes with two decimals, e.g. `"1.50 KB"`.
    ///
    /// The length is the body's UTF-8 byte count.
    pub fn size_kb(&self) -> String {
        format!("{:.2} KB", self.response.body.len() as f64 / 1024.0)
    }

    /// Media type of the response without parameters, e.g. `application/json`.
    pub fn content_type(&self) -> Option<&'a str> {
        self.response
            .headers
            .get_ignore_case("content-type")
            .map(|value| value.split(';').next().unwrap_or(value).trim())
    }

    /// Time taken by the request, if it completed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.response.elapsed
    }

    /// Response headers for the header table, values cut at the first `;`.
    pub fn header_lines(&self) -> Vec<HeaderLine<'a>> {
        self.response
            .headers
            .iter()
            .map(|(name, value)| HeaderLine {
                name,
                value: value.split(';').next().unwrap_or(value),
            })
            .collect()
    }
}
