//! Query parameter editor.
//!
//! Rows are local to the editor. After every mutation the editor derives the
//! canonical query string from its enabled rows and folds it into the model's
//! URL. The flow is one-way: a URL typed by hand is never parsed back into rows.

use crate::rows::{remove_keeping_placeholder, row_mut, RowField};
use crate::{RequestModel, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is when encoding a query key or value; everything else
/// is percent-encoded.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A single query parameter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParamRow {
    /// Parameter name, exactly as typed.
    pub key: String,
    /// Parameter value, exactly as typed.
    pub value: String,
    /// Disabled rows stay in the table but are left out of the URL.
    pub enabled: bool,
}

impl QueryParamRow {
    /// Creates an enabled row.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    pub(crate) fn set(&mut self, field: RowField, text: String) {
        match field {
            RowField::Key => self.key = text,
            RowField::Value => self.value = text,
        }
    }

    fn contributes(&self) -> bool {
        self.enabled && !self.key.trim().is_empty()
    }
}

impl Default for QueryParamRow {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// Encodes one query key or value.
pub fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, QUERY_COMPONENT).to_string()
}

/// Serializes the contributing rows as `key=value` pairs joined by `&`, in row order.
///
/// Rows that are disabled or whose key is blank are skipped. Keys are encoded
/// as typed, without trimming.
///
/// ```
/// use reqform::query::{build_query_string, QueryParamRow};
///
/// let mut disabled = QueryParamRow::new("baz", "");
/// disabled.enabled = false;
/// let rows = [
///     QueryParamRow::new("foo", "bar"),
///     disabled,
///     QueryParamRow::new("", "x"),
/// ];
/// assert_eq!(build_query_string(&rows), "foo=bar");
/// ```
pub fn build_query_string(rows: &[QueryParamRow]) -> String {
    rows.iter()
        .filter(|row| row.contributes())
        .map(|row| {
            format!(
                "{}={}",
                encode_component(&row.key),
                encode_component(&row.value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Replaces the query portion of `url` with `query`.
///
/// The base is everything before the first `?`. Returns `None` when the base
/// is empty, so a bare `?query` is never produced.
pub fn replace_query(url: &str, query: &str) -> Option<String> {
    let base = url.split('?').next().unwrap_or_default();
    if base.is_empty() {
        return None;
    }
    if query.is_empty() {
        Some(base.to_string())
    } else {
        Some(format!("{}?{}", base, query))
    }
}

/// Editor for the query parameter table.
///
/// # Examples
///
/// ```
/// use reqform::{QueryParamEditor, RequestModel, RowField};
///
/// let mut model = RequestModel::new();
/// model.set_url("https://api.example.com/search?stale=1");
///
/// let mut params = QueryParamEditor::new();
/// params.set_field(&mut model, 0, RowField::Key, "q")?;
/// params.set_field(&mut model, 0, RowField::Value, "rust lang")?;
///
/// assert_eq!(model.url(), "https://api.example.com/search?q=rust%20lang");
/// # Ok::<(), reqform::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct QueryParamEditor {
    rows: Vec<QueryParamRow>,
}

impl QueryParamEditor {
    /// Creates an editor holding one empty row.
    pub fn new() -> Self {
        Self {
            rows: vec![QueryParamRow::default()],
        }
    }

    /// The current rows, in display order.
    pub fn rows(&self) -> &[QueryParamRow] {
        &self.rows
    }

    /// The query string the current rows produce.
    pub fn query_string(&self) -> String {
        build_query_string(&self.rows)
    }

    /// Appends an empty, enabled row.
    pub fn add_row(&mut self, model: &mut RequestModel) {
        self.rows.push(QueryParamRow::default());
        self.sync(model);
    }

    /// Removes the row at `index`; removing the last row leaves an empty placeholder.
    pub fn remove_row(&mut self, model: &mut RequestModel, index: usize) -> Result<()> {
        remove_keeping_placeholder(&mut self.rows, index)?;
        self.sync(model);
        Ok(())
    }

    /// Sets the key or value of the row at `index`.
    pub fn set_field(
        &mut self,
        model: &mut RequestModel,
        index: usize,
        field: RowField,
        text: impl Into<String>,
    ) -> Result<()> {
        row_mut(&mut self.rows, index)?.set(field, text.into());
        self.sync(model);
        Ok(())
    }

    /// Enables or disables the row at `index`.
    pub fn set_enabled(&mut self, model: &mut RequestModel, index: usize, enabled: bool) -> Result<()> {
        row_mut(&mut self.rows, index)?.enabled = enabled;
        self.sync(model);
        Ok(())
    }

    fn sync(&self, model: &mut RequestModel) {
        let query = self.query_string();
        match replace_query(model.url(), &query) {
            Some(url) => {
                tracing::debug!(url = %url, "Rewriting URL from query parameters");
                model.set_url(url);
            }
            None => {
                tracing::trace!("URL has no base; skipping query rewrite");
            }
        }
    }
}

impl Default for QueryParamEditor {
    fn default() -> Self {
        Self::new()
    }
}
