//! Header editor with two-way sync against the model's header map.
//!
//! Outbound, the rows are folded into a [`Headers`] map and written to the
//! model. Inbound, a header map changed by someone else (the body editor
//! injecting `Content-Type`, a host loading a request) regenerates the rows.
//! The editor remembers the headers generation its own last write produced and
//! never regenerates from that generation, so its own writes do not bounce back
//! and reorder or collapse the rows being typed into.

use crate::rows::{remove_keeping_placeholder, row_mut, KeyValueRow, RowField};
use crate::{Headers, RequestModel, Result};

/// A single header row.
pub type HeaderRow = KeyValueRow;

/// Builds one row per map entry, or a single placeholder row for an empty map.
pub fn rows_from_headers(headers: &Headers) -> Vec<HeaderRow> {
    if headers.is_empty() {
        return vec![HeaderRow::default()];
    }
    headers.iter().map(|(k, v)| HeaderRow::new(k, v)).collect()
}

/// Folds rows into a map keyed by trimmed name; blank keys are skipped and the
/// last row with a given name wins.
pub fn headers_from_rows(rows: &[HeaderRow]) -> Headers {
    rows.iter()
        .filter(|row| !row.is_blank())
        .map(|row| (row.key.trim(), row.value.as_str()))
        .collect()
}

/// Editor for the request header table.
///
/// # Examples
///
/// ```
/// use reqform::{HeaderEditor, RequestModel, RowField};
///
/// let mut model = RequestModel::new();
/// let mut headers = HeaderEditor::new(&model);
///
/// headers.set_field(&mut model, 0, RowField::Key, "Authorization")?;
/// headers.set_field(&mut model, 0, RowField::Value, "Bearer abc")?;
/// assert_eq!(model.headers().get("Authorization"), Some("Bearer abc"));
///
/// // A change made elsewhere shows up after an inbound sync.
/// model.insert_header("Content-Type", "application/json");
/// assert!(headers.sync_inbound(&model));
/// assert_eq!(headers.rows().len(), 2);
/// # Ok::<(), reqform::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HeaderEditor {
    rows: Vec<HeaderRow>,
    /// Headers generation the rows currently reflect.
    seen: u64,
    /// Headers generation produced by this editor's most recent write.
    own_write: Option<u64>,
}

impl HeaderEditor {
    /// Creates an editor seeded from the model's current headers.
    pub fn new(model: &RequestModel) -> Self {
        Self {
            rows: rows_from_headers(model.headers()),
            seen: model.revision().headers,
            own_write: None,
        }
    }

    /// The current rows, in display order.
    pub fn rows(&self) -> &[HeaderRow] {
        &self.rows
    }

    /// Regenerates the rows if the model's headers were changed by someone else.
    ///
    /// Returns `true` if the rows were regenerated. A change that carries the
    /// generation of this editor's own last write is skipped exactly once.
    pub fn sync_inbound(&mut self, model: &RequestModel) -> bool {
        if !self.take_external_change(model) {
            return false;
        }
        tracing::debug!(
            generation = self.seen,
            count = model.headers().len(),
            "Regenerating header rows from model"
        );
        self.rows = rows_from_headers(model.headers());
        true
    }

    /// Writes the map derived from the current rows into the model.
    pub fn sync_outbound(&mut self, model: &mut RequestModel) {
        let headers = headers_from_rows(&self.rows);
        let before = model.revision().headers;
        let generation = model.set_headers(headers);
        if generation != before {
            tracing::debug!(generation, "Wrote header rows to model");
            self.own_write = Some(generation);
        }
    }

    /// Appends an empty row.
    pub fn add_row(&mut self, model: &mut RequestModel) {
        self.edit(model, |rows| {
            rows.push(HeaderRow::default());
            Ok(())
        })
        .unwrap_or_default();
    }

    /// Removes the row at `index`; removing the last row leaves an empty placeholder.
    pub fn remove_row(&mut self, model: &mut RequestModel, index: usize) -> Result<()> {
        self.edit(model, |rows| remove_keeping_placeholder(rows, index).map(|_| ()))
    }

    /// Sets the key or value of the row at `index`.
    ///
    /// `index` refers to [`rows`](Self::rows) as they were before this call.
    /// Headers another writer added or changed since then are merged into the
    /// rows after the edit, so neither the edit nor the external entry is lost.
    pub fn set_field(
        &mut self,
        model: &mut RequestModel,
        index: usize,
        field: RowField,
        text: impl Into<String>,
    ) -> Result<()> {
        let text = text.into();
        self.edit(model, |rows| {
            row_mut(rows, index)?.set(field, text);
            Ok(())
        })
    }

    /// Applies `apply` to the rows the host last saw, folds in any external
    /// header change made since then, and writes the result back.
    fn edit<F>(&mut self, model: &mut RequestModel, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<HeaderRow>) -> Result<()>,
    {
        let shown = headers_from_rows(&self.rows);
        let external = self.take_external_change(model);

        if let Err(e) = apply(&mut self.rows) {
            if external {
                self.rows = rows_from_headers(model.headers());
            }
            return Err(e);
        }

        if external {
            tracing::debug!(
                generation = self.seen,
                "Merging external header changes into edited rows"
            );
            merge_external(&mut self.rows, &shown, model.headers());
        }
        self.sync_outbound(model);
        Ok(())
    }

    /// Marks the model's current headers generation as seen and reports
    /// whether it came from someone other than this editor.
    fn take_external_change(&mut self, model: &RequestModel) -> bool {
        let current = model.revision().headers;
        if current == self.seen {
            return false;
        }
        self.seen = current;

        if self.own_write.take() == Some(current) {
            tracing::trace!(generation = current, "Skipping inbound sync of own header write");
            return false;
        }
        true
    }
}

/// Three-way merge of an external header change into locally edited rows.
///
/// `shown` is the map the rows produced before the local edit and `external`
/// is the model's map now. Entries `external` added or changed update every
/// row carrying that name, or are appended. Entries `external` dropped remove
/// the rows that still hold the dropped name and value.
fn merge_external(rows: &mut Vec<HeaderRow>, shown: &Headers, external: &Headers) {
    for (name, value) in external.iter() {
        if shown.get(name) == Some(value) {
            continue;
        }
        let mut matched = false;
        for row in rows.iter_mut().filter(|row| row.key.trim() == name) {
            row.value = value.to_string();
            matched = true;
        }
        if !matched {
            rows.push(HeaderRow::new(name, value));
        }
    }

    for (name, value) in shown.iter() {
        if external.get(name).is_none() {
            rows.retain(|row| !(row.key.trim() == name && row.value == value));
        }
    }

    if rows.is_empty() {
        rows.push(HeaderRow::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_header(editor: &mut HeaderEditor, model: &mut RequestModel, index: usize, key: &str, value: &str) {
        editor.set_field(model, index, RowField::Key, key).unwrap();
        editor.set_field(model, index, RowField::Value, value).unwrap();
    }

    #[test]
    fn test_round_trip_without_duplicates() {
        let headers: Headers = [
            ("Accept", "application/json"),
            ("X-Request-Id", "42"),
            ("authorization", "Bearer t"),
        ]
        .into_iter()
        .collect();

        let rows = rows_from_headers(&headers);
        assert_eq!(rows.len(), 3);
        assert_eq!(headers_from_rows(&rows), headers);
    }

    #[test]
    fn test_empty_map_gives_placeholder() {
        let rows = rows_from_headers(&Headers::new());
        assert_eq!(rows, vec![HeaderRow::default()]);
        assert!(headers_from_rows(&rows).is_empty());
    }

    #[test]
    fn test_rows_trim_keys_and_last_wins() {
        let rows = vec![
            HeaderRow::new(" Accept ", "text/html"),
            HeaderRow::new("", "orphan"),
            HeaderRow::new("Accept", "application/json"),
        ];
        let headers = headers_from_rows(&rows);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Accept"), Some("application/json"));
    }

    #[test]
    fn test_outbound_is_idempotent() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);
        type_header(&mut editor, &mut model, 0, "Accept", "*/*");

        editor.sync_outbound(&mut model);
        let first = model.headers().clone();
        editor.sync_outbound(&mut model);
        assert_eq!(model.headers(), &first);
    }

    #[test]
    fn test_own_write_does_not_regenerate_rows() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);

        // Two rows with the same key: the model collapses them, the rows must not.
        type_header(&mut editor, &mut model, 0, "X-Dup", "one");
        editor.add_row(&mut model);
        type_header(&mut editor, &mut model, 1, "X-Dup", "two");

        assert!(!editor.sync_inbound(&model));
        assert_eq!(editor.rows().len(), 2);
        assert_eq!(model.headers().len(), 1);
        assert_eq!(model.headers().get("X-Dup"), Some("two"));
    }

    #[test]
    fn test_external_write_regenerates_rows() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);
        type_header(&mut editor, &mut model, 0, "Accept", "*/*");

        model.insert_header("Content-Type", "application/json");
        assert!(editor.sync_inbound(&model));
        assert_eq!(
            editor.rows(),
            &[
                HeaderRow::new("Accept", "*/*"),
                HeaderRow::new("Content-Type", "application/json"),
            ]
        );
        assert!(!editor.sync_inbound(&model));
    }

    #[test]
    fn test_edit_after_external_write_keeps_injected_header() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);
        type_header(&mut editor, &mut model, 0, "Accept", "*/*");

        model.insert_header("Content-Type", "text/plain");
        editor.set_field(&mut model, 0, RowField::Value, "application/json").unwrap();

        assert_eq!(model.headers().get("Accept"), Some("application/json"));
        assert_eq!(model.headers().get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_typing_into_blank_row_keeps_injected_header() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);
        type_header(&mut editor, &mut model, 0, "Accept", "*/*");
        editor.add_row(&mut model);

        // The body editor adds Content-Type before the host re-renders.
        model.insert_header("Content-Type", "application/json");
        editor.set_field(&mut model, 1, RowField::Key, "X").unwrap();

        assert_eq!(
            editor.rows(),
            &[
                HeaderRow::new("Accept", "*/*"),
                HeaderRow::new("X", ""),
                HeaderRow::new("Content-Type", "application/json"),
            ]
        );
        assert_eq!(model.headers().get("Accept"), Some("*/*"));
        assert_eq!(model.headers().get("X"), Some(""));
        assert_eq!(model.headers().get("Content-Type"), Some("application/json"));
        assert!(!editor.sync_inbound(&model));
    }

    #[test]
    fn test_external_value_change_updates_existing_row() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);
        type_header(&mut editor, &mut model, 0, "Content-Type", "text/plain");
        editor.add_row(&mut model);

        model.insert_header("Content-Type", "application/json");
        editor.set_field(&mut model, 1, RowField::Key, "Accept").unwrap();

        assert_eq!(
            editor.rows(),
            &[
                HeaderRow::new("Content-Type", "application/json"),
                HeaderRow::new("Accept", ""),
            ]
        );
    }

    #[test]
    fn test_external_removal_drops_untouched_rows_only() {
        let mut model = RequestModel::new();
        model.insert_header("Accept", "*/*");
        model.insert_header("X-Trace", "1");
        let mut editor = HeaderEditor::new(&model);

        model.set_headers(Headers::new());
        editor.set_field(&mut model, 1, RowField::Value, "2").unwrap();

        assert_eq!(editor.rows(), &[HeaderRow::new("X-Trace", "2")]);
        assert_eq!(model.headers().get("Accept"), None);
        assert_eq!(model.headers().get("X-Trace"), Some("2"));
    }

    #[test]
    fn test_failed_edit_still_shows_external_change() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);

        model.insert_header("Content-Type", "text/plain");
        assert!(matches!(
            editor.set_field(&mut model, 5, RowField::Key, "X"),
            Err(crate::Error::RowOutOfRange { index: 5, len: 1 })
        ));
        assert_eq!(editor.rows(), &[HeaderRow::new("Content-Type", "text/plain")]);
        assert_eq!(model.headers().len(), 1);
    }

    #[test]
    fn test_remove_last_row_leaves_placeholder() {
        let mut model = RequestModel::new();
        let mut editor = HeaderEditor::new(&model);
        type_header(&mut editor, &mut model, 0, "Accept", "*/*");

        editor.remove_row(&mut model, 0).unwrap();
        assert_eq!(editor.rows(), &[HeaderRow::default()]);
        assert!(model.headers().is_empty());
    }

    #[test]
    fn test_seeded_from_existing_headers() {
        let mut model = RequestModel::new();
        model.insert_header("Accept", "*/*");
        let editor = HeaderEditor::new(&model);
        assert_eq!(editor.rows(), &[HeaderRow::new("Accept", "*/*")]);
    }
}
