//! Body editor: one active encoding mode, serialized into the model's body.
//!
//! Switching modes never touches the model. Only an edit made in the active
//! mode serializes that mode's content into `body`, and, for the modes that
//! have a natural media type, adds a `Content-Type` header when none exists.
//! An existing header is never overwritten, whatever its case, and the check
//! runs on every edit because the user may have deleted the header since.

use crate::rows::{remove_keeping_placeholder, row_mut, KeyValueRow, RowField};
use crate::{RequestModel, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `Content-Type` header name as inserted by the editor.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Media type for URL-encoded form bodies.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Media type for raw JSON bodies.
pub const JSON: &str = "application/json";

/// Media type for raw text bodies.
pub const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";

/// How the request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyMode {
    /// No body.
    #[default]
    None,
    /// Key/value rows sent as a JSON object.
    FormData,
    /// Key/value rows sent as `key=value&...`.
    #[serde(rename = "x-www-form-urlencoded")]
    UrlEncoded,
    /// Free text.
    Raw,
    /// A file on disk. Its bytes are never attached.
    Binary,
}

impl BodyMode {
    /// Returns `true` for the modes edited as key/value rows.
    pub fn uses_rows(&self) -> bool {
        matches!(self, BodyMode::FormData | BodyMode::UrlEncoded)
    }
}

/// What kind of text the raw mode holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
    /// JSON text.
    #[default]
    Json,
    /// Plain text.
    Text,
}

impl RawKind {
    /// The `Content-Type` value inferred for this kind.
    pub fn content_type(&self) -> &'static str {
        match self {
            RawKind::Json => JSON,
            RawKind::Text => TEXT_PLAIN,
        }
    }
}

/// Serializes key/value rows for a row-based mode.
///
/// Blank keys are skipped. For `FormData` a repeated key keeps its first
/// position and takes its last value. Returns `None` for modes that are not
/// row-based.
///
/// ```
/// use reqform::body::{serialize_rows, BodyMode};
/// use reqform::KeyValueRow;
///
/// let rows = [KeyValueRow::new("name", "Ada Lovelace"), KeyValueRow::new("", "x")];
/// assert_eq!(
///     serialize_rows(BodyMode::UrlEncoded, &rows).as_deref(),
///     Some("name=Ada+Lovelace")
/// );
/// assert_eq!(
///     serialize_rows(BodyMode::FormData, &rows).as_deref(),
///     Some(r#"{"name":"Ada Lovelace"}"#)
/// );
/// ```
pub fn serialize_rows(mode: BodyMode, rows: &[KeyValueRow]) -> Option<String> {
    let filled = rows.iter().filter(|row| !row.is_blank());
    match mode {
        BodyMode::UrlEncoded => {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for row in filled {
                serializer.append_pair(&row.key, &row.value);
            }
            Some(serializer.finish())
        }
        BodyMode::FormData => {
            let mut object = serde_json::Map::new();
            for row in filled {
                object.insert(row.key.clone(), serde_json::Value::String(row.value.clone()));
            }
            Some(serde_json::Value::Object(object).to_string())
        }
        BodyMode::None | BodyMode::Raw | BodyMode::Binary => None,
    }
}

/// Editor for the request body.
///
/// # Examples
///
/// ```
/// use reqform::{BodyEditor, BodyMode, RequestModel};
///
/// let mut model = RequestModel::new();
/// let mut body = BodyEditor::new();
///
/// body.set_mode(BodyMode::Raw);
/// assert_eq!(model.body(), "");
///
/// body.set_raw_text(&mut model, r#"{"id":1}"#);
/// assert_eq!(model.body(), r#"{"id":1}"#);
/// assert_eq!(model.headers().get("Content-Type"), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct BodyEditor {
    mode: BodyMode,
    rows: Vec<KeyValueRow>,
    raw_text: String,
    raw_kind: RawKind,
    binary_file: Option<PathBuf>,
}

impl BodyEditor {
    /// Creates an editor in `None` mode with one empty row and no raw text.
    pub fn new() -> Self {
        Self {
            mode: BodyMode::None,
            rows: vec![KeyValueRow::default()],
            raw_text: String::new(),
            raw_kind: RawKind::Json,
            binary_file: None,
        }
    }

    /// The active mode.
    pub fn mode(&self) -> BodyMode {
        self.mode
    }

    /// Switches the active mode without writing anything to the model.
    pub fn set_mode(&mut self, mode: BodyMode) {
        tracing::trace!(?mode, "Switching body mode");
        self.mode = mode;
    }

    /// The raw sub-mode.
    pub fn raw_kind(&self) -> RawKind {
        self.raw_kind
    }

    /// Switches the raw sub-mode; takes effect on the next raw edit.
    pub fn set_raw_kind(&mut self, kind: RawKind) {
        self.raw_kind = kind;
    }

    /// The key/value rows shared by the form-data and urlencoded modes.
    pub fn rows(&self) -> &[KeyValueRow] {
        &self.rows
    }

    /// The raw text area content.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The file picked in binary mode, if any.
    pub fn binary_file(&self) -> Option<&Path> {
        self.binary_file.as_deref()
    }

    /// Appends an empty row.
    pub fn add_row(&mut self, model: &mut RequestModel) {
        self.rows.push(KeyValueRow::default());
        self.write_rows(model);
    }

    /// Removes the row at `index`; removing the last row leaves an empty placeholder.
    pub fn remove_row(&mut self, model: &mut RequestModel, index: usize) -> Result<()> {
        remove_keeping_placeholder(&mut self.rows, index)?;
        self.write_rows(model);
        Ok(())
    }

    /// Sets the key or value of the row at `index`.
    ///
    /// The body is rewritten only when a row-based mode is active.
    pub fn set_field(
        &mut self,
        model: &mut RequestModel,
        index: usize,
        field: RowField,
        text: impl Into<String>,
    ) -> Result<()> {
        row_mut(&mut self.rows, index)?.set(field, text.into());
        self.write_rows(model);
        Ok(())
    }

    /// Replaces the raw text.
    ///
    /// In raw mode the text is written to the body verbatim and a
    /// `Content-Type` matching the raw kind is added if none exists. In any
    /// other mode the text is only kept for when raw mode is selected.
    pub fn set_raw_text(&mut self, model: &mut RequestModel, text: impl Into<String>) {
        self.raw_text = text.into();
        if self.mode != BodyMode::Raw {
            return;
        }
        model.set_body(self.raw_text.clone());
        tracing::debug!(len = self.raw_text.len(), kind = ?self.raw_kind, "Wrote raw body");
        ensure_content_type(model, self.raw_kind.content_type());
    }

    /// Records the file picked in binary mode. The model is not touched.
    pub fn select_binary(&mut self, path: Option<PathBuf>) {
        self.binary_file = path;
    }

    fn write_rows(&self, model: &mut RequestModel) {
        let Some(body) = serialize_rows(self.mode, &self.rows) else {
            return;
        };
        tracing::debug!(mode = ?self.mode, len = body.len(), "Wrote row body");
        model.set_body(body);
        if self.mode == BodyMode::UrlEncoded {
            ensure_content_type(model, FORM_URLENCODED);
        }
    }
}

impl Default for BodyEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds `Content-Type: value` unless a header of that name exists in any case.
///
/// Returns `true` if the header was added.
pub fn ensure_content_type(model: &mut RequestModel, value: &str) -> bool {
    if model.headers().contains_key_ignore_case(CONTENT_TYPE) {
        return false;
    }
    tracing::debug!(content_type = value, "Adding default Content-Type");
    model.insert_header(CONTENT_TYPE, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(editor: &mut BodyEditor, model: &mut RequestModel, pairs: &[(&str, &str)]) {
        for (i, (k, v)) in pairs.iter().enumerate() {
            if i > 0 {
                editor.add_row(model);
            }
            editor.set_field(model, i, RowField::Key, *k).unwrap();
            editor.set_field(model, i, RowField::Value, *v).unwrap();
        }
    }

    #[test]
    fn test_switching_mode_has_no_side_effect() {
        let mut model = RequestModel::new();
        model.set_body("preset");
        let mut editor = BodyEditor::new();

        editor.set_mode(BodyMode::UrlEncoded);
        editor.set_mode(BodyMode::Raw);
        editor.set_raw_kind(RawKind::Text);

        assert_eq!(model.body(), "preset");
        assert!(model.headers().is_empty());
    }

    #[test]
    fn test_urlencoded_rows_and_content_type() {
        let mut model = RequestModel::new();
        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::UrlEncoded);
        fill(&mut editor, &mut model, &[("user", "ada"), ("", "skip"), ("note", "a&b c")]);

        assert_eq!(model.body(), "user=ada&note=a%26b+c");
        assert_eq!(model.headers().get("Content-Type"), Some(FORM_URLENCODED));
    }

    #[test]
    fn test_form_data_is_json_object_without_content_type() {
        let mut model = RequestModel::new();
        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::FormData);
        fill(&mut editor, &mut model, &[("b", "1"), ("a", "2"), ("b", "3")]);

        assert_eq!(model.body(), r#"{"b":"3","a":"2"}"#);
        assert!(model.headers().is_empty());
    }

    #[test]
    fn test_raw_json_and_text_content_types() {
        let mut model = RequestModel::new();
        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::Raw);
        editor.set_raw_kind(RawKind::Text);
        editor.set_raw_text(&mut model, "hello");

        assert_eq!(model.body(), "hello");
        assert_eq!(model.headers().get("Content-Type"), Some(TEXT_PLAIN));

        // Header already present: switching to json does not replace it.
        editor.set_raw_kind(RawKind::Json);
        editor.set_raw_text(&mut model, "{}");
        assert_eq!(model.headers().get("Content-Type"), Some(TEXT_PLAIN));
    }

    #[test]
    fn test_existing_content_type_in_any_case_is_kept() {
        let mut model = RequestModel::new();
        model.insert_header("content-type", "text/csv");
        let before = model.headers().clone();

        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::Raw);
        editor.set_raw_kind(RawKind::Json);
        editor.set_raw_text(&mut model, "a,b\n1,2");

        assert_eq!(model.headers(), &before);
        assert_eq!(model.body(), "a,b\n1,2");
    }

    #[test]
    fn test_content_type_reinserted_after_user_deletes_it() {
        let mut model = RequestModel::new();
        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::Raw);
        editor.set_raw_text(&mut model, "{");
        assert!(model.headers().contains_key_ignore_case("content-type"));

        model.set_headers(crate::Headers::new());
        editor.set_raw_text(&mut model, "{}");
        assert_eq!(model.headers().get("Content-Type"), Some(JSON));
    }

    #[test]
    fn test_row_edits_outside_row_modes_do_not_write() {
        let mut model = RequestModel::new();
        let mut editor = BodyEditor::new();
        editor.set_field(&mut model, 0, RowField::Key, "k").unwrap();
        editor.set_raw_text(&mut model, "text");

        assert_eq!(model.body(), "");
        assert_eq!(model.revision().body, 0);
        assert_eq!(editor.raw_text(), "text");
    }

    #[test]
    fn test_removing_row_reserializes() {
        let mut model = RequestModel::new();
        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::FormData);
        fill(&mut editor, &mut model, &[("a", "1"), ("b", "2")]);

        editor.remove_row(&mut model, 0).unwrap();
        assert_eq!(model.body(), r#"{"b":"2"}"#);

        editor.remove_row(&mut model, 0).unwrap();
        assert_eq!(editor.rows(), &[KeyValueRow::default()]);
        assert_eq!(model.body(), "{}");
    }

    #[test]
    fn test_binary_selection_leaves_body_alone() {
        let mut model = RequestModel::new();
        model.set_body("keep");
        let mut editor = BodyEditor::new();
        editor.set_mode(BodyMode::Binary);
        editor.select_binary(Some(PathBuf::from("/tmp/upload.bin")));

        assert_eq!(editor.binary_file(), Some(Path::new("/tmp/upload.bin")));
        assert_eq!(model.body(), "keep");
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(
            serde_json::to_string(&BodyMode::UrlEncoded).unwrap(),
            r#""x-www-form-urlencoded""#
        );
        assert_eq!(serde_json::to_string(&BodyMode::FormData).unwrap(), r#""form-data""#);
        assert_eq!(serde_json::to_string(&RawKind::Text).unwrap(), r#""text""#);
    }
}
