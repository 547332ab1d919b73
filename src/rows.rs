//! Key/value rows shared by the row-based editors.

use crate::{Error, Result};

/// Which half of a key/value row an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    /// The key (name) column.
    Key,
    /// The value column.
    Value,
}

/// A plain key/value row, as used by the header and body editors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueRow {
    /// Row key, exactly as typed.
    pub key: String,
    /// Row value, exactly as typed.
    pub value: String,
}

impl KeyValueRow {
    /// Creates a row from a key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns `true` if the key is blank once trimmed; such rows are never serialized.
    pub fn is_blank(&self) -> bool {
        self.key.trim().is_empty()
    }

    pub(crate) fn set(&mut self, field: RowField, text: String) {
        match field {
            RowField::Key => self.key = text,
            RowField::Value => self.value = text,
        }
    }
}

pub(crate) fn row_mut<T>(rows: &mut [T], index: usize) -> Result<&mut T> {
    let len = rows.len();
    rows.get_mut(index)
        .ok_or(Error::RowOutOfRange { index, len })
}

/// Removes `index` and re-seeds a default row if the list would become empty.
pub(crate) fn remove_keeping_placeholder<T: Default>(rows: &mut Vec<T>, index: usize) -> Result<T> {
    if index >= rows.len() {
        return Err(Error::RowOutOfRange {
            index,
            len: rows.len(),
        });
    }
    let removed = rows.remove(index);
    if rows.is_empty() {
        rows.push(T::default());
    }
    Ok(removed)
}
