//! Tabular result type
//!
//! [`Frame`] is the shape the single-value cache layout persists: named
//! columns over row-major JSON scalar cells, with an optional marker naming
//! one column as the index.

use recache_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A small, serializable table of JSON values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// An empty frame with the given column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            index: None,
            rows: Vec::new(),
        }
    }

    /// Mark an existing column as the index
    ///
    /// The marker survives the binary codec only; the row-text format does
    /// not carry it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no column has that name.
    pub fn with_index(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !self.columns.iter().any(|c| *c == name) {
            return Err(Error::configuration(format!(
                "index column '{name}' is not one of the frame's columns"
            )));
        }
        self.index = Some(name);
        Ok(self)
    }

    /// Append one row
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the row's arity does not match
    /// the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::serialization(format!(
                "row has {} cells but the frame has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Convert a wrapped computation's raw result into a frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResultType`] when the value is not frame-shaped.
    /// Nothing is persisted on that path.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::result_type("a frame", e.to_string()))
    }

    /// Column names, in order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The index column's name, if one is marked
    #[must_use]
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Rows, in insertion order
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cell at (`row`, `col`), if in range
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row)?.get(col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_row_checks_arity() {
        let mut frame = Frame::new(["a", "b"]);
        frame.push_row(vec![json!(1), json!(2)]).unwrap();
        let err = frame.push_row(vec![json!(1)]).unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn index_must_name_an_existing_column() {
        let frame = Frame::new(["id", "value"]);
        assert!(frame.clone().with_index("id").is_ok());
        let err = frame.with_index("missing").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn from_value_round_trips_a_serialized_frame() {
        let mut frame = Frame::new(["n"]);
        frame.push_row(vec![json!(1)]).unwrap();
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(Frame::from_value(value).unwrap(), frame);
    }

    #[test]
    fn from_value_rejects_non_frames() {
        for wrong in [json!(7), json!("table"), json!([1, 2, 3])] {
            let err = Frame::from_value(wrong).unwrap_err();
            assert!(matches!(err, Error::ResultType { .. }));
        }
    }

    #[test]
    fn cell_access_is_bounds_checked() {
        let mut frame = Frame::new(["a"]);
        frame.push_row(vec![json!("x")]).unwrap();
        assert_eq!(frame.get(0, 0), Some(&json!("x")));
        assert_eq!(frame.get(0, 1), None);
        assert_eq!(frame.get(1, 0), None);
    }
}
