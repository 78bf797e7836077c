//! Extension-selected frame codecs
//!
//! Two interchangeable on-disk formats, picked by the bucket file extension:
//!
//! - `csv` — row-oriented text: a header line of column names followed by
//!   one delimited line per row. Scalar cell types are re-inferred on read
//!   (quoted fields always come back as strings); the index marker is not
//!   carried by this format.
//! - `bin` — columnar binary (MessagePack): columns are transposed on
//!   encode, and the full frame including the index marker round-trips.
//!
//! Any other extension is rejected with [`Error::UnsupportedFormat`] before
//! any file is touched.

use crate::frame::Frame;
use recache_core::{Codec, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extension of the row-oriented text format
pub const CSV_EXT: &str = "csv";
/// Extension of the columnar binary format
pub const BIN_EXT: &str = "bin";

/// Select the codec registered for `ext`
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for any unknown extension.
pub fn codec_for(ext: &str) -> Result<Box<dyn Codec<Value = Frame>>> {
    match ext {
        CSV_EXT => Ok(Box::new(CsvCodec)),
        BIN_EXT => Ok(Box::new(BinCodec)),
        other => Err(Error::unsupported_format(other)),
    }
}

/// Row-oriented delimited text
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvCodec;

impl Codec for CsvCodec {
    type Value = Frame;

    fn extension(&self) -> &'static str {
        CSV_EXT
    }

    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        let mut out = String::new();
        write_record(
            &mut out,
            frame.columns().iter().map(|c| (c.clone(), false)),
        );
        for row in frame.rows() {
            if row.len() != frame.columns().len() {
                return Err(Error::serialization(format!(
                    "row has {} cells but the frame has {} columns",
                    row.len(),
                    frame.columns().len()
                )));
            }
            let fields = row
                .iter()
                .map(render_cell)
                .collect::<Result<Vec<(String, bool)>>>()?;
            write_record(&mut out, fields.into_iter());
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Frame> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::serialization(format!("csv bytes are not UTF-8: {e}")))?;
        let mut records = parse_records(text).into_iter();
        let Some(header) = records.next() else {
            return Ok(Frame::default());
        };
        let mut frame = Frame::new(header.into_iter().map(|(field, _)| field));
        for record in records {
            if record.len() != frame.columns().len() {
                return Err(Error::serialization(format!(
                    "csv record has {} fields but the header has {}",
                    record.len(),
                    frame.columns().len()
                )));
            }
            let row = record
                .into_iter()
                .map(|(field, quoted)| infer_cell(&field, quoted))
                .collect();
            frame.push_row(row)?;
        }
        Ok(frame)
    }
}

fn write_record(out: &mut String, fields: impl Iterator<Item = (String, bool)>) {
    let mut first = true;
    for (field, force_quote) in fields {
        if !first {
            out.push(',');
        }
        first = false;
        push_escaped(out, &field, force_quote);
    }
    out.push('\n');
}

fn push_escaped(out: &mut String, field: &str, force_quote: bool) {
    if force_quote
        || field.contains(',')
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r')
    {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Render a cell as `(text, force_quote)`
///
/// String cells whose raw text would be re-inferred as something else on
/// read (empty, booleans, numerals) are force-quoted so they stay strings.
fn render_cell(value: &Value) -> Result<(String, bool)> {
    match value {
        Value::Null => Ok((String::new(), false)),
        Value::Bool(b) => Ok((b.to_string(), false)),
        Value::Number(n) => Ok((n.to_string(), false)),
        Value::String(s) => {
            let ambiguous =
                s.is_empty() || s == "true" || s == "false" || s.parse::<f64>().is_ok();
            Ok((s.clone(), ambiguous))
        }
        // Nested values are stored as compact JSON text; they decode back
        // as that text, not as structured values.
        nested => serde_json::to_string(nested)
            .map(|text| (text, false))
            .map_err(|e| Error::serialization(format!("failed to encode nested cell: {e}"))),
    }
}

/// Split text into records of `(field, was_quoted)` pairs
fn parse_records(text: &str) -> Vec<Vec<(String, bool)>> {
    let mut records = Vec::new();
    let mut record: Vec<(String, bool)> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                record.push((std::mem::take(&mut field), quoted));
                quoted = false;
            }
            '\n' => {
                record.push((std::mem::take(&mut field), quoted));
                quoted = false;
                records.push(std::mem::take(&mut record));
            }
            '\r' => {} // tolerated; '\n' terminates the record
            _ => field.push(c),
        }
    }
    if !field.is_empty() || quoted || !record.is_empty() {
        record.push((field, quoted));
        records.push(record);
    }
    records
}

fn infer_cell(field: &str, quoted: bool) -> Value {
    if quoted {
        return Value::String(field.to_string());
    }
    if field.is_empty() {
        return Value::Null;
    }
    if field == "true" {
        return Value::Bool(true);
    }
    if field == "false" {
        return Value::Bool(false);
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = field.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(field.to_string())
}

/// Columnar binary via MessagePack
#[derive(Debug, Default, Clone, Copy)]
pub struct BinCodec;

/// On-disk shape of the binary format: one vector per column
#[derive(Serialize, Deserialize)]
struct Columnar {
    columns: Vec<String>,
    index: Option<String>,
    data: Vec<Vec<Value>>,
}

impl Codec for BinCodec {
    type Value = Frame;

    fn extension(&self) -> &'static str {
        BIN_EXT
    }

    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        let mut data: Vec<Vec<Value>> = frame
            .columns()
            .iter()
            .map(|_| Vec::with_capacity(frame.len()))
            .collect();
        for row in frame.rows() {
            if row.len() != frame.columns().len() {
                return Err(Error::serialization(format!(
                    "row has {} cells but the frame has {} columns",
                    row.len(),
                    frame.columns().len()
                )));
            }
            for (col, cell) in data.iter_mut().zip(row) {
                col.push(cell.clone());
            }
        }
        let columnar = Columnar {
            columns: frame.columns().to_vec(),
            index: frame.index().map(ToString::to_string),
            data,
        };
        rmp_serde::to_vec_named(&columnar)
            .map_err(|e| Error::serialization(format!("failed to encode frame: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Frame> {
        let columnar: Columnar = rmp_serde::from_slice(bytes)
            .map_err(|e| Error::serialization(format!("failed to decode frame: {e}")))?;
        let row_count = columnar.data.first().map_or(0, Vec::len);
        if columnar.data.iter().any(|col| col.len() != row_count) {
            return Err(Error::serialization(
                "columnar frame has columns of unequal length",
            ));
        }
        let mut frame = Frame::new(columnar.columns);
        for i in 0..row_count {
            let row = columnar.data.iter().map(|col| col[i].clone()).collect();
            frame.push_row(row)?;
        }
        match columnar.index {
            Some(name) => frame.with_index(name),
            None => Ok(frame),
        }
    }
}
