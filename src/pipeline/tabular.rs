//! Tabular conversion: CSV / TSV / JSON / XLSX ⇄ [`Table`].
//!
//! Every source is first read into one uniform in-memory table (ordered
//! column names plus rows of typed [`Cell`]s), then written out in the
//! target format. Column order and row order are carried through untouched.
//!
//! Types are whatever the reader can infer, nothing more: CSV/TSV fields are
//! sniffed as bool / integer / float / text, JSON values keep their JSON
//! type, XLSX cells keep their stored type (date-formatted cells read as
//! datetimes). No schema is applied.

use crate::error::ConvertError;
use crate::format::Format;
use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format as XlsxFormat, Workbook, XlsxError};
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use tracing::debug;

/// Largest integer an f64 (and therefore an XLSX number cell) holds exactly.
const MAX_EXACT_F64_INT: i64 = 1 << 53;

/// Text form of datetime cells in CSV/TSV output.
const DATETIME_TEXT: &str = "%Y-%m-%d %H:%M:%S";

/// Number format applied to datetime cells in XLSX output.
const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// The four tabular formats, split out of [`Format`] so the converter's
/// matches stay exhaustive over just these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabularFormat {
    Csv,
    Tsv,
    Json,
    Xlsx,
}

impl TryFrom<Format> for TabularFormat {
    type Error = ConvertError;

    fn try_from(format: Format) -> Result<Self, Self::Error> {
        match format {
            Format::Csv => Ok(Self::Csv),
            Format::Tsv => Ok(Self::Tsv),
            Format::Json => Ok(Self::Json),
            Format::Xlsx => Ok(Self::Xlsx),
            other => Err(ConvertError::UnsupportedFormat {
                extension: other.extension().to_string(),
            }),
        }
    }
}

impl TabularFormat {
    fn label(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
            Self::Json => "JSON",
            Self::Xlsx => "XLSX",
        }
    }
}

/// One cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Cell {
    /// Infer the type of a delimited-text field.
    pub fn infer(field: &str) -> Cell {
        if field.is_empty() {
            return Cell::Empty;
        }
        match field {
            "true" => return Cell::Bool(true),
            "false" => return Cell::Bool(false),
            _ => {}
        }
        if !looks_numeric(field) {
            return Cell::Text(field.to_string());
        }
        if let Ok(i) = field.parse::<i64>() {
            return Cell::Int(i);
        }
        match field.parse::<f64>() {
            Ok(f) if f.is_finite() => Cell::Float(f),
            _ => Cell::Text(field.to_string()),
        }
    }

    /// Text form written into CSV/TSV fields.
    fn to_field(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => format_float(*f),
            Cell::DateTime(dt) => dt.format(DATETIME_TEXT).to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::Number((*i).into()),
            Cell::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Cell::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }

    fn from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map_or(Cell::Empty, Cell::Float),
            },
            Value::String(s) => Cell::Text(s.clone()),
            // Arrays have no column of their own; keep them as JSON text.
            Value::Array(_) => Cell::Text(value.to_string()),
            Value::Object(_) => Cell::Text(value.to_string()),
        }
    }

    fn from_xlsx(data: &Data) -> Cell {
        match data {
            Data::Empty => Cell::Empty,
            Data::Bool(b) => Cell::Bool(*b),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => float_or_int(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) if dt.is_duration() => float_or_int(dt.as_f64()),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map_or_else(|| float_or_int(dt.as_f64()), Cell::DateTime),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

/// XLSX stores every number as f64; integral values read back as integers.
fn float_or_int(f: f64) -> Cell {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_F64_INT as f64 {
        Cell::Int(f as i64)
    } else {
        Cell::Float(f)
    }
}

/// Integers with leading zeros (`007`) or an explicit `+` are identifiers,
/// not numbers; keeping them as text preserves them byte for byte.
fn looks_numeric(field: &str) -> bool {
    let unsigned = field.strip_prefix('-').unwrap_or(field);
    let Some(first) = unsigned.chars().next() else {
        return false;
    };
    if !first.is_ascii_digit() {
        return false;
    }
    if first == '0' && unsigned.len() > 1 && !unsigned[1..].starts_with(['.', 'e', 'E']) {
        return false;
    }
    unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

/// Floats with no fractional part keep a trailing `.0` so they stay floats
/// on the next read.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// Uniform in-memory table: ordered column names and rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Build a table from a header row. Names are kept verbatim; blank
    /// names become `Unnamed: <i>`. A repeated name gets the first free
    /// `.1`, `.2`, … suffix, skipping names the header already uses.
    fn with_header<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| match name.as_ref() {
                "" => format!("Unnamed: {i}"),
                name => name.to_string(),
            })
            .collect();

        let mut taken: HashSet<String> = names.iter().cloned().collect();
        let mut used: HashSet<String> = HashSet::new();
        let mut next_suffix: HashMap<String, usize> = HashMap::new();
        let mut columns = Vec::with_capacity(names.len());

        for name in names {
            if used.insert(name.clone()) {
                columns.push(name);
                continue;
            }
            let suffix = next_suffix.entry(name.clone()).or_insert(1);
            let unique = loop {
                let candidate = format!("{name}.{suffix}");
                *suffix += 1;
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            taken.insert(unique.clone());
            used.insert(unique.clone());
            columns.push(unique);
        }

        Self {
            columns,
            rows: Vec::new(),
        }
    }
}

/// Convert tabular bytes from `source` to `target`.
pub fn convert(bytes: &[u8], source: Format, target: Format) -> Result<Vec<u8>, ConvertError> {
    let table = read_table(bytes, source)?;
    debug!(
        "Read {} table: {} columns × {} rows",
        source,
        table.columns.len(),
        table.rows.len()
    );
    write_table(&table, target)
}

/// Parse `bytes` in `format` into a [`Table`].
pub fn read_table(bytes: &[u8], format: Format) -> Result<Table, ConvertError> {
    match TabularFormat::try_from(format)? {
        f @ TabularFormat::Csv => read_delimited(bytes, b',', f),
        f @ TabularFormat::Tsv => read_delimited(bytes, b'\t', f),
        TabularFormat::Json => read_json(bytes),
        TabularFormat::Xlsx => read_xlsx(bytes),
    }
}

/// Serialise `table` in `format`.
pub fn write_table(table: &Table, format: Format) -> Result<Vec<u8>, ConvertError> {
    match TabularFormat::try_from(format)? {
        f @ TabularFormat::Csv => write_delimited(table, b',', f),
        f @ TabularFormat::Tsv => write_delimited(table, b'\t', f),
        TabularFormat::Json => write_json(table),
        TabularFormat::Xlsx => write_xlsx(table),
    }
}

// ── Delimited text ───────────────────────────────────────────────────────

fn read_delimited(bytes: &[u8], delimiter: u8, format: TabularFormat) -> Result<Table, ConvertError> {
    let err = |detail: String| ConvertError::parse(format.label(), detail);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| err(format!("Failed to read header row: {e}")))?
        .clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(err("No columns to parse from file".into()));
    }

    let mut table = Table::with_header(headers.iter());
    let width = table.columns.len();

    for result in reader.records() {
        let record = result.map_err(|e| err(format!("Failed to read record: {e}")))?;
        if record.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            return Err(err(format!(
                "Expected {width} fields in line {line}, saw {}",
                record.len()
            )));
        }
        let mut row: Vec<Cell> = record.iter().map(Cell::infer).collect();
        row.resize(width, Cell::Empty);
        table.rows.push(row);
    }

    Ok(table)
}

fn write_delimited(table: &Table, delimiter: u8, format: TabularFormat) -> Result<Vec<u8>, ConvertError> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }
    let err = |e: csv::Error| ConvertError::parse(format.label(), format!("Failed to write: {e}"));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(&table.columns).map_err(err)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::to_field))
            .map_err(err)?;
    }

    writer
        .into_inner()
        .map_err(|e| ConvertError::parse(format.label(), format!("Failed to flush: {e}")))
}

// ── JSON ─────────────────────────────────────────────────────────────────

/// Accepts an array of record objects, or one object as a single record.
/// Nested objects flatten into dot-joined columns in first-seen order.
fn read_json(bytes: &[u8]) -> Result<Table, ConvertError> {
    let err = |detail: String| ConvertError::parse("JSON", detail);

    let value: Value = serde_json::from_slice(bytes).map_err(|e| err(e.to_string()))?;
    let records = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(err(format!(
                "Expected an array of records or a single object, found {}",
                json_kind(&other)
            )))
        }
    };

    let mut table = Table::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        let Value::Object(map) = record else {
            return Err(err(format!(
                "Record {i} is {}, expected an object",
                json_kind(record)
            )));
        };

        let mut fields = Vec::new();
        flatten_record("", map, &mut fields);

        let mut row = vec![Cell::Empty; table.columns.len()];
        for (name, cell) in fields {
            let col = *index.entry(name.clone()).or_insert_with(|| {
                table.columns.push(name);
                table.columns.len() - 1
            });
            if col >= row.len() {
                row.resize(col + 1, Cell::Empty);
            }
            row[col] = cell;
        }
        table.rows.push(row);
    }

    let width = table.columns.len();
    for row in &mut table.rows {
        row.resize(width, Cell::Empty);
    }

    Ok(table)
}

fn flatten_record(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Cell)>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_record(&name, inner, out),
            Value::Object(_) => out.push((name, Cell::Empty)),
            other => out.push((name, Cell::from_json(other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn write_json(table: &Table) -> Result<Vec<u8>, ConvertError> {
    let records: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let map: Map<String, Value> = table
                .columns
                .iter()
                .cloned()
                .zip(row.iter().map(Cell::to_json))
                .collect();
            Value::Object(map)
        })
        .collect();

    serde_json::to_vec_pretty(&records).map_err(|e| ConvertError::parse("JSON", e))
}

// ── XLSX ─────────────────────────────────────────────────────────────────

/// Reads the first worksheet; its first row is the header.
fn read_xlsx(bytes: &[u8]) -> Result<Table, ConvertError> {
    let err = |detail: String| ConvertError::parse("XLSX", detail);

    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| err(format!("Failed to open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| err("Workbook has no sheets".into()))?
        .map_err(|e| err(format!("Failed to read first sheet: {e}")))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };

    let mut table = Table::with_header(header.iter().map(|d| match d {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));
    table
        .rows
        .extend(rows.map(|row| row.iter().map(Cell::from_xlsx).collect()));

    Ok(table)
}

/// Writes a single sheet named `Sheet1`: header row, then data rows.
fn write_xlsx(table: &Table) -> Result<Vec<u8>, ConvertError> {
    let err = |e: XlsxError| ConvertError::parse("XLSX", format!("Failed to write: {e}"));

    let datetime_format = XlsxFormat::new().set_num_format(DATETIME_NUM_FORMAT);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1").map_err(err)?;

    for (c, name) in table.columns.iter().enumerate() {
        let col = xlsx_col(c)?;
        sheet.write_string(0, col, name).map_err(err)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(r + 1)
            .map_err(|_| ConvertError::parse("XLSX", "Too many rows for a worksheet"))?;
        for (c, cell) in row.iter().enumerate() {
            let col = xlsx_col(c)?;
            match cell {
                Cell::Empty => {}
                Cell::Bool(b) => {
                    sheet.write_boolean(row_num, col, *b).map_err(err)?;
                }
                Cell::Int(i) if i.unsigned_abs() <= MAX_EXACT_F64_INT as u64 => {
                    sheet.write_number(row_num, col, *i as f64).map_err(err)?;
                }
                Cell::Int(i) => {
                    sheet.write_string(row_num, col, i.to_string()).map_err(err)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(row_num, col, *f).map_err(err)?;
                }
                Cell::DateTime(dt) => {
                    sheet
                        .write_datetime_with_format(row_num, col, dt, &datetime_format)
                        .map_err(err)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s).map_err(err)?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(err)
}

fn xlsx_col(index: usize) -> Result<u16, ConvertError> {
    u16::try_from(index).map_err(|_| ConvertError::parse("XLSX", "Too many columns for a worksheet"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE_CSV: &str = "id,name,score,active,note\n\
                              1,Ada,91.5,true,\n\
                              2,Grace,88.0,false,first compiler\n\
                              3,Linus,-4,true,007\n";

    fn csv_to(target: Format) -> Vec<u8> {
        convert(SAMPLE_CSV.as_bytes(), Format::Csv, target).expect("conversion should succeed")
    }

    #[test]
    fn infers_cell_types() {
        assert_eq!(Cell::infer(""), Cell::Empty);
        assert_eq!(Cell::infer("true"), Cell::Bool(true));
        assert_eq!(Cell::infer("42"), Cell::Int(42));
        assert_eq!(Cell::infer("-7"), Cell::Int(-7));
        assert_eq!(Cell::infer("2.5"), Cell::Float(2.5));
        assert_eq!(Cell::infer("0.25"), Cell::Float(0.25));
        assert_eq!(Cell::infer("1e3"), Cell::Float(1000.0));
        assert_eq!(Cell::infer("007"), Cell::Text("007".into()));
        assert_eq!(Cell::infer("+5"), Cell::Text("+5".into()));
        assert_eq!(Cell::infer("True"), Cell::Text("True".into()));
        assert_eq!(Cell::infer("NaN"), Cell::Text("NaN".into()));
        assert_eq!(Cell::infer("12-31"), Cell::Text("12-31".into()));
    }

    #[test]
    fn float_formatting_keeps_float_identity() {
        assert_eq!(format_float(88.0), "88.0");
        assert_eq!(format_float(91.5), "91.5");
        assert_eq!(Cell::infer(&format_float(88.0)), Cell::Float(88.0));
    }

    #[test]
    fn csv_json_csv_round_trip_is_exact() {
        let json = csv_to(Format::Json);
        let back = convert(&json, Format::Json, Format::Csv).unwrap();
        assert_eq!(String::from_utf8(back).unwrap(), SAMPLE_CSV);
    }

    /// XLSX stores all numbers as f64, so `88.0` comes back as `88`; compare
    /// numerically rather than textually.
    fn same_value(a: &Cell, b: &Cell) -> bool {
        match (a, b) {
            (Cell::Int(i), Cell::Float(f)) | (Cell::Float(f), Cell::Int(i)) => *i as f64 == *f,
            _ => a == b,
        }
    }

    #[test]
    fn csv_xlsx_csv_round_trip_preserves_values() {
        let xlsx = csv_to(Format::Xlsx);
        assert_eq!(&xlsx[..2], b"PK", "xlsx output should be a zip container");
        let back = convert(&xlsx, Format::Xlsx, Format::Csv).unwrap();

        let original = read_table(SAMPLE_CSV.as_bytes(), Format::Csv).unwrap();
        let round_tripped = read_table(&back, Format::Csv).unwrap();
        assert_eq!(original.columns(), round_tripped.columns());
        assert_eq!(original.rows().len(), round_tripped.rows().len());
        for (a, b) in original.rows().iter().zip(round_tripped.rows()) {
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b) {
                assert!(same_value(x, y), "{x:?} != {y:?}");
            }
        }
    }

    #[test]
    fn xlsx_output_reads_back_from_first_sheet() {
        let table = read_table(&csv_to(Format::Xlsx), Format::Xlsx).unwrap();
        assert_eq!(table.columns(), ["id", "name", "score", "active", "note"]);
        assert_eq!(table.rows()[1][1], Cell::Text("Grace".into()));
        assert_eq!(table.rows()[0][3], Cell::Bool(true));
        assert_eq!(table.rows()[2][4], Cell::Text("007".into()));
        assert_eq!(table.rows()[0][4], Cell::Empty);
    }

    #[test]
    fn csv_to_tsv_changes_only_the_delimiter() {
        let tsv = String::from_utf8(csv_to(Format::Tsv)).unwrap();
        assert_eq!(tsv, SAMPLE_CSV.replace(',', "\t"));
    }

    #[test]
    fn json_output_is_records_in_column_order() {
        let json = String::from_utf8(csv_to(Format::Json)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);

        let keys: Vec<&str> = records[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["id", "name", "score", "active", "note"]);
        assert_eq!(records[0]["note"], Value::Null);
        assert_eq!(records[2]["note"], Value::String("007".into()));
        assert!(json.contains("\n  {"), "pretty-printed with 2-space indent");
    }

    #[test]
    fn single_json_object_is_one_record() {
        let table = read_table(br#"{"a": 1, "b": "x"}"#, Format::Json).unwrap();
        assert_eq!(table.columns(), ["a", "b"]);
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn nested_json_flattens_with_dots() {
        let json = br#"[
            {"id": 1, "user": {"name": "Ada", "geo": {"city": "London"}}, "tags": ["a", "b"]},
            {"id": 2, "extra": true}
        ]"#;
        let table = read_table(json, Format::Json).unwrap();
        assert_eq!(
            table.columns(),
            ["id", "user.name", "user.geo.city", "tags", "extra"]
        );
        assert_eq!(table.rows()[0][3], Cell::Text(r#"["a","b"]"#.into()));
        assert_eq!(table.rows()[1][1], Cell::Empty);
        assert_eq!(table.rows()[1][4], Cell::Bool(true));
        assert_eq!(table.rows()[0][4], Cell::Empty);
    }

    #[test]
    fn json_keeps_unicode_unescaped() {
        let input = r#"[{"city": "東京"}]"#.as_bytes();
        let json = String::from_utf8(convert(input, Format::Json, Format::Json).unwrap()).unwrap();
        assert!(json.contains("\"city\": \"東京\""), "{json}");
        assert!(!json.contains("\\u"), "non-ASCII must not be escaped: {json}");

        let csv = convert(input, Format::Json, Format::Csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "city\n東京\n");
    }

    #[test]
    fn inconsistent_json_shape_is_a_parse_error() {
        let cases: [&[u8]; 4] = [b"42", b"[1, 2]", br#"[{"a": 1}, "x"]"#, b"{not json"];
        for bad in cases {
            let err = read_table(bad, Format::Json).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ParseError);
        }
    }

    #[test]
    fn ragged_csv_row_is_a_parse_error() {
        let err = read_table(b"a,b\n1,2,3\n", Format::Csv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.to_string().contains("Expected 2 fields"), "{err}");
    }

    #[test]
    fn short_csv_row_is_padded() {
        let table = read_table(b"a,b,c\n1\n", Format::Csv).unwrap();
        assert_eq!(table.rows()[0], vec![Cell::Int(1), Cell::Empty, Cell::Empty]);
    }

    #[test]
    fn empty_csv_is_a_parse_error() {
        let err = read_table(b"", Format::Csv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn invalid_utf8_csv_is_a_parse_error() {
        let err = read_table(b"a,b\n\xff\xfe,1\n", Format::Csv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn corrupt_xlsx_is_a_parse_error() {
        let err = read_table(b"PK\x03\x04garbage", Format::Xlsx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn blank_and_duplicate_headers_are_named() {
        let table = read_table(b"a,,a\n1,2,3\n", Format::Csv).unwrap();
        assert_eq!(table.columns(), ["a", "Unnamed: 1", "a.1"]);
    }

    #[test]
    fn duplicate_header_skips_names_already_in_use() {
        let table = read_table(b"a,a.1,a,a\n1,2,3,4\n", Format::Csv).unwrap();
        assert_eq!(table.columns(), ["a", "a.1", "a.2", "a.3"]);

        let json = convert(b"a,a.1,a\n1,2,3\n", Format::Csv, Format::Json).unwrap();
        let value: Value = serde_json::from_slice(&json).unwrap();
        let record = value[0].as_object().unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record["a"], 1);
        assert_eq!(record["a.1"], 2);
        assert_eq!(record["a.2"], 3);
    }

    #[test]
    fn header_whitespace_is_kept() {
        let table = read_table(b" name,age \nAda,36\n", Format::Csv).unwrap();
        assert_eq!(table.columns(), [" name", "age "]);
    }

    fn xlsx_with_date() -> Vec<u8> {
        let when = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let date_format = XlsxFormat::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "when").unwrap();
        sheet.write_string(0, 1, "n").unwrap();
        sheet
            .write_datetime_with_format(1, 0, &when, &date_format)
            .unwrap();
        sheet.write_number(1, 1, 45306.0).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn xlsx_date_cells_read_as_datetimes() {
        let csv = convert(&xlsx_with_date(), Format::Xlsx, Format::Csv).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "when,n\n2024-01-15 00:00:00,45306\n");

        let json = convert(&xlsx_with_date(), Format::Xlsx, Format::Json).unwrap();
        let value: Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[0]["when"], "2024-01-15T00:00:00");
    }

    #[test]
    fn xlsx_datetimes_survive_xlsx_output() {
        let copy = convert(&xlsx_with_date(), Format::Xlsx, Format::Xlsx).unwrap();
        let table = read_table(&copy, Format::Xlsx).unwrap();
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(table.rows()[0][0], Cell::DateTime(expected));
        assert_eq!(table.rows()[0][1], Cell::Int(45306));
    }

    #[test]
    fn tsv_reads_tabs() {
        let table = read_table(b"x\ty\nhello, world\t3\n", Format::Tsv).unwrap();
        assert_eq!(table.rows()[0][0], Cell::Text("hello, world".into()));
        assert_eq!(table.rows()[0][1], Cell::Int(3));
    }

    #[test]
    fn non_tabular_format_is_rejected() {
        let err = read_table(b"a", Format::Png).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn xlsx_integral_floats_read_as_ints() {
        assert_eq!(float_or_int(3.0), Cell::Int(3));
        assert_eq!(float_or_int(3.25), Cell::Float(3.25));
    }
}
