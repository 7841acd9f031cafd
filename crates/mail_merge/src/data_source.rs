//! Data source types for mail merge

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A data source for mail merge operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// Unique identifier for this data source
    pub id: String,
    /// Where the data came from
    pub source_type: DataSourceType,
    /// Column definitions, in header order
    pub columns: Vec<ColumnDef>,
    /// Data records, in row order
    pub records: Vec<Record>,
}

impl DataSource {
    /// Create a new data source with the given ID and source type
    pub fn new(id: impl Into<String>, source_type: DataSourceType) -> Self {
        Self {
            id: id.into(),
            source_type,
            columns: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Create a new inline data source
    pub fn inline(id: impl Into<String>) -> Self {
        Self::new(id, DataSourceType::Inline)
    }

    /// Add a column definition
    pub fn add_column(&mut self, column: ColumnDef) {
        self.columns.push(column);
    }

    /// Add a record
    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Get the number of records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a record by index (0-based)
    pub fn get_record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Get column definition by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get value from a specific record and column
    pub fn get_value(&self, record_index: usize, column_name: &str) -> Option<&Value> {
        self.records.get(record_index).and_then(|r| r.get(column_name))
    }

    /// Whether the source has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Type of data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceType {
    /// Spreadsheet workbook (xls, xlsx, xlsm, xlsb, ods)
    Spreadsheet {
        /// Path to the workbook, if it was read from disk
        path: Option<String>,
        /// Name of the sheet being used
        sheet: String,
    },
    /// Inline data (manually provided records)
    Inline,
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (header text, used as the placeholder name)
    pub name: String,
    /// Data type of the column
    pub data_type: DataType,
}

impl ColumnDef {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Data type for column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Text/string value
    Text,
    /// Numeric value (floating point)
    Number,
    /// Date value
    Date,
    /// Boolean value
    Boolean,
}

impl DataType {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single record (row) of data
pub type Record = HashMap<String, Value>;

/// A value in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text/string value
    Text(String),
    /// Numeric value
    Number(f64),
    /// Date value
    Date(NaiveDate),
    /// Date with a time of day
    DateTime(NaiveDateTime),
    /// Time of day without a date
    Time(NaiveTime),
    /// Boolean value
    Boolean(bool),
    /// Null/missing value
    Null,
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Text(_) => Some(DataType::Text),
            Value::Number(_) => Some(DataType::Number),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) => Some(DataType::Date),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Null => None,
        }
    }

    /// Convert to the text inserted into a rendered document
    pub fn to_string_value(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Null => String::new(),
        }
    }
}

/// Format a number without unnecessary decimal places
pub(crate) fn format_number(n: f64) -> String {
    // Integral values within i64 range print without a fraction
    if n.fract() == 0.0 && n.abs() < 9.2e18 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_basic() {
        let mut ds = DataSource::inline("test");
        ds.add_column(ColumnDef::new("name", DataType::Text));
        ds.add_column(ColumnDef::new("age", DataType::Number));

        let mut record = Record::new();
        record.insert("name".to_string(), Value::Text("Alice".to_string()));
        record.insert("age".to_string(), Value::Number(30.0));
        ds.add_record(record);

        assert_eq!(ds.record_count(), 1);
        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.column_names(), vec!["name", "age"]);
        assert!(ds.has_column("name"));
        assert!(!ds.has_column("email"));
        assert_eq!(ds.get_column("age").unwrap().data_type, DataType::Number);
        assert_eq!(ds.get_value(0, "name"), Some(&Value::Text("Alice".to_string())));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(Value::Text("hello".to_string()).to_string_value(), "hello");
        assert_eq!(Value::Number(42.0).to_string_value(), "42");
        assert_eq!(Value::Number(-5.0).to_string_value(), "-5");
        assert_eq!(Value::Number(3.14).to_string_value(), "3.14");
        assert_eq!(Value::Boolean(true).to_string_value(), "true");
        assert_eq!(Value::Null.to_string_value(), "");
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Value::Date(date).to_string_value(), "2024-01-15");
        let datetime = date.and_hms_opt(9, 5, 30).unwrap();
        assert_eq!(Value::DateTime(datetime).to_string_value(), "2024-01-15 09:05:30");
        assert_eq!(Value::Time(datetime.time()).to_string_value(), "09:05:30");
        assert_eq!(Value::Time(datetime.time()).data_type(), Some(DataType::Date));
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = "hello".into();
        assert!(matches!(v, Value::Text(_)));

        let v: Value = 42_i32.into();
        assert!(matches!(v, Value::Number(n) if n == 42.0));

        let v: Value = true.into();
        assert!(matches!(v, Value::Boolean(true)));

        let v: Value = Option::<String>::None.into();
        assert!(v.is_null());
        assert_eq!(v.data_type(), None);
    }

    #[test]
    fn test_source_type_serialization() {
        let st = DataSourceType::Spreadsheet { path: None, sheet: "Sheet1".to_string() };
        assert_eq!(
            serde_json::to_string(&st).unwrap(),
            r#"{"type":"spreadsheet","path":null,"sheet":"Sheet1"}"#
        );
    }
}
