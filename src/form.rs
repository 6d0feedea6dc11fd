// Form Values Module for HRDesk
//
// A form collects one raw string per column. Before a statement is built,
// each raw string is validated against the column's declared type and turned
// into a typed `FieldValue`, so nothing reaches the database as untyped text.

use crate::core::db::{ColumnDefinition, ColumnKind, TableDefinition};
use crate::core::{HrdeskError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated value for one column
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// Validates a raw form string against the column's kind.
    pub fn parse(column: &ColumnDefinition, raw: &str) -> Result<Self> {
        let invalid = |reason: String| HrdeskError::InvalidValue {
            column: column.name.clone(),
            declared_type: column.declared_type.clone(),
            value: raw.to_string(),
            reason,
        };

        match column.kind {
            ColumnKind::Serial | ColumnKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|e| invalid(e.to_string())),
            ColumnKind::Decimal { precision, scale } => {
                let value = Decimal::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?;
                if value.scale() > scale {
                    return Err(invalid(format!("more than {} decimal places", scale)));
                }
                let integer_digits = value
                    .trunc()
                    .abs()
                    .to_string()
                    .trim_start_matches('0')
                    .len() as u32;
                if integer_digits > precision.saturating_sub(scale) {
                    return Err(invalid(format!(
                        "more than {} digits before the decimal point",
                        precision.saturating_sub(scale)
                    )));
                }
                Ok(FieldValue::Decimal(value))
            }
            ColumnKind::Varchar(max) => {
                let len = raw.chars().count();
                if len > max {
                    return Err(invalid(format!("{} characters exceeds limit of {}", len, max)));
                }
                Ok(FieldValue::Text(raw.to_string()))
            }
            ColumnKind::Text => Ok(FieldValue::Text(raw.to_string())),
            ColumnKind::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map(FieldValue::Date)
                .map_err(|_| invalid("expected a date as YYYY-MM-DD".to_string())),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            FieldValue::Integer(i) => Value::Integer(*i),
            // NUMERIC affinity turns the text back into a number on storage
            FieldValue::Decimal(d) => Value::Text(d.to_string()),
            FieldValue::Text(s) => Value::Text(s.clone()),
            FieldValue::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Column name to value mapping for one record, in the order supplied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    entries: Vec<(String, FieldValue)>,
}

impl FormValues {
    pub fn new() -> Self {
        FormValues::default()
    }

    /// Validates raw `(column, text)` pairs collected from a form.
    ///
    /// Blank values are treated as "not supplied" and skipped, so a surrogate
    /// key left empty on create is generated by the database.
    pub fn parse<I, K, V>(table: &TableDefinition, raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = FormValues::new();
        for (name, text) in raw {
            let name = name.as_ref();
            let text = text.as_ref();
            let column = table.column(name).ok_or_else(|| HrdeskError::UnknownColumn {
                table: table.name.clone(),
                column: name.to_string(),
            })?;
            if text.trim().is_empty() {
                continue;
            }
            values.insert(name, FieldValue::parse(column, text)?);
        }
        Ok(values)
    }

    /// Inserts or replaces a value. A replaced value keeps its original position.
    pub fn insert(&mut self, column: &str, value: FieldValue) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    /// Builder-style variant of [`FormValues::insert`]
    pub fn with(mut self, column: &str, value: FieldValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders a table's form as `label [type]: value` lines in column order.
pub fn render_form(table: &TableDefinition, values: Option<&FormValues>) -> String {
    let width = table.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let mut output = String::new();
    for column in &table.columns {
        let value = values
            .and_then(|v| v.get(&column.name))
            .map(|v| v.to_string())
            .unwrap_or_default();
        output.push_str(&format!(
            "{:>width$} [{}]: {}\n",
            column.name,
            column.declared_type,
            value,
            width = width
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::hr_schema;

    fn column(table: &str, name: &str) -> ColumnDefinition {
        hr_schema().table(table).unwrap().column(name).unwrap().clone()
    }

    #[test]
    fn test_parse_integer_and_serial() {
        let id = column("Employee", "EmployeeID");
        assert_eq!(FieldValue::parse(&id, " 42 ").unwrap(), FieldValue::Integer(42));

        let address = column("Employee", "AddressID");
        assert!(FieldValue::parse(&address, "forty").is_err());
    }

    #[test]
    fn test_parse_decimal_precision_and_scale() {
        let salary = column("Employee", "Salary");
        assert_eq!(
            FieldValue::parse(&salary, "55000.50").unwrap(),
            FieldValue::Decimal(Decimal::from_str("55000.50").unwrap())
        );
        assert!(FieldValue::parse(&salary, "12345678.00").is_ok());
        assert!(FieldValue::parse(&salary, "123456789.00").is_err());
        assert!(FieldValue::parse(&salary, "1.234").is_err());

        match FieldValue::parse(&salary, "lots") {
            Err(HrdeskError::InvalidValue { column, declared_type, .. }) => {
                assert_eq!(column, "Salary");
                assert_eq!(declared_type, "DECIMAL(10, 2)");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_varchar_length() {
        let gender = column("Employee", "Gender");
        assert!(FieldValue::parse(&gender, "female").is_ok());
        assert!(FieldValue::parse(&gender, "not-specified").is_err());
    }

    #[test]
    fn test_parse_date() {
        let hired = column("Employee", "HireDate");
        assert_eq!(
            FieldValue::parse(&hired, "2021-03-15").unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2021, 3, 15).unwrap())
        );
        assert!(FieldValue::parse(&hired, "15/03/2021").is_err());
        assert!(FieldValue::parse(&hired, "2021-02-30").is_err());
    }

    #[test]
    fn test_form_values_parse_skips_blank_and_keeps_order() {
        let employee = hr_schema().table("Employee").unwrap();
        let values = FormValues::parse(
            employee,
            vec![
                ("LastName", "Hopper"),
                ("EmployeeID", ""),
                ("FirstName", "Grace"),
            ],
        )
        .unwrap();

        assert_eq!(values.len(), 2);
        let names: Vec<&str> = values.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["LastName", "FirstName"]);
        assert!(values.get("EmployeeID").is_none());
    }

    #[test]
    fn test_form_values_unknown_column() {
        let dept = hr_schema().table("Department").unwrap();
        let result = FormValues::parse(dept, vec![("Budget", "10")]);
        match result {
            Err(HrdeskError::UnknownColumn { table, column }) => {
                assert_eq!(table, "Department");
                assert_eq!(column, "Budget");
            }
            other => panic!("Expected UnknownColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let values = FormValues::new()
            .with("A", FieldValue::Integer(1))
            .with("B", FieldValue::Integer(2))
            .with("A", FieldValue::Integer(3));
        let entries: Vec<(&str, &FieldValue)> = values.iter().collect();
        assert_eq!(entries[0], ("A", &FieldValue::Integer(3)));
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_render_form() {
        let dept = hr_schema().table("Department").unwrap();
        let values = FormValues::new().with("DepartmentName", FieldValue::Text("Ops".into()));
        let view = render_form(dept, Some(&values));
        assert!(view.contains("DepartmentID [SERIAL PRIMARY KEY]: \n"));
        assert!(view.contains("DepartmentName [VARCHAR(100)]: Ops"));
    }
}
