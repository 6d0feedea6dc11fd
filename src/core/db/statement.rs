/// Statement Building Module
///
/// Pure functions that turn a table definition and form values into SQL.
/// Values are always bound through numbered `?N` placeholders; only table
/// and column names taken from the schema registry are written into the text.

use super::schema::TableDefinition;
use crate::core::{HrdeskError, Result};
use crate::form::{FieldValue, FormValues};

/// Whether a statement returns rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

/// SQL text plus the values bound to its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<FieldValue>,
    pub kind: StatementKind,
}

impl Statement {
    fn write(sql: String, params: Vec<FieldValue>) -> Self {
        Statement {
            sql,
            params,
            kind: StatementKind::Write,
        }
    }

    pub fn is_read(&self) -> bool {
        self.kind == StatementKind::Read
    }
}

/// Classifies statement text: reads begin with `SELECT`, ignoring case and
/// leading whitespace; everything else is a write.
pub fn classify(sql: &str) -> StatementKind {
    let starts_with_select = sql
        .trim_start()
        .get(..6)
        .map(|head| head.eq_ignore_ascii_case("SELECT"))
        .unwrap_or(false);
    if starts_with_select {
        StatementKind::Read
    } else {
        StatementKind::Write
    }
}

fn ensure_columns(table: &TableDefinition, values: &FormValues) -> Result<()> {
    for (name, _) in values.iter() {
        if table.column(name).is_none() {
            return Err(HrdeskError::UnknownColumn {
                table: table.name.clone(),
                column: name.to_string(),
            });
        }
    }
    Ok(())
}

/// `WHERE` clause over every key column, numbering placeholders after `offset`
fn key_filter(
    table: &TableDefinition,
    values: &FormValues,
    offset: usize,
) -> Result<(String, Vec<FieldValue>)> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    for key in table.key_columns() {
        let value = values.get(key).ok_or_else(|| HrdeskError::MissingPrimaryKey {
            table: table.name.clone(),
            column: key.to_string(),
        })?;
        params.push(value.clone());
        conditions.push(format!("{} = ?{}", key, offset + params.len()));
    }
    Ok((conditions.join(" AND "), params))
}

/// INSERT listing exactly the supplied columns, in the order supplied.
pub fn build_insert(table: &TableDefinition, values: &FormValues) -> Result<Statement> {
    ensure_columns(table, values)?;
    if values.is_empty() {
        return Ok(Statement::write(
            format!("INSERT INTO {} DEFAULT VALUES", table.name),
            Vec::new(),
        ));
    }

    let mut columns = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (name, value) in values.iter() {
        params.push(value.clone());
        columns.push(name);
        placeholders.push(format!("?{}", params.len()));
    }

    Ok(Statement::write(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    ))
}

/// Unfiltered, unordered full-table read.
pub fn build_select_all(table: &TableDefinition) -> Statement {
    Statement {
        sql: format!("SELECT * FROM {}", table.name),
        params: Vec::new(),
        kind: StatementKind::Read,
    }
}

/// UPDATE setting every supplied column, filtered by the key columns.
pub fn build_update(table: &TableDefinition, values: &FormValues) -> Result<Statement> {
    ensure_columns(table, values)?;
    let (filter, key_params) = key_filter(table, values, values.len())?;

    let mut assignments = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len() + key_params.len());
    for (name, value) in values.iter() {
        params.push(value.clone());
        assignments.push(format!("{} = ?{}", name, params.len()));
    }
    params.extend(key_params);

    Ok(Statement::write(
        format!(
            "UPDATE {} SET {} WHERE {}",
            table.name,
            assignments.join(", "),
            filter
        ),
        params,
    ))
}

/// DELETE filtered by the key columns.
pub fn build_delete(table: &TableDefinition, values: &FormValues) -> Result<Statement> {
    ensure_columns(table, values)?;
    let (filter, params) = key_filter(table, values, 0)?;
    Ok(Statement::write(
        format!("DELETE FROM {} WHERE {}", table.name, filter),
        params,
    ))
}

/// Wraps user-supplied text unmodified, classified by [`classify`].
pub fn build_ad_hoc(raw: &str) -> Result<Statement> {
    if raw.trim().is_empty() {
        return Err(HrdeskError::EmptyQuery);
    }
    Ok(Statement {
        sql: raw.to_string(),
        params: Vec::new(),
        kind: classify(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::hr_schema;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_build_insert_uses_supplied_order() {
        let employee = hr_schema().table("Employee").unwrap();
        let values = FormValues::new()
            .with("LastName", text("Lovelace"))
            .with("FirstName", text("Ada"));

        let stmt = build_insert(employee, &values).unwrap();
        insta::assert_snapshot!(stmt.sql, @"INSERT INTO Employee (LastName, FirstName) VALUES (?1, ?2)");
        assert_eq!(stmt.params, vec![text("Lovelace"), text("Ada")]);
        assert_eq!(stmt.kind, StatementKind::Write);
    }

    #[test]
    fn test_build_insert_without_values() {
        let dept = hr_schema().table("Department").unwrap();
        let stmt = build_insert(dept, &FormValues::new()).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO Department DEFAULT VALUES");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_build_select_all() {
        let dept = hr_schema().table("Department").unwrap();
        let stmt = build_select_all(dept);
        assert_eq!(stmt.sql, "SELECT * FROM Department");
        assert!(stmt.is_read());
    }

    #[test]
    fn test_build_update_filters_by_key() {
        let dept = hr_schema().table("Department").unwrap();
        let values = FormValues::new()
            .with("DepartmentID", FieldValue::Integer(7))
            .with("DepartmentName", text("Finance"));

        let stmt = build_update(dept, &values).unwrap();
        insta::assert_snapshot!(stmt.sql, @"UPDATE Department SET DepartmentID = ?1, DepartmentName = ?2 WHERE DepartmentID = ?3");
        assert_eq!(
            stmt.params,
            vec![FieldValue::Integer(7), text("Finance"), FieldValue::Integer(7)]
        );
    }

    #[test]
    fn test_build_update_composite_key() {
        let ej = hr_schema().table("EmployeeJob").unwrap();
        let values = FormValues::new()
            .with("EmployeeID", FieldValue::Integer(1))
            .with("JobID", FieldValue::Integer(2));

        let stmt = build_update(ej, &values).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE EmployeeJob SET EmployeeID = ?1, JobID = ?2 WHERE EmployeeID = ?3 AND JobID = ?4"
        );
        assert_eq!(stmt.params.len(), 4);
    }

    #[test]
    fn test_build_update_missing_key() {
        let dept = hr_schema().table("Department").unwrap();
        let values = FormValues::new().with("DepartmentName", text("Finance"));
        match build_update(dept, &values) {
            Err(HrdeskError::MissingPrimaryKey { table, column }) => {
                assert_eq!(table, "Department");
                assert_eq!(column, "DepartmentID");
            }
            other => panic!("Expected MissingPrimaryKey, got {:?}", other),
        }
    }

    #[test]
    fn test_build_delete() {
        let dept = hr_schema().table("Department").unwrap();
        let values = FormValues::new()
            .with("DepartmentName", text("ignored"))
            .with("DepartmentID", FieldValue::Integer(3));
        let stmt = build_delete(dept, &values).unwrap();
        insta::assert_snapshot!(stmt.sql, @"DELETE FROM Department WHERE DepartmentID = ?1");
        assert_eq!(stmt.params, vec![FieldValue::Integer(3)]);
    }

    #[test]
    fn test_build_delete_composite_requires_every_key_column() {
        let ep = hr_schema().table("EmployeeProject").unwrap();
        let values = FormValues::new().with("EmployeeID", FieldValue::Integer(1));
        match build_delete(ep, &values) {
            Err(HrdeskError::MissingPrimaryKey { column, .. }) => assert_eq!(column, "ProjectID"),
            other => panic!("Expected MissingPrimaryKey, got {:?}", other),
        }
    }

    #[test]
    fn test_builders_reject_foreign_columns() {
        let dept = hr_schema().table("Department").unwrap();
        let values = FormValues::new().with("Salary", FieldValue::Integer(1));
        assert!(matches!(
            build_insert(dept, &values),
            Err(HrdeskError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_build_ad_hoc() {
        let stmt = build_ad_hoc("  select * from Job").unwrap();
        assert_eq!(stmt.sql, "  select * from Job");
        assert!(stmt.is_read());

        let stmt = build_ad_hoc("DELETE FROM Job").unwrap();
        assert_eq!(stmt.kind, StatementKind::Write);

        assert!(matches!(build_ad_hoc(" \n\t "), Err(HrdeskError::EmptyQuery)));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("SELECT 1"), StatementKind::Read);
        assert_eq!(classify("\n  SeLeCt name FROM Job"), StatementKind::Read);
        assert_eq!(classify("insert into Job DEFAULT VALUES"), StatementKind::Write);
        assert_eq!(classify("update Job set JobTitle = 'x'"), StatementKind::Write);
        assert_eq!(classify("sel"), StatementKind::Write);
        assert_eq!(classify(""), StatementKind::Write);
    }
}
