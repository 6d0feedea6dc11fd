/// Schema Registry Module
///
/// This module holds the fixed Human Resources schema: every table, its
/// ordered columns with their declared types, and an explicit key
/// declaration. Column order drives both form field order and result grid
/// column order, so tables are never mutated after the registry is built.

use crate::core::{HrdeskError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static VARCHAR_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^VARCHAR\s*\(\s*(\d+)\s*\)$").expect("valid regex"));
static DECIMAL_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:DECIMAL|NUMERIC)\s*\(\s*(\d+)\s*,\s*(\d+)\s*\)$").expect("valid regex")
});

/// The value domain of a column, parsed from its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Database-generated integer surrogate key (`SERIAL`)
    Serial,
    /// `INT` / `INTEGER`
    Integer,
    /// `DECIMAL(precision, scale)`
    Decimal { precision: u32, scale: u32 },
    /// `VARCHAR(n)`
    Varchar(usize),
    /// Unbounded `TEXT`
    Text,
    /// Calendar `DATE`
    Date,
}

impl ColumnKind {
    /// Parses a declared column type such as `VARCHAR(100)` or `SERIAL PRIMARY KEY`.
    ///
    /// Unrecognised types fall back to `Text`, since declared types are only
    /// advisory for the database.
    pub fn from_declared(declared: &str) -> Self {
        let declared = declared.trim();
        let head = declared
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        if head == "SERIAL" {
            return ColumnKind::Serial;
        }
        if let Some(caps) = VARCHAR_TYPE.captures(declared) {
            if let Ok(len) = caps[1].parse() {
                return ColumnKind::Varchar(len);
            }
        }
        if let Some(caps) = DECIMAL_TYPE.captures(declared) {
            if let (Ok(precision), Ok(scale)) = (caps[1].parse(), caps[2].parse()) {
                return ColumnKind::Decimal { precision, scale };
            }
        }
        match head.as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" => ColumnKind::Integer,
            "DATE" => ColumnKind::Date,
            _ => ColumnKind::Text,
        }
    }
}

/// A single column: name, declared type and the kind parsed from it
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Declared type text, kept verbatim for display
    pub declared_type: String,
    pub kind: ColumnKind,
}

impl ColumnDefinition {
    pub fn new(name: &str, declared_type: &str) -> Self {
        ColumnDefinition {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            kind: ColumnKind::from_declared(declared_type),
        }
    }

    /// Column definition as SQLite DDL.
    ///
    /// `SERIAL PRIMARY KEY` becomes `INTEGER PRIMARY KEY` so SQLite assigns
    /// the surrogate key as a rowid alias.
    fn ddl(&self) -> String {
        match self.kind {
            ColumnKind::Serial => format!("{} INTEGER PRIMARY KEY", self.name),
            _ => format!("{} {}", self.name, self.declared_type),
        }
    }
}

/// How a table identifies a single row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDeclaration {
    /// Single generated key column
    Surrogate(String),
    /// Multi-column key declared through a table constraint
    Composite(Vec<String>),
}

/// Static description of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub key: KeyDeclaration,
}

impl TableDefinition {
    /// Table keyed by a single surrogate column
    pub fn surrogate(name: &str, key: &str, columns: &[(&str, &str)]) -> Self {
        TableDefinition {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(col, ty)| ColumnDefinition::new(col, ty))
                .collect(),
            key: KeyDeclaration::Surrogate(key.to_string()),
        }
    }

    /// Table keyed by a composite `PRIMARY KEY(...)` constraint
    pub fn composite(name: &str, key: &[&str], columns: &[(&str, &str)]) -> Self {
        TableDefinition {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(col, ty)| ColumnDefinition::new(col, ty))
                .collect(),
            key: KeyDeclaration::Composite(key.iter().map(|k| k.to_string()).collect()),
        }
    }

    /// All key columns, in declaration order
    pub fn key_columns(&self) -> Vec<&str> {
        match &self.key {
            KeyDeclaration::Surrogate(col) => vec![col.as_str()],
            KeyDeclaration::Composite(cols) => cols.iter().map(String::as_str).collect(),
        }
    }

    /// The primary key column (the first key column for composite keys)
    pub fn primary_key_column(&self) -> &str {
        match &self.key {
            KeyDeclaration::Surrogate(col) => col,
            KeyDeclaration::Composite(cols) => cols.first().map(String::as_str).unwrap_or_default(),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.key, KeyDeclaration::Composite(_))
    }

    /// The composite key constraint text, e.g. `PRIMARY KEY(EmployeeID, JobID)`
    pub fn composite_key_constraint(&self) -> Option<String> {
        match &self.key {
            KeyDeclaration::Composite(cols) => Some(format!("PRIMARY KEY({})", cols.join(", "))),
            KeyDeclaration::Surrogate(_) => None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for SQLite
    pub fn create_sql(&self) -> String {
        let composite_keys: &[String] = match &self.key {
            KeyDeclaration::Composite(cols) => cols,
            KeyDeclaration::Surrogate(_) => &[],
        };
        // SQLite allows NULL in composite key columns unless told otherwise
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                if composite_keys.contains(&column.name) {
                    format!("{} NOT NULL", column.ddl())
                } else {
                    column.ddl()
                }
            })
            .collect();
        if let Some(constraint) = self.composite_key_constraint() {
            parts.push(constraint);
        }
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.name, parts.join(", "))
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(HrdeskError::Config(format!("table {} has no columns", self.name)));
        }
        for key in self.key_columns() {
            if self.column(key).is_none() {
                return Err(HrdeskError::Config(format!(
                    "key column {} is not declared by table {}",
                    key, self.name
                )));
            }
        }
        Ok(())
    }
}

/// Ordered collection of table definitions
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: Vec<TableDefinition>,
}

impl SchemaRegistry {
    /// Builds a registry, rejecting duplicate table names and undeclared key columns.
    pub fn new(tables: Vec<TableDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name.as_str()) {
                return Err(HrdeskError::Config(format!("duplicate table {}", table.name)));
            }
            table.validate()?;
        }
        Ok(SchemaRegistry { tables })
    }

    /// Looks up a table by exact name
    pub fn table(&self, name: &str) -> Result<&TableDefinition> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| HrdeskError::UnknownTable(name.to_string()))
    }

    /// Ordered (column name, declared type) pairs of a table
    pub fn columns(&self, name: &str) -> Result<Vec<(&str, &str)>> {
        let table = self.table(name)?;
        Ok(table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.declared_type.as_str()))
            .collect())
    }

    pub fn primary_key_column(&self, name: &str) -> Result<&str> {
        Ok(self.table(name)?.primary_key_column())
    }

    /// Labels and declared types for rendering a table's form, in column order
    pub fn form_fields(&self, name: &str) -> Result<Vec<(&str, &str)>> {
        self.columns(name)
    }

    /// Table names in registration order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }
}

static HR_SCHEMA: Lazy<SchemaRegistry> =
    Lazy::new(|| SchemaRegistry::new(hr_tables()).expect("built-in HR schema is consistent"));

/// The built-in Human Resources schema
pub fn hr_schema() -> &'static SchemaRegistry {
    &HR_SCHEMA
}

fn hr_tables() -> Vec<TableDefinition> {
    vec![
        TableDefinition::surrogate(
            "Address",
            "AddressID",
            &[
                ("AddressID", "SERIAL PRIMARY KEY"),
                ("Street", "VARCHAR(255)"),
                ("City", "VARCHAR(100)"),
                ("ZipCode", "VARCHAR(20)"),
                ("Country", "VARCHAR(50)"),
            ],
        ),
        TableDefinition::surrogate(
            "Employee",
            "EmployeeID",
            &[
                ("EmployeeID", "SERIAL PRIMARY KEY"),
                ("FirstName", "VARCHAR(100)"),
                ("LastName", "VARCHAR(100)"),
                ("DateOfBirth", "DATE"),
                ("Gender", "VARCHAR(10)"),
                ("HireDate", "DATE"),
                ("Salary", "DECIMAL(10, 2)"),
                ("ContactNumber", "VARCHAR(20)"),
                ("Email", "VARCHAR(100)"),
                ("AddressID", "INT"),
            ],
        ),
        TableDefinition::surrogate(
            "Manager",
            "EmployeeID",
            &[("EmployeeID", "SERIAL PRIMARY KEY"), ("TeamSize", "INT")],
        ),
        TableDefinition::surrogate(
            "NonManager",
            "EmployeeID",
            &[
                ("EmployeeID", "SERIAL PRIMARY KEY"),
                ("Shift", "VARCHAR(20)"),
                ("ManagerID", "INT"),
            ],
        ),
        TableDefinition::surrogate(
            "Review",
            "ReviewID",
            &[
                ("ReviewID", "SERIAL PRIMARY KEY"),
                ("EmployeeID", "INT"),
                ("ReviewDate", "DATE"),
                ("Rating", "INT"),
                ("Comments", "TEXT"),
            ],
        ),
        TableDefinition::surrogate(
            "Training",
            "TrainingID",
            &[
                ("TrainingID", "SERIAL PRIMARY KEY"),
                ("TrainingName", "VARCHAR(100)"),
                ("TrainingDescription", "TEXT"),
                ("StartDate", "DATE"),
                ("EndDate", "DATE"),
            ],
        ),
        TableDefinition::composite(
            "EmployeeTraining",
            &["EmployeeID", "TrainingID"],
            &[("EmployeeID", "INT"), ("TrainingID", "INT")],
        ),
        TableDefinition::surrogate(
            "Job",
            "JobID",
            &[
                ("JobID", "SERIAL PRIMARY KEY"),
                ("JobTitle", "VARCHAR(100)"),
                ("JobDescription", "TEXT"),
                ("JobMinSalary", "DECIMAL(10, 2)"),
                ("JobMaxSalary", "DECIMAL(10, 2)"),
            ],
        ),
        TableDefinition::composite(
            "EmployeeJob",
            &["EmployeeID", "JobID"],
            &[("EmployeeID", "INT"), ("JobID", "INT")],
        ),
        TableDefinition::surrogate(
            "Department",
            "DepartmentID",
            &[
                ("DepartmentID", "SERIAL PRIMARY KEY"),
                ("DepartmentName", "VARCHAR(100)"),
            ],
        ),
        TableDefinition::composite(
            "EmployeeDepartment",
            &["EmployeeID", "DepartmentID"],
            &[("EmployeeID", "INT"), ("DepartmentID", "INT")],
        ),
        TableDefinition::surrogate(
            "Project",
            "ProjectID",
            &[
                ("ProjectID", "SERIAL PRIMARY KEY"),
                ("ProjectName", "VARCHAR(100)"),
                ("ProjectStartDate", "DATE"),
                ("ProjectEndDate", "DATE"),
                ("ProjectBudget", "DECIMAL(15, 2)"),
            ],
        ),
        TableDefinition::composite(
            "EmployeeProject",
            &["EmployeeID", "ProjectID"],
            &[("EmployeeID", "INT"), ("ProjectID", "INT")],
        ),
    ]
}
