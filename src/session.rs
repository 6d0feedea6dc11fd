//! CRUD Session Module
//!
//! The boundary consumed by a presentation shell: pick a table, then create,
//! read, update or delete records from raw form values, or run ad-hoc SQL.
//! Each operation reports a user-facing message; reads also replace the
//! displayed grid.

use crate::core::db::{
    build_ad_hoc, build_delete, build_insert, build_select_all, build_update, ExecutionOutcome,
    SchemaRegistry, Statement, StatementExecutor, TableDefinition,
};
use crate::core::{HrdeskError, Result};
use crate::form::FormValues;
use crate::results_grid::{project, ResultsGrid, TabularModel};
use rusqlite::Connection;
use tracing::{info, warn};

/// The user-visible operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    AdHoc,
}

impl Operation {
    pub fn success_message(&self) -> &'static str {
        match self {
            Operation::Create => "Record created successfully.",
            Operation::Read => "Records loaded.",
            Operation::Update => "Record updated successfully.",
            Operation::Delete => "Record deleted successfully.",
            Operation::AdHoc => "Query executed successfully.",
        }
    }

    /// Message shown when the operation fails
    pub fn failure_message(&self, error: &HrdeskError) -> String {
        let action = match self {
            Operation::Create => "creating record",
            Operation::Read => "reading records",
            Operation::Update => "updating record",
            Operation::Delete => "deleting record",
            Operation::AdHoc => "executing query",
        };
        format!("Error {}:\n{}", action, error)
    }
}

/// What a successful operation produced
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    pub operation: Operation,
    pub message: String,
    /// Rows changed by a write
    pub affected_rows: Option<usize>,
    /// The projected rows of a read
    pub model: Option<TabularModel>,
}

/// One user's working session over the single database connection
#[derive(Debug)]
pub struct CrudSession<'r> {
    registry: &'r SchemaRegistry,
    executor: StatementExecutor,
    selected: Option<&'r TableDefinition>,
    grid: ResultsGrid,
}

impl<'r> CrudSession<'r> {
    pub fn new(registry: &'r SchemaRegistry, connection: Connection) -> Self {
        CrudSession {
            registry,
            executor: StatementExecutor::new(connection),
            selected: None,
            grid: ResultsGrid::new(),
        }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    pub fn executor(&self) -> &StatementExecutor {
        &self.executor
    }

    pub fn grid(&self) -> &ResultsGrid {
        &self.grid
    }

    pub fn selected_table(&self) -> Option<&'r TableDefinition> {
        self.selected
    }

    /// Selects the table the form operations act on and resets the grid
    /// to its columns.
    pub fn select_table(&mut self, name: &str) -> Result<&'r TableDefinition> {
        let table = self.registry.table(name)?;
        self.selected = Some(table);
        self.grid.reset_for(table);
        Ok(table)
    }

    fn require_table(&self) -> Result<&'r TableDefinition> {
        self.selected.ok_or(HrdeskError::EmptyInput)
    }

    pub fn create<I, K, V>(&mut self, raw: I) -> Result<OperationReport>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let table = self.require_table()?;
        let values = FormValues::parse(table, raw)?;
        let statement = build_insert(table, &values)?;
        self.run_write(Operation::Create, &statement)
    }

    /// Reads every row of the selected table into the grid.
    pub fn read(&mut self) -> Result<OperationReport> {
        let table = self.require_table()?;
        let statement = build_select_all(table);
        self.run_read(Operation::Read, &statement)
    }

    pub fn update<I, K, V>(&mut self, raw: I) -> Result<OperationReport>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let table = self.require_table()?;
        let values = FormValues::parse(table, raw)?;
        let statement = build_update(table, &values)?;
        self.run_write(Operation::Update, &statement)
    }

    pub fn delete<I, K, V>(&mut self, raw: I) -> Result<OperationReport>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let table = self.require_table()?;
        let values = FormValues::parse(table, raw)?;
        let statement = build_delete(table, &values)?;
        self.run_write(Operation::Delete, &statement)
    }

    /// Runs free-form SQL. Reads replace the grid; writes report affected rows.
    pub fn execute_ad_hoc(&mut self, text: &str) -> Result<OperationReport> {
        let statement = build_ad_hoc(text)?;
        if statement.is_read() {
            let mut report = self.run_read(Operation::AdHoc, &statement)?;
            if report.model.as_ref().map(TabularModel::is_empty).unwrap_or(true) {
                report.message = "No results found.".to_string();
            }
            Ok(report)
        } else {
            self.run_write(Operation::AdHoc, &statement)
        }
    }

    fn run_read(&mut self, operation: Operation, statement: &Statement) -> Result<OperationReport> {
        match self.executor.execute(statement).into_result() {
            Ok(ExecutionOutcome::Rows(result)) => {
                let model = project(result);
                info!(?operation, rows = model.row_count(), "read completed");
                self.grid.display(model.clone());
                Ok(OperationReport {
                    operation,
                    message: operation.success_message().to_string(),
                    affected_rows: None,
                    model: Some(model),
                })
            }
            Ok(other) => Err(HrdeskError::Statement(format!(
                "expected rows from read, got {:?}",
                other
            ))),
            Err(e) => {
                warn!(?operation, error = %e, "read failed");
                Err(e)
            }
        }
    }

    fn run_write(
        &mut self,
        operation: Operation,
        statement: &Statement,
    ) -> Result<OperationReport> {
        match self.executor.execute(statement).into_result() {
            Ok(ExecutionOutcome::Written { affected_rows }) => {
                info!(?operation, affected_rows, "write committed");
                Ok(OperationReport {
                    operation,
                    message: operation.success_message().to_string(),
                    affected_rows: Some(affected_rows),
                    model: None,
                })
            }
            Ok(other) => Err(HrdeskError::Statement(format!(
                "expected a write result, got {:?}",
                other
            ))),
            Err(e) => {
                warn!(?operation, error = %e, "write rolled back");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::{hr_schema, open_in_memory, ExecutorState};
    use crate::core::db::CellValue;

    fn session() -> CrudSession<'static> {
        CrudSession::new(hr_schema(), open_in_memory(hr_schema()).unwrap())
    }

    #[test]
    fn test_operations_require_selected_table() {
        let mut session = session();
        assert!(matches!(session.read(), Err(HrdeskError::EmptyInput)));
        assert!(matches!(
            session.create(vec![("DepartmentName", "Ops")]),
            Err(HrdeskError::EmptyInput)
        ));
        assert!(matches!(
            session.update(vec![("DepartmentID", "1"), ("DepartmentName", "Ops")]),
            Err(HrdeskError::EmptyInput)
        ));
        assert!(matches!(
            session.delete(vec![("DepartmentID", "1")]),
            Err(HrdeskError::EmptyInput)
        ));
        assert_eq!(session.executor().last_outcome_state(), ExecutorState::Idle);
    }

    #[test]
    fn test_select_unknown_table() {
        let mut session = session();
        assert!(matches!(
            session.select_table("Payroll"),
            Err(HrdeskError::UnknownTable(_))
        ));
        assert!(session.selected_table().is_none());
    }

    #[test]
    fn test_select_table_resets_grid() {
        let mut session = session();
        session.select_table("Project").unwrap();
        assert_eq!(
            session.grid().model().columns,
            vec!["ProjectID", "ProjectName", "ProjectStartDate", "ProjectEndDate", "ProjectBudget"]
        );
    }

    #[test]
    fn test_create_and_read() {
        let mut session = session();
        session.select_table("Department").unwrap();
        let report = session.create(vec![("DepartmentName", "Ops")]).unwrap();
        assert_eq!(report.message, "Record created successfully.");
        assert_eq!(report.affected_rows, Some(1));

        let report = session.read().unwrap();
        let model = report.model.unwrap();
        assert_eq!(model.row_count(), 1);
        assert_eq!(model.cell(0, "DepartmentName"), Some(&CellValue::Text("Ops".into())));
        assert_eq!(model.cell(0, "DepartmentID"), Some(&CellValue::Integer(1)));
        assert_eq!(session.grid().model(), &model);
    }

    #[test]
    fn test_delete_without_key_sends_nothing() {
        let mut session = session();
        session.select_table("Department").unwrap();
        let result = session.delete(vec![("DepartmentName", "Ops")]);
        assert!(matches!(result, Err(HrdeskError::MissingPrimaryKey { .. })));
        assert_eq!(session.executor().last_outcome_state(), ExecutorState::Idle);
    }

    #[test]
    fn test_invalid_value_is_rejected_before_execution() {
        let mut session = session();
        session.select_table("Job").unwrap();
        let result = session.create(vec![("JobTitle", "Clerk"), ("JobMinSalary", "lots")]);
        assert!(matches!(result, Err(HrdeskError::InvalidValue { .. })));
        assert_eq!(session.executor().last_outcome_state(), ExecutorState::Idle);
    }

    #[test]
    fn test_ad_hoc_empty_read_message() {
        let mut session = session();
        let report = session.execute_ad_hoc("select * from Review").unwrap();
        assert_eq!(report.message, "No results found.");
        let model = report.model.unwrap();
        assert_eq!(model.columns.len(), 5);
        assert!(model.is_empty());
    }

    #[test]
    fn test_ad_hoc_blank() {
        let mut session = session();
        assert!(matches!(session.execute_ad_hoc("  "), Err(HrdeskError::EmptyQuery)));
    }

    #[test]
    fn test_failure_messages() {
        let err = HrdeskError::Statement("UNIQUE constraint failed".to_string());
        assert_eq!(
            Operation::Create.failure_message(&err),
            "Error creating record:\nUNIQUE constraint failed"
        );
        assert_eq!(
            Operation::AdHoc.failure_message(&err),
            "Error executing query:\nUNIQUE constraint failed"
        );
    }
}
