/// Statement Execution Module
///
/// This module runs statements against the application's single SQLite
/// connection. Every statement runs in its own transaction: it is committed
/// after any successful execution (reads included) and rolled back on
/// failure, so the connection is always clean for the next operation.

use super::statement::{Statement, StatementKind};
use crate::core::HrdeskError;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Batch, Connection, Params};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// A scalar exactly as the driver returned it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).to_string()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(t) => write!(f, "{}", t),
            CellValue::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

/// Rows returned by a read, with the column names that produced them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of running one statement. Failures never escape as errors here;
/// the caller decides how to surface them.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// A read completed and was committed
    Rows(ResultSet),
    /// A write completed and was committed
    Written { affected_rows: usize },
    /// The statement failed and the transaction was rolled back
    Failed { message: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ExecutionOutcome::Failed { .. })
    }

    /// Converts a failure into `HrdeskError::Statement`
    pub fn into_result(self) -> crate::core::Result<ExecutionOutcome> {
        match self {
            ExecutionOutcome::Failed { message } => Err(HrdeskError::Statement(message)),
            other => Ok(other),
        }
    }
}

/// Lifecycle of the executor: Idle -> Executing -> {Committed | RolledBack}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorState {
    #[default]
    Idle,
    Executing,
    Committed,
    RolledBack,
}

/// Owns the application's only connection and runs statements on it.
///
/// Every method takes `&mut self`, so statements cannot overlap. The executor
/// is not reentrant; sharing it between threads requires wrapping it in a
/// `Mutex`, otherwise concurrent callers would race on the open transaction.
#[derive(Debug)]
pub struct StatementExecutor {
    connection: Connection,
    state: ExecutorState,
    last_outcome_state: ExecutorState,
}

impl StatementExecutor {
    pub fn new(connection: Connection) -> Self {
        StatementExecutor {
            connection,
            state: ExecutorState::Idle,
            last_outcome_state: ExecutorState::Idle,
        }
    }

    /// The current state; `Idle` whenever no statement is running
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// How the most recent statement ended (`Committed` or `RolledBack`)
    pub fn last_outcome_state(&self) -> ExecutorState {
        self.last_outcome_state
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Releases the connection
    pub fn into_connection(self) -> Connection {
        self.connection
    }

    /// Runs a statement inside its own transaction.
    pub fn execute(&mut self, statement: &Statement) -> ExecutionOutcome {
        self.state = ExecutorState::Executing;
        debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");

        let outcome = match self.run_in_transaction(statement) {
            Ok(outcome) => {
                self.last_outcome_state = ExecutorState::Committed;
                outcome
            }
            Err(e) => {
                warn!(sql = %statement.sql, error = %e, "statement rolled back");
                self.last_outcome_state = ExecutorState::RolledBack;
                ExecutionOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        self.state = ExecutorState::Idle;
        outcome
    }

    /// Classifies raw text and runs it.
    pub fn execute_sql(&mut self, sql: &str) -> ExecutionOutcome {
        match super::statement::build_ad_hoc(sql) {
            Ok(statement) => self.execute(&statement),
            Err(e) => ExecutionOutcome::Failed {
                message: e.to_string(),
            },
        }
    }

    fn run_in_transaction(&mut self, statement: &Statement) -> rusqlite::Result<ExecutionOutcome> {
        let tx = self.connection.transaction()?;
        match run_statement(&tx, statement) {
            Ok(outcome) => {
                tx.commit()?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

fn run_statement(conn: &Connection, statement: &Statement) -> rusqlite::Result<ExecutionOutcome> {
    // Bound statements come from the builders and hold exactly one statement
    if statement.params.is_empty() {
        return run_batch(conn, statement);
    }

    let mut stmt = conn.prepare(&statement.sql)?;
    let params = params_from_iter(statement.params.iter());
    match statement.kind {
        StatementKind::Read => {
            let result = read_rows(&mut stmt, params)?;
            debug!(rows = result.row_count(), "read complete");
            Ok(ExecutionOutcome::Rows(result))
        }
        StatementKind::Write => {
            let affected_rows = stmt.execute(params)?;
            debug!(affected_rows, "write complete");
            Ok(ExecutionOutcome::Written { affected_rows })
        }
    }
}

/// Runs every statement of unbound text in order, inside the caller's
/// transaction. A read reports the rows of its last row-returning statement;
/// a write reports the affected rows summed over all statements.
fn run_batch(conn: &Connection, statement: &Statement) -> rusqlite::Result<ExecutionOutcome> {
    let mut batch = Batch::new(conn, &statement.sql);
    let mut result = None;
    let mut affected_rows = 0;
    let mut executed = 0;

    while let Some(mut stmt) = batch.next()? {
        executed += 1;
        match statement.kind {
            StatementKind::Read if stmt.column_count() > 0 => {
                result = Some(read_rows(&mut stmt, [])?);
            }
            _ => affected_rows += stmt.execute([])?,
        }
    }

    match statement.kind {
        StatementKind::Read => {
            let result = result.unwrap_or_default();
            debug!(statements = executed, rows = result.row_count(), "read complete");
            Ok(ExecutionOutcome::Rows(result))
        }
        StatementKind::Write => {
            debug!(statements = executed, affected_rows, "write complete");
            Ok(ExecutionOutcome::Written { affected_rows })
        }
    }
}

fn read_rows<P: Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> rusqlite::Result<ResultSet> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let column_count = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query(params)?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(CellValue::from(row.get_ref(i)?));
        }
        rows.push(values);
    }
    Ok(ResultSet { columns, rows })
}
