/// Database Module
///
/// The database layer is split into four concerns:
/// - **Schema Registry** (`schema.rs`): the fixed table definitions and key declarations
/// - **Statement Building** (`statement.rs`): parameterized INSERT/SELECT/UPDATE/DELETE and ad-hoc text
/// - **Execution** (`query.rs`): the single-owner executor with commit/rollback per statement
/// - **Connection Setup** (`connection.rs`): opening SQLite and creating the schema
///
/// ## Concurrency
///
/// One connection serves the whole application. The executor owns it and
/// every operation takes `&mut self`, so statements never overlap. Callers that
/// need to share it across threads must wrap the executor in a single `Mutex`.
pub mod connection;
pub mod query;
pub mod schema;
pub mod statement;

pub use connection::*;
pub use query::*;
pub use schema::*;
pub use statement::*;
