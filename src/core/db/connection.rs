/// Connection Setup Module
///
/// Opens the application's SQLite database and makes sure every table of
/// the schema registry exists. The returned `Connection` is handed to a
/// `StatementExecutor`, which owns it for the rest of the process.

use super::schema::SchemaRegistry;
use crate::config::DatabaseConfig;
use crate::core::{HrdeskError, Result};
use rusqlite::Connection;
use tracing::{debug, info};

pub const IN_MEMORY: &str = ":memory:";

/// Opens the database described by the configuration.
///
/// # Errors
///
/// Returns `HrdeskError::Database` if the file cannot be opened or the
/// connection pragmas cannot be applied.
pub fn open(config: &DatabaseConfig) -> Result<Connection> {
    let conn = if config.path == IN_MEMORY {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.path)?
    };

    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    if config.path != IN_MEMORY {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }

    info!(path = %config.path, "connected to database");
    Ok(conn)
}

/// Opens a fresh in-memory database with the schema already created.
pub fn open_in_memory(registry: &SchemaRegistry) -> Result<Connection> {
    let conn = open(&DatabaseConfig {
        path: IN_MEMORY.to_string(),
        ..DatabaseConfig::default()
    })?;
    bootstrap_schema(&conn, registry)?;
    Ok(conn)
}

/// Creates every registered table that does not exist yet.
pub fn bootstrap_schema(conn: &Connection, registry: &SchemaRegistry) -> Result<()> {
    for table in registry.tables() {
        let ddl = table.create_sql();
        debug!(table = %table.name, "ensuring table exists");
        conn.execute_batch(&ddl).map_err(|e| {
            HrdeskError::Config(format!("failed to create table {}: {}", table.name, e))
        })?;
    }
    Ok(())
}
