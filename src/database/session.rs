use crate::database::batch::Batch;
use crate::error::MigrateError;
use duckdb::params_from_iter;
use duckdb::Connection;
use std::path::Path;

/// Destination catalog query: column names of a table in declaration order.
const TABLE_COLUMNS_SQL: &str = "SELECT column_name FROM information_schema.columns \
     WHERE table_schema = current_schema() AND lower(table_name) = lower(?) \
     ORDER BY ordinal_position";

/// Operations the pipeline needs from the destination database.
///
/// A session is opened once per run and handed by reference to every stage,
/// which use it strictly one call at a time.
pub trait Session {
    /// Executes a script of one or more `;`-separated statements.
    fn execute_script(&self, sql: &str) -> Result<(), MigrateError>;

    /// Lists the columns of a table, or None when the table does not exist.
    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, MigrateError>;

    /// Inserts every row of a batch with a single statement and returns the inserted row count.
    fn insert(&self, batch: &Batch) -> Result<usize, MigrateError>;
}

/// A session backed by a DuckDB database file or an in-memory database.
///
/// The connection is released when the session is closed or dropped.
pub struct DuckDbSession {
    connection: Connection,
}

impl DuckDbSession {
    /// Opens a DuckDB database. `:memory:` opens a private in-memory database.
    pub fn open(database: &str) -> Result<Self, MigrateError> {
        let connection = if database == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(Path::new(database))?
        };
        log::info!("Connected to database [{}]", database);
        Ok(Self { connection })
    }

    pub fn open_in_memory() -> Result<Self, MigrateError> {
        Self::open(":memory:")
    }

    /// Closes the connection, reporting errors the implicit drop would swallow.
    pub fn close(self) -> Result<(), MigrateError> {
        self.connection.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    /// Direct access to the connection, e.g. for verification queries.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Session for DuckDbSession {
    fn execute_script(&self, sql: &str) -> Result<(), MigrateError> {
        self.connection.execute_batch(sql)?;
        Ok(())
    }

    fn table_columns(&self, table: &str) -> Result<Option<Vec<String>>, MigrateError> {
        let mut statement = self.connection.prepare(TABLE_COLUMNS_SQL)?;
        let columns = statement
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(Some(columns).filter(|columns| !columns.is_empty()))
    }

    fn insert(&self, batch: &Batch) -> Result<usize, MigrateError> {
        let sql = batch.insert_statement();
        let inserted = self
            .connection
            .execute(&sql, params_from_iter(batch.parameters()))?;
        Ok(inserted)
    }
}
