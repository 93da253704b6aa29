use rimeorm_core::{
    dialect::{CompileError, Dialect, Params},
    model::{self, Record},
    query::{Delete, Insert, Query, Update},
    value::Value,
};
use thiserror::Error as ThisError;
use tracing::debug;

///
/// Session
///
/// Executes compiled statements against a DBAPI-shaped cursor. The session
/// owns no transport; drivers implement [`Cursor`] and surface their failures
/// as boxed errors.
///

/// Driver-side failure, opaque to this layer.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

///
/// SessionError
///

#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("no row matched the statement")]
    RowNotFound,

    #[error("column missing from result row: '{column}'")]
    ColumnMissing { column: String },

    #[error("unexpected column value: {detail}")]
    UnexpectedValue { detail: String },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("driver error: {0}")]
    Driver(#[source] DriverError),
}

impl From<DriverError> for SessionError {
    fn from(err: DriverError) -> Self {
        Self::Driver(err)
    }
}

///
/// Row
///
/// One result row: column values in select order, addressable by name.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn require(&self, name: &str) -> Result<&Value, SessionError> {
        self.get(name).ok_or_else(|| SessionError::ColumnMissing {
            column: name.to_string(),
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

///
/// FromRow
///

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, SessionError>;
}

///
/// Cursor
///
/// The driver contract, shaped after DBAPI cursors: execute, fetch, and the
/// two post-execution attributes the session relies on.
///

pub trait Cursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), DriverError>;

    fn executemany(&mut self, sql: &str, rows: &[Params]) -> Result<(), DriverError>;

    fn fetchone(&mut self) -> Result<Option<Row>, DriverError>;

    fn fetchall(&mut self) -> Result<Vec<Row>, DriverError>;

    /// Id assigned by the last insert, where the driver knows it.
    fn lastrowid(&self) -> Option<u64>;

    /// Rows affected by the last statement.
    fn rowcount(&self) -> u64;
}

///
/// Session
///

pub struct Session<D: Dialect, C: Cursor> {
    dialect: D,
    cursor: C,
}

impl<D: Dialect, C: Cursor> Session<D, C> {
    pub const fn new(dialect: D, cursor: C) -> Self {
        Self { dialect, cursor }
    }

    #[must_use]
    pub const fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn into_cursor(self) -> C {
        self.cursor
    }

    pub fn fetch_all<R: FromRow>(&mut self, query: &Query) -> Result<Vec<R>, SessionError> {
        let (sql, params) = self.dialect.query(query)?;
        debug!(target: "rimeorm::session", %sql, params = params.len(), "select");

        self.cursor.execute(&sql, &params)?;
        self.cursor.fetchall()?.iter().map(R::from_row).collect()
    }

    /// Fetch the first matching row; the query window is forced to one row.
    pub fn fetch_one<R: FromRow>(&mut self, query: &Query) -> Result<Option<R>, SessionError> {
        let (sql, params) = self.dialect.query(&query.clone().first())?;
        debug!(target: "rimeorm::session", %sql, params = params.len(), "select one");

        self.cursor.execute(&sql, &params)?;
        match self.cursor.fetchone()? {
            Some(row) => Ok(Some(R::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Run the query as `count(*)` and read back the single column.
    pub fn count(&mut self, query: &Query) -> Result<u64, SessionError> {
        let (sql, params) = self.dialect.query(&query.clone().count("*"))?;
        debug!(target: "rimeorm::session", %sql, params = params.len(), "count");

        self.cursor.execute(&sql, &params)?;
        let row = self.cursor.fetchone()?.ok_or(SessionError::RowNotFound)?;
        match row.values().next() {
            Some(Value::Uint(count)) => Ok(*count),
            Some(Value::Int(count)) => Ok(u64::try_from(*count).unwrap_or_default()),
            other => Err(SessionError::UnexpectedValue {
                detail: format!("count column held {other:?}"),
            }),
        }
    }

    /// Insert the records in one multi-row statement. When a single record
    /// is inserted and the driver reports a row id, the id is written back
    /// into the record's auto-increment field.
    pub fn insert<R: Record>(&mut self, records: &mut [R]) -> Result<(), SessionError> {
        let mut insert = Insert::of::<R>();
        for record in records.iter() {
            insert = insert.row(record);
        }
        if insert.is_empty() {
            return Ok(());
        }

        let (sql, rows) = self.dialect.insert(&insert)?;
        debug!(target: "rimeorm::session", %sql, rows = rows.len(), "insert");

        self.cursor.executemany(&sql, &rows)?;
        if let [record] = records {
            if let Some(id) = self.cursor.lastrowid() {
                model::apply_auto_increment(record, id);
            }
        }

        Ok(())
    }

    /// Execute an update; returns the affected row count.
    pub fn update(&mut self, update: &Update) -> Result<u64, SessionError> {
        let (sql, params) = self.dialect.update(update)?;
        debug!(target: "rimeorm::session", %sql, params = params.len(), "update");

        self.cursor.execute(&sql, &params)?;
        Ok(self.cursor.rowcount())
    }

    /// Update that must match: zero affected rows is `RowNotFound`.
    pub fn update_expected(&mut self, update: &Update) -> Result<(), SessionError> {
        if self.update(update)? == 0 {
            return Err(SessionError::RowNotFound);
        }

        Ok(())
    }

    /// Execute a delete; returns the affected row count.
    pub fn delete(&mut self, delete: &Delete) -> Result<u64, SessionError> {
        let (sql, params) = self.dialect.delete(delete)?;
        debug!(target: "rimeorm::session", %sql, params = params.len(), "delete");

        self.cursor.execute(&sql, &params)?;
        Ok(self.cursor.rowcount())
    }

    /// Delete that must match: zero affected rows is `RowNotFound`.
    pub fn delete_expected(&mut self, delete: &Delete) -> Result<(), SessionError> {
        if self.delete(delete)? == 0 {
            return Err(SessionError::RowNotFound);
        }

        Ok(())
    }

    /// Execute hand-written SQL without parameters.
    pub fn raw(&mut self, sql: &str) -> Result<(), SessionError> {
        let (sql, params) = self.dialect.raw(sql);
        debug!(target: "rimeorm::session", %sql, "raw");

        self.cursor.execute(&sql, &params)?;

        Ok(())
    }
}
