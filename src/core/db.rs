use crate::core::error::QmError;
use rusqlite::Connection;
use std::path::Path;

/// Open a datastore database with the standard connection settings.
///
/// The host/group tables deliberately carry no foreign keys; membership
/// consistency across collections is maintained by the operations layer,
/// never by the storage engine.
pub fn db_connect(db_path: &Path) -> Result<Connection, QmError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(QmError::Sqlite)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(QmError::Sqlite)?;
    Ok(conn)
}
