//! Creates the application's database schema.

use rusqlite::Connection;

use crate::{
    directory::create_member_table,
    ledger::create_ledger_entry_table,
    settlement::{create_obligation_table, create_settlement_table},
};

/// Create the tables for the domain models if they do not already exist.
///
/// Also enables foreign key enforcement for the connection, which the
/// obligation table relies on to cascade-delete when a settlement is closed.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_member_table(connection)?;
    create_ledger_entry_table(connection)?;
    create_settlement_table(connection)?;
    create_obligation_table(connection)?;

    Ok(())
}
