//! The slice of the club directory the dues core consumes.
//!
//! The directory service proper (member CRUD, profiles, roles) lives outside
//! this crate. The core only needs member identity and a display name for
//! ledger descriptions, plus a row for obligation foreign keys to point at.

use rusqlite::{Connection, Row, params};

use crate::{
    Error,
    database_id::{MemberId, OrganizationId},
};

/// A club member as seen by the dues core: an ID and a display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// The ID of the member.
    pub id: MemberId,
    /// The organization the member belongs to.
    pub organization_id: OrganizationId,
    /// The member's display name, used in ledger entry descriptions.
    pub name: String,
}

/// Create the member table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_member_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS member (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL,
            name TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Member].
pub fn map_row_to_member(row: &Row) -> Result<Member, rusqlite::Error> {
    let id = row.get(0)?;
    let organization_id = row.get(1)?;
    let name = row.get(2)?;

    Ok(Member {
        id,
        organization_id,
        name,
    })
}

/// Add a member to the directory.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn create_member(
    organization_id: OrganizationId,
    name: &str,
    connection: &Connection,
) -> Result<Member, Error> {
    connection.execute(
        "INSERT INTO member (organization_id, name) VALUES (?1, ?2)",
        params![organization_id, name],
    )?;

    Ok(Member {
        id: connection.last_insert_rowid(),
        organization_id,
        name: name.to_owned(),
    })
}

/// Retrieve a member from the directory by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a known member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_member(id: MemberId, connection: &Connection) -> Result<Member, Error> {
    let member = connection.query_one(
        "SELECT id, organization_id, name FROM member WHERE id = ?1",
        params![id],
        map_row_to_member,
    )?;

    Ok(member)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{create_member, get_member};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_and_get_member() {
        let conn = get_test_connection();

        let created = create_member(7, "Alex Tan", &conn).expect("could not create member");
        let got = get_member(created.id, &conn).expect("could not get member");

        assert_eq!(created, got);
        assert_eq!(got.name, "Alex Tan");
        assert_eq!(got.organization_id, 7);
    }

    #[test]
    fn get_missing_member_returns_not_found() {
        let conn = get_test_connection();

        let result = get_member(999, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }
}
