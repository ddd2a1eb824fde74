//! Defines the core data models and database queries for settlements and
//! participant obligations.

use std::collections::HashSet;

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{MemberId, ObligationId, OrganizationId, SettlementId},
};

// ============================================================================
// MODELS
// ============================================================================

/// The payment status of one member's obligation.
///
/// This is a simple label, not a workflow: any status may be set at any time,
/// in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
    /// The member has not yet responded to the collection request.
    Pending,
    /// The member has paid their share.
    Paid,
    /// The member has been marked as not having paid.
    Unpaid,
}

impl ObligationStatus {
    /// The column value used to store the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ObligationStatus::Pending => "pending",
            ObligationStatus::Paid => "paid",
            ObligationStatus::Unpaid => "unpaid",
        }
    }

    fn from_column(value: &str, column_index: usize) -> Result<Self, rusqlite::Error> {
        match value {
            "pending" => Ok(ObligationStatus::Pending),
            "paid" => Ok(ObligationStatus::Paid),
            "unpaid" => Ok(ObligationStatus::Unpaid),
            other => Err(rusqlite::Error::FromSqlConversionFailure(
                column_index,
                rusqlite::types::Type::Text,
                format!("unknown obligation status {other:?}").into(),
            )),
        }
    }
}

/// A dues-collection request tied to a set of members and owed amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// The ID of the settlement.
    pub id: SettlementId,
    /// The organization collecting the dues.
    pub organization_id: OrganizationId,
    /// A short title, e.g. "Spring retreat 2025". Never empty.
    pub title: String,
    /// Free-text description of what is being collected and why.
    pub description: String,
    /// The member who created the settlement, if still known.
    pub created_by: Option<MemberId>,
    /// The date the settlement was created.
    pub applied_date: time::Date,
}

/// One member's owed amount and payment status within a settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    /// The ID of the obligation.
    pub id: ObligationId,
    /// The settlement the obligation belongs to.
    pub settlement_id: SettlementId,
    /// The member who owes the amount.
    pub member_id: MemberId,
    /// The member's display name, resolved from the directory.
    pub member_name: String,
    /// The amount owed, in minor currency units. May be zero; never negative.
    pub amount: i64,
    /// The payment status of the obligation.
    pub status: ObligationStatus,
    /// When the status last changed, for audit display.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A settlement together with its obligations in participant-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDetail {
    /// The settlement itself.
    #[serde(flatten)]
    pub settlement: Settlement,
    /// The settlement's obligations, in the order the participants were
    /// listed at creation. The closer posts ledger entries in this order.
    pub obligations: Vec<Obligation>,
}

/// One participant in a settlement being created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObligation {
    /// The member who owes the amount.
    pub member_id: MemberId,
    /// The amount owed, in minor currency units. Zero is valid and explicit.
    pub amount: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the settlement table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_settlement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS settlement (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            created_by INTEGER,
            applied_date TEXT NOT NULL,
            FOREIGN KEY(created_by) REFERENCES member(id) ON DELETE SET NULL
        )",
        (),
    )?;

    Ok(())
}

/// Create the obligation table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_obligation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS obligation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            settlement_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid', 'unpaid')),
            updated_at TEXT NOT NULL,
            UNIQUE(settlement_id, member_id),
            FOREIGN KEY(settlement_id) REFERENCES settlement(id) ON DELETE CASCADE,
            FOREIGN KEY(member_id) REFERENCES member(id)
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Settlement].
pub fn map_row_to_settlement(row: &Row) -> Result<Settlement, rusqlite::Error> {
    let id = row.get(0)?;
    let organization_id = row.get(1)?;
    let title = row.get(2)?;
    let description = row.get(3)?;
    let created_by = row.get(4)?;
    let applied_date = row.get(5)?;

    Ok(Settlement {
        id,
        organization_id,
        title,
        description,
        created_by,
        applied_date,
    })
}

/// Map a database row (obligation joined with member) to an [Obligation].
pub fn map_row_to_obligation(row: &Row) -> Result<Obligation, rusqlite::Error> {
    let id = row.get(0)?;
    let settlement_id = row.get(1)?;
    let member_id = row.get(2)?;
    let member_name = row.get(3)?;
    let amount = row.get(4)?;
    let status: String = row.get(5)?;
    let status = ObligationStatus::from_column(&status, 5)?;
    let updated_at = row.get(6)?;

    Ok(Obligation {
        id,
        settlement_id,
        member_id,
        member_name,
        amount,
        status,
        updated_at,
    })
}

const SELECT_OBLIGATION: &str = "SELECT o.id, o.settlement_id, o.member_id, m.name, o.amount,
        o.status, o.updated_at
     FROM obligation o
     JOIN member m ON m.id = o.member_id";

/// Create a settlement and its obligations.
///
/// The settlement row and every obligation row are persisted together; if any
/// participant is invalid, nothing is persisted. All obligations start as
/// [ObligationStatus::Pending].
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTitle] if `title` is empty or whitespace,
/// - or [Error::NoParticipants] if `participants` is empty,
/// - or [Error::DuplicateParticipant] if a member is listed twice,
/// - or [Error::NegativeAmount] if any amount is negative,
/// - or [Error::UnknownMember] if a member ID is not in the directory,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_settlement(
    organization_id: OrganizationId,
    title: &str,
    description: &str,
    created_by: Option<MemberId>,
    participants: &[NewObligation],
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<SettlementDetail, Error> {
    if title.trim().is_empty() {
        return Err(Error::EmptyTitle);
    }

    if participants.is_empty() {
        return Err(Error::NoParticipants);
    }

    let mut seen_members = HashSet::new();
    for participant in participants {
        if !seen_members.insert(participant.member_id) {
            return Err(Error::DuplicateParticipant);
        }
    }

    // Using unchecked_transaction because we only have &Connection from the
    // MutexGuard.
    let tx = connection.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO settlement (organization_id, title, description, created_by, applied_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![organization_id, title, description, created_by, now.date()],
    )?;
    let settlement_id = tx.last_insert_rowid();

    for participant in participants {
        tx.execute(
            "INSERT INTO obligation (settlement_id, member_id, amount, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                settlement_id,
                participant.member_id,
                participant.amount,
                ObligationStatus::Pending.as_str(),
                now
            ],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::UnknownMember(Some(participant.member_id)),
            error => error.into(),
        })?;
    }

    let detail = get_settlement(settlement_id, &tx)?;
    tx.commit()?;

    Ok(detail)
}

/// Retrieve a settlement and its obligations by its `id`.
///
/// Obligations are returned in the order the participants were listed when
/// the settlement was created.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid settlement,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_settlement(id: SettlementId, connection: &Connection) -> Result<SettlementDetail, Error> {
    let settlement = connection.query_one(
        "SELECT id, organization_id, title, description, created_by, applied_date
         FROM settlement WHERE id = ?1",
        params![id],
        map_row_to_settlement,
    )?;

    let mut stmt =
        connection.prepare(&format!("{SELECT_OBLIGATION} WHERE o.settlement_id = ?1 ORDER BY o.id"))?;
    let obligations = stmt
        .query_map(params![id], map_row_to_obligation)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SettlementDetail {
        settlement,
        obligations,
    })
}

/// List an organization's open settlements, most recent first, optionally
/// filtered by the member who created them.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_settlements(
    organization_id: OrganizationId,
    created_by: Option<MemberId>,
    connection: &Connection,
) -> Result<Vec<Settlement>, Error> {
    const SELECT: &str = "SELECT id, organization_id, title, description, created_by, applied_date
         FROM settlement WHERE organization_id = ?1";

    let settlements = match created_by {
        Some(member_id) => connection
            .prepare(&format!("{SELECT} AND created_by = ?2 ORDER BY id DESC"))?
            .query_map(params![organization_id, member_id], map_row_to_settlement)?
            .collect::<Result<Vec<_>, _>>()?,
        None => connection
            .prepare(&format!("{SELECT} ORDER BY id DESC"))?
            .query_map(params![organization_id], map_row_to_settlement)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(settlements)
}

/// Set the payment status of an obligation and record when it changed.
///
/// Every transition between the three statuses is allowed, in either
/// direction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid obligation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_obligation_status(
    id: ObligationId,
    status: ObligationStatus,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Obligation, Error> {
    let rows_updated = connection.execute(
        "UPDATE obligation SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    get_obligation(id, connection)
}

/// Retrieve an obligation (with the member's display name) by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid obligation,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_obligation(id: ObligationId, connection: &Connection) -> Result<Obligation, Error> {
    let obligation = connection.query_one(
        &format!("{SELECT_OBLIGATION} WHERE o.id = ?1"),
        params![id],
        map_row_to_obligation,
    )?;

    Ok(obligation)
}

/// Retrieve the calling member's own obligation within a settlement.
///
/// A member who owes nothing is still a participant with an amount of zero;
/// a member with no obligation row at all gets [Error::NotAParticipant] so
/// clients can tell the two apart.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `settlement_id` does not refer to a valid settlement,
/// - or [Error::NotAParticipant] if the member has no obligation in it,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn viewer_obligation(
    settlement_id: SettlementId,
    member_id: MemberId,
    connection: &Connection,
) -> Result<Obligation, Error> {
    let settlement_exists: bool = connection.query_one(
        "SELECT EXISTS(SELECT 1 FROM settlement WHERE id = ?1)",
        params![settlement_id],
        |row| row.get(0),
    )?;

    if !settlement_exists {
        return Err(Error::NotFound);
    }

    connection
        .query_one(
            &format!("{SELECT_OBLIGATION} WHERE o.settlement_id = ?1 AND o.member_id = ?2"),
            params![settlement_id, member_id],
            map_row_to_obligation,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotAParticipant,
            error => error.into(),
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        database_id::MemberId,
        db::initialize,
        directory::create_member,
    };

    use super::{
        NewObligation, ObligationStatus, create_settlement, get_settlement, list_settlements,
        set_obligation_status, viewer_obligation,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn seed_members(conn: &Connection, names: &[&str]) -> Vec<MemberId> {
        names
            .iter()
            .map(|name| create_member(1, name, conn).unwrap().id)
            .collect()
    }

    fn owes(member_id: MemberId, amount: i64) -> NewObligation {
        NewObligation { member_id, amount }
    }

    #[test]
    fn create_and_get_settlement() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana", "Ben"]);
        let now = datetime!(2025-04-01 09:00 UTC);

        let created = create_settlement(
            1,
            "Spring retreat",
            "Cabin hire and food",
            Some(members[0]),
            &[owes(members[0], 1_000), owes(members[1], 2_000)],
            now,
            &conn,
        )
        .unwrap();

        let got = get_settlement(created.settlement.id, &conn).unwrap();
        assert_eq!(got, created);
        assert_eq!(got.settlement.title, "Spring retreat");
        assert_eq!(got.settlement.created_by, Some(members[0]));
        assert_eq!(got.obligations.len(), 2);
        assert_eq!(got.obligations[0].member_name, "Ana");
        assert_eq!(got.obligations[1].member_name, "Ben");
        assert!(
            got.obligations
                .iter()
                .all(|obligation| obligation.status == ObligationStatus::Pending)
        );
    }

    #[test]
    fn create_rejects_empty_title() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana"]);

        let result = create_settlement(
            1,
            "  ",
            "",
            None,
            &[owes(members[0], 500)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        );

        assert_eq!(result.err(), Some(Error::EmptyTitle));
    }

    #[test]
    fn create_rejects_empty_participant_list() {
        let conn = get_test_connection();

        let result = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        );

        assert_eq!(result.err(), Some(Error::NoParticipants));
        assert!(list_settlements(1, None, &conn).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_duplicate_member() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana"]);

        let result = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[owes(members[0], 500), owes(members[0], 700)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        );

        assert_eq!(result.err(), Some(Error::DuplicateParticipant));
        assert!(list_settlements(1, None, &conn).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_unknown_member_and_rolls_back() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana"]);

        let result = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[owes(members[0], 500), owes(999, 700)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        );

        assert_eq!(result.err(), Some(Error::UnknownMember(Some(999))));
        assert!(list_settlements(1, None, &conn).unwrap().is_empty());
    }

    #[test]
    fn create_rejects_negative_amount() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana"]);

        let result = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[owes(members[0], -1)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        );

        assert_eq!(result.err(), Some(Error::NegativeAmount));
    }

    #[test]
    fn zero_amount_is_a_valid_obligation() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana"]);

        let created = create_settlement(
            1,
            "Covered by sponsor",
            "",
            None,
            &[owes(members[0], 0)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(created.obligations[0].amount, 0);
    }

    #[test]
    fn status_round_trip_returns_to_unpaid_state() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana"]);
        let created = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[owes(members[0], 1_000)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        )
        .unwrap();
        let obligation_id = created.obligations[0].id;

        let paid = set_obligation_status(
            obligation_id,
            ObligationStatus::Paid,
            datetime!(2025-04-02 10:00 UTC),
            &conn,
        )
        .unwrap();
        assert_eq!(paid.status, ObligationStatus::Paid);
        assert_ne!(paid.updated_at, created.obligations[0].updated_at);

        let unpaid = set_obligation_status(
            obligation_id,
            ObligationStatus::Unpaid,
            datetime!(2025-04-03 10:00 UTC),
            &conn,
        )
        .unwrap();
        assert_eq!(unpaid.status, ObligationStatus::Unpaid);
        assert_eq!(unpaid.amount, 1_000);
        assert_ne!(unpaid.updated_at, paid.updated_at);
    }

    #[test]
    fn set_status_on_missing_obligation_is_not_found() {
        let conn = get_test_connection();

        let result = set_obligation_status(
            42,
            ObligationStatus::Paid,
            datetime!(2025-04-02 10:00 UTC),
            &conn,
        );

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[test]
    fn viewer_obligation_distinguishes_non_participants() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana", "Ben"]);
        let created = create_settlement(
            1,
            "Spring retreat",
            "",
            None,
            &[owes(members[0], 0)],
            datetime!(2025-04-01 09:00 UTC),
            &conn,
        )
        .unwrap();
        let settlement_id = created.settlement.id;

        // A zero amount is still a participation.
        let own = viewer_obligation(settlement_id, members[0], &conn).unwrap();
        assert_eq!(own.amount, 0);

        let result = viewer_obligation(settlement_id, members[1], &conn);
        assert_eq!(result.err(), Some(Error::NotAParticipant));

        let result = viewer_obligation(999, members[0], &conn);
        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[test]
    fn list_filters_by_creator() {
        let conn = get_test_connection();
        let members = seed_members(&conn, &["Ana", "Ben"]);
        let now = datetime!(2025-04-01 09:00 UTC);

        create_settlement(
            1,
            "By Ana",
            "",
            Some(members[0]),
            &[owes(members[0], 100)],
            now,
            &conn,
        )
        .unwrap();
        create_settlement(
            1,
            "By Ben",
            "",
            Some(members[1]),
            &[owes(members[1], 100)],
            now,
            &conn,
        )
        .unwrap();

        let all = list_settlements(1, None, &conn).unwrap();
        assert_eq!(all.len(), 2);
        // Most recent first.
        assert_eq!(all[0].title, "By Ben");

        let by_ana = list_settlements(1, Some(members[0]), &conn).unwrap();
        assert_eq!(by_ana.len(), 1);
        assert_eq!(by_ana[0].title, "By Ana");
    }
}
