//! Closing a settlement: reconciling it into the ledger and retiring it.
//!
//! Both close variants are terminal. Once the settlement row is deleted there
//! is no undo; the only durable record of the collection is the ledger (for a
//! reconciling close) or nothing (for a discard). Clients are expected to
//! warn the operator before confirming a discard.

use rusqlite::{Connection, params};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::SettlementId,
    ledger::{EntryKind, LedgerEntry, NewLedgerEntry, insert_entries},
    settlement::{ObligationStatus, get_settlement},
};

/// How many times a close is retried when SQLite reports the database busy.
const CLOSE_RETRY_LIMIT: u32 = 3;

/// Close a settlement by posting its obligations to the ledger and deleting
/// the settlement.
///
/// Everything happens in one transaction: the all-paid check, the balance
/// read, the ledger batch append, and the settlement delete commit together
/// or not at all. A failed close leaves the settlement intact and retryable.
///
/// The all-paid precondition is verified here rather than trusted from the
/// caller, so a client whose snapshot went stale cannot post an unpaid
/// settlement.
///
/// One income entry is posted per obligation, in participant-list order,
/// described as "{title} - {member name}", all stamped with the close
/// timestamp. Settlements always post as income: every obligation is money
/// owed *to* the organization.
///
/// Returns the appended ledger entries so the caller can confirm the posting
/// to the user.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid settlement,
/// - or [Error::SettlementNotPaid] if any obligation is not marked paid,
/// - or [Error::Conflict] if the database stayed busy for the whole retry
///   budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn close_with_ledger(
    id: SettlementId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let mut attempts = 0;

    loop {
        attempts += 1;

        match close_with_ledger_once(id, now, connection) {
            Err(Error::Conflict) if attempts < CLOSE_RETRY_LIMIT => {
                tracing::warn!(
                    "database busy while closing settlement {id}, \
                     retrying (attempt {attempts} of {CLOSE_RETRY_LIMIT})"
                );
            }
            result => return result,
        }
    }
}

fn close_with_ledger_once(
    id: SettlementId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    // Using unchecked_transaction because we only have &Connection from the
    // MutexGuard.
    let tx = connection.unchecked_transaction()?;

    let detail = get_settlement(id, &tx)?;

    if detail
        .obligations
        .iter()
        .any(|obligation| obligation.status != ObligationStatus::Paid)
    {
        return Err(Error::SettlementNotPaid);
    }

    let entries: Vec<NewLedgerEntry> = detail
        .obligations
        .iter()
        .map(|obligation| NewLedgerEntry {
            description: format!("{} - {}", detail.settlement.title, obligation.member_name),
            amount: obligation.amount,
            kind: EntryKind::Income,
        })
        .collect();

    let appended = insert_entries(detail.settlement.organization_id, &entries, now, &tx)?;

    // Obligations cascade-delete with the settlement row.
    tx.execute("DELETE FROM settlement WHERE id = ?1", params![id])?;

    tx.commit()?;

    tracing::info!(
        "closed settlement {id} with {} ledger entries",
        appended.len()
    );

    Ok(appended)
}

/// Discard a settlement without posting anything to the ledger.
///
/// The ledger and the organization's balance are left untouched. Like the
/// reconciling close, this is terminal: the settlement and its obligations
/// are gone and nothing records that the collection ever happened.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid settlement,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn close_without_ledger(id: SettlementId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM settlement WHERE id = ?1", params![id])?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    tracing::info!("discarded settlement {id} without ledger posting");

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
