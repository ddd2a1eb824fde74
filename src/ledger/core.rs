//! Defines the core data models and database queries for the ledger.
//!
//! The ledger is an append-only, per-organization transaction history where
//! every entry carries the running balance after it is applied. Amounts are
//! integer minor currency units; balances are signed.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::{
    Error,
    database_id::{LedgerEntryId, OrganizationId},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a ledger entry adds to or subtracts from the organization's funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money received by the organization.
    Income,
    /// Money spent by the organization.
    Expense,
}

impl EntryKind {
    /// The column value used to store the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    fn from_column(value: &str, column_index: usize) -> Result<Self, rusqlite::Error> {
        match value {
            "income" => Ok(EntryKind::Income),
            "expense" => Ok(EntryKind::Expense),
            other => Err(rusqlite::Error::FromSqlConversionFailure(
                column_index,
                rusqlite::types::Type::Text,
                format!("unknown entry kind {other:?}").into(),
            )),
        }
    }
}

/// One permanent, balance-carrying financial record for an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The ID of the ledger entry. IDs are monotonic in creation order and
    /// break ties between entries written as one same-moment batch.
    pub id: LedgerEntryId,
    /// The organization the entry belongs to.
    pub organization_id: OrganizationId,
    /// A text description of what the money was for.
    pub description: String,
    /// The amount of money moved, in minor currency units. Never negative.
    pub amount: i64,
    /// Whether the entry is income or an expense.
    pub kind: EntryKind,
    /// The date on which the entry occurred.
    pub date: Date,
    /// The time at which the entry occurred.
    pub time: Time,
    /// The running balance of the organization after applying this entry.
    pub balance: i64,
}

/// The caller-supplied part of a ledger entry, before a balance and timestamp
/// are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    /// A text description of what the money was for.
    pub description: String,
    /// The amount of money moved, in minor currency units.
    pub amount: i64,
    /// Whether the entry is income or an expense.
    pub kind: EntryKind,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the ledger entry table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_ledger_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            balance INTEGER NOT NULL
        )",
        (),
    )?;

    // Composite index used by the balance and period-listing queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_org_date
         ON ledger_entry(organization_id, date, time)",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [LedgerEntry].
pub fn map_row_to_ledger_entry(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    let id = row.get(0)?;
    let organization_id = row.get(1)?;
    let description = row.get(2)?;
    let amount = row.get(3)?;
    let kind: String = row.get(4)?;
    let kind = EntryKind::from_column(&kind, 4)?;
    let date = row.get(5)?;
    let time = row.get(6)?;
    let balance = row.get(7)?;

    Ok(LedgerEntry {
        id,
        organization_id,
        description,
        amount,
        kind,
        date,
        time,
        balance,
    })
}

/// The first and last day of the calendar month containing `date`.
fn month_bounds(date: Date) -> (Date, Date) {
    let month_length = date.month().length(date.year());

    // Day 1 and the month length are valid for every month, so the fallbacks
    // are unreachable.
    let month_start = date.replace_day(1).unwrap_or(date);
    let month_end = date.replace_day(month_length).unwrap_or(date);

    (month_start, month_end)
}

/// Get the current balance of an organization's account as of `today`.
///
/// Returns the balance of the most recent entry within the calendar month of
/// `today`. If the month has no entries yet, falls back to the most recent
/// entry strictly before the month start. If the organization has no entries
/// at all, returns 0.
///
/// The two-tier fallback exists because clients window the ledger by calendar
/// month, but the running balance must stay continuous across month
/// boundaries.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn current_balance(
    organization_id: OrganizationId,
    today: Date,
    connection: &Connection,
) -> Result<i64, Error> {
    let (month_start, month_end) = month_bounds(today);

    let this_month: Option<i64> = connection
        .query_row(
            "SELECT balance FROM ledger_entry
             WHERE organization_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date DESC, time DESC, id DESC
             LIMIT 1",
            params![organization_id, month_start, month_end],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(balance) = this_month {
        return Ok(balance);
    }

    let carried_over: Option<i64> = connection
        .query_row(
            "SELECT balance FROM ledger_entry
             WHERE organization_id = ?1 AND date < ?2
             ORDER BY date DESC, time DESC, id DESC
             LIMIT 1",
            params![organization_id, month_start],
            |row| row.get(0),
        )
        .optional()?;

    Ok(carried_over.unwrap_or(0))
}

/// Append a batch of entries to an organization's ledger.
///
/// Every entry is stamped with the date and time of `now`. Running balances
/// are computed cumulatively from [current_balance] in the order the entries
/// are given: income adds, expense subtracts. Within the batch, insertion
/// order (not the shared timestamp) fixes the relative balance ordering.
///
/// The batch is written atomically. If any insert fails, no entry from the
/// batch is persisted and the caller should retry the whole batch.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeAmount] if any entry has a negative amount,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn append_entries(
    organization_id: OrganizationId,
    entries: &[NewLedgerEntry],
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    // Using unchecked_transaction because we only have &Connection from the
    // MutexGuard.
    let tx = connection.unchecked_transaction()?;
    let appended = insert_entries(organization_id, entries, now, &tx)?;
    tx.commit()?;

    Ok(appended)
}

/// Insert a batch of entries without opening a transaction.
///
/// Callers must wrap this in a transaction; [append_entries] does so for the
/// standalone case, and the settlement closer runs it inside the close
/// transaction so the balance read and the insert commit together.
pub(crate) fn insert_entries(
    organization_id: OrganizationId,
    entries: &[NewLedgerEntry],
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let date = now.date();
    let time = now.time();
    let mut balance = current_balance(organization_id, date, connection)?;
    let mut appended = Vec::with_capacity(entries.len());

    for entry in entries {
        balance = match entry.kind {
            EntryKind::Income => balance + entry.amount,
            EntryKind::Expense => balance - entry.amount,
        };

        connection.execute(
            "INSERT INTO ledger_entry
                (organization_id, description, amount, kind, date, time, balance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                organization_id,
                entry.description,
                entry.amount,
                entry.kind.as_str(),
                date,
                time,
                balance
            ],
        )?;

        appended.push(LedgerEntry {
            id: connection.last_insert_rowid(),
            organization_id,
            description: entry.description.clone(),
            amount: entry.amount,
            kind: entry.kind,
            date,
            time,
            balance,
        });
    }

    Ok(appended)
}

/// List an organization's ledger entries with `period_start <= date <=
/// period_end`, most recent first.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidPeriod] if `period_start` is after `period_end`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn list_entries(
    organization_id: OrganizationId,
    period_start: Date,
    period_end: Date,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    if period_start > period_end {
        return Err(Error::InvalidPeriod);
    }

    let mut stmt = connection.prepare(
        "SELECT id, organization_id, description, amount, kind, date, time, balance
         FROM ledger_entry
         WHERE organization_id = ?1 AND date BETWEEN ?2 AND ?3
         ORDER BY date DESC, time DESC, id DESC",
    )?;

    let entries = stmt
        .query_map(
            params![organization_id, period_start, period_end],
            map_row_to_ledger_entry,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

// ============================================================================
// TESTS
// ============================================================================
