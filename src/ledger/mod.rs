//! The append-only, balance-carrying ledger for each organization.

mod balance_endpoint;
mod core;
mod list_endpoint;

pub use balance_endpoint::{BalanceResponse, current_balance_endpoint};
pub(crate) use self::core::insert_entries;
pub use self::core::{
    EntryKind, LedgerEntry, NewLedgerEntry, append_entries, create_ledger_entry_table,
    current_balance, list_entries, map_row_to_ledger_entry,
};
pub use list_endpoint::{LedgerPeriodQuery, list_ledger_endpoint};
