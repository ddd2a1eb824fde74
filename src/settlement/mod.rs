//! Dues settlements: collection requests, per-member obligations, and the
//! closer that reconciles a fully-paid settlement into the ledger.

mod close;
mod close_endpoint;
mod core;
mod create_endpoint;
mod detail_endpoint;
mod discard_endpoint;
mod list_endpoint;
mod status_endpoint;
mod viewer_endpoint;

pub use close::{close_with_ledger, close_without_ledger};
pub use close_endpoint::close_settlement_endpoint;
pub use self::core::{
    NewObligation, Obligation, ObligationStatus, Settlement, SettlementDetail,
    create_obligation_table, create_settlement, create_settlement_table, get_obligation,
    get_settlement, list_settlements, map_row_to_obligation, map_row_to_settlement,
    set_obligation_status, viewer_obligation,
};
pub use create_endpoint::{CreateSettlementRequest, create_settlement_endpoint};
pub use detail_endpoint::get_settlement_endpoint;
pub use discard_endpoint::discard_settlement_endpoint;
pub use list_endpoint::{ListSettlementsQuery, list_settlements_endpoint};
pub use status_endpoint::{SetStatusRequest, set_obligation_status_endpoint};
pub use viewer_endpoint::viewer_obligation_endpoint;
