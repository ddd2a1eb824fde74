//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The opaque ID of an organization (club), issued by the directory service.
pub type OrganizationId = i64;

/// The opaque ID of a member, issued by the directory service.
pub type MemberId = i64;

/// The ID of a settlement row.
pub type SettlementId = i64;

/// The ID of an obligation row.
pub type ObligationId = i64;

/// The ID of a ledger entry row.
pub type LedgerEntryId = i64;
