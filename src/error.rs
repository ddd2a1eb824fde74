//! Defines the app level error type and its conversion to JSON API responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::database_id::MemberId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used as a settlement title.
    #[error("settlement title cannot be empty")]
    EmptyTitle,

    /// A settlement was created without any participants.
    ///
    /// A settlement collects money owed by a concrete set of members, so an
    /// empty participant list can never become eligible for closing.
    #[error("a settlement must have at least one participant")]
    NoParticipants,

    /// A negative amount was used for an obligation or ledger entry.
    ///
    /// Amounts are minor currency units owed or moved, and are always zero or
    /// positive. Only running balances may go negative.
    #[error("amounts must be zero or positive")]
    NegativeAmount,

    /// The same member was listed more than once in one settlement.
    #[error("a member can only appear once per settlement")]
    DuplicateParticipant,

    /// The member ID used for an obligation did not match a known member.
    #[error("the member ID does not refer to a known member")]
    UnknownMember(Option<MemberId>),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The member has no obligation in the settlement.
    ///
    /// Distinct from an obligation of zero: "nothing owed" is a participant
    /// with amount 0, while this member is not involved at all. Clients must
    /// not render a zero amount for this case.
    #[error("the member is not a participant in this settlement")]
    NotAParticipant,

    /// A ledger-posting close was requested while at least one obligation is
    /// not marked as paid.
    #[error("the settlement still has obligations that are not marked as paid")]
    SettlementNotPaid,

    /// A ledger listing was requested with a period start after the period end.
    #[error("the period start must be no later than the period end")]
    InvalidPeriod,

    /// The database stayed busy for the whole bounded retry budget.
    ///
    /// The operation was rolled back and left no partial writes. The client
    /// should retry the whole operation.
    #[error("the database is busy, the operation was rolled back")]
    Conflict,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::UnknownMember(None)
            }
            // Code 275 occurs when a CHECK constraint failed. The only CHECK
            // constraints in the schema reject negative amounts.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK =>
            {
                Error::NegativeAmount
            }
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("obligation") =>
            {
                Error::DuplicateParticipant
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                Error::Conflict
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            Error::EmptyTitle
            | Error::NoParticipants
            | Error::NegativeAmount
            | Error::DuplicateParticipant
            | Error::InvalidPeriod => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::UnknownMember(member_id) => (
                StatusCode::BAD_REQUEST,
                match member_id {
                    Some(member_id) => format!("no member with the ID {member_id} exists"),
                    None => self.to_string(),
                },
            ),
            Error::NotFound | Error::NotAParticipant => (StatusCode::NOT_FOUND, self.to_string()),
            Error::SettlementNotPaid => (StatusCode::CONFLICT, self.to_string()),
            Error::Conflict => (
                StatusCode::CONFLICT,
                format!("{self}, no changes were saved. Please retry the operation."),
            ),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::Error;

    #[test]
    fn maps_no_rows_to_not_found() {
        let got: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(got, Error::NotFound);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        for error in [
            Error::EmptyTitle,
            Error::NoParticipants,
            Error::NegativeAmount,
            Error::DuplicateParticipant,
            Error::InvalidPeriod,
            Error::UnknownMember(Some(42)),
        ] {
            let response = error.into_response();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn not_a_participant_is_distinct_from_not_found() {
        assert_ne!(
            Error::NotAParticipant.to_string(),
            Error::NotFound.to_string()
        );
        assert_eq!(
            Error::NotAParticipant.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unpaid_settlement_is_a_conflict() {
        let response = Error::SettlementNotPaid.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
