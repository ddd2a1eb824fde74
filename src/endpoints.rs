//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/settlements/{settlement_id}',
//! use [format_endpoint].

/// The route to create a settlement.
pub const SETTLEMENTS: &str = "/api/settlements";
/// The route to fetch or discard a single settlement.
pub const SETTLEMENT: &str = "/api/settlements/{settlement_id}";
/// The route to close a settlement into the ledger.
pub const SETTLEMENT_CLOSE: &str = "/api/settlements/{settlement_id}/close";
/// The route for a member to read their own obligation in a settlement.
pub const VIEWER_OBLIGATION: &str = "/api/settlements/{settlement_id}/obligations/{member_id}";
/// The route to set an obligation's payment status.
pub const OBLIGATION_STATUS: &str = "/api/obligations/{obligation_id}/status";
/// The route to list an organization's settlements.
pub const ORGANIZATION_SETTLEMENTS: &str = "/api/organizations/{organization_id}/settlements";
/// The route to list an organization's ledger entries over a period.
pub const ORGANIZATION_LEDGER: &str = "/api/organizations/{organization_id}/ledger";
/// The route to read an organization's current balance.
pub const ORGANIZATION_BALANCE: &str = "/api/organizations/{organization_id}/balance";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/settlements/{settlement_id}',
/// '{settlement_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, char) in endpoint_path.chars().enumerate() {
        match char {
            '{' => param_start = Some(i),
            '}' => {
                param_end = Some(i);
                break;
            }
            _ => {}
        }
    }

    match (param_start, param_end) {
        (Some(start), Some(end)) => {
            let mut result = String::new();
            result.push_str(&endpoint_path[..start]);
            result.push_str(&id.to_string());
            result.push_str(&endpoint_path[end + 1..]);
            result
        }
        _ => endpoint_path.to_owned(),
    }
}
