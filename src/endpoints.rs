//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}',
//! use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for signing in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for checking that a bearer token is still valid.
pub const VERIFY: &str = "/api/auth/verify";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for the statistics snapshot over the caller's expenses.
pub const EXPENSE_SUMMARY: &str = "/api/expenses/stats/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace. For
/// example, in the endpoint path '/api/expenses/{expense_id}',
/// '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it
// will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::VERIFY);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES);
        assert_endpoint_is_valid_uri(endpoints::EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::EXPENSE_SUMMARY);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::EXPENSE, 1);

        assert_eq!(formatted_path, "/api/expenses/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }
}
