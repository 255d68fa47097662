//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState, auth, endpoints,
    expense::{
        create_expense, delete_expense, get_expense, get_expense_summary, get_expenses,
        update_expense,
    },
};

/// Return a router with all the app's routes.
///
/// The expense routes authenticate via the [crate::auth::Claims] extractor,
/// so an invalid or missing bearer token is rejected before a handler runs.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(auth::register))
        .route(endpoints::LOG_IN, post(auth::log_in))
        .route(endpoints::VERIFY, get(auth::verify))
        .route(
            endpoints::EXPENSES,
            post(create_expense).get(get_expenses),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route(endpoints::EXPENSE_SUMMARY, get(get_expense_summary))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON response for requests that match no route.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, endpoints, routing::build_router};

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(connection, "foobar").expect("Could not create app state.");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let server = get_test_server();

        let response = server.get("/api/definitely/not/a/route").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["success"], json!(false));
    }

    #[tokio::test]
    async fn expense_routes_require_a_token() {
        let server = get_test_server();

        server
            .get(endpoints::EXPENSES)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_create_and_list_round_trip() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Test User",
                "email": "test@example.com",
                "password": "averysafeandsecurepassword",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let token = response.json::<Value>()["token"].as_str().unwrap().to_owned();

        server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({
                "title": "Lunch",
                "amount": 12.5,
                "date": "2024-06-01",
                "category": "Food",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["expenses"].as_array().unwrap().len(), 1);
        assert_eq!(body["pagination"]["totalExpenses"], json!(1));
    }
}
