//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and logged in full at the `debug` level. Password fields in JSON request
/// bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    if headers.headers.get(CONTENT_TYPE) == Some(&"application/json".parse().unwrap()) {
        let display_text = redact_field(&body_text, "password");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace `field_name` in a JSON object body with asterisks.
///
/// Anything that does not parse as a JSON object is returned unchanged.
fn redact_field(body_text: &str, field_name: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<serde_json::Value>(body_text) else {
        return body_text.to_owned();
    };

    if let Some(object) = value.as_object_mut()
        && object.contains_key(field_name)
    {
        object.insert(
            field_name.to_owned(),
            serde_json::Value::String("********".to_owned()),
        );

        return value.to_string();
    }

    body_text.to_owned()
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The longest prefix of `body` that fits in `limit` bytes and ends on a
/// character boundary, so multibyte text never splits mid-character.
fn truncate_on_char_boundary(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }

    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate_on_char_boundary(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate_on_char_boundary(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}


#[cfg(test)]
mod truncate_on_char_boundary_tests {
    use super::truncate_on_char_boundary;

    #[test]
    fn short_body_is_unchanged() {
        assert_eq!(truncate_on_char_boundary("hello", 64), "hello");
    }

    #[test]
    fn truncates_at_exact_limit_for_ascii() {
        let body = "a".repeat(100);

        assert_eq!(truncate_on_char_boundary(&body, 64).len(), 64);
    }

    #[test]
    fn backs_off_when_limit_splits_a_character() {
        // 63 ASCII bytes, then a two-byte character straddling index 64.
        let body = format!("{}é tail", "a".repeat(63));

        let truncated = truncate_on_char_boundary(&body, 64);

        assert_eq!(truncated, "a".repeat(63));
    }
}
