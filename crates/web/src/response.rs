use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

pub fn json(status: StatusCode, value: &serde_json::Value) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(error) => text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("json encode error: {error}"),
        ),
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    json(status, &serde_json::json!({ "error": message.into() }))
}

pub fn not_found(what: impl std::fmt::Display) -> Response {
    text(StatusCode::NOT_FOUND, format!("not found: {what}"))
}

pub fn missing_param(name: &str) -> Response {
    text(
        StatusCode::BAD_REQUEST,
        format!("missing required parameter {name:?}"),
    )
}
