//! JSON bodies for client errors.
//!
//! Validation failures use the field map shape {"field": ["message", ...]}.

use actix_web::{error, Error, HttpResponse};
use serde_json::json;
use validator::ValidationErrors;

/// A 400 with a single field message.
pub fn validation_error(field: &str, message: &str) -> Error {
    let mut body = serde_json::Map::new();
    body.insert(field.to_owned(), json!([message]));
    error::InternalError::from_response(
        format!("{}: {}", field, message),
        HttpResponse::BadRequest().json(serde_json::Value::Object(body)),
    )
    .into()
}

/// A 400 carrying every field failure from a `validator` run.
pub fn validation_errors(errors: &ValidationErrors) -> Error {
    let mut fields = serde_json::Map::new();
    for (field, errs) in errors.field_errors() {
        let messages: Vec<serde_json::Value> = errs
            .iter()
            .map(|e| match &e.message {
                Some(message) => json!(message),
                None => json!(e.code),
            })
            .collect();
        fields.insert((*field).to_owned(), serde_json::Value::Array(messages));
    }
    error::InternalError::from_response(
        "validation failed".to_owned(),
        HttpResponse::BadRequest().json(serde_json::Value::Object(fields)),
    )
    .into()
}
