//! `Json` and `Query` wrappers whose rejections use the API error envelope.
//!
//! axum reports deserialization failures as plain text. These extractors turn a
//! missing or mistyped field into a field-keyed [`AppError::Validation`] and
//! anything else (bad syntax, wrong content type) into [`AppError::BadRequest`].

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, FieldErrors};

const JSON_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const QUERY_PREFIX: &str = "Failed to deserialize query string: ";

pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            field_failure(text.strip_prefix(JSON_PREFIX).unwrap_or(&text))
                .unwrap_or_else(|| AppError::BadRequest(text))
        }
        JsonRejection::JsonSyntaxError(_) => AppError::BadRequest("Malformed JSON body".into()),
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected `Content-Type: application/json`".into())
        }
        other => AppError::BadRequest(other.body_text()),
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    let text = rejection.body_text();
    field_failure(text.strip_prefix(QUERY_PREFIX).unwrap_or(&text))
        .unwrap_or_else(|| AppError::BadRequest(text))
}

/// Reads a serde error of the form `path: message` or `missing field `name``
/// into a single-field validation error. `order_details[0].quantity` is keyed
/// as `order_details.0.quantity`, matching validator's flattened keys.
fn field_failure(detail: &str) -> Option<AppError> {
    let detail = strip_position(detail);
    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => (path_key(path), message),
        _ => (String::new(), detail),
    };

    let (key, text) = if let Some(name) = backticked(message, "missing field `") {
        let key = join(&path, name);
        let text = format!("The {name} field is required.");
        (key, text)
    } else if let Some(name) = backticked(message, "unknown variant `") {
        let leaf = leaf(&path)?;
        (path.clone(), format!("The selected {leaf} `{name}` is invalid."))
    } else {
        let leaf = leaf(&path)?;
        (path.clone(), format!("The {leaf} field has an invalid value."))
    };

    let mut errors = FieldErrors::new();
    errors.insert(key, vec![text]);
    Some(AppError::Validation(errors))
}

fn strip_position(detail: &str) -> &str {
    match detail.rfind(" at line ") {
        Some(at) => &detail[..at],
        None => detail,
    }
}

fn path_key(path: &str) -> String {
    if path == "." {
        return String::new();
    }
    path.replace('[', ".").replace(']', "")
}

fn backticked<'a>(message: &'a str, opener: &str) -> Option<&'a str> {
    let rest = message.strip_prefix(opener)?;
    rest.split('`').next()
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn leaf(path: &str) -> Option<&str> {
    path.rsplit('.')
        .find(|part| !part.is_empty() && part.parse::<usize>().is_err())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(err: AppError) -> (String, String) {
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let (key, messages) = fields.into_iter().next().expect("one field");
        (key, messages[0].clone())
    }

    #[test]
    fn missing_top_level_field_is_keyed_by_name() {
        let err = field_failure("missing field `username` at line 1 column 47").unwrap();
        assert_eq!(
            single(err),
            ("username".into(), "The username field is required.".into())
        );
    }

    #[test]
    fn nested_paths_use_dotted_indices() {
        let err = field_failure(
            "order_details[0].quantity: invalid type: string \"x\", expected i32 at line 1 column 60",
        )
        .unwrap();
        assert_eq!(single(err).0, "order_details.0.quantity");

        let err = field_failure("order_details[1]: missing field `unit_price` at line 1 column 9")
            .unwrap();
        assert_eq!(single(err).0, "order_details.1.unit_price");
    }

    #[test]
    fn query_values_are_keyed_by_parameter() {
        let err = field_failure("per_page: invalid digit found in string").unwrap();
        assert_eq!(single(err).0, "per_page");

        let err = field_failure("filter: unknown variant `year`, expected one of `day`, `week`, `month`")
            .unwrap();
        assert_eq!(single(err).0, "filter");
    }

    #[test]
    fn pathless_type_errors_are_not_field_errors() {
        assert!(field_failure("invalid type: integer `1`, expected a map").is_none());
    }
}
