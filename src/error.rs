use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// Field name to the list of messages that rejected it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        collect_validation_errors(&errors, None, &mut fields);
        AppError::Validation(fields)
    }
}

fn collect_validation_errors(
    errors: &validator::ValidationErrors,
    prefix: Option<&str>,
    out: &mut FieldErrors,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(path).or_default();
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {field} field is invalid ({}).", err.code));
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validation_errors(nested, Some(&path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let item_path = format!("{path}.{index}");
                    collect_validation_errors(nested, Some(&item_path), out);
                }
            }
        }
    }
}

/// Merges service-level checks into one 422 response; returns `Ok` when none failed.
pub fn ensure_no_field_errors(errors: FieldErrors) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Maps a unique-index violation through `on_duplicate`, which receives the
/// database message naming the constraint. Other errors stay ORM errors.
pub fn on_unique_violation(err: DbErr, on_duplicate: impl FnOnce(&str) -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => on_duplicate(&message),
        _ => AppError::OrmError(err),
    }
}

/// 422 on whichever of `fields` the violated constraint names, defaulting to the first.
pub fn duplicate_field(message: &str, fields: &[&str]) -> AppError {
    let field = fields
        .iter()
        .find(|field| message.contains(&format!("_{field}_")))
        .or_else(|| fields.first())
        .copied()
        .unwrap_or("id");
    AppError::invalid(field, format!("The {field} has already been taken."))
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DbError(err) => {
                tracing::error!(error = %err, "database error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::OrmError(err) => {
                tracing::error!(error = %err, "orm error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = self.to_string();
        let errors = match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        };

        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData {
                error: message,
                errors,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn validator_errors_become_field_map() {
        let sample = Sample {
            name: "ab".into(),
            email: "nope".into(),
        };
        let err: AppError = sample.validate().unwrap_err().into();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields["name"], vec!["too short".to_string()]);
        assert_eq!(fields["email"].len(), 1);
    }

    #[test]
    fn statuses_match_taxonomy() {
        let cases = [
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::invalid("title", "taken"), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn only_unique_violations_are_remapped() {
        let err = on_unique_violation(DbErr::Custom("boom".into()), |_| AppError::Forbidden);
        assert!(matches!(err, AppError::OrmError(_)));
    }

    #[test]
    fn duplicate_field_reads_the_constraint_name() {
        let message = r#"duplicate key value violates unique constraint "customers_email_key""#;
        let AppError::Validation(fields) = duplicate_field(message, &["username", "email"]) else {
            panic!("expected validation error");
        };
        assert_eq!(fields["email"], vec!["The email has already been taken.".to_string()]);

        let AppError::Validation(fields) = duplicate_field("unknown", &["title"]) else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("title"));
    }
}
