//! Application error type and its JSON envelope.
//!
//! Every rejection produced by the request pipeline is an [`AppError`]. The
//! [`ErrorKind`] decides the status code and the machine-readable `code`
//! field, so clients can tell an expired token apart from a missing one
//! without parsing messages.
//!
//! ```json
//! {"error": {"code": "invalid_authentication_token", "message": "invalid or missing authentication token"}}
//! ```

use std::collections::BTreeMap;

use anyhow::{Error, anyhow};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Machine-distinguishable reason for a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `Authorization` header present but not `Bearer <token>`.
    MalformedCredential,
    /// Bearer token unknown, expired or issued for another scope.
    InvalidOrExpiredToken,
    /// Anonymous request on a route that needs a user.
    Unauthenticated,
    /// Wrong email or password on login.
    InvalidCredentials,
    NotActivated,
    Forbidden,
    RateLimited,
    /// The persistence collaborator timed out or failed to answer.
    UpstreamUnavailable,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    EditConflict,
    FailedValidation,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::MalformedCredential
            | ErrorKind::InvalidOrExpiredToken
            | ErrorKind::Unauthenticated
            | ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::NotActivated | ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::EditConflict => StatusCode::CONFLICT,
            ErrorKind::FailedValidation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MalformedCredential => "invalid_authorization_header",
            ErrorKind::InvalidOrExpiredToken => "invalid_authentication_token",
            ErrorKind::Unauthenticated => "authentication_required",
            ErrorKind::InvalidCredentials => "invalid_credentials",
            ErrorKind::NotActivated => "inactive_account",
            ErrorKind::Forbidden => "not_permitted",
            ErrorKind::RateLimited => "rate_limit_exceeded",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::EditConflict => "edit_conflict",
            ErrorKind::FailedValidation => "failed_validation",
            ErrorKind::Internal => "internal_error",
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub error: Error,
    /// Per-field messages for [`ErrorKind::FailedValidation`].
    pub fields: Option<BTreeMap<String, String>>,
    /// Seconds until the client may retry, sent as `Retry-After`.
    pub retry_after: Option<u64>,
}

impl AppError {
    pub fn new<E>(kind: ErrorKind, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind,
            error: err.into(),
            fields: None,
            retry_after: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Internal, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::NotFound, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::BadRequest, err)
    }

    pub fn edit_conflict() -> Self {
        Self::new(
            ErrorKind::EditConflict,
            anyhow!("unable to update the record due to an edit conflict, please try again"),
        )
    }

    pub fn upstream_unavailable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::UpstreamUnavailable, err)
    }

    pub fn malformed_credential() -> Self {
        Self::new(
            ErrorKind::MalformedCredential,
            anyhow!("malformed authorization header, expected 'Bearer <token>'"),
        )
    }

    pub fn invalid_token() -> Self {
        Self::new(
            ErrorKind::InvalidOrExpiredToken,
            anyhow!("invalid or missing authentication token"),
        )
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            ErrorKind::Unauthenticated,
            anyhow!("you must be authenticated to access this resource"),
        )
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            ErrorKind::InvalidCredentials,
            anyhow!("invalid authentication credentials"),
        )
    }

    pub fn not_activated() -> Self {
        Self::new(
            ErrorKind::NotActivated,
            anyhow!("your user account must be activated to access this resource"),
        )
    }

    pub fn forbidden() -> Self {
        Self::new(
            ErrorKind::Forbidden,
            anyhow!("your user account doesn't have the necessary permissions to access this resource"),
        )
    }

    pub fn rate_limited(retry_after: Option<u64>) -> Self {
        Self {
            retry_after,
            ..Self::new(ErrorKind::RateLimited, anyhow!("rate limit exceeded"))
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed,
            anyhow!("the method is not supported for this resource"),
        )
    }

    /// Validation failure with messages keyed by field name.
    pub fn failed_validation<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            fields: Some(fields),
            ..Self::new(ErrorKind::FailedValidation, anyhow!("request failed validation"))
        }
    }

    /// Text sent to the client. Server-side failures never echo their cause.
    fn public_message(&self) -> String {
        match self.kind {
            ErrorKind::Internal => {
                "the server encountered a problem and could not process your request".to_string()
            }
            ErrorKind::UpstreamUnavailable => {
                "the server is temporarily unable to process your request".to_string()
            }
            _ => self.error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.kind.code(), error = ?self.error, "request failed");
        }

        let mut error = json!({
            "code": self.kind.code(),
            "message": self.public_message(),
        });
        if let Some(fields) = &self.fields {
            error["fields"] = json!(fields);
        }

        let mut response = (status, Json(json!({ "error": error }))).into_response();

        if matches!(
            self.kind,
            ErrorKind::MalformedCredential | ErrorKind::InvalidOrExpiredToken
        ) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Some(seconds) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::MalformedCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::InvalidOrExpiredToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::NotActivated.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ErrorKind::UpstreamUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_envelope_carries_code() {
        let response = AppError::not_activated().into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "inactive_account");
        assert!(body["error"]["message"].as_str().unwrap().contains("activated"));
    }

    #[tokio::test]
    async fn test_invalid_token_sets_www_authenticate() {
        let response = AppError::invalid_token().into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::rate_limited(Some(2)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "2");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = AppError::internal(anyhow!("connection refused on 10.0.0.3")).into_response();
        let body = body_json(response).await;
        let message = body["error"]["message"].as_str().unwrap();
        assert!(!message.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_failed_validation_lists_fields() {
        let response =
            AppError::failed_validation([("email", "must be provided")]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["fields"]["email"], "must be provided");
    }
}
