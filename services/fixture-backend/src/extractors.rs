use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRef, FromRequest, FromRequestParts, Query, Request,
    },
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use shared::errors::ServiceError;

use crate::errors::AppError;
use crate::state::AppState;

/// JSON body extractor whose failures use the standard error envelope
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Query-string extractor whose failures use the standard error envelope
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ValidatedQuery(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let detail = rejection.body_text();
    tracing::warn!(error = %detail, "Request body rejected");

    let message = match detail.split("missing field `").nth(1) {
        Some(rest) => format!(
            "Missing required field: {}",
            rest.split('`').next().unwrap_or("unknown")
        ),
        None => "Invalid request body".to_string(),
    };
    ServiceError::invalid_input(message).with_context(detail).into()
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    let detail = rejection.body_text();
    tracing::warn!(error = %detail, "Query string rejected");
    ServiceError::invalid_input("Invalid query string")
        .with_context(detail)
        .into()
}

/// Requires `Authorization: Bearer <API_TOKEN>`
pub struct BearerAuth;

#[async_trait]
impl<S> FromRequestParts<S> for BearerAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match token {
            Some(token) if token == state.config.api_token => Ok(BearerAuth),
            _ => Err(ServiceError::unauthorized().into()),
        }
    }
}
