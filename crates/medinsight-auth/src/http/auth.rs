//! `/auth/login` and `/auth/register` handlers.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use super::AuthState;
use super::types::{LoginRequest, RegisterRequest, RegisterResponse, present};
use crate::AuthResult;
use crate::error::AuthError;
use crate::orchestrator::SessionPayload;

/// `POST /auth/login`
///
/// Returns the session on success. Refused credentials keep the provider's
/// status and description.
pub async fn login_handler(
    State(state): State<AuthState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Json<SessionPayload>> {
    let Json(request) = body?;
    let (Some(username), Some(password)) = (
        present(request.username),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AuthError::invalid_request("username and password are required"));
    };

    let outcome = state.orchestrator.login(&username, &password).await?;
    Ok(Json(outcome.into_value()))
}

/// `POST /auth/register`
///
/// Answers 201 once the identity exists. Role assignment or profile failures
/// are listed under `warnings`.
pub async fn register_handler(
    State(state): State<AuthState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(request) = body?;
    let registration = request.into_registration().ok_or_else(|| {
        AuthError::invalid_request("username, email and password are required")
    })?;

    let (user, degradations) = state.orchestrator.register(&registration).await?.into_parts();
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse::new(user, &degradations)),
    ))
}
