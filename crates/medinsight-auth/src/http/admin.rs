//! `/admin/*` handlers.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
};

use super::AuthState;
use super::types::{
    ChangeRoleRequest, ChangeRoleResponse, DeleteUserParams, MessageResponse,
    ResetPasswordRequest, SetupResponse, UpdateUserRequest, present,
};
use crate::AuthResult;
use crate::error::AuthError;
use crate::orchestrator::AdminUserView;

/// `POST /admin/change-role`
pub async fn change_role_handler(
    State(state): State<AuthState>,
    body: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> AuthResult<Json<ChangeRoleResponse>> {
    let Json(request) = body?;
    let (Some(user_id), Some(new_role)) = (present(request.user_id), present(request.new_role))
    else {
        return Err(AuthError::invalid_request("userId and newRole are required"));
    };

    let role = state.orchestrator.change_role(&user_id, &new_role).await?;
    Ok(Json(ChangeRoleResponse {
        message: "Role updated successfully".to_string(),
        new_role: role,
    }))
}

/// `PUT /admin/reset-password`
pub async fn reset_password_handler(
    State(state): State<AuthState>,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>> {
    let Json(request) = body?;
    let (Some(user_id), Some(new_password)) =
        (present(request.user_id), present(request.new_password))
    else {
        return Err(AuthError::invalid_request(
            "userId and newPassword are required",
        ));
    };

    state
        .orchestrator
        .reset_password(&user_id, &new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// `GET /admin/users`
pub async fn list_users_handler(
    State(state): State<AuthState>,
) -> AuthResult<Json<Vec<AdminUserView>>> {
    Ok(Json(state.orchestrator.list_users().await?))
}

/// `PUT /admin/users`
pub async fn update_user_handler(
    State(state): State<AuthState>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AuthResult<Json<MessageResponse>> {
    let Json(request) = body?;
    let update = request.update();
    let user_id =
        present(request.user_id).ok_or_else(|| AuthError::invalid_request("userId is required"))?;

    state.orchestrator.update_user(&user_id, &update).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// `DELETE /admin/users?userId=`
pub async fn delete_user_handler(
    State(state): State<AuthState>,
    params: Result<Query<DeleteUserParams>, QueryRejection>,
) -> AuthResult<Json<MessageResponse>> {
    let Query(params) = params?;
    let user_id =
        present(params.user_id).ok_or_else(|| AuthError::invalid_request("userId is required"))?;

    state.orchestrator.delete_user(&user_id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// `POST /admin/setup`
///
/// Creates or repairs the public frontend client.
pub async fn setup_handler(State(state): State<AuthState>) -> AuthResult<Json<SetupResponse>> {
    let setup = state.orchestrator.ensure_frontend_client().await?;
    let message = if setup.created {
        format!("Client '{}' created successfully.", setup.client_id)
    } else {
        format!(
            "Client '{}' updated successfully (Public=true, DirectGrants=true).",
            setup.client_id
        )
    };
    Ok(Json(SetupResponse {
        message,
        created: setup.created,
    }))
}
