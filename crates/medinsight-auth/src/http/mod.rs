//! Axum handlers for the gateway endpoints.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/auth/login` | [`auth::login_handler`] |
//! | POST | `/auth/register` | [`auth::register_handler`] |
//! | POST | `/admin/change-role` | [`admin::change_role_handler`] |
//! | PUT | `/admin/reset-password` | [`admin::reset_password_handler`] |
//! | GET, PUT, DELETE | `/admin/users` | [`admin::list_users_handler`], [`admin::update_user_handler`], [`admin::delete_user_handler`] |
//! | POST | `/admin/setup` | [`admin::setup_handler`] |

pub mod admin;
pub mod auth;
mod error;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::orchestrator::AuthOrchestrator;

/// Shared state of the gateway handlers.
#[derive(Clone, Debug)]
pub struct AuthState {
    /// Flow orchestrator.
    pub orchestrator: Arc<AuthOrchestrator>,
}

impl AuthState {
    /// Creates a new handler state.
    pub fn new(orchestrator: Arc<AuthOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Builds the `/auth` and `/admin` routes.
pub fn auth_routes(state: AuthState) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/admin/change-role", post(admin::change_role_handler))
        .route("/admin/reset-password", put(admin::reset_password_handler))
        .route(
            "/admin/users",
            get(admin::list_users_handler)
                .put(admin::update_user_handler)
                .delete(admin::delete_user_handler),
        )
        .route("/admin/setup", post(admin::setup_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::fake::{FakeProvider, FakeProvisioner, orchestrator};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> (Arc<FakeProvider>, Router) {
        let provider = Arc::new(FakeProvider::with_default_roles());
        let auth = orchestrator(&provider, &Arc::new(FakeProvisioner::default()));
        (provider, auth_routes(AuthState::new(Arc::new(auth))))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (_, app) = app();

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            Some(json!({"username": "u1", "email": "u1@x.com", "password": "p1", "role": "MEDECIN"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "MEDECIN");
        assert!(body.get("warnings").is_none());

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            Some(json!({"username": "u1", "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "MEDECIN");
        assert_eq!(body["user"]["email"], "u1@x.com");
        assert!(body["user"]["id"].as_i64().unwrap() > 0);

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            Some(json!({"username": "u1", "email": "other@x.com", "password": "p1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_register_reports_effective_role() {
        let (provider, app) = app();
        provider
            .state()
            .roles
            .retain(|r| r.name != "ROLE_GESTIONNAIRE");

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            Some(json!({"username": "g1", "email": "g1@x.com", "password": "p1", "role": "MANAGER"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "PATIENT");
        assert_eq!(
            body["warnings"],
            json!(["Role ROLE_GESTIONNAIRE not found, no role assigned"])
        );

        let (status, body) = call(
            &app,
            "POST",
            "/auth/register",
            Some(json!({"username": "a1", "email": "a1@x.com", "password": "p1", "role": "ADMIN"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "PATIENT");
        assert!(body.get("warnings").is_none());
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let (_, app) = app();

        let (status, body) = call(&app, "POST", "/auth/login", Some(json!({"username": "u"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "username and password are required");

        let request = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) =
            call(&app, "POST", "/admin/change-role", Some(json!({"userId": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "userId and newRole are required");

        let (status, _) = call(&app, "DELETE", "/admin/users", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (provider, app) = app();
        provider.seed_user("alice", "secret", &[]);

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            Some(json!({"username": "alice", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"message": "Invalid user credentials"}));
    }

    #[tokio::test]
    async fn test_admin_endpoints() {
        let (provider, app) = app();
        let id = provider.seed_user("bob", "pw", &["ROLE_PATIENT"]);

        let (status, body) = call(
            &app,
            "POST",
            "/admin/change-role",
            Some(json!({"userId": id, "newRole": "MANAGER"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Role updated successfully", "newRole": "MANAGER"}));

        let (status, _) = call(
            &app,
            "POST",
            "/admin/change-role",
            Some(json!({"userId": id, "newRole": "PILOT"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, "GET", "/admin/users", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["role"], "MANAGER");
        assert_eq!(body[0]["status"], "ACTIVE");

        let (status, _) = call(
            &app,
            "PUT",
            "/admin/users",
            Some(json!({"userId": id, "enabled": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            "PUT",
            "/admin/reset-password",
            Some(json!({"userId": id, "newPassword": "new"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "DELETE", &format!("/admin/users?userId={id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");

        let (status, body) = call(&app, "POST", "/admin/setup", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], true);
    }
}
