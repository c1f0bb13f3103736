//! Auth client tests against a local HTTP server standing in for the backend.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;

use room_client::auth::{AuthClient, AuthError};
use room_client::config::ClientConfig;

#[derive(Deserialize)]
struct TokenForm {
    username: String,
    password: String,
}

async fn token_handler(Form(form): Form<TokenForm>) -> impl IntoResponse {
    if form.password == "secret" {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "access_token": format!("tok-{}", form.username),
                "token_type": "bearer",
            })),
        )
            .into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    #[allow(dead_code)]
    password: String,
}

async fn register_handler(Json(body): Json<RegisterBody>) -> impl IntoResponse {
    if body.username == "taken" {
        (StatusCode::BAD_REQUEST, "User already registered").into_response()
    } else {
        (StatusCode::OK, Json(serde_json::json!({"msg": "ok"}))).into_response()
    }
}

async fn spawn_server() -> ClientConfig {
    let app = Router::new()
        .route("/token", post(token_handler))
        .route("/register", post(register_handler));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ClientConfig::for_server(format!("http://{addr}"))
}

#[tokio::test]
async fn login_returns_token() {
    let config = spawn_server().await;
    let token = AuthClient::new(&config)
        .login("alice", "secret")
        .await
        .unwrap();
    assert_eq!(token, "tok-alice");
}

#[tokio::test]
async fn login_with_bad_password_is_invalid_credentials() {
    let config = spawn_server().await;
    let err = AuthClient::new(&config)
        .login("alice", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn register_succeeds_for_new_user() {
    let config = spawn_server().await;
    AuthClient::new(&config)
        .register("carol", "secret")
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let config = spawn_server().await;
    let err = AuthClient::new(&config)
        .register("taken", "secret")
        .await
        .unwrap_err();
    match err {
        AuthError::Rejected(body) => assert!(body.contains("already registered")),
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_auth_service_is_a_transport_error() {
    let config = ClientConfig::for_server("http://127.0.0.1:1");
    let err = AuthClient::new(&config)
        .login("alice", "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Transport(_)));
}
