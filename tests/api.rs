/*
 * Router 全体の配線テスト (DB 無しで通る範囲)
 * - 認証必須ルートが 401 を返すこと (middleware が handler より先に落とす)
 * - 公開 ID の decode 失敗が 400 になること
 * - /health と request-id の配線
 *
 * DB を触る経路 (200 系の CRUD) は services::authz / repos 側の unit test と
 * 実環境で検証する。pool は connect_lazy なので接続は発生しない。
 */
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use blogpost_api::{
    app,
    config::{AppEnv, Config},
    services::{auth::AuthService, id_codec::IdCodec},
    state::AppState,
};

// RFC 8410 の例示鍵。署名検証は必ず失敗する (= トークンはすべて無効) が、
// このテストで欲しいのはまさにその挙動。
const TEST_ED25519_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE=
-----END PUBLIC KEY-----
";

fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().expect("test addr"),
        database_url: "postgres://postgres@localhost:5432/blogpost_test".to_string(),
        db_max_connections: 1,
        app_env: AppEnv::Development,
        cors_allowed_origins: vec![],
        request_body_limit_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
        sqids_min_length: 10,
        sqids_alphabet: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
            .to_string(),
        auth_issuer: "https://auth.example.test".to_string(),
        auth_audience: "blogpost-api".to_string(),
        access_token_leeway_seconds: 0,
        access_jwt_public_key_pem: TEST_ED25519_PUBLIC_KEY_PEM.to_string(),
    }
}

fn test_router() -> Router {
    let config = test_config();

    // 接続は遅延。このテストの経路では DB に触らない。
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    let id_codec =
        IdCodec::new(config.sqids_min_length, &config.sqids_alphabet).expect("id codec");

    let auth = AuthService::new(
        &config.access_jwt_public_key_pem,
        &config.auth_issuer,
        &config.auth_audience,
        config.access_token_leeway_seconds,
    )
    .expect("auth service");

    let state = AppState::new(db, id_codec, Arc::new(auth));
    app::build_router(state, &config)
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn health_is_public() {
    let response = test_router().oneshot(request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let response = test_router().oneshot(request("GET", "/health")).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn mutating_endpoints_require_a_token() {
    let cases = [
        ("POST", "/blogpost"),
        ("PUT", "/blogpost/abcdefghij"),
        ("DELETE", "/blogpost/abcdefghij"),
        ("PUT", "/blogpost/admin/abcdefghij"),
        ("DELETE", "/blogpost/admin/abcdefghij"),
        ("GET", "/roles"),
    ];

    for (method, uri) in cases {
        let response = test_router().oneshot(request(method, uri)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} must be rejected without a token"
        );
    }
}

#[tokio::test]
async fn invalid_bearer_token_is_unauthorized() {
    let req = Request::builder()
        .method("DELETE")
        .uri("/blogpost/abcdefghij")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let response = test_router().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_authorization_is_unauthorized() {
    let req = Request::builder()
        .method("GET")
        .uri("/roles")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();

    let response = test_router().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn undecodable_public_id_is_bad_request() {
    // '-' は sqids alphabet に含まれないので decode できない
    let response = test_router()
        .oneshot(request("GET", "/blogpost/not-a-valid-id"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], "INVALID_PUBLIC_ID");
}
