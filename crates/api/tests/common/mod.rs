#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use urlist_api::auth::github::GithubClient;
use urlist_api::auth::jwt::{JwtConfig, TokenService, TokenSubject};
use urlist_api::config::ServerConfig;
use urlist_api::router::build_app_router;
use urlist_api::state::AppState;
use urlist_core::{ActiveSecret, Secret};
use urlist_db::MemoryNotificationStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        env_file: PathBuf::from(".env"),
        jwt: JwtConfig::default(),
        github: None,
    }
}

/// Everything a test needs to drive the app and inspect its collaborators.
pub struct TestApp {
    pub router: Router,
    pub tokens: TokenService,
    pub store: Arc<MemoryNotificationStore>,
}

impl TestApp {
    /// The full router and middleware stack over an in-memory notification store.
    pub fn new() -> Self {
        Self::with_github(GithubClient::new(None).unwrap())
    }

    /// Like [`TestApp::new`], with a specific GitHub client.
    pub fn with_github(github: GithubClient) -> Self {
        let store = Arc::new(MemoryNotificationStore::new());
        let tokens = TokenService::new(ActiveSecret::new(Secret::generate()), &JwtConfig::default());
        let state = AppState {
            config: Arc::new(test_config()),
            tokens: tokens.clone(),
            notifications: store.clone(),
            github,
        };
        Self {
            router: build_app_router(state).expect("test config is valid"),
            tokens,
            store,
        }
    }

    /// A valid identity token for a test user.
    pub fn token(&self) -> String {
        self.tokens
            .issue_token(&TokenSubject {
                id: "user-1".to_string(),
                email: "operator@example.com".to_string(),
            })
            .unwrap()
    }
}

pub enum Auth<'a> {
    None,
    Cookie(&'a str),
    Bearer(&'a str),
    /// A `Cookie` header sent verbatim.
    CookieHeader(&'a str),
}

/// Send one request through the router.
pub async fn send(app: &Router, method: Method, uri: &str, auth: Auth<'_>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match auth {
        Auth::None => builder,
        Auth::Cookie(token) => builder.header(COOKIE, format!("auth_token={token}")),
        Auth::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        Auth::CookieHeader(value) => builder.header(COOKIE, value),
    };
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, auth: Auth<'_>) -> Response<Body> {
    send(app, Method::GET, uri, auth).await
}

pub async fn post(app: &Router, uri: &str, auth: Auth<'_>) -> Response<Body> {
    send(app, Method::POST, uri, auth).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
