//! In-process stand-in for the Mindful Web API.
//!
//! Tokens are opaque strings the backend hands out and remembers; a request
//! is authorized when its bearer token is in the accepted set. Tests revoke
//! or never grant tokens to simulate expiry.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use mindful_client::{AppContext, ClientConfig};
use mindful_store::MemoryStorage;

pub const USERNAME: &str = "testuser";
pub const PASSWORD: &str = "password1";
pub const EMAIL: &str = "test@example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub route: String,
    pub bearer: Option<String>,
}

pub struct Backend {
    pub calls: Vec<Call>,
    pub access_tokens: HashSet<String>,
    pub anon_tokens: HashSet<String>,
    pub refresh_tokens: HashSet<String>,
    pub issued: u32,
    pub username: String,
    pub email: String,
    pub fail_logout: bool,
    pub fail_anonymous: bool,
    pub fail_profile: bool,
    /// Usage requests with this `from` date take `slow_delay` to answer.
    pub slow_from: Option<String>,
    pub slow_delay: Duration,
    pub usage_pages: u32,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            access_tokens: HashSet::new(),
            anon_tokens: HashSet::new(),
            refresh_tokens: HashSet::new(),
            issued: 0,
            username: USERNAME.into(),
            email: EMAIL.into(),
            fail_logout: false,
            fail_anonymous: false,
            fail_profile: false,
            slow_from: None,
            slow_delay: Duration::from_millis(300),
            usage_pages: 1,
        }
    }
}

#[derive(Clone)]
pub struct MockServer {
    pub url: String,
    state: Arc<Mutex<Backend>>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(Backend::default()));
        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/verify", post(verify))
            .route("/auth/resend-code", post(resend_code))
            .route("/auth/refresh", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/auth/anonymous", post(anonymous))
            .route("/user/profile", get(profile))
            .route("/user/profile/username", patch(update_username))
            .route("/user/profile/email", patch(update_email))
            .route("/analytics/usage", get(usage))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        self.state.lock().unwrap()
    }

    /// Accept `access` as a valid access token, and `refresh` as its refresh token.
    pub fn grant_access(&self, access: &str, refresh: Option<&str>) {
        let mut backend = self.backend();
        backend.access_tokens.insert(access.into());
        if let Some(r) = refresh {
            backend.refresh_tokens.insert(r.into());
        }
    }

    pub fn grant_anon(&self, token: &str) {
        self.backend().anon_tokens.insert(token.into());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.backend().calls.clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.route).collect()
    }

    pub fn count(&self, route: &str) -> usize {
        self.calls().iter().filter(|c| c.route == route).count()
    }

    /// Client context against this server with in-memory storage.
    pub fn context(&self) -> (AppContext, Arc<MemoryStorage>) {
        self.context_with(|_| {})
    }

    pub fn context_with<F>(&self, tweak: F) -> (AppContext, Arc<MemoryStorage>)
    where
        F: FnOnce(&mut ClientConfig),
    {
        let mut config = ClientConfig::default();
        config.api.base_url = self.url.clone();
        config.api.dev_mode = true;
        tweak(&mut config);
        let storage = Arc::new(MemoryStorage::new());
        let ctx = AppContext::with_storage(config, storage.clone()).unwrap();
        (ctx, storage)
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn record(state: &Mutex<Backend>, route: &str, headers: &HeaderMap) -> Option<String> {
    let token = bearer(headers);
    state.lock().unwrap().calls.push(Call {
        route: route.into(),
        bearer: token.clone(),
    });
    token
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn profile_json(backend: &Backend) -> Response {
    Json(json!({
        "user_id": 7,
        "username": backend.username,
        "email": backend.email,
        "created_at": "2024-01-15T09:30:00Z",
        "timezone": "Europe/Berlin"
    }))
    .into_response()
}

fn issue_pair(backend: &mut Backend) -> (String, String) {
    backend.issued += 1;
    let access = format!("access-{}", backend.issued);
    let refresh = format!("refresh-{}", backend.issued);
    backend.access_tokens.insert(access.clone());
    backend.refresh_tokens.insert(refresh.clone());
    (access, refresh)
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Response {
    record(&state, "POST /auth/login", &headers);
    let mut backend = state.lock().unwrap();
    if body.username != backend.username || body.password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let (access, refresh) = issue_pair(&mut backend);
    Json(json!({ "access_token": access, "refresh_token": refresh })).into_response()
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
}

async fn register(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> Response {
    record(&state, "POST /auth/register", &headers);
    if body.username == "taken" {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "detail": "Username already exists" })),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({ "message": "Verification code sent" }))).into_response()
}

#[derive(Deserialize)]
struct VerifyBody {
    code: String,
}

async fn verify(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Json(body): Json<VerifyBody>,
) -> Response {
    record(&state, "POST /auth/verify", &headers);
    if body.code != "123456" {
        return error(StatusCode::BAD_REQUEST, "Invalid verification code");
    }
    Json(json!({ "message": "verified" })).into_response()
}

async fn resend_code(State(state): State<Arc<Mutex<Backend>>>, headers: HeaderMap) -> Response {
    record(&state, "POST /auth/resend-code", &headers);
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: Option<String>,
}

async fn refresh(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Json(body): Json<RefreshBody>,
) -> Response {
    record(&state, "POST /auth/refresh", &headers);
    let mut backend = state.lock().unwrap();
    let Some(token) = body.refresh_token else {
        return error(StatusCode::UNAUTHORIZED, "Refresh token missing");
    };
    if !backend.refresh_tokens.remove(&token) {
        return error(StatusCode::UNAUTHORIZED, "Refresh token invalid");
    }
    let (access, refresh) = issue_pair(&mut backend);
    Json(json!({ "access_token": access, "refresh_token": refresh })).into_response()
}

async fn logout(State(state): State<Arc<Mutex<Backend>>>, headers: HeaderMap) -> Response {
    let token = record(&state, "POST /auth/logout", &headers);
    let mut backend = state.lock().unwrap();
    if backend.fail_logout {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Logout unavailable");
    }
    if let Some(t) = token {
        backend.access_tokens.remove(&t);
    }
    Json(json!({ "message": "bye" })).into_response()
}

async fn anonymous(State(state): State<Arc<Mutex<Backend>>>, headers: HeaderMap) -> Response {
    record(&state, "POST /auth/anonymous", &headers);
    let mut backend = state.lock().unwrap();
    if backend.fail_anonymous {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Anonymous sign-up disabled");
    }
    backend.issued += 1;
    let token = format!("anon-token-{}", backend.issued);
    let id = format!("anon-id-{}", backend.issued);
    backend.anon_tokens.insert(token.clone());
    Json(json!({ "anon_id": id, "anon_token": token })).into_response()
}

fn authorized_user(backend: &Backend, token: &Option<String>) -> bool {
    token
        .as_ref()
        .is_some_and(|t| backend.access_tokens.contains(t))
}

async fn profile(State(state): State<Arc<Mutex<Backend>>>, headers: HeaderMap) -> Response {
    let token = record(&state, "GET /user/profile", &headers);
    let backend = state.lock().unwrap();
    if !authorized_user(&backend, &token) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    if backend.fail_profile {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Profile service down");
    }
    profile_json(&backend)
}

#[derive(Deserialize)]
struct UsernameBody {
    username: String,
}

async fn update_username(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Json(body): Json<UsernameBody>,
) -> Response {
    let token = record(&state, "PATCH /user/profile/username", &headers);
    let mut backend = state.lock().unwrap();
    if !authorized_user(&backend, &token) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    backend.username = body.username;
    profile_json(&backend)
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

async fn update_email(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Json(body): Json<EmailBody>,
) -> Response {
    let token = record(&state, "PATCH /user/profile/email", &headers);
    let mut backend = state.lock().unwrap();
    if !authorized_user(&backend, &token) {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    backend.email = body.email;
    profile_json(&backend)
}

#[derive(Deserialize)]
struct UsageQuery {
    from: String,
    to: String,
    page: u32,
}

async fn usage(
    State(state): State<Arc<Mutex<Backend>>>,
    headers: HeaderMap,
    Query(query): Query<UsageQuery>,
) -> Response {
    let token = record(&state, "GET /analytics/usage", &headers);
    let (authorized, delay, pages) = {
        let backend = state.lock().unwrap();
        let authorized = token.as_ref().is_some_and(|t| {
            backend.access_tokens.contains(t) || backend.anon_tokens.contains(t)
        });
        let delay = (backend.slow_from.as_deref() == Some(query.from.as_str()))
            .then_some(backend.slow_delay);
        (authorized, delay, backend.usage_pages)
    };
    if !authorized {
        return error(StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    Json(json!({
        "pagination": {
            "page": query.page,
            "per_page": 2,
            "total": pages * 2,
            "total_pages": pages
        },
        "data": [
            { "domain": "github.com", "category": "work", "total_seconds": 600 * query.page },
            { "domain": format!("{}.{}.example", query.from, query.to), "total_seconds": 120 }
        ]
    }))
    .into_response()
}
