//! Integration test support for the Virtual Herbal Garden.
//!
//! [`FakeGarden`] serves an in-process stand-in for the garden backend and
//! the Firebase Authentication endpoints on one ephemeral port. Every call
//! is recorded, and each operation can be delayed or made to fail. Tests
//! drive the real clients and services against it, or run the whole site
//! with [`TestApp`] and talk to it through `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p herbal-garden-integration-tests
//! ```

use std::collections::{BTreeSet, HashMap};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Multipart, Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use herbal_garden_web::backend::BackendClient;
use herbal_garden_web::config::{BackendConfig, FirebaseConfig, GardenConfig};
use herbal_garden_web::identity::{FirebaseIdentity, SignedInUser};
use herbal_garden_web::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Names of the fake's operations, for [`FakeGarden::delay`] and
/// [`FakeGarden::fail`].
pub mod ops {
    pub const PLANTS: &str = "plants";
    pub const PLANT: &str = "plant";
    pub const BOOKMARKS: &str = "bookmarks";
    pub const CREATE_BOOKMARK: &str = "create_bookmark";
    pub const DELETE_BOOKMARK: &str = "delete_bookmark";
    pub const SYNC_USER: &str = "sync_user";
    pub const CHAT: &str = "chat";
    pub const IDENTIFY: &str = "identify";
    pub const SIGN_IN: &str = "sign_in";
    pub const TOKEN: &str = "token";
}

/// Paths of the fake's endpoints, as recorded.
pub mod paths {
    pub const PLANTS: &str = "/plants/";
    pub const BOOKMARKS: &str = "/bookmarks/";
    pub const USERS_SYNC: &str = "/users/sync";
    pub const CHAT: &str = "/ai/chat";
    pub const IDENTIFY: &str = "/identify-plant/";
    pub const SIGN_IN: &str = "/v1/accounts:signInWithIdp";
    pub const TOKEN: &str = "/v1/token";
}

/// One request received by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Failure {
    status: u16,
    body: String,
}

#[derive(Default)]
struct FakeData {
    plants: Vec<Value>,
    bookmarks: HashMap<String, BTreeSet<i64>>,
    requests: Vec<Recorded>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, Failure>,
    chat_reply: Option<String>,
    prediction: Option<Value>,
    token_lifetime_secs: i64,
    issued_tokens: u64,
}

struct FakeState {
    data: Mutex<FakeData>,
}

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(
        &self,
        method: &'static str,
        path: impl Into<String>,
        query: Option<String>,
        headers: &HeaderMap,
        body: Value,
    ) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.lock().requests.push(Recorded {
            method,
            path: path.into(),
            query,
            authorization,
            body,
        });
    }

    async fn pause(&self, key: &str) {
        let delay = self.lock().delays.get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn failure(&self, op: &str) -> Option<Response> {
        let failure = self.lock().failures.get(op).cloned()?;
        let status =
            StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Some((status, failure.body).into_response())
    }

    fn issue_id_token(&self, uid: &str) -> (String, i64) {
        let mut data = self.lock();
        data.issued_tokens += 1;
        (
            format!("id-{uid}-{}", data.issued_tokens),
            data.token_lifetime_secs,
        )
    }
}

/// A plant record as the backend serves it.
#[must_use]
pub fn plant_json(id: i64, common_name: &str, scientific_name: &str, uses: &[&str]) -> Value {
    json!({
        "plant_id": id,
        "common_name": common_name,
        "scientific_name": scientific_name,
        "description": format!("{common_name} is a medicinal plant."),
        "uses": uses,
        "region": "India",
        "plant_type": "Herb",
        "image_url": format!("https://images.example.com/{id}.jpg"),
    })
}

/// The plants every fake starts with.
#[must_use]
pub fn default_plants() -> Vec<Value> {
    vec![
        plant_json(1, "Aloe Vera", "Aloe barbadensis miller", &["burns", "skin"]),
        plant_json(2, "Neem", "Azadirachta indica", &["skin", "dental"]),
        plant_json(3, "Tulsi", "Ocimum tenuiflorum", &["cough", "fever"]),
        plant_json(5, "Ashwagandha", "Withania somnifera", &["stress"]),
        plant_json(7, "Turmeric", "Curcuma longa", &["inflammation"]),
    ]
}

// =============================================================================
// Backend handlers
// =============================================================================

fn matches_term(plant: &Value, term: &str) -> bool {
    let term = term.to_lowercase();
    let text_matches = ["common_name", "scientific_name"].iter().any(|key| {
        plant[*key]
            .as_str()
            .is_some_and(|s| s.to_lowercase().contains(&term))
    });
    let use_matches = plant["uses"].as_array().is_some_and(|uses| {
        uses.iter()
            .filter_map(Value::as_str)
            .any(|u| u.to_lowercase().contains(&term))
    });
    text_matches || use_matches
}

fn query_param(raw: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

async fn list_plants(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    fake.record("GET", paths::PLANTS, query.clone(), &headers, Value::Null);
    let term = query_param(query.as_deref(), "q").unwrap_or_default();

    fake.pause(ops::PLANTS).await;
    fake.pause(&format!("{}:{term}", ops::PLANTS)).await;
    if let Some(failure) = fake.failure(ops::PLANTS) {
        return failure;
    }

    let plants: Vec<Value> = fake
        .lock()
        .plants
        .iter()
        .filter(|plant| term.is_empty() || matches_term(plant, &term))
        .cloned()
        .collect();
    Json(plants).into_response()
}

async fn get_plant(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    fake.record("GET", format!("/plants/{id}"), None, &headers, Value::Null);
    if let Some(failure) = fake.failure(ops::PLANT) {
        return failure;
    }

    let plant = fake
        .lock()
        .plants
        .iter()
        .find(|plant| plant["plant_id"].as_i64() == Some(id))
        .cloned();
    match plant {
        Some(plant) => Json(plant).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Plant not found."})),
        )
            .into_response(),
    }
}

async fn list_bookmarks(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(user): Path<String>,
) -> Response {
    fake.record(
        "GET",
        format!("/bookmarks/user/{user}"),
        None,
        &headers,
        Value::Null,
    );
    fake.pause(ops::BOOKMARKS).await;
    if let Some(failure) = fake.failure(ops::BOOKMARKS) {
        return failure;
    }

    let records: Vec<Value> = fake
        .lock()
        .bookmarks
        .get(&user)
        .map(|ids| {
            ids.iter()
                .enumerate()
                .map(|(n, id)| {
                    json!({
                        "bookmark_id": n + 1,
                        "user_google_id": user,
                        "plant_id": id,
                        "bookmarked_at": "2026-01-01T00:00:00Z",
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Json(records).into_response()
}

async fn create_bookmark(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", paths::BOOKMARKS, None, &headers, body.clone());
    fake.pause(ops::CREATE_BOOKMARK).await;
    if let Some(failure) = fake.failure(ops::CREATE_BOOKMARK) {
        return failure;
    }

    let (Some(plant_id), Some(user)) = (body["plant_id"].as_i64(), body["user_google_id"].as_str())
    else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [{"msg": "field required"}]})),
        )
            .into_response();
    };

    let mut data = fake.lock();
    if !data
        .plants
        .iter()
        .any(|plant| plant["plant_id"].as_i64() == Some(plant_id))
    {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Plant not found."})),
        )
            .into_response();
    }
    if !data.bookmarks.entry(user.to_string()).or_default().insert(plant_id) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"detail": "Plant already bookmarked by user."})),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "bookmark_id": plant_id,
            "user_google_id": user,
            "plant_id": plant_id,
            "bookmarked_at": "2026-01-01T00:00:00Z",
        })),
    )
        .into_response()
}

async fn delete_bookmark(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path((user, plant_id)): Path<(String, i64)>,
) -> Response {
    fake.record(
        "DELETE",
        format!("/bookmarks/{user}/{plant_id}"),
        None,
        &headers,
        Value::Null,
    );
    fake.pause(ops::DELETE_BOOKMARK).await;
    if let Some(failure) = fake.failure(ops::DELETE_BOOKMARK) {
        return failure;
    }

    let removed = fake
        .lock()
        .bookmarks
        .get_mut(&user)
        .is_some_and(|ids| ids.remove(&plant_id));
    if removed {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Bookmark not found."})),
        )
            .into_response()
    }
}

async fn sync_user(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", paths::USERS_SYNC, None, &headers, body);
    if let Some(failure) = fake.failure(ops::SYNC_USER) {
        return failure;
    }
    Json(json!({"status": "ok"})).into_response()
}

async fn chat(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", paths::CHAT, None, &headers, body.clone());
    fake.pause(ops::CHAT).await;
    if let Some(failure) = fake.failure(ops::CHAT) {
        return failure;
    }

    let message = body["message"].as_str().unwrap_or_default();
    let reply = fake
        .lock()
        .chat_reply
        .clone()
        .unwrap_or_else(|| format!("You asked: {message}"));
    Json(json!({"response": reply})).into_response()
}

async fn identify(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(String::from);
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let len = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        fields.push(json!({
            "name": name,
            "file_name": file_name,
            "content_type": content_type,
            "len": len,
        }));
    }
    fake.record("POST", paths::IDENTIFY, None, &headers, Value::Array(fields));

    fake.pause(ops::IDENTIFY).await;
    if let Some(failure) = fake.failure(ops::IDENTIFY) {
        return failure;
    }

    let prediction = fake.lock().prediction.clone().unwrap_or_else(|| {
        json!({
            "plant_name": "Neem",
            "description": "Neem is a fast-growing tree of the mahogany family.",
            "usage": "Leaves are used for skin conditions.",
            "confidence": 0.87,
        })
    });
    Json(prediction).into_response()
}

// =============================================================================
// Identity provider handlers
// =============================================================================

async fn sign_in(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", paths::SIGN_IN, query, &headers, body.clone());
    if let Some(failure) = fake.failure(ops::SIGN_IN) {
        return failure;
    }

    let credential = query_param(body["postBody"].as_str(), "id_token").unwrap_or_default();
    if credential.is_empty() || credential.starts_with("rejected") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "INVALID_IDP_RESPONSE"}})),
        )
            .into_response();
    }

    let uid = credential;
    let (id_token, lifetime) = fake.issue_id_token(&uid);
    Json(json!({
        "localId": uid,
        "idToken": id_token,
        "refreshToken": format!("refresh-{uid}"),
        "expiresIn": lifetime.to_string(),
        "email": format!("{uid}@example.com"),
        "displayName": format!("Gardener {uid}"),
        "firstName": "Gardener",
        "lastName": uid,
    }))
    .into_response()
}

async fn token(
    State(fake): State<Arc<FakeState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    fake.record("POST", paths::TOKEN, query, &headers, json!(form));
    if let Some(failure) = fake.failure(ops::TOKEN) {
        return failure;
    }

    let Some(uid) = form
        .get("refresh_token")
        .and_then(|token| token.strip_prefix("refresh-"))
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "INVALID_REFRESH_TOKEN"}})),
        )
            .into_response();
    };

    let (id_token, lifetime) = fake.issue_id_token(uid);
    Json(json!({
        "id_token": id_token,
        "refresh_token": format!("refresh-{uid}"),
        "expires_in": lifetime.to_string(),
        "token_type": "Bearer",
        "user_id": uid,
    }))
    .into_response()
}

// =============================================================================
// FakeGarden
// =============================================================================

/// In-process fake backend plus identity provider.
pub struct FakeGarden {
    addr: SocketAddr,
    state: Arc<FakeState>,
    _server: JoinHandle<()>,
}

impl FakeGarden {
    /// Start the fake with [`default_plants`].
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            data: Mutex::new(FakeData {
                plants: default_plants(),
                token_lifetime_secs: 3600,
                ..FakeData::default()
            }),
        });

        let app = Router::new()
            .route(paths::PLANTS, get(list_plants))
            .route("/plants/{id}", get(get_plant))
            .route("/bookmarks/user/{user}", get(list_bookmarks))
            .route(paths::BOOKMARKS, post(create_bookmark))
            .route("/bookmarks/{user}/{plant_id}", delete(delete_bookmark))
            .route(paths::USERS_SYNC, post(sync_user))
            .route(paths::CHAT, post(chat))
            .route(paths::IDENTIFY, post(identify))
            .route(paths::SIGN_IN, post(sign_in))
            .route(paths::TOKEN, post(token))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read fake backend address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    /// Base URL of the fake, with a trailing slash.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Garden configuration pointing every outbound call at the fake.
    ///
    /// # Panics
    ///
    /// Panics if the fake's URL does not parse.
    #[must_use]
    pub fn config(&self) -> GardenConfig {
        let base = url::Url::parse(&self.url()).expect("fake URL parses");
        GardenConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://localhost".to_string(),
            backend: BackendConfig::new(&self.url()).expect("fake URL is a base URL"),
            firebase: FirebaseConfig {
                api_key: SecretString::from("test-firebase-api-key".to_string()),
                google_client_id: "test-client.apps.googleusercontent.com".to_string(),
                auth_url: base.clone(),
                token_url: base,
            },
            max_upload_bytes: 1024 * 1024,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// A backend client for the fake.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn backend(&self) -> BackendClient {
        BackendClient::new(&self.config().backend).expect("Failed to build backend client")
    }

    /// An identity client for the fake.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn identity(&self) -> FirebaseIdentity {
        let config = self.config();
        FirebaseIdentity::new(&config.firebase, &config.base_url)
            .expect("Failed to build identity client")
    }

    /// Sign `uid` in through the fake identity provider.
    ///
    /// # Panics
    ///
    /// Panics if the sign-in fails.
    pub async fn sign_in(&self, uid: &str) -> SignedInUser {
        self.identity()
            .sign_in_with_google(uid)
            .await
            .expect("Fake sign-in failed")
    }

    pub fn set_plants(&self, plants: Vec<Value>) {
        self.state.lock().plants = plants;
    }

    /// Replace `user`'s server-side bookmarks.
    pub fn set_bookmarks(&self, user: &str, plant_ids: &[i64]) {
        self.state
            .lock()
            .bookmarks
            .insert(user.to_string(), plant_ids.iter().copied().collect());
    }

    /// `user`'s server-side bookmarks.
    #[must_use]
    pub fn bookmarks_of(&self, user: &str) -> BTreeSet<i64> {
        self.state
            .lock()
            .bookmarks
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    /// Delay every call to `op`.
    pub fn delay(&self, op: &str, delay: Duration) {
        self.state.lock().delays.insert(op.to_string(), delay);
    }

    /// Delay plant searches for exactly `term`.
    pub fn delay_search(&self, term: &str, delay: Duration) {
        self.delay(&format!("{}:{term}", ops::PLANTS), delay);
    }

    /// Answer every call to `op` with `status` and `body`.
    pub fn fail(&self, op: &str, status: u16, body: &str) {
        self.state.lock().failures.insert(
            op.to_string(),
            Failure {
                status,
                body: body.to_string(),
            },
        );
    }

    /// Stop failing `op`.
    pub fn recover(&self, op: &str) {
        self.state.lock().failures.remove(op);
    }

    pub fn set_chat_reply(&self, reply: &str) {
        self.state.lock().chat_reply = Some(reply.to_string());
    }

    pub fn set_prediction(&self, prediction: Value) {
        self.state.lock().prediction = Some(prediction);
    }

    /// Lifetime of ID tokens issued from now on.
    pub fn set_token_lifetime(&self, secs: i64) {
        self.state.lock().token_lifetime_secs = secs;
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().requests.clone()
    }

    /// Requests whose path starts with `prefix`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// The full site running against a [`FakeGarden`].
pub struct TestApp {
    pub url: String,
    pub client: reqwest::Client,
    pub jar: Arc<reqwest::cookie::Jar>,
    pub state: AppState,
    _server: JoinHandle<()>,
}

impl TestApp {
    /// Serve the site on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the state, listener or HTTP client cannot be built.
    pub async fn spawn(fake: &FakeGarden) -> Self {
        let state = AppState::new(fake.config()).expect("Failed to build app state");
        let static_root = FsPath::new(env!("CARGO_MANIFEST_DIR")).join("../web");
        let router = herbal_garden_web::build_router(state.clone(), &static_root);

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("Failed to bind test app");
        let addr = listener.local_addr().expect("Failed to read test app address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        let jar = Arc::new(reqwest::cookie::Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            url: format!("http://{addr}"),
            client,
            jar,
            state,
            _server: server,
        }
    }

    /// Set the double-submit cookie the sign-in callback checks.
    ///
    /// # Panics
    ///
    /// Panics if the app URL does not parse.
    pub fn set_csrf_cookie(&self, token: &str) {
        let url = reqwest::Url::parse(&self.url).expect("app URL parses");
        self.jar
            .add_cookie_str(&format!("g_csrf_token={token}; Path=/auth"), &url);
    }

    /// GET `path`, following redirects.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, String) {
        let response = self
            .client
            .get(format!("{}{path}", self.url))
            .send()
            .await
            .expect("GET failed");
        let status = response.status();
        (status, response.text().await.expect("Failed to read body"))
    }

    /// POST a form to `path`, following redirects.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> (reqwest::StatusCode, String) {
        let response = self
            .client
            .post(format!("{}{path}", self.url))
            .form(form)
            .send()
            .await
            .expect("POST failed");
        let status = response.status();
        (status, response.text().await.expect("Failed to read body"))
    }

    /// Sign `uid` in through the site's Google callback.
    pub async fn sign_in(&self, uid: &str) -> (reqwest::StatusCode, String) {
        self.set_csrf_cookie("csrf-test-token");
        self.post_form(
            "/auth/google",
            &[
                ("credential", uid),
                ("g_csrf_token", "csrf-test-token"),
                ("return_to", "/plants"),
            ],
        )
        .await
    }
}
