//! In-process stand-in for the webhook backend.
//!
//! The server keeps its data in a [`MemoryWebhookApi`] and translates between
//! that and the backend's wire conventions: numeric ids, upper-case enum
//! names, zone-less timestamps and JSON-encoded `headers`/`payload` strings.
//! Every route requires the HTTP Basic credentials [`FAKE_USERNAME`] /
//! [`FAKE_PASSWORD`].
//!
//! Status codes follow the real service:
//!
//! - `201` for created events and subscriptions, `204` for deletions
//! - `404` with an empty body for unknown ids
//! - `400` with an empty body for every failed retry, unknown id included
//! - `400` with a `{"message": ...}` body for rejected input
//! - `401` for a missing or wrong `Authorization` header and failed logins

use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock, task::JoinHandle};
use tracing::{debug, info};
use webhook_client::models::{AdminRegistration, EventStatus, PageQuery, WebhookEvent};
use webhook_client::wire::{
    AdminResource, EventResource, LoginRequest, PageResource, RegisterRequest, StatsResource,
    SubscriptionResource,
};
use webhook_client::{
    BasicCredentials, ClientConfig, Error, MemoryWebhookApi, WebhookApi, WebhookClient,
};

/// Username the fake backend accepts.
pub const FAKE_USERNAME: &str = "admin";

/// Password the fake backend accepts.
pub const FAKE_PASSWORD: &str = "password";

#[derive(Clone)]
struct BackendState {
    api: Arc<MemoryWebhookApi>,
    expected_authorization: Arc<str>,
    stats_body: Arc<RwLock<Option<Value>>>,
}

/// Error returned by handlers, rendered the way the backend renders it.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid email or password"})),
            )
                .into_response(),
            Error::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({"message": message}))).into_response()
            }
            Error::Request { status, message } => {
                let status = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(json!({"message": message}))).into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn event_resources(events: &[WebhookEvent]) -> ApiResult<Json<Vec<EventResource>>> {
    let resources = events
        .iter()
        .map(EventResource::from_event)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(resources))
}

fn subscription_resources(
    subscriptions: &[webhook_client::models::WebhookSubscription],
) -> Json<Vec<SubscriptionResource>> {
    Json(
        subscriptions
            .iter()
            .map(SubscriptionResource::from_subscription)
            .collect(),
    )
}

async fn require_basic_auth(
    State(state): State<BackendState>,
    request: Request,
    next: Next,
) -> Response {
    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if supplied != Some(state.expected_authorization.as_ref()) {
        debug!(path = %request.uri().path(), "Rejected request without valid credentials");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )
            .into_response();
    }
    next.run(request).await
}

async fn list_events(State(state): State<BackendState>) -> ApiResult<Json<Vec<EventResource>>> {
    event_resources(&state.api.get_events().await?)
}

async fn list_failed_events(
    State(state): State<BackendState>,
) -> ApiResult<Json<Vec<EventResource>>> {
    event_resources(&state.api.get_failed_events().await?)
}

#[derive(Deserialize)]
struct PageParams {
    page: Option<u32>,
    size: Option<u32>,
    status: Option<String>,
    search: Option<String>,
}

async fn events_page(
    State(state): State<BackendState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PageResource>> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => Some(s.parse::<EventStatus>()?),
    };
    let defaults = PageQuery::default();
    let query = PageQuery {
        page: params.page.unwrap_or(defaults.page),
        size: params.size.unwrap_or(defaults.size),
        status,
        search: params.search,
    };
    let page = state.api.get_events_page(&query).await?;
    Ok(Json(PageResource::from_page(&page)?))
}

async fn publish_event(
    State(state): State<BackendState>,
    Json(body): Json<EventResource>,
) -> ApiResult<(StatusCode, Json<EventResource>)> {
    let draft = body.into_draft()?;
    let event = state.api.publish_event(&draft).await?;
    Ok((StatusCode::CREATED, Json(EventResource::from_event(&event)?)))
}

async fn get_event(
    State(state): State<BackendState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EventResource>> {
    let event = state.api.get_event(&id).await?;
    Ok(Json(EventResource::from_event(&event)?))
}

async fn retry_event(State(state): State<BackendState>, Path(id): Path<String>) -> Response {
    match state.api.retry_event(&id).await {
        Ok(event) => match EventResource::from_event(&event) {
            Ok(resource) => Json(resource).into_response(),
            Err(e) => ApiError(e).into_response(),
        },
        Err(e) => {
            debug!(event_id = %id, error = %e, "Retry rejected");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

async fn delete_event(
    State(state): State<BackendState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.api.delete_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stats(State(state): State<BackendState>) -> ApiResult<Json<Value>> {
    if let Some(body) = state.stats_body.read().await.clone() {
        return Ok(Json(body));
    }
    let stats = state.api.get_stats().await?;
    let body = serde_json::to_value(StatsResource::from_stats(&stats)?)
        .map_err(|e| Error::transport(e.to_string()))?;
    Ok(Json(body))
}

async fn list_subscriptions(
    State(state): State<BackendState>,
) -> ApiResult<Json<Vec<SubscriptionResource>>> {
    Ok(subscription_resources(&state.api.get_subscriptions().await?))
}

async fn list_active_subscriptions(
    State(state): State<BackendState>,
) -> ApiResult<Json<Vec<SubscriptionResource>>> {
    Ok(subscription_resources(
        &state.api.get_active_subscriptions().await?,
    ))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn search_subscriptions(
    State(state): State<BackendState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SubscriptionResource>>> {
    Ok(subscription_resources(
        &state.api.search_subscriptions(&params.query).await?,
    ))
}

async fn subscriptions_by_event(
    State(state): State<BackendState>,
    Path(event_name): Path<String>,
) -> ApiResult<Json<Vec<SubscriptionResource>>> {
    Ok(subscription_resources(
        &state.api.get_subscriptions_by_event(&event_name).await?,
    ))
}

async fn get_subscription(
    State(state): State<BackendState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResource>> {
    let subscription = state.api.get_subscription(&id).await?;
    Ok(Json(SubscriptionResource::from_subscription(&subscription)))
}

async fn create_subscription(
    State(state): State<BackendState>,
    Json(body): Json<SubscriptionResource>,
) -> ApiResult<(StatusCode, Json<SubscriptionResource>)> {
    let created = state.api.create_subscription(&body.into_draft()).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResource::from_subscription(&created)),
    ))
}

async fn update_subscription(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    Json(body): Json<SubscriptionResource>,
) -> ApiResult<Json<SubscriptionResource>> {
    let updated = state
        .api
        .update_subscription(&id, &body.into_update())
        .await?;
    Ok(Json(SubscriptionResource::from_subscription(&updated)))
}

async fn delete_subscription(
    State(state): State<BackendState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.api.delete_subscription(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn register_admin(
    State(state): State<BackendState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<Json<AdminResource>> {
    let registration = AdminRegistration {
        email: body.email,
        name: body.name,
        password: SecretString::from(body.password),
    };
    let admin = state.api.register_admin(&registration).await?;
    Ok(Json(AdminResource::from_admin(&admin)))
}

async fn login_admin(
    State(state): State<BackendState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<AdminResource>> {
    let admin = state.api.login_admin(&body.email, &body.password).await?;
    Ok(Json(AdminResource::from_admin(&admin)))
}

fn create_router(state: BackendState) -> Router {
    let api = Router::new()
        .route("/events", get(list_events).post(publish_event))
        .route("/events/failed", get(list_failed_events))
        .route("/events/paginated", get(events_page))
        .route("/events/stats", get(stats))
        .route("/events/:id", get(get_event).delete(delete_event))
        .route("/events/:id/retry", post(retry_event))
        .route(
            "/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route("/subscriptions/active", get(list_active_subscriptions))
        .route("/subscriptions/search", get(search_subscriptions))
        .route(
            "/subscriptions/by-event/:event_name",
            get(subscriptions_by_event),
        )
        .route(
            "/subscriptions/:id",
            get(get_subscription)
                .put(update_subscription)
                .delete(delete_subscription),
        )
        .route("/admin/register", post(register_admin))
        .route("/admin/login", post(login_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .with_state(state);

    Router::new().nest("/api", api)
}

/// A running fake backend bound to `127.0.0.1` on a random port.
///
/// The server stops when the value is dropped.
pub struct FakeBackend {
    base_url: String,
    api: Arc<MemoryWebhookApi>,
    stats_body: Arc<RwLock<Option<Value>>>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Starts a backend seeded with the demo data.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MemoryWebhookApi::with_demo_data()).await
    }

    /// Starts a backend serving the given store.
    pub async fn start_with(api: MemoryWebhookApi) -> anyhow::Result<Self> {
        let api = Arc::new(api);
        let stats_body = Arc::new(RwLock::new(None));
        let credentials = BasicCredentials::new(
            FAKE_USERNAME,
            SecretString::from(FAKE_PASSWORD.to_string()),
        );
        let state = BackendState {
            api: api.clone(),
            expected_authorization: format!("Basic {}", credentials.encoded()).into(),
            stats_body: stats_body.clone(),
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind fake backend listener")?;
        let address = listener
            .local_addr()
            .context("Failed to read fake backend address")?;
        let router = create_router(state);
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        let base_url = format!("http://{}/api", address);
        info!(base_url = %base_url, "Fake backend listening");
        Ok(Self {
            base_url,
            api,
            stats_body,
            server,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Direct access to the stored data, bypassing HTTP.
    pub fn store(&self) -> &MemoryWebhookApi {
        &self.api
    }

    /// A client with the accepted credentials.
    pub fn client(&self) -> anyhow::Result<WebhookClient> {
        self.client_with(FAKE_USERNAME, FAKE_PASSWORD)
    }

    pub fn client_with(&self, username: &str, password: &str) -> anyhow::Result<WebhookClient> {
        let credentials = BasicCredentials::new(username, SecretString::from(password.to_string()));
        let config = ClientConfig::new(&self.base_url, credentials)?;
        Ok(WebhookClient::new(config)?)
    }

    /// Serves `body` verbatim from `GET /events/stats` from now on.
    pub async fn set_stats_body(&self, body: Value) {
        *self.stats_body.write().await = Some(body);
    }

    /// Stops accepting connections and waits for the listener to close.
    pub async fn stop(&mut self) {
        self.server.abort();
        let _ = (&mut self.server).await;
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
