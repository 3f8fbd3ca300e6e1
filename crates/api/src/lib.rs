mod config;
mod rate_limit;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Json, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use chrono::{DateTime, Utc};
use medicheck_agents::TriageAgent;
use medicheck_core::{
    request_appointment, search_directory, AppointmentRequest, ChatInput, ChatMessage, ChatRole,
    ChatSession, DirectoryKind, DirectoryQuery, Reminder, UrgencyTier,
};
use medicheck_llm::Generator;
use medicheck_observability::AppMetrics;
use medicheck_storage::{HistoryRepository, ReminderRepository, Store};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub use crate::config::ApiConfig;
use crate::rate_limit::IpRateLimiter;

const DEFAULT_USER_ID: &str = "user1";
const DEFAULT_SESSION_SUMMARY: &str = "New symptom consultation";

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<TriageAgent<Generator>>,
    pub store: Arc<Store>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
    pub max_body_bytes: usize,
    pub trust_forwarded: bool,
}

impl ApiState {
    pub fn new(config: &ApiConfig, generator: Generator, store: Store) -> Self {
        let metrics = AppMetrics::shared();

        Self {
            agent: Arc::new(TriageAgent::new(generator, metrics.clone())),
            store: Arc::new(store),
            metrics,
            limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
            max_body_bytes: config.max_body_bytes,
            trust_forwarded: config.trust_forwarded,
        }
    }
}

pub async fn build_app(config: &ApiConfig) -> Result<Router> {
    let generator = Generator::ollama(&config.ollama)?;

    let store = match config.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };

    Ok(build_router(ApiState::new(config, generator, store)))
}

pub fn build_router(state: ApiState) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route(
            "/reminders",
            get(reminders_list)
                .post(reminder_create)
                .delete(reminder_delete),
        )
        .route("/history", get(history_get).post(history_save))
        .route(
            "/doctor-finder",
            get(doctor_finder).post(appointment_request_submit),
        );

    with_middleware(routes, state)
}

fn with_middleware(routes: Router<ApiState>, state: ApiState) -> Router {
    routes
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(state.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal_error(error: anyhow::Error, message: &str) -> Response {
    error!(error = %format!("{error:#}"), "{}", message);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn user_or_default(user_id: Option<String>) -> String {
    user_id
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    model: String,
    store: &'static str,
    metrics: medicheck_observability::MetricsSnapshot,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: Utc::now().to_rfc3339(),
        model: state.agent.model_name().to_string(),
        store: state.store.backend_name(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatInput>, JsonRejection>,
) -> impl IntoResponse {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => {
            warn!(rejection = %rejection, "unreadable chat body");
            state.metrics.inc_request();
            state.metrics.inc_rejected();
            return error_response(StatusCode::BAD_REQUEST, "Invalid message format");
        }
    };

    match state.agent.handle_chat(input).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(StatusCode::BAD_REQUEST, &error.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderCreateRequest {
    medicine_name: Option<String>,
    dosage: Option<String>,
    frequency: Option<String>,
    time: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    notes: Option<String>,
    user_id: Option<String>,
}

impl ReminderCreateRequest {
    fn into_reminder(self) -> Option<Reminder> {
        let required = |value: Option<String>| value.filter(|value| !value.is_empty());

        Some(Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self
                .user_id
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            medicine_name: required(self.medicine_name)?,
            dosage: required(self.dosage)?,
            frequency: required(self.frequency)?,
            time: required(self.time)?,
            start_date: required(self.start_date)?,
            end_date: self.end_date,
            notes: self.notes,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderDeleteQuery {
    id: Option<String>,
    user_id: Option<String>,
}

async fn reminders_list(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> impl IntoResponse {
    let user_id = user_or_default(query.user_id);

    match state.store.list_active_reminders(&user_id).await {
        Ok(reminders) => (
            StatusCode::OK,
            Json(json!({ "count": reminders.len(), "reminders": reminders })),
        )
            .into_response(),
        Err(error) => internal_error(error, "Failed to fetch reminders"),
    }
}

async fn reminder_create(
    State(state): State<ApiState>,
    payload: Result<Json<ReminderCreateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Some(reminder) = payload
        .ok()
        .and_then(|Json(request)| request.into_reminder())
    else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    match state.store.insert_reminder(&reminder).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Reminder created successfully",
                "reminder": reminder
            })),
        )
            .into_response(),
        Err(error) => internal_error(error, "Failed to create reminder"),
    }
}

async fn reminder_delete(
    State(state): State<ApiState>,
    Query(query): Query<ReminderDeleteQuery>,
) -> impl IntoResponse {
    let Some(reminder_id) = query.id.filter(|value| !value.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Reminder ID is required");
    };
    let user_id = user_or_default(query.user_id);

    match state.store.deactivate_reminder(&user_id, &reminder_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Reminder deleted successfully" })),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Reminder not found"),
        Err(error) => internal_error(error, "Failed to delete reminder"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    user_id: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistorySaveRequest {
    #[serde(default)]
    messages: Option<Value>,
    #[serde(default)]
    symptom_form: Option<Value>,
    #[serde(default)]
    risk_level: Option<Value>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageInput {
    role: ChatRole,
    content: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

fn parse_messages(raw: Option<Value>, now: DateTime<Utc>) -> Option<Vec<ChatMessage>> {
    let raw @ Value::Array(_) = raw? else {
        return None;
    };

    let inputs: Vec<MessageInput> = serde_json::from_value(raw).ok()?;
    Some(
        inputs
            .into_iter()
            .map(|input| ChatMessage {
                role: input.role,
                content: input.content,
                timestamp: input.timestamp.unwrap_or(now),
            })
            .collect(),
    )
}

async fn history_get(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let user_id = user_or_default(query.user_id);

    if let Some(session_id) = query.session_id.filter(|value| !value.is_empty()) {
        return match state.store.load_session(&user_id, &session_id).await {
            Ok(Some(session)) => {
                (StatusCode::OK, Json(json!({ "session": session }))).into_response()
            }
            Ok(None) => error_response(StatusCode::NOT_FOUND, "Session not found"),
            Err(error) => internal_error(error, "Failed to fetch history"),
        };
    }

    match state.store.list_sessions(&user_id).await {
        Ok(sessions) => (
            StatusCode::OK,
            Json(json!({ "count": sessions.len(), "sessions": sessions })),
        )
            .into_response(),
        Err(error) => internal_error(error, "Failed to fetch history"),
    }
}

async fn history_save(
    State(state): State<ApiState>,
    payload: Result<Json<HistorySaveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid messages format");
    };

    let now = Utc::now();
    let Some(messages) = parse_messages(request.messages, now) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid messages format");
    };

    let user_id = request
        .user_id
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    let risk_level = request
        .risk_level
        .as_ref()
        .and_then(Value::as_str)
        .and_then(UrgencyTier::parse);
    let summary = request.summary.filter(|value| !value.is_empty());

    if let Some(session_id) = request.session_id.filter(|value| !value.is_empty()) {
        let existing = match state.store.load_session(&user_id, &session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return error_response(StatusCode::NOT_FOUND, "Session not found"),
            Err(error) => return internal_error(error, "Failed to save session"),
        };

        let session = ChatSession {
            messages,
            symptom_form: request.symptom_form,
            risk_level: risk_level.unwrap_or(existing.risk_level),
            summary: summary.unwrap_or_else(|| existing.summary.clone()),
            updated_at: now,
            ..existing
        };

        return match state.store.upsert_session(&session).await {
            Ok(()) => (
                StatusCode::OK,
                Json(json!({
                    "message": "Session updated successfully",
                    "session": session
                })),
            )
                .into_response(),
            Err(error) => internal_error(error, "Failed to save session"),
        };
    }

    let session = ChatSession {
        id: uuid::Uuid::new_v4().to_string(),
        user_id,
        messages,
        symptom_form: request.symptom_form,
        risk_level: risk_level.unwrap_or_default(),
        summary: summary.unwrap_or_else(|| DEFAULT_SESSION_SUMMARY.to_string()),
        created_at: now,
        updated_at: now,
    };

    match state.store.upsert_session(&session).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Session created successfully",
                "session": session
            })),
        )
            .into_response(),
        Err(error) => internal_error(error, "Failed to save session"),
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryParams {
    location: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    specialty: Option<String>,
    emergency: Option<String>,
}

async fn doctor_finder(Query(params): Query<DirectoryParams>) -> impl IntoResponse {
    let query = DirectoryQuery {
        location: params
            .location
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| medicheck_core::directory::DEFAULT_LOCATION.to_string()),
        kind: DirectoryKind::parse(params.kind.as_deref().filter(|value| !value.is_empty())),
        specialty: params.specialty,
        emergency_only: params.emergency.as_deref() == Some("true"),
    };

    (StatusCode::OK, Json(search_directory(&query)))
}

async fn appointment_request_submit(
    payload: Result<Json<AppointmentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid appointment request");
    };

    let appointment = request_appointment(request);
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment request submitted successfully",
            "appointment": appointment,
            "note": "You will receive a confirmation call within 24 hours"
        })),
    )
        .into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail = %detail, "request handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request, state.trust_forwarded);
    if !state.limiter.allow(&ip) {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate limit exceeded for this IP",
        );
    }

    next.run(request).await
}

/// Client key for rate limiting. `x-forwarded-for` is client-controlled and is
/// only read when a trusted proxy sets it.
fn request_ip(request: &Request<Body>, trust_forwarded: bool) -> String {
    let forwarded = trust_forwarded
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(|hop| hop.trim().to_string())
                .filter(|hop| !hop.is_empty())
        })
        .flatten();

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'; base-uri 'none'"),
    );

    response
}
