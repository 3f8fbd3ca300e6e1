use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use medicheck_api::{build_router, ApiConfig, ApiState};
use medicheck_core::{select_suggestions, Language, UrgencyTier};
use medicheck_llm::{Generator, LlmError, ScriptedGenerator, UNAVAILABLE_REPLY};
use medicheck_storage::Store;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(generator: ScriptedGenerator, config: ApiConfig) -> Router {
    build_router(ApiState::new(
        &config,
        Generator::Scripted(generator),
        Store::memory(),
    ))
}

fn app() -> Router {
    app_with(
        ScriptedGenerator::reply("Rest and drink fluids."),
        ApiConfig::default(),
    )
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, parsed)
}

fn strings(value: &Value) -> Vec<String> {
    serde_json::from_value(value.clone()).unwrap()
}

#[tokio::test]
async fn health_reports_model_and_request_id() {
    let app = app();

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["model"], "scripted");
    assert!(parsed["metrics"]["requests_total"].is_u64());
}

#[tokio::test]
async fn chest_pain_in_english_is_high_urgency() {
    let generator = ScriptedGenerator::reply("Call emergency services now.");
    let app = app_with(generator.clone(), ApiConfig::default());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/chat",
            json!({ "message": "I have chest pain and can't breathe", "language": "english" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urgency"], "high");
    assert_eq!(body["reply"], "Call emergency services now.");
    assert_eq!(
        strings(&body["suggestions"]),
        select_suggestions(UrgencyTier::High, Language::English)
    );

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with("\n\nSymptoms: I have chest pain and can't breathe"));
}

#[tokio::test]
async fn mild_fever_in_hindi_is_medium_urgency() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/chat",
            json!({ "message": "I have a mild fever", "language": "hindi" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urgency"], "medium");
    assert_eq!(
        strings(&body["suggestions"]),
        vec![
            "लक्षणों पर बारीकी से नज़र रखें",
            "हाइड्रेटेड रहें और आराम करें",
            "लक्षण बने रहने पर डॉक्टर से सलाह लें",
        ]
    );
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request("POST", "/chat", json!({ "message": "", "language": "english" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_language_falls_back_to_english() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/chat",
            json!({ "message": "just feeling a bit tired", "language": "klingon" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urgency"], "low");
    assert_eq!(
        strings(&body["suggestions"]),
        select_suggestions(UrgencyTier::Low, Language::English)
    );
}

#[tokio::test]
async fn non_string_and_malformed_bodies_are_rejected() {
    let app = app();

    let (status, body) = send(&app, json_request("POST", "/chat", json!({ "message": 42 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid message format");

    let (status, _) = send(&app, json_request("POST", "/chat", json!({ "language": "english" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, health) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(health["metrics"]["requests_total"], 3);
    assert_eq!(health["metrics"]["rejected_total"], 3);
    assert_eq!(health["metrics"]["generation_calls_total"], 0);
    assert_eq!(health["metrics"]["avg_latency_millis"], 0.0);
}

#[tokio::test]
async fn backend_outage_still_returns_triage() {
    let app = app_with(
        ScriptedGenerator::failing(LlmError::Connection("connection refused".to_string())),
        ApiConfig::default(),
    );

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/chat",
            json!({ "message": "Severe bleeding from my arm", "language": "english" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], UNAVAILABLE_REPLY);
    assert_eq!(body["urgency"], "high");
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);

    let (_, health) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(health["metrics"]["degraded_replies_total"], 1);
}

fn chat_from(forwarded_for: &str) -> Request<Body> {
    let mut request = json_request("POST", "/chat", json!({ "message": "headache" }));
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse().unwrap());
    request
}

#[tokio::test]
async fn rate_limit_applies_per_ip_but_not_to_health() {
    let config = ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        trust_forwarded: true,
        ..ApiConfig::default()
    };
    let app = app_with(ScriptedGenerator::reply("ok"), config);

    assert_eq!(send(&app, chat_from("198.51.100.4")).await.0, StatusCode::OK);
    assert_eq!(send(&app, chat_from("198.51.100.4")).await.0, StatusCode::OK);
    assert_eq!(
        send(&app, chat_from("198.51.100.4")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(&app, chat_from("198.51.100.5")).await.0, StatusCode::OK);

    for _ in 0..3 {
        assert_eq!(send(&app, empty_request("GET", "/health")).await.0, StatusCode::OK);
    }
}

#[tokio::test]
async fn rotating_forwarded_header_does_not_bypass_limit() {
    let config = ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        ..ApiConfig::default()
    };
    let app = app_with(ScriptedGenerator::reply("ok"), config);

    assert_eq!(send(&app, chat_from("203.0.113.1")).await.0, StatusCode::OK);
    assert_eq!(send(&app, chat_from("203.0.113.2")).await.0, StatusCode::OK);
    assert_eq!(
        send(&app, chat_from("203.0.113.3")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn storage_failure_returns_route_error() {
    let path = std::env::temp_dir().join(format!("medicheck-{}.db", uuid::Uuid::new_v4()));
    let database_url = format!("sqlite://{}", path.display());
    let app = build_router(ApiState::new(
        &ApiConfig::default(),
        Generator::Scripted(ScriptedGenerator::reply("ok")),
        Store::sqlite(&database_url).await.unwrap(),
    ));

    let (status, _) = send(&app, empty_request("GET", "/reminders")).await;
    assert_eq!(status, StatusCode::OK);

    let admin = sqlx::SqlitePool::connect(&database_url).await.unwrap();
    sqlx::query("DROP TABLE reminders")
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let (status, body) = send(&app, empty_request("GET", "/reminders")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to fetch reminders" }));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn reminders_create_list_and_soft_delete() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/reminders",
            json!({
                "medicineName": "Vitamin D",
                "dosage": "1000 IU",
                "frequency": "Daily",
                "time": "08:00",
                "startDate": "2024-01-01"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Reminder created successfully");
    assert_eq!(body["reminder"]["userId"], "user1");
    assert_eq!(body["reminder"]["isActive"], true);
    let reminder_id = body["reminder"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request("POST", "/reminders", json!({ "medicineName": "Aspirin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    let (status, body) = send(&app, empty_request("GET", "/reminders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["reminders"][0]["medicineName"], "Vitamin D");

    let (status, body) = send(&app, empty_request("GET", "/reminders?userId=someone-else")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = send(&app, empty_request("DELETE", "/reminders")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Reminder ID is required");

    let uri = format!("/reminders?id={reminder_id}");
    let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Reminder deleted successfully");

    let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Reminder not found");

    let (_, body) = send(&app, empty_request("GET", "/reminders")).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn history_sessions_create_update_and_lookup() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request("POST", "/history", json!({ "messages": "not a list" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid messages format");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/history",
            json!({
                "messages": [{ "role": "user", "content": "I have a mild fever" }],
                "riskLevel": "medium"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Session created successfully");
    assert_eq!(body["session"]["riskLevel"], "medium");
    assert_eq!(body["session"]["summary"], "New symptom consultation");
    assert!(body["session"]["messages"][0]["timestamp"].is_string());
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/history",
            json!({
                "sessionId": session_id,
                "messages": [
                    { "role": "user", "content": "I have a mild fever" },
                    { "role": "assistant", "content": "Rest and drink fluids." }
                ],
                "summary": "Fever follow-up"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session updated successfully");
    assert_eq!(body["session"]["riskLevel"], "medium");
    assert_eq!(body["session"]["summary"], "Fever follow-up");
    assert_eq!(body["session"]["messages"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        empty_request("GET", &format!("/history?sessionId={session_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["id"], session_id.as_str());

    let (status, body) = send(&app, empty_request("GET", "/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(&app, empty_request("GET", "/history?sessionId=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Session not found");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/history",
            json!({ "sessionId": "missing", "messages": [] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn doctor_finder_filters_directory() {
    let app = app();

    let (status, body) = send(&app, empty_request("GET", "/doctor-finder")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "New York, NY");
    assert_eq!(body["doctors"].as_array().unwrap().len(), 3);
    assert_eq!(body["hospitals"].as_array().unwrap().len(), 3);

    let (_, body) = send(
        &app,
        empty_request("GET", "/doctor-finder?type=doctors&specialty=family"),
    )
    .await;
    assert_eq!(body["doctors"].as_array().unwrap().len(), 1);
    assert_eq!(body["doctors"][0]["name"], "Dr. Emily Rodriguez");
    assert_eq!(body["hospitals"].as_array().unwrap().len(), 0);

    let (_, body) = send(
        &app,
        empty_request("GET", "/doctor-finder?type=hospitals&emergency=true"),
    )
    .await;
    assert_eq!(body["hospitals"].as_array().unwrap().len(), 2);
    assert_eq!(body["hospitals"][0]["type"], "General Hospital");
}

#[tokio::test]
async fn appointment_request_is_accepted() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/doctor-finder",
            json!({
                "doctorId": "2",
                "appointmentTime": "2024-06-01T10:00:00Z",
                "patientInfo": { "name": "A. Patient" }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Appointment request submitted successfully");
    assert_eq!(body["appointment"]["status"], "pending");
    assert_eq!(body["appointment"]["doctorId"], "2");
    assert_eq!(
        body["note"],
        "You will receive a confirmation call within 24 hours"
    );
}
