use std::time::Duration;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use medicheck_api::{build_router, ApiConfig, ApiState};
use medicheck_llm::{Generator, OllamaConfig, APOLOGY_REPLY, UNAVAILABLE_REPLY};
use medicheck_storage::Store;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Serves `/api/generate` on an ephemeral port and returns its base url.
async fn spawn_backend(backend: Router) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, backend).await;
    });
    Ok(format!("http://{addr}"))
}

async fn chat_reply(base_url: String, message: &str) -> Result<Value> {
    let config = ApiConfig {
        ollama: OllamaConfig {
            base_url,
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            ..OllamaConfig::default()
        },
        ..ApiConfig::default()
    };
    let generator = Generator::ollama(&config.ollama)?;
    let app = build_router(ApiState::new(&config, generator, Store::memory()));

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "message": message, "language": "marathi" }).to_string(),
        ))?;

    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[tokio::test]
async fn generated_text_is_returned_verbatim() -> Result<()> {
    let backend = Router::new().route(
        "/api/generate",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["stream"], false);
            assert_eq!(body["model"], "llama3.1:latest");
            let prompt = body["prompt"].as_str().unwrap_or_default();
            assert!(prompt.ends_with("Symptoms: nausea since morning"));
            Json(json!({ "response": "Sip water slowly." }))
        }),
    );
    let base_url = spawn_backend(backend).await?;

    let body = chat_reply(base_url, "nausea since morning").await?;
    assert_eq!(body["reply"], "Sip water slowly.");
    assert_eq!(body["urgency"], "medium");
    Ok(())
}

#[tokio::test]
async fn empty_or_missing_text_yields_apology() -> Result<()> {
    let backend = Router::new().route(
        "/api/generate",
        post(|| async { Json(json!({ "response": "" })) }),
    );
    let body = chat_reply(spawn_backend(backend).await?, "sore throat").await?;
    assert_eq!(body["reply"], APOLOGY_REPLY);

    let backend = Router::new().route("/api/generate", post(|| async { Json(json!({})) }));
    let body = chat_reply(spawn_backend(backend).await?, "sore throat").await?;
    assert_eq!(body["reply"], APOLOGY_REPLY);
    Ok(())
}

#[tokio::test]
async fn error_status_yields_fallback() -> Result<()> {
    let backend = Router::new().route(
        "/api/generate",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
    );
    let body = chat_reply(spawn_backend(backend).await?, "stroke symptoms").await?;
    assert_eq!(body["reply"], UNAVAILABLE_REPLY);
    assert_eq!(body["urgency"], "high");
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_yields_fallback() -> Result<()> {
    let body = chat_reply("http://127.0.0.1:9".to_string(), "a little tired").await?;
    assert_eq!(body["reply"], UNAVAILABLE_REPLY);
    assert_eq!(body["urgency"], "low");
    Ok(())
}
