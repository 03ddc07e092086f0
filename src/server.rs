//! HTTP API.
//!
//! `POST /api/process` builds a chain for a video and installs it in the
//! caller's session; `POST /api/chat` answers against that chain. Anything
//! else falls through to the static frontend.

use crate::error::VidragError;
use crate::pipeline::Pipeline;
use crate::session::{SessionId, SessionStore};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Request header selecting the session slot.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared application state.
pub struct AppState {
    pub pipeline: Pipeline,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, sessions: Arc<dyn SessionStore>) -> Self {
        Self { pipeline, sessions }
    }
}

/// Build the application router. `static_dir` is served as the fallback.
pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/process", post(process))
        .route("/api/chat", post(chat));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Wait for Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Error response rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Chat failures: a missing session is the caller's fault, the rest is ours.
    fn from_chat(err: VidragError) -> Self {
        match err {
            VidragError::NoSession | VidragError::InvalidInput(_) => Self::bad_request(err.to_string()),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

fn session_id(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    match headers.get(SESSION_HEADER) {
        None => Ok(SessionId::default()),
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid session id header"))
            .and_then(|raw| SessionId::parse(raw).map_err(|e| ApiError::bad_request(e.to_string()))),
    }
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
    }))
}

async fn process(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_id(&headers)?;
    let Json(req) = payload?;

    info!("Processing {} for session {}", req.url, session);

    // The slot is only touched once the chain is complete.
    let chain = state.pipeline.build_chain(&req.url).await.map_err(|e| {
        warn!("Processing failed for session {}: {}", session, e);
        ApiError::bad_request(e.to_string())
    })?;

    info!("Session {} now serves video {}", session, chain.video_id());
    state
        .sessions
        .replace(session.clone(), Arc::new(chain))
        .await;

    Ok((
        [(SESSION_HEADER, session.to_string())],
        Json(ProcessResponse {
            status: "success",
            message: "Video processed successfully!",
        }),
    ))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_id(&headers)?;
    let Json(req) = payload?;

    let chain = state
        .sessions
        .get(&session)
        .await
        .ok_or_else(|| ApiError::from_chat(VidragError::NoSession))?;

    let answer = chain.answer(&req.question).await.map_err(|e| {
        warn!("Chat failed for session {}: {}", session, e);
        ApiError::from_chat(e)
    })?;

    Ok((
        [(SESSION_HEADER, session.to_string())],
        Json(ChatResponse { answer: answer.text }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{ChunkingConfig, RecursiveSplitter};
    use crate::embedding::tests::LetterEmbedder;
    use crate::error::{Result, TranscriptFailure};
    use crate::llm::tests::RecordingModel;
    use crate::session::MemorySessionStore;
    use crate::source::VideoId;
    use crate::transcript::tests::track;
    use crate::transcript::{CaptionProvider, CaptionSnippet, TranscriptList, TranscriptTrack};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    const VIDEO_A: &str = "https://www.youtube.com/watch?v=AAAAAAAAAAA";
    const VIDEO_B: &str = "https://youtu.be/BBBBBBBBBBB";
    const NO_CAPTIONS: &str = "https://www.youtube.com/watch?v=CCCCCCCCCCC";

    /// Captions keyed by video id; unknown videos have captions disabled.
    struct VideoCaptions(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl CaptionProvider for VideoCaptions {
        async fn list(&self, video_id: &VideoId) -> Result<TranscriptList> {
            if !self.0.contains_key(video_id.as_str()) {
                return Err(VidragError::transcript(
                    video_id.as_str(),
                    TranscriptFailure::CaptionsDisabled,
                ));
            }
            let mut t = track("en", false);
            t.base_url = video_id.as_str().to_string();
            Ok(TranscriptList::new(video_id.as_str(), vec![t]))
        }

        async fn fetch(&self, track: &TranscriptTrack) -> Result<Vec<CaptionSnippet>> {
            let text = self.0.get(track.base_url.as_str()).copied().unwrap_or_default();
            Ok(vec![CaptionSnippet::new(text, 0.0, 10.0)])
        }
    }

    fn app(model: Arc<RecordingModel>) -> Router {
        let captions = VideoCaptions(HashMap::from([
            ("AAAAAAAAAAA", "apples are red and crunchy"),
            ("BBBBBBBBBBB", "bananas are yellow and soft"),
        ]));
        let pipeline = Pipeline::with_components(
            Arc::new(captions),
            Arc::new(RecursiveSplitter::new(ChunkingConfig::default())),
            Arc::new(LetterEmbedder::new()),
            model,
        );
        let state = Arc::new(AppState::new(pipeline, Arc::new(MemorySessionStore::default())));
        router(state, None)
    }

    async fn post(app: &Router, uri: &str, body: Value, session: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(id) = session {
            request = request.header(SESSION_HEADER, id);
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_before_process() {
        let model = Arc::new(RecordingModel::new("unused"));
        let app = app(model.clone());

        let (status, body) = post(&app, "/api/chat", json!({"question": "hi?"}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"detail": "No video processed yet. Please process a video first."})
        );
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_process_then_chat() {
        let model = Arc::new(RecordingModel::new("They are red."));
        let app = app(model.clone());

        let (status, body) = post(&app, "/api/process", json!({"url": VIDEO_A}), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "success", "message": "Video processed successfully!"})
        );

        let (status, body) =
            post(&app, "/api/chat", json!({"question": "What color are apples?"}), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"answer": "They are red."}));
        assert!(model.last_prompt().unwrap().contains("apples are red and crunchy"));
    }

    #[tokio::test]
    async fn test_disabled_captions_leave_session_idle() {
        let model = Arc::new(RecordingModel::new("unused"));
        let app = app(model.clone());

        let (status, body) = post(&app, "/api/process", json!({"url": NO_CAPTIONS}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("CCCCCCCCCCC"));
        assert!(detail.contains("Subtitles are disabled"));

        let (status, body) = post(&app, "/api/chat", json!({"question": "hi?"}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "No video processed yet. Please process a video first."
        );
    }

    #[tokio::test]
    async fn test_reprocess_replaces_video() {
        let model = Arc::new(RecordingModel::new("ok"));
        let app = app(model.clone());

        post(&app, "/api/process", json!({"url": VIDEO_A}), None).await;
        post(&app, "/api/process", json!({"url": VIDEO_B}), None).await;
        post(&app, "/api/chat", json!({"question": "What fruit?"}), None).await;

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("bananas"));
        assert!(!prompt.contains("apples"));
    }

    #[tokio::test]
    async fn test_failed_reprocess_keeps_previous_video() {
        let model = Arc::new(RecordingModel::new("ok"));
        let app = app(model.clone());

        post(&app, "/api/process", json!({"url": VIDEO_A}), None).await;
        let (status, _) = post(&app, "/api/process", json!({"url": NO_CAPTIONS}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&app, "/api/chat", json!({"question": "What fruit?"}), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(model.last_prompt().unwrap().contains("apples"));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let model = Arc::new(RecordingModel::new("ok"));
        let app = app(model.clone());

        post(&app, "/api/process", json!({"url": VIDEO_A}), Some("tab-a")).await;
        post(&app, "/api/process", json!({"url": VIDEO_B}), Some("tab-b")).await;

        post(&app, "/api/chat", json!({"question": "q"}), Some("tab-a")).await;
        assert!(model.last_prompt().unwrap().contains("apples"));

        let (status, _) = post(&app, "/api/chat", json!({"question": "q"}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_url_and_bad_json() {
        let app = app(Arc::new(RecordingModel::new("unused")));

        let (status, body) = post(&app, "/api/process", json!({"url": "not a url"}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid YouTube URL: not a url");

        let (status, body) = post(&app, "/api/process", json!({"link": VIDEO_A}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = post(&app, "/api/chat", json!({"question": "q"}), Some("bad id!")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_question_is_400() {
        let model = Arc::new(RecordingModel::new("unused"));
        let app = app(model.clone());

        post(&app, "/api/process", json!({"url": VIDEO_A}), None).await;
        let (status, body) = post(&app, "/api/chat", json!({"question": "  "}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Invalid input: Question is empty"}));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_500() {
        let model = Arc::new(RecordingModel::failing());
        let app = app(model);

        post(&app, "/api/process", json!({"url": VIDEO_A}), None).await;
        let (status, body) = post(&app, "/api/chat", json!({"question": "q"}), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_health_counts_sessions() {
        let app = app(Arc::new(RecordingModel::new("ok")));
        post(&app, "/api/process", json!({"url": VIDEO_A}), None).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok", "sessions": 1}));
    }
}
