//! Serve command: HTTP API plus the web frontend.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::server::{router, shutdown_signal, AppState};
use crate::session::MemorySessionStore;
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::warning(&format!("{}", e));
        Output::warning("Questions will fail until this is fixed.");
    }

    let pipeline = Pipeline::from_settings(&settings)?;
    let sessions = Arc::new(MemorySessionStore::from_settings(&settings.session));
    let state = Arc::new(AppState::new(pipeline, sessions));

    let static_dir = settings.static_dir();
    let frontend = static_dir.is_dir().then_some(static_dir.as_path());
    if frontend.is_none() {
        Output::warning(&format!(
            "Static directory {} not found; serving the API only.",
            static_dir.display()
        ));
    }

    let app = router(state, frontend);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidrag server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Process video", "POST /api/process");
    Output::kv("Chat", "POST /api/chat");
    if frontend.is_some() {
        Output::kv("Frontend", &format!("GET  / ({})", static_dir.display()));
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
