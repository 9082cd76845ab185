use axum::{extract::State, response::Html};
use tracing::warn;

use crate::state::AppState;

const NOT_FOUND_PAGE: &str =
    "<h1>Demo frontend not found</h1><p>Make sure public/index.html exists</p>";

/// Serve the demo frontend, retitled for this server
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let path = state.public_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Html(retitle(&content)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Demo frontend unavailable");
            Html(NOT_FOUND_PAGE.to_string())
        }
    }
}

/// The shared frontend is written for the Express demo
fn retitle(content: &str) -> String {
    content
        .replace("Vortex Express SDK Demo", "Vortex Rust SDK Demo")
        .replace("Express SDK", "Rust SDK")
}
