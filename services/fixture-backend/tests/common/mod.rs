/// Common test utilities and fixtures for integration tests
use axum::http::HeaderValue;
use fixture_backend::{build_router, config::Config, state::AppState};
use serde_json::Value;
use shared::Credits;
use wager_client::config::FixtureSettings;

pub const TOKEN: &str = "test-token";

pub fn test_config() -> Config {
    Config {
        api_port: 0,
        metrics_port: 0,
        api_token: TOKEN.to_string(),
        fixture: FixtureSettings {
            initial_balance: Credits::new(100),
            ..FixtureSettings::default()
        },
    }
}

pub fn test_state() -> AppState {
    AppState::new(test_config())
}

pub fn bearer() -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", TOKEN)).expect("Invalid header value")
}

/// Serve `state` on an ephemeral local port and return its base URL
pub async fn spawn_backend(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("Test server failed");
    });

    format!("http://{}", addr)
}

/// Helper function to parse error response
pub fn parse_error(body: &str) -> Option<(String, String, String)> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;

    Some((
        error.get("code")?.as_str()?.to_string(),
        error.get("message")?.as_str()?.to_string(),
        error.get("category")?.as_str()?.to_string(),
    ))
}
