use std::future::Future;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::debug;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::config::Config;
use crate::session::Session;

pub fn app(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/ws/:key", get(ws_handler))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if config.cors_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let (room, client) = split_key(&key);
    debug!(%room, %client, "upgrading connection");
    ws.on_upgrade(move |socket| Session::new(room, client, state.registry).run(socket))
}

// `{room}_{client}`, split on the last underscore
pub fn split_key(key: &str) -> (String, String) {
    match key.rsplit_once('_') {
        Some((room, client)) if !room.is_empty() && !client.is_empty() => {
            (room.to_string(), client.to_string())
        }
        _ => (key.to_string(), Uuid::new_v4().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_last_underscore() {
        assert_eq!(split_key("lobby_alice"), ("lobby".into(), "alice".into()));
        assert_eq!(
            split_key("team_red_bob"),
            ("team_red".into(), "bob".into())
        );
    }

    #[test]
    fn generates_client_id_when_missing() {
        for key in ["lobby", "lobby_", "_alice"] {
            let (room, client) = split_key(key);
            assert_eq!(room, key);
            assert!(Uuid::parse_str(&client).is_ok());
        }
    }
}
