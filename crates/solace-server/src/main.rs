use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use solace_api::middleware::require_auth;
use solace_api::state::{AppState, AppStateInner};
use solace_api::{booking, chat, feed, sessions};
use solace_store::Store;
use solace_triggers::{HttpNotifier, LogNotifier, Notifier, TriggerEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solace=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("SOLACE_DB_PATH").unwrap_or_else(|_| "solace.db".into());
    let host = std::env::var("SOLACE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SOLACE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Open the shared document store
    let store = Arc::new(Store::open(&PathBuf::from(&db_path))?);

    // Trigger engine, with a real push gateway when one is configured
    let notifier: Arc<dyn Notifier> = match std::env::var("SOLACE_PUSH_URL") {
        Ok(url) => Arc::new(HttpNotifier::new(url)),
        Err(_) => Arc::new(LogNotifier),
    };
    tokio::spawn(TriggerEngine::new(store.clone(), notifier).run());

    let app_state: AppState = Arc::new(AppStateInner { store });

    let routes = Router::new()
        .route("/posts", post(feed::create_post).get(feed::list_posts))
        .route("/posts/{post_id}", delete(feed::delete_post))
        .route("/posts/{post_id}/likes", post(feed::toggle_like))
        .route(
            "/posts/{post_id}/comments",
            post(feed::add_comment).get(feed::list_comments),
        )
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            delete(feed::remove_comment),
        )
        .route("/bookings", post(booking::book_slot).get(booking::booked_times))
        .route("/chats", post(chat::open_chat))
        .route(
            "/chats/{chat_id}/messages",
            post(chat::send_message).get(chat::list_messages),
        )
        .route(
            "/chats/{chat_id}/messages/{message_id}/read",
            post(chat::mark_read),
        )
        .route("/scans", post(sessions::submit_scan))
        .route("/sessions", get(sessions::list_sessions))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Solace server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
