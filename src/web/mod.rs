use axum::{
    Json, Router,
    body::Body,
    http::{Method, Request, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::chat::{CompletionClient, OpenAiClient};
use crate::db::UserStore;
use crate::notifications::{
    ChatRegistry, NotificationService, senders::telegram::TelegramSender,
};
use crate::server::config::ServerConfig;
use crate::web::{middleware::auth, routes::*};

pub use error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;


#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub notification_service: Arc<NotificationService>,
    pub chat_client: Arc<dyn CompletionClient>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Production wiring: demo users, an empty chat registry and live
    /// Telegram / OpenAI clients sharing one HTTP client.
    pub fn from_config(config: Arc<ServerConfig>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let telegram = TelegramSender::new(
            http_client.clone(),
            config.telegram_api_url.clone(),
            config.telegram_bot_token.clone(),
        );
        let notification_service = Arc::new(NotificationService::new(
            ChatRegistry::new(),
            Arc::new(telegram),
        ));

        Ok(Self {
            users: UserStore::with_demo_users(),
            notification_service,
            chat_client: Arc::new(OpenAiClient::new(http_client, &config)),
            config,
        })
    }
}

async fn health_check_handler() -> &'static str {
    "OK"
}

fn api_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": t!("api.not_found").to_string() })),
    )
        .into_response()
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // Unknown `/api` paths get a JSON 404; anything else is a static file, with
    // `index.html` standing in for client-side routes.
    let static_dir = app_state.config.static_dir.clone();
    let static_file_service = ServeDir::new(&static_dir)
        .fallback(ServeFile::new(Path::new(&static_dir).join("index.html")));
    let fallback = tower::service_fn(move |req: Request<Body>| {
        let static_file_service = static_file_service.clone();
        async move {
            let path = req.uri().path();
            if path == "/api" || path.starts_with("/api/") {
                return Ok::<_, Infallible>(api_not_found());
            }
            static_file_service
                .oneshot(req)
                .await
                .map(|res| res.map(Body::new))
                .map_err(|err| match err {})
        }
    });

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest(
            "/api/auth",
            auth_routes::create_public_router().merge(
                auth_routes::create_protected_router()
                    .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
            ),
        )
        .nest(
            "/api/admin",
            admin_routes::create_admin_router()
                .route_layer(axum_middleware::from_fn(auth::require_admin))
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .route("/api/chat", post(chat_routes::chat_handler))
        .route("/api/contact", post(contact_routes::submit_contact))
        .nest("/api/telegram", telegram_routes::create_telegram_router())
        .with_state(app_state)
        .fallback_service(fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
