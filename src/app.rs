use axum::{Router, routing::get};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{face::create_face_router, health::health_check};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 组装完整路由与中间件。
///
/// 层顺序（外 → 内）：request-id → CORS → trace → 路由。
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::<AppState>::new()
        .route("/health", get(health_check))
        .merge(create_face_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(
            // 每个请求一条 INFO 完成日志（状态码 + 耗时），默认过滤级别下即可见
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(axum::middleware::from_fn(request_id_middleware))
}
