//! 路由与全局中间件装配

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{health::create_health_router, qr::create_qr_router};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 响应压缩策略：只压缩 JSON/文本类响应，图片本身已压缩，不再浪费 CPU。
pub fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 规范化 API 前缀：空串或 "/" 视为无前缀，其余保证以 "/" 开头且不以 "/" 结尾。
fn normalize_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// 组装完整应用：业务路由（挂在 `api.prefix` 下）、健康检查、Swagger UI 与全局中间件。
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let api_router = create_qr_router();

    let mut router = Router::<AppState>::new().merge(create_health_router());
    router = match normalize_prefix(&config.api.prefix) {
        Some(prefix) => router.nest(&prefix, api_router),
        None => router.merge(api_router),
    };

    let mut app = router
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(CompressionLayer::new().compress_when(compression_predicate()))
}
