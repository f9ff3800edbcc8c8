use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;

use qrstyle_backend::config::{AppConfig, CorsConfig};
use qrstyle_backend::{app::build_router, state::AppState};

fn app_with_cors(cors: CorsConfig) -> axum::Router {
    let config = AppConfig {
        cors,
        ..AppConfig::default()
    };
    let state = AppState::from_config(&config).expect("build state");
    build_router(&config, state)
}

#[tokio::test]
async fn cors_layer_adds_allow_origin_header() {
    let app = app_with_cors(CorsConfig {
        enabled: true,
        allowed_origins: vec!["https://example.com".to_string()],
        allowed_methods: vec!["GET".to_string(), "POST".to_string()],
        allowed_headers: vec!["Content-Type".to_string()],
        ..CorsConfig::default()
    });

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    let allow_origin = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .expect("missing allow origin")
        .to_str()
        .expect("invalid allow origin");
    assert_eq!(allow_origin, "https://example.com");
}

#[tokio::test]
async fn cors_preflight_for_generate_qr() {
    let app = app_with_cors(CorsConfig {
        enabled: true,
        allowed_origins: vec!["https://example.com".to_string()],
        allowed_methods: vec!["POST".to_string()],
        allowed_headers: vec!["content-type".to_string()],
        ..CorsConfig::default()
    });

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/generate_qr")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    let allow_methods = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .expect("missing allow methods")
        .to_str()
        .expect("invalid allow methods");
    assert!(allow_methods.contains("POST"));
}

#[tokio::test]
async fn disabled_cors_adds_no_headers() {
    let app = app_with_cors(CorsConfig::default());
    let req = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    assert!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
