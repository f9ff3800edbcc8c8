use std::io::Cursor;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use futures_util::future::BoxFuture;
use image::{ImageFormat, Rgba, RgbaImage};
use tower::ServiceExt;

use qrstyle_backend::config::{ApiConfig, AppConfig, LogoConfig};
use qrstyle_backend::features::qr::LogoFetcher;
use qrstyle_backend::{AppError, app::build_router, state::AppState};

/// 返回固定 logo 的回源实现
struct StaticLogo(Vec<u8>);

impl LogoFetcher for StaticLogo {
    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AppError>> {
        let bytes = self.0.clone();
        Box::pin(async move { Ok(bytes) })
    }
}

/// 始终失败的回源实现
struct Unreachable;

impl LogoFetcher for Unreachable {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AppError>> {
        let msg = format!("connect {url}: connection refused");
        Box::pin(async move { Err(AppError::Network(msg)) })
    }
}

fn blue_logo_png() -> Vec<u8> {
    let logo = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 255, 255]));
    let mut out = Vec::new();
    logo.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode logo");
    out
}

fn app_with(config: AppConfig, fetcher: Arc<dyn LogoFetcher>) -> Router {
    let state = AppState::with_fetcher(&config, fetcher);
    build_router(&config, state)
}

fn app() -> Router {
    app_with(AppConfig::default(), Arc::new(Unreachable))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

async fn problem(resp: axum::response::Response) -> serde_json::Value {
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert_eq!(content_type, "application/problem+json");
    serde_json::from_slice(&body_bytes(resp).await).expect("parse problem json")
}

#[tokio::test]
async fn defaults_return_png_image() {
    let resp = app()
        .oneshot(post_json("/generate_qr", r#"{"qr_code_text":"HELLO"}"#))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let bytes = body_bytes(resp).await;
    let img = image::load_from_memory(&bytes).expect("decode png").to_rgba8();
    assert_eq!(img.dimensions(), (290, 290));
    assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    assert_eq!(*img.get_pixel(45, 45), Rgba([0, 0, 0, 255]));
}

#[tokio::test]
async fn format_is_case_insensitive_and_sets_content_type() {
    let resp = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","image_format":"jpeg"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    let bytes = body_bytes(resp).await;
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
}

#[tokio::test]
async fn invalid_color_is_422_problem() {
    let resp = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","background_color":"white"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = problem(resp).await;
    assert_eq!(v["code"], "VALIDATION_FAILED");
    assert_eq!(v["status"], 422);
    assert!(v["detail"].as_str().unwrap().contains("background_color"));
}

#[tokio::test]
async fn malformed_json_is_400_problem() {
    let resp = app()
        .oneshot(post_json("/generate_qr", r#"{"qr_code_text": "#))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = problem(resp).await;
    assert_eq!(v["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unsupported_format_is_422_without_image() {
    let resp = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","image_format":"BMP2"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = problem(resp).await;
    assert_eq!(v["code"], "UNSUPPORTED_IMAGE_FORMAT");
}

#[tokio::test]
async fn data_overflow_is_reported() {
    let text = "x".repeat(300);
    let body = serde_json::json!({ "qr_code_text": text, "version": 1 }).to_string();
    let resp = app()
        .oneshot(post_json("/generate_qr", &body))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = problem(resp).await;
    assert_eq!(v["code"], "QR_DATA_OVERFLOW");
}

#[tokio::test]
async fn thin_style_matches_explicit_shapes() {
    let thin = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","style":"thin","module_shape":"circle","marker_shape":"circle"}"#,
        ))
        .await
        .expect("call app");
    let explicit = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","module_shape":"vertical-bars","marker_shape":"square"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(thin.status(), StatusCode::OK);
    let a = image::load_from_memory(&body_bytes(thin).await).unwrap().to_rgba8();
    let b = image::load_from_memory(&body_bytes(explicit).await).unwrap().to_rgba8();
    assert_eq!(a, b);
}

#[tokio::test]
async fn logo_from_fetcher_is_composited() {
    let app = app_with(AppConfig::default(), Arc::new(StaticLogo(blue_logo_png())));
    let resp = app
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","logo_image_url":"https://cdn.example.com/logo.png"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    let img = image::load_from_memory(&body_bytes(resp).await)
        .unwrap()
        .to_rgba8();
    // 290px @ 0.2：底板 69px 位于 (116, 110)，logo 58px 居中
    assert_eq!(*img.get_pixel(150, 144), Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn undecodable_logo_is_422() {
    let app = app_with(
        AppConfig::default(),
        Arc::new(StaticLogo(b"<html>not an image</html>".to_vec())),
    );
    let resp = app
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","logo_image_url":"https://cdn.example.com/logo.png"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem(resp).await["code"], "LOGO_DECODE_FAILED");
}

#[tokio::test]
async fn ico_output_is_scaled_to_icon_size() {
    let resp = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","image_format":"ICO"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/ico"
    );
    let bytes = body_bytes(resp).await;
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Ico);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (256, 256));
}

#[tokio::test]
async fn logo_over_configured_dimension_is_422() {
    let config = AppConfig {
        logo: LogoConfig {
            max_dimension: 8,
            ..LogoConfig::default()
        },
        ..AppConfig::default()
    };
    let app = app_with(config, Arc::new(StaticLogo(blue_logo_png())));
    let resp = app
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","logo_image_url":"https://cdn.example.com/logo.png"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem(resp).await["code"], "LOGO_DECODE_FAILED");
}

#[tokio::test]
async fn lenient_numbers_are_coerced() {
    let app = app_with(AppConfig::default(), Arc::new(StaticLogo(blue_logo_png())));
    let resp = app
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","version":5.0,"logo_scale":"0.2","logo_image_url":"https://cdn.example.com/logo.png"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    let img = image::load_from_memory(&body_bytes(resp).await)
        .unwrap()
        .to_rgba8();
    // 版本 5 为 37 模块，加 4 模块边框 → 450px
    assert_eq!(img.dimensions(), (450, 450));
}

#[tokio::test]
async fn logo_fetch_failure_is_502() {
    let resp = app()
        .oneshot(post_json(
            "/generate_qr",
            r#"{"qr_code_text":"HELLO","logo_image_url":"https://cdn.example.com/logo.png"}"#,
        ))
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(problem(resp).await["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn api_prefix_is_applied() {
    let config = AppConfig {
        api: ApiConfig {
            prefix: "/api/v1".to_string(),
        },
        ..AppConfig::default()
    };
    let app = app_with(config, Arc::new(Unreachable));

    let resp = app
        .clone()
        .oneshot(post_json("/api/v1/generate_qr", r#"{"qr_code_text":"HELLO"}"#))
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(post_json("/generate_qr", r#"{"qr_code_text":"HELLO"}"#))
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let resp = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(v["status"], "healthy");
    assert_eq!(v["service"], "qrstyle-backend");

    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("call app");
    assert_eq!(resp.status(), StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert!(v["paths"]["/generate_qr"]["post"].is_object());
}
