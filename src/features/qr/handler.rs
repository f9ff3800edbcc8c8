use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use std::time::Instant;

use super::types::QrRequest;
use crate::{
    error::{AppError, ProblemDetails},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/generate_qr",
    summary = "生成带样式的二维码",
    description = "按请求体中的颜色、模块/定位点形状、风格预设、纠错级别与可选 logo 生成二维码图片。响应体为图片字节，Content-Type 为 image/<格式>。",
    request_body = QrRequest,
    responses(
        (status = 200, description = "二维码图片字节（PNG/JPEG/GIF/BMP/TIFF/WEBP/ICO）"),
        (status = 400, description = "请求体不是合法 JSON", body = ProblemDetails, content_type = "application/problem+json"),
        (status = 422, description = "参数校验失败、数据溢出、格式不支持或 logo 无法解码", body = ProblemDetails, content_type = "application/problem+json"),
        (status = 502, description = "logo 回源失败", body = ProblemDetails, content_type = "application/problem+json"),
        (status = 504, description = "logo 回源超时", body = ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "QrCode"
)]
pub async fn generate_qr(
    State(state): State<AppState>,
    payload: Result<Json<QrRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Json(e.body_text()))?;
    let t_total = Instant::now();
    tracing::debug!(
        text_len = req.qr_code_text.len(),
        format = %req.image_format,
        style = %req.style,
        has_logo = req.has_logo(),
        "收到二维码生成请求"
    );

    let rendered = state.qr_service.render(req).await?;

    tracing::info!(
        content_type = rendered.content_type,
        bytes = rendered.bytes.len(),
        total_ms = t_total.elapsed().as_millis() as u64,
        "二维码生成请求完成"
    );
    Ok((
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(rendered.content_type),
        )],
        rendered.bytes,
    ))
}

pub fn create_qr_router() -> Router<AppState> {
    Router::new().route("/generate_qr", post(generate_qr))
}
