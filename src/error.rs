use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use qrcode::types::QrError;
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 请求体 JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(String),

    /// 参数校验错误（颜色、版本、logo 比例等）
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 文本超出所选版本/纠错级别的容量
    #[error("数据溢出: {0}")]
    DataOverflow(String),

    /// 不支持的输出图片格式
    #[error("不支持的图片格式: {0}")]
    UnsupportedFormat(String),

    /// logo 回源网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// logo 回源超时（包含 connect/read 等阶段）
    #[error("请求超时: {0}")]
    Timeout(String),

    /// logo 图片无法解码
    #[error("logo 解码失败: {0}")]
    LogoDecode(String),

    /// 图像渲染/编码错误
    #[error("图像渲染错误: {0}")]
    ImageRendererError(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// 所有 API 错误都返回结构化 JSON（content-type = application/problem+json），
/// 调用方按 `code` 做程序化处理，`detail` 仅供人阅读。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Validation Failed")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 422)]
    pub status: u16,

    /// 人类可读的详细信息。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 请求追踪 ID（由 request-id 中间件注入）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_)
            | AppError::DataOverflow(_)
            | AppError::UnsupportedFormat(_)
            | AppError::LogoDecode(_)
            | AppError::ImageRendererError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Json(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::DataOverflow(_) => "QR_DATA_OVERFLOW",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_IMAGE_FORMAT",
            AppError::Network(_) => "UPSTREAM_ERROR",
            AppError::Timeout(_) => "UPSTREAM_TIMEOUT",
            AppError::LogoDecode(_) => "LOGO_DECODE_FAILED",
            AppError::ImageRendererError(_) => "IMAGE_RENDER_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::BAD_GATEWAY => "Bad Gateway",
            StatusCode::GATEWAY_TIMEOUT => "Gateway Timeout",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_builder() {
            AppError::Validation(format!("logo_image_url 无效: {err}"))
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::DataTooLong => {
                AppError::DataOverflow("文本长度超出所选版本与纠错级别的容量".to_string())
            }
            QrError::InvalidVersion => AppError::Validation("version 必须在 1-40 范围内".to_string()),
            other => AppError::Validation(format!("无法编码二维码: {other}")),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::ImageRendererError(err.to_string())
    }
}
