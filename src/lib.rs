/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 路由与中间件装配
pub mod app;

/// CORS 中间件
pub mod cors;

/// 请求追踪 ID 中间件
pub mod request_id;

/// OpenAPI 文档
pub mod openapi;

/// 优雅退出管理模块
pub mod shutdown;

// 导出常用类型供外部使用
pub use config::AppConfig;
pub use error::AppError;
pub use features::qr::{QrRequest, RenderSettings, RenderedQr, render_styled_qr_code};
pub use shutdown::{ShutdownManager, ShutdownReason};
