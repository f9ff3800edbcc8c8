//! 带样式的二维码生成
//!
//! 子模块按流水线顺序排列：风格解析 → 矩阵编码 → 栅格化 → 定位点分色 → logo → 编码。

pub mod color;
pub mod drawer;
pub mod encoder;
pub mod eyes;
pub mod geometry;
pub mod handler;
pub mod logo;
pub mod matrix;
pub mod options;
pub mod pipeline;
pub mod renderer;
pub mod service;
pub mod style;
pub mod types;

pub use handler::create_qr_router;
pub use logo::{HttpLogoFetcher, LogoFetcher};
pub use pipeline::{RenderSettings, RenderedQr, render_styled_qr_code};
pub use service::QrRenderService;
pub use types::QrRequest;
