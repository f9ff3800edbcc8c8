//! 渲染流水线
//!
//! 纯函数：(请求, 可选 logo 字节, 渲染参数) → 图片字节。不做任何 I/O。

use std::time::Instant;

use image::RgbaImage;

use super::encoder;
use super::eyes;
use super::geometry::QrGeometry;
use super::logo;
use super::matrix::QrMatrix;
use super::options::ResolvedOptions;
use super::renderer::{self, Drawers, Palette};
use super::style::ModuleShape;
use super::types::QrRequest;
use crate::error::AppError;

/// 与请求无关的渲染参数（来自配置）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// 每个模块的像素边长
    pub box_size: u32,
    /// JPEG 质量（1-100）
    pub jpeg_quality: u8,
    /// PNG 使用更快的压缩参数
    pub optimize_speed: bool,
    /// logo 解码允许的最大宽/高（像素）
    pub max_logo_dimension: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            box_size: 10,
            jpeg_quality: 85,
            optimize_speed: false,
            max_logo_dimension: 4096,
        }
    }
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// 生成未编码的成品图：底图 → 定位点分色合成 → 可选 logo。
pub fn compose_image(
    opts: &ResolvedOptions,
    logo_bytes: Option<&[u8]>,
    settings: &RenderSettings,
) -> Result<RgbaImage, AppError> {
    if settings.box_size == 0 {
        return Err(AppError::Internal("render.box_size 不能为 0".to_string()));
    }
    let t0 = Instant::now();

    let matrix = QrMatrix::encode(&opts.text, opts.version, opts.ec_level)?;
    let geometry = QrGeometry::for_matrix(&matrix, settings.box_size, opts.border);
    let t_matrix = t0.elapsed();

    let mut image = renderer::render(
        &matrix,
        &geometry,
        Drawers {
            module: opts.shapes.module,
            eye: ModuleShape::Square,
        },
        Palette {
            foreground: opts.foreground,
            background: opts.background,
        },
    )?;
    let t_base = t0.elapsed();

    eyes::composite_eyes(
        &mut image,
        &matrix,
        &geometry,
        opts.shapes.marker,
        opts.background,
        &opts.eye_colors,
    )?;
    let t_eyes = t0.elapsed();

    if let Some(bytes) = logo_bytes {
        logo::overlay_logo(&mut image, bytes, opts.logo_scale, settings.max_logo_dimension)?;
    }
    let t_logo = t0.elapsed();

    tracing::debug!(
        version = matrix.version(),
        modules = matrix.width(),
        module_shape = opts.shapes.module.as_str(),
        marker_shape = opts.shapes.marker.as_str(),
        size = geometry.image_size(),
        "二维码渲染分段: 编码={:?}, 底图={:?}, 定位点={:?}, logo={:?}",
        t_matrix,
        t_base - t_matrix,
        t_eyes - t_base,
        t_logo - t_eyes
    );
    Ok(image)
}

/// 使用已校验的参数渲染并编码。
pub fn render_resolved(
    opts: &ResolvedOptions,
    logo_bytes: Option<&[u8]>,
    settings: &RenderSettings,
) -> Result<RenderedQr, AppError> {
    let image = compose_image(opts, logo_bytes, settings)?;
    let t0 = Instant::now();
    let bytes = encoder::encode(&image, opts.format, settings)?;
    tracing::debug!(
        format = opts.format.name(),
        bytes = bytes.len(),
        "编码耗时 {:?}",
        t0.elapsed()
    );
    let (width, height) = encoder::output_dimensions(opts.format, image.width(), image.height());
    Ok(RenderedQr {
        bytes,
        content_type: opts.format.content_type(),
        width,
        height,
    })
}

/// 生成带样式的二维码图片。
///
/// 参数先全部校验（颜色、格式、纠错级别、版本、logo 比例），再开始渲染。
pub fn render_styled_qr_code(
    request: &QrRequest,
    logo_bytes: Option<&[u8]>,
    settings: &RenderSettings,
) -> Result<RenderedQr, AppError> {
    let opts = ResolvedOptions::from_request(request)?;
    render_resolved(&opts, logo_bytes, settings)
}
