use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageFormat, RgbaImage};

use super::pipeline::RenderSettings;
use crate::error::AppError;

/// ICO 单帧允许的最大边长
const ICO_MAX_SIDE: u32 = 256;

/// 支持的输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Ico,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Png,
        OutputFormat::Jpeg,
        OutputFormat::Gif,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
        OutputFormat::Webp,
        OutputFormat::Ico,
    ];

    /// 大小写不敏感地解析格式名。
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let key = raw.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| {
                AppError::UnsupportedFormat(format!(
                    "{raw:?}（可选：PNG/JPEG/GIF/BMP/TIFF/WEBP/ICO）"
                ))
            })
    }

    /// 规范格式名（大写）
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Gif => "GIF",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Webp => "WEBP",
            OutputFormat::Ico => "ICO",
        }
    }

    /// `image/` + 小写格式名
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Ico => "image/ico",
        }
    }
}

/// 将成品图编码为指定格式。
pub fn encode(
    image: &RgbaImage,
    format: OutputFormat,
    settings: &RenderSettings,
) -> Result<Vec<u8>, AppError> {
    let (width, height) = image.dimensions();
    match format {
        OutputFormat::Png => encode_png(image, settings.optimize_speed),
        OutputFormat::Jpeg => {
            // JPEG 不支持透明通道
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut out = Vec::new();
            let mut enc = JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality);
            enc.encode(&rgb, width, height, ColorType::Rgb8.into())
                .map_err(|e| AppError::ImageRendererError(format!("JPEG encode error: {e}")))?;
            Ok(out)
        }
        OutputFormat::Webp => {
            let mut out = Vec::new();
            WebPEncoder::new_lossless(&mut out)
                .encode(image, width, height, ColorType::Rgba8.into())
                .map_err(|e| AppError::ImageRendererError(format!("WebP encode error: {e}")))?;
            Ok(out)
        }
        OutputFormat::Gif => write_with_image(image, ImageFormat::Gif),
        OutputFormat::Bmp => write_with_image(image, ImageFormat::Bmp),
        OutputFormat::Tiff => write_with_image(image, ImageFormat::Tiff),
        OutputFormat::Ico => {
            let (w, h) = output_dimensions(format, width, height);
            if (w, h) == (width, height) {
                return write_with_image(image, ImageFormat::Ico);
            }
            let icon = imageops::resize(image, w, h, FilterType::Lanczos3);
            write_with_image(&icon, ImageFormat::Ico)
        }
    }
}

/// 编码后的实际尺寸：ICO 超过 256 时等比缩小到 256×256 以内，其余格式不变。
pub fn output_dimensions(format: OutputFormat, width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height);
    if format != OutputFormat::Ico || longest <= ICO_MAX_SIDE {
        return (width, height);
    }
    let scale = f64::from(ICO_MAX_SIDE) / f64::from(longest);
    let fit = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, ICO_MAX_SIDE);
    (fit(width), fit(height))
}

/// 使用 png crate 直接编码（比 image crate 的默认参数更快）
fn encode_png(image: &RgbaImage, optimize_speed: bool) -> Result<Vec<u8>, AppError> {
    let (width, height) = image.dimensions();
    let mut out = Vec::with_capacity((width * height) as usize);
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if optimize_speed {
            encoder.set_compression(png::Compression::Fast);
            encoder.set_filter(png::FilterType::NoFilter);
        } else {
            encoder.set_compression(png::Compression::Default);
            encoder.set_filter(png::FilterType::Paeth);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| AppError::ImageRendererError(format!("PNG write_header error: {e}")))?;
        writer.write_image_data(image.as_raw()).map_err(|e| {
            AppError::ImageRendererError(format!("PNG write_image_data error: {e}"))
        })?;
        writer
            .finish()
            .map_err(|e| AppError::ImageRendererError(format!("PNG finish error: {e}")))?;
    }
    Ok(out)
}

fn write_with_image(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>, AppError> {
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), format)?;
    Ok(out)
}
