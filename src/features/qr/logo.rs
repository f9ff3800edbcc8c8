//! logo 叠加与回源
//!
//! 叠加部分是纯函数：解码 → 2 倍 Lanczos3 放大 → 缩放到目标边长 → 贴到白色圆形底板 → 合成到成品图。
//! 回源通过 [`LogoFetcher`] 抽象，生产实现基于 reqwest，带超时与响应体大小上限。

use std::io::Cursor;
use std::time::Duration;

use futures_util::future::BoxFuture;
use image::{ImageReader, Limits, RgbaImage, imageops, imageops::FilterType};
use reqwest::{Client, header};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::error::AppError;

/// logo 在成品图上的尺寸与位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoPlacement {
    /// logo 缩放后的边长
    pub target: u32,
    /// 白色圆形底板边长（比 logo 大 20%）
    pub plate: u32,
    pub x: i64,
    pub y: i64,
}

impl LogoPlacement {
    /// 根据成品图尺寸与缩放比例计算 logo 布局。
    ///
    /// 底板水平方向额外右移 `plate / 10` 像素。
    pub fn compute(width: u32, height: u32, scale: f64) -> Result<Self, AppError> {
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(AppError::Validation(format!(
                "logo_scale 必须在 (0, 1] 范围内，实际为 {scale}"
            )));
        }
        let target = (f64::from(width.min(height)) * scale).floor() as u32;
        if target == 0 {
            return Err(AppError::Validation(format!(
                "logo_scale={scale} 过小，logo 尺寸不足 1 像素"
            )));
        }
        let plate = target + target / 5;
        let x = (i64::from(width) - i64::from(plate)).div_euclid(2) + i64::from(plate / 10);
        let y = (i64::from(height) - i64::from(plate)).div_euclid(2);
        Ok(Self {
            target,
            plate,
            x,
            y,
        })
    }
}

/// 解码 logo 字节为 RGBA，宽高任一边超过 `max_dimension` 时拒绝解码。
pub fn decode_logo(bytes: &[u8], max_dimension: u32) -> Result<RgbaImage, AppError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError::LogoDecode(e.to_string()))?;
    let mut limits = Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);
    reader.limits(limits);
    reader
        .decode()
        .map(|img| img.to_rgba8())
        .map_err(|e| AppError::LogoDecode(e.to_string()))
}

/// 先固定放大 2 倍，再缩放到 `target × target`（均为 Lanczos3）。
fn resize_logo(logo: &RgbaImage, target: u32) -> RgbaImage {
    let (w, h) = logo.dimensions();
    let upscaled = imageops::resize(logo, w * 2, h * 2, FilterType::Lanczos3);
    imageops::resize(&upscaled, target, target, FilterType::Lanczos3)
}

/// 透明底板上画一个内切白色圆，并把 logo 居中贴上。
fn build_plate(logo: &RgbaImage, placement: &LogoPlacement) -> Result<RgbaImage, AppError> {
    let side = placement.plate;
    let mut pixmap = Pixmap::new(side, side)
        .ok_or_else(|| AppError::ImageRendererError(format!("无法创建 {side}x{side} logo 底板")))?;

    let r = side as f32 / 2.0;
    let circle = PathBuilder::from_circle(r, r, r)
        .ok_or_else(|| AppError::ImageRendererError("logo 底板圆形路径无效".to_string()))?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);

    // 边缘抗锯齿像素为半透明，需要还原为非预乘颜色
    let mut plate = RgbaImage::new(side, side);
    for (dst, src) in plate.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let offset = i64::from((side - placement.target) / 2);
    imageops::overlay(&mut plate, logo, offset, offset);
    Ok(plate)
}

/// 将 logo 叠加到成品图上。
pub fn overlay_logo(
    image: &mut RgbaImage,
    logo_bytes: &[u8],
    scale: f64,
    max_dimension: u32,
) -> Result<(), AppError> {
    let (width, height) = image.dimensions();
    let placement = LogoPlacement::compute(width, height, scale)?;
    let logo = decode_logo(logo_bytes, max_dimension)?;
    tracing::debug!(
        logo_width = logo.width(),
        logo_height = logo.height(),
        target = placement.target,
        plate = placement.plate,
        x = placement.x,
        y = placement.y,
        "叠加 logo"
    );
    let resized = resize_logo(&logo, placement.target);
    let plate = build_plate(&resized, &placement)?;
    imageops::overlay(image, &plate, placement.x, placement.y);
    Ok(())
}

/// logo 回源能力
pub trait LogoFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AppError>>;
}

/// 基于 reqwest 的 logo 回源实现（内部连接池复用）
#[derive(Debug, Clone)]
pub struct HttpLogoFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpLogoFetcher {
    pub fn new(timeout: Duration, max_bytes: usize, user_agent: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Internal(format!("构建 HTTP client 失败: {e}")))?;
        Ok(Self::with_client(client, max_bytes))
    }

    pub fn with_client(client: Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let mut response = self
            .client
            .get(url)
            .header(header::ACCEPT, "image/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Network(format!("logo 回源返回 HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(self.too_large());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn too_large(&self) -> AppError {
        AppError::Network(format!("logo 响应体超过 {} 字节上限", self.max_bytes))
    }
}

impl LogoFetcher for HttpLogoFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AppError>> {
        Box::pin(async move {
            let start = std::time::Instant::now();
            let result = self.fetch_bytes(url).await;
            match &result {
                Ok(bytes) => tracing::info!(
                    url,
                    bytes = bytes.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "logo 回源完成"
                ),
                Err(e) => tracing::warn!(url, error = %e, "logo 回源失败"),
            }
            result
        })
    }
}
