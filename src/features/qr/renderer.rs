use image::RgbaImage;
use tiny_skia::{FillRule, Paint, Pixmap, Transform};

use super::color::Rgb;
use super::drawer::{Cell, Neighbors};
use super::geometry::{PixelRect, QrGeometry};
use super::matrix::QrMatrix;
use super::style::ModuleShape;
use crate::error::AppError;

/// 渲染使用的形状组合：定位点区域内用 `eye`，其余模块用 `module`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawers {
    pub module: ModuleShape,
    pub eye: ModuleShape,
}

/// 双色填充：深色模块用前景色，其余像素为背景色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Rgb,
    pub background: Rgb,
}

/// 渲染整张二维码。
pub fn render(
    matrix: &QrMatrix,
    geometry: &QrGeometry,
    drawers: Drawers,
    palette: Palette,
) -> Result<RgbaImage, AppError> {
    render_window(matrix, geometry, drawers, palette, geometry.full_rect())
}

/// 只渲染 `window` 覆盖的像素区域，输出图片尺寸等于 window 尺寸。
///
/// 与整图渲染后再裁剪的结果逐像素一致：与 window 不相交的模块直接跳过。
pub fn render_window(
    matrix: &QrMatrix,
    geometry: &QrGeometry,
    drawers: Drawers,
    palette: Palette,
    window: PixelRect,
) -> Result<RgbaImage, AppError> {
    let mut pixmap = Pixmap::new(window.width, window.height).ok_or_else(|| {
        AppError::ImageRendererError(format!(
            "无法创建 {}x{} 画布",
            window.width, window.height
        ))
    })?;
    pixmap.fill(palette.background.to_skia());

    let mut paint = Paint::default();
    paint.set_color(palette.foreground.to_skia());
    let transform = Transform::from_translate(-(window.x as f32), -(window.y as f32));

    let width = matrix.width();
    for row in 0..width {
        for col in 0..width {
            let (c, r) = (col as i64, row as i64);
            if !matrix.is_dark(c, r) {
                continue;
            }
            let rect = geometry.module_rect(col as u32, row as u32, 1, 1);
            if !rect.intersects(&window) {
                continue;
            }

            let shape = if matrix.is_eye_cell(col, row) {
                drawers.eye
            } else {
                drawers.module
            };
            let neighbors = Neighbors {
                north: matrix.is_dark(c, r - 1),
                south: matrix.is_dark(c, r + 1),
                east: matrix.is_dark(c + 1, r),
                west: matrix.is_dark(c - 1, r),
            };
            let cell = Cell {
                x: rect.x as f32,
                y: rect.y as f32,
                size: geometry.box_size as f32,
            };
            if let Some(path) = shape.outline(cell, neighbors) {
                paint.anti_alias = shape.anti_alias();
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
            }
        }
    }

    // 背景不透明，预乘与非预乘像素一致，可直接交给 image crate。
    RgbaImage::from_raw(window.width, window.height, pixmap.take()).ok_or_else(|| {
        AppError::ImageRendererError("画布像素数据长度与尺寸不符".to_string())
    })
}
