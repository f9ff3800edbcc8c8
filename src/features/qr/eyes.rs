//! 定位点（eye）分色合成
//!
//! 每个定位点分为外环（7×7 去掉中心 3×3）与内芯（中心 3×3）两个区域。对每个 (位置, 环)：
//! 用定位点形状、单一前景色渲染该定位点窗口，再用单通道掩码把窗口像素合成到底图上。
//! 合成顺序固定为 右内、右外、左内、左外、下内、下外。

use image::{GrayImage, Luma, RgbaImage};

use super::color::Rgb;
use super::geometry::{PixelRect, QrGeometry};
use super::matrix::{FINDER_MODULES, QrMatrix};
use super::renderer::{self, Drawers, Palette};
use super::style::ModuleShape;
use crate::error::AppError;

/// 内芯相对定位点左上角的偏移与边长（模块）
const CORE_OFFSET: u32 = 2;
const CORE_MODULES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyePosition {
    TopRight,
    TopLeft,
    BottomLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeRing {
    Inner,
    Outer,
}

/// 固定合成顺序
pub const COMPOSITE_ORDER: [(EyePosition, EyeRing); 6] = [
    (EyePosition::TopRight, EyeRing::Inner),
    (EyePosition::TopRight, EyeRing::Outer),
    (EyePosition::TopLeft, EyeRing::Inner),
    (EyePosition::TopLeft, EyeRing::Outer),
    (EyePosition::BottomLeft, EyeRing::Inner),
    (EyePosition::BottomLeft, EyeRing::Outer),
];

/// 六个定位点环的颜色（right = 右上，left = 左上，bottom = 左下）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeColors {
    pub right_inner: Rgb,
    pub right_outer: Rgb,
    pub left_inner: Rgb,
    pub left_outer: Rgb,
    pub bottom_inner: Rgb,
    pub bottom_outer: Rgb,
}

impl Default for EyeColors {
    fn default() -> Self {
        Self {
            right_inner: Rgb::BLACK,
            right_outer: Rgb::BLACK,
            left_inner: Rgb::BLACK,
            left_outer: Rgb::BLACK,
            bottom_inner: Rgb::BLACK,
            bottom_outer: Rgb::BLACK,
        }
    }
}

impl EyeColors {
    pub fn get(&self, position: EyePosition, ring: EyeRing) -> Rgb {
        match (position, ring) {
            (EyePosition::TopRight, EyeRing::Inner) => self.right_inner,
            (EyePosition::TopRight, EyeRing::Outer) => self.right_outer,
            (EyePosition::TopLeft, EyeRing::Inner) => self.left_inner,
            (EyePosition::TopLeft, EyeRing::Outer) => self.left_outer,
            (EyePosition::BottomLeft, EyeRing::Inner) => self.bottom_inner,
            (EyePosition::BottomLeft, EyeRing::Outer) => self.bottom_outer,
        }
    }
}

/// 一次合成操作：某个定位点的某个环，用指定颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeLayer {
    pub position: EyePosition,
    pub ring: EyeRing,
    pub color: Rgb,
}

/// 按固定顺序展开六个合成层
pub fn ordered_layers(colors: &EyeColors) -> [EyeLayer; 6] {
    COMPOSITE_ORDER.map(|(position, ring)| EyeLayer {
        position,
        ring,
        color: colors.get(position, ring),
    })
}

/// 定位点左上角所在模块 (col, row)
fn anchor(position: EyePosition, modules: u32) -> (u32, u32) {
    let far = modules - FINDER_MODULES as u32;
    match position {
        EyePosition::TopLeft => (0, 0),
        EyePosition::TopRight => (far, 0),
        EyePosition::BottomLeft => (0, far),
    }
}

/// 定位点 7×7 区域的像素矩形（即该定位点的渲染窗口）
pub fn eye_window(geometry: &QrGeometry, position: EyePosition) -> PixelRect {
    let (col, row) = anchor(position, geometry.modules);
    let n = FINDER_MODULES as u32;
    geometry.module_rect(col, row, n, n)
}

/// 定位点中心 3×3 的像素矩形
fn core_rect(geometry: &QrGeometry, position: EyePosition) -> PixelRect {
    let (col, row) = anchor(position, geometry.modules);
    geometry.module_rect(
        col + CORE_OFFSET,
        row + CORE_OFFSET,
        CORE_MODULES,
        CORE_MODULES,
    )
}

/// 像素是否落在指定环内
pub fn ring_contains(
    geometry: &QrGeometry,
    position: EyePosition,
    ring: EyeRing,
    px: u32,
    py: u32,
) -> bool {
    let core = core_rect(geometry, position);
    match ring {
        EyeRing::Inner => core.contains(px, py),
        EyeRing::Outer => eye_window(geometry, position).contains(px, py) && !core.contains(px, py),
    }
}

/// 构建与最终图片同尺寸的单通道掩码：环内 255，环外 0。
pub fn build_mask(geometry: &QrGeometry, position: EyePosition, ring: EyeRing) -> GrayImage {
    let size = geometry.image_size();
    let mut mask = GrayImage::new(size, size);
    let window = eye_window(geometry, position);
    for py in window.y..window.bottom() {
        for px in window.x..window.right() {
            if ring_contains(geometry, position, ring, px, py) {
                mask.put_pixel(px, py, Luma([255]));
            }
        }
    }
    mask
}

/// 按掩码把 `source`（左上角位于 `origin`）合成到 `target` 上：
/// `out = source * m / 255 + target * (1 - m / 255)`。
pub fn composite_masked(
    target: &mut RgbaImage,
    source: &RgbaImage,
    origin: (u32, u32),
    mask: &GrayImage,
) {
    for (sx, sy, src) in source.enumerate_pixels() {
        let (tx, ty) = (origin.0 + sx, origin.1 + sy);
        if tx >= target.width() || ty >= target.height() {
            continue;
        }
        let m = u16::from(mask.get_pixel(tx, ty)[0]);
        if m == 0 {
            continue;
        }
        let dst = target.get_pixel_mut(tx, ty);
        if m == 255 {
            *dst = *src;
            continue;
        }
        for c in 0..4 {
            let blended = (u16::from(src[c]) * m + u16::from(dst[c]) * (255 - m) + 127) / 255;
            dst[c] = blended as u8;
        }
    }
}

/// 依次合成给定的定位点层。
///
/// `marker_shape` 只作用于定位点区域；窗口内其它模块按方块绘制（掩码不会采集到它们）。
pub fn composite_layers(
    base: &mut RgbaImage,
    matrix: &QrMatrix,
    geometry: &QrGeometry,
    marker_shape: ModuleShape,
    background: Rgb,
    layers: &[EyeLayer],
) -> Result<(), AppError> {
    let drawers = Drawers {
        module: ModuleShape::Square,
        eye: marker_shape,
    };
    for layer in layers {
        let window = eye_window(geometry, layer.position);
        let palette = Palette {
            foreground: layer.color,
            background,
        };
        let variant = renderer::render_window(matrix, geometry, drawers, palette, window)?;
        let mask = build_mask(geometry, layer.position, layer.ring);
        composite_masked(base, &variant, (window.x, window.y), &mask);
    }
    Ok(())
}

/// 按固定顺序把六个分色定位点合成到底图上。
pub fn composite_eyes(
    base: &mut RgbaImage,
    matrix: &QrMatrix,
    geometry: &QrGeometry,
    marker_shape: ModuleShape,
    background: Rgb,
    colors: &EyeColors,
) -> Result<(), AppError> {
    composite_layers(
        base,
        matrix,
        geometry,
        marker_shape,
        background,
        &ordered_layers(colors),
    )
}
