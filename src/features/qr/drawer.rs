//! 单个模块的矢量轮廓
//!
//! 每种形状在 `box_size` 的格子内生成一个 tiny-skia 路径，由渲染器统一填充。
//! 圆角与竖条形状会参考上下左右相邻模块，使相邻模块连成一体。

use tiny_skia::{Path, PathBuilder, Rect};

use super::style::ModuleShape;

/// 四分之一圆弧的三次贝塞尔控制点系数
const KAPPA: f32 = 0.552_284_8;

/// 竖条宽度占格子宽度的比例
const VERTICAL_BAR_WIDTH: f32 = 0.8;

/// 当前模块上下左右四个方向是否有深色模块
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

/// 模块格子（像素坐标，左上角 + 边长）
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl ModuleShape {
    /// 方块形状不需要抗锯齿（边缘恰好落在像素边界上）
    pub fn anti_alias(&self) -> bool {
        !matches!(self, ModuleShape::Square)
    }

    /// 生成深色模块的轮廓路径
    pub fn outline(&self, cell: Cell, neighbors: Neighbors) -> Option<Path> {
        match self {
            ModuleShape::Square => {
                Rect::from_xywh(cell.x, cell.y, cell.size, cell.size).map(PathBuilder::from_rect)
            }
            ModuleShape::Circle => {
                let r = cell.size / 2.0;
                PathBuilder::from_circle(cell.x + r, cell.y + r, r)
            }
            ModuleShape::Rounded => rounded_outline(cell, neighbors),
            ModuleShape::VerticalBars => vertical_bar_outline(cell, neighbors),
        }
    }
}

/// 圆角方块：某个角两侧都没有相邻模块时才做圆角，半径为半个格子。
fn rounded_outline(cell: Cell, n: Neighbors) -> Option<Path> {
    let Cell { x, y, size: s } = cell;
    let r = s / 2.0;
    let k = r * KAPPA;

    let nw = !n.north && !n.west;
    let ne = !n.north && !n.east;
    let se = !n.south && !n.east;
    let sw = !n.south && !n.west;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);

    if ne {
        pb.line_to(x + s - r, y);
        pb.cubic_to(x + s - r + k, y, x + s, y + r - k, x + s, y + r);
    } else {
        pb.line_to(x + s, y);
        pb.line_to(x + s, y + r);
    }

    if se {
        pb.line_to(x + s, y + s - r);
        pb.cubic_to(x + s, y + s - r + k, x + s - r + k, y + s, x + s - r, y + s);
    } else {
        pb.line_to(x + s, y + s);
        pb.line_to(x + s - r, y + s);
    }

    if sw {
        pb.line_to(x + r, y + s);
        pb.cubic_to(x + r - k, y + s, x, y + s - r + k, x, y + s - r);
    } else {
        pb.line_to(x, y + s);
        pb.line_to(x, y + s - r);
    }

    if nw {
        pb.line_to(x, y + r);
        pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    } else {
        pb.line_to(x, y);
    }

    pb.close();
    pb.finish()
}

/// 竖条：水平方向收窄到 80% 居中，纵向铺满格子；上/下无相邻模块时对应端点为半圆。
fn vertical_bar_outline(cell: Cell, n: Neighbors) -> Option<Path> {
    let w = cell.size * VERTICAL_BAR_WIDTH;
    let x0 = cell.x + (cell.size - w) / 2.0;
    let y0 = cell.y;
    let y1 = cell.y + cell.size;
    let r = w / 2.0;
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    if n.north {
        pb.move_to(x0, y0);
        pb.line_to(x0 + w, y0);
    } else {
        pb.move_to(x0, y0 + r);
        pb.cubic_to(x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0);
        pb.cubic_to(x0 + r + k, y0, x0 + w, y0 + r - k, x0 + w, y0 + r);
    }

    if n.south {
        pb.line_to(x0 + w, y1);
        pb.line_to(x0, y1);
    } else {
        pb.line_to(x0 + w, y1 - r);
        pb.cubic_to(x0 + w, y1 - r + k, x0 + r + k, y1, x0 + r, y1);
        pb.cubic_to(x0 + r - k, y1, x0, y1 - r + k, x0, y1 - r);
    }

    pb.close();
    pb.finish()
}
