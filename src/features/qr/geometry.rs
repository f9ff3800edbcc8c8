use super::matrix::QrMatrix;

/// 像素矩形（半开区间：`[x, x + width) × [y, y + height)`）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// 模块坐标到像素坐标的映射：每个模块占 `box_size × box_size` 像素，四周留 `border` 个模块的静区。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrGeometry {
    /// 矩阵边长（模块数，不含静区）
    pub modules: u32,
    pub box_size: u32,
    pub border: u32,
}

impl QrGeometry {
    pub fn for_matrix(matrix: &QrMatrix, box_size: u32, border: u32) -> Self {
        Self {
            modules: matrix.width() as u32,
            box_size,
            border,
        }
    }

    /// 最终图片边长（像素）
    pub fn image_size(&self) -> u32 {
        (self.modules + 2 * self.border) * self.box_size
    }

    pub fn full_rect(&self) -> PixelRect {
        let size = self.image_size();
        PixelRect::new(0, 0, size, size)
    }

    /// 模块方块区域 `[col, col + cols) × [row, row + rows)` 对应的像素矩形
    pub fn module_rect(&self, col: u32, row: u32, cols: u32, rows: u32) -> PixelRect {
        PixelRect::new(
            (self.border + col) * self.box_size,
            (self.border + row) * self.box_size,
            cols * self.box_size,
            rows * self.box_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{PixelRect, QrGeometry};

    #[test]
    fn reference_geometry_matches_ten_pixel_boxes() {
        let g = QrGeometry {
            modules: 21,
            box_size: 10,
            border: 4,
        };
        assert_eq!(g.image_size(), 290);
        assert_eq!(g.module_rect(0, 0, 7, 7), PixelRect::new(40, 40, 70, 70));
        assert_eq!(g.module_rect(2, 2, 3, 3), PixelRect::new(60, 60, 30, 30));
    }

    #[test]
    fn rect_intersection_is_half_open() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 10, 10);
        let c = PixelRect::new(9, 9, 1, 1);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(a.contains(9, 9));
        assert!(!a.contains(10, 9));
    }
}
