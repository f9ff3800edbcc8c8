//! 模块/定位点形状与风格预设
//!
//! 风格预设是一张静态映射表：命中时同时覆盖 module_shape 与 marker_shape，未命中时保持显式字段不变。
//! 未知形状名统一回落为方块，不报错。

/// 单个模块（或定位点内模块）的绘制形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleShape {
    /// 填满整个格子的方块
    #[default]
    Square,
    /// 内切圆
    Circle,
    /// 竖条（宽度为格子的 80%，上下无相邻模块时端点圆角）
    VerticalBars,
    /// 圆角方块（仅对两侧都无相邻模块的角做圆角）
    Rounded,
}

impl ModuleShape {
    /// 按名称解析形状（大小写不敏感）；未知名称回落为 [`ModuleShape::Square`]。
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "circle" => ModuleShape::Circle,
            "vertical-bars" | "vertical bars" | "vertical_bars" | "verticalbars" => {
                ModuleShape::VerticalBars
            }
            "rounded" => ModuleShape::Rounded,
            "square" => ModuleShape::Square,
            other => {
                tracing::debug!(shape = other, "未知形状，回落为 square");
                ModuleShape::Square
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleShape::Square => "square",
            ModuleShape::Circle => "circle",
            ModuleShape::VerticalBars => "vertical-bars",
            ModuleShape::Rounded => "rounded",
        }
    }
}

/// 命名风格预设
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    Rounded,
    Thin,
    Smooth,
    Circles,
}

/// 风格预设 → (module_shape, marker_shape)
const PRESET_TABLE: [(StylePreset, &str, ModuleShape, ModuleShape); 4] = [
    (
        StylePreset::Rounded,
        "rounded",
        ModuleShape::Rounded,
        ModuleShape::Rounded,
    ),
    (
        StylePreset::Thin,
        "thin",
        ModuleShape::VerticalBars,
        ModuleShape::Square,
    ),
    (
        StylePreset::Smooth,
        "smooth",
        ModuleShape::Rounded,
        ModuleShape::Square,
    ),
    (
        StylePreset::Circles,
        "circles",
        ModuleShape::Circle,
        ModuleShape::Rounded,
    ),
];

impl StylePreset {
    /// 按名称查找预设；`classic` 等未登记名称返回 `None`。
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase();
        PRESET_TABLE
            .iter()
            .find(|(_, n, _, _)| *n == key)
            .map(|(p, _, _, _)| *p)
    }

    /// 预设对应的 (module_shape, marker_shape)
    pub fn shapes(self) -> (ModuleShape, ModuleShape) {
        PRESET_TABLE
            .iter()
            .find(|(p, _, _, _)| *p == self)
            .map(|(_, _, module, marker)| (*module, *marker))
            .unwrap_or_default()
    }
}

/// 解析后的形状组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedShapes {
    pub module: ModuleShape,
    pub marker: ModuleShape,
}

/// 根据风格预设与显式字段求出最终形状。
pub fn resolve_shapes(module_shape: &str, marker_shape: &str, style: &str) -> ResolvedShapes {
    match StylePreset::from_name(style) {
        Some(preset) => {
            let (module, marker) = preset.shapes();
            ResolvedShapes { module, marker }
        }
        None => ResolvedShapes {
            module: ModuleShape::from_name(module_shape),
            marker: ModuleShape::from_name(marker_shape),
        },
    }
}
