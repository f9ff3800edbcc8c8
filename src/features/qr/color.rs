use image::Rgba;
use tiny_skia::Color;

use crate::error::AppError;

/// 不透明 RGB 颜色（0-255）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.0, self.1, self.2, 255])
    }

    pub fn to_skia(self) -> Color {
        Color::from_rgba8(self.0, self.1, self.2, 255)
    }
}

/// 将 `#rrggbb` 解析为 RGB 三元组。
///
/// `#` 前缀可省略，大小写不敏感；其余任何形式（3 位简写、带 alpha、非十六进制字符）均视为非法输入。
pub fn hex_to_rgb(raw: &str) -> Result<Rgb, AppError> {
    let value = raw.trim();
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AppError::Validation(format!(
            "颜色格式无效: {raw:?}（应为 #rrggbb）"
        )));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|e| AppError::Validation(format!("颜色格式无效: {raw:?}: {e}")))
    };
    Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// 解析带字段名的颜色，错误信息中带上字段名便于调用方定位。
pub(crate) fn parse_color_field(field: &str, raw: &str) -> Result<Rgb, AppError> {
    hex_to_rgb(raw).map_err(|e| match e {
        AppError::Validation(msg) => AppError::Validation(format!("{field}: {msg}")),
        other => other,
    })
}
