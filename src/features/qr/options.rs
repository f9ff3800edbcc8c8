use qrcode::EcLevel;

use super::color::{Rgb, parse_color_field};
use super::encoder::OutputFormat;
use super::eyes::EyeColors;
use super::matrix::{QrVersion, parse_ec_level};
use super::style::{ResolvedShapes, resolve_shapes};
use super::types::{QrRequest, VersionSpec};
use crate::error::AppError;

/// 默认边框宽度（模块）
pub const DEFAULT_BORDER: u32 = 4;

/// 边框宽度上限（模块），防止超大画布
pub const MAX_BORDER: u32 = 64;

/// 校验并解析后的请求参数；构造成功即保证后续渲染不会因参数问题失败
/// （数据容量、logo 内容除外）。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub text: String,
    pub format: OutputFormat,
    pub background: Rgb,
    pub foreground: Rgb,
    pub eye_colors: EyeColors,
    pub shapes: ResolvedShapes,
    pub ec_level: EcLevel,
    pub version: QrVersion,
    pub border: u32,
    pub logo_scale: f64,
    /// 去除首尾空白后的 logo 地址；`None` 表示不加 logo
    pub logo_url: Option<String>,
}

impl ResolvedOptions {
    pub fn from_request(req: &QrRequest) -> Result<Self, AppError> {
        let format = OutputFormat::parse(&req.image_format)?;

        let background = parse_color_field("background_color", &req.background_color)?;
        let foreground = parse_color_field("foreground_color", &req.foreground_color)?;
        let eye_colors = EyeColors {
            right_inner: parse_color_field(
                "marker_right_inner_color",
                &req.marker_right_inner_color,
            )?,
            right_outer: parse_color_field(
                "marker_right_outer_color",
                &req.marker_right_outer_color,
            )?,
            left_inner: parse_color_field("marker_left_inner_color", &req.marker_left_inner_color)?,
            left_outer: parse_color_field("marker_left_outer_color", &req.marker_left_outer_color)?,
            bottom_inner: parse_color_field(
                "marker_bottom_inner_color",
                &req.marker_bottom_inner_color,
            )?,
            bottom_outer: parse_color_field(
                "marker_bottom_outer_color",
                &req.marker_bottom_outer_color,
            )?,
        };

        let shapes = resolve_shapes(&req.module_shape, &req.marker_shape, &req.style);
        let ec_level = parse_ec_level(&req.error_correction_level);
        let version = parse_version(&req.version)?;
        let border = resolve_border(req.border, req.quiet_zone)?;

        let logo_url = Some(req.logo_image_url.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        if logo_url.is_some() && !(req.logo_scale > 0.0 && req.logo_scale <= 1.0) {
            return Err(AppError::Validation(format!(
                "logo_scale 必须在 (0, 1] 范围内，实际为 {}",
                req.logo_scale
            )));
        }

        Ok(Self {
            text: req.qr_code_text.clone(),
            format,
            background,
            foreground,
            eye_colors,
            shapes,
            ec_level,
            version,
            border,
            logo_scale: req.logo_scale,
            logo_url,
        })
    }
}

fn parse_version(spec: &VersionSpec) -> Result<QrVersion, AppError> {
    match spec {
        VersionSpec::Number(v) => QrVersion::fixed(*v),
        VersionSpec::Decimal(v) => {
            if v.is_finite() && v.fract() == 0.0 {
                QrVersion::fixed(*v as i64)
            } else {
                Err(AppError::Validation(format!(
                    "version 必须为 1-40 的整数或 \"auto\"，实际为 {v}"
                )))
            }
        }
        VersionSpec::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("auto") {
                return Ok(QrVersion::Auto);
            }
            let v = s.parse::<i64>().map_err(|_| {
                AppError::Validation(format!("version 必须为 1-40 或 \"auto\"，实际为 {s:?}"))
            })?;
            QrVersion::fixed(v)
        }
    }
}

/// `border` 优先，其次 `quiet_zone`，都缺省时为 4。
fn resolve_border(border: Option<i64>, quiet_zone: Option<i64>) -> Result<u32, AppError> {
    let Some(raw) = border.or(quiet_zone) else {
        return Ok(DEFAULT_BORDER);
    };
    u32::try_from(raw)
        .ok()
        .filter(|b| *b <= MAX_BORDER)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "border 必须在 0-{MAX_BORDER} 范围内，实际为 {raw}"
            ))
        })
}
