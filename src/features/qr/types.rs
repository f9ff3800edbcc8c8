use serde::{Deserialize, Deserializer, Serialize, de};

/// 版本字段：整数 1-40，或字符串 `"auto"`（也接受数字字符串）
///
/// 整数值的小数（如 `5.0`）按整数处理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum VersionSpec {
    Number(i64),
    Decimal(f64),
    Text(String),
}

impl Default for VersionSpec {
    fn default() -> Self {
        VersionSpec::Text("auto".to_string())
    }
}

/// 二维码生成请求体
///
/// 除 `qr_code_text` 外的字段都有默认值；缺省的文本按空字符串处理。
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QrRequest {
    /// 要编码的文本
    #[schema(example = "https://example.com")]
    #[serde(default)]
    pub qr_code_text: String,
    /// 输出格式：PNG/JPEG/GIF/BMP/TIFF/WEBP/ICO（大小写不敏感，默认 PNG）
    #[schema(example = "PNG")]
    #[serde(default = "default_image_format")]
    pub image_format: String,
    /// 背景色（#rrggbb）
    #[schema(example = "#ffffff")]
    #[serde(default = "default_background")]
    pub background_color: String,
    /// 前景色（#rrggbb）
    #[schema(example = "#000000")]
    #[serde(default = "default_foreground")]
    pub foreground_color: String,
    /// 右上定位点内芯颜色
    #[serde(default = "default_foreground")]
    pub marker_right_inner_color: String,
    /// 右上定位点外环颜色
    #[serde(default = "default_foreground")]
    pub marker_right_outer_color: String,
    /// 左上定位点内芯颜色
    #[serde(default = "default_foreground")]
    pub marker_left_inner_color: String,
    /// 左上定位点外环颜色
    #[serde(default = "default_foreground")]
    pub marker_left_outer_color: String,
    /// 左下定位点内芯颜色
    #[serde(default = "default_foreground")]
    pub marker_bottom_inner_color: String,
    /// 左下定位点外环颜色
    #[serde(default = "default_foreground")]
    pub marker_bottom_outer_color: String,
    /// 定位点形状：square/circle/vertical-bars/rounded（未知值按 square 处理）
    #[schema(example = "square")]
    #[serde(default = "default_shape")]
    pub marker_shape: String,
    /// 数据模块形状：square/circle/vertical-bars/rounded（未知值按 square 处理）
    #[schema(example = "square")]
    #[serde(default = "default_shape")]
    pub module_shape: String,
    /// logo 图片地址，空字符串表示不加 logo
    #[serde(default)]
    pub logo_image_url: String,
    /// logo 边长占成品图短边的比例，(0, 1]；也接受数字字符串
    #[schema(example = 0.2)]
    #[serde(
        default = "default_logo_scale",
        deserialize_with = "deserialize_lenient_f64"
    )]
    pub logo_scale: f64,
    /// 纠错级别 L/M/Q/H（默认 H）
    #[schema(example = "H")]
    #[serde(default = "default_ec_level")]
    pub error_correction_level: String,
    /// 静区宽度（模块），仅在未提供 `border` 时生效
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_zone: Option<i64>,
    /// 边框宽度（模块，默认 4）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<i64>,
    /// 版本：1-40 或 "auto"（默认 auto）
    #[serde(default)]
    pub version: VersionSpec,
    /// 风格预设：rounded/thin/smooth/circles；其它值（默认 classic）不生效
    #[schema(example = "classic")]
    #[serde(default = "default_style")]
    pub style: String,
}

impl QrRequest {
    /// 仅指定文本、其余字段取默认值的请求
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            qr_code_text: text.into(),
            ..Self::default()
        }
    }

    pub fn has_logo(&self) -> bool {
        !self.logo_image_url.trim().is_empty()
    }
}

impl Default for QrRequest {
    fn default() -> Self {
        Self {
            qr_code_text: String::new(),
            image_format: default_image_format(),
            background_color: default_background(),
            foreground_color: default_foreground(),
            marker_right_inner_color: default_foreground(),
            marker_right_outer_color: default_foreground(),
            marker_left_inner_color: default_foreground(),
            marker_left_outer_color: default_foreground(),
            marker_bottom_inner_color: default_foreground(),
            marker_bottom_outer_color: default_foreground(),
            marker_shape: default_shape(),
            module_shape: default_shape(),
            logo_image_url: String::new(),
            logo_scale: default_logo_scale(),
            error_correction_level: default_ec_level(),
            quiet_zone: None,
            border: None,
            version: VersionSpec::default(),
            style: default_style(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// 数字或数字字符串
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(v) => Ok(v),
        NumberOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("期望数字，实际为 {s:?}"))),
    }
}

fn default_image_format() -> String {
    "PNG".to_string()
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_foreground() -> String {
    "#000000".to_string()
}

fn default_shape() -> String {
    "square".to_string()
}

fn default_logo_scale() -> f64 {
    0.2
}

fn default_ec_level() -> String {
    "H".to_string()
}

fn default_style() -> String {
    "classic".to_string()
}
