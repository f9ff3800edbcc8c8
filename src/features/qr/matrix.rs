use qrcode::{Color, EcLevel, QrCode, Version};

use crate::error::AppError;

/// 定位点（finder pattern）边长，单位：模块
pub const FINDER_MODULES: usize = 7;

/// 二维码版本选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrVersion {
    /// 选择能容纳数据的最小版本
    #[default]
    Auto,
    /// 固定版本（1-40），容量不足时报错而不是自动升级
    Fixed(u8),
}

impl QrVersion {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 40;

    /// 校验原始版本号并构造 [`QrVersion::Fixed`]。
    pub fn fixed(raw: i64) -> Result<Self, AppError> {
        if !(Self::MIN..=Self::MAX).contains(&raw) {
            return Err(AppError::Validation(format!(
                "version 必须在 {}-{} 范围内，实际为 {raw}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(QrVersion::Fixed(raw as u8))
    }
}

/// 解析纠错级别（L/M/Q/H，大小写不敏感）；无法识别时回落为 H。
pub fn parse_ec_level(raw: &str) -> EcLevel {
    match raw.trim().to_ascii_uppercase().as_str() {
        "L" => EcLevel::L,
        "M" => EcLevel::M,
        "Q" => EcLevel::Q,
        "H" => EcLevel::H,
        other => {
            tracing::debug!(level = other, "未知纠错级别，回落为 H");
            EcLevel::H
        }
    }
}

/// 二维码模块矩阵（不含静区），创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    version: i16,
    dark: Vec<bool>,
}

impl QrMatrix {
    /// 按给定版本与纠错级别编码文本。
    pub fn encode(text: &str, version: QrVersion, ec_level: EcLevel) -> Result<Self, AppError> {
        let code = match version {
            QrVersion::Auto => QrCode::with_error_correction_level(text.as_bytes(), ec_level)?,
            QrVersion::Fixed(v) => {
                QrCode::with_version(text.as_bytes(), Version::Normal(i16::from(v)), ec_level)?
            }
        };
        let version = match code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        };
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self {
            width: code.width(),
            version,
            dark,
        })
    }

    /// 边长（模块数），等于 `version * 4 + 17`
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn version(&self) -> i16 {
        self.version
    }

    /// 指定模块是否为深色；越界坐标视为浅色，便于邻域判断。
    pub fn is_dark(&self, col: i64, row: i64) -> bool {
        let w = self.width as i64;
        if col < 0 || row < 0 || col >= w || row >= w {
            return false;
        }
        self.dark[(row * w + col) as usize]
    }

    /// 模块是否位于三个定位点的 7×7 区域内
    pub fn is_eye_cell(&self, col: usize, row: usize) -> bool {
        let far = self.width.saturating_sub(FINDER_MODULES);
        (row < FINDER_MODULES && col < FINDER_MODULES)
            || (row < FINDER_MODULES && col >= far)
            || (row >= far && col < FINDER_MODULES)
    }
}
