use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::qr::{HttpLogoFetcher, LogoFetcher, QrRenderService};

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub qr_service: Arc<QrRenderService>,
}

impl AppState {
    pub fn new(qr_service: QrRenderService) -> Self {
        Self {
            qr_service: Arc::new(qr_service),
        }
    }

    /// 按配置构建生产状态（reqwest 回源 + CPU 核数并发）
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let fetcher = HttpLogoFetcher::new(
            config.logo.fetch_timeout(),
            config.logo.max_bytes,
            &config.logo.user_agent,
        )?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// 使用指定的回源实现构建状态（测试中注入假实现）
    pub fn with_fetcher(config: &AppConfig, fetcher: Arc<dyn LogoFetcher>) -> Self {
        Self::new(QrRenderService::new(
            fetcher,
            config.render.parallelism(),
            config.render_settings(),
        ))
    }
}
