use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use super::logo::LogoFetcher;
use super::options::ResolvedOptions;
use super::pipeline::{self, RenderSettings, RenderedQr};
use super::types::QrRequest;
use crate::error::AppError;

/// 二维码渲染服务：校验参数 → 回源 logo（异步 I/O）→ 在阻塞线程池中渲染。
#[derive(Clone)]
pub struct QrRenderService {
    fetcher: Arc<dyn LogoFetcher>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    render_semaphore: Arc<Semaphore>,
    settings: RenderSettings,
}

impl QrRenderService {
    pub fn new(fetcher: Arc<dyn LogoFetcher>, max_parallel: usize, settings: RenderSettings) -> Self {
        Self {
            fetcher,
            render_semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
            settings,
        }
    }

    pub async fn render(&self, request: QrRequest) -> Result<RenderedQr, AppError> {
        // 参数错误在回源与渲染之前返回
        let opts = ResolvedOptions::from_request(&request)?;

        let logo = match opts.logo_url.as_deref() {
            Some(url) => Some(self.fetcher.fetch(url).await?),
            None => None,
        };

        let permits_avail = self.render_semaphore.available_permits();
        let t_wait = Instant::now();
        let _permit = self
            .render_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
        let wait = t_wait.elapsed();

        let t_render = Instant::now();
        let settings = self.settings;
        let rendered = tokio::task::spawn_blocking(move || {
            pipeline::render_resolved(&opts, logo.as_deref(), &settings)
        })
        .await
        .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))??;

        tracing::info!(
            permits_avail,
            wait_ms = wait.as_millis() as u64,
            render_ms = t_render.elapsed().as_millis() as u64,
            content_type = rendered.content_type,
            bytes = rendered.bytes.len(),
            width = rendered.width,
            "二维码渲染完成"
        );
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::QrRenderService;
    use crate::error::AppError;
    use crate::features::qr::logo::LogoFetcher;
    use crate::features::qr::pipeline::RenderSettings;
    use crate::features::qr::types::QrRequest;
    use futures_util::future::BoxFuture;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录调用次数、始终失败的回源实现
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl LogoFetcher for CountingFetcher {
        fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AppError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(AppError::Network("connection refused".into())) })
        }
    }

    fn service(fetcher: Arc<CountingFetcher>) -> QrRenderService {
        QrRenderService::new(fetcher, 2, RenderSettings::default())
    }

    #[tokio::test]
    async fn renders_without_touching_fetcher() {
        let fetcher = Arc::new(CountingFetcher::default());
        let out = service(fetcher.clone())
            .render(QrRequest::with_text("HELLO"))
            .await
            .unwrap();
        assert_eq!(out.content_type, "image/png");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_options_fail_before_fetching() {
        let fetcher = Arc::new(CountingFetcher::default());
        let mut req = QrRequest::with_text("HELLO");
        req.logo_image_url = "http://example.com/logo.png".into();
        req.foreground_color = "black".into();
        let err = service(fetcher.clone()).render(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_request() {
        let fetcher = Arc::new(CountingFetcher::default());
        let mut req = QrRequest::with_text("HELLO");
        req.logo_image_url = "http://example.com/logo.png".into();
        let err = service(fetcher.clone()).render(req).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
