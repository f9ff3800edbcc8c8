use qrstyle_backend::app::build_router;
use qrstyle_backend::config::{AppConfig, LoggingConfig};
use qrstyle_backend::state::AppState;
use qrstyle_backend::ShutdownManager;
use tracing_subscriber::EnvFilter;

/// 初始化日志：RUST_LOG 优先，否则使用配置中的级别。
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "qrstyle_backend={level},tower_http={level}",
            level = logging.level
        ))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    // 配置需要先于日志加载，加载失败时只能直接输出到 stderr
    if let Err(e) = AppConfig::init_global() {
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();
    init_tracing(&config.logging);

    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let state = match AppState::from_config(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("应用状态初始化失败: {}", e);
            std::process::exit(1);
        }
    };
    let app = build_router(config, state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    let prefix = config.api.prefix.trim_end_matches('/');
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Generate: POST http://{}{}/generate_qr", addr, prefix);
    tracing::info!(
        box_size = config.render.box_size,
        max_parallel = config.render.parallelism(),
        logo_timeout_secs = config.logo.fetch_timeout_secs,
        logo_max_bytes = config.logo.max_bytes,
        "渲染配置"
    );

    let shutdown_timeout = config.shutdown.timeout_duration();
    let signal_manager = shutdown_manager.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = signal_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    });

    // 收到退出信号后，最多再等待 shutdown.timeout_secs 让进行中的请求完成
    let result = tokio::select! {
        r = server => r,
        _ = async {
            shutdown_manager.wait_for_shutdown().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!("优雅退出超时（{:?}），强制退出", shutdown_timeout);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }
    tracing::info!("服务器已优雅关闭");
}
