use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::features::qr::RenderSettings;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// 日志格式：full | compact
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
    fn default_format() -> String {
        "full".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// API 路由前缀（默认为空，即 `/generate_qr`）
    #[serde(default)]
    pub prefix: String,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    #[serde(default = "CorsConfig::default_allow_credentials")]
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        false
    }

    fn default_allow_credentials() -> bool {
        false
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Vec::new(),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            expose_headers: Vec::new(),
            allow_credentials: Self::default_allow_credentials(),
            max_age_secs: None,
        }
    }
}

/// 二维码渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// 每个模块的像素边长
    #[serde(default = "RenderConfig::default_box_size")]
    pub box_size: u32,
    /// 最大并发渲染数（0 表示按 CPU 核数）
    #[serde(default)]
    pub max_parallel: usize,
    /// JPEG 输出质量（1-100）
    #[serde(default = "RenderConfig::default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// PNG 编码优先速度（压缩率更低）
    #[serde(default)]
    pub optimize_speed: bool,
}

impl RenderConfig {
    fn default_box_size() -> u32 {
        10
    }
    fn default_jpeg_quality() -> u8 {
        85
    }

    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            box_size: self.box_size.max(1),
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
            optimize_speed: self.optimize_speed,
            ..RenderSettings::default()
        }
    }

    /// 实际并发渲染数
    pub fn parallelism(&self) -> usize {
        if self.max_parallel == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_parallel
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            box_size: Self::default_box_size(),
            max_parallel: 0,
            jpeg_quality: Self::default_jpeg_quality(),
            optimize_speed: false,
        }
    }
}

/// logo 回源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoConfig {
    /// 回源超时（秒）
    #[serde(default = "LogoConfig::default_timeout")]
    pub fetch_timeout_secs: u64,
    /// 响应体大小上限（字节）
    #[serde(default = "LogoConfig::default_max_bytes")]
    pub max_bytes: usize,
    /// 回源请求的 User-Agent
    #[serde(default = "LogoConfig::default_user_agent")]
    pub user_agent: String,
    /// 解码后允许的最大宽/高（像素）
    #[serde(default = "LogoConfig::default_max_dimension")]
    pub max_dimension: u32,
}

impl LogoConfig {
    fn default_timeout() -> u64 {
        10
    }
    fn default_max_bytes() -> usize {
        5 * 1024 * 1024
    }
    fn default_max_dimension() -> u32 {
        4096
    }
    fn default_user_agent() -> String {
        format!("qrstyle-backend/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: Self::default_timeout(),
            max_bytes: Self::default_max_bytes(),
            user_agent: Self::default_user_agent(),
            max_dimension: Self::default_max_dimension(),
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
///
/// 来源（后者覆盖前者）：内置默认值 → `config.toml`（可选）→ `APP_` 前缀环境变量。
/// 嵌套字段使用双下划线分隔，例如 `APP_RENDER__BOX_SIZE=12`。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub logo: LogoConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从默认路径与环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();
        tracing::info!("正在从 {:?} 加载配置文件（可选）", config_path);
        Self::load_from(&config_path, Self::env_source())
    }

    fn env_source() -> Environment {
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(path: &Path, env: Environment) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from(path).required(false))
            .add_source(env)
            .build()?;
        builder.try_deserialize()
    }

    /// 全局配置；未初始化时返回默认配置
    pub fn global() -> &'static AppConfig {
        CONFIG.get_or_init(AppConfig::default)
    }

    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 渲染参数（render 段 + logo 解码上限）
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            max_logo_dimension: self.logo.max_dimension.max(1),
            ..self.render.settings()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use config::{Environment, Map};
    use std::io::Write;

    fn empty_env() -> Environment {
        AppConfig::env_source().source(Some(Map::new()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = AppConfig::load_from(
            std::path::Path::new("/nonexistent/qrstyle/config.toml"),
            empty_env(),
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.api.prefix, "");
        assert_eq!(cfg.render.box_size, 10);
        assert_eq!(cfg.render.jpeg_quality, 85);
        assert_eq!(cfg.logo.fetch_timeout_secs, 10);
        assert_eq!(cfg.logo.max_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.render_settings().max_logo_dimension, 4096);
        assert!(!cfg.cors.enabled);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("qrstyle-config-{}.toml", uuid::Uuid::new_v4()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(
                f,
                "[server]\nport = 9001\n[render]\nbox_size = 4\noptimize_speed = true\n[logo]\nmax_bytes = 1024\nmax_dimension = 512"
            )
            .unwrap();
        }
        let cfg = AppConfig::load_from(&path, empty_env()).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(cfg.server.port, 9001);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.render.settings().box_size, 4);
        assert!(cfg.render.settings().optimize_speed);
        assert_eq!(cfg.logo.max_bytes, 1024);
        assert_eq!(cfg.render_settings().max_logo_dimension, 512);
        assert_eq!(cfg.render_settings().box_size, 4);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let mut env = config::Map::new();
        env.insert("APP_RENDER__BOX_SIZE".to_string(), "12".to_string());
        env.insert("APP_API__PREFIX".to_string(), "/api/v1".to_string());
        let cfg = AppConfig::load_from(
            std::path::Path::new("/nonexistent/qrstyle/config.toml"),
            AppConfig::env_source().source(Some(env)),
        )
        .unwrap();
        assert_eq!(cfg.render.box_size, 12);
        assert_eq!(cfg.api.prefix, "/api/v1");
    }

    #[test]
    fn zero_parallelism_uses_cpu_count() {
        let cfg = AppConfig::default();
        assert!(cfg.render.parallelism() >= 1);
    }
}
