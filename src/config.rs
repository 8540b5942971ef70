use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Mojang 用户名 → UUID 查询接口
pub const DEFAULT_USERNAME_LOOKUP_URL: &str = "https://api.mojang.com/users/profiles/minecraft/";
/// Mojang 会话服务器档案接口（UUID → 贴图描述）
pub const DEFAULT_SESSION_PROFILE_URL: &str =
    "https://sessionserver.mojang.com/session/minecraft/profile/";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（EnvFilter 语法，RUST_LOG 优先）
    pub level: String,
    /// 日志格式：full | compact
    pub format: String,
}

/// 上游服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 用户名查询基地址，用户名作为最后一个路径段拼接
    #[serde(default = "UpstreamConfig::default_username_lookup_url")]
    pub username_lookup_url: String,
    /// 档案查询基地址，UUID 作为最后一个路径段拼接
    #[serde(default = "UpstreamConfig::default_session_profile_url")]
    pub session_profile_url: String,
    /// 单次外呼总超时（秒）
    #[serde(default = "UpstreamConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    /// 建连超时（秒）
    #[serde(default = "UpstreamConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// 外呼 User-Agent
    #[serde(default = "UpstreamConfig::default_user_agent")]
    pub user_agent: String,
    /// 皮肤贴图响应体上限（字节），超过即按下载失败处理
    #[serde(default = "UpstreamConfig::default_max_texture_bytes")]
    pub max_texture_bytes: u64,
}

impl UpstreamConfig {
    fn default_username_lookup_url() -> String {
        DEFAULT_USERNAME_LOOKUP_URL.to_string()
    }
    fn default_session_profile_url() -> String {
        DEFAULT_SESSION_PROFILE_URL.to_string()
    }
    fn default_timeout_secs() -> u64 {
        10
    }
    fn default_connect_timeout_secs() -> u64 {
        5
    }
    fn default_user_agent() -> String {
        format!("skin-favicon/{}", env!("CARGO_PKG_VERSION"))
    }
    fn default_max_texture_bytes() -> u64 {
        4 * 1024 * 1024
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            username_lookup_url: Self::default_username_lookup_url(),
            session_profile_url: Self::default_session_profile_url(),
            timeout_secs: Self::default_timeout_secs(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
            user_agent: Self::default_user_agent(),
            max_texture_bytes: Self::default_max_texture_bytes(),
        }
    }
}

/// 头像输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceConfig {
    /// 未传 `size` 时的默认边长
    #[serde(default = "FaceConfig::default_size")]
    pub default_size: u32,
    /// 固定边长：设置后忽略 `size` 参数（精简部署形态使用 64）
    #[serde(default)]
    pub fixed_size: Option<u32>,
    /// HTTP 边界允许的最大边长（0=不限制）
    #[serde(default = "FaceConfig::default_max_size")]
    pub max_size: u32,
}

impl FaceConfig {
    fn default_size() -> u32 {
        256
    }
    fn default_max_size() -> u32 {
        4096
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            default_size: Self::default_size(),
            fixed_size: None,
            max_size: Self::default_max_size(),
        }
    }
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
    /// 暴露的响应头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        false
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Vec::new(),
            allowed_methods: Vec::new(),
            expose_headers: Vec::new(),
            max_age_secs: None,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 收到退出信号后等待在途请求完成的最长时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout_secs() -> u64 {
        15
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// 上游服务配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 头像输出配置
    #[serde(default)]
    pub face: FaceConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 加载配置：内置默认值 → 可选的配置文件 → 环境变量覆盖。
    ///
    /// 环境变量以 `APP_` 为前缀、`__` 分隔层级，例如 `APP_FACE__DEFAULT_SIZE=64`。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();
        let path_str = config_path.to_str().ok_or_else(|| {
            ConfigError::Message(format!("配置路径不是有效 UTF-8: {config_path:?}"))
        })?;

        let builder = ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&Self::default())?)
            // 文件可缺省，仅用默认值 + 环境变量也能启动
            .add_source(File::with_name(path_str).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 获取配置文件路径（`APP_CONFIG` 可覆盖，默认 `config.toml`）
    fn get_config_path() -> PathBuf {
        std::env::var_os("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 启动期校验：尽早暴露会让每个请求都失败的配置。
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, url) in [
            (
                "upstream.username_lookup_url",
                &self.upstream.username_lookup_url,
            ),
            (
                "upstream.session_profile_url",
                &self.upstream.session_profile_url,
            ),
        ] {
            reqwest::Url::parse(url)
                .map_err(|e| ConfigError::Message(format!("{key} 不是有效 URL ({url}): {e}")))?;
        }
        if self.upstream.timeout_secs == 0 || self.upstream.connect_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "upstream.timeout_secs / connect_timeout_secs 必须大于 0".to_string(),
            ));
        }
        if self.upstream.max_texture_bytes == 0 {
            return Err(ConfigError::Message(
                "upstream.max_texture_bytes 必须大于 0".to_string(),
            ));
        }
        if self.face.default_size == 0 || self.face.fixed_size == Some(0) {
            return Err(ConfigError::Message(
                "face.default_size / fixed_size 必须大于 0".to_string(),
            ));
        }
        // 默认值与固定值同样受 max_size 约束，否则上限只对显式 size 生效
        let max = self.face.max_size;
        if max != 0 {
            for (key, size) in [
                ("face.default_size", Some(self.face.default_size)),
                ("face.fixed_size", self.face.fixed_size),
            ] {
                if let Some(size) = size.filter(|s| *s > max) {
                    return Err(ConfigError::Message(format!(
                        "{key} ({size}) 不能超过 face.max_size ({max})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3939,
            },
            logging: LoggingConfig {
                level: "skin_favicon=info,tower_http=info".to_string(),
                format: "full".to_string(),
            },
            upstream: UpstreamConfig::default(),
            face: FaceConfig::default(),
            cors: CorsConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.face.default_size, 256);
        assert_eq!(cfg.face.fixed_size, None);
        assert_eq!(cfg.server_addr(), "0.0.0.0:3939");
    }

    #[test]
    fn validate_rejects_bad_upstream_url() {
        let mut cfg = AppConfig::default();
        cfg.upstream.session_profile_url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_sizes_and_timeouts() {
        let mut cfg = AppConfig::default();
        cfg.face.fixed_size = Some(0);
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.upstream.timeout_secs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.upstream.max_texture_bytes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_applies_max_size_to_configured_sizes() {
        let mut cfg = AppConfig::default();
        cfg.face.max_size = 128;
        cfg.face.default_size = 256;
        assert!(cfg.validate().is_err());

        cfg.face.default_size = 64;
        cfg.face.fixed_size = Some(512);
        assert!(cfg.validate().is_err());

        cfg.face.fixed_size = Some(128);
        assert!(cfg.validate().is_ok());

        // 0 表示不限制
        cfg.face.max_size = 0;
        cfg.face.default_size = 100_000;
        assert!(cfg.validate().is_ok());
    }
}
