use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use crate::core::{ChunkedConfig, EndpointConfig, RecoveryConfig, Result, UploadError};

pub const DEFAULT_CONFIG_FILE: &str = "vidup.toml";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// 控制台页面地址，用来判断是否走同源代理
    pub location: Option<String>,
    pub auth_token: Option<String>,
    pub endpoint: EndpointConfig,
    pub upload: ChunkedConfig,
    pub recovery: RecoveryConfig,
}

impl Config {
    /// 读取配置文件，文件不存在时使用默认值
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)
            .map_err(|err| UploadError::config(err.to_string()))?;

        if config.upload.chunk_size == 0 {
            return Err(UploadError::config("upload.chunk_size must be greater than zero"));
        }

        Ok(config)
    }

    pub fn location_url(&self) -> Result<Option<Url>> {
        Ok(self.location.as_deref().map(Url::parse).transpose()?)
    }
}
