use serde::{Deserialize, Serialize};
use url::Url;
use super::errors::{Result, UploadError};

/// 当前使用的上传端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Endpoint {
    /// 默认端点：生产环境下是同源代理，开发环境下是本地地址
    Primary,
    /// 代理网关失败后直连后端
    Direct,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Primary => write!(f, "primary"),
            Endpoint::Direct => write!(f, "direct"),
        }
    }
}

/// 端点选择配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// 命中该主机名时走同源代理
    pub production_host: String,
    /// 同源代理路径
    pub proxy_path: String,
    pub dev_url: String,
    pub direct_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            production_host: "teach.vidup.io".to_string(),
            proxy_path: "/api".to_string(),
            dev_url: "http://localhost:5000/api".to_string(),
            direct_url: "https://api.vidup.io/api".to_string(),
        }
    }
}

/// 解析好的上传地址，构建后只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    primary: Url,
    direct: Option<Url>,
}

impl EndpointSet {
    /// `primary` 与 `direct` 是接口根地址，上传地址为 `{base}/upload`
    pub fn new(primary: &str, direct: Option<&str>) -> Result<Self> {
        Ok(Self {
            primary: upload_url(Url::parse(primary)?)?,
            direct: direct.map(|d| upload_url(Url::parse(d)?)).transpose()?,
        })
    }

    /// 根据页面地址决定默认端点；只有生产主机才有直连备用端点
    pub fn resolve(config: &EndpointConfig, location: Option<&Url>) -> Result<Self> {
        match location {
            Some(location) if location.host_str() == Some(config.production_host.as_str()) => {
                let proxy = location.join(&config.proxy_path)?;
                Ok(Self {
                    primary: upload_url(proxy)?,
                    direct: Some(upload_url(Url::parse(&config.direct_url)?)?),
                })
            }
            _ => Self::new(&config.dev_url, None),
        }
    }

    pub fn url(&self, endpoint: Endpoint) -> Option<&Url> {
        match endpoint {
            Endpoint::Primary => Some(&self.primary),
            Endpoint::Direct => self.direct.as_ref(),
        }
    }

    pub fn primary(&self) -> &Url {
        &self.primary
    }

    pub fn has_direct(&self) -> bool {
        self.direct.is_some()
    }
}

fn upload_url(mut base: Url) -> Result<Url> {
    if base.cannot_be_a_base() {
        return Err(UploadError::config(format!("cannot use {} as an upload endpoint", base)));
    }
    if let Ok(mut segments) = base.path_segments_mut() {
        segments.pop_if_empty().push("upload");
    }
    Ok(base)
}
