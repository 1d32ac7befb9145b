use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tracing::debug;
use url::Url;
use crate::core::{ChunkRequest, ChunkResponse, ChunkTransport, Result, TransportError, TransportResult};

/// 基于 reqwest 的传输层
///
/// 配置了 token 时每个上传请求都带 `Authorization: Bearer`。
/// 超时由上传引擎控制，这里不设置请求超时。
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vidup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| crate::core::UploadError::config(format!("failed to build http client: {err}")))?;

        Ok(Self::with_client(client, token))
    }

    pub fn with_client(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn build_form(request: ChunkRequest) -> TransportResult<Form> {
        let length = request.data.len() as u64;
        let part = Part::stream_with_length(Body::from(request.data), length)
            .file_name(request.original_name.clone())
            .mime_str(&request.media_type)
            .map_err(|err| TransportError::Request(format!("media type {:?}: {err}", request.media_type)))?;

        Ok(Form::new()
            .part("video", part)
            .text("chunk", request.index.to_string())
            .text("totalChunks", request.total_chunks.to_string())
            .text("originalname", request.original_name))
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn send_chunk(&self, url: &Url, request: ChunkRequest) -> TransportResult<ChunkResponse> {
        let index = request.index;
        let final_chunk = request.is_final();
        let form = Self::build_form(request)?;

        let mut builder = self.client.post(url.clone()).multipart(form);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(chunk = index, final_chunk, status, "chunk response");

        Ok(ChunkResponse { status, body })
    }

    async fn object_exists(&self, url: &Url) -> TransportResult<bool> {
        let response = self.client.head(url.clone()).send().await?;
        Ok(response.status().is_success())
    }
}
