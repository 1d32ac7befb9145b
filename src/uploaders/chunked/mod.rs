use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;
use crate::config::Config;
use crate::core::{
    ChunkInfo, ChunkRequest, ChunkTransport, ChunkedConfig, EndpointSet, RecoveryConfig, Result,
    TaskState, TransportError, UploadError, UploadId, UploadObserver, UploadState, UploadedFileInfo,
    VideoFile, plan_chunks,
};
use crate::protocol::{HttpTransport, wire};
use crate::utils::{PollPolicy, ProgressTracker, poll_until};

/// 分片上传器
///
/// 分片严格按顺序逐个发送，服务端按序号合并。每次调用都从第 0 片开始，
/// 各次上传之间不共享可变状态。
pub struct ChunkedUploader {
    transport: Arc<dyn ChunkTransport>,
    endpoints: EndpointSet,
    config: ChunkedConfig,
    recovery: RecoveryConfig,
}

impl ChunkedUploader {
    pub fn new(transport: Arc<dyn ChunkTransport>, endpoints: EndpointSet) -> Self {
        Self {
            transport,
            endpoints,
            config: ChunkedConfig::default(),
            recovery: RecoveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChunkedConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.recovery = recovery;
        self
    }

    /// 用配置文件构建，`location` 是当前页面地址，决定默认端点
    pub fn from_config(config: &Config, location: Option<&Url>) -> Result<Self> {
        let endpoints = EndpointSet::resolve(&config.endpoint, location)?;
        let transport = HttpTransport::new(config.auth_token.clone())?;

        Ok(Self::new(Arc::new(transport), endpoints)
            .with_config(config.upload.clone())
            .with_recovery(config.recovery.clone()))
    }

    pub fn endpoints(&self) -> &EndpointSet {
        &self.endpoints
    }

    /// 上传并回调：`on_complete` 或 `on_error` 恰好调用一次
    pub async fn upload_video(&self, file: &VideoFile, observer: &dyn UploadObserver) {
        match self.upload(file, observer).await {
            Ok(info) => observer.on_complete(&info),
            Err(err) => observer.on_error(&err),
        }
    }

    /// 在后台运行 `upload_video`
    pub fn spawn_upload(
        self: Arc<Self>,
        file: VideoFile,
        observer: Arc<dyn UploadObserver>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.upload_video(&file, observer.as_ref()).await;
        })
    }

    /// 上传文件，只回调进度，结果通过返回值给出
    pub async fn upload(&self, file: &VideoFile, observer: &dyn UploadObserver) -> Result<UploadedFileInfo> {
        let upload_id = UploadId::new();
        let span = info_span!("upload", %upload_id, file = %file.name);

        self.run(file, observer).instrument(span).await
    }

    async fn run(&self, file: &VideoFile, observer: &dyn UploadObserver) -> Result<UploadedFileInfo> {
        let chunks = plan_chunks(file.size, self.config.chunk_size);
        let mut task = TaskState::new(chunks.len(), self.endpoints.has_direct());
        let mut progress = ProgressTracker::new(file.size);
        let mut state = UploadState::Idle;

        info!(size = file.size, chunks = chunks.len(), endpoint = %self.endpoints.primary(), "starting upload");

        loop {
            state = match state {
                UploadState::Idle => task.start(),
                UploadState::SendingChunk { index } => {
                    self.exchange(file, &chunks[index], &mut task).await
                }
                UploadState::Retrying { index } => {
                    warn!(chunk = index, "proxy gateway failed, retrying on direct endpoint");
                    self.exchange(file, &chunks[index], &mut task).await
                }
                UploadState::ChunkAcked { index, response } => {
                    observer.on_progress(&progress.acknowledge(chunks[index].size as u64));

                    if task.is_final(index) {
                        match wire::parse_completion(&response, file) {
                            Ok(info) => UploadState::Completed(Box::new(info)),
                            Err(err) => UploadState::Failed(err),
                        }
                    } else {
                        task.next_chunk(index)
                    }
                }
                UploadState::Recovering { cause } => match self.recover(file, &cause).await {
                    Ok(info) => {
                        observer.on_progress(&progress.complete());
                        UploadState::Completed(Box::new(info))
                    }
                    Err(err) => UploadState::Failed(err),
                },
                UploadState::Completed(info) => {
                    info!(url = %info.video_url, using_fallback = info.using_fallback, "upload completed");
                    return Ok(*info);
                }
                UploadState::Failed(err) => {
                    warn!(error = %err, "upload failed");
                    return Err(err);
                }
            };
            debug!(state = state.name(), terminal = state.is_terminal(), "transition");
        }
    }

    /// 发送一个分片，超时后丢弃请求
    async fn exchange(&self, file: &VideoFile, chunk: &ChunkInfo, task: &mut TaskState) -> UploadState {
        let data = match file.read_chunk(chunk).await {
            Ok(data) => data,
            Err(err) => return UploadState::Failed(err),
        };
        let Some(url) = self.endpoints.url(task.endpoint) else {
            return UploadState::Failed(UploadError::config(format!("no {} endpoint configured", task.endpoint)));
        };

        let timeout = if task.is_final(chunk.index) {
            self.config.final_chunk_timeout
        } else {
            self.config.chunk_timeout
        };
        let request = ChunkRequest {
            data,
            index: chunk.index,
            total_chunks: task.total_chunks,
            original_name: file.name.clone(),
            media_type: file.media_type.clone(),
        };

        debug!(chunk = chunk.index, bytes = chunk.size, endpoint = %task.endpoint, "sending chunk");
        let outcome = match tokio::time::timeout(timeout, self.transport.send_chunk(url, request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout),
        };

        task.on_exchange(chunk.index, outcome, timeout)
    }

    /// 最后一个分片没有响应时，轮询对象存储确认文件是否已经落地
    async fn recover(&self, file: &VideoFile, cause: &TransportError) -> Result<UploadedFileInfo> {
        let url = wire::storage_object_url(&self.recovery.storage_base, &self.recovery.bucket, &file.name)?;
        let policy = PollPolicy::new(self.recovery.max_attempts, self.recovery.poll_interval);
        let probe_timeout = self.recovery.poll_interval.max(Duration::from_secs(1));

        warn!(%cause, %url, window_secs = policy.window().as_secs(), "final chunk response lost, checking storage");

        let found = poll_until(policy, |attempt| {
            let url = &url;
            async move {
                match tokio::time::timeout(probe_timeout, self.transport.object_exists(url)).await {
                    Ok(Ok(exists)) => exists,
                    Ok(Err(err)) => {
                        debug!(attempt, error = %err, "storage check failed");
                        false
                    }
                    Err(_) => {
                        debug!(attempt, "storage check timed out");
                        false
                    }
                }
            }
        })
        .await;

        match found {
            Some(attempt) => {
                info!(attempt, "upload confirmed in storage");
                Ok(wire::recovered_file_info(file, &url))
            }
            None => Err(UploadError::RecoveryExhausted {
                url: url.to_string(),
                attempts: policy.max_attempts,
            }),
        }
    }
}
