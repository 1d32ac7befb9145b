use std::time::Duration;
use super::endpoint::Endpoint;
use super::errors::{TransportError, TransportResult, UploadError};
use super::types::{ChunkResponse, UploadedFileInfo};
use crate::protocol::wire;

/// 上传状态机
///
/// ```text
/// Idle -> SendingChunk(i) -> ChunkAcked(i) | Retrying(i) | Recovering | Failed | Completed
/// ```
#[derive(Debug)]
pub enum UploadState {
    Idle,
    SendingChunk { index: usize },
    ChunkAcked { index: usize, response: ChunkResponse },
    /// 已切换到直连端点，重发同一个分片
    Retrying { index: usize },
    /// 最后一个分片没有拿到响应，去对象存储确认
    Recovering { cause: TransportError },
    Failed(UploadError),
    Completed(Box<UploadedFileInfo>),
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::SendingChunk { .. } => "sending_chunk",
            UploadState::ChunkAcked { .. } => "chunk_acked",
            UploadState::Retrying { .. } => "retrying",
            UploadState::Recovering { .. } => "recovering",
            UploadState::Failed(_) => "failed",
            UploadState::Completed(_) => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Failed(_) | UploadState::Completed(_))
    }
}

/// 单个任务随状态迁移携带的可变状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub endpoint: Endpoint,
    /// 只能从主端点切到直连一次，不会切回
    pub has_switched_endpoint: bool,
    /// 是否配置了直连端点
    pub direct_available: bool,
    pub total_chunks: usize,
}

impl TaskState {
    pub fn new(total_chunks: usize, direct_available: bool) -> Self {
        Self {
            endpoint: Endpoint::Primary,
            has_switched_endpoint: false,
            direct_available,
            total_chunks,
        }
    }

    pub fn is_final(&self, index: usize) -> bool {
        index + 1 == self.total_chunks
    }

    pub fn start(&self) -> UploadState {
        if self.total_chunks == 0 {
            UploadState::Failed(UploadError::validation("File is empty"))
        } else {
            UploadState::SendingChunk { index: 0 }
        }
    }

    /// 一次分片交换结束后的迁移
    pub fn on_exchange(
        &mut self,
        index: usize,
        outcome: TransportResult<ChunkResponse>,
        timeout: Duration,
    ) -> UploadState {
        match outcome {
            Ok(response) if response.is_success() => UploadState::ChunkAcked { index, response },
            Ok(response) => {
                if self.should_switch(response.status) {
                    self.endpoint = Endpoint::Direct;
                    self.has_switched_endpoint = true;
                    UploadState::Retrying { index }
                } else {
                    UploadState::Failed(UploadError::ChunkUpload {
                        index,
                        status: response.status,
                        message: wire::error_message(&response),
                    })
                }
            }
            Err(TransportError::Request(message)) => UploadState::Failed(UploadError::InvalidRequest { index, message }),
            // 服务端可能已经在合并，连接却被代理或超时断开
            Err(cause) if self.is_final(index) => UploadState::Recovering { cause },
            Err(TransportError::Timeout) => UploadState::Failed(UploadError::TransferTimeout { index, timeout }),
            Err(TransportError::Network(message)) => UploadState::Failed(UploadError::Transport { index, message }),
        }
    }

    /// 非最后分片确认后进入下一片
    pub fn next_chunk(&self, index: usize) -> UploadState {
        UploadState::SendingChunk { index: index + 1 }
    }

    fn should_switch(&self, status: u16) -> bool {
        !self.has_switched_endpoint
            && self.direct_available
            && self.endpoint == Endpoint::Primary
            && matches!(status, 502 | 504)
    }
}
