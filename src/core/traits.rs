use async_trait::async_trait;
use url::Url;
use super::errors::{TransportResult, UploadError};
use super::types::{ChunkRequest, ChunkResponse, UploadProgress, UploadedFileInfo};

/// 传输层 - 上传引擎只通过这个接口访问网络
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    /// 发送一个分片，拿到任何 HTTP 状态码都算成功返回
    async fn send_chunk(&self, url: &Url, request: ChunkRequest) -> TransportResult<ChunkResponse>;

    /// HEAD 检查对象存储中的文件是否存在
    async fn object_exists(&self, url: &Url) -> TransportResult<bool>;
}

/// 上传回调
///
/// 每次上传 `on_complete` 与 `on_error` 只会调用其中一个，且只调用一次，
/// 之前可能有若干次 `on_progress`。
pub trait UploadObserver: Send + Sync {
    fn on_progress(&self, _progress: &UploadProgress) {}

    fn on_complete(&self, info: &UploadedFileInfo);

    fn on_error(&self, error: &UploadError);
}

/// 用三个闭包组成的回调
pub struct CallbackObserver<P, C, E> {
    on_progress: P,
    on_complete: C,
    on_error: E,
}

impl<P, C, E> CallbackObserver<P, C, E>
where
    P: Fn(f64) + Send + Sync,
    C: Fn(&UploadedFileInfo) + Send + Sync,
    E: Fn(&UploadError) + Send + Sync,
{
    pub fn new(on_progress: P, on_complete: C, on_error: E) -> Self {
        Self { on_progress, on_complete, on_error }
    }
}

impl<P, C, E> UploadObserver for CallbackObserver<P, C, E>
where
    P: Fn(f64) + Send + Sync,
    C: Fn(&UploadedFileInfo) + Send + Sync,
    E: Fn(&UploadError) + Send + Sync,
{
    fn on_progress(&self, progress: &UploadProgress) {
        (self.on_progress)(progress.percentage)
    }

    fn on_complete(&self, info: &UploadedFileInfo) {
        (self.on_complete)(info)
    }

    fn on_error(&self, error: &UploadError) {
        (self.on_error)(error)
    }
}
