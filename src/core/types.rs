use std::path::{Path, PathBuf};
use std::time::Duration;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use uuid::Uuid;
use super::errors::{Result, UploadError};

/// 默认分片大小 10MB
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// 允许上传的最大文件 5000MB
pub const MAX_FILE_SIZE: u64 = 5000 * 1024 * 1024;

// 用于序列化 Duration
fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// 上传任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UploadId(pub Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 分片上传配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChunkedConfig {
    pub chunk_size: usize,
    /// 普通分片的超时
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub chunk_timeout: Duration,
    /// 最后一个分片的超时，服务端要合并分片并转存，耗时明显更长
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub final_chunk_timeout: Duration,
}

impl Default for ChunkedConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_timeout: Duration::from_secs(120),
            final_chunk_timeout: Duration::from_secs(600),
        }
    }
}

/// 最后一个分片响应丢失时的存储轮询配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub storage_base: String,
    pub bucket: String,
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            storage_base: "https://storage.googleapis.com".to_string(),
            bucket: "course-videos".to_string(),
            poll_interval: Duration::from_secs(5),
            // 5 分钟
            max_attempts: 60,
        }
    }
}

/// 分片信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    pub index: usize,
    pub offset: u64,
    pub size: usize,
}

/// 按固定大小切分文件，最后一片可能更小
pub fn plan_chunks(file_size: u64, chunk_size: usize) -> Vec<ChunkInfo> {
    let chunk_size = chunk_size.max(1) as u64;
    let mut chunks = Vec::with_capacity(file_size.div_ceil(chunk_size) as usize);
    let mut offset = 0;

    while offset < file_size {
        let size = std::cmp::min(chunk_size, file_size - offset) as usize;
        chunks.push(ChunkInfo {
            index: chunks.len(),
            offset,
            size,
        });
        offset += size as u64;
    }

    chunks
}

/// 文件内容来源
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Bytes),
    /// 按分片从磁盘读取，不会整个载入内存
    Disk(PathBuf),
}

/// 待上传的视频文件
#[derive(Debug, Clone)]
pub struct VideoFile {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    pub source: FileSource,
}

impl VideoFile {
    pub fn from_bytes(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: data.len() as u64,
            source: FileSource::Memory(data),
        }
    }

    /// 打开磁盘文件，`media_type` 为空时按扩展名推断
    pub async fn open(path: impl AsRef<Path>, media_type: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadError::validation(format!("invalid file name: {}", path.display())))?
            .to_string();
        let media_type = media_type.unwrap_or_else(|| guess_media_type(path));

        Ok(Self {
            name,
            media_type,
            size,
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    pub async fn read_chunk(&self, chunk: &ChunkInfo) -> Result<Bytes> {
        match &self.source {
            FileSource::Memory(data) => {
                let start = chunk.offset as usize;
                let end = start + chunk.size;
                if end > data.len() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("chunk {} ends past the end of the buffer", chunk.index),
                    ).into());
                }
                Ok(data.slice(start..end))
            }
            FileSource::Disk(path) => {
                let mut file = File::open(path).await?;
                file.seek(std::io::SeekFrom::Start(chunk.offset)).await?;

                let mut buffer = vec![0u8; chunk.size];
                file.read_exact(&mut buffer).await?;
                Ok(Bytes::from(buffer))
            }
        }
    }
}

fn guess_media_type(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().essence_str().to_string()
}

/// 一次分片请求，发送完即丢弃
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    pub data: Bytes,
    pub index: usize,
    pub total_chunks: usize,
    pub original_name: String,
    pub media_type: String,
}

impl ChunkRequest {
    pub fn is_final(&self) -> bool {
        self.index + 1 == self.total_chunks
    }
}

/// 服务端对分片的原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResponse {
    pub status: u16,
    pub body: String,
}

impl ChunkResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 上传结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileInfo {
    /// 存储端的文件名
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub media_type: String,
    pub video_url: String,
    pub message: Option<String>,
    /// 文件落在了本地或备用存储，而不是主对象存储
    pub using_fallback: bool,
    pub completed_at: DateTime<Utc>,
}

/// 上传进度
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    /// 已确认字节数
    pub uploaded_bytes: u64,
    pub total_bytes: u64,
    /// 0 - 100
    pub percentage: f64,
    /// 字节/秒
    pub speed: f64,
    pub eta: Option<Duration>,
}

// 静态断言确保类型是 Send的
const _: fn() = || {
    fn assert_send<T: Send + Sync>() {}
    assert_send::<VideoFile>();
    assert_send::<ChunkRequest>();
    assert_send::<UploadedFileInfo>();
    assert_send::<UploadProgress>();
};
