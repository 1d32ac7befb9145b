//! 上传接口的 JSON 格式

use chrono::Utc;
use serde::Deserialize;
use url::{Host, Url};
use crate::core::{ChunkResponse, Result, UploadError, UploadedFileInfo, VideoFile};

/// 成功响应
#[derive(Debug, Deserialize)]
pub struct UploadResponseBody {
    pub file: Option<FileRecord>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub filename: Option<String>,
    #[serde(rename = "originalname")]
    pub original_name: Option<String>,
    pub size: Option<u64>,
    #[serde(rename = "mimetype")]
    pub media_type: Option<String>,
    pub video_url: Option<String>,
}

/// 失败响应
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// 优先使用服务端返回的错误信息
pub fn error_message(response: &ChunkResponse) -> String {
    serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.error)
        .filter(|error| !error.trim().is_empty())
        .unwrap_or_else(|| format!("Upload failed with status {}", response.status))
}

/// 解析最后一个分片的响应
///
/// HTTP 成功但缺少 `file.videoUrl` 视为协议错误。
pub fn parse_completion(response: &ChunkResponse, file: &VideoFile) -> Result<UploadedFileInfo> {
    let body: UploadResponseBody = serde_json::from_str(&response.body)
        .map_err(|err| UploadError::protocol(format!("invalid upload response: {err}")))?;

    let record = body
        .file
        .ok_or_else(|| UploadError::protocol("No file in upload response"))?;
    let video_url = record
        .video_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| UploadError::protocol("No videoUrl in upload response"))?;

    let using_fallback = is_fallback_delivery(body.message.as_deref(), &video_url);

    Ok(UploadedFileInfo {
        filename: record.filename.unwrap_or_else(|| sanitize_filename(&file.name)),
        original_name: record.original_name.unwrap_or_else(|| file.name.clone()),
        size: record.size.unwrap_or(file.size),
        media_type: record.media_type.unwrap_or_else(|| file.media_type.clone()),
        video_url,
        message: body.message,
        using_fallback,
        completed_at: Utc::now(),
    })
}

/// 文件是否落在本地或备用存储
pub fn is_fallback_delivery(message: Option<&str>, video_url: &str) -> bool {
    let mentions_fallback = message
        .map(|m| {
            let m = m.to_lowercase();
            m.contains("local") || m.contains("fallback")
        })
        .unwrap_or(false);

    mentions_fallback || is_loopback_url(video_url)
}

fn is_loopback_url(url: &str) -> bool {
    match Url::parse(url).ok().as_ref().and_then(Url::host) {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// 存储端的文件名：去掉所有空白字符
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `{storage_base}/{bucket}/{sanitized_name}`
pub fn storage_object_url(storage_base: &str, bucket: &str, filename: &str) -> Result<Url> {
    let mut url = Url::parse(storage_base)?;
    if url.cannot_be_a_base() {
        return Err(UploadError::config(format!("invalid storage base {storage_base}")));
    }
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(bucket).push(&sanitize_filename(filename));
    }
    Ok(url)
}

/// 通过存储检查确认上传成功时的结果
pub fn recovered_file_info(file: &VideoFile, object_url: &Url) -> UploadedFileInfo {
    UploadedFileInfo {
        filename: sanitize_filename(&file.name),
        original_name: file.name.clone(),
        size: file.size,
        media_type: file.media_type.clone(),
        video_url: object_url.to_string(),
        message: Some(
            "Upload response was lost; the file was confirmed in storage".to_string(),
        ),
        using_fallback: true,
        completed_at: Utc::now(),
    }
}
