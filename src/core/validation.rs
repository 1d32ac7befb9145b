use mime_guess::Mime;
use super::errors::{Result, UploadError};
use super::types::{MAX_FILE_SIZE, VideoFile};

/// 上传前检查文件，返回拒绝原因；通过时返回 `None`
pub fn validate_video_file(file: Option<&VideoFile>) -> Option<String> {
    let Some(file) = file else {
        return Some("Please select a video file".to_string());
    };

    let is_video = file
        .media_type
        .parse::<Mime>()
        .map(|media_type| media_type.type_().as_str() == "video" && !media_type.subtype().as_str().is_empty())
        .unwrap_or(false);
    if !is_video {
        return Some(format!(
            "Only video files can be uploaded ({} is {})",
            file.name, file.media_type
        ));
    }

    if file.size > MAX_FILE_SIZE {
        return Some(format!(
            "File is too large: {} MB exceeds the {} MB limit",
            file.size / (1024 * 1024),
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }

    None
}

impl VideoFile {
    pub fn validate(&self) -> Result<()> {
        match validate_video_file(Some(self)) {
            Some(message) => Err(UploadError::Validation(message)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FileSource;
    use std::path::PathBuf;

    fn declared(media_type: &str, size: u64) -> VideoFile {
        VideoFile {
            name: "lecture".to_string(),
            media_type: media_type.to_string(),
            size,
            source: FileSource::Disk(PathBuf::from("lecture")),
        }
    }

    #[test]
    fn test_rejects_missing_file() {
        assert!(validate_video_file(None).is_some());
    }

    #[test]
    fn test_rejects_non_video() {
        let message = validate_video_file(Some(&declared("image/png", 1024))).unwrap();
        assert!(message.contains("image/png"));
    }

    #[test]
    fn test_rejects_malformed_media_type() {
        for media_type in ["video/", "video", "video mp4", ""] {
            let file = declared(media_type, 1024);
            assert!(validate_video_file(Some(&file)).is_some(), "{media_type:?} should be rejected");
            assert!(matches!(file.validate(), Err(UploadError::Validation(_))));
        }
        assert_eq!(validate_video_file(Some(&declared("video/mp4; codecs=avc1", 1024))), None);
    }

    #[test]
    fn test_rejects_oversized() {
        let file = declared("video/mp4", 5001 * 1024 * 1024);
        assert!(validate_video_file(Some(&file)).is_some());
        assert!(matches!(file.validate(), Err(UploadError::Validation(_))));
    }

    #[test]
    fn test_accepts_regular_video() {
        let file = declared("video/mp4", 100 * 1024 * 1024);
        assert_eq!(validate_video_file(Some(&file)), None);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert_eq!(validate_video_file(Some(&declared("video/webm", MAX_FILE_SIZE))), None);
    }
}
