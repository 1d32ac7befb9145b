pub mod core;
pub mod protocol;
pub mod uploaders;
pub mod utils;
pub mod config;

// 重新导出核心类型
pub use core::{
    CallbackObserver,
    ChunkTransport,
    ChunkedConfig,
    Endpoint,
    EndpointConfig,
    EndpointSet,
    RecoveryConfig,
    Result,
    TransportError,
    UploadError,
    UploadObserver,
    UploadProgress,
    UploadedFileInfo,
    VideoFile,
    validate_video_file,
};
pub use config::Config;
pub use protocol::HttpTransport;

// 重新导出上传器
pub use uploaders::ChunkedUploader;
