mod endpoint;
mod errors;
mod state;
mod traits;
mod types;
mod validation;

pub use endpoint::{Endpoint, EndpointConfig, EndpointSet};
pub use errors::{Result, TransportError, TransportResult, UploadError};
pub use state::{TaskState, UploadState};
pub use traits::{CallbackObserver, ChunkTransport, UploadObserver};
pub use types::{
    ChunkInfo,
    ChunkRequest,
    ChunkResponse,
    ChunkedConfig,
    FileSource,
    RecoveryConfig,
    UploadId,
    UploadProgress,
    UploadedFileInfo,
    VideoFile,
    DEFAULT_CHUNK_SIZE,
    MAX_FILE_SIZE,
    plan_chunks,
};
pub use validation::validate_video_file;
