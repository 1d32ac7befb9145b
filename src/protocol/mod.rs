pub mod http;
pub mod wire;

pub use http::HttpTransport;
pub use wire::{is_fallback_delivery, sanitize_filename, storage_object_url};
