pub mod progress;
pub mod retry;

pub use progress::{ProgressTracker, SpeedCalculator, format_bytes, format_speed, format_duration};
pub use retry::{poll_until, PollPolicy};
