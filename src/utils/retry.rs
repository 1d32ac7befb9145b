use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// 固定间隔轮询
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// 最多检查次数
    pub max_attempts: u32,
    /// 两次检查之间的间隔
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    /// 最长等待时间
    pub fn window(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// 每次检查前先等待一个间隔，直到 `check` 返回 true 或次数用完。
///
/// 成功时返回第几次检查成功（从 1 开始）。
pub async fn poll_until<F, Fut>(policy: PollPolicy, mut check: F) -> Option<u32>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.max_attempts {
        sleep(policy.interval).await;

        if check(attempt).await {
            return Some(attempt);
        }
    }

    None
}
