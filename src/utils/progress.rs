use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use crate::core::UploadProgress;

/// 速度计算器
pub struct SpeedCalculator {
    /// 历史记录 (时间, 累计字节)
    history: VecDeque<(Instant, u64)>,
    /// 历史窗口大小
    window_size: Duration,
    /// 最大历史记录数
    max_entries: usize,
}

impl SpeedCalculator {
    pub fn new(window_size: Duration) -> Self {
        Self {
            history: VecDeque::new(),
            window_size,
            max_entries: 100,
        }
    }

    /// 添加数据点，`total_bytes` 是累计值
    pub fn add_data_point(&mut self, total_bytes: u64) {
        let now = Instant::now();
        self.history.push_back((now, total_bytes));

        // 移除过期的数据点，至少保留两个用于计算
        while self.history.len() > 2 {
            match self.history.front() {
                Some(&(time, _)) if now.duration_since(time) > self.window_size => {
                    self.history.pop_front();
                }
                _ => break,
            }
        }

        while self.history.len() > self.max_entries {
            self.history.pop_front();
        }
    }

    /// 当前速度（字节/秒）
    pub fn calculate_speed(&self) -> f64 {
        let (Some(first), Some(last)) = (self.history.front(), self.history.back()) else {
            return 0.0;
        };

        let duration = last.0.duration_since(first.0).as_secs_f64();
        let bytes = last.1.saturating_sub(first.1);

        if duration > 0.0 {
            bytes as f64 / duration
        } else {
            0.0
        }
    }

    /// 估算剩余时间
    pub fn estimate_eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.calculate_speed();

        if speed > 0.0 {
            Some(Duration::from_secs_f64(remaining_bytes as f64 / speed))
        } else {
            None
        }
    }
}

/// 进度跟踪器
///
/// 百分比只增不减，且不超过 100。
pub struct ProgressTracker {
    total_bytes: u64,
    acknowledged_bytes: u64,
    percentage: f64,
    speed_calculator: SpeedCalculator,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        let mut speed_calculator = SpeedCalculator::new(Duration::from_secs(30));
        speed_calculator.add_data_point(0);

        Self {
            total_bytes,
            acknowledged_bytes: 0,
            percentage: 0.0,
            speed_calculator,
        }
    }

    /// 记录一个分片被服务端确认
    pub fn acknowledge(&mut self, bytes: u64) -> UploadProgress {
        self.acknowledged_bytes = self.acknowledged_bytes.saturating_add(bytes);
        self.speed_calculator.add_data_point(self.acknowledged_bytes);

        let percentage = if self.total_bytes > 0 {
            (self.acknowledged_bytes as f64 / self.total_bytes as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        self.percentage = self.percentage.max(percentage);

        self.snapshot()
    }

    /// 结果已通过其他途径确认，直接置为 100%
    pub fn complete(&mut self) -> UploadProgress {
        self.acknowledged_bytes = self.acknowledged_bytes.max(self.total_bytes);
        self.percentage = 100.0;
        self.snapshot()
    }

    pub fn snapshot(&self) -> UploadProgress {
        let remaining = self.total_bytes.saturating_sub(self.acknowledged_bytes);

        UploadProgress {
            uploaded_bytes: self.acknowledged_bytes.min(self.total_bytes),
            total_bytes: self.total_bytes,
            percentage: self.percentage,
            speed: self.speed_calculator.calculate_speed(),
            eta: if remaining == 0 {
                Some(Duration::ZERO)
            } else {
                self.speed_calculator.estimate_eta(remaining)
            },
        }
    }
}

/// 格式化字节数
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

pub fn format_speed(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second as u64))
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
