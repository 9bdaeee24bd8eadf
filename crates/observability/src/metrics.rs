//! 流媒体指标收集模块
//!
//! 所有指标以 `pose_streamer_` 为前缀。未安装 recorder 时这些调用为空操作。

use metrics::{counter, gauge, histogram};

/// 记录一次帧发布
pub fn record_frame_published(seq: u64) {
    counter!("pose_streamer_frames_published_total").increment(1);
    gauge!("pose_streamer_last_frame_seq").set(seq as f64);
}

/// 记录采样周期 (实际两次发布间隔)
pub fn record_tick_interval_ms(interval_ms: f64) {
    histogram!("pose_streamer_tick_interval_ms").record(interval_ms);
}

/// 记录帧投递成功
pub fn record_frame_delivered(sink_name: &str) {
    counter!(
        "pose_streamer_frames_delivered_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// 记录消费者错过的帧 (被覆盖的发布)
pub fn record_frames_skipped(sink_name: &str, skipped: u64) {
    if skipped == 0 {
        return;
    }
    counter!(
        "pose_streamer_frames_skipped_total",
        "sink" => sink_name.to_string()
    )
    .increment(skipped);
}

/// 记录写失败
pub fn record_write_failure(sink_name: &str) {
    counter!(
        "pose_streamer_write_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// 记录接受的连接
pub fn record_connection_accepted(active: usize) {
    counter!("pose_streamer_connections_accepted_total").increment(1);
    gauge!("pose_streamer_connections_active").set(active as f64);
}

/// 记录关闭的连接
pub fn record_connection_closed(active: usize) {
    gauge!("pose_streamer_connections_active").set(active as f64);
}

/// 记录因连接数上限被拒绝的连接
pub fn record_connection_rejected() {
    counter!("pose_streamer_connections_rejected_total").increment(1);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }

    /// 摘要
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
