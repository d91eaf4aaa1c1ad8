//! 计时源
//!
//! 倒计时每秒走一次，测试中换成手动驱动的计时源

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// 每秒产生一次计时
pub trait TickSource {
    /// 等待下一次计时
    ///
    /// 计时源关闭后永远挂起
    fn tick(&mut self) -> impl Future<Output = ()> + '_;

    /// 下一次计时推迟到一个完整周期之后
    fn reset(&mut self) {}
}

/// 基于 tokio interval 的真实计时
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn every_second() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        // 第一次计时在一个周期之后
        let mut interval = interval_at(Instant::now() + period, period);
        // 卡顿后不补发，否则会连续扣掉好几秒
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl TickSource for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }

    fn reset(&mut self) {
        self.interval.reset();
    }
}

/// 手动驱动的计时
///
/// 每往 [`ChannelTicker::new`] 返回的发送端写入一次，产生一次计时
pub struct ChannelTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ChannelTicker {
    pub fn new() -> (Self, mpsc::UnboundedSender<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

impl TickSource for ChannelTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}
