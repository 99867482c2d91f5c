//! 保活策略配置模块
//!
//! 定义 [`Config`]，描述单条连接上保活探测与优雅关闭的时间参数。
//! 配置在构造 [`KeepAliveManager`](crate::KeepAliveManager) 时一次性给定，
//! 之后不可变。

use std::time::Duration;

/// 单条连接的保活与优雅关闭策略。
///
/// 三个字段分别控制：
///
/// - `idle_duration`：连接空闲多久后发出一个保活 PING。`None`（或零）
///   完全禁用空闲探测，此时不会安装空闲检测器，也不会发送任何保活 PING。
///   优雅关闭仍然可用，`ack_timeout` 仍然生效。
/// - `ack_timeout`：等待 PING(ACK) 的上限。同一个值同时约束保活探测的
///   ACK 等待、优雅关闭的 ACK 等待，以及输出关闭后等待对端回应输入关闭
///   的时间。
/// - `without_active_streams`：为 `false` 时，活跃流计数为 0 的连接不发
///   保活 PING（空连接没有需要保护的请求，探测徒增流量）。
#[derive(Clone, Debug)]
pub struct Config {
    /// 空闲阈值。`None` 或零禁用保活探测。
    pub idle_duration: Option<Duration>,
    /// PING(ACK) 的等待上限，见类型文档。
    pub ack_timeout: Duration,
    /// 是否允许在没有活跃流时发送保活 PING。
    pub without_active_streams: bool,
}

impl Config {
    /// `ack_timeout` 的默认值。
    pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

    /// 禁用空闲探测的策略。优雅关闭使用默认的 ACK 超时。
    pub fn disabled() -> Config {
        Config {
            idle_duration: None,
            ack_timeout: Config::DEFAULT_ACK_TIMEOUT,
            without_active_streams: false,
        }
    }

    /// 连接空闲 `idle_duration` 后开始探测的策略，其余字段取默认值。
    pub fn when_idle_for(idle_duration: Duration) -> Config {
        Config {
            idle_duration: Some(idle_duration),
            ..Config::disabled()
        }
    }

    /// 空闲探测是否启用（阈值存在且非零）。
    pub(crate) fn probing_enabled(&self) -> bool {
        matches!(self.idle_duration, Some(d) if !d.is_zero())
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::disabled()
    }
}
