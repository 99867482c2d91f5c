//! 异步运行时抽象模块
//!
//! crate 本身不绑定任何异步运行时。连接所在的事件循环通过实现
//! 本模块的 trait 向管理器提供两种能力：
//!
//! - [`Timer`] / [`Sleep`]：调度超时
//! - [`IdlenessDetector`]：在连接读写两个方向都空闲超过阈值时发出通知
//!
//! 空闲检测器拿到的是一个 [`OnIdle`] 句柄；无论 `notify` 在哪个线程
//! 被调用，空闲事件都会被送回连接任务的事件队列，与其他事件一起
//! 串行处理。

use std::fmt;
use std::time::Duration;

use futures_channel::mpsc;

use crate::proto::manager::Event;

mod timer;

pub use self::timer::{Sleep, Timer};

/// 传输层空闲检测的安装接口。
///
/// 管理器构造时，如果配置启用了空闲探测，会用连接的空闲阈值调用一次
/// `configure`。实现应当在 `channel` 所属的传输上安装一个看门狗：
/// 连接在 `idle_duration` 内既没有读活动也没有写活动时，调用
/// `on_idle.notify()`。
pub trait IdlenessDetector<C> {
    /// 为 `channel` 安装空闲看门狗。
    fn configure(&self, channel: &mut C, idle_duration: Duration, on_idle: OnIdle);
}

/// 空闲检测器自己负责空闲判定的传输可以用 `()` 占位；
/// 它从不发出空闲通知，保活探测由调用方直接驱动。
impl<C> IdlenessDetector<C> for () {
    fn configure(&self, _channel: &mut C, _idle_duration: Duration, _on_idle: OnIdle) {}
}

/// 空闲通知句柄。
///
/// 由 [`IdlenessDetector::configure`] 交给检测器持有。`notify` 可以从
/// 任意线程调用，事件会被排入连接任务的队列。
#[derive(Clone)]
pub struct OnIdle {
    tx: mpsc::UnboundedSender<Event>,
}

impl OnIdle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Event>) -> OnIdle {
        OnIdle { tx }
    }

    /// 报告连接已空闲超过配置的阈值。
    ///
    /// 管理器已经终止时通知会被丢弃，调用方不需要关心。
    pub fn notify(&self) {
        let _ = self.tx.unbounded_send(Event::IdleDetected);
    }
}

impl fmt::Debug for OnIdle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnIdle").finish()
    }
}
