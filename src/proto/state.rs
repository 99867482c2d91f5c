//! 连接管理器的状态槽
//!
//! 两个互相独立的槽位各自是一个带标签的和类型：保活探测一个，
//! 优雅关闭一个。定时器直接存放在合法持有它的变体里，所以
//! “取消定时器”就是用别的变体替换当前值，把 `Sleep` Future 丢弃，
//! 这个操作不可能失败。
//!
//! 槽位实现了 `Debug`（只打印变体名），连接关闭时的日志快照靠它。

use std::fmt;
use std::pin::Pin;

use crate::rt::Sleep;

/// 保活探测槽。
pub(super) enum KeepAliveState {
    /// 没有探测在进行。
    Idle,
    /// PING 已经写出，等待 ACK。
    ///
    /// `timer` 为 `None` 是写前哨兵：写入还没有确认完成，
    /// ACK 超时定时器尚未安装。ACK 可能在这个窗口里先到。
    AckPending {
        timer: Option<Pin<Box<dyn Sleep>>>,
    },
    /// ACK 超时，本轮探测已判定失败。
    AckTimedOut,
    /// 管理器已终止，不再有任何转移。
    Closed,
}

/// 优雅关闭槽。
pub(super) enum GracefulCloseState {
    /// 优雅关闭尚未发起。
    Idle,
    /// 第一个 GOAWAY 与 PING 已写出，超时定时器尚未安装的短暂窗口。
    Started,
    /// 等待优雅关闭 PING 的 ACK。
    AckPending { timer: Pin<Box<dyn Sleep>> },
    /// 第二个 GOAWAY 已写出，等待活跃流清零。
    SecondGoAwaySent,
    /// 管理器已终止，不再有任何转移。
    Closed,
}

impl fmt::Debug for KeepAliveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeepAliveState::Idle => f.write_str("Idle"),
            KeepAliveState::AckPending { timer: None } => f.write_str("AckPending(awaiting write)"),
            KeepAliveState::AckPending { timer: Some(_) } => {
                f.write_str("AckPending(timer scheduled)")
            }
            KeepAliveState::AckTimedOut => f.write_str("AckTimedOut"),
            KeepAliveState::Closed => f.write_str("Closed"),
        }
    }
}

impl fmt::Debug for GracefulCloseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GracefulCloseState::Idle => f.write_str("Idle"),
            GracefulCloseState::Started => f.write_str("Started"),
            GracefulCloseState::AckPending { .. } => f.write_str("AckPending"),
            GracefulCloseState::SecondGoAwaySent => f.write_str("SecondGoAwaySent"),
            GracefulCloseState::Closed => f.write_str("Closed"),
        }
    }
}
