//! 传输通道抽象
//!
//! [`Channel`] 是管理器与连接出站方向之间的唯一接口。它的实现通常是
//! 一个指向连接写出机制的轻量句柄（类似事件循环框架里的 channel 句柄），
//! 由管理器独占持有。帧的编码、半关闭的系统调用、TLS 告警的发送都发生
//! 在实现内部，管理器只关心“写了什么、何时落盘”。
//!
//! ## 写完成语义
//!
//! `write_and_flush` 与 `flush` 返回的 Future 只用于观察完成，丢弃它
//! 不会取消底层写入。管理器依赖这一点：对收到的 PING 回 ACK 时它不
//! 关心结果，直接丢弃返回值。

use std::future::Future;

use crate::error::Error;
use crate::frame::Frame;

/// 连接出站方向的句柄。
///
/// 所有方法都只会在连接任务上被调用，实现不需要内部加锁。
/// `close` 与 `close_with_cause` 可能被调用多次，重复调用应当是空操作。
pub trait Channel {
    /// 观察单次“写入并冲刷”何时落盘的 Future。
    ///
    /// 丢弃该 Future 不取消写入，只是放弃观察其结果。
    type Write: Future<Output = crate::Result<()>> + Unpin;

    /// 将帧排入出站队列，不触发冲刷。
    ///
    /// 排队的帧会随下一次 `write_and_flush` 或 `flush` 一起落盘，
    /// 且先于后写入的帧。
    fn write(&mut self, frame: Frame);

    /// 将帧排入出站队列并冲刷，返回完成通知。
    fn write_and_flush(&mut self, frame: Frame) -> Self::Write;

    /// 冲刷所有已排队的写入，等价于“写入一个空缓冲并冲刷”。
    ///
    /// 编码器可能在流状态变化时同步回调，而之前的帧仍滞留在队列里。
    /// 关闭前先做一次空冲刷，保证这些帧被观察到而不是被截断。
    fn flush(&mut self) -> Self::Write;

    /// 立即关闭通道。
    fn close(&mut self);

    /// 以给定原因关闭通道。
    ///
    /// 原因只用于诊断（记录日志、回填给上层等待者），不改变关闭方式。
    fn close_with_cause(&mut self, cause: Error);

    /// 传输是否支持两个方向独立关闭。
    ///
    /// 返回 `false` 时，任何一侧的半关闭都会被管理器当作整体关闭处理，
    /// 且 TLS 关闭告警与输出关闭流程都不适用。
    fn is_duplex(&self) -> bool {
        false
    }

    /// 启用半关闭语义：对端关闭输出后本端保持可写，且不自动关闭。
    ///
    /// 仅当 `is_duplex()` 为 `true` 时由管理器在构造期调用一次。
    fn enable_half_close(&mut self) {}

    /// 关闭本端输出方向，返回完成通知。仅对 duplex 传输调用。
    fn shutdown_output(&mut self) -> Self::Write;

    /// 本端输入方向是否已关闭（即对端已经关闭了它的输出）。
    fn is_input_shutdown(&self) -> bool;

    /// 本端输出方向是否已关闭。
    fn is_output_shutdown(&self) -> bool;

    /// 如果通道上有 TLS，发送 `close_notify`（RFC 5246 §7.2.1）并返回
    /// 其写出的完成通知；明文通道返回 `None`。
    ///
    /// 管理器保证在调用 `shutdown_output` 之前先走这一步，
    /// 使 TLS 告警先于 TCP FIN 落盘。
    fn close_tls_outbound(&mut self) -> Option<Self::Write>;
}
