//! HTTP/2 控制帧模型
//!
//! 本模块只描述管理器会写出的两种帧（PING 与 GOAWAY）的内容，
//! 不负责编码成线上字节。编码由实现
//! [`Channel`](crate::transport::Channel) 的传输层完成，帧的解析
//! 同样发生在传输层，收到的 PING 以 [`PingFrame`] 的形式回送给管理器。

use std::fmt;

use bytes::Bytes;

/// HTTP/2 允许的最大流 ID（2³¹ − 1）。
///
/// 第一个 GOAWAY 以它作为 `last_stream_id`，表示本端不再接受新流，
/// 但也不放弃任何已经在途的流。
pub const MAX_STREAM_ID: u32 = (1 << 31) - 1;

/// 管理器写出的帧。
#[derive(Debug, Clone)]
pub enum Frame {
    /// PING 帧，见 [`PingFrame`]。
    Ping(PingFrame),
    /// GOAWAY 帧，见 [`GoAwayFrame`]。
    GoAway(GoAwayFrame),
}

/// PING 帧（RFC 7540 §6.7）：8 字节不透明负载加一个 ack 标志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingFrame {
    /// 8 字节不透明负载。管理器用它区分保活探测与优雅关闭探测。
    pub content: u64,
    /// ACK 标志。`true` 表示这是对先前 PING 的应答。
    pub ack: bool,
}

impl PingFrame {
    /// 构造一个待应答的 PING（`ack = false`）。
    pub fn new(content: u64) -> PingFrame {
        PingFrame {
            content,
            ack: false,
        }
    }

    /// 构造对收到的 PING 的应答（`ack = true`），负载原样回显。
    pub fn ack_of(content: u64) -> PingFrame {
        PingFrame { content, ack: true }
    }
}

/// GOAWAY 帧的错误码（RFC 7540 §7）。
///
/// 管理器只会写出 [`ErrorCode::NO_ERROR`]，保活超时与优雅关闭都不是
/// 协议层面的错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(u32);

impl ErrorCode {
    /// `NO_ERROR (0x0)`：正常关闭。
    pub const NO_ERROR: ErrorCode = ErrorCode(0);

    /// 返回错误码的原始数值。
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// GOAWAY 帧中 `last_stream_id` 字段的取值方式。
///
/// 连接上最高的已接受流 ID 只有编码器知道，所以这里只声明意图，
/// 由传输层在编码时代入具体数值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastStreamId {
    /// 写出连接上最高的已接受流 ID。
    HighestAccepted,
    /// 写出 [`MAX_STREAM_ID`]，即拒绝新流而保留所有在途流。
    Max,
}

/// GOAWAY 帧（RFC 7540 §6.8）。
#[derive(Debug, Clone)]
pub struct GoAwayFrame {
    /// 错误码，本管理器恒为 [`ErrorCode::NO_ERROR`]。
    pub error_code: ErrorCode,
    /// `last_stream_id` 的取值方式。
    pub last_stream_id: LastStreamId,
    /// 调试负载。
    ///
    /// 管理器写出的都是静态 ASCII 标记（如 `2.second`），运维人员
    /// 不需要解码就能从帧日志里看出是哪条路径发出的 GOAWAY。
    pub debug_data: Bytes,
}

impl GoAwayFrame {
    /// 构造一个 `NO_ERROR` 的 GOAWAY。
    pub fn no_error(last_stream_id: LastStreamId, debug_data: Bytes) -> GoAwayFrame {
        GoAwayFrame {
            error_code: ErrorCode::NO_ERROR,
            last_stream_id,
            debug_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_stream_id_is_top_of_31_bits() {
        assert_eq!(MAX_STREAM_ID, 0x7fff_ffff);
    }

    /// ACK 必须原样回显负载。
    #[test]
    fn ack_echoes_content() {
        let ping = PingFrame::new(0xdead_beef);
        let ack = PingFrame::ack_of(ping.content);
        assert_eq!(ack.content, ping.content);
        assert!(ack.ack);
        assert!(!ping.ack);
    }

    #[test]
    fn go_away_defaults_to_no_error() {
        let frame = GoAwayFrame::no_error(LastStreamId::Max, Bytes::from_static(b"x"));
        assert_eq!(frame.error_code, ErrorCode::NO_ERROR);
        assert_eq!(frame.error_code.as_u32(), 0);
    }
}
