//! PING 负载的分配与区分
//!
//! 同一条连接上跑着两个互不相识的 PING 用途：空闲保活探测与优雅
//! 关闭的 2·RTT 估计。两者共用 HTTP/2 的 PING 帧，靠 8 字节不透明
//! 负载区分。负载在进程启动后随机选定一次：
//!
//! - 保活探测使用偶数（最低位清零）
//! - 优雅关闭使用奇数（最低位置一）
//!
//! 奇偶差异只是为了在十六进制帧日志里肉眼可辨；ACK 的匹配始终按
//! 完整的 64 位负载进行，所以迟到的保活 ACK 不会被误认成优雅关闭
//! 的 ACK，反之亦然。
//!
//! 本模块同时存放 GOAWAY 的调试负载：五个静态 ASCII 标记，
//! 开头的数字让运维不解码就能判断 GOAWAY 出自哪条路径。

use std::sync::OnceLock;

use bytes::Bytes;

static PING_CONTENTS: OnceLock<(u64, u64)> = OnceLock::new();

fn ping_contents() -> (u64, u64) {
    *PING_CONTENTS.get_or_init(|| {
        let keep_alive = rand::random::<u64>() & !0x01; // even
        let graceful_close = rand::random::<u64>() | 0x01; // odd
        (keep_alive, graceful_close)
    })
}

/// 保活探测 PING 的负载。
pub(crate) fn keep_alive_content() -> u64 {
    ping_contents().0
}

/// 优雅关闭 PING 的负载。
pub(crate) fn graceful_close_content() -> u64 {
    ping_contents().1
}

/// 按负载判断一个 PING(ACK) 属于哪个子协议。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PingPurpose {
    /// 空闲保活探测的应答。
    KeepAlive,
    /// 优雅关闭 2·RTT 探测的应答。
    GracefulClose,
}

impl PingPurpose {
    /// 负载不属于本端发出的任何 PING 时返回 `None`。
    pub(crate) fn from_content(content: u64) -> Option<PingPurpose> {
        let (keep_alive, graceful_close) = ping_contents();
        if content == keep_alive {
            Some(PingPurpose::KeepAlive)
        } else if content == graceful_close {
            Some(PingPurpose::GracefulClose)
        } else {
            None
        }
    }
}

// GOAWAY 调试负载。静态存储永不释放，clone 只复制指针，
// 每次发送复制一份句柄即可。
pub(crate) static LOCAL_GO_AWAY_CONTENT: Bytes = Bytes::from_static(b"0.local");
pub(crate) static REMOTE_GO_AWAY_CONTENT: Bytes = Bytes::from_static(b"1.remote");
pub(crate) static SECOND_GO_AWAY_CONTENT: Bytes = Bytes::from_static(b"2.second");
pub(crate) static GC_TIMEOUT_GO_AWAY_CONTENT: Bytes = Bytes::from_static(b"3.graceful-close-timeout");
pub(crate) static KA_TIMEOUT_GO_AWAY_CONTENT: Bytes = Bytes::from_static(b"4.keep-alive-timeout");
