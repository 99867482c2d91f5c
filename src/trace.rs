//! 日志追踪（tracing）宏模块
//!
//! 本模块为整个 crate 提供统一的日志宏。它对 `tracing` crate 的公共日志宏
//! 进行了条件包装，使得：
//!
//! 1. 当 `tracing` feature 启用时，宏会展开为实际的 `tracing::*` 调用
//! 2. 当 `tracing` feature 未启用时，宏展开为空操作（零成本抽象）
//!
//! ## 在 crate 中的角色
//!
//! 本模块通过 `#[macro_use]` 在 `lib.rs` 中最先被引入，使得 crate 内的
//! 代码都可以直接使用 `trace!`、`debug!`、`warn!` 等宏，而无需关心
//! `tracing` feature 是否启用。连接生命周期事件记录在 DEBUG 级别，
//! 成功的保活 PING(ACK) 记录在 TRACE 级别。

// 即使某些宏当前未被使用，也提供对常用日志级别的完整封装。
#![allow(unused_macros)]

/// `debug!`：调试级别日志宏
///
/// 当 `tracing` feature 启用时，转发到 `tracing::debug!`；否则为空操作。
/// 连接生命周期事件（配置、空闲检测、超时、关闭快照）使用此级别。
macro_rules! debug {
    ($($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        {
            tracing::debug!($($arg)+);
        }
    }
}

/// `error!`：错误级别日志宏
macro_rules! error {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::error!($($arg)+);
        }
    }
}

/// `trace!`：追踪级别日志宏
///
/// 最细粒度的日志级别。成功收到保活 PING(ACK) 属于高频且无意外的事件，
/// 记录在此级别以避免噪音。
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!($($arg)+);
        }
    }
}

/// `warn!`：警告级别日志宏
macro_rules! warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::warn!($($arg)+);
        }
    }
}
