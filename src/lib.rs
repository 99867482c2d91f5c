// 以下 lint 属性控制编译器的警告行为，确保代码质量：
#![deny(missing_docs)] // 所有公共 API 必须有文档注释
#![deny(missing_debug_implementations)] // 所有公共类型必须实现 Debug trait
#![cfg_attr(test, deny(rust_2018_idioms))] // 测试时要求使用 Rust 2018 惯用写法
#![cfg_attr(docsrs, feature(doc_cfg))] // docs.rs 构建时启用 doc_cfg feature

//! # h2-keepalive
//!
//! Per-connection keep-alive probing and graceful close for HTTP/2
//! endpoints (client or server).
//!
//! 每条 HTTP/2 连接配一个 [`KeepAliveManager`]，它负责两件事：
//!
//! 1. **保活探测**：连接空闲超过阈值后发送一个 PING 帧，在限定时间
//!    内等不到 PING(ACK) 就写出 GOAWAY 并关闭连接，把死掉的对端
//!    限制在有界时间内暴露出来。
//! 2. **优雅关闭**：按 RFC 7540 §6.8 的两段 GOAWAY 流程关闭连接。
//!    第一个 GOAWAY 带最大流 ID 宣告不再接受新流，用一次 PING 往返
//!    估计 2·RTT，第二个 GOAWAY 才带真实的最高流 ID，然后等活跃流
//!    清零、冲刷、再走传输关闭（duplex 传输上还协调半关闭次序与
//!    TLS `close_notify`）。
//!
//! 两个子协议共用同一条连接上的 PING 帧，靠 8 字节负载区分；
//! 所有状态转移都在连接任务上串行执行，其他线程的入口经由
//! [`KeepAliveHandle`] 排队进入。
//!
//! ## 本 crate 不做什么
//!
//! 帧的编解码、流的多路复用、TLS 引擎、I/O 事件循环与定时器实现都是
//! 外部协作者，通过 [`transport::Channel`] 与 [`rt`] 模块的 trait 注入。
//! HTTP 语义、流量控制、连接池同样不在范围内。
//!
//! ## Optional Features
//!
//! - `tracing`: 通过 `tracing` crate 输出内部调试日志。
//!   生命周期事件记录在 DEBUG 级别，成功的保活 ACK 记录在 TRACE 级别。

// 从内部 error 模块重新导出 Error 和 Result 类型，
// 使其成为 crate 的顶级公共 API。
pub use crate::error::{Error, Result};

// `#[macro_use]` 使得 trace 模块中定义的日志宏（trace!、debug! 等）
// 在整个 crate 中可用。此模块必须最先声明。
#[macro_use]
mod trace;

// 内部通用工具模块。
mod common;
// 配置模块，通过下面的 `pub use` 导出 Config。
mod config;
// 错误类型模块，通过上面的 `pub use` 导出公共 API。
mod error;
/// 管理器写出的帧的数据模型。
pub mod frame;
// 协议实现模块（非公共），状态机本体在这里。
mod proto;
/// 异步运行时抽象模块（定时器与空闲检测）。
pub mod rt;
/// 传输通道抽象模块。
pub mod transport;

pub use crate::config::Config;
pub use crate::proto::manager::{ActiveStream, KeepAliveHandle, KeepAliveManager};
