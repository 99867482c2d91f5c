//! 定时器 trait 模块
//!
//! 本模块提供与定时器相关的 trait 抽象，使 crate 的各类超时
//! （ACK 等待、输入关闭等待）能够独立于具体的异步运行时实现。
//!
//! 主要包含两个 trait：
//! - [`Timer`]：创建定时 Future 的工厂
//! - [`Sleep`]：由定时器返回的 Future，在指定时间后完成
//!
//! 取消一个已调度的超时就是把 `Sleep` Future 丢弃，没有单独的取消
//! 接口，也就不存在取消失败。
//!
//! # 使用 tokio 定时器的示例
//!
//! ```rust
//! use std::{
//!     future::Future,
//!     pin::Pin,
//!     task::{Context, Poll},
//!     time::Duration,
//! };
//!
//! use pin_project_lite::pin_project;
//! use h2_keepalive::rt::{Sleep, Timer};
//!
//! #[derive(Clone, Debug)]
//! pub struct TokioTimer;
//!
//! impl Timer for TokioTimer {
//!     fn sleep(&self, duration: Duration) -> Pin<Box<dyn Sleep>> {
//!         Box::pin(TokioSleep {
//!             inner: tokio::time::sleep(duration),
//!         })
//!     }
//! }
//!
//! pin_project! {
//!     struct TokioSleep {
//!         #[pin]
//!         inner: tokio::time::Sleep,
//!     }
//! }
//!
//! impl Future for TokioSleep {
//!     type Output = ();
//!
//!     fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
//!         self.project().inner.poll(cx)
//!     }
//! }
//!
//! impl Sleep for TokioSleep {}
//! ```

use std::{
    future::Future,
    pin::Pin,
    time::{Duration, Instant},
};

/// 定时器工厂 trait。
///
/// 返回 `Pin<Box<dyn Sleep>>` 而非具体类型，因为不同运行时的
/// Sleep 类型不同，需要 trait object 擦除类型。由连接的事件循环
/// 提供实现，保证超时任务在连接任务上被观察到。
pub trait Timer {
    /// 返回一个在 `duration` 之后完成的 Future。
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Sleep>>;

    /// 返回当前时间。
    ///
    /// 默认实现直接调用 [`Instant::now()`]；测试场景可以覆盖此方法
    /// 以返回模拟时间。
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 由 [`Timer`] 返回的休眠 Future。
///
/// `Send + Sync` 约束允许定时器在构造线程之外被创建后移交给
/// 连接任务。
pub trait Sleep: Send + Sync + Future<Output = ()> {}
