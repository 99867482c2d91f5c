//! 错误与结果类型模块
//!
//! 本模块定义 crate 的核心错误类型 [`Error`] 及其相关的辅助类型。
//! 连接管理过程中可能发生的所有错误（帧写入失败、各类超时、
//! 意外的半关闭）都被统一封装在 `Error` 类型中。
//!
//! ## 设计理念
//!
//! - **不透明错误**：`Error` 使用 `Box<ErrorImpl>` 包装内部实现，
//!   既把栈上大小压到一个指针宽度，又隐藏了内部结构细节。
//! - **错误链**：通过 `std::error::Error::source()` 支持错误链。
//!   超时类错误的链尾是零大小的 [`TimedOut`] 哨兵类型，不携带回溯，
//!   构造成本可以忽略。
//! - **从属原因**：当超时之后的 GOAWAY 写入又失败时，写入失败作为
//!   主因，超时通过 [`Error::suppressed`] 保留，两个事实都不丢失。

// 引入标准库的 Error trait，重命名为 StdError 以避免与本 crate 的 Error 冲突
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// 本 crate 常用的 `Result` 类型别名。
pub type Result<T> = std::result::Result<T, Error>;

/// 类型擦除的错误原因。
///
/// `Send + Sync` 约束确保错误可以安全地跨线程传递。
type Cause = Box<dyn StdError + Send + Sync>;

/// 管理 HTTP/2 连接保活与关闭时可能发生的错误。
///
/// # Display
///
/// `Display` 实现只打印当前层级的错误详情。要打印整条原因链，
/// 请使用 `std::error::Report` 或等效的第三方类型。
///
/// # Source
///
/// 底层原因通过 `Error::source()` 以类型擦除的方式暴露，可以检查
/// 但不应依赖其具体类型。
pub struct Error {
    // Box 保证 Error 在栈上只占一个指针宽度，
    // 这对 Result<T, Error> 的大小很重要。
    inner: Box<ErrorImpl>,
}

struct ErrorImpl {
    kind: Kind,
    cause: Option<Cause>,
    /// 与主因同时成立、但不在同一条因果链上的第二原因。
    /// 目前只在“超时后写 GOAWAY 又失败”时出现。
    suppressed: Option<Cause>,
}

/// 错误分类枚举。
///
/// crate 内部使用的错误分类体系，每个变体对应一条失败路径。
#[derive(Debug)]
pub(crate) enum Kind {
    /// 保活 PING 在超时窗口内没有等到 ACK。
    KeepAliveTimedOut,
    /// 优雅关闭的 PING 在超时窗口内没有等到 ACK。
    GracefulCloseTimedOut,
    /// 本端输出关闭后，对端没有在超时窗口内回应输入关闭。
    InputShutdownTimedOut,
    /// 向传输通道写入帧（或冲刷）时发生 I/O 错误。
    Io,
    /// 对端在优雅关闭完成之前半关闭了传输方向。
    UnexpectedHalfClose,
}

/// 超时哨兵类型。
///
/// 零大小、不携带回溯。作为所有超时类错误的链尾，
/// 使得 `is_timeout()` 可以在任意包装层级上识别超时。
#[derive(Debug)]
pub(crate) struct TimedOut;

/// 对端在优雅关闭完成之前半关闭传输的违例描述。
///
/// 只在协议还没走到第二个 GOAWAY 时出现：此时本端不能合法地继续读，
/// 只能强制关闭。
#[derive(Debug)]
pub(crate) struct HalfCloseViolation {
    /// 观察到哪一侧被关闭，`"input"` 或 `"output"`。
    pub(crate) side: &'static str,
    /// 优雅关闭当时的进度，`"not started"` 或 `"in progress"`。
    pub(crate) phase: &'static str,
}

// ===== impl Error =====

impl Error {
    /// 如果错误由超时引起，返回 `true`。
    ///
    /// 既匹配本 crate 的三种超时分类，也在原因链中查找
    /// [`TimedOut`] 哨兵类型。
    pub fn is_timeout(&self) -> bool {
        if matches!(
            self.inner.kind,
            Kind::KeepAliveTimedOut | Kind::GracefulCloseTimedOut | Kind::InputShutdownTimedOut
        ) {
            return true;
        }
        self.find_source::<TimedOut>().is_some()
    }

    /// 如果错误来自向传输写入帧失败，返回 `true`。
    pub fn is_io(&self) -> bool {
        matches!(self.inner.kind, Kind::Io)
    }

    /// 如果错误来自对端在优雅关闭完成前的半关闭，返回 `true`。
    pub fn is_unexpected_half_close(&self) -> bool {
        matches!(self.inner.kind, Kind::UnexpectedHalfClose)
    }

    /// 返回与主因同时成立的第二原因（如果有）。
    ///
    /// 超时之后的 GOAWAY 写入失败时，写入失败是主因，
    /// 超时经由这里保留。
    pub fn suppressed(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .suppressed
            .as_ref()
            .map(|cause| &**cause as &(dyn StdError + 'static))
    }

    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(ErrorImpl {
                kind,
                cause: None,
                suppressed: None,
            }),
        }
    }

    /// 为已有的 `Error` 附加一个原因，builder 风格链式调用。
    pub(crate) fn with<C: Into<Cause>>(mut self, cause: C) -> Error {
        self.inner.cause = Some(cause.into());
        self
    }

    /// 附加一个从属原因，见 [`Error::suppressed`]。
    pub(crate) fn with_suppressed<C: Into<Cause>>(mut self, cause: C) -> Error {
        self.inner.suppressed = Some(cause.into());
        self
    }

    pub(crate) fn new_keep_alive_timeout() -> Error {
        Error::new(Kind::KeepAliveTimedOut).with(TimedOut)
    }

    pub(crate) fn new_graceful_close_timeout() -> Error {
        Error::new(Kind::GracefulCloseTimedOut).with(TimedOut)
    }

    pub(crate) fn new_input_shutdown_timeout() -> Error {
        Error::new(Kind::InputShutdownTimedOut).with(TimedOut)
    }

    pub(crate) fn new_unexpected_half_close(violation: HalfCloseViolation) -> Error {
        Error::new(Kind::UnexpectedHalfClose).with(violation)
    }

    /// 在错误的 source 链中查找特定类型的错误。
    pub(crate) fn find_source<E: StdError + 'static>(&self) -> Option<&E> {
        let mut cause = self.source();
        while let Some(err) = cause {
            if let Some(typed) = err.downcast_ref() {
                return Some(typed);
            }
            cause = err.source();
        }

        // else
        None
    }

    fn description(&self) -> &str {
        match self.inner.kind {
            Kind::KeepAliveTimedOut => "timeout waiting for keep-alive PING(ACK)",
            Kind::GracefulCloseTimedOut => "timeout waiting for graceful close PING(ACK)",
            Kind::InputShutdownTimedOut => "timeout waiting for peer input shutdown",
            Kind::Io => "frame write failed",
            Kind::UnexpectedHalfClose => "unexpected transport half-close",
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("h2_keepalive::Error");
        f.field(&self.inner.kind);
        if let Some(ref cause) = self.inner.cause {
            f.field(cause);
        }
        if let Some(ref suppressed) = self.inner.suppressed {
            f.field(suppressed);
        }
        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .cause
            .as_ref()
            .map(|cause| &**cause as &(dyn StdError + 'static))
    }
}

/// 传输实现可以用 `?` 直接把 I/O 错误转成帧写入失败。
impl From<io::Error> for Error {
    fn from(cause: io::Error) -> Error {
        Error::new(Kind::Io).with(cause)
    }
}

// ===== impl TimedOut =====

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation timed out")
    }
}

impl StdError for TimedOut {}

// ===== impl HalfCloseViolation =====

impl fmt::Display for HalfCloseViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observed {} shutdown while graceful closure is {}",
            self.side, self.phase
        )
    }
}

impl StdError for HalfCloseViolation {}
