//! 定时器封装模块
//!
//! [`Time`] 把用户提供的 [`Timer`](crate::rt::Timer) trait 对象包装成
//! crate 内部统一使用的定时器接口。`Arc` 使其可以被克隆进各个需要
//! 调度超时的位置，同时满足跨线程发送的要求。

use std::{fmt, sync::Arc};
use std::{pin::Pin, time::Duration};

use crate::rt::{Sleep, Timer};

/// 用户提供的定时器的内部封装。
#[derive(Clone)]
pub(crate) struct Time(Arc<dyn Timer + Send + Sync>);

impl Time {
    pub(crate) fn new(timer: Arc<dyn Timer + Send + Sync>) -> Time {
        Time(timer)
    }

    /// 创建一个在 `duration` 后就绪的 Sleep Future。
    pub(crate) fn sleep(&self, duration: Duration) -> Pin<Box<dyn Sleep>> {
        self.0.sleep(duration)
    }
}

// 只输出类型名称，不暴露内部 Timer 的细节（trait 对象不一定实现 Debug）。
impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Time").finish()
    }
}
