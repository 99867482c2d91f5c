//! 连接保活与优雅关闭的核心状态机
//!
//! [`KeepAliveManager`] 与一条 HTTP/2 连接一一绑定，把两个独立但相互
//! 纠缠的子协议复用在同一条连接上：
//!
//! 1. **空闲保活**：空闲检测 -> PING -> ACK 或超时 -> GOAWAY 并关闭
//! 2. **优雅关闭**：GOAWAY₁ -> PING -> ACK 或超时 -> GOAWAY₂ ->
//!    等活跃流清零 -> 冲刷 -> 关闭
//!
//! 外加传输半关闭的协调与 TLS `close_notify` 的次序保证。
//!
//! ## 事件串行化
//!
//! 所有状态转移都发生在持有 `&mut KeepAliveManager` 的那个连接任务上。
//! 连接任务自己产生的事件（收到 PING、观察到半关闭、通道关闭）直接
//! 调用内联方法；其他线程的入口（发起优雅关闭、流关闭的清零、空闲
//! 看门狗）经由 [`KeepAliveHandle`] / [`ActiveStream`] / `OnIdle` 把
//! 事件排进无界队列，由 [`KeepAliveManager::poll`] 取出后走同一套
//! 转移函数。唯一被多线程触碰的字段是活跃流计数，它是原子整数。
//!
//! ## 写完成与定时器
//!
//! 状态机从不在转移中途悬起。写完成与定时器到期都表现为 `poll` 里
//! 被轮询就绪的 Future，就绪后从一个明确的槽位值重新进入转移表；
//! 每次动作前都要核对槽位仍处于调度该动作时的变体。

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_channel::mpsc;
use futures_core::Stream;

use super::ping::{self, PingPurpose};
use super::state::{GracefulCloseState, KeepAliveState};
use crate::common::time::Time;
use crate::config::Config;
use crate::error::{Error, HalfCloseViolation};
use crate::frame::{Frame, GoAwayFrame, LastStreamId, PingFrame};
use crate::rt::{IdlenessDetector, OnIdle, Sleep, Timer};
use crate::transport::Channel;

/// 从连接任务之外送进事件循环的事件。
pub(crate) enum Event {
    /// 空闲看门狗报告连接已空闲超过阈值。
    IdleDetected,
    /// 活跃流计数刚刚降到零。
    StreamsDrained,
    /// 用户请求优雅关闭。
    GracefulClose {
        local: bool,
        when_initiated: Box<dyn FnOnce() + Send>,
    },
}

/// [`KeepAliveManager`] 的跨线程句柄。
///
/// 可克隆、可跨线程发送。通过它发起的操作会被排进管理器的事件队列，
/// 在连接任务的下一次 [`poll`](KeepAliveManager::poll) 中与其他事件
/// 一起串行处理。管理器终止后，句柄上的操作都是空操作。
pub struct KeepAliveHandle {
    tx: mpsc::UnboundedSender<Event>,
    active_streams: Arc<AtomicUsize>,
}

impl KeepAliveHandle {
    /// 发起优雅关闭。
    ///
    /// `when_initiated` 会在任何帧写出之前、在连接任务上执行，供上层
    /// 停止接收新的工作。同一个管理器只会执行一次优雅关闭：重复调用
    /// 是空操作，后续调用的钩子不会执行，`local` 也会被忽略。
    ///
    /// `local` 只影响第一个 GOAWAY 的调试负载，标记这次关闭是本端
    /// 主动发起（`0.local`）还是响应对端（`1.remote`）。
    pub fn initiate_graceful_close<F>(&self, when_initiated: F, local: bool)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.tx.unbounded_send(Event::GracefulClose {
            local,
            when_initiated: Box::new(when_initiated),
        });
    }

    /// 登记一个活跃流，返回它的守卫。
    ///
    /// 计数立即递增；守卫被丢弃时递减。流关闭回调可能发生在任意线程，
    /// 所以计数是原子的；降到零的那一刻会被重新排队到连接任务上，
    /// 再与优雅关闭的状态合并判断。
    pub fn track_active_stream(&self) -> ActiveStream {
        self.active_streams.fetch_add(1, Ordering::SeqCst);
        ActiveStream {
            active_streams: self.active_streams.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl Clone for KeepAliveHandle {
    fn clone(&self) -> KeepAliveHandle {
        KeepAliveHandle {
            tx: self.tx.clone(),
            active_streams: self.active_streams.clone(),
        }
    }
}

impl fmt::Debug for KeepAliveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeepAliveHandle")
            .field(
                "active_streams",
                &self.active_streams.load(Ordering::SeqCst),
            )
            .finish()
    }
}

/// 活跃流守卫。
///
/// 由 [`KeepAliveHandle::track_active_stream`] 返回。一个守卫对应
/// 计数上的一次 +1，丢弃守卫就是流的关闭信号，恰好对应一次 −1，
/// 所以计数不可能变负。可以在任意线程上丢弃。
pub struct ActiveStream {
    active_streams: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<Event>,
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        if self.active_streams.fetch_sub(1, Ordering::SeqCst) == 1 {
            // 清零发生在任意线程上，先排回事件循环，
            // 再与优雅关闭的槽位状态合并判断。
            let _ = self.tx.unbounded_send(Event::StreamsDrained);
        }
    }
}

impl fmt::Debug for ActiveStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveStream").finish()
    }
}

/// 关闭序列的推进状态。
///
/// `close0` 之后的各个阶段一次只有一个在途 Future；
/// 输入关闭的等待定时器单独放在管理器的槽位里。
enum Shutdown<W> {
    NotStarted,
    Flushing(W),
    ClosingTls(W),
    ShuttingDownOutput(W),
    AwaitingInputShutdown,
    Finished,
}

/// 第二个 GOAWAY 的在途写入，连同促成它的超时原因（如果有）。
struct SecondGoAwayWrite<W> {
    write: W,
    cause: Option<Error>,
}

/// 观察到哪一侧的半关闭。
#[derive(Clone, Copy)]
enum HalfCloseSide {
    Input,
    Output,
}

impl HalfCloseSide {
    fn as_str(self) -> &'static str {
        match self {
            HalfCloseSide::Input => "input",
            HalfCloseSide::Output => "output",
        }
    }
}

/// 单条 HTTP/2 连接的保活与优雅关闭管理器。
///
/// 在连接就绪时创建，由连接任务独占持有，随连接一起消亡。它不拥有
/// 流，只通过 [`ActiveStream`] 守卫订阅流的关闭信号；它先于自己的
/// 定时器消亡（终止时丢弃全部定时器）。
///
/// ## 驱动方式
///
/// 连接任务在每次醒来时调用 [`poll`](Self::poll)，并在以下时刻调用
/// 对应的内联方法：
///
/// - 解码出 PING 帧：[`ping_received`](Self::ping_received)
/// - 观察到半关闭：[`channel_input_shutdown`](Self::channel_input_shutdown) /
///   [`channel_output_shutdown`](Self::channel_output_shutdown)
/// - 传输已经关闭：[`channel_closed`](Self::channel_closed)
///
/// `poll` 返回 `Ready(())` 表示管理器已终止：两个状态槽都已 `Closed`，
/// 关闭序列走完，之后不会再写出任何帧。
pub struct KeepAliveManager<C: Channel> {
    channel: C,
    timer: Time,
    ack_timeout: Duration,
    idle_duration: Option<Duration>,
    disallow_ping_without_active_streams: bool,
    active_streams: Arc<AtomicUsize>,
    events: mpsc::UnboundedReceiver<Event>,
    handle: KeepAliveHandle,

    keep_alive: KeepAliveState,
    graceful_close: GracefulCloseState,
    input_shutdown_timer: Option<Pin<Box<dyn Sleep>>>,

    // 在途写入。每个 Future 只观察完成，丢弃不会取消写入。
    ka_ping_write: Option<C::Write>,
    ka_go_away_write: Option<C::Write>,
    gc_first_write: Option<C::Write>,
    gc_second_write: Option<SecondGoAwayWrite<C::Write>>,
    shutdown: Shutdown<C::Write>,
}

impl<C: Channel> KeepAliveManager<C> {
    /// 为一条就绪的连接创建管理器。
    ///
    /// duplex 传输会被切换到半关闭语义（保持可写、不自动关闭）。
    /// 配置启用了空闲探测时，`detector` 会被调用一次来安装空闲
    /// 看门狗；禁用时（`idle_duration` 为 `None` 或零）不安装，
    /// 连接上永远不会出现保活 PING。
    pub fn new<T, D>(mut channel: C, config: Config, timer: T, detector: &D) -> KeepAliveManager<C>
    where
        T: Timer + Send + Sync + 'static,
        D: IdlenessDetector<C>,
    {
        if channel.is_duplex() {
            channel.enable_half_close();
        }

        let (tx, events) = mpsc::unbounded();
        let active_streams = Arc::new(AtomicUsize::new(0));
        let handle = KeepAliveHandle {
            tx: tx.clone(),
            active_streams: active_streams.clone(),
        };

        let idle_duration = config.idle_duration.filter(|d| !d.is_zero());
        if let Some(idle) = idle_duration {
            detector.configure(&mut channel, idle, OnIdle::new(tx));
        }

        debug!(
            "configured for {}duplex channel with idle_duration={:?}, ack_timeout={:?}, without_active_streams={}",
            if channel.is_duplex() { "" } else { "non-" },
            idle_duration,
            config.ack_timeout,
            config.without_active_streams,
        );

        KeepAliveManager {
            channel,
            timer: Time::new(Arc::new(timer)),
            ack_timeout: config.ack_timeout,
            idle_duration,
            disallow_ping_without_active_streams: !config.without_active_streams,
            active_streams,
            events,
            handle,
            keep_alive: KeepAliveState::Idle,
            graceful_close: GracefulCloseState::Idle,
            input_shutdown_timer: None,
            ka_ping_write: None,
            ka_go_away_write: None,
            gc_first_write: None,
            gc_second_write: None,
            shutdown: Shutdown::NotStarted,
        }
    }

    /// 返回一个跨线程句柄。
    pub fn handle(&self) -> KeepAliveHandle {
        self.handle.clone()
    }

    /// 当前的活跃流计数。
    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::SeqCst)
    }

    /// 管理器是否已终止（两个状态槽都已关闭）。
    pub fn is_closed(&self) -> bool {
        matches!(self.keep_alive, KeepAliveState::Closed)
            && matches!(self.graceful_close, GracefulCloseState::Closed)
    }

    // ===== 内联事件入口（只能在连接任务上调用） =====

    /// 连接任务解码出一个 PING 帧时调用。
    ///
    /// 非 ACK 的 PING 无条件回显（对端随时有权探测我们，本地处于
    /// 什么状态都不影响），管理器终止后除外。ACK 按负载派发给对应
    /// 的子协议，未知负载只记日志。
    pub fn ping_received(&mut self, frame: PingFrame) {
        if frame.ack {
            match PingPurpose::from_content(frame.content) {
                Some(PingPurpose::GracefulClose) => self.graceful_close_ack_received(),
                Some(PingPurpose::KeepAlive) => self.keep_alive_ack_received(),
                None => {
                    debug!(
                        "ignoring PING(ACK) with unknown content {:#018x}",
                        frame.content
                    );
                }
            }
        } else if !self.is_closed() {
            // 回显的结果无关紧要，不保留完成通知。
            let _ = self
                .channel
                .write_and_flush(Frame::Ping(PingFrame::ack_of(frame.content)));
        }
    }

    /// 空闲看门狗报告连接空闲时调用（也可由事件队列触发）。
    ///
    /// 已有探测在途、本轮探测已失败、或配置不允许在无活跃流时探测，
    /// 都会使该事件成为空操作。
    pub fn channel_idle(&mut self) {
        if self.idle_duration.is_none() {
            // 探测被配置禁用，空闲事件不产生任何帧。
            return;
        }
        if !matches!(self.keep_alive, KeepAliveState::Idle) {
            return;
        }
        if self.disallow_ping_without_active_streams && self.active_streams() == 0 {
            return;
        }

        debug!("idleness detected with active_streams={}", self.active_streams());

        // 先置写前哨兵再写。有的传输同步冲刷，ACK 可能在写完成
        // 被观察到之前就抵达；接收方据此状态识别这个 ACK。
        self.keep_alive = KeepAliveState::AckPending { timer: None };
        self.ka_ping_write = Some(
            self.channel
                .write_and_flush(Frame::Ping(PingFrame::new(ping::keep_alive_content()))),
        );
    }

    /// 发起优雅关闭（连接任务上的内联版本）。
    ///
    /// 语义与 [`KeepAliveHandle::initiate_graceful_close`] 相同。
    pub fn initiate_graceful_close<F>(&mut self, when_initiated: F, local: bool)
    where
        F: FnOnce(),
    {
        if !matches!(self.graceful_close, GracefulCloseState::Idle) {
            // 已经发起过，或者连接已经关闭。
            debug!(
                "graceful close already initiated, state={:?}",
                self.graceful_close
            );
            return;
        }

        debug!(
            "close gracefully with active_streams={}, keep_alive={:?}",
            self.active_streams(),
            self.keep_alive,
        );

        // 上层先停止接收新工作，之后才允许任何帧出门。
        when_initiated();

        // 先置状态再写，理由同保活探测：ACK 可能先于写完成抵达。
        self.graceful_close = GracefulCloseState::Started;

        // 两个 GOAWAY 的流程出自 RFC 7540 §6.8：第一个 GOAWAY 带
        // 最大流 ID 宣告不再接收新流，等约 2·RTT 让在途帧落地，第二个
        // GOAWAY 才带真实的最高流 ID。2·RTT 用一次 PING 往返来估计。
        let content = if local {
            ping::LOCAL_GO_AWAY_CONTENT.clone()
        } else {
            ping::REMOTE_GO_AWAY_CONTENT.clone()
        };
        self.channel
            .write(Frame::GoAway(GoAwayFrame::no_error(LastStreamId::Max, content)));
        self.gc_first_write = Some(self.channel.write_and_flush(Frame::Ping(PingFrame::new(
            ping::graceful_close_content(),
        ))));
    }

    /// 观察到本端输出方向被关闭时调用。
    pub fn channel_output_shutdown(&mut self) {
        self.channel_half_shutdown(HalfCloseSide::Output);
    }

    /// 观察到本端输入方向被关闭（对端关闭了它的输出）时调用。
    pub fn channel_input_shutdown(&mut self) {
        // 正在等对端回应输入关闭的话，这就是回应，定时器不再需要。
        self.input_shutdown_timer = None;
        self.channel_half_shutdown(HalfCloseSide::Input);
    }

    /// 传输完全关闭后调用。
    ///
    /// 丢弃所有定时器与在途写入的观察者，两个槽位进入 `Closed`，
    /// 此后管理器不再写出任何帧。
    pub fn channel_closed(&mut self) {
        debug!(
            "channel closed with active_streams={}, graceful_close={:?}, keep_alive={:?}",
            self.active_streams(),
            self.graceful_close,
            self.keep_alive,
        );

        self.keep_alive = KeepAliveState::Closed;
        self.graceful_close = GracefulCloseState::Closed;
        self.input_shutdown_timer = None;
        self.ka_ping_write = None;
        self.ka_go_away_write = None;
        self.gc_first_write = None;
        self.gc_second_write = None;
        self.shutdown = Shutdown::Finished;
    }

    // ===== 驱动 =====

    /// 推进管理器：排空事件队列，轮询定时器与在途写入。
    ///
    /// 连接任务必须在每次醒来时调用（通常与连接 I/O 的轮询放在同一个
    /// 循环里），并在调用过任何内联事件入口之后再调用一次。返回
    /// `Ready(())` 表示管理器已终止。
    pub fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        // 先排空跨线程事件，让它们与本地事件走同一套转移函数。
        loop {
            match Pin::new(&mut self.events).poll_next(cx) {
                Poll::Ready(Some(event)) => match event {
                    Event::IdleDetected => self.channel_idle(),
                    Event::StreamsDrained => self.streams_drained(),
                    Event::GracefulClose {
                        local,
                        when_initiated,
                    } => self.initiate_graceful_close(when_initiated, local),
                },
                Poll::Ready(None) | Poll::Pending => break,
            }
        }

        self.poll_keep_alive(cx);
        self.poll_graceful_close(cx);
        self.poll_shutdown(cx);

        if self.is_closed() && matches!(self.shutdown, Shutdown::Finished) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    // ===== 保活探测 =====

    fn keep_alive_ack_received(&mut self) {
        match self.keep_alive {
            KeepAliveState::AckPending { .. } => {
                trace!(
                    "keep-alive PING(ACK) received, active_streams={}",
                    self.active_streams()
                );
                // 槽位里的定时器随变体替换一起被丢弃，即取消。
                self.keep_alive = KeepAliveState::Idle;
            }
            _ => {
                debug!(
                    "keep-alive PING(ACK) received in state {:?}, ignored",
                    self.keep_alive
                );
            }
        }
    }

    fn poll_keep_alive(&mut self, cx: &mut Context<'_>) {
        // 探测 PING 的写完成。
        if let Some(mut write) = self.ka_ping_write.take() {
            match Pin::new(&mut write).poll(cx) {
                Poll::Pending => self.ka_ping_write = Some(write),
                Poll::Ready(Err(cause)) => {
                    debug!("failed to write a PING frame after idleness was detected, closing the channel");
                    self.close0(Some(cause));
                }
                Poll::Ready(Ok(())) => {
                    // 槽位仍是写前哨兵才安装定时器；不是则 ACK 已先到，
                    // 超时已无意义。
                    if matches!(self.keep_alive, KeepAliveState::AckPending { timer: None }) {
                        self.keep_alive = KeepAliveState::AckPending {
                            timer: Some(self.timer.sleep(self.ack_timeout)),
                        };
                    }
                }
            }
        }

        // ACK 超时。定时器只存在于 AckPending 槽位里，
        // 到期时槽位必然与调度时一致。
        let timed_out = match self.keep_alive {
            KeepAliveState::AckPending {
                timer: Some(ref mut timer),
            } => timer.as_mut().poll(cx).is_ready(),
            _ => false,
        };
        if timed_out {
            self.keep_alive = KeepAliveState::AckTimedOut;
            debug!(
                "timeout after {:?} waiting for keep-alive PING(ACK), writing GOAWAY frame \
                 and closing the channel with active_streams={}",
                self.ack_timeout,
                self.active_streams(),
            );
            self.ka_go_away_write = Some(self.channel.write_and_flush(Frame::GoAway(
                GoAwayFrame::no_error(
                    LastStreamId::HighestAccepted,
                    ping::KA_TIMEOUT_GO_AWAY_CONTENT.clone(),
                ),
            )));
        }

        // 超时 GOAWAY 的写完成：成功失败都要进入关闭流程。
        if let Some(mut write) = self.ka_go_away_write.take() {
            match Pin::new(&mut write).poll(cx) {
                Poll::Pending => self.ka_go_away_write = Some(write),
                Poll::Ready(result) => {
                    let timeout = Error::new_keep_alive_timeout();
                    let cause = match result {
                        Ok(()) => timeout,
                        Err(write_err) => {
                            debug!("failed to write the GOAWAY frame after keep-alive PING(ACK) timeout, closing the channel");
                            // 写失败是主因，超时作为从属原因保留。
                            write_err.with_suppressed(timeout)
                        }
                    };
                    self.close0(Some(cause));
                }
            }
        }
    }

    // ===== 优雅关闭 =====

    fn graceful_close_ack_received(&mut self) {
        match self.graceful_close {
            GracefulCloseState::Started | GracefulCloseState::AckPending { .. } => {
                debug!(
                    "graceful close PING(ACK) received, writing the second GOAWAY frame, active_streams={}",
                    self.active_streams()
                );
                self.write_second_go_away(None);
            }
            _ => {
                debug!(
                    "graceful close PING(ACK) received in state {:?}, ignored",
                    self.graceful_close
                );
            }
        }
    }

    /// 写出第二个 GOAWAY。`cause` 非空表示这是 ACK 超时路径。
    ///
    /// 幂等：已经写过（或管理器已终止）则直接返回。
    fn write_second_go_away(&mut self, cause: Option<Error>) {
        if matches!(
            self.graceful_close,
            GracefulCloseState::SecondGoAwaySent | GracefulCloseState::Closed
        ) {
            return;
        }

        // 变体替换顺带丢弃了 AckPending 里的定时器。
        self.graceful_close = GracefulCloseState::SecondGoAwaySent;

        let content = if cause.is_none() {
            ping::SECOND_GO_AWAY_CONTENT.clone()
        } else {
            ping::GC_TIMEOUT_GO_AWAY_CONTENT.clone()
        };
        let write = self.channel.write_and_flush(Frame::GoAway(GoAwayFrame::no_error(
            LastStreamId::HighestAccepted,
            content,
        )));
        self.gc_second_write = Some(SecondGoAwayWrite { write, cause });
    }

    /// 活跃流计数降到零（经事件队列重新串行化之后）。
    fn streams_drained(&mut self) {
        if self.active_streams() == 0
            && matches!(self.graceful_close, GracefulCloseState::SecondGoAwaySent)
        {
            // 关闭流程只需要知道写失败；流清零路径永远不带原因。
            self.close0(None);
        }
    }

    fn poll_graceful_close(&mut self, cx: &mut Context<'_>) {
        // 第一组写入（GOAWAY₁ + PING）的完成。
        if let Some(mut write) = self.gc_first_write.take() {
            match Pin::new(&mut write).poll(cx) {
                Poll::Pending => self.gc_first_write = Some(write),
                Poll::Ready(Err(cause)) => {
                    debug!("failed to write the first GOAWAY and PING frames, closing the channel");
                    self.close0(Some(cause));
                }
                Poll::Ready(Ok(())) => {
                    // 不再是 Started 说明 ACK 已经到达，无需定时器。
                    if matches!(self.graceful_close, GracefulCloseState::Started) {
                        self.graceful_close = GracefulCloseState::AckPending {
                            timer: self.timer.sleep(self.ack_timeout),
                        };
                    }
                }
            }
        }

        // ACK 超时。
        let timed_out = match self.graceful_close {
            GracefulCloseState::AckPending { ref mut timer } => {
                timer.as_mut().poll(cx).is_ready()
            }
            _ => false,
        };
        if timed_out {
            // 2·RTT 可能被低估了。与其无限等下去，不如带着超时原因
            // 继续走关闭流程，把残局交给上层的超时机制。
            debug!(
                "timeout after {:?} waiting for graceful close PING(ACK), writing the second \
                 GOAWAY frame and closing the channel with active_streams={}",
                self.ack_timeout,
                self.active_streams(),
            );
            self.write_second_go_away(Some(Error::new_graceful_close_timeout()));
        }

        // 第二个 GOAWAY 的写完成。
        if let Some(SecondGoAwayWrite { mut write, cause }) = self.gc_second_write.take() {
            match Pin::new(&mut write).poll(cx) {
                Poll::Pending => {
                    self.gc_second_write = Some(SecondGoAwayWrite { write, cause });
                }
                Poll::Ready(Err(write_err)) => {
                    debug!("failed to write the second GOAWAY frame, closing the channel");
                    let close_cause = match cause {
                        None => write_err,
                        Some(timeout) => write_err.with_suppressed(timeout),
                    };
                    self.close0(Some(close_cause));
                }
                Poll::Ready(Ok(())) => {
                    if cause.is_some() || self.active_streams() == 0 {
                        // 超时路径不等流清零；带着原因立即关闭。
                        self.close0(cause);
                    }
                    // 否则留在 SecondGoAwaySent，由流清零事件收尾。
                }
            }
        }
    }

    // ===== 半关闭协调 =====

    fn channel_half_shutdown(&mut self, side: HalfCloseSide) {
        if !self.channel.is_duplex() {
            debug!(
                "observed {} shutdown, closing non-duplex channel with active_streams={}, \
                 graceful_close={:?}, keep_alive={:?}",
                side.as_str(),
                self.active_streams(),
                self.graceful_close,
                self.keep_alive,
            );
            self.close_channel();
            return;
        }

        let other_side_shutdown = match side {
            HalfCloseSide::Input => self.channel.is_output_shutdown(),
            HalfCloseSide::Output => self.channel.is_input_shutdown(),
        };
        if other_side_shutdown {
            debug!(
                "observed {} shutdown, other side is shutdown too, closing the channel with \
                 active_streams={}, graceful_close={:?}, keep_alive={:?}",
                side.as_str(),
                self.active_streams(),
                self.graceful_close,
                self.keep_alive,
            );
            self.close_channel();
        } else if !matches!(
            self.graceful_close,
            GracefulCloseState::SecondGoAwaySent | GracefulCloseState::Closed
        ) {
            // 优雅关闭还没走到第二个 GOAWAY，对端就关了一个方向。
            // 本端不能再合法地读下去，只能强制关闭。
            let phase = if matches!(self.graceful_close, GracefulCloseState::Idle) {
                "not started"
            } else {
                "in progress"
            };
            debug!(
                "observed {} shutdown while graceful closure is {}, must force channel closure \
                 with active_streams={}, graceful_close={:?}, keep_alive={:?}",
                side.as_str(),
                phase,
                self.active_streams(),
                self.graceful_close,
                self.keep_alive,
            );
            let cause = Error::new_unexpected_half_close(HalfCloseViolation {
                side: side.as_str(),
                phase,
            });
            self.close_channel_with(cause);
        }
        // 已经发过第二个 GOAWAY 的话，这是意料之中的排空中途状态。
    }

    // ===== 关闭序列 =====

    /// 公共关闭入口。幂等：两个槽位都已 `Closed` 则直接返回。
    fn close0(&mut self, cause: Option<Error>) {
        if self.is_closed() {
            return;
        }

        debug!(
            "marking all states as closed with active_streams={}, graceful_close={:?}, keep_alive={:?}",
            self.active_streams(),
            self.graceful_close,
            self.keep_alive,
        );

        // 槽位替换顺带丢弃了所有未决的定时器。
        self.keep_alive = KeepAliveState::Closed;
        self.graceful_close = GracefulCloseState::Closed;
        self.ka_ping_write = None;
        self.ka_go_away_write = None;
        self.gc_first_write = None;
        self.gc_second_write = None;

        if let Some(cause) = cause {
            // 之前的写入已经失败，再冲刷也是徒劳，直接关闭。
            self.close_channel_with(cause);
            return;
        }

        // 编码器可能在写入期间同步触发流关闭，把后续帧滞留在第二个
        // GOAWAY 之后。立即关闭会截断它们；先做一次空冲刷，保证队列
        // 被观察到。没有滞留写入时空冲刷是个空操作。
        self.shutdown = Shutdown::Flushing(self.channel.flush());
    }

    fn poll_shutdown(&mut self, cx: &mut Context<'_>) {
        enum Step {
            FlushDone,
            TlsClosed,
            OutputShutdown,
            InputTimerFired,
        }

        // 每个阶段先在受限借用里判定，再整体替换状态。
        loop {
            let step = match self.shutdown {
                Shutdown::NotStarted | Shutdown::Finished => return,
                Shutdown::Flushing(ref mut write) => {
                    // 冲刷的结果无关紧要，只要求它被观察到。
                    if Pin::new(write).poll(cx).is_pending() {
                        return;
                    }
                    Step::FlushDone
                }
                Shutdown::ClosingTls(ref mut write) => {
                    if Pin::new(write).poll(cx).is_pending() {
                        return;
                    }
                    Step::TlsClosed
                }
                Shutdown::ShuttingDownOutput(ref mut write) => {
                    if Pin::new(write).poll(cx).is_pending() {
                        return;
                    }
                    Step::OutputShutdown
                }
                Shutdown::AwaitingInputShutdown => {
                    let fired = match self.input_shutdown_timer {
                        Some(ref mut timer) => timer.as_mut().poll(cx).is_ready(),
                        None => false,
                    };
                    if !fired {
                        return;
                    }
                    Step::InputTimerFired
                }
            };

            match step {
                Step::FlushDone => {
                    if !self.channel.is_duplex() {
                        self.close_channel();
                        return;
                    }
                    self.shutdown = match self.channel.close_tls_outbound() {
                        // TLS 告警必须先于输出关闭落盘（RFC 5246 §7.2.1）。
                        Some(write) => Shutdown::ClosingTls(write),
                        None => Shutdown::ShuttingDownOutput(self.channel.shutdown_output()),
                    };
                }
                Step::TlsClosed => {
                    self.shutdown = Shutdown::ShuttingDownOutput(self.channel.shutdown_output());
                }
                Step::OutputShutdown => {
                    if self.channel.is_input_shutdown() {
                        debug!("input and output shutdown, closing the channel");
                        self.close_channel();
                        return;
                    }
                    // 走到这里说明 GOAWAY 交换已经完成且没有活跃流，或者
                    // 没等到 PING(ACK)。给对端一点时间传播它的输入关闭，
                    // 超时就强制关闭。
                    self.input_shutdown_timer = Some(self.timer.sleep(self.ack_timeout));
                    self.shutdown = Shutdown::AwaitingInputShutdown;
                }
                Step::InputTimerFired => {
                    self.input_shutdown_timer = None;
                    if self.channel.is_input_shutdown() {
                        // 对端刚刚跟上了，收尾交给输入关闭事件。
                        self.shutdown = Shutdown::Finished;
                    } else {
                        debug!(
                            "timeout after {:?} waiting for input shutdown, closing the channel",
                            self.ack_timeout
                        );
                        self.close_channel_with(Error::new_input_shutdown_timeout());
                    }
                    return;
                }
            }
        }
    }

    fn close_channel(&mut self) {
        self.shutdown = Shutdown::Finished;
        self.channel.close();
    }

    fn close_channel_with(&mut self, cause: Error) {
        self.shutdown = Shutdown::Finished;
        self.channel.close_with_cause(cause);
    }
}

impl<C: Channel> fmt::Debug for KeepAliveManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeepAliveManager")
            .field("keep_alive", &self.keep_alive)
            .field("graceful_close", &self.graceful_close)
            .field("active_streams", &self.active_streams())
            .finish()
    }
}
