//! 输出驱动接口
//!
//! 协调器每次命令生效、每轮服务例程结束时，都会把每个执行器的
//! `(enabled, signed_magnitude)` 推给 [`OutputDriver`]。具体如何驱动
//! STEP/DIR 或 H 桥 PWM 由实现方决定，不属于本 crate。
//!
//! # 使用示例
//!
//! ```rust
//! use motus_driver::output::{OutputDriver, RecordingOutput};
//!
//! let (sink, rx) = RecordingOutput::new();
//! let dropped = sink.dropped_events().clone();
//!
//! // 把 sink 交给 CoordinatorBuilder::output(...)，然后在其他线程消费 rx
//! std::thread::spawn(move || {
//!     while let Ok(event) = rx.recv() {
//!         let _ = event.output.signed_magnitude;
//!     }
//! });
//! # let _ = dropped;
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use motus_types::{ActuatorId, Timestamp};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 单个执行器的物理输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorOutput {
    /// 输出使能
    pub enabled: bool,
    /// 带符号幅值：步进电机为速度（步/秒），直流电机为 PWM 占空比
    pub signed_magnitude: i32,
    /// 本轮需要发出的带符号步脉冲数（直流电机恒为 0）
    pub steps: i32,
}

impl ActuatorOutput {
    pub const DISABLED: ActuatorOutput = ActuatorOutput {
        enabled: false,
        signed_magnitude: 0,
        steps: 0,
    };
}

/// 一次输出推送
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEvent {
    /// 推送时刻（协调器时钟）
    pub timestamp: Timestamp,
    pub id: ActuatorId,
    pub output: ActuatorOutput,
}

/// 执行器输出驱动
///
/// # 调用约束
///
/// - 在注册表锁内被调用，实现必须快速返回，不得回调协调器
/// - 同一轮服务中按注册表顺序依次调用
pub trait OutputDriver: Send {
    fn write(&mut self, event: &OutputEvent);
}

/// 丢弃所有输出
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl OutputDriver for NullOutput {
    fn write(&mut self, _event: &OutputEvent) {}
}

impl<F> OutputDriver for F
where
    F: FnMut(&OutputEvent) + Send,
{
    fn write(&mut self, event: &OutputEvent) {
        self(event)
    }
}

/// 录制输出（有界通道）
///
/// 使用 `try_send`，队列满时丢弃事件而不是阻塞服务例程。
pub struct RecordingOutput {
    tx: Sender<OutputEvent>,
    dropped_events: Arc<AtomicU64>,
    event_counter: Arc<AtomicU64>,
    changes_only: bool,
    last: Vec<Option<ActuatorOutput>>,
}

impl RecordingOutput {
    /// 默认容量：100,000 个事件
    pub const DEFAULT_CAPACITY: usize = 100_000;

    #[must_use]
    pub fn new() -> (Self, Receiver<OutputEvent>) {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, Receiver<OutputEvent>) {
        let (tx, rx) = bounded(capacity);
        let sink = Self {
            tx,
            dropped_events: Arc::new(AtomicU64::new(0)),
            event_counter: Arc::new(AtomicU64::new(0)),
            changes_only: false,
            last: Vec::new(),
        };
        (sink, rx)
    }

    /// 只录制与上一次不同的输出（空闲执行器每轮都会推送相同的禁用输出）
    pub fn changes_only(mut self) -> Self {
        self.changes_only = true;
        self
    }

    pub fn dropped_events(&self) -> &Arc<AtomicU64> {
        &self.dropped_events
    }

    pub fn event_counter(&self) -> &Arc<AtomicU64> {
        &self.event_counter
    }

    fn is_repeat(&mut self, event: &OutputEvent) -> bool {
        let index = event.id.index();
        if self.last.len() <= index {
            self.last.resize(index + 1, None);
        }
        let repeat = self.last[index] == Some(event.output);
        self.last[index] = Some(event.output);
        repeat
    }
}

impl OutputDriver for RecordingOutput {
    fn write(&mut self, event: &OutputEvent) {
        if self.changes_only && self.is_repeat(event) {
            return;
        }

        match self.tx.try_send(*event) {
            Ok(()) => {
                self.event_counter.fetch_add(1, Ordering::Relaxed);
            },
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            },
        }
    }
}
