//! # 毫秒时钟
//!
//! 控制器上的时钟源是一个 32 位毫秒计数器，约 49.7 天回绕一次。
//! 所有截止时间比较都必须使用有符号差值，禁止直接对原始计数做 `<` 比较。

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// 单次定时运行允许的最长时长（毫秒）
///
/// 有符号差值只有在两个时间点相距小于 2^31 ms 时才有意义。
pub const MAX_DURATION_MS: u32 = i32::MAX as u32;

/// 毫秒时间戳（按 2^32 回绕）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// 原始计数
    #[inline]
    pub fn as_millis(self) -> u32 {
        self.0
    }

    /// 回绕加法（`now + duration`）
    #[inline]
    pub fn wrapping_add(self, ms: u32) -> Self {
        Timestamp(self.0.wrapping_add(ms))
    }

    /// `now` 是否已到达或越过 `self`（把 `self` 视为截止时间）
    #[inline]
    pub fn has_elapsed(self, now: Timestamp) -> bool {
        signed_diff(now, self) >= 0
    }

    /// 距离截止时间 `self` 还剩多少毫秒（已过期则为 0）
    #[inline]
    pub fn remaining_from(self, now: Timestamp) -> u32 {
        signed_diff(self, now).max(0) as u32
    }
}

/// 回绕安全的有符号差值 `a - b`
///
/// 结果为正表示 `a` 在 `b` 之后。
#[inline]
pub fn signed_diff(a: Timestamp, b: Timestamp) -> i32 {
    a.0.wrapping_sub(b.0) as i32
}

/// 单调毫秒时钟源
pub trait Clock: Send + Sync {
    /// 当前时间
    fn now(&self) -> Timestamp;
}

/// 基于 `Instant` 的系统时钟
///
/// 截断为 32 位，与控制器上的 `millis()` 具有相同的回绕行为。
#[derive(Debug, Clone)]
pub struct SystemClock {
    created_at: Instant,
    offset_ms: u32,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// 从指定计数开始（用于在启动后不久就验证回绕路径）
    pub fn with_offset(offset_ms: u32) -> Self {
        Self {
            created_at: Instant::now(),
            offset_ms,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        Timestamp((elapsed as u32).wrapping_add(self.offset_ms))
    }
}

/// 手动推进的时钟（仿真与测试）
///
/// 可以在任意线程中推进，所有读取者立即看到新值。
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU32,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now_ms: AtomicU32::new(start.0),
        }
    }

    /// 向前推进 `ms` 毫秒（回绕）
    pub fn advance(&self, ms: u32) -> Timestamp {
        let previous = self.now_ms.fetch_add(ms, Ordering::AcqRel);
        Timestamp(previous.wrapping_add(ms))
    }

    /// 直接设置当前计数
    pub fn set(&self, now: Timestamp) {
        self.now_ms.store(now.0, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now_ms.load(Ordering::Acquire))
    }
}
