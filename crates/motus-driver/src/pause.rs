//! 全局暂停控制
//!
//! 暂停标志本身不会停止任何执行器：持有执行器的阻塞调用在下一次轮询时观察到标志，
//! 自行记录剩余时长、停机，并在恢复后重新下发。

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// 进程级暂停标志
///
/// 以 `Arc<PauseController>` 形式分发给按键、信号处理等外部事件源。
#[derive(Debug, Default)]
pub struct PauseController {
    paused: AtomicBool,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 置位暂停，返回之前是否已经处于暂停
    pub fn pause(&self) -> bool {
        let was = self.paused.swap(true, Ordering::AcqRel);
        if !was {
            info!("Motion paused");
        }
        was
    }

    /// 清除暂停，返回之前是否处于暂停
    pub fn resume(&self) -> bool {
        let was = self.paused.swap(false, Ordering::AcqRel);
        if was {
            info!("Motion resumed");
        }
        was
    }

    /// 翻转暂停状态，返回翻转后的状态
    pub fn toggle(&self) -> bool {
        let now_paused = !self.paused.fetch_xor(true, Ordering::AcqRel);
        info!(
            "Motion {}",
            if now_paused { "paused" } else { "resumed" }
        );
        now_paused
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}
